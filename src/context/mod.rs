//! Budgeted rendering of table records into a prompt context block
//!
//! Tables are rendered in order, one unit at a time (a table header or a
//! single column line). A unit is appended only if it fits in what is left of
//! the budget. When a header does not fit, [`TABLES_OMITTED`] is appended and
//! assembly stops. When a column line does not fit, [`COLUMNS_OMITTED`] closes
//! that table and assembly moves on to the next one.
//!
//! Lengths are counted in `char`s. Markers are not charged.

use crate::models::{Column, Table};
use tracing::debug;

pub const TABLES_OMITTED: &str = "... (remaining tables omitted to fit the context budget) ...\n";
pub const COLUMNS_OMITTED: &str = "  ... (remaining columns omitted)\n";

/// Default budget, in characters
pub const DEFAULT_MAX_CHARS: usize = 8000;

/// Rendered schema context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlock {
    pub text: String,
    /// True when any table or column was left out
    pub truncated: bool,
    /// Tables whose header made it into the block
    pub tables_included: usize,
    /// Characters charged against the budget
    pub chars_used: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn assemble(&self, tables: &[Table]) -> ContextBlock {
        let mut block = ContextBlock::default();

        'tables: for table in tables {
            let header = render_header(table);
            if !self.try_append(&mut block, &header) {
                block.text.push_str(TABLES_OMITTED);
                block.truncated = true;
                break;
            }
            block.tables_included += 1;

            for column in &table.columns {
                let line = render_column(column);
                if !self.try_append(&mut block, &line) {
                    block.text.push_str(COLUMNS_OMITTED);
                    block.truncated = true;
                    continue 'tables;
                }
            }
        }

        debug!(
            "Assembled context: {}/{} tables, {} chars, truncated={}",
            block.tables_included,
            tables.len(),
            block.chars_used,
            block.truncated
        );
        block
    }

    fn try_append(&self, block: &mut ContextBlock, unit: &str) -> bool {
        let len = unit.chars().count();
        if len > self.max_chars - block.chars_used {
            return false;
        }
        block.text.push_str(unit);
        block.chars_used += len;
        true
    }
}

fn render_header(table: &Table) -> String {
    format!(
        "\nTable: {}\nDescription: {}\nColumns:\n",
        table.name, table.description
    )
}

fn render_column(column: &Column) -> String {
    let mut line = format!("  - {} ({}): {}", column.name, column.data_type, column.description);
    if column.is_primary {
        line.push_str(" [PK]");
    }
    if column.is_required {
        line.push_str(" [REQUIRED]");
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tables() -> Vec<Table> {
        vec![
            Table::new(
                "users",
                "registered users",
                vec![
                    Column::new("id", "BIGINT").primary(),
                    Column::new("email", "VARCHAR(100)").described("login"),
                    Column::new("bio", "TEXT").optional(),
                ],
            ),
            Table::new(
                "orders",
                "customer orders",
                vec![
                    Column::new("id", "BIGINT").primary(),
                    Column::new("user_id", "BIGINT"),
                ],
            ),
        ]
    }

    #[test]
    fn test_zero_budget_is_only_the_marker() {
        let block = ContextAssembler::new(0).assemble(&sample_tables());
        assert_eq!(block.text, TABLES_OMITTED);
        assert!(block.truncated);
        assert_eq!(block.tables_included, 0);
    }

    #[test]
    fn test_empty_input_is_empty_block() {
        let block = ContextAssembler::new(0).assemble(&[]);
        assert_eq!(block, ContextBlock::default());
    }

    #[test]
    fn test_unbounded_budget_includes_everything_in_order() {
        let tables = sample_tables();
        let block = ContextAssembler::new(usize::MAX).assemble(&tables);

        assert!(!block.truncated);
        assert_eq!(block.tables_included, 2);
        assert_eq!(block.text.matches("\nTable: ").count(), 2);
        assert!(block.text.find("Table: users").unwrap() < block.text.find("Table: orders").unwrap());

        // Tables may share column lines, so count within each table's section
        let sections: Vec<_> = block.text.split("\nTable: ").skip(1).collect();
        assert_eq!(sections.len(), tables.len());
        for (table, section) in tables.iter().zip(&sections) {
            assert!(section.starts_with(&table.name));
            for column in &table.columns {
                assert_eq!(section.matches(&render_column(column)).count(), 1);
            }
        }
        assert_eq!(block.chars_used, block.text.chars().count());
    }

    #[test]
    fn test_column_rendering_tags() {
        let block = ContextAssembler::default().assemble(&sample_tables()[..1]);
        assert!(block.text.starts_with("\nTable: users\nDescription: registered users\nColumns:\n"));
        assert!(block.text.contains("  - id (BIGINT):  [PK] [REQUIRED]\n"));
        assert!(block.text.contains("  - email (VARCHAR(100)): login [REQUIRED]\n"));
        assert!(block.text.contains("  - bio (TEXT): \n"));
    }

    #[test]
    fn test_column_overflow_moves_to_next_table() {
        let tables = vec![
            Table::new(
                "wide",
                "",
                vec![
                    Column::new("a", "INT"),
                    Column::new("b_has_a_name_longer_than_the_next_header", "VARCHAR(255)"),
                ],
            ),
            Table::new("next", "", vec![]),
        ];
        let header_len = render_header(&tables[0]).chars().count();
        let first_column = render_column(&tables[0].columns[0]).chars().count();
        let second_column = render_column(&tables[0].columns[1]).chars().count();
        let second_header = render_header(&tables[1]).chars().count();
        assert!(second_column > second_header);

        // Room for the first column and the second header, not the second column
        let budget = header_len + first_column + second_header;
        let block = ContextAssembler::new(budget).assemble(&tables);

        assert!(block.truncated);
        assert_eq!(block.tables_included, 2);
        assert!(block.text.contains("  - a (INT)"));
        assert!(!block.text.contains("b_has_a_name"));
        assert!(block.text.contains(COLUMNS_OMITTED));
        assert!(block.text.ends_with("\nTable: next\nDescription: \nColumns:\n"));
        assert_eq!(block.chars_used, budget);
    }

    #[test]
    fn test_header_overflow_stops() {
        let tables = sample_tables();
        let first_header = render_header(&tables[0]).chars().count();
        let block = ContextAssembler::new(first_header).assemble(&tables);

        // Header fits, every column overflows, then the next header overflows
        assert_eq!(block.tables_included, 1);
        assert!(block.text.ends_with(&format!("{COLUMNS_OMITTED}{TABLES_OMITTED}")));
        assert!(!block.text.contains("orders"));
    }

    #[test]
    fn test_budget_counts_chars_not_bytes() {
        let tables = vec![Table::new("表", "用户", vec![])];
        let len = render_header(&tables[0]).chars().count();
        let block = ContextAssembler::new(len).assemble(&tables);
        assert!(!block.truncated);
        assert_eq!(block.chars_used, len);
    }
}
