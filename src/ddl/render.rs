//! Render a table record back into `CREATE TABLE` text

use crate::models::Table;

fn quote_literal(text: &str) -> String {
    // No escaping is applied on parse, so pick a quote the text does not contain
    if text.contains('\'') && !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        format!("'{}'", text.replace('\'', "''"))
    }
}

/// Render `table` as a MySQL-flavoured `CREATE TABLE` statement.
///
/// Required columns get `NOT NULL`, optional ones an explicit `NULL` so the
/// statement parses back to the same flags.
pub fn render_create_table(table: &Table) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut line = format!(
                "  `{}` {} {}",
                column.name,
                column.data_type,
                if column.is_required { "NOT NULL" } else { "NULL" }
            );
            if !column.description.is_empty() {
                line.push_str(" COMMENT ");
                line.push_str(&quote_literal(&column.description));
            }
            line
        })
        .collect();

    let keys: Vec<String> = table.primary_keys().map(|c| format!("`{}`", c.name)).collect();
    if !keys.is_empty() {
        lines.push(format!("  PRIMARY KEY ({})", keys.join(", ")));
    }

    let mut sql = format!("CREATE TABLE `{}` (\n{}\n)", table.name, lines.join(",\n"));
    if !table.description.is_empty() {
        sql.push_str(" COMMENT=");
        sql.push_str(&quote_literal(&table.description));
    }
    sql.push(';');
    sql
}
