//! DDL ingestion
//!
//! Turns raw `CREATE TABLE` text into [`Table`] records:
//! - [`splitter`] cuts a statement body into definition fragments
//! - [`column`] turns one fragment into a column or skips it
//! - [`render`] goes the other way, for display
//!
//! Parsing is tolerant: fragments that do not look like columns are dropped
//! and malformed statements yield whatever could be recovered.

pub mod column;
pub mod render;
pub mod splitter;

pub use column::{is_constraint, parse_column, table_primary_key, ColumnParse, NullabilityRule};
pub use render::render_create_table;
pub use splitter::split_definitions;

use crate::models::Table;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use splitter::{ScanState, Scanned};
use std::sync::OnceLock;
use tracing::{debug, trace};
use uuid::Uuid;

/// Where a table-level `COMMENT=` is looked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentScope {
    /// Between the statement's closing parenthesis and its terminating `;`
    #[default]
    Statement,
    /// First `COMMENT=` anywhere in the input, shared by every table
    FirstInInput,
}

/// Parser knobs (also the `[ddl]` config section)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlOptions {
    #[serde(default)]
    pub nullability: NullabilityRule,

    #[serde(default)]
    pub comment_scope: CommentScope,
}

fn create_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\bCREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:(?:`[^`]+`|"[^"]+"|\w+)\.)?(?:`([^`]+)`|"([^"]+)"|(\w+))\s*\("#,
        )
        .expect("create table pattern is valid")
    })
}

fn table_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bCOMMENT\s*=\s*(?:'([^']*)'|"([^"]*)")"#)
            .expect("table comment pattern is valid")
    })
}

fn alter_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\bALTER\s+TABLE\s+(?:`([^`]+)`|"([^"]+)"|(\w+))\s+COMMENT\s*=?\s*(?:'([^']*)'|"([^"]*)")"#,
        )
        .expect("alter comment pattern is valid")
    })
}

fn first_group(caps: &regex::Captures<'_>, groups: &[usize]) -> Option<String> {
    groups
        .iter()
        .find_map(|&i| caps.get(i))
        .map(|m| m.as_str().to_string())
}

/// A located `CREATE TABLE` statement
struct Statement {
    name: String,
    start: usize,
    body: (usize, usize),
    /// Byte offset just past the closing parenthesis
    end: usize,
}

/// Parse every `CREATE TABLE` statement in `text`
pub fn parse_ddl(text: &str, options: &DdlOptions) -> Vec<Table> {
    let statements = locate_statements(text);
    let shared_comment = match options.comment_scope {
        CommentScope::FirstInInput => find_table_comment(text),
        CommentScope::Statement => None,
    };

    let now = Utc::now();
    let mut tables = Vec::with_capacity(statements.len());

    for (i, statement) in statements.iter().enumerate() {
        let body = &text[statement.body.0..statement.body.1];
        let mut columns = Vec::new();
        let mut primary_keys = Vec::new();

        for fragment in split_definitions(body) {
            let fragment = fragment.trim();
            if let Some(names) = table_primary_key(fragment) {
                primary_keys.extend(names);
            }
            match parse_column(fragment, options.nullability) {
                ColumnParse::Column(column) => columns.push(column),
                ColumnParse::Skipped => trace!("Skipping fragment: {}", fragment),
            }
        }

        for column in &mut columns {
            if primary_keys.iter().any(|pk| pk.eq_ignore_ascii_case(&column.name)) {
                column.is_primary = true;
            }
        }

        let description = match options.comment_scope {
            CommentScope::FirstInInput => shared_comment.clone(),
            CommentScope::Statement => {
                let limit = statements
                    .get(i + 1)
                    .map(|next| next.start)
                    .unwrap_or(text.len());
                statement_tail(text, statement.end, limit).and_then(find_table_comment)
            }
        };

        tables.push(Table {
            id: Uuid::new_v4().to_string(),
            name: statement.name.clone(),
            description: description.unwrap_or_default(),
            columns,
            created_at: now,
            updated_at: now,
        });
    }

    apply_alter_comments(text, &mut tables);

    debug!("Parsed {} tables from DDL", tables.len());
    tables
}

fn locate_statements(text: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(caps) = create_table_re().captures_at(text, cursor) else {
            break;
        };
        let (Some(whole), Some(name)) = (caps.get(0), first_group(&caps, &[1, 2, 3])) else {
            break;
        };

        let body_start = whole.end();
        let (body_end, end) = match find_closing_paren(&text[body_start..]) {
            Some(offset) => (body_start + offset, body_start + offset + 1),
            None => (text.len(), text.len()),
        };

        statements.push(Statement {
            name,
            start: whole.start(),
            body: (body_start, body_end),
            end,
        });
        cursor = end;
    }

    statements
}

/// Offset of the `)` balancing an already-consumed `(`
fn find_closing_paren(rest: &str) -> Option<usize> {
    let mut state = ScanState::default();
    for (offset, c) in rest.char_indices() {
        if state.advance(c) == Scanned::Code && state.depth() < 0 {
            return Some(offset);
        }
    }
    None
}

/// Table options following a statement, up to its terminating `;`
fn statement_tail(text: &str, from: usize, limit: usize) -> Option<&str> {
    if from >= limit {
        return None;
    }
    let tail = &text[from..limit];
    let mut state = ScanState::default();
    for (offset, c) in tail.char_indices() {
        if c == ';' && state.at_top_level() {
            return Some(&tail[..offset]);
        }
        state.advance(c);
    }
    Some(tail)
}

fn find_table_comment(text: &str) -> Option<String> {
    let caps = table_comment_re().captures(text)?;
    first_group(&caps, &[1, 2])
}

fn apply_alter_comments(text: &str, tables: &mut [Table]) {
    for caps in alter_comment_re().captures_iter(text) {
        let (Some(name), Some(comment)) = (first_group(&caps, &[1, 2, 3]), first_group(&caps, &[4, 5]))
        else {
            continue;
        };
        for table in tables.iter_mut().filter(|t| t.name == name) {
            if table.description.is_empty() {
                table.description = comment.clone();
            }
        }
    }
}
