//! Parsing of a single column definition fragment

use crate::models::Column;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How the constraint text decides whether a column is nullable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullabilityRule {
    /// A `NULL` token not preceded by `NOT` makes the column optional
    #[default]
    Strict,
    /// Any occurrence of `NULL` (including `NOT NULL`) makes the column optional
    Substring,
}

/// Outcome of parsing one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnParse {
    Column(Column),
    /// Table-level constraint or a fragment without the `<name> <type>` shape
    Skipped,
}

impl ColumnParse {
    pub fn into_column(self) -> Option<Column> {
        match self {
            ColumnParse::Column(column) => Some(column),
            ColumnParse::Skipped => None,
        }
    }
}

fn column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)^\s*(?:`([^`]+)`|"([^"]+)"|(\w+))\s+(?:`([^`]+)`|"([^"]+)"|(\w+(?:\([^)]*\))?))\s*(.*)$"#,
        )
        .expect("column pattern is valid")
    })
}

fn constraint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:PRIMARY\s+KEY|FOREIGN\s+KEY|CONSTRAINT|UNIQUE|KEY|INDEX|CHECK|FULLTEXT|SPATIAL)\b",
        )
        .expect("constraint pattern is valid")
    })
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\bCOMMENT\s*(?:'([^']*)'|"([^"]*)")"#).expect("comment pattern is valid")
    })
}

fn primary_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").expect("primary key pattern is valid"))
}

fn table_primary_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*(?:CONSTRAINT\s+\S+\s+)?PRIMARY\s+KEY\s*(?:\w+\s*)?\((.*)\)")
            .expect("table primary key pattern is valid")
    })
}

/// True when the fragment is a table-level constraint rather than a column
pub fn is_constraint(fragment: &str) -> bool {
    constraint_re().is_match(fragment)
}

/// Parse one trimmed fragment into a column, or skip it
pub fn parse_column(fragment: &str, rule: NullabilityRule) -> ColumnParse {
    let fragment = fragment.trim().trim_end_matches(',').trim_end();
    if fragment.is_empty() || is_constraint(fragment) {
        return ColumnParse::Skipped;
    }

    let Some(caps) = column_re().captures(fragment) else {
        return ColumnParse::Skipped;
    };

    let name = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string());
    let data_type = caps
        .get(4)
        .or_else(|| caps.get(5))
        .or_else(|| caps.get(6))
        .map(|m| m.as_str().to_uppercase());

    let (Some(name), Some(data_type)) = (name, data_type) else {
        return ColumnParse::Skipped;
    };

    let constraints = caps.get(7).map(|m| m.as_str()).unwrap_or_default();
    let description = extract_comment(constraints).unwrap_or_default();

    // Comment text must not influence the constraint flags
    let flags = comment_re().replace_all(constraints, " ").to_uppercase();

    ColumnParse::Column(Column {
        name,
        data_type,
        description,
        is_primary: primary_key_re().is_match(&flags),
        is_required: is_required(&flags, rule),
    })
}

/// Column names listed by a table-level `PRIMARY KEY (...)` fragment
pub fn table_primary_key(fragment: &str) -> Option<Vec<String>> {
    let caps = table_primary_key_re().captures(fragment)?;
    let columns = caps
        .get(1)?
        .as_str()
        .split(',')
        .map(|part| {
            let part = part.split('(').next().unwrap_or_default();
            part.trim().trim_matches(|c| c == '`' || c == '"').to_string()
        })
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>();
    Some(columns)
}

fn extract_comment(constraints: &str) -> Option<String> {
    let caps = comment_re().captures(constraints)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn is_required(flags: &str, rule: NullabilityRule) -> bool {
    match rule {
        NullabilityRule::Substring => !flags.contains("NULL") && !flags.contains("DEFAULT"),
        NullabilityRule::Strict => {
            let tokens: Vec<&str> = flags
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|t| !t.is_empty())
                .collect();

            let mut required = true;
            for (i, token) in tokens.iter().enumerate() {
                match *token {
                    "DEFAULT" => required = false,
                    "NULL" if i == 0 || tokens[i - 1] != "NOT" => required = false,
                    _ => {}
                }
            }
            required
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(fragment: &str) -> Column {
        parse_column(fragment, NullabilityRule::Strict)
            .into_column()
            .expect("fragment should parse as a column")
    }

    #[test]
    fn test_quoted_primary_key_with_comment() {
        let column = parse("`id` BIGINT PRIMARY KEY NOT NULL COMMENT 'pk'");
        assert_eq!(column.name, "id");
        assert_eq!(column.data_type, "BIGINT");
        assert!(column.is_primary);
        assert_eq!(column.description, "pk");
    }

    #[test]
    fn test_explicit_null_is_optional() {
        assert!(!parse("email VARCHAR(100) NULL").is_required);
        let substring = parse_column("email VARCHAR(100) NULL", NullabilityRule::Substring)
            .into_column()
            .unwrap();
        assert!(!substring.is_required);
    }

    #[test]
    fn test_not_null_is_required_under_strict_rule() {
        let column = parse("email VARCHAR(100) NOT NULL");
        assert!(column.is_required);
        assert_eq!(column.data_type, "VARCHAR(100)");
    }

    #[test]
    fn test_not_null_is_optional_under_substring_rule() {
        let column = parse_column("email VARCHAR(100) NOT NULL", NullabilityRule::Substring)
            .into_column()
            .unwrap();
        assert!(!column.is_required);
    }

    #[test]
    fn test_default_clause_clears_required() {
        assert!(!parse("status INT NOT NULL DEFAULT 0").is_required);
        assert!(!parse("deleted_at DATETIME DEFAULT NULL").is_required);
    }

    #[test]
    fn test_bare_column_is_required() {
        let column = parse("bio text");
        assert!(column.is_required);
        assert!(!column.is_primary);
        assert_eq!(column.data_type, "TEXT");
        assert!(column.description.is_empty());
    }

    #[test]
    fn test_comment_text_does_not_affect_flags() {
        let column = parse("nickname VARCHAR(20) NOT NULL COMMENT 'null if unknown, default none'");
        assert!(column.is_required);
        assert_eq!(column.description, "null if unknown, default none");

        let column = parse(r#"code CHAR(2) COMMENT "primary key of region""#);
        assert!(!column.is_primary);
        assert_eq!(column.description, "primary key of region");
    }

    #[test]
    fn test_comment_without_space_before_quote() {
        assert_eq!(parse("a INT COMMENT'pk'").description, "pk");
        assert_eq!(parse(r#"b INT NOT NULL COMMENT"the b""#).description, "the b");
    }

    #[test]
    fn test_comment_is_not_unescaped() {
        let column = parse(r#"label TEXT COMMENT "say \"hi\"""#);
        assert_eq!(column.description, r"say \");
    }

    #[test]
    fn test_double_quoted_names_and_params() {
        let column = parse(r#""unit price" decimal(5,2) NOT NULL,"#);
        assert_eq!(column.name, "unit price");
        assert_eq!(column.data_type, "DECIMAL(5,2)");
    }

    #[test]
    fn test_constraints_are_skipped() {
        for fragment in [
            "PRIMARY KEY (`id`)",
            "FOREIGN KEY (user_id) REFERENCES users(id)",
            "CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users(id)",
            "UNIQUE (email)",
            "UNIQUE KEY uk_email (email)",
            "KEY idx_name (name)",
            "  key idx_lower (name)",
        ] {
            assert_eq!(
                parse_column(fragment, NullabilityRule::Strict),
                ColumnParse::Skipped,
                "{fragment}"
            );
        }
    }

    #[test]
    fn test_keyword_prefixed_names_are_columns() {
        assert_eq!(parse("key_id INT").name, "key_id");
        assert_eq!(parse("unique_code VARCHAR(8)").name, "unique_code");
        assert_eq!(parse("`key` INT").name, "key");
    }

    #[test]
    fn test_malformed_fragments_are_skipped() {
        assert_eq!(parse_column("", NullabilityRule::Strict), ColumnParse::Skipped);
        assert_eq!(parse_column("lonely", NullabilityRule::Strict), ColumnParse::Skipped);
        assert_eq!(parse_column("(x INT)", NullabilityRule::Strict), ColumnParse::Skipped);
    }

    #[test]
    fn test_table_primary_key_columns() {
        assert_eq!(
            table_primary_key("PRIMARY KEY (`id`)"),
            Some(vec!["id".to_string()])
        );
        assert_eq!(
            table_primary_key("CONSTRAINT pk_orders PRIMARY KEY (order_id, \"line\")"),
            Some(vec!["order_id".to_string(), "line".to_string()])
        );
        assert_eq!(
            table_primary_key("PRIMARY KEY (slug(10))"),
            Some(vec!["slug".to_string()])
        );
        assert_eq!(table_primary_key("UNIQUE (email)"), None);
    }
}
