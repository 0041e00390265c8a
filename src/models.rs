//! Schema and query records shared by every layer.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A relational table description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Opaque identifier, assigned on ingestion when absent
    #[serde(default)]
    pub id: String,

    /// Table name (uniqueness is enforced by the store)
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A single column of a [`Table`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    /// Upper-cased type, parameters included (`VARCHAR(255)`)
    #[serde(rename = "type")]
    pub data_type: String,

    /// Empty when the definition carried no comment
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_primary: bool,

    #[serde(default)]
    pub is_required: bool,
}

/// A generated SQL query. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    pub description: String,
    pub sql: String,
    pub created_at: DateTime<Utc>,
}

impl Table {
    pub fn new(name: impl Into<String>, description: impl Into<String>, columns: Vec<Column>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            columns,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse a JSON array of tables, filling in missing identifiers
    pub fn from_json_array(text: &str) -> Result<Vec<Table>> {
        let mut tables: Vec<Table> = serde_json::from_str(text)?;
        let now = Utc::now();
        for table in &mut tables {
            table.ensure_identity(now);
            table.validate()?;
        }
        Ok(tables)
    }

    /// Assign an id when missing and stamp the modification time
    pub fn ensure_identity(&mut self, now: DateTime<Utc>) {
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        self.updated_at = now;
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("table name must not be empty".to_string()));
        }
        if let Some(pos) = self.columns.iter().position(|c| c.name.trim().is_empty()) {
            return Err(Error::InvalidInput(format!(
                "column #{} of table '{}' has an empty name",
                pos + 1,
                self.name
            )));
        }
        Ok(())
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary)
    }

    /// Text fed to the embedding provider for this table
    pub fn embedding_text(&self) -> String {
        let mut text = format!(
            "Table name: {}\nDescription: {}\n",
            self.name, self.description
        );
        for column in &self.columns {
            text.push_str(&format!(
                "Column: {}, Type: {}, Description: {}",
                column.name, column.data_type, column.description
            ));
            if column.is_primary {
                text.push_str(", Primary Key");
            }
            if column.is_required {
                text.push_str(", Required");
            }
            text.push('\n');
        }
        text
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: String::new(),
            is_primary: false,
            is_required: true,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Query {
    pub fn new(description: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            sql: sql.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_keeps_column_order() {
        let input = r#"[{
            "name": "orders",
            "description": "customer orders",
            "columns": [
                {"name": "id", "type": "BIGINT", "is_primary": true, "is_required": true},
                {"name": "customer_id", "type": "BIGINT", "description": "buyer", "is_required": true},
                {"name": "note", "type": "TEXT"}
            ]
        }]"#;

        let tables = Table::from_json_array(input).unwrap();
        assert_eq!(tables.len(), 1);

        let json = serde_json::to_string(&tables).unwrap();
        let reparsed: Vec<Table> = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed[0].columns, tables[0].columns);

        let names: Vec<_> = reparsed[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "customer_id", "note"]);
        assert!(!reparsed[0].columns[2].is_required);
    }

    #[test]
    fn test_from_json_array_assigns_missing_ids() {
        let tables =
            Table::from_json_array(r#"[{"name": "a"}, {"id": "fixed", "name": "b"}]"#).unwrap();
        assert!(!tables[0].id.is_empty());
        assert_eq!(tables[1].id, "fixed");
    }

    #[test]
    fn test_from_json_array_rejects_empty_name() {
        let err = Table::from_json_array(r#"[{"name": "  "}]"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_embedding_text_tags() {
        let table = Table::new(
            "users",
            "user table",
            vec![
                Column::new("id", "BIGINT").primary(),
                Column::new("bio", "TEXT").optional().described("about me"),
            ],
        );

        let text = table.embedding_text();
        assert!(text.starts_with("Table name: users\nDescription: user table\n"));
        assert!(text.contains("Column: id, Type: BIGINT, Description: , Primary Key, Required\n"));
        assert!(text.contains("Column: bio, Type: TEXT, Description: about me\n"));
    }
}
