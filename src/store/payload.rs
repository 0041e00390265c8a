//! Payload schema for table points in Qdrant

use crate::error::{Error, Result};
use crate::models::Table;
use chrono::Utc;
use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Stable point id for a table name, so re-indexing overwrites in place
pub fn table_point_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// A table point ready to be upserted to Qdrant
#[derive(Debug, Clone)]
pub struct TablePoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: TablePayload,
}

impl TablePoint {
    pub fn new(table: &Table, vector: Vec<f32>) -> Result<Self> {
        Ok(Self {
            id: table_point_id(&table.name),
            vector,
            payload: TablePayload::from_table(table)?,
        })
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        PointStruct::new(self.id.to_string(), self.vector, self.payload.to_qdrant_payload())
    }
}

/// Payload stored with each table point.
///
/// The full record travels as JSON so a search hit can be turned back into a
/// [`Table`] without a second lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePayload {
    pub table_id: String,
    pub name: String,
    pub description: String,
    pub table_json: String,
    pub indexed_at: String,
}

impl TablePayload {
    pub fn from_table(table: &Table) -> Result<Self> {
        Ok(Self {
            table_id: table.id.clone(),
            name: table.name.clone(),
            description: table.description.clone(),
            table_json: serde_json::to_string(table)?,
            indexed_at: Utc::now().to_rfc3339(),
        })
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();
        map.insert("table_id".to_string(), string_to_qdrant(&self.table_id));
        map.insert("name".to_string(), string_to_qdrant(&self.name));
        map.insert("description".to_string(), string_to_qdrant(&self.description));
        map.insert("table_json".to_string(), string_to_qdrant(&self.table_json));
        map.insert("indexed_at".to_string(), string_to_qdrant(&self.indexed_at));
        map
    }

    /// Rebuild the table record carried by a search hit
    pub fn table_from_map(map: &Map<String, Value>) -> Result<Table> {
        let json = map
            .get("table_json")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Qdrant("point payload has no table_json".to_string()))?;
        Ok(serde_json::from_str(json)?)
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s.to_string())),
    }
}

/// Convert Qdrant value to serde_json Value
pub(crate) fn json_from_qdrant_value(v: QdrantValue) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(json_from_qdrant_value).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}
