//! Introspected database schema documents.
//!
//! Reads the JSON produced by `.show database schema as json`, either the
//! whole `{"Databases": {...}}` document or a single database object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DeltaError, Result};

/// Schema of one database as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseSchema {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tables: BTreeMap<String, TableSchema>,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub ordered_columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub doc_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnSchema {
    pub name: String,
    pub csl_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSchema>,
    /// Body including its braces, as stored by the service.
    pub body: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub doc_string: Option<String>,
}

/// A function parameter. Tabular parameters have no `CslType` and list
/// their columns instead; an empty column list is the wildcard schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputParameterSchema {
    pub name: String,
    #[serde(default)]
    pub csl_type: Option<String>,
    #[serde(default)]
    pub csl_default_value: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClusterDocument {
    databases: BTreeMap<String, DatabaseSchema>,
}

/// Parse an introspected schema document.
///
/// When the document lists several databases, `database` picks one. A
/// document with exactly one database needs no name.
pub fn parse_database_schema(json: &str, database: Option<&str>) -> Result<DatabaseSchema> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| DeltaError::SchemaParse(e.to_string()))?;

    if value.get("Databases").is_none() {
        let schema: DatabaseSchema =
            serde_json::from_value(value).map_err(|e| DeltaError::SchemaParse(e.to_string()))?;
        if let (Some(wanted), Some(actual)) = (database, schema.name.as_deref()) {
            if wanted != actual {
                return Err(DeltaError::SchemaParse(format!(
                    "document describes database '{}', expected '{}'",
                    actual, wanted
                )));
            }
        }
        return Ok(schema);
    }

    let document: ClusterDocument =
        serde_json::from_value(value).map_err(|e| DeltaError::SchemaParse(e.to_string()))?;
    let mut databases = document.databases;

    let schema = match database {
        Some(name) => databases.remove(name).ok_or_else(|| {
            DeltaError::SchemaParse(format!("database '{}' not found in document", name))
        })?,
        None if databases.len() == 1 => match databases.pop_first() {
            Some((_, schema)) => schema,
            None => DatabaseSchema::default(),
        },
        None => {
            let names: Vec<&str> = databases.keys().map(String::as_str).collect();
            return Err(DeltaError::SchemaParse(format!(
                "document holds {} databases ({}); name one with 'database'",
                names.len(),
                names.join(", ")
            )));
        }
    };

    log::debug!(
        "Read schema document; tables={}, functions={}",
        schema.tables.len(),
        schema.functions.len()
    );
    Ok(schema)
}
