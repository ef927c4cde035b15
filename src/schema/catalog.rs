//! # Schema Catalog
//!
//! Storage and lookup for relation schemas with type definitions.
//! Supports both session (temporary) and persistent schemas.

use super::{ColumnSchema, RelationSchema, SchemaType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Error types for schema operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    /// Schema already exists for this relation
    #[error("Schema already exists for relation '{0}'")]
    AlreadyExists(String),
    /// Schema not found for relation
    #[error("No schema found for relation '{0}'")]
    NotFound(String),
    /// Invalid schema definition
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Duplicate column name
    #[error("Duplicate column name: '{0}'")]
    DuplicateColumn(String),
    /// Existing data violates schema
    #[error("Existing data in '{relation}' violates schema: {message}")]
    DataViolation { relation: String, message: String },
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Catalog for storing and looking up relation schemas.
/// Supports both persistent schemas (saved to disk) and session schemas (memory only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// Persistent schemas (saved to disk)
    persistent: HashMap<String, RelationSchema>,
    /// Session schemas (memory only, cleared on disconnect)
    #[serde(skip)]
    session: HashMap<String, RelationSchema>,
}

impl SchemaCatalog {
    /// Create a new empty schema catalog
    pub fn new() -> Self {
        SchemaCatalog {
            persistent: HashMap::new(),
            session: HashMap::new(),
        }
    }

    /// Register a persistent schema
    pub fn register(&mut self, schema: RelationSchema) -> Result<(), SchemaError> {
        self.register_persistent(schema)
    }

    /// Register a persistent schema (saved to disk)
    pub fn register_persistent(&mut self, schema: RelationSchema) -> Result<(), SchemaError> {
        self.validate_schema(&schema)?;

        let name = schema.name.clone();

        // Check for existing persistent schema
        if self.persistent.contains_key(&name) {
            return Err(SchemaError::AlreadyExists(name));
        }

        self.persistent.insert(name, schema);
        Ok(())
    }

    /// Register a session schema (memory only)
    pub fn register_session(&mut self, schema: RelationSchema) -> Result<(), SchemaError> {
        self.validate_schema(&schema)?;

        let name = schema.name.clone();

        // Check for existing session schema
        if self.session.contains_key(&name) {
            return Err(SchemaError::AlreadyExists(name));
        }

        self.session.insert(name, schema);
        Ok(())
    }

    /// Register or update a persistent schema
    pub fn register_or_update(&mut self, schema: RelationSchema) -> Result<(), SchemaError> {
        self.validate_schema(&schema)?;
        self.persistent.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Register or update a session schema
    pub fn register_or_update_session(
        &mut self,
        schema: RelationSchema,
    ) -> Result<(), SchemaError> {
        self.validate_schema(&schema)?;
        self.session.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Get schema for a relation.
    /// Session schemas shadow persistent schemas.
    pub fn get(&self, relation: &str) -> Option<&RelationSchema> {
        self.session
            .get(relation)
            .or_else(|| self.persistent.get(relation))
    }

    /// Get mutable schema for a relation (session first, then persistent)
    pub fn get_mut(&mut self, relation: &str) -> Option<&mut RelationSchema> {
        if self.session.contains_key(relation) {
            self.session.get_mut(relation)
        } else {
            self.persistent.get_mut(relation)
        }
    }

    /// Check if a schema exists for a relation (session or persistent)
    pub fn has_schema(&self, relation: &str) -> bool {
        self.session.contains_key(relation) || self.persistent.contains_key(relation)
    }

    /// Check if a persistent schema exists for a relation
    pub fn has_persistent_schema(&self, relation: &str) -> bool {
        self.persistent.contains_key(relation)
    }

    /// Check if a session schema exists for a relation
    pub fn has_session_schema(&self, relation: &str) -> bool {
        self.session.contains_key(relation)
    }

    /// Remove a schema (from both session and persistent)
    pub fn remove(&mut self, relation: &str) -> Option<RelationSchema> {
        self.session
            .remove(relation)
            .or_else(|| self.persistent.remove(relation))
    }

    /// Remove a persistent schema only, leaving any session schema in place.
    pub fn remove_persistent(&mut self, relation: &str) -> Option<RelationSchema> {
        self.persistent.remove(relation)
    }

    /// Remove a session schema only, leaving any persistent schema in place.
    pub fn remove_session(&mut self, relation: &str) -> Option<RelationSchema> {
        self.session.remove(relation)
    }

    /// Names of all relations with a schema, persistent or session.
    pub fn relations(&self) -> impl Iterator<Item = &String> {
        self.persistent.keys().chain(self.session.keys())
    }

    /// Persist the catalog's persistent schemas to a JSON file. Session
    /// schemas are never written out.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SchemaError::IoError(e.to_string()))?;
        fs::write(path, json).map_err(|e| SchemaError::IoError(e.to_string()))
    }

    /// Load a catalog's persistent schemas from a JSON file written by
    /// [`SchemaCatalog::save_to_file`].
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let json = fs::read_to_string(path).map_err(|e| SchemaError::IoError(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| SchemaError::IoError(e.to_string()))
    }

    /// Validate a schema's internal consistency before it is registered:
    /// no duplicate column names, and (if present) foreign-key/type-alias
    /// references that at least look well-formed.
    fn validate_schema(&self, schema: &RelationSchema) -> Result<(), SchemaError> {
        if schema.name.trim().is_empty() {
            return Err(SchemaError::InvalidSchema("relation name cannot be empty".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for column in &schema.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn(column.name.clone()));
            }
        }

        for column in &schema.columns {
            if let SchemaType::Named(alias) = &column.data_type {
                if alias.trim().is_empty() {
                    return Err(SchemaError::InvalidSchema(format!(
                        "column '{}' references an empty type alias",
                        column.name
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnAnnotation;

    fn user_schema() -> RelationSchema {
        RelationSchema::new("User").with_column(ColumnSchema::new("id", SchemaType::Int))
    }

    #[test]
    fn registers_and_looks_up_persistent_schema() {
        let mut catalog = SchemaCatalog::new();
        catalog.register(user_schema()).unwrap();
        assert!(catalog.has_persistent_schema("User"));
        assert_eq!(catalog.get("User").unwrap().name, "User");
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut catalog = SchemaCatalog::new();
        catalog.register(user_schema()).unwrap();
        let err = catalog.register(user_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::AlreadyExists(_)));
    }

    #[test]
    fn session_schema_shadows_persistent_schema() {
        let mut catalog = SchemaCatalog::new();
        catalog.register_persistent(user_schema()).unwrap();
        let overridden = RelationSchema::new("User")
            .with_column(ColumnSchema::new("id", SchemaType::Int))
            .with_column(ColumnSchema::new("note", SchemaType::String));
        catalog.register_session(overridden).unwrap();

        assert_eq!(catalog.get("User").unwrap().arity(), 2);
        catalog.remove_session("User");
        assert_eq!(catalog.get("User").unwrap().arity(), 1);
    }

    #[test]
    fn rejects_duplicate_column_names() {
        let mut catalog = SchemaCatalog::new();
        let bad = RelationSchema::new("Bad")
            .with_column(ColumnSchema::new("id", SchemaType::Int))
            .with_column(ColumnSchema::new("id", SchemaType::String));
        let err = catalog.register(bad).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn(_)));
    }

    #[test]
    fn unrecognized_annotation_combo_still_validates() {
        let mut catalog = SchemaCatalog::new();
        let schema = RelationSchema::new("Tagged")
            .with_column(ColumnSchema::new("id", SchemaType::Int).with_annotation(ColumnAnnotation::Primary));
        assert!(catalog.register(schema).is_ok());
    }
}
