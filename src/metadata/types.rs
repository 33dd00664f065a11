//! Entity metadata definitions and the per-entity lookup tables derived
//! from them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::MetadataError;

/// Graph level → entity name for one root entity.
pub type GraphEntityMap = BTreeMap<String, String>;

// =============================================================================
// Definitions (what a metadata file declares)
// =============================================================================

/// One (parent column, child column) pair used to join a referenced entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumnPair {
    pub parent: String,
    pub child: String,
}

impl JoinColumnPair {
    pub fn new(parent: &str, child: &str) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// A scalar field and the column backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub column: String,
    /// Part of the primary key.
    #[serde(default)]
    pub key: bool,
    /// Always selected so downstream joins and result assembly can use it.
    #[serde(default)]
    pub join_eager: bool,
}

/// A named reference from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDef {
    pub name: String,
    pub entity: String,
    #[serde(default)]
    pub join_columns: Vec<JoinColumnPair>,
}

/// Declaration of a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "builders have no effect until used"]
pub struct EntityDef {
    pub name: String,
    pub table: String,
    /// Entities marked as root get a graph entity map.
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub references: Vec<ReferenceDef>,
    /// API field name → entity field name, for fields renamed at the API layer.
    #[serde(default)]
    pub api_names: BTreeMap<String, String>,
}

impl EntityDef {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            root: false,
            fields: Vec::new(),
            references: Vec::new(),
            api_names: BTreeMap::new(),
        }
    }

    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    pub fn field(mut self, name: &str, column: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            column: column.into(),
            key: false,
            join_eager: false,
        });
        self
    }

    /// Add a primary key field.
    pub fn key_field(mut self, name: &str, column: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            column: column.into(),
            key: true,
            join_eager: false,
        });
        self
    }

    /// Add a field that is always selected (typically a foreign key).
    pub fn join_eager_field(mut self, name: &str, column: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            column: column.into(),
            key: false,
            join_eager: true,
        });
        self
    }

    pub fn reference(mut self, name: &str, entity: &str, join_columns: &[(&str, &str)]) -> Self {
        self.references.push(ReferenceDef {
            name: name.into(),
            entity: entity.into(),
            join_columns: join_columns
                .iter()
                .map(|(parent, child)| JoinColumnPair::new(parent, child))
                .collect(),
        });
        self
    }

    pub fn api_name(mut self, api_name: &str, field: &str) -> Self {
        self.api_names.insert(api_name.into(), field.into());
        self
    }
}

/// Top-level shape of a metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFile {
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

// =============================================================================
// Derived lookups
// =============================================================================

/// Lookup tables for one entity, derived from its [`EntityDef`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    pub name: String,
    pub table: String,
    pub field_to_column: HashMap<String, String>,
    pub column_to_field: HashMap<String, String>,
    /// Primary key fields in declaration order.
    pub key_fields: Vec<String>,
    /// Key fields followed by join-eager fields, without duplicates.
    pub join_key_fields: Vec<String>,
    /// Reference name → join column pairs. References without pairs are absent.
    pub join_columns: HashMap<String, Vec<JoinColumnPair>>,
    pub api_names: HashMap<String, String>,
}

impl EntityMetadata {
    /// Derive the lookup tables.
    ///
    /// Fields and columns must map one to one. Declaring the same
    /// field/column pair twice (say, as key and as join-eager) is allowed.
    pub fn from_def(def: &EntityDef) -> Result<Self, MetadataError> {
        let mut meta = EntityMetadata {
            name: def.name.clone(),
            table: def.table.clone(),
            ..Default::default()
        };

        for field in &def.fields {
            if let Some(column) = meta.field_to_column.get(&field.name) {
                if *column != field.column {
                    return Err(MetadataError::ConflictingField {
                        entity: def.name.clone(),
                        field: field.name.clone(),
                        column: column.clone(),
                        other: field.column.clone(),
                    });
                }
            }
            if let Some(name) = meta.column_to_field.get(&field.column) {
                if *name != field.name {
                    return Err(MetadataError::ConflictingColumn {
                        entity: def.name.clone(),
                        column: field.column.clone(),
                        field: name.clone(),
                        other: field.name.clone(),
                    });
                }
            }

            meta.field_to_column
                .insert(field.name.clone(), field.column.clone());
            meta.column_to_field
                .insert(field.column.clone(), field.name.clone());
            if field.key && !meta.key_fields.contains(&field.name) {
                meta.key_fields.push(field.name.clone());
            }
        }

        meta.join_key_fields = meta.key_fields.clone();
        for field in def.fields.iter().filter(|f| f.join_eager) {
            if !meta.join_key_fields.contains(&field.name) {
                meta.join_key_fields.push(field.name.clone());
            }
        }

        for reference in def.references.iter().filter(|r| !r.join_columns.is_empty()) {
            meta.join_columns
                .insert(reference.name.clone(), reference.join_columns.clone());
        }

        meta.api_names = def
            .api_names
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(meta)
    }

    pub fn column_for_field(&self, field: &str) -> Option<&str> {
        self.field_to_column.get(field).map(String::as_str)
    }

    pub fn field_for_column(&self, column: &str) -> Option<&str> {
        self.column_to_field.get(column).map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_to_field.contains_key(column)
    }

    /// The first join pair declared for a reference.
    pub fn first_join_pair(&self, reference: &str) -> Option<&JoinColumnPair> {
        self.join_columns.get(reference).and_then(|pairs| pairs.first())
    }
}
