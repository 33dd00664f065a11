//! Error types for query compilation.
//!
//! Every failure is synchronous and final: a compile call either yields one
//! SQL string or one [`QueryError`] naming the offending graph level, entity
//! or column.

/// Errors raised while building conditions or compiling a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Query template cannot be empty for native query building")]
    EmptyQueryTemplate,

    #[error("{field} cannot be missing when building a {builder}")]
    MissingRequiredField {
        builder: &'static str,
        field: &'static str,
    },

    #[error(
        "No field named '{field}' (getter get{getter}()) found in entity {entity}. \
         Field names exposed to the API are derived from getters, consider renaming the getter"
    )]
    FieldNotFound {
        field: String,
        getter: String,
        entity: String,
    },

    #[error("Root has been set as '{root}'; graph level '{graph_key}' is not a child of it")]
    GraphKeyNotChildOfRoot { root: String, graph_key: String },

    #[error("Add graph level '{graph_key}' to the joins to complete the association path")]
    AddGraphKey { graph_key: String },

    #[error(
        "No association defined between entity {parent} and {child} through reference '{reference}'; \
         declare its join columns in the entity metadata"
    )]
    AssociationNotDefined {
        parent: String,
        child: String,
        reference: String,
    },

    #[error("Column '{column}' added for aggregation not found in entity {entity}")]
    AggregateColumnNotFound { column: String, entity: String },

    #[error("Entity {entity} has no metadata registered")]
    EntityMetadataMissing { entity: String },

    #[error("Graph level '{graph_key}' does not map to any entity")]
    UnknownGraphLevel { graph_key: String },
}

impl QueryError {
    /// Build a [`QueryError::FieldNotFound`] with the getter hint filled in.
    pub fn field_not_found(field: &str, entity: &str) -> Self {
        let mut chars = field.chars();
        let getter = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        QueryError::FieldNotFound {
            field: field.to_string(),
            getter,
            entity: entity.to_string(),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
