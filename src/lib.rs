//! Serial Preferences - typed, grouped preferences backed by a plain key/value document.
//!
//! A [`schema::PreferenceSchema`] declares named, typed settings organized into
//! labeled groups. A [`proxy::PreferenceProxy`] reads and writes one document
//! against that schema, resolving each key as local override, then parent, then
//! default. Only overridden keys are ever stored.

pub mod cli;
pub mod commands;
pub mod introspection;
pub mod proxy;
pub mod schema;
pub mod storage;
pub mod validators;

pub use introspection::{
    ChoiceDescription, GroupDescription, PreferenceDescription, PreferenceValue, export_schema,
    export_values,
};
pub use proxy::{Document, MAX_INHERITANCE_DEPTH, PreferenceProxy, Resolved, ValueSource};
pub use schema::{Choice, Pref, PreferenceGroup, PreferenceSchema, SchemaBuilder, ValueKind};
pub use validators::{CoercionError, ValidationError, coerce_and_validate};


/// Library-level error type for preference operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown preference key: '{0}'")]
    UnknownPreference(String),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Schema configuration error: {0}")]
    SchemaConfiguration(String),

    #[error("Parent proxy uses schema '{parent}', expected '{child}'")]
    SchemaMismatch { child: String, parent: String },

    #[error("Inheritance chain deeper than {0} levels")]
    InheritanceTooDeep(usize),

    #[error("Inheritance cycle detected: {0}")]
    InheritanceCycle(String),

    #[error("Preference document is already borrowed for writing")]
    DocumentBusy,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("KDL error: {0}")]
    Kdl(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for preference operations.
pub type Result<T> = std::result::Result<T, Error>;
