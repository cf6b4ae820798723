pub mod loader;
pub mod schema;

pub use loader::{load_embedded, load_from_path, load_from_str, ConfigError, EMBEDDED_RULES};
pub use schema::{
    LineEndings, Metadata, Operation, PatchConfig, PatchDefinition, Query, ValidationError,
    ValidationIssue,
};
