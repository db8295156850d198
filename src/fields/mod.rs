//! Policy fields: names, value grammars, context fields and the registry
//! tying them to query builders.

pub mod context;
pub mod names;
pub mod regexes;
pub mod registry;

pub use context::ContextFields;
pub use registry::{registry, FieldMetadata, FieldRegistry, RuntimeFieldCategory, ValueRegex};
