//! Schema metadata: column descriptors, classification rules, table definitions and the
//! synchronisation report.

mod classify;
mod column;
mod definition;
mod introspect;
pub mod sync;

pub use classify::{
    FieldAccessor, FieldClassification, FieldDefault, LAZY_LENGTH_THRESHOLD, SemanticType, classify,
};
pub use column::{ColumnDescriptor, KeyRole, parse_enum_values};
pub use definition::{FieldDef, TableDefinition};
pub use introspect::Introspector;
pub use sync::{ColumnChange, SyncReport};

pub(crate) use classify::SqlType;
pub(crate) use definition::class_name_for;
