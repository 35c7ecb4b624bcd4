//! Documents, ids, model metadata and the operations of one collection.
//!
//! # Documents
//!
//! A [Document] is an insertion-ordered map of field names to values.
//! Nested fields are addressed with dotted paths.
//!
//! ```rust,ignore
//! use memstore::doc;
//!
//! let doc = doc! {
//!     name: "John",
//!     address: { city: "Liverpool" },
//! };
//! assert_eq!(doc.get_path("address.city"), Some(&Value::from("Liverpool")));
//! ```
//!
//! # Models
//!
//! Every collection belongs to a [ModelDefinition] naming its id fields and
//! the declared types used to restore values read back from storage.
//! Models with the same collection alias share one collection.
//!
//! # Ids
//!
//! A document without an id is assigned the next value of its collection's
//! sequence, starting at 1. A supplied numeric id moves the sequence past
//! it, so generated ids never collide with supplied ones.

mod document;
mod document_id;
mod find_options;
mod model;
pub(crate) mod operation;

pub use document::*;
pub use document_id::*;
pub use find_options::*;
pub use model::{FieldType, IncludeResolver, ModelDefinition, ModelSettings};
pub use operation::{DeleteResult, Persisted, UpdateResult, UpsertResult};

pub(crate) use model::model_not_found;
pub(crate) use operation::{ReadOperations, WriteOperations};
