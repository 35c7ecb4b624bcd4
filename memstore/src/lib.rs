//! # memstore - embedded file-persisted document store
//!
//! memstore keeps every collection of a store in memory, answers queries by
//! scanning them, and persists a snapshot of the whole store to a single
//! JSON file after each mutation.
//!
//! ## Key Features
//!
//! - **Model collections**: documents keyed by id, with per-collection id
//!   sequences and declared field types restored on every read
//! - **Rich where clauses**: equality, comparison, membership, SQL-style
//!   LIKE, regular expressions and nested `and`/`or`
//! - **Geo proximity**: one `near` clause per query, with distance bounds
//!   in miles, kilometers, meters, feet, degrees or radians
//! - **Query pipeline**: multi-key ordering, projection and pagination
//! - **Read-your-writes**: mutations are visible immediately; a per-write
//!   acknowledgement reports when the snapshot reached disk
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use memstore::{doc, MemoryStore};
//! use memstore::collection::{FindOptions, ModelDefinition};
//! use memstore::filter::field;
//!
//! let store = MemoryStore::builder()
//!     .file("db.json")
//!     .define_model(ModelDefinition::new("User"))
//!     .open()?;
//!
//! store.create("User", doc! { name: "John", seq: 0 })?.wait()?;
//! let found = store.all(
//!     "User",
//!     &FindOptions::new().where_clause(field("seq").gte(0)).order("seq DESC"),
//! )?;
//! store.close()?;
//! ```
//!
//! ## File Format
//!
//! ```text
//! {"ids": {"User": 2}, "models": {"User": {"1": "{\"name\":\"John\",\"seq\":0,\"id\":1}"}}}
//! ```
//!
//! `ids` holds the next sequence value of each collection and `models`
//! the serialized documents by id. A missing file opens as an empty store.
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, ids, model metadata and find options
//! - [`common`] - Values, sort specifications and shared helpers
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Where clauses and their evaluation
//! - [`geo`] - Geo points, distances and near clauses
//! - [`store`] - Store state, storage backends and durability
//! - [`memory_store`] - The store itself
//! - [`store_builder`] - Builder for opening a store
//! - [`store_config`] - Store configuration

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod geo;
pub mod memory_store;
pub mod store;
pub mod store_builder;
pub mod store_config;

pub use memory_store::MemoryStore;
pub use store_builder::MemoryStoreBuilder;
pub use store_config::StoreConfig;
