//! In-memory state, its persisted form and the machinery that keeps the
//! backing destination up to date.
//!
//! All collections of one destination live in a single [StoreState]. Stores
//! opened on the same file share that state and its durability queue.

mod backend;
mod collection_store;
mod durability;
mod registry;
mod shared_store;
mod store_state;

pub use backend::*;
pub use durability::WriteAck;
pub use store_state::StoreState;

pub(crate) use collection_store::*;
pub(crate) use durability::DurabilityQueue;
pub(crate) use registry::shared_for_file;
pub(crate) use shared_store::SharedStore;
