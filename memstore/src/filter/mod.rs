//! Where clauses and their evaluation.
//!
//! A [Predicate] is a list of clauses that must all hold. Each clause is a
//! field condition or a nested `and`/`or` list of predicates. Predicates are
//! built with the fluent API or parsed from JSON:
//!
//! ```rust,ignore
//! use memstore::filter::{field, or, Predicate};
//!
//! let predicate = field("seq").gte(2).and(field("name").like("%St%")?);
//! let parsed = Predicate::from_json(&json!({"seq": {"gte": 2}}))?;
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: literal values (loose), `neq`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`, `between`
//! - **Membership**: `inq`, `nin`
//! - **Pattern**: `like`, `nlike`, `ilike`, `nilike`, `regexp`
//! - **Logical**: `and`, `or`
//! - **Geo**: `near`, resolved by the geo stage of a query

mod filter;
mod fluent;

mod basic_filters;
mod logical_filters;
mod pattern_filters;
mod range_filters;

pub use filter::*;
pub use fluent::*;

pub(crate) use basic_filters::*;
pub(crate) use pattern_filters::*;
pub(crate) use range_filters::*;
