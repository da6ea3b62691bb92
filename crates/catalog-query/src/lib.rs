//! Read path: turns raw search parameters into a normalized query plan and
//! executes it against the store.

pub mod builder;
mod service;

pub use builder::QueryPlan;
pub use service::CatalogQueryService;
