//! LinkPure Rule Catalog
//!
//! Loads the shared rule catalog, converts and merges catalog sources,
//! checks catalog test cases, and persists user-defined rules.

pub mod catalog;
pub mod convert;
pub mod merge;
pub mod store;
pub mod verify;

pub use catalog::{Catalog, CatalogError};
pub use convert::{convert_clearurls, convert_linkumori};
pub use merge::{merge_sources, MergeStats};
pub use store::{RuleStore, StoreError};
pub use verify::{verify, TestFailure};
