//! Track catalog: the tracks a playlist can be built from.
//!
//! The catalog is read from a JSON file when one is configured, otherwise it
//! is built by scanning the music directory.

mod catalog;
mod model;
mod scan;

pub use catalog::{Catalog, CatalogError};
pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
