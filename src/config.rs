//! Settings for the player and how they are read.
//!
//! `schema` describes every section of `config.toml`; `load` layers the file
//! and `ENCORE__*` environment overrides on top of the defaults.

mod load;
mod schema;

pub use schema::*;
