//! Application module: the presentation model used by the TUI and runtime.
//!
//! `App` lives in `app::model` and tracks focus, cursors, popups and the
//! status line.

mod model;

pub use model::*;
