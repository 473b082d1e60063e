//! Screen controllers.
//!
//! Controllers read the query cache and emit `Intent`s. They never write the
//! location themselves; the shell applies intents to `UrlSync` and feeds the
//! resulting state back.

pub mod detail;
pub mod list;

pub use detail::{DetailController, DetailView};
pub use list::{ListController, ListView, PageControls};
