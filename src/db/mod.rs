//! Database module: tab session storage persisted in SQLite.
//!
//! - `model`: rows returned by the repository.
//! - `repo`: SQL-only functions over the `session_storage` table.
//!
//! Callers normally go through `crate::preview::SqliteSessionStore`; the
//! repository API is re-exported at `crate::db::*` for tools and tests.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::SessionEntry;
