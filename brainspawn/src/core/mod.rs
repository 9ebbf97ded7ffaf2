//! Pure, deterministic logic shared by the store, launcher and views.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod launch_plan;
pub mod schema;
pub mod substitution;
pub mod types;
