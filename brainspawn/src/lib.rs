//! Named groups of terminal sessions, launched and killed as a unit.
//!
//! Groups come from two independently editable sources: a project file and a
//! user-scoped settings store. The crate keeps a merged, validated snapshot of
//! both, watches them for external edits, and writes changes back to the
//! source each group came from.
//!
//! - **[`core`]**: Pure, deterministic logic (validation, variable
//!   substitution, launch planning). No I/O.
//! - **[`io`]**: Backing-source files, tool configuration and file watching.
//!
//! [`store`] merges the sources; [`terminals`] tracks and launches sessions
//! through the host traits in [`host`]; [`commands`] ties everything together
//! behind the user-facing commands; [`editor`] and [`views`] adapt the state
//! for the configuration editor, tree view and status bar.

pub mod commands;
pub mod core;
pub mod editor;
pub mod exit_codes;
pub mod host;
pub mod io;
pub mod logging;
pub mod store;
pub mod terminals;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod views;
