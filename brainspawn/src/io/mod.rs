//! I/O helpers: backing sources, tool configuration and file watching.

pub mod config;
pub mod paths;
pub mod project_file;
pub mod settings;
pub mod watcher;
