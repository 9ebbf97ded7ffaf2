//! Terminal session bookkeeping and group launching.

pub mod launcher;
pub mod registry;
