//! Stable exit codes for `brainspawn` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid configuration, a load warning during `validate`, or any other error.
pub const INVALID: i32 = 1;
/// `brainspawn plan` named a group that does not exist.
pub const NOT_FOUND: i32 = 2;
