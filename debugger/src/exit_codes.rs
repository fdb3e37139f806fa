//! Stable exit codes for debugger CLI commands.

/// Command succeeded; for `debugger debug`, a bug node was localized.
pub const OK: i32 = 0;
/// Invalid trace, arguments, configuration, or protocol misuse.
pub const INVALID: i32 = 1;
/// Debugging session concluded without finding a bug in the chosen tree.
pub const NO_BUG: i32 = 2;
