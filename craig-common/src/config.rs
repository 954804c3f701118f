//! Compile-time constants

/// Add command line flags `-v` and `-V`.
pub const ENABLE_LOGGING: bool = true;
/// Whether to do bounds checking when accessing array elements.
pub const ENABLE_BOUNDS_CHECKING: bool = cfg!(debug_assertions);
/// Check the `requires!()` assertions at runtime (cheap).
pub const CHECK_PRECONDITIONS: bool = true;
/// Check the `invariant!()` assertions at runtime (cheap).
pub const CHECK_INVARIANTS: bool = true;
/// Replay every resolution chain and check that each pivot occurs in
/// opposite phases (moderately expensive).
pub const CHECK_RESOLVENTS: bool = cfg!(debug_assertions);
