pub mod arc_consistency;
pub mod assignment;
pub mod backtracking_search;
pub mod domains;
pub mod error;
pub mod grid_config;
pub mod render;
pub mod word_list;

pub use error::Error;

/// When set (`--features check_invariants`), the search asserts that the whole assignment is
/// consistent after every binding.
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
