//! Goals Common - Shared utilities and constants for the goal tracker
//!
//! # Examples
//!
//! ```
//! use goals_common::{GOALS_KEY, round_to, truncate_string};
//!
//! assert_eq!(GOALS_KEY, "goals");
//! assert_eq!(truncate_string("hello world", 5), "he...");
//! assert_eq!(round_to(12.3456, 2), 12.35);
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
