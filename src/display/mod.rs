//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for levels, keys and trust state.

pub mod keys;
pub mod levels;
pub mod trust;

pub use keys::{format_key_details, format_key_list, format_new_secret};
pub use levels::{format_features, format_level_check, format_level_info, format_resolved};
pub use trust::{format_assessment, format_context_list, format_history};
