//! Data sources.
//!
//! - epoch-second normalization (`timestamps`)
//! - the upstream production feed (`feed`)
//! - the bounded query cache in front of it (`cache`)
//! - static reference files (`reference`)

pub mod cache;
pub mod feed;
pub mod reference;
pub mod timestamps;

pub use cache::QueryCache;
pub use feed::{DEFAULT_CATEGORIES, EXCLUDED_CATEGORIES, FeedClient, FeedSource, parse_public_power};
pub use reference::{ReferenceStore, RowError, load_reference_table};
pub use timestamps::{normalize_timestamps, normalize_timestamps_in};
