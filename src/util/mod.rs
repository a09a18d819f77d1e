//! Utility functions for common operations.
//!
//! This module provides the link-normalization helpers shared by feed
//! identity checks and the equivalence resolver:
//!
//! - **Link normalization**: strict URI parsing into canonical text
//! - **Slash trimming**: single-trailing-slash removal for GUID/link comparison
//!
//! # Examples
//!
//! ```
//! use riffle::util::{normalize_link, trim_trailing_slash};
//!
//! let link = normalize_link("https://Example.com/feed/").unwrap();
//! assert_eq!(link, "https://example.com/feed");
//!
//! assert_eq!(trim_trailing_slash("https://example.com/a/"), "https://example.com/a");
//! ```

mod link;

pub use link::{normalize_link, trim_trailing_slash};
