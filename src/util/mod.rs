//! Utility functions for common operations.
//!
//! - **Text processing**: whitespace normalization and removal of characters
//!   that cannot appear in an XML document
//!
//! # Examples
//!
//! ```
//! use pagefeed::util::{collapse_whitespace, strip_control_chars};
//!
//! let text = collapse_whitespace("  Entry \n Title ");
//! assert_eq!(text, "Entry Title");
//! assert_eq!(strip_control_chars("a\x00b"), "ab");
//! ```

mod text;

pub use text::{collapse_whitespace, strip_control_chars, strip_paragraph_wrapper};
