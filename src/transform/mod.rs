//! Line-oriented output transforms.
//!
//! A transform is an opaque `&str -> String` function applied once per
//! logical line, both to fully buffered output and to live output that
//! arrives in arbitrary chunks.
//!
//! # Example
//!
//! ```
//! use shellmux::transform::{apply_to_buffer, prefix};
//!
//! let tag = prefix("[build]");
//! assert_eq!(apply_to_buffer(&tag, "a\n\nb\n"), "[build] a\n\n[build] b\n");
//! ```

mod line;

pub use line::{apply_to_buffer, identity, prefix, LineTransformer, Transform, LINE_SEPARATOR};
