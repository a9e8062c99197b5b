//! # Kast - Focused Crawling by Page Structure
//!
//! This crate decides whether a web page looks like a set of "pages of
//! interest" by comparing HTML tag structure rather than text, and builds a
//! focused crawler around that decision.
//!
//! ## Features
//!
//! - Tag-structure fingerprints: markup is reduced to an ordered stream of
//!   tag events, with self-closing tags expanded, attributes promoted to
//!   pseudo-tags outside script bodies and comments dropped
//! - Spectral similarity: two fingerprints are compared through the energy
//!   difference of their DFT magnitude spectra
//! - Threshold estimation from known-good sample pages
//! - Breadth-first crawling with rate limiting, per-site locking, CSS-rule
//!   extraction and XML/gzip storage
//!
//! ## Example
//!
//! ```rust
//! use kast::fingerprint::{compare_html, fingerprint, SimilarityOptions};
//!
//! let series = fingerprint("<p></p>");
//! assert_eq!(series.len(), 2);
//!
//! let page = "<div class=\"item\"><h1>A</h1></div>";
//! let score = compare_html(page, page, &SimilarityOptions::default()).unwrap();
//! assert_eq!(score, 1.0);
//! ```

mod error;

pub mod config;
pub mod crawler;
pub mod fingerprint;
pub mod spectral;

pub use error::Error;
pub use fingerprint::{Fingerprint, fingerprint};
pub use spectral::similarity;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::config::{ExtractionRule, KastConfig};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::fingerprint::{CloseEncoding, Fingerprint, SimilarityOptions};
    pub use crate::spectral::{Alignment, SpectralError};
}
