//! PDF Watermark Library
//!
//! A cross-platform library for stamping text watermarks onto PDF pages.
//! This library provides functionality to:
//! - Resolve watermark positions (named anchors, custom offsets, raw coordinates)
//! - Render any number of watermarks onto one transparent overlay page
//! - Merge that overlay on top of every page of a document
//! - Report page count and page size
//!
//! # Example
//!
//! ```no_run
//! use pdf_watermark::pdf::{watermark_file, WatermarkOptions};
//! use pdf_watermark::spec::WatermarkSpec;
//! use std::path::Path;
//!
//! let specs = vec![
//!     WatermarkSpec { rotation: 45, opacity: 0.3, ..WatermarkSpec::new("CONFIDENTIAL") },
//!     WatermarkSpec { position: "bottom-right".into(), ..WatermarkSpec::new("ACME Corp") },
//! ];
//!
//! watermark_file(
//!     Path::new("report.pdf"),
//!     Path::new("report-watermarked.pdf"),
//!     &specs,
//!     &WatermarkOptions::default(),
//! )
//! .expect("Failed to watermark PDF");
//! ```

pub mod color;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod spec;

// Re-export commonly used items
pub use error::{Error, ErrorKind, PositionFallbackUsed, Result};
