//! PDF manipulation module

pub mod create;
pub mod merge;
pub mod metadata;
pub mod pattern;
pub mod stamp;
pub mod transform;

// Re-export commonly used items
pub use create::{render_overlay, OverlayPage};
pub use merge::apply_overlay;
pub use metadata::{inspect, inspect_bytes, inspect_file, page_boxes, DocumentInfo, PageBox};
pub use pattern::{diagonal_pattern, DiagonalOptions};
pub use stamp::{
    watermark_bytes, watermark_document, watermark_file, PageSizing, WatermarkOptions,
    WatermarkReport,
};
