//! Diagonal watermark runs

use crate::error::{Error, Result};
use crate::layout::PageGeometry;
use crate::spec::WatermarkSpec;

/// Angle of every stamp in a diagonal run
const DIAGONAL_ROTATION: i32 = 45;

/// Options for [`diagonal_pattern`]
#[derive(Debug, Clone)]
pub struct DiagonalOptions {
    /// Font size in points
    pub font_size: f32,
    /// Fill color as `#rrggbb`
    pub color: String,
    /// Fill alpha for every stamp
    pub opacity: f32,
    /// Distance between stamps along each axis, in points
    pub spacing: f32,
}

impl Default for DiagonalOptions {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            color: "#000000".to_string(),
            opacity: 0.3,
            spacing: 100.0,
        }
    }
}

/// Repeat `text` along the page diagonal from the bottom-left corner
///
/// Stamps sit at `(i * spacing, i * spacing)`, rotated 45°, for as long as
/// the point stays on the page. The result is an ordinary watermark list for
/// [`render_overlay`](crate::pdf::render_overlay).
pub fn diagonal_pattern(
    text: &str,
    options: &DiagonalOptions,
    page: PageGeometry,
) -> Result<Vec<WatermarkSpec>> {
    if !options.spacing.is_finite() || options.spacing <= 0.0 {
        return Err(Error::InvalidWatermarkSpec(format!(
            "spacing must be a positive number, got {}",
            options.spacing
        )));
    }

    let diagonal = page.width.hypot(page.height);
    let steps = (diagonal / options.spacing) as usize + 1;

    let specs = (0..steps)
        .map(|i| i as f32 * options.spacing)
        .take_while(|offset| *offset < page.width && *offset < page.height)
        .map(|offset| WatermarkSpec {
            position: format!("{offset},{offset}"),
            font_size: options.font_size,
            color: options.color.clone(),
            opacity: options.opacity,
            rotation: DIAGONAL_ROTATION,
            ..WatermarkSpec::new(text)
        })
        .collect();

    Ok(specs)
}
