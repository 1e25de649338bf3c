//! Page geometry and watermark position resolution
//!
//! PDF user space has its origin at the bottom-left of the page with Y
//! increasing upward. Positions arrive in three forms:
//! - a named anchor on a fixed 3×3 grid laid out for a US Letter page
//! - `custom`, with offsets measured from the top-left (screen convention);
//!   a missing offset takes its default
//! - a literal `"x,y"` pair already in PDF space
//!
//! Anything else lands on the page center and is reported back to the caller.

use serde::Serialize;

use crate::error::PositionFallbackUsed;
use crate::spec::WatermarkSpec;

/// A point in PDF user space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// One of the nine named positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|anchor| anchor.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// Absolute anchor coordinate. These do not scale with the page.
    pub fn point(self) -> Point {
        let (x, y) = match self {
            Anchor::TopLeft => (50.0, 750.0),
            Anchor::TopCenter => (300.0, 750.0),
            Anchor::TopRight => (550.0, 750.0),
            Anchor::CenterLeft => (50.0, 400.0),
            Anchor::Center => (300.0, 400.0),
            Anchor::CenterRight => (550.0, 400.0),
            Anchor::BottomLeft => (50.0, 50.0),
            Anchor::BottomCenter => (300.0, 50.0),
            Anchor::BottomRight => (550.0, 50.0),
        };
        Point::new(x, y)
    }
}

/// Token selecting `custom_x` / `custom_y` placement
pub const CUSTOM_POSITION: &str = "custom";

/// `custom_x` when the spec leaves it out
pub const DEFAULT_CUSTOM_X: f32 = 300.0;
/// `custom_y` when the spec leaves it out, measured from the top edge
pub const DEFAULT_CUSTOM_Y: f32 = 400.0;

/// Outcome of [`resolve_position`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPosition {
    /// Text origin (baseline start) in PDF space
    pub point: Point,
    /// Set when the position string was not understood
    pub fallback: Option<PositionFallbackUsed>,
}

/// Resolve where a watermark's text origin goes on a page
///
/// First match wins: named anchor, `custom`, literal `"x,y"`, page center.
/// The fallback notice carries index 0; the compositor rewrites it with the
/// spec's real position in the list.
pub fn resolve_position(spec: &WatermarkSpec, page: PageGeometry) -> ResolvedPosition {
    let position = spec.position.as_str();

    if let Some(anchor) = Anchor::parse(position) {
        return resolved(anchor.point());
    }

    if position == CUSTOM_POSITION {
        let x = spec.custom_x.unwrap_or(DEFAULT_CUSTOM_X);
        let y = spec.custom_y.unwrap_or(DEFAULT_CUSTOM_Y);
        // custom_y is measured downward from the top edge; shift by the
        // font size so the glyph tops, not the baseline, land there
        return resolved(Point::new(x, page.height - y - spec.font_size));
    }

    if let Some(point) = parse_coordinate_pair(position) {
        return resolved(point);
    }

    let point = page.center();
    let notice = PositionFallbackUsed {
        index: 0,
        position: spec.position.clone(),
        point,
    };
    tracing::warn!(
        position = %spec.position,
        x = point.x,
        y = point.y,
        "Unrecognized watermark position, using page center"
    );
    ResolvedPosition {
        point,
        fallback: Some(notice),
    }
}

fn resolved(point: Point) -> ResolvedPosition {
    ResolvedPosition {
        point,
        fallback: None,
    }
}

/// Parse `"x,y"`; both parts must be finite numbers
fn parse_coordinate_pair(position: &str) -> Option<Point> {
    let (x, y) = position.split_once(',')?;
    let x: f32 = x.trim().parse().ok()?;
    let y: f32 = y.trim().parse().ok()?;

    if x.is_finite() && y.is_finite() {
        Some(Point::new(x, y))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec_at(position: &str) -> WatermarkSpec {
        WatermarkSpec {
            position: position.to_string(),
            ..WatermarkSpec::new("DRAFT")
        }
    }

    #[rstest]
    #[case("top-left", 50.0, 750.0)]
    #[case("top-center", 300.0, 750.0)]
    #[case("top-right", 550.0, 750.0)]
    #[case("center-left", 50.0, 400.0)]
    #[case("center", 300.0, 400.0)]
    #[case("center-right", 550.0, 400.0)]
    #[case("bottom-left", 50.0, 50.0)]
    #[case("bottom-center", 300.0, 50.0)]
    #[case("bottom-right", 550.0, 50.0)]
    fn test_anchor_grid(#[case] name: &str, #[case] x: f32, #[case] y: f32) {
        let resolved = resolve_position(&spec_at(name), PageGeometry::letter());
        assert_eq!(resolved.point, Point::new(x, y));
        assert!(resolved.fallback.is_none());
    }

    #[test]
    fn test_anchors_are_absolute() {
        // A4 page: anchors stay on the Letter grid
        let resolved = resolve_position(&spec_at("top-right"), PageGeometry::new(595.0, 842.0));
        assert_eq!(resolved.point, Point::new(550.0, 750.0));
    }

    #[test]
    fn test_custom_position_flips_y() {
        let spec = WatermarkSpec {
            position: "custom".to_string(),
            custom_x: Some(100.0),
            custom_y: Some(50.0),
            font_size: 20.0,
            ..WatermarkSpec::new("DRAFT")
        };

        let resolved = resolve_position(&spec, PageGeometry::letter());
        assert_eq!(resolved.point, Point::new(100.0, 722.0));
        assert!(resolved.fallback.is_none());
    }

    #[rstest]
    #[case(None, None, 300.0, 368.0)]
    #[case(Some(100.0), None, 100.0, 368.0)]
    #[case(None, Some(50.0), 300.0, 718.0)]
    #[case(Some(0.0), Some(0.0), 0.0, 768.0)]
    fn test_custom_missing_offsets_use_defaults(
        #[case] custom_x: Option<f32>,
        #[case] custom_y: Option<f32>,
        #[case] x: f32,
        #[case] y: f32,
    ) {
        let spec = WatermarkSpec {
            position: "custom".to_string(),
            custom_x,
            custom_y,
            ..WatermarkSpec::new("DRAFT")
        };

        // Letter page, default 24pt font: y = 792 - offset - 24
        let resolved = resolve_position(&spec, PageGeometry::letter());
        assert_eq!(resolved.point, Point::new(x, y));
        assert!(resolved.fallback.is_none());
    }

    #[test]
    fn test_literal_coordinates() {
        let resolved = resolve_position(&spec_at("123,456"), PageGeometry::letter());
        assert_eq!(resolved.point, Point::new(123.0, 456.0));
        assert!(resolved.fallback.is_none());

        let resolved = resolve_position(&spec_at(" 10.5 , -4 "), PageGeometry::letter());
        assert_eq!(resolved.point, Point::new(10.5, -4.0));
    }

    #[rstest]
    #[case("banana")]
    #[case("")]
    #[case("1,2,3")]
    #[case("12,")]
    #[case("NaN,4")]
    #[case("Center")]
    fn test_unrecognized_position_uses_page_center(#[case] position: &str) {
        let page = PageGeometry::new(500.0, 700.0);
        let resolved = resolve_position(&spec_at(position), page);

        assert_eq!(resolved.point, Point::new(250.0, 350.0));
        let notice = resolved.fallback.expect("fallback notice");
        assert_eq!(notice.position, position);
        assert_eq!(notice.point, Point::new(250.0, 350.0));
    }

    #[test]
    fn test_letter_size() {
        let letter = PageGeometry::letter();
        assert_eq!(letter.width, 612.0);
        assert_eq!(letter.height, 792.0);
        assert_eq!(letter.center(), Point::new(306.0, 396.0));
    }
}
