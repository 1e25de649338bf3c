//! Watermark overlay rendering
//!
//! All watermarks for a document are drawn onto one transparent page, in
//! list order, so later entries paint over earlier ones. Each watermark is
//! its own `q … Q` group with its own opacity state, color and font size;
//! nothing carries over from one watermark to the next.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::error::{Error, PositionFallbackUsed, Result};
use crate::layout::{resolve_position, PageGeometry};
use crate::pdf::transform::TransformMatrix;
use crate::spec::WatermarkSpec;

/// Resource name of the watermark font
pub(crate) const FONT_NAME: &str = "WmF1";

/// Standard-14 face used for every watermark
const FONT_FACE: &str = "Helvetica-Bold";

/// A rendered overlay page, ready to be merged onto a document
#[derive(Debug, Clone)]
pub struct OverlayPage {
    geometry: PageGeometry,
    content: Content,
    opacities: Vec<f32>,
    fallbacks: Vec<PositionFallbackUsed>,
}

impl OverlayPage {
    /// Page size the overlay was laid out for
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// The drawing operations, in paint order
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Number of watermarks drawn
    pub fn len(&self) -> usize {
        self.opacities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opacities.is_empty()
    }

    /// Watermarks whose position string was not understood
    pub fn fallbacks(&self) -> &[PositionFallbackUsed] {
        &self.fallbacks
    }

    pub(crate) fn encode_content(&self) -> Result<Vec<u8>> {
        self.content.encode().map_err(Error::write)
    }

    /// Add the font and opacity states to `doc`, returning the Resources
    /// dictionary the overlay content expects
    pub(crate) fn add_resources(&self, doc: &mut Document) -> Dictionary {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => FONT_FACE,
            "Encoding" => "WinAnsiEncoding",
        });

        let mut states = Dictionary::new();
        for (index, opacity) in self.opacities.iter().enumerate() {
            let state_id = doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(*opacity),
                "CA" => Object::Real(*opacity),
            });
            states.set(graphics_state_name(index), Object::Reference(state_id));
        }

        dictionary! {
            "Font" => dictionary! { FONT_NAME => Object::Reference(font_id) },
            "ExtGState" => states,
        }
    }

    /// The overlay on its own, as a one-page PDF
    pub fn to_document(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let resources = self.add_resources(&mut doc);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), self.encode_content()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.geometry.width),
                Object::Real(self.geometry.height),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(doc)
    }

    /// Write the overlay page to `path`, e.g. for previewing placement
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut doc = self.to_document()?;
        doc.compress();
        doc.save(path).map_err(Error::write)?;
        Ok(())
    }
}

/// Render all watermarks onto one overlay page of the given size
///
/// Every spec is validated before anything is drawn; a bad color, size,
/// opacity or empty text fails the whole render. Unrecognized positions
/// fall back to the page center and are listed in
/// [`OverlayPage::fallbacks`].
///
/// # Example
///
/// ```
/// use pdf_watermark::layout::PageGeometry;
/// use pdf_watermark::pdf::render_overlay;
/// use pdf_watermark::spec::WatermarkSpec;
///
/// let specs = vec![
///     WatermarkSpec { rotation: 45, ..WatermarkSpec::new("DRAFT") },
///     WatermarkSpec { position: "bottom-right".into(), ..WatermarkSpec::new("ACME") },
/// ];
/// let overlay = render_overlay(&specs, PageGeometry::letter()).unwrap();
/// assert_eq!(overlay.len(), 2);
/// ```
pub fn render_overlay(specs: &[WatermarkSpec], geometry: PageGeometry) -> Result<OverlayPage> {
    let colors = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            spec.validate().map_err(|e| match e {
                Error::InvalidWatermarkSpec(reason) => Error::invalid_spec(index, reason),
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut operations = Vec::new();
    let mut fallbacks = Vec::new();

    for (index, (spec, color)) in specs.iter().zip(colors).enumerate() {
        let resolved = resolve_position(spec, geometry);
        if let Some(mut notice) = resolved.fallback {
            notice.index = index;
            fallbacks.push(notice);
        }
        let origin = resolved.point;

        tracing::debug!(
            index,
            text = %spec.text,
            x = origin.x,
            y = origin.y,
            rotation = spec.rotation,
            "Drawing watermark"
        );

        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "gs",
            vec![Object::Name(graphics_state_name(index).into_bytes())],
        ));
        operations.push(Operation::new(
            "rg",
            vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
        ));

        // Rotation pivots on the text origin, not the middle of the text
        let text_origin = if spec.rotation != 0 {
            let ctm = TransformMatrix::rotate(spec.rotation as f32)
                .then(&TransformMatrix::translate(origin.x, origin.y));
            operations.push(Operation::new("cm", ctm.to_operands()));
            (0.0, 0.0)
        } else {
            (origin.x, origin.y)
        };

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.as_bytes().to_vec()), Object::Real(spec.font_size)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(text_origin.0), Object::Real(text_origin.1)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&spec.text), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
        operations.push(Operation::new("Q", vec![]));
    }

    Ok(OverlayPage {
        geometry,
        content: Content { operations },
        opacities: specs.iter().map(|spec| spec.opacity).collect(),
        fallbacks,
    })
}

pub(crate) fn graphics_state_name(index: usize) -> String {
    format!("WmGS{index}")
}

/// Encode text for a WinAnsiEncoding simple font
///
/// Characters the encoding lacks are replaced with `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{A0}'..='\u{FF}' => ch as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators(overlay: &OverlayPage) -> Vec<&str> {
        overlay.content().operations.iter().map(|op| op.operator.as_str()).collect()
    }

    fn numbers(op: &Operation) -> Vec<f32> {
        op.operands.iter().map(|o| o.as_float().unwrap()).collect()
    }

    #[test]
    fn test_unrotated_text_drawn_in_place() {
        let overlay = render_overlay(&[WatermarkSpec::new("DRAFT")], PageGeometry::letter()).unwrap();

        assert_eq!(operators(&overlay), ["q", "gs", "rg", "BT", "Tf", "Td", "Tj", "ET", "Q"]);
        let td = &overlay.content().operations[5];
        assert_eq!(numbers(td), [300.0, 400.0]);
    }

    #[test]
    fn test_rotation_pivots_on_anchor() {
        let spec = WatermarkSpec { rotation: 45, ..WatermarkSpec::new("DRAFT") };
        let overlay = render_overlay(&[spec], PageGeometry::letter()).unwrap();
        let ops = &overlay.content().operations;

        assert_eq!(
            operators(&overlay),
            ["q", "gs", "rg", "cm", "BT", "Tf", "Td", "Tj", "ET", "Q"]
        );

        // Rotation about the origin, then moved onto the anchor
        let ctm = numbers(&ops[3]);
        let half_sqrt2 = std::f32::consts::FRAC_1_SQRT_2;
        for (got, want) in ctm.iter().zip([half_sqrt2, half_sqrt2, -half_sqrt2, half_sqrt2, 300.0, 400.0]) {
            assert!((got - want).abs() < 1e-4, "{ctm:?}");
        }

        // Baseline start sits at the local origin
        assert_eq!(numbers(&ops[6]), [0.0, 0.0]);
    }

    #[test]
    fn test_each_watermark_has_own_state() {
        let specs = vec![
            WatermarkSpec { opacity: 1.0, color: "#FF0000".into(), ..WatermarkSpec::new("A") },
            WatermarkSpec { opacity: 0.5, font_size: 48.0, ..WatermarkSpec::new("B") },
        ];
        let overlay = render_overlay(&specs, PageGeometry::letter()).unwrap();
        let ops = &overlay.content().operations;

        assert_eq!(ops.iter().filter(|op| op.operator == "q").count(), 2);
        assert_eq!(ops.iter().filter(|op| op.operator == "Q").count(), 2);

        let states: Vec<_> = ops
            .iter()
            .filter(|op| op.operator == "gs")
            .map(|op| op.operands[0].as_name().unwrap().to_vec())
            .collect();
        assert_eq!(states, [b"WmGS0".to_vec(), b"WmGS1".to_vec()]);

        let sizes: Vec<_> = ops
            .iter()
            .filter(|op| op.operator == "Tf")
            .map(|op| op.operands[1].as_float().unwrap())
            .collect();
        assert_eq!(sizes, [24.0, 48.0]);
    }

    #[test]
    fn test_later_watermark_drawn_last() {
        let specs = vec![
            WatermarkSpec { opacity: 1.0, ..WatermarkSpec::new("A") },
            WatermarkSpec { opacity: 0.5, ..WatermarkSpec::new("B") },
        ];
        let overlay = render_overlay(&specs, PageGeometry::letter()).unwrap();

        let texts: Vec<_> = overlay
            .content()
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .map(|op| op.operands[0].as_str().unwrap().to_vec())
            .collect();
        assert_eq!(texts, [b"A".to_vec(), b"B".to_vec()]);
    }

    #[test]
    fn test_fallbacks_carry_list_index() {
        let specs = vec![
            WatermarkSpec::new("ok"),
            WatermarkSpec { position: "banana".into(), ..WatermarkSpec::new("lost") },
        ];
        let overlay = render_overlay(&specs, PageGeometry::new(400.0, 600.0)).unwrap();

        assert_eq!(overlay.fallbacks().len(), 1);
        assert_eq!(overlay.fallbacks()[0].index, 1);
        assert_eq!(overlay.fallbacks()[0].position, "banana");
    }

    #[test]
    fn test_invalid_spec_fails_whole_render() {
        let specs = vec![
            WatermarkSpec::new("fine"),
            WatermarkSpec { opacity: 2.0, ..WatermarkSpec::new("bad") },
        ];
        let err = render_overlay(&specs, PageGeometry::letter()).unwrap_err();
        assert!(err.to_string().contains("watermark 2"));

        let specs = vec![WatermarkSpec { color: "#12".into(), ..WatermarkSpec::new("bad") }];
        let err = render_overlay(&specs, PageGeometry::letter()).unwrap_err();
        assert!(matches!(err, Error::InvalidColorFormat(_)));
    }

    #[test]
    fn test_empty_overlay() {
        let overlay = render_overlay(&[], PageGeometry::letter()).unwrap();
        assert!(overlay.is_empty());
        assert!(overlay.content().operations.is_empty());
    }

    #[test]
    fn test_overlay_as_standalone_document() {
        let geometry = PageGeometry::new(400.0, 300.0);
        let overlay = render_overlay(&[WatermarkSpec::new("PREVIEW")], geometry).unwrap();
        let doc = overlay.to_document().unwrap();

        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page = doc.get_dictionary(pages[&1]).unwrap();
        let media_box: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media_box, [0.0, 0.0, 400.0, 300.0]);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Draft (v2)"), b"Draft (v2)".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("€5 — ok"), vec![0x80, b'5', b' ', 0x97, b' ', b'o', b'k']);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }
}
