//! PDF page introspection

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::layout::PageGeometry;

/// Guard against cyclic `/Parent` chains in broken page trees
pub(crate) const MAX_TREE_DEPTH: usize = 64;

/// Page count and size of a document
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocumentInfo {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Size of the first page
    pub page_size: PageGeometry,
}

/// A page's effective MediaBox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.urx - self.llx, self.ury - self.lly)
    }
}

/// Load a PDF from disk
pub fn load_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    Document::load(path).map_err(|e| Error::read(format!("{}: {}", path.display(), e)))
}

/// Load a PDF held in memory
pub fn load_document_bytes(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(Error::read)
}

/// Page count and first page size of a loaded document
pub fn inspect(doc: &Document) -> Result<DocumentInfo> {
    let pages = page_boxes(doc)?;

    Ok(DocumentInfo {
        page_count: pages.len(),
        page_size: pages[0].1.geometry(),
    })
}

/// [`inspect`] a PDF held in memory
pub fn inspect_bytes(bytes: &[u8]) -> Result<DocumentInfo> {
    inspect(&load_document_bytes(bytes)?)
}

/// [`inspect`] a PDF file
pub fn inspect_file(path: &Path) -> Result<DocumentInfo> {
    inspect(&load_document(path)?)
}

/// Every page in document order with its effective MediaBox
///
/// Fails if the document has no pages or a page has no usable MediaBox.
pub fn page_boxes(doc: &Document) -> Result<Vec<(ObjectId, PageBox)>> {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(Error::read("document has no pages"));
    }

    if let Some(declared) = count_pages_from_catalog(doc) {
        if declared != pages.len() {
            tracing::warn!(
                declared,
                found = pages.len(),
                "Page tree /Count disagrees with the pages found; using the page tree"
            );
        }
    }

    pages
        .into_iter()
        .map(|(number, page_id)| {
            let page_box = effective_media_box(doc, page_id)
                .map_err(|e| Error::read(format!("page {number}: {e}")))?;
            Ok((page_id, page_box))
        })
        .collect()
}

/// Read the Count field from the root Pages dictionary
fn count_pages_from_catalog(doc: &Document) -> Option<usize> {
    let catalog = doc.catalog().ok()?;
    let pages_id = catalog.get(b"Pages").ok()?.as_reference().ok()?;
    let count = doc.get_dictionary(pages_id).ok()?.get(b"Count").ok()?.as_i64().ok()?;
    usize::try_from(count).ok()
}

/// Walk up the page tree until a MediaBox is found
fn effective_media_box(doc: &Document, page_id: ObjectId) -> std::result::Result<PageBox, String> {
    let mut node = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node).map_err(|e| e.to_string())?;

        if let Ok(media_box) = dict.get(b"MediaBox") {
            return parse_rectangle(doc, media_box);
        }

        node = parent_of(dict).ok_or_else(|| "no MediaBox".to_string())?;
    }

    Err("page tree too deep".to_string())
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").ok()?.as_reference().ok()
}

fn parse_rectangle(doc: &Document, object: &Object) -> std::result::Result<PageBox, String> {
    let (_, object) = doc.dereference(object).map_err(|e| e.to_string())?;
    let values = object.as_array().map_err(|_| "MediaBox is not an array".to_string())?;

    let numbers = values
        .iter()
        .map(|value| {
            doc.dereference(value)
                .ok()
                .and_then(|(_, value)| value.as_float().ok())
                .ok_or_else(|| "MediaBox holds a non-number".to_string())
        })
        .collect::<std::result::Result<Vec<f32>, String>>()?;

    let [x0, y0, x1, y1] = numbers[..] else {
        return Err(format!("MediaBox has {} values, expected 4", numbers.len()));
    };

    let page_box = PageBox {
        llx: x0.min(x1),
        lly: y0.min(y1),
        urx: x0.max(x1),
        ury: y0.max(y1),
    };
    let geometry = page_box.geometry();
    if geometry.width <= 0.0 || geometry.height <= 0.0 {
        return Err("MediaBox has zero area".to_string());
    }

    Ok(page_box)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Two pages sharing an inherited MediaBox, a third with its own
    fn inherited_box_document() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = [None, None, Some([0, 0, 842, 595])]
            .into_iter()
            .map(|media_box| {
                let mut page = dictionary! {
                    "Type" => "Page",
                    "Parent" => Object::Reference(pages_id),
                };
                if let Some(values) = media_box {
                    page.set("MediaBox", values.into_iter().map(Object::Integer).collect::<Vec<_>>());
                }
                Object::Reference(doc.add_object(page))
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(3),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(595.5),
                    Object::Integer(842),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    #[test]
    fn test_inspect_uses_first_page() {
        let info = inspect(&inherited_box_document()).unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(info.page_size, PageGeometry::new(595.5, 842.0));
    }

    #[test]
    fn test_page_boxes_per_page() {
        let boxes = page_boxes(&inherited_box_document()).unwrap();
        let sizes: Vec<_> = boxes.iter().map(|(_, b)| b.geometry()).collect();
        assert_eq!(
            sizes,
            [
                PageGeometry::new(595.5, 842.0),
                PageGeometry::new(595.5, 842.0),
                PageGeometry::new(842.0, 595.0),
            ]
        );
    }

    #[test]
    fn test_normalizes_flipped_box() {
        let doc = Document::with_version("1.5");
        let rect = Object::Array(vec![
            Object::Integer(612),
            Object::Integer(792),
            Object::Integer(0),
            Object::Integer(0),
        ]);
        let page_box = parse_rectangle(&doc, &rect).unwrap();
        assert_eq!(page_box, PageBox { llx: 0.0, lly: 0.0, urx: 612.0, ury: 792.0 });
    }

    #[test]
    fn test_rejects_bad_boxes() {
        let doc = Document::with_version("1.5");
        let short = Object::Array(vec![Object::Integer(0), Object::Integer(0)]);
        assert!(parse_rectangle(&doc, &short).is_err());

        let flat = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(0),
        ]);
        assert!(parse_rectangle(&doc, &flat).is_err());
    }

    #[test]
    fn test_document_without_pages() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => Object::Integer(0),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        assert!(matches!(inspect(&doc), Err(Error::DocumentRead(_))));
    }

    #[test]
    fn test_inspect_nonexistent_file() {
        let result = inspect_file(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_inspect_garbage_bytes() {
        let result = inspect_bytes(b"this is not a pdf");
        assert!(matches!(result.unwrap_err(), Error::DocumentRead(_)));
    }
}
