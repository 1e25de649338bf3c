//! Overlay merging using lopdf
//!
//! The overlay is installed once per document as a Form XObject. Each page
//! then gets its original content wrapped in `q`/`Q`, followed by a stream
//! that paints the form, so the watermark always lands on top and in an
//! untransformed coordinate system. Original content streams are never
//! rewritten.

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::layout::PageGeometry;
use crate::pdf::create::OverlayPage;
use crate::pdf::metadata::{page_boxes, PageBox, MAX_TREE_DEPTH};
use crate::pdf::transform::TransformMatrix;

/// Prefix for the overlay's name in a page's `/XObject` resources
const XOBJECT_PREFIX: &str = "Wm";

/// Merge `overlay` on top of every page of `document`
///
/// Page count, order and existing content are preserved. Applying the same
/// overlay twice stacks two copies.
///
/// # Example
///
/// ```no_run
/// use pdf_watermark::pdf::{apply_overlay, inspect, render_overlay};
/// use pdf_watermark::spec::WatermarkSpec;
///
/// let doc = lopdf::Document::load("input.pdf").unwrap();
/// let info = inspect(&doc).unwrap();
/// let overlay = render_overlay(&[WatermarkSpec::new("DRAFT")], info.page_size).unwrap();
/// let mut stamped = apply_overlay(doc, &overlay).unwrap();
/// stamped.save("output.pdf").unwrap();
/// ```
pub fn apply_overlay(mut document: Document, overlay: &OverlayPage) -> Result<Document> {
    let pages = page_boxes(&document)?;
    stamp_pages(&mut document, overlay, &pages)?;
    Ok(document)
}

/// Merge `overlay` onto the given pages only
pub(crate) fn stamp_pages(
    doc: &mut Document,
    overlay: &OverlayPage,
    pages: &[(ObjectId, PageBox)],
) -> Result<()> {
    let resources = overlay.add_resources(doc);
    let content = overlay.encode_content()?;
    let save_state_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

    // Pages sharing a MediaBox origin share one form; pages sharing a
    // resource name share one invocation stream
    let mut forms: HashMap<(u32, u32), ObjectId> = HashMap::new();
    let mut invocations: HashMap<(ObjectId, String), ObjectId> = HashMap::new();

    for (page_id, page_box) in pages {
        let origin = (page_box.llx.to_bits(), page_box.lly.to_bits());
        let form_id = *forms.entry(origin).or_insert_with(|| {
            create_overlay_form(doc, &content, &resources, overlay.geometry(), page_box)
        });

        let name = add_xobject_to_page_resources(doc, *page_id, form_id)?;

        let invoke_id = *invocations.entry((form_id, name.clone())).or_insert_with(|| {
            let invoke_content = format!("Q\nq\n/{name} Do\nQ\n");
            doc.add_object(Stream::new(Dictionary::new(), invoke_content.into_bytes()))
        });

        wrap_page_content(doc, *page_id, save_state_id, invoke_id)?;

        tracing::debug!(page = ?page_id, xobject = %name, "Stamped page");
    }

    Ok(())
}

/// Create the Form XObject carrying the overlay, shifted to the page origin
fn create_overlay_form(
    doc: &mut Document,
    content: &[u8],
    resources: &Dictionary,
    geometry: PageGeometry,
    page_box: &PageBox,
) -> ObjectId {
    // BBox defines the Form's coordinate system: the overlay page itself
    let mut xobject_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "FormType" => Object::Integer(1),
        "BBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(geometry.width),
            Object::Real(geometry.height),
        ],
        "Resources" => resources.clone(),
    };

    // Pages whose MediaBox does not start at (0, 0) get the overlay moved
    // onto their visible area
    let matrix = TransformMatrix::translate(page_box.llx, page_box.lly);
    if !matrix.is_identity() {
        xobject_dict.set("Matrix", matrix.to_operands());
    }

    doc.add_object(Stream::new(xobject_dict, content.to_vec()))
}

/// Register the overlay form in the page's `/XObject` resources under a name
/// the page does not use yet, and return that name
fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<String> {
    let mut resources = effective_resources(doc, page_id)?;

    let mut xobjects = match resources.get(b"XObject") {
        Ok(object) => resolve_dictionary(doc, object)?,
        Err(_) => Dictionary::new(),
    };

    let name = (0..)
        .map(|n| format!("{XOBJECT_PREFIX}{n}"))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| XOBJECT_PREFIX.to_string());

    xobjects.set(name.as_str(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    // Set the Resources directly on the page (not as a reference) so the
    // page gets its own copy, leaving shared or inherited dictionaries alone
    page_dictionary_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));

    Ok(name)
}

/// The page's Resources, following references and `/Parent` inheritance
fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut node = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node).map_err(Error::read)?;

        if let Ok(resources) = dict.get(b"Resources") {
            return resolve_dictionary(doc, resources);
        }

        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = parent,
            Err(_) => break,
        }
    }

    Ok(Dictionary::new())
}

fn resolve_dictionary(doc: &Document, object: &Object) -> Result<Dictionary> {
    let (_, object) = doc.dereference(object).map_err(Error::read)?;
    object.as_dict().cloned().map_err(Error::read)
}

fn page_dictionary_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(Error::read)
}

/// Turn the page's Contents into `[save, original…, invoke]`
///
/// The leading stream saves the graphics state; the invocation stream
/// restores it before painting the overlay, so whatever the original content
/// left behind (transforms, colors, clipping) cannot reach the watermark.
fn wrap_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    save_state_id: ObjectId,
    invoke_id: ObjectId,
) -> Result<()> {
    let existing: Vec<Object> = {
        let page_dict = doc.get_dictionary(page_id).map_err(Error::read)?;

        match page_dict.get(b"Contents") {
            Ok(Object::Reference(content_id)) => match doc.get_object(*content_id) {
                // Indirect array of content streams
                Ok(Object::Array(streams)) => streams.clone(),
                _ => vec![Object::Reference(*content_id)],
            },
            Ok(Object::Array(streams)) => streams.clone(),
            _ => vec![],
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_state_id));
    contents.extend(existing);
    contents.push(Object::Reference(invoke_id));

    page_dictionary_mut(doc, page_id)?.set("Contents", Object::Array(contents));

    Ok(())
}
