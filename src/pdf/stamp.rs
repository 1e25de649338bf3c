//! End-to-end watermarking of documents, byte buffers and files

use std::path::Path;

use lopdf::{Document, ObjectId};

use crate::error::{Error, PositionFallbackUsed, Result};
use crate::layout::PageGeometry;
use crate::pdf::create::render_overlay;
use crate::pdf::merge::stamp_pages;
use crate::pdf::metadata::{load_document, load_document_bytes, page_boxes, PageBox};
use crate::spec::WatermarkSpec;

/// Which page size watermark positions are resolved against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSizing {
    /// Lay out once for the first page and reuse that overlay everywhere
    #[default]
    Uniform,
    /// Lay out separately for every distinct page size
    PerPage,
}

/// Options for watermarking a document
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub sizing: PageSizing,
    /// Compress streams before writing
    pub compress: bool,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            sizing: PageSizing::Uniform,
            compress: true,
        }
    }
}

/// Summary of one watermarking run
#[derive(Debug, Clone)]
pub struct WatermarkReport {
    /// Pages stamped
    pub page_count: usize,
    /// Watermarks drawn on each page
    pub watermark_count: usize,
    /// First page size, used for layout unless sizing is per page
    pub geometry: PageGeometry,
    /// Watermarks that were moved to the page center, one notice per
    /// watermark and distinct page center
    pub fallbacks: Vec<PositionFallbackUsed>,
}

/// Watermark every page of a loaded document
///
/// An empty watermark list is rejected.
pub fn watermark_document(
    mut document: Document,
    specs: &[WatermarkSpec],
    options: &WatermarkOptions,
) -> Result<(Document, WatermarkReport)> {
    if specs.is_empty() {
        return Err(Error::InvalidWatermarkSpec("no watermarks specified".to_string()));
    }

    let pages = page_boxes(&document)?;
    let geometry = pages[0].1.geometry();

    let groups = match options.sizing {
        PageSizing::Uniform => vec![(geometry, pages.clone())],
        PageSizing::PerPage => group_by_geometry(&pages),
    };

    let mut fallbacks: Vec<PositionFallbackUsed> = Vec::new();
    for (group_geometry, group_pages) in &groups {
        let overlay = render_overlay(specs, *group_geometry)?;
        stamp_pages(&mut document, &overlay, group_pages)?;

        // Each layout centers on its own page size
        for notice in overlay.fallbacks() {
            if !fallbacks.contains(notice) {
                fallbacks.push(notice.clone());
            }
        }
    }

    let report = WatermarkReport {
        page_count: pages.len(),
        watermark_count: specs.len(),
        geometry,
        fallbacks,
    };

    tracing::info!(
        pages = report.page_count,
        watermarks = report.watermark_count,
        layouts = groups.len(),
        fallbacks = report.fallbacks.len(),
        "Watermarked document"
    );

    Ok((document, report))
}

/// Watermark a PDF held in memory and return the new file contents
pub fn watermark_bytes(
    input: &[u8],
    specs: &[WatermarkSpec],
    options: &WatermarkOptions,
) -> Result<(Vec<u8>, WatermarkReport)> {
    let document = load_document_bytes(input)?;
    let (mut document, report) = watermark_document(document, specs, options)?;

    if options.compress {
        document.compress();
    }

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(Error::write)?;

    Ok((buffer, report))
}

/// Watermark `input` and write the result to `output`
///
/// The result is written to a uniquely named temporary file beside `output`
/// and renamed into place once complete; on any failure the temporary file
/// is removed and `output` is left untouched. `input` and `output` may be
/// the same path.
pub fn watermark_file(
    input: &Path,
    output: &Path,
    specs: &[WatermarkSpec],
    options: &WatermarkOptions,
) -> Result<WatermarkReport> {
    let document = load_document(input)?;
    let (mut document, report) = watermark_document(document, specs, options)?;

    if options.compress {
        document.compress();
    }

    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".pdf-watermark-")
        .suffix(".pdf")
        .tempfile_in(directory)
        .map_err(|e| Error::write(format!("{}: {}", directory.display(), e)))?;

    document.save_to(temp.as_file_mut()).map_err(Error::write)?;
    temp.as_file().sync_all().map_err(Error::write)?;
    temp.persist(output)
        .map_err(|e| Error::write(format!("{}: {}", output.display(), e.error)))?;

    tracing::info!(input = %input.display(), output = %output.display(), "Saved watermarked PDF");

    Ok(report)
}

/// Group pages by size, keeping first-seen order
fn group_by_geometry(pages: &[(ObjectId, PageBox)]) -> Vec<(PageGeometry, Vec<(ObjectId, PageBox)>)> {
    let mut groups: Vec<(PageGeometry, Vec<(ObjectId, PageBox)>)> = Vec::new();

    for page in pages {
        let geometry = page.1.geometry();
        match groups.iter_mut().find(|(g, _)| *g == geometry) {
            Some((_, members)) => members.push(*page),
            None => groups.push((geometry, vec![*page])),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: f32, height: f32) -> (ObjectId, PageBox) {
        (
            (width as u32, 0),
            PageBox { llx: 0.0, lly: 0.0, urx: width, ury: height },
        )
    }

    #[test]
    fn test_group_by_geometry_keeps_order() {
        let pages = [page(612.0, 792.0), page(842.0, 595.0), page(612.0, 792.0)];
        let groups = group_by_geometry(&pages);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, PageGeometry::letter());
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, PageGeometry::new(842.0, 595.0));
    }

    #[test]
    fn test_default_options() {
        let options = WatermarkOptions::default();
        assert_eq!(options.sizing, PageSizing::Uniform);
        assert!(options.compress);
    }
}
