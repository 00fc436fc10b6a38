//! Page raster cache.
//!
//! Rasterizing a page is the host's job; this module drives a
//! [`PageRasterizer`] over every page, reports progress and tags the result
//! with the document it was built for so a late result can be rejected.

use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::PageGeometry;

/// Identifies one loaded document within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPage {
    /// Encoded PNG
    pub png: Vec<u8>,
    /// Page width in points
    pub native_width: f64,
    /// Page height in points
    pub native_height: f64,
}

/// Renders PDF pages to images.
pub trait PageRasterizer {
    /// Render the page at 0-based `index` at `scale` pixels per point.
    fn render_page(&mut self, pdf: &[u8], index: usize, scale: f64) -> Result<RasterPage>;
}

/// Rendered pages for one document.
#[derive(Debug, Clone)]
pub struct PageCache {
    document_id: DocumentId,
    scale: f64,
    pages: Vec<RasterPage>,
}

impl PageCache {
    /// Document the pages were rendered from.
    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    /// Scale the pages were rendered at.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Page by 0-based index.
    pub fn page(&self, index: usize) -> Option<&RasterPage> {
        self.pages.get(index)
    }

    /// All pages in order.
    pub fn pages(&self) -> &[RasterPage] {
        &self.pages
    }

    /// Number of cached pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether nothing was cached.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Progress after finishing page `done` (1-based) of `total`.
///
/// The midpoint of each page's share is reported so the bar never shows
/// 100 until the pass is complete.
pub fn progress_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    let percent = (done as f64 - 0.5) / total as f64 * 100.0;
    percent.round().clamp(0.0, 100.0) as u32
}

/// Render every page, calling `on_progress(page, total, percent)` after each
/// page and once more with 100 on completion.
pub fn build_page_cache<R, F>(
    rasterizer: &mut R,
    pdf: &[u8],
    document_id: DocumentId,
    page_count: usize,
    scale: f64,
    mut on_progress: F,
) -> Result<PageCache>
where
    R: PageRasterizer + ?Sized,
    F: FnMut(usize, usize, u32),
{
    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let page = rasterizer
            .render_page(pdf, index, scale)
            .map_err(|e| match e {
                Error::Raster(_) => e,
                other => Error::Raster(format!("page {}: {}", index + 1, other)),
            })?;
        pages.push(page);
        on_progress(index + 1, page_count, progress_percent(index + 1, page_count));
    }
    on_progress(page_count, page_count, 100);
    log::debug!(
        "Cached {} page(s) for document {} at scale {}",
        page_count,
        document_id,
        scale
    );
    Ok(PageCache {
        document_id,
        scale,
        pages,
    })
}

/// Rasterizer that paints blank white pages at the right size.
///
/// Useful when only the overlay matters, such as layout checks.
#[derive(Debug, Clone)]
pub struct BlankRasterizer {
    pages: Vec<PageGeometry>,
}

impl BlankRasterizer {
    /// Create a rasterizer for pages of the given sizes.
    pub fn new(pages: Vec<PageGeometry>) -> Self {
        Self { pages }
    }
}

impl PageRasterizer for BlankRasterizer {
    fn render_page(&mut self, _pdf: &[u8], index: usize, scale: f64) -> Result<RasterPage> {
        let page = self
            .pages
            .get(index)
            .ok_or(Error::PageOutOfRange(index + 1, self.pages.len()))?;
        let width = (page.width * scale).round().max(1.0) as u32;
        let height = (page.height * scale).round().max(1.0) as u32;
        let canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Raster(e.to_string()))?;
        Ok(RasterPage {
            png,
            native_width: page.width,
            native_height: page.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl PageRasterizer for Failing {
        fn render_page(&mut self, _pdf: &[u8], index: usize, _scale: f64) -> Result<RasterPage> {
            if index == 1 {
                Err(Error::Io(std::io::Error::other("device lost")))
            } else {
                Ok(RasterPage {
                    png: Vec::new(),
                    native_width: 612.0,
                    native_height: 792.0,
                })
            }
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(1, 4), 13);
        assert_eq!(progress_percent(4, 4), 88);
        assert_eq!(progress_percent(1, 1), 50);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn test_build_reports_progress_then_done() {
        let mut raster = BlankRasterizer::new(vec![PageGeometry::letter(); 2]);
        let mut seen = Vec::new();
        let cache = build_page_cache(&mut raster, b"", DocumentId(3), 2, 0.5, |p, t, pct| {
            seen.push((p, t, pct))
        })
        .unwrap();

        assert_eq!(seen, vec![(1, 2, 25), (2, 2, 75), (2, 2, 100)]);
        assert_eq!(cache.document_id(), DocumentId(3));
        assert_eq!(cache.len(), 2);
        let page = image::load_from_memory(&cache.page(0).unwrap().png).unwrap();
        assert_eq!((page.width(), page.height()), (306, 396));
    }

    #[test]
    fn test_build_stops_at_first_failure() {
        let mut seen = Vec::new();
        let err = build_page_cache(&mut Failing, b"", DocumentId(1), 3, 1.0, |p, _, _| {
            seen.push(p)
        })
        .unwrap_err();
        assert!(matches!(err, Error::Raster(msg) if msg.contains("page 2")));
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_blank_rasterizer_out_of_range() {
        let mut raster = BlankRasterizer::new(vec![PageGeometry::letter()]);
        assert!(matches!(
            raster.render_page(b"", 4, 1.0),
            Err(Error::PageOutOfRange(5, 1))
        ));
    }
}
