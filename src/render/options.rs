//! Rendering and generation options.

use std::ops::RangeInclusive;

/// Options for building the overlay.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Display scale (pixels per point)
    pub scale: f64,

    /// Emit a labeled debug box for every field
    pub debug: bool,

    /// Page selection
    pub page_selection: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display scale. Non-positive values are ignored.
    pub fn with_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    /// Enable or disable debug boxes.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set specific pages.
    pub fn with_page_list(mut self, pages: Vec<u32>) -> Self {
        self.page_selection = PageSelection::Pages(pages);
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            debug: false,
            page_selection: PageSelection::All,
        }
    }
}

/// Options for producing the final document.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Stamp widget appearances into page content and drop the form
    pub flatten: bool,

    /// Compress streams before saving
    pub compress: bool,
}

impl GenerateOptions {
    /// Create new generate options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable flattening.
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            flatten: true,
            compress: true,
        }
    }
}

/// Page selection for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Check a 0-based page index.
    pub fn includes_index(&self, index: usize) -> bool {
        u32::try_from(index + 1).is_ok_and(|page| self.includes(page))
    }

    /// Parse a 1-based page list such as `"2"`, `"1-3"` or `"1,3,5-7"`.
    ///
    /// A single span stays a `Range`; anything with commas becomes a sorted,
    /// deduplicated `Pages` list. Page 0 and reversed spans are rejected.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            let span = parse_span(s)?;
            return Ok(if span.start() == span.end() {
                PageSelection::Pages(vec![*span.start()])
            } else {
                PageSelection::Range(span)
            });
        }

        let mut pages: Vec<u32> = Vec::new();
        for part in s.split(',') {
            pages.extend(parse_span(part)?);
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_span(part: &str) -> Result<RangeInclusive<u32>, String> {
    let page = |text: &str| -> Result<u32, String> {
        match text.trim().parse::<u32>() {
            Ok(0) => Err("pages are numbered from 1".to_string()),
            Ok(n) => Ok(n),
            Err(_) => Err(format!("'{}' is not a page number", text.trim())),
        }
    };
    match part.split_once('-') {
        Some((first, last)) => {
            let (first, last) = (page(first)?, page(last)?);
            if first > last {
                return Err(format!("range {}-{} runs backwards", first, last));
            }
            Ok(first..=last)
        }
        None => page(part).map(|p| p..=p),
    }
}
