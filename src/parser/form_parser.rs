//! AcroForm reader on top of lopdf.

use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::model::{Geometry, PageGeometry, WidgetType};

use super::objects::{deref, get_array, get_deref, get_dict, get_int, get_name, get_text, read_rect};
use super::options::LoadOptions;

/// A terminal field as declared in the form tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    /// Partial names joined with `.`
    pub name: String,
    /// `/FT`, possibly inherited
    pub field_type: Option<Vec<u8>>,
    /// `/Ff`, possibly inherited
    pub flags: u32,
    /// Widget rectangles in tree order; `None` when unreadable
    pub widgets: Vec<Option<Geometry>>,
}

impl RawField {
    /// Declared widget type.
    pub fn widget_type(&self) -> WidgetType {
        WidgetType::from_pdf(self.field_type.as_deref(), self.flags)
    }
}

/// Form template reader.
pub struct FormParser {
    doc: LopdfDocument,
    options: LoadOptions,
}

impl FormParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, LoadOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, LoadOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: LoadOptions) -> Result<Self> {
        detect_format_from_bytes(data)?;

        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;

        if doc.get_pages().is_empty() {
            return Err(Error::DocumentLoad("document has no pages".to_string()));
        }

        let parser = Self { doc, options };
        if parser.options.require_form && parser.acroform().is_none() {
            return Err(Error::DocumentLoad(
                "document has no interactive form".to_string(),
            ));
        }
        Ok(parser)
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R, options: LoadOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Underlying lopdf document.
    pub fn document(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Options this parser was created with.
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Get page count.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Whether the catalog carries `/AcroForm`.
    pub fn has_form(&self) -> bool {
        self.acroform().is_some()
    }

    fn catalog(&self) -> Option<&Dictionary> {
        self.doc
            .trailer
            .get(b"Root")
            .ok()
            .and_then(|root| deref(&self.doc, root))
            .and_then(|obj| obj.as_dict().ok())
    }

    fn acroform(&self) -> Option<&Dictionary> {
        self.catalog()
            .and_then(|catalog| get_dict(&self.doc, catalog, b"AcroForm"))
    }

    /// Page sizes from `/MediaBox`, following the page tree for inherited
    /// values. Pages without a readable box are treated as US Letter.
    pub fn page_geometries(&self) -> Vec<PageGeometry> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(page_num, page_id)| {
                self.doc
                    .get_dictionary(page_id)
                    .ok()
                    .and_then(|page| self.inherited_media_box(page))
                    .unwrap_or_else(|| {
                        log::warn!("Page {} has no usable MediaBox; assuming Letter", page_num);
                        PageGeometry::letter()
                    })
            })
            .collect()
    }

    fn inherited_media_box(&self, page: &Dictionary) -> Option<PageGeometry> {
        let mut node = page;
        for _ in 0..self.options.max_field_depth {
            if let Ok(media_box) = node.get(b"MediaBox") {
                let rect = read_rect(&self.doc, media_box)?;
                return Some(PageGeometry::new(rect.width, rect.height));
            }
            node = get_dict(&self.doc, node, b"Parent")?;
        }
        None
    }

    /// Walk `/AcroForm /Fields` and collect terminal fields.
    pub fn form_fields(&self) -> Vec<RawField> {
        let mut fields = Vec::new();
        let Some(acroform) = self.acroform() else {
            log::info!("Document has no AcroForm; no fields to register");
            return fields;
        };
        let Some(roots) = get_array(&self.doc, acroform, b"Fields") else {
            log::warn!("AcroForm has no Fields array");
            return fields;
        };
        for root in roots {
            self.walk_field(root, None, None, 0, 0, &mut fields);
        }
        fields
    }

    fn walk_field(
        &self,
        node: &Object,
        parent_name: Option<&str>,
        inherited_type: Option<&[u8]>,
        inherited_flags: u32,
        depth: usize,
        fields: &mut Vec<RawField>,
    ) {
        if depth >= self.options.max_field_depth {
            log::warn!(
                "Field tree deeper than {} under '{}'; stopping",
                self.options.max_field_depth,
                parent_name.unwrap_or("")
            );
            return;
        }
        let Some(dict) = deref(&self.doc, node).and_then(|obj| obj.as_dict().ok()) else {
            return;
        };

        let partial = get_text(dict, b"T");
        let name = match (parent_name, partial) {
            (Some(parent), Some(partial)) => format!("{}.{}", parent, partial),
            (Some(parent), None) => parent.to_string(),
            (None, Some(partial)) => partial,
            (None, None) => String::new(),
        };
        let field_type = get_name(dict, b"FT").or(inherited_type);
        let flags = get_int(dict, b"Ff")
            .map(|f| f as u32)
            .unwrap_or(inherited_flags);

        let mut widgets = Vec::new();
        let mut has_child_fields = false;
        match get_array(&self.doc, dict, b"Kids") {
            Some(kids) => {
                for kid in kids {
                    let Some(kid_dict) = deref(&self.doc, kid).and_then(|o| o.as_dict().ok())
                    else {
                        continue;
                    };
                    if kid_dict.has(b"T") {
                        has_child_fields = true;
                        self.walk_field(kid, Some(&name), field_type, flags, depth + 1, fields);
                    } else {
                        widgets.push(self.widget_rect(kid_dict));
                    }
                }
                if has_child_fields && widgets.is_empty() {
                    return;
                }
            }
            None => {
                if is_widget(dict) {
                    widgets.push(self.widget_rect(dict));
                }
            }
        }

        if name.is_empty() {
            log::debug!("Skipping unnamed field with {} widget(s)", widgets.len());
            return;
        }
        fields.push(RawField {
            name,
            field_type: field_type.map(<[u8]>::to_vec),
            flags,
            widgets,
        });
    }

    fn widget_rect(&self, widget: &Dictionary) -> Option<Geometry> {
        widget
            .get(b"Rect")
            .ok()
            .and_then(|rect| read_rect(&self.doc, rect))
    }

    /// Every named widget annotation in page order, as `(name, page_index)`.
    ///
    /// Bare widget kids take the qualified name of their parent field.
    pub fn annotation_sightings(&self) -> Vec<(String, usize)> {
        let mut sightings = Vec::new();
        for (index, (_page_num, page_id)) in self.doc.get_pages().into_iter().enumerate() {
            let Ok(page) = self.doc.get_dictionary(page_id) else {
                continue;
            };
            let Some(annots) = get_array(&self.doc, page, b"Annots") else {
                continue;
            };
            for annot in annots {
                let Some(dict) = deref(&self.doc, annot).and_then(|o| o.as_dict().ok()) else {
                    continue;
                };
                if get_name(dict, b"Subtype") != Some(b"Widget".as_slice()) {
                    continue;
                }
                if let Some(name) = self.qualified_name(dict) {
                    sightings.push((name, index));
                }
            }
        }
        sightings
    }

    /// Fully qualified name of a field or widget via its `/Parent` chain.
    fn qualified_name(&self, dict: &Dictionary) -> Option<String> {
        let mut parts = Vec::new();
        let mut node = Some(dict);
        let mut depth = 0;
        while let Some(current) = node {
            if depth >= self.options.max_field_depth {
                break;
            }
            if let Some(partial) = get_text(current, b"T") {
                parts.push(partial);
            }
            node = get_deref(&self.doc, current, b"Parent").and_then(|o| o.as_dict().ok());
            depth += 1;
        }
        if parts.is_empty() {
            return None;
        }
        parts.reverse();
        Some(parts.join("."))
    }
}

fn is_widget(dict: &Dictionary) -> bool {
    get_name(dict, b"Subtype") == Some(b"Widget".as_slice()) || dict.has(b"Rect")
}
