//! The form session: one loaded template and everything derived from it.

use std::path::Path;

use crate::error::{Error, Result};
use crate::events::{dispatch, FormObserver, SessionEvent};
use crate::interact::{self, load_record, RecordStore, Refresh};
use crate::layout::{StyleCascade, StyleEdit, StyleToggle, ZoomState};
use crate::model::{ImageStore, StyleOverride, StyleProperty};
use crate::parser::{FieldRegistry, FormParser, LoadOptions};
use crate::profile::FormProfile;
use crate::raster::{build_page_cache, DocumentId, PageCache, PageRasterizer};
use crate::render::{self, GenerateOptions, GeneratedDocument, OverlayPage, RenderOptions};

struct LoadedDocument {
    id: DocumentId,
    bytes: Vec<u8>,
    registry: FieldRegistry,
}

/// Owns the loaded document, its registry, image attachments, the page
/// cache and the last rendered overlay and output.
///
/// Exclusive operations take `&mut self`, so a load, a cache pass and a
/// generation can never overlap.
pub struct FormSession {
    profile: FormProfile,
    load_options: LoadOptions,
    render_options: RenderOptions,
    document: Option<LoadedDocument>,
    next_id: u64,
    images: ImageStore,
    cache: Option<PageCache>,
    zoom: ZoomState,
    selected: Option<String>,
    overlay: Vec<OverlayPage>,
    output: Option<GeneratedDocument>,
    observers: Vec<Box<dyn FormObserver>>,
}

impl FormSession {
    /// Create an empty session for one document family.
    pub fn new(profile: FormProfile) -> Self {
        Self {
            profile,
            load_options: LoadOptions::default(),
            render_options: RenderOptions::default(),
            document: None,
            next_id: 0,
            images: ImageStore::new(),
            cache: None,
            zoom: ZoomState::default(),
            selected: None,
            overlay: Vec::new(),
            output: None,
            observers: Vec::new(),
        }
    }

    /// Set the options used by later loads.
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Set the page selection and debug flag used for overlays. The scale
    /// always comes from the zoom state.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Register an observer.
    pub fn subscribe<O: FormObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            dispatch(observer.as_mut(), &event);
        }
    }

    /// The active profile.
    pub fn profile(&self) -> &FormProfile {
        &self.profile
    }

    /// Load a template, replacing the current one.
    ///
    /// On failure the previous document, registry and cache stay active.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<DocumentId> {
        self.emit(SessionEvent::LoadStarted);
        let registry = match FormParser::from_bytes_with_options(&bytes, self.load_options.clone())
            .and_then(|parser| FieldRegistry::build(&parser, &self.profile))
        {
            Ok(registry) => registry,
            Err(e) => {
                log::warn!("Load failed, keeping previous document: {}", e);
                self.emit(SessionEvent::LoadFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        self.next_id += 1;
        let id = DocumentId(self.next_id);
        let fields = registry.len();
        let pages = registry.page_count();

        let stale: Vec<String> = self
            .images
            .iter()
            .filter(|a| !registry.contains(&a.field))
            .map(|a| a.field.clone())
            .collect();
        for field in stale {
            self.images.remove(&field);
        }

        self.document = Some(LoadedDocument {
            id,
            bytes,
            registry,
        });
        self.cache = None;
        self.selected = None;
        self.overlay.clear();
        self.output = None;

        log::info!("Loaded document {}: {} field(s) on {} page(s)", id, fields, pages);
        self.emit(SessionEvent::LoadFinished {
            document_id: id.0,
            fields,
            pages,
        });
        Ok(id)
    }

    /// Read a template from disk and load it.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<DocumentId> {
        let bytes = std::fs::read(path)?;
        self.load(bytes)
    }

    fn loaded(&self) -> Result<&LoadedDocument> {
        self.document.as_ref().ok_or(Error::NoDocument)
    }

    /// Identifier of the loaded document.
    pub fn document_id(&self) -> Option<DocumentId> {
        self.document.as_ref().map(|d| d.id)
    }

    /// Registry of the loaded document.
    pub fn registry(&self) -> Result<&FieldRegistry> {
        Ok(&self.loaded()?.registry)
    }

    /// Bytes of the loaded template.
    pub fn template_bytes(&self) -> Result<&[u8]> {
        Ok(&self.loaded()?.bytes)
    }

    /// Attached images.
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Attach an image to an image field.
    pub fn attach_image(&mut self, field: &str, data: &[u8]) -> Result<Refresh> {
        let document = self.document.as_ref().ok_or(Error::NoDocument)?;
        let refresh = interact::attach_image(&mut self.images, &document.registry, field, data)?;
        self.emit(SessionEvent::ImageAttached {
            field: field.to_string(),
        });
        Ok(refresh)
    }

    /// Drop a field's image. Returns whether one was attached.
    pub fn remove_image(&mut self, field: &str) -> bool {
        self.images.remove(field).is_some()
    }

    /// Make a field the target of style edits; returns its resolved style.
    pub fn select_field<S: RecordStore + ?Sized>(
        &mut self,
        store: &S,
        field: &str,
    ) -> Result<StyleOverride> {
        if !self.registry()?.contains(field) {
            return Err(Error::UnknownField(field.to_string()));
        }
        let record = load_record(store)?;
        let resolved = StyleCascade::new(&self.profile.style_defaults, record.styles()).resolve(field);
        self.selected = Some(field.to_string());
        self.emit(SessionEvent::FieldSelected {
            field: field.to_string(),
        });
        Ok(resolved)
    }

    /// Field currently targeted by style edits.
    pub fn selected_field(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn selected_or_err(&self) -> Result<String> {
        self.selected
            .clone()
            .ok_or_else(|| Error::field("", "no field selected"))
    }

    /// Store text typed into a field.
    pub fn edit_text<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        field: &str,
        raw: &str,
    ) -> Result<Refresh> {
        let refresh = interact::edit_text(store, field, raw)?;
        self.emit(SessionEvent::FieldEdited {
            field: field.to_string(),
        });
        Ok(refresh)
    }

    /// Check or uncheck a checkbox.
    pub fn toggle_checkbox<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        field: &str,
        checked: bool,
    ) -> Result<Refresh> {
        let refresh = interact::toggle_checkbox(store, field, checked)?;
        self.emit(SessionEvent::CheckboxToggled {
            field: field.to_string(),
            checked,
        });
        Ok(refresh)
    }

    /// Apply raw style-panel input to the selected field.
    pub fn edit_selected_style<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        prop: StyleProperty,
        raw: &str,
    ) -> Result<Refresh> {
        let field = self.selected_or_err()?;
        let edit = interact::edit_style_input(store, &field, prop, raw)?;
        self.emit(SessionEvent::StyleChanged {
            field,
            edit: Some(edit),
        });
        Ok(Refresh::Full)
    }

    /// Flip bold or italic on the selected field.
    pub fn toggle_selected_style<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        toggle: StyleToggle,
    ) -> Result<StyleEdit> {
        let field = self.selected_or_err()?;
        let edit =
            interact::toggle_field_style(store, &self.profile.style_defaults, &field, toggle)?;
        self.emit(SessionEvent::StyleChanged {
            field,
            edit: Some(edit.clone()),
        });
        Ok(edit)
    }

    /// Current zoom.
    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    /// Set an explicit zoom; disables auto-fit.
    pub fn set_zoom_percent(&mut self, percent: u32) {
        self.zoom.set_percent(percent);
        self.emit(SessionEvent::ZoomChanged {
            percent: self.zoom.percent(),
        });
    }

    /// Flip auto-fit.
    pub fn toggle_auto_fit(&mut self) {
        self.zoom.toggle_auto_fit();
    }

    /// Refit the scale to a container width, fitting the first page.
    pub fn refit(&mut self, container_width: f64) {
        let Some(first) = self
            .document
            .as_ref()
            .and_then(|d| d.registry.page(0).copied())
        else {
            return;
        };
        let before = self.zoom.scale;
        let layout = &self.profile.layout;
        self.zoom.refit(
            container_width,
            first.width,
            layout.fit_margin,
            layout.min_container_width,
        );
        if self.zoom.scale != before {
            self.emit(SessionEvent::ZoomChanged {
                percent: self.zoom.percent(),
            });
        }
    }

    /// Lay out the overlay from the current record.
    ///
    /// An unparsable record leaves the previous overlay in place.
    pub fn render_overlay<S: RecordStore + ?Sized>(&mut self, store: &S) -> Result<&[OverlayPage]> {
        let record = load_record(store)?;
        let document = self.loaded()?;
        let options = self.render_options.clone().with_scale(self.zoom.scale);
        let pages = render::render_overlay(
            &document.registry,
            &record,
            &self.images,
            &self.profile,
            &options,
        )?;
        self.overlay = pages;
        Ok(&self.overlay)
    }

    /// Overlay from the last successful render.
    pub fn last_overlay(&self) -> &[OverlayPage] {
        &self.overlay
    }

    /// Produce the filled PDF.
    ///
    /// On failure, including an unparsable record, the previous output is
    /// kept.
    pub fn generate<S: RecordStore + ?Sized>(
        &mut self,
        store: &S,
        options: &GenerateOptions,
    ) -> Result<&GeneratedDocument> {
        self.emit(SessionEvent::GenerationStarted);
        let result = load_record(store).and_then(|record| {
            let document = self.loaded()?;
            render::generate(
                &document.bytes,
                &document.registry,
                &record,
                &self.images,
                &self.profile,
                options,
            )
        });
        match result {
            Ok(generated) => {
                log::debug!("Replacing session output ({} bytes)", generated.bytes.len());
                self.emit(SessionEvent::GenerationFinished {
                    bytes: generated.bytes.len(),
                });
                Ok(self.output.insert(generated))
            }
            Err(e) => {
                log::warn!("Generation failed: {}", e);
                self.emit(SessionEvent::GenerationFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Output from the last successful generation.
    pub fn last_output(&self) -> Option<&GeneratedDocument> {
        self.output.as_ref()
    }

    /// Rasterize every page of the loaded document and install the result.
    pub fn cache_pages<R: PageRasterizer + ?Sized>(&mut self, rasterizer: &mut R) -> Result<()> {
        let document = self.document.as_ref().ok_or(Error::NoDocument)?;
        let observers = &mut self.observers;
        let cache = build_page_cache(
            rasterizer,
            &document.bytes,
            document.id,
            document.registry.page_count(),
            self.profile.layout.base_render_scale,
            |page, total, percent| {
                let event = SessionEvent::PageCached {
                    page,
                    total,
                    percent,
                };
                for observer in observers.iter_mut() {
                    dispatch(observer.as_mut(), &event);
                }
            },
        )?;
        self.install_cache(cache)
    }

    /// Install a cache built elsewhere. A cache for any document other than
    /// the loaded one is rejected.
    pub fn install_cache(&mut self, cache: PageCache) -> Result<()> {
        let current = self.loaded()?.id;
        if cache.document_id() != current {
            return Err(Error::StaleCache {
                built_for: cache.document_id().0,
                current: current.0,
            });
        }
        self.cache = Some(cache);
        self.emit(SessionEvent::CacheInstalled {
            document_id: current.0,
        });
        Ok(())
    }

    /// Installed page cache.
    pub fn page_cache(&self) -> Option<&PageCache> {
        self.cache.as_ref()
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new(FormProfile::default())
    }
}
