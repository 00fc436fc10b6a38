//! Session events and observers.
//!
//! A [`crate::FormSession`] reports everything a host may want to reflect in
//! its UI: loading, edits, page caching progress and generation. Observers
//! implement [`FormObserver`]; every hook has a no-op default so an observer
//! only overrides what it cares about.
//!
//! # Example
//!
//! ```
//! use formfill::events::{FormObserver, SessionEvent};
//!
//! struct ProgressPrinter;
//!
//! impl FormObserver for ProgressPrinter {
//!     fn on_progress(&mut self, page: usize, total: usize, percent: u32) {
//!         println!("page {}/{} ({}%)", page, total, percent);
//!     }
//! }
//! ```

use serde::Serialize;

use crate::layout::StyleEdit;

/// Events emitted by a form session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A document load has started.
    LoadStarted,

    /// A document replaced the previous one.
    LoadFinished {
        /// Identifier of the new document
        document_id: u64,
        /// Registered fields
        fields: usize,
        /// Page count
        pages: usize,
    },

    /// A load failed; the previous document is still active.
    LoadFailed {
        /// Error message
        reason: String,
    },

    /// A field became the target of style edits.
    FieldSelected {
        /// Field name
        field: String,
    },

    /// A text value changed.
    FieldEdited {
        /// Field name
        field: String,
    },

    /// A checkbox changed state.
    CheckboxToggled {
        /// Field name
        field: String,
        /// New state
        checked: bool,
    },

    /// An image was attached to a field.
    ImageAttached {
        /// Field name
        field: String,
    },

    /// A field's user style override changed.
    StyleChanged {
        /// Field name
        field: String,
        /// Edit that was applied
        #[serde(skip)]
        edit: Option<StyleEdit>,
    },

    /// The display scale changed.
    ZoomChanged {
        /// New zoom in percent
        percent: u32,
    },

    /// One page of the raster cache finished.
    PageCached {
        /// 1-based page number
        page: usize,
        /// Pages being cached
        total: usize,
        /// Overall progress
        percent: u32,
    },

    /// A raster cache became active.
    CacheInstalled {
        /// Document the cache belongs to
        document_id: u64,
    },

    /// Output generation has started.
    GenerationStarted,

    /// Output generation succeeded.
    GenerationFinished {
        /// Size of the generated PDF
        bytes: usize,
    },

    /// Output generation failed; the previous output is unchanged.
    GenerationFailed {
        /// Error message
        reason: String,
    },
}

impl SessionEvent {
    /// Check if this event ends a load, successfully or not.
    pub fn is_load_boundary(&self) -> bool {
        matches!(
            self,
            SessionEvent::LoadFinished { .. } | SessionEvent::LoadFailed { .. }
        )
    }

    /// Check if this event changes what the overlay shows.
    pub fn needs_redraw(&self) -> bool {
        matches!(
            self,
            SessionEvent::LoadFinished { .. }
                | SessionEvent::CheckboxToggled { .. }
                | SessionEvent::ImageAttached { .. }
                | SessionEvent::StyleChanged { .. }
                | SessionEvent::ZoomChanged { .. }
                | SessionEvent::CacheInstalled { .. }
        )
    }
}

/// Trait for receiving session events.
///
/// [`FormObserver::on_event`] sees every event. The narrower hooks are
/// called after it for the events they describe.
pub trait FormObserver {
    /// Called for every event.
    fn on_event(&mut self, event: &SessionEvent) {
        let _ = event;
    }

    /// Called when a page of the raster cache finishes.
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `total` - Pages being cached
    /// * `percent` - Overall progress, 100 on the last page
    fn on_progress(&mut self, page: usize, total: usize, percent: u32) {
        let _ = (page, total, percent);
    }

    /// Called when a load or generation fails.
    fn on_failure(&mut self, reason: &str) {
        let _ = reason;
    }
}

/// Send an event to an observer, including the narrower hooks.
pub(crate) fn dispatch(observer: &mut dyn FormObserver, event: &SessionEvent) {
    observer.on_event(event);
    match event {
        SessionEvent::PageCached {
            page,
            total,
            percent,
        } => observer.on_progress(*page, *total, *percent),
        SessionEvent::LoadFailed { reason } | SessionEvent::GenerationFailed { reason } => {
            observer.on_failure(reason)
        }
        _ => {}
    }
}

/// Observer that records every event, useful for hosts that poll.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl FormObserver for EventLog {
    fn on_event(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

/// Observer backed by a closure.
pub struct FnObserver<F>(pub F);

impl<F: FnMut(&SessionEvent)> FormObserver for FnObserver<F> {
    fn on_event(&mut self, event: &SessionEvent) {
        (self.0)(event)
    }
}

/// Observer that forwards to several observers in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn FormObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer to the chain.
    pub fn with_observer<O: FormObserver + 'static>(mut self, observer: O) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl FormObserver for CompositeObserver {
    fn on_event(&mut self, event: &SessionEvent) {
        for observer in &mut self.observers {
            dispatch(observer.as_mut(), event);
        }
    }
}
