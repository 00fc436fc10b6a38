//! Form template parsing: document loading, field tree walk, page
//! association and the field registry.

mod form_parser;
pub(crate) mod objects;
mod options;
mod pages;
mod registry;

pub use form_parser::{FormParser, RawField};
pub use options::{ErrorMode, LoadOptions};
pub use pages::{PageAssignment, PageResolver, PageSource};
pub use registry::{CatalogEntry, FieldRegistry, SkippedField};
