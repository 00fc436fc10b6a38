//! Loading options and configuration.

/// Options for loading a form template.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Error handling mode for per-field failures
    pub error_mode: ErrorMode,

    /// Deepest field-tree or parent chain followed
    pub max_field_depth: usize,

    /// Whether a document without `/AcroForm` is rejected
    pub require_form: bool,
}

impl LoadOptions {
    /// Create new load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Abort on the first field that cannot be read.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Skip fields that cannot be read.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set maximum field-tree depth.
    pub fn with_max_field_depth(mut self, depth: usize) -> Self {
        self.max_field_depth = depth;
        self
    }

    /// Reject documents that carry no interactive form.
    pub fn with_require_form(mut self, require: bool) -> Self {
        self.require_form = require;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            max_field_depth: 64,
            require_form: false,
        }
    }
}

/// Error handling mode during registry build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first per-field error
    Strict,
    /// Log and skip the field, keep building
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_builder() {
        let options = LoadOptions::new()
            .strict()
            .with_max_field_depth(8)
            .with_require_form(true);

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.max_field_depth, 8);
        assert!(options.require_form);
    }

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.max_field_depth, 64);
        assert!(!options.require_form);
    }
}
