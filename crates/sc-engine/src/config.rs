//! Engine configuration and error types.

/// Recognition options for [`crate::Engine`].
///
/// All switches default to off. The vocabulary starts from the base
/// (English) table with the built-in `ja` alias table merged in;
/// `with_locale` merges further tables and clearing `locales` leaves
/// the base table alone.
#[derive(Debug, Clone)]
pub struct Options {
    /// Only recognize regions bounded by matching dividers, never from
    /// a bare paragraph.
    pub require_divider: bool,
    /// Drop the joint decoration when the label is the only visible
    /// content on its line.
    pub remove_trailing_joint: bool,
    /// Recognize `[Label]` / `［Label］` bracket markers.
    pub bracket_markers: bool,
    /// Recognize `> [!NOTE]`-style blockquote alerts.
    pub directive_alerts: bool,
    /// Locale alias tables to merge into the vocabulary.
    pub locales: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            require_divider: false,
            remove_trailing_joint: false,
            bracket_markers: false,
            directive_alerts: false,
            locales: vec!["ja".to_owned()],
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_require_divider(mut self, on: bool) -> Self {
        self.require_divider = on;
        self
    }

    #[must_use]
    pub fn with_remove_trailing_joint(mut self, on: bool) -> Self {
        self.remove_trailing_joint = on;
        self
    }

    #[must_use]
    pub fn with_bracket_markers(mut self, on: bool) -> Self {
        self.bracket_markers = on;
        self
    }

    #[must_use]
    pub fn with_directive_alerts(mut self, on: bool) -> Self {
        self.directive_alerts = on;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locales.push(locale.into());
        self
    }
}

/// Errors from constructing an [`crate::Engine`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A definition name or alias produced an invalid pattern.
    #[error("invalid pattern for definition `{name}`: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}
