//! The configured recognition engine.

use sc_vocab::SemanticDefinition;

use crate::alert::LeadIndex;
use crate::config::{EngineError, Options};
use crate::driver::Driver;
use crate::pattern::{CompiledPattern, compile_all};
use crate::stream::TokenStream;

/// A compiled semantic-container engine.
///
/// Construction compiles every pattern once; the engine itself is
/// immutable afterwards and can be shared across threads and reused for
/// any number of documents. Per-pass state (the consumed-position set,
/// the alert match cache) lives in the pass, not here.
pub struct Engine {
    defs: Vec<SemanticDefinition>,
    patterns: Vec<CompiledPattern>,
    lead_index: LeadIndex,
    options: Options,
}

impl Engine {
    /// Build an engine over the built-in vocabulary, with the locale
    /// alias tables named in the options merged in.
    pub fn new(options: Options) -> Result<Self, EngineError> {
        let locales: Vec<&str> = options.locales.iter().map(String::as_str).collect();
        let defs = sc_vocab::build_vocabulary(&locales);
        Self::with_vocabulary(defs, options)
    }

    /// Build an engine over a caller-supplied vocabulary.
    ///
    /// Definition order is match-priority order; overlapping names or
    /// aliases resolve to the earlier entry.
    pub fn with_vocabulary(
        defs: Vec<SemanticDefinition>,
        options: Options,
    ) -> Result<Self, EngineError> {
        let patterns = compile_all(&defs, &options)?;
        let lead_index = LeadIndex::build(&defs);
        Ok(Self { defs, patterns, lead_index, options })
    }

    #[must_use]
    pub fn definitions(&self) -> &[SemanticDefinition] {
        &self.defs
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    pub(crate) fn lead_index(&self) -> &LeadIndex {
        &self.lead_index
    }

    /// Run one recognition pass over a stream, mutating it in place.
    ///
    /// The stream must be fully parsed before the pass runs; splicing
    /// invalidates any event indices recorded elsewhere, so run this
    /// after any other index-sensitive post-processing. A second pass
    /// over an already-rewritten stream is a no-op.
    pub fn apply(&self, stream: &mut TokenStream<'_>) {
        Driver::new(self).run(stream);
    }

    /// Parse, rewrite and render a markdown document in one call.
    #[must_use]
    pub fn render_html(&self, source: &str) -> String {
        let mut stream = TokenStream::parse(source);
        self.apply(&mut stream);
        stream.to_html()
    }
}
