//! Semantic container recognition over markdown event streams.
//!
//! This crate turns labeled paragraphs like `Notice. A notice.` into
//! labeled HTML containers by rewriting the flat event stream produced
//! by `pulldown-cmark` before it is rendered. A region can be a bare
//! paragraph, a span of blocks between two matching dividers, a
//! `[Label]` bracket marker, or a `> [!NOTE]`-style alert blockquote.
//!
//! # Architecture
//!
//! [`Engine::new`] compiles the vocabulary (from `sc-vocab`) into one
//! pattern set per definition. A pass walks the stream once: the driver
//! finds candidate blocks, the scanner matches the marker shape against
//! the block's leading inline events, and the rewriter splices the
//! decorated label and the container boundaries into the stream in
//! place. The engine is immutable and shareable; all per-pass state is
//! local to the pass.
//!
//! # Example
//!
//! ```
//! use sc_engine::{Engine, Options};
//!
//! let engine = Engine::new(Options::new()).unwrap();
//! let html = engine.render_html("Notice. Mind the gap.");
//! assert!(html.starts_with("<section class=\"notice\""));
//! ```

mod alert;
mod bracket;
mod config;
mod driver;
mod engine;
mod pattern;
mod rewriter;
mod scanner;
mod stream;
mod util;

pub use config::{EngineError, Options};
pub use engine::Engine;
pub use sc_vocab::{NAME_SENTINEL, SemanticDefinition, build_vocabulary};
pub use stream::{RuleStyle, TokenStream};
pub use util::escape_html;
