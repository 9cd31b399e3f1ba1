//! Compiled marker patterns, one set per vocabulary definition.
//!
//! Each definition's name and aliases are joined into a single anchored
//! alternation, and the joint character is compiled into the same
//! pattern rather than checked in a second step. That keeps alternation
//! priority correct when one alias prefixes another: `warn|warning`
//! against `Warning.` must commit to the spelling that leaves a valid
//! joint right behind it, and the regex engine only does that when the
//! joint is part of the pattern.

use regex::{Regex, RegexBuilder};
use sc_vocab::SemanticDefinition;

use crate::config::{EngineError, Options};

/// Optional label numbering: ` 2`, ` A`, ` 1.2-3`, up to seven parts.
const NUMBERING: &str =
    "(?:[ 　](?:[0-9]{1,6}|[A-Za-z]{1,2})(?:[.\\-](?:[0-9]{1,6}|[A-Za-z]{1,2})){0,6})?";

/// The compiled pattern set for one definition.
pub(crate) struct CompiledPattern {
    /// Label at the head of a plain text run, joint attached.
    /// Group 1 is the label, group 2 a half-width joint, group 3 a
    /// full-width joint.
    pub plain: Regex,
    /// Emphasis interior that ends with the joint. Groups: label, joint.
    pub emph_inner: Regex,
    /// Emphasis interior that is exactly the label, joint outside.
    pub emph_exact: Regex,
    pub bracket_half: Option<Regex>,
    pub bracket_half_exact: Option<Regex>,
    pub bracket_full: Option<Regex>,
    pub bracket_full_exact: Option<Regex>,
    pub directive: Option<Regex>,
}

impl CompiledPattern {
    pub fn compile(def: &SemanticDefinition, options: &Options) -> Result<Self, regex::Error> {
        let names = alternation(def);
        let labeled = format!("{names}{NUMBERING}");

        let plain = build(&format!("^({labeled})(?:([.:])(?: |$)|([。．：　]))"))?;
        let emph_inner = build(&format!("^({labeled})([.:。．：　])$"))?;
        let emph_exact = build(&format!("^({labeled})$"))?;

        let (bracket_half, bracket_half_exact, bracket_full, bracket_full_exact) =
            if options.bracket_markers {
                (
                    // A trailing joint right after the closing bracket is
                    // tolerated and consumed along with the marker.
                    Some(build(&format!("^\\[({labeled})\\][.:]? +"))?),
                    Some(build(&format!("^\\[({labeled})\\]$"))?),
                    Some(build(&format!("^［({labeled})］ *"))?),
                    Some(build(&format!("^［({labeled})］$"))?),
                )
            } else {
                (None, None, None, None)
            };

        let directive = if options.directive_alerts {
            Some(build(&format!("^(?:\\[!|［[!！])({names})(?:\\]|］)"))?)
        } else {
            None
        };

        Ok(Self {
            plain,
            emph_inner,
            emph_exact,
            bracket_half,
            bracket_half_exact,
            bracket_full,
            bracket_full_exact,
            directive,
        })
    }
}

/// Compile the pattern set for every definition, in vocabulary order.
pub(crate) fn compile_all(
    defs: &[SemanticDefinition],
    options: &Options,
) -> Result<Vec<CompiledPattern>, EngineError> {
    defs.iter()
        .map(|def| {
            CompiledPattern::compile(def, options).map_err(|source| EngineError::Pattern {
                name: def.name.clone(),
                source,
            })
        })
        .collect()
}

/// Join a definition's name and aliases into one non-capturing group.
///
/// Capture groups inside aliases are rewritten to non-capturing so the
/// surrounding group numbering stays fixed.
fn alternation(def: &SemanticDefinition) -> String {
    let mut parts = vec![def.name.replace('(', "(?:")];
    parts.extend(def.aliases.iter().map(|a| a.replace('(', "(?:")));
    format!("(?:{})", parts.join("|"))
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
