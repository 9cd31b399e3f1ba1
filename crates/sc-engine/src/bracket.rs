//! Bracket-style markers: `[Label]`, `［Label］`, and `**[Label]**`.
//!
//! Bracket markers decorate differently from plain labels: both bracket
//! characters become joint spans and the label sits between them. The
//! half-width form demands a separating space after the closing bracket
//! (or the end of the line); the full-width form never does, and any
//! spaces it is followed by are absorbed. Bracket classes carry the
//! `sc-` namespace prefix, container class included, keeping them apart
//! from the bare definition-name classes of the label style.

use pulldown_cmark::Event;
use sc_vocab::SemanticDefinition;

use crate::pattern::CompiledPattern;
use crate::rewriter::{joint_span, prefixed_class, signed, strip_leading_bytes};
use crate::scanner::InlineLead;
use crate::stream::TokenStream;
use crate::util::escape_html;

#[derive(Debug, Clone)]
pub(crate) struct BracketMarker {
    pub label: String,
    /// Half-width `[...]` rather than full-width `［...］`.
    pub half: bool,
    /// Bytes of the lead text the whole marker occupies, separator
    /// included. Zero when the marker fills an emphasis interior.
    pub consumed: usize,
    pub emphasized: bool,
}

pub(crate) fn try_match(lead: &InlineLead, pattern: &CompiledPattern) -> Option<BracketMarker> {
    if let Some(em) = &lead.emphasis {
        // Only a strong wrapper around a plain interior qualifies.
        if !em.strong || !em.simple {
            return None;
        }
        if let Some(c) = pattern.bracket_half_exact.as_ref()?.captures(&lead.text) {
            if lead.after.starts_with(' ') || (lead.after.is_empty() && lead.after_line_end) {
                return Some(BracketMarker {
                    label: c[1].to_owned(),
                    half: true,
                    consumed: 0,
                    emphasized: true,
                });
            }
        }
        if let Some(c) = pattern.bracket_full_exact.as_ref()?.captures(&lead.text) {
            return Some(BracketMarker {
                label: c[1].to_owned(),
                half: false,
                consumed: 0,
                emphasized: true,
            });
        }
        None
    } else {
        if let Some(c) = pattern.bracket_half.as_ref()?.captures(&lead.text) {
            return Some(BracketMarker {
                label: c[1].to_owned(),
                half: true,
                consumed: c.get(0)?.end(),
                emphasized: false,
            });
        }
        if let Some(c) = pattern.bracket_full.as_ref()?.captures(&lead.text) {
            return Some(BracketMarker {
                label: c[1].to_owned(),
                half: false,
                consumed: c.get(0)?.end(),
                emphasized: false,
            });
        }
        None
    }
}

/// Replace the bracket marker with its decorated form.
///
/// The half-width separator space is consumed by the match and put back
/// as an explicit text event so the label never fuses with the content.
pub(crate) fn rewrite_inline(
    stream: &mut TokenStream<'_>,
    lead: &InlineLead,
    m: &BracketMarker,
    def: &SemanticDefinition,
) -> isize {
    let stem = prefixed_class(&def.name);
    let (open_b, close_b) = if m.half { ("[", "]") } else { ("［", "］") };
    let wrapper = if m.emphasized { "strong" } else { "span" };
    let html = format!(
        "<{wrapper} class=\"{stem}-label\">{}{}{}</{wrapper}>",
        joint_span(&stem, open_b),
        escape_html(&m.label),
        joint_span(&stem, close_b),
    );

    if m.emphasized {
        let Some(em) = &lead.emphasis else { return 0 };
        let mut delta = 0_isize;
        let spaces = lead.after.len() - lead.after.trim_start_matches(' ').len();
        delta += strip_leading_bytes(stream, &lead.after_events, spaces);
        let count = em.close - em.open + 1;
        for _ in 0..count {
            stream.remove(em.open);
        }
        delta -= signed(count);
        stream.insert(em.open, Event::InlineHtml(html.into()));
        delta += 1;
        if m.half && !lead.after.trim_start_matches(' ').is_empty() {
            stream.insert(em.open + 1, Event::Text(" ".into()));
            delta += 1;
        }
        delta
    } else {
        let mut delta = strip_leading_bytes(stream, &lead.text_events, m.consumed);
        let at = lead.block + 1;
        stream.insert(at, Event::InlineHtml(html.into()));
        delta += 1;
        if m.half {
            stream.insert(at + 1, Event::Text(" ".into()));
            delta += 1;
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sc_vocab::SemanticDefinition;

    use crate::config::Options;
    use crate::pattern::compile_all;
    use crate::rewriter::apply_region;
    use crate::scanner::find_region;
    use crate::stream::TokenStream;

    fn defs() -> Vec<SemanticDefinition> {
        vec![
            SemanticDefinition::new("notice", "section").with_attr("role", "doc-notice"),
            SemanticDefinition::new("warning", "aside").with_alias("warn"),
        ]
    }

    fn rewrite(source: &str) -> Option<String> {
        let options = Options::new().with_bracket_markers(true);
        let defs = defs();
        let patterns = compile_all(&defs, &options).unwrap();
        let mut stream = TokenStream::parse(source);
        let cand = find_region(&stream, 0, None, false, &patterns, &options)?;
        apply_region(&mut stream, &cand, &defs[cand.def], &options)?;
        Some(stream.to_html())
    }

    #[test]
    fn test_half_width_bracket() {
        let html = rewrite("[Warning]. Bracket format test.\n").unwrap();
        assert_eq!(
            html,
            "<aside class=\"sc-warning\">\n\
             <p><span class=\"sc-warning-label\"><span class=\"sc-warning-label-joint\">[</span>Warning<span class=\"sc-warning-label-joint\">]</span></span> Bracket format test.</p>\n\
             </aside>\n"
        );
    }

    #[test]
    fn test_half_width_bracket_requires_space() {
        // Without a separating space the bracket form does not apply,
        // and no label form matches either.
        assert!(rewrite("[Warning]tight.\n").is_none());
    }

    #[test]
    fn test_full_width_bracket_needs_no_space() {
        let html = rewrite("［Notice］本文。\n").unwrap();
        assert!(html.contains("<span class=\"sc-notice-label-joint\">［</span>"));
        assert!(html.contains("</span>本文。"));
    }

    #[test]
    fn test_emphasized_bracket() {
        let html = rewrite("**[Notice]** Boxed label.\n").unwrap();
        assert_eq!(
            html,
            "<section class=\"sc-notice\" role=\"doc-notice\">\n\
             <p><strong class=\"sc-notice-label\"><span class=\"sc-notice-label-joint\">[</span>Notice<span class=\"sc-notice-label-joint\">]</span></strong> Boxed label.</p>\n\
             </section>\n"
        );
    }

    #[test]
    fn test_emphasized_bracket_requires_strong() {
        // An em wrapper is not a bracket marker; the label form does
        // not match a bracketed interior either.
        assert!(rewrite("*[Notice]* Body.\n").is_none());
    }

    #[test]
    fn test_bracket_disabled_by_default() {
        let options = Options::new();
        let defs = defs();
        let patterns = compile_all(&defs, &options).unwrap();
        let stream = TokenStream::parse("[Warning] text.\n");
        assert!(find_region(&stream, 0, None, false, &patterns, &options).is_none());
    }

    #[test]
    fn test_numbered_bracket_label() {
        let html = rewrite("[Warning 2] Second warning.\n").unwrap();
        assert!(html.contains("Warning 2<span"));
    }
}
