//! Structural matching over the head of a block.
//!
//! A marker always sits at the start of the first line of a paragraph
//! or heading. [`InlineLead`] captures that head shape once per block:
//! an optional leading emphasis group, the concatenated text run inside
//! or after it, and whether each run ends at a line boundary. Matching
//! then works on those strings, so a label split across several text
//! events (as bracket characters are) still matches.

use pulldown_cmark::{Event, Tag, TagEnd};
use regex::Captures;

use crate::bracket::{self, BracketMarker};
use crate::config::Options;
use crate::pattern::CompiledPattern;
use crate::stream::{RuleStyle, TokenStream};

/// A leading `**strong**` or `*emphasis*` group.
#[derive(Debug, Clone)]
pub(crate) struct EmphasisLead {
    pub open: usize,
    pub close: usize,
    pub strong: bool,
    /// Interior is a plain text run with no nested markup, so the
    /// original emphasis events can be reused as the label wrapper.
    pub simple: bool,
}

/// The head shape of a paragraph or heading.
#[derive(Debug, Clone)]
pub(crate) struct InlineLead {
    /// Index of the block open event.
    pub block: usize,
    pub emphasis: Option<EmphasisLead>,
    /// Concatenated text: the emphasis interior when `emphasis` is set,
    /// otherwise the first text run of the block.
    pub text: String,
    /// Indices of the events `text` was concatenated from.
    pub text_events: Vec<usize>,
    /// Whether `text` runs up to a line or block boundary.
    pub text_line_end: bool,
    /// Text run following the emphasis close, empty without emphasis.
    pub after: String,
    pub after_events: Vec<usize>,
    pub after_line_end: bool,
}

/// A recognized label marker, before rewriting.
#[derive(Debug, Clone)]
pub(crate) struct LabelMarker {
    /// Label text as typed, numbering included.
    pub label: String,
    pub joint: String,
    pub half: bool,
    /// Joint sits inside the lead text (emphasis interior or plain run)
    /// rather than in the after-run.
    pub inside: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Marker {
    Label(LabelMarker),
    Bracket(BracketMarker),
}

impl Marker {
    pub fn label(&self) -> &str {
        match self {
            Self::Label(m) => &m.label,
            Self::Bracket(m) => &m.label,
        }
    }
}

/// A region of the stream about to become a container.
#[derive(Debug, Clone)]
pub(crate) struct Region {
    /// Index of the label block's open event.
    pub start: usize,
    /// Closing boundary: the closing divider's index, or the label
    /// block's end event for paragraph-bounded regions.
    pub end: usize,
    pub divider: Option<RuleStyle>,
    /// The opening divider was already consumed as the previous
    /// region's closing divider.
    pub continued: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub region: Region,
    /// Vocabulary index of the matched definition.
    pub def: usize,
    pub marker: Marker,
    pub lead: InlineLead,
}

impl InlineLead {
    /// Capture the head shape of the block opening at `block`.
    ///
    /// Returns `None` when the event is not a paragraph or heading
    /// open, or the block has no leading text at all.
    pub fn scan(stream: &TokenStream<'_>, block: usize) -> Option<Self> {
        let is_heading = matches!(stream.get(block), Some(Event::Start(Tag::Heading { .. })));
        if !is_heading && !matches!(stream.get(block), Some(Event::Start(Tag::Paragraph))) {
            return None;
        }

        let first = block + 1;
        let strong = match stream.get(first)? {
            Event::Start(Tag::Strong) => Some(true),
            Event::Start(Tag::Emphasis) => Some(false),
            _ => None,
        };

        if let Some(strong) = strong {
            let open = first;
            let mut depth = 1_usize;
            let mut simple = true;
            let mut interior = String::new();
            let mut interior_events = Vec::new();
            let mut i = open + 1;
            let close = loop {
                match stream.get(i)? {
                    Event::Start(Tag::Strong | Tag::Emphasis) => {
                        depth += 1;
                        simple = false;
                    }
                    Event::End(TagEnd::Strong | TagEnd::Emphasis) => {
                        depth -= 1;
                        if depth == 0 {
                            break i;
                        }
                    }
                    Event::Text(t) => {
                        interior.push_str(t);
                        interior_events.push(i);
                    }
                    Event::End(TagEnd::Paragraph | TagEnd::Heading(_)) => return None,
                    _ => simple = false,
                }
                i += 1;
            };
            if interior.is_empty() {
                return None;
            }
            let (after, after_events, after_line_end) = text_run(stream, close + 1);
            Some(Self {
                block,
                emphasis: Some(EmphasisLead { open, close, strong, simple }),
                text: interior,
                text_events: interior_events,
                text_line_end: false,
                after,
                after_events,
                after_line_end,
            })
        } else {
            let (text, text_events, text_line_end) = text_run(stream, first);
            if text.is_empty() {
                return None;
            }
            Some(Self {
                block,
                emphasis: None,
                text,
                text_events,
                text_line_end,
                after: String::new(),
                after_events: Vec::new(),
                after_line_end: false,
            })
        }
    }
}

/// Collect consecutive text events starting at `from`.
///
/// The run stops at the first non-text event; the boolean reports
/// whether that stop was a line or block boundary.
pub(crate) fn text_run(stream: &TokenStream<'_>, from: usize) -> (String, Vec<usize>, bool) {
    let mut text = String::new();
    let mut events = Vec::new();
    let mut i = from;
    let line_end = loop {
        match stream.get(i) {
            Some(Event::Text(t)) => {
                text.push_str(t);
                events.push(i);
                i += 1;
            }
            Some(Event::SoftBreak | Event::HardBreak)
            | Some(Event::End(TagEnd::Paragraph | TagEnd::Heading(_)))
            | None => break true,
            Some(_) => break false,
        }
    };
    (text, events, line_end)
}

/// Try every definition against a lead, first match wins.
///
/// Per definition, the bracket style is tried before the label style.
pub(crate) fn match_marker(
    lead: &InlineLead,
    patterns: &[CompiledPattern],
    options: &Options,
) -> Option<(usize, Marker)> {
    for (index, pattern) in patterns.iter().enumerate() {
        if options.bracket_markers {
            if let Some(m) = bracket::try_match(lead, pattern) {
                return Some((index, Marker::Bracket(m)));
            }
        }
        if let Some(m) = try_label(lead, pattern) {
            return Some((index, Marker::Label(m)));
        }
    }
    None
}

fn is_half_joint(s: &str) -> bool {
    matches!(s, "." | ":")
}

/// A half-width joint at the head of the after-run, valid only when a
/// space or the end of the line follows it.
fn leading_half_joint<'t>(after: &'t str, line_end: bool) -> Option<&'t str> {
    let first = after.chars().next()?;
    if first != '.' && first != ':' {
        return None;
    }
    let rest = &after[first.len_utf8()..];
    (rest.starts_with(' ') || (rest.is_empty() && line_end))
        .then_some(&after[..first.len_utf8()])
}

fn leading_full_joint(after: &str) -> Option<&str> {
    let first = after.chars().next()?;
    matches!(first, '。' | '．' | '：' | '　').then_some(&after[..first.len_utf8()])
}

fn marker(c: &Captures<'_>, joint: &str, half: bool, inside: bool) -> LabelMarker {
    LabelMarker {
        label: c[1].to_owned(),
        joint: joint.to_owned(),
        half,
        inside,
    }
}

fn try_label(lead: &InlineLead, pattern: &CompiledPattern) -> Option<LabelMarker> {
    if lead.emphasis.is_some() {
        let inner = pattern.emph_inner.captures(&lead.text);
        let exact = pattern.emph_exact.captures(&lead.text);
        // Fixed sub-pattern priority: half-width joint inside the
        // emphasis, half-width outside, full-width inside, full-width
        // outside.
        if let Some(c) = &inner {
            let joint = c.get(2).map_or("", |m| m.as_str());
            if is_half_joint(joint)
                && (lead.after.starts_with(' ') || (lead.after.is_empty() && lead.after_line_end))
            {
                return Some(marker(c, joint, true, true));
            }
        }
        if let Some(c) = &exact {
            if let Some(joint) = leading_half_joint(&lead.after, lead.after_line_end) {
                return Some(marker(c, joint, true, false));
            }
        }
        if let Some(c) = &inner {
            let joint = c.get(2).map_or("", |m| m.as_str());
            if !is_half_joint(joint) {
                return Some(marker(c, joint, false, true));
            }
        }
        if let Some(c) = &exact {
            if let Some(joint) = leading_full_joint(&lead.after) {
                return Some(marker(c, joint, false, false));
            }
        }
        None
    } else {
        let c = pattern.plain.captures(&lead.text)?;
        if let Some(half) = c.get(2) {
            let consumed = c.get(1)?.end() + half.as_str().len();
            // A line-final joint only counts when the line really ends
            // there; a mid-line event boundary does not.
            if consumed == lead.text.len() && !lead.text_line_end {
                return None;
            }
            Some(marker(&c, half.as_str(), true, true))
        } else {
            let full = c.get(3)?;
            Some(marker(&c, full.as_str(), false, true))
        }
    }
}

/// Find the end of the block opening at `block` (its end event).
pub(crate) fn find_block_end(stream: &TokenStream<'_>, block: usize) -> Option<usize> {
    let mut i = block + 1;
    loop {
        match stream.get(i)? {
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_)) => return Some(i),
            _ => i += 1,
        }
    }
}

/// Match a candidate region starting at the block open event `start`.
///
/// With a divider style, the region runs to the next rule of the same
/// style and fails without one. Otherwise the region is the label block
/// itself.
pub(crate) fn find_region(
    stream: &TokenStream<'_>,
    start: usize,
    divider: Option<RuleStyle>,
    continued: bool,
    patterns: &[CompiledPattern],
    options: &Options,
) -> Option<Candidate> {
    let lead = InlineLead::scan(stream, start)?;
    let (def, marker) = match_marker(&lead, patterns, options)?;
    let end = match divider {
        Some(style) => {
            let mut i = start + 1;
            loop {
                match stream.get(i) {
                    None => return None,
                    Some(Event::Rule) if stream.rule_style(i) == Some(style) => break i,
                    Some(_) => i += 1,
                }
            }
        }
        None => find_block_end(stream, start)?,
    };
    Some(Candidate {
        region: Region { start, end, divider, continued },
        def,
        marker,
        lead,
    })
}
