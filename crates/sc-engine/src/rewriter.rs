//! Region rewriting: marker decoration and container wrapping.
//!
//! Every edit here splices the event vector in place, so ordering is
//! what keeps indices valid: the inline marker rewrite runs first and
//! reports its net event delta, the closing boundary is edited at its
//! shifted index, and the opening boundary last (edits at the open end
//! never shift anything behind them).

use std::fmt::Write as _;

use pulldown_cmark::Event;
use sc_vocab::{NAME_SENTINEL, SemanticDefinition};

use crate::bracket;
use crate::config::Options;
use crate::scanner::{Candidate, EmphasisLead, InlineLead, LabelMarker, Marker, find_block_end};
use crate::stream::TokenStream;
use crate::util::escape_html;

/// Where the driver continues after a successful rewrite.
pub(crate) struct Outcome {
    /// First index not yet examined; scanning resumes here.
    pub resume: usize,
    /// Final index of the container close event, the anchor for
    /// divider chaining.
    pub close: usize,
}

pub(crate) fn offset(index: usize, delta: isize) -> usize {
    index.checked_add_signed(delta).unwrap_or(0)
}

pub(crate) fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

enum Splice {
    Remove(usize),
    Shorten(String),
    Skip,
}

/// Delete `nbytes` from the front of a text run, walking the given
/// event indices in order. Emptied events are removed outright; the
/// return value is the net event delta (zero or negative).
pub(crate) fn strip_leading_bytes(
    stream: &mut TokenStream<'_>,
    indices: &[usize],
    mut nbytes: usize,
) -> isize {
    let mut shift = 0_isize;
    for &index in indices {
        if nbytes == 0 {
            break;
        }
        let i = offset(index, shift);
        let action = match stream.get(i) {
            Some(Event::Text(t)) => {
                if t.len() <= nbytes {
                    Splice::Remove(t.len())
                } else {
                    Splice::Shorten(t[nbytes..].to_owned())
                }
            }
            _ => Splice::Skip,
        };
        match action {
            Splice::Remove(len) => {
                stream.remove(i);
                shift -= 1;
                nbytes -= len;
            }
            Splice::Shorten(rest) => {
                stream.replace(i, Event::Text(rest.into()));
                nbytes = 0;
            }
            Splice::Skip => {}
        }
    }
    shift
}

/// Delete `nbytes` from the back of a text run. Tail-first removal
/// leaves the earlier indices valid without shift tracking.
pub(crate) fn strip_trailing_bytes(
    stream: &mut TokenStream<'_>,
    indices: &[usize],
    mut nbytes: usize,
) -> isize {
    let mut shift = 0_isize;
    for &i in indices.iter().rev() {
        if nbytes == 0 {
            break;
        }
        let action = match stream.get(i) {
            Some(Event::Text(t)) => {
                if t.len() <= nbytes {
                    Splice::Remove(t.len())
                } else {
                    Splice::Shorten(t[..t.len() - nbytes].to_owned())
                }
            }
            _ => Splice::Skip,
        };
        match action {
            Splice::Remove(len) => {
                stream.remove(i);
                shift -= 1;
                nbytes -= len;
            }
            Splice::Shorten(kept) => {
                stream.replace(i, Event::Text(kept.into()));
                nbytes = 0;
            }
            Splice::Skip => {}
        }
    }
    shift
}

/// Remove line breaks and whitespace-only text at the head of a block,
/// and trim leading whitespace off the first real text event.
pub(crate) fn trim_leading_whitespace(stream: &mut TokenStream<'_>, block: usize) -> isize {
    let mut delta = 0_isize;
    let i = block + 1;
    loop {
        let action = match stream.get(i) {
            Some(Event::SoftBreak | Event::HardBreak) => Splice::Remove(0),
            Some(Event::Text(t)) if t.trim().is_empty() => Splice::Remove(0),
            Some(Event::Text(t)) if t.starts_with(char::is_whitespace) => {
                Splice::Shorten(t.trim_start().to_owned())
            }
            _ => Splice::Skip,
        };
        match action {
            Splice::Remove(_) => {
                stream.remove(i);
                delta -= 1;
            }
            Splice::Shorten(trimmed) => {
                stream.replace(i, Event::Text(trimmed.into()));
                break;
            }
            Splice::Skip => break,
        }
    }
    delta
}

/// Class stem for the bracket and alert decorations. Those styles
/// namespace their classes so stylesheets can target them apart from
/// the bare definition-name classes of the label style.
pub(crate) fn prefixed_class(name: &str) -> String {
    format!("sc-{name}")
}

/// The container open tag, with the matched label substituted for the
/// accessible-name sentinel.
pub(crate) fn open_tag(def: &SemanticDefinition, class: &str, label: &str) -> String {
    let mut tag = format!("<{} class=\"{class}\"", def.tag);
    for (key, value) in &def.attrs {
        let value = if value == NAME_SENTINEL { label } else { value };
        let _ = write!(tag, " {key}=\"{}\"", escape_html(value));
    }
    tag.push_str(">\n");
    tag
}

pub(crate) fn close_tag(def: &SemanticDefinition) -> String {
    format!("</{}>\n", def.tag)
}

pub(crate) fn joint_span(name: &str, joint: &str) -> String {
    format!("<span class=\"{name}-label-joint\">{}</span>", escape_html(joint))
}

fn label_span(name: &str, label: &str, joint: Option<&str>) -> String {
    format!(
        "<span class=\"{name}-label\">{}{}</span>",
        escape_html(label),
        joint.unwrap_or("")
    )
}

/// Rewrite a matched region into a container.
///
/// Returns `None` only when the stream shape is malformed (no block
/// end), in which case nothing has been touched.
pub(crate) fn apply_region(
    stream: &mut TokenStream<'_>,
    cand: &Candidate,
    def: &SemanticDefinition,
    options: &Options,
) -> Option<Outcome> {
    let label = cand.marker.label().to_owned();
    let block_end = find_block_end(stream, cand.region.start)?;

    let delta = if def.has_name_sentinel() {
        aria_strip(stream, &cand.lead, &cand.marker)
    } else {
        match &cand.marker {
            Marker::Label(m) => rewrite_label(stream, &cand.lead, m, def, options),
            Marker::Bracket(m) => bracket::rewrite_inline(stream, &cand.lead, m, def),
        }
    };
    let block_end = offset(block_end, delta);

    let class = match &cand.marker {
        Marker::Label(_) => def.name.clone(),
        Marker::Bracket(_) => prefixed_class(&def.name),
    };
    let open = Event::Html(open_tag(def, &class, &label).into());
    let close = Event::Html(close_tag(def).into());

    if cand.region.divider.is_some() {
        let end = offset(cand.region.end, delta);
        debug_assert!(matches!(stream.get(end), Some(Event::Rule)));
        stream.replace(end, close);
        if cand.region.continued {
            stream.insert(cand.region.start, open);
            Some(Outcome { resume: block_end + 2, close: end + 1 })
        } else {
            stream.replace(cand.region.start - 1, open);
            Some(Outcome { resume: block_end + 1, close: end })
        }
    } else {
        let end = offset(cand.region.end, delta);
        stream.insert(end + 1, close);
        stream.insert(cand.region.start, open);
        Some(Outcome { resume: end + 3, close: end + 2 })
    }
}

fn rewrite_label(
    stream: &mut TokenStream<'_>,
    lead: &InlineLead,
    m: &LabelMarker,
    def: &SemanticDefinition,
    options: &Options,
) -> isize {
    match &lead.emphasis {
        Some(em) if em.simple => rewrite_emphasis_reuse(stream, lead, em, m, def, options),
        Some(em) => rewrite_emphasis_synth(stream, lead, em, m, def, options),
        None => rewrite_plain(stream, lead, m, def, options),
    }
}

/// No emphasis: strip the marker text and prepend a decorated span.
/// A half-width joint's mandatory trailing space is left in place.
fn rewrite_plain(
    stream: &mut TokenStream<'_>,
    lead: &InlineLead,
    m: &LabelMarker,
    def: &SemanticDefinition,
    options: &Options,
) -> isize {
    let consumed = m.label.len() + m.joint.len();
    let rest = &lead.text[consumed..];
    let bare = rest.trim().is_empty() && lead.text_line_end;
    let suppress = options.remove_trailing_joint && bare;

    let strip = if suppress { consumed + rest.len() } else { consumed };
    let delta = strip_leading_bytes(stream, &lead.text_events, strip);

    let joint = (!suppress).then(|| joint_span(&def.name, &m.joint));
    let html = label_span(&def.name, &m.label, joint.as_deref());
    stream.insert(lead.block + 1, Event::InlineHtml(html.into()));
    delta + 1
}

/// Simple emphasis: reuse the author's own emphasis events as the label
/// wrapper, decorating them with classes and nesting the joint span on
/// whichever side the author wrote the joint.
fn rewrite_emphasis_reuse(
    stream: &mut TokenStream<'_>,
    lead: &InlineLead,
    em: &EmphasisLead,
    m: &LabelMarker,
    def: &SemanticDefinition,
    options: &Options,
) -> isize {
    let name = &def.name;
    let element = if em.strong { "strong" } else { "em" };

    let rest = if m.inside { &lead.after[..] } else { &lead.after[m.joint.len()..] };
    let bare = rest.trim().is_empty() && lead.after_line_end;
    let suppress = options.remove_trailing_joint && bare;

    let mut delta = 0_isize;
    let joint_bytes = if m.inside { 0 } else { m.joint.len() };
    let ws_bytes = if suppress { rest.len() } else { 0 };
    delta += strip_leading_bytes(stream, &lead.after_events, joint_bytes + ws_bytes);

    let mut close = em.close;
    if m.inside {
        let removed = strip_trailing_bytes(stream, &lead.text_events, m.joint.len());
        delta += removed;
        close = offset(close, removed);
    }

    stream.replace(
        em.open,
        Event::InlineHtml(format!("<{element} class=\"{name}-label\">").into()),
    );
    stream.replace(close, Event::InlineHtml(format!("</{element}>").into()));

    if !suppress {
        let at = if m.inside { close } else { close + 1 };
        stream.insert(at, Event::InlineHtml(joint_span(name, &m.joint).into()));
        delta += 1;
    }
    delta
}

/// Emphasis with nested markup inside: the whole group is replaced by
/// a synthesized label element with the flattened label text.
fn rewrite_emphasis_synth(
    stream: &mut TokenStream<'_>,
    lead: &InlineLead,
    em: &EmphasisLead,
    m: &LabelMarker,
    def: &SemanticDefinition,
    options: &Options,
) -> isize {
    let name = &def.name;
    let element = if em.strong { "strong" } else { "em" };

    let rest = if m.inside { &lead.after[..] } else { &lead.after[m.joint.len()..] };
    let bare = rest.trim().is_empty() && lead.after_line_end;
    let suppress = options.remove_trailing_joint && bare;

    let mut delta = 0_isize;
    let joint_bytes = if m.inside { 0 } else { m.joint.len() };
    let ws_bytes = if suppress { rest.len() } else { 0 };
    delta += strip_leading_bytes(stream, &lead.after_events, joint_bytes + ws_bytes);

    let count = em.close - em.open + 1;
    for _ in 0..count {
        stream.remove(em.open);
    }
    delta -= signed(count);

    let joint = (!suppress)
        .then(|| joint_span(name, &m.joint))
        .unwrap_or_default();
    let html = format!(
        "<{element} class=\"{name}-label\">{}{joint}</{element}>",
        escape_html(&m.label)
    );
    stream.insert(em.open, Event::InlineHtml(html.into()));
    delta + 1
}

/// Accessible-name mode: the marker text disappears from the rendered
/// content entirely, leaving the label only in the attribute value.
fn aria_strip(stream: &mut TokenStream<'_>, lead: &InlineLead, marker: &Marker) -> isize {
    let mut delta = 0_isize;
    match marker {
        Marker::Label(m) => {
            if let Some(em) = &lead.emphasis {
                if !m.inside {
                    delta += strip_leading_bytes(stream, &lead.after_events, m.joint.len());
                }
                let count = em.close - em.open + 1;
                for _ in 0..count {
                    stream.remove(em.open);
                }
                delta -= signed(count);
            } else {
                delta +=
                    strip_leading_bytes(stream, &lead.text_events, m.label.len() + m.joint.len());
            }
        }
        Marker::Bracket(m) => {
            if let Some(em) = lead.emphasis.as_ref().filter(|_| m.emphasized) {
                let spaces = lead.after.len() - lead.after.trim_start_matches(' ').len();
                delta += strip_leading_bytes(stream, &lead.after_events, spaces);
                let count = em.close - em.open + 1;
                for _ in 0..count {
                    stream.remove(em.open);
                }
                delta -= signed(count);
            } else {
                delta += strip_leading_bytes(stream, &lead.text_events, m.consumed);
            }
        }
    }
    delta + trim_leading_whitespace(stream, lead.block)
}
