//! Directive-style alerts: quoted blocks opening with `[!TYPE]`.
//!
//! The region is the whole blockquote, nesting respected. The marker is
//! replaced by a separate label paragraph ahead of the content, with
//! the bracket characters as individual joint spans; the full-width
//! form (`［!TYPE］`, `［！TYPE］`) is recognized alongside the ASCII
//! one. Alert classes carry the `sc-` namespace prefix, container class
//! included. Because many quotes in one document repeat the same first
//! line, match results are memoized per content string in a small FIFO
//! cache.

use std::collections::{HashMap, VecDeque};

use pulldown_cmark::{Event, Tag, TagEnd};
use sc_vocab::SemanticDefinition;

use crate::pattern::CompiledPattern;
use crate::rewriter::{
    Outcome, close_tag, joint_span, offset, open_tag, prefixed_class, signed,
    strip_leading_bytes, trim_leading_whitespace,
};
use crate::scanner::text_run;
use crate::stream::TokenStream;
use crate::util::escape_html;

const MATCH_CACHE_MAX: usize = 128;

/// Regex metacharacters that disqualify a first character from acting
/// as a literal lead key.
const NON_LITERAL_LEADS: &str = "([{|^$*+?.";

/// Index from the first letter of a marker to the definitions that can
/// start with it, so most lookups try only a couple of patterns.
///
/// Definitions whose name or any alias starts with a pattern
/// metacharacter cannot be keyed and land in the fallback list, which
/// is appended to every bucket. Purely an optimization: hit order
/// within a bucket follows vocabulary order.
pub(crate) struct LeadIndex {
    by_lead: HashMap<char, Vec<usize>>,
    fallback: Vec<usize>,
}

impl LeadIndex {
    pub fn build(defs: &[SemanticDefinition]) -> Self {
        let mut by_lead: HashMap<char, Vec<usize>> = HashMap::new();
        let mut fallback = Vec::new();
        for (sn, def) in defs.iter().enumerate() {
            let mut keys = Vec::new();
            let mut unknown = false;
            for source in std::iter::once(&def.name).chain(&def.aliases) {
                match literal_lead(source) {
                    Some(key) if !keys.contains(&key) => keys.push(key),
                    Some(_) => {}
                    None => unknown = true,
                }
            }
            if keys.is_empty() || unknown {
                fallback.push(sn);
            }
            for key in keys {
                by_lead.entry(key).or_default().push(sn);
            }
        }
        if !fallback.is_empty() {
            for bucket in by_lead.values_mut() {
                for &sn in &fallback {
                    if !bucket.contains(&sn) {
                        bucket.push(sn);
                    }
                }
            }
        }
        Self { by_lead, fallback }
    }

    fn candidates(&self, lead: char) -> &[usize] {
        let key = lead.to_lowercase().next().unwrap_or(lead);
        self.by_lead.get(&key).map_or(&self.fallback, Vec::as_slice)
    }
}

fn literal_lead(source: &str) -> Option<char> {
    let mut chars = source.trim_start().chars();
    let mut first = chars.next()?;
    if first == '\\' {
        first = chars.next()?;
    }
    if NON_LITERAL_LEADS.contains(first) {
        return None;
    }
    first.to_lowercase().next()
}

#[derive(Debug, Clone)]
struct AlertHit {
    def: usize,
    /// Type text as typed (`NOTE`, `note`, ...).
    label: String,
    /// Bytes of the first line the marker occupies.
    consumed: usize,
    full_width: bool,
}

/// FIFO-bounded memo of first-line match results, misses included.
struct MatchCache {
    map: HashMap<String, Option<AlertHit>>,
    order: VecDeque<String>,
}

impl MatchCache {
    fn new() -> Self {
        Self { map: HashMap::new(), order: VecDeque::new() }
    }

    fn get(&self, content: &str) -> Option<&Option<AlertHit>> {
        self.map.get(content)
    }

    fn insert(&mut self, content: String, hit: Option<AlertHit>) {
        if self.map.len() >= MATCH_CACHE_MAX {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(content.clone());
        self.map.insert(content, hit);
    }
}

/// Per-pass alert matcher; holds the cache so repeated identical first
/// lines in one document resolve without re-scanning.
pub(crate) struct AlertScanner<'e> {
    defs: &'e [SemanticDefinition],
    patterns: &'e [CompiledPattern],
    index: &'e LeadIndex,
    cache: MatchCache,
}

impl<'e> AlertScanner<'e> {
    pub fn new(
        defs: &'e [SemanticDefinition],
        patterns: &'e [CompiledPattern],
        index: &'e LeadIndex,
    ) -> Self {
        Self { defs, patterns, index, cache: MatchCache::new() }
    }

    /// Rewrite the blockquote opening at `open` if its first line
    /// carries an alert marker. The stream is untouched on `None`.
    pub fn apply(&mut self, stream: &mut TokenStream<'_>, open: usize) -> Option<Outcome> {
        let close = {
            let mut depth = 1_usize;
            let mut i = open + 1;
            loop {
                match stream.get(i)? {
                    Event::Start(Tag::BlockQuote(_)) => depth += 1,
                    Event::End(TagEnd::BlockQuote(_)) => {
                        depth -= 1;
                        if depth == 0 {
                            break i;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        };

        let para = (open + 1..close)
            .find(|&i| matches!(stream.get(i), Some(Event::Start(Tag::Paragraph))))?;
        let (first_line, line_events, _) = text_run(stream, para + 1);
        let hit = self.find_match(&first_line)?;
        let def = &self.defs[hit.def];

        stream.replace(
            open,
            Event::Html(open_tag(def, &prefixed_class(&def.name), &hit.label).into()),
        );
        stream.replace(close, Event::Html(close_tag(def).into()));

        let mut delta = strip_leading_bytes(stream, &line_events, hit.consumed);
        delta += trim_leading_whitespace(stream, para);

        let content = if def.has_name_sentinel() {
            para
        } else {
            stream.insert(para, Event::Start(Tag::Paragraph));
            stream.insert(para + 1, Event::InlineHtml(label_html(def, &hit).into()));
            stream.insert(para + 2, Event::End(TagEnd::Paragraph));
            delta += 3;
            para + 3
        };

        // Drop the content paragraph when nothing visible survived the
        // marker removal.
        let content_end = (content..).find(|&i| {
            matches!(stream.get(i), Some(Event::End(TagEnd::Paragraph))) || stream.get(i).is_none()
        })?;
        if stream.get(content_end).is_some() && !has_visible_content(stream, content, content_end) {
            let count = content_end - content + 1;
            for _ in 0..count {
                stream.remove(content);
            }
            delta -= signed(count);
        }

        Some(Outcome { resume: content, close: offset(close, delta) })
    }

    fn find_match(&mut self, content: &str) -> Option<AlertHit> {
        if !has_alert_prefix(content) {
            return None;
        }
        if let Some(cached) = self.cache.get(content) {
            return cached.clone();
        }
        let hit = self.search(content);
        self.cache.insert(content.to_owned(), hit.clone());
        hit
    }

    fn search(&self, content: &str) -> Option<AlertHit> {
        let lead = content.chars().nth(2)?;
        let candidates = self.index.candidates(lead);
        if candidates.is_empty() {
            // A lead with no bucket still needs the full table: an
            // alias with top-level alternation can match on a branch
            // whose first character was never keyed.
            return (0..self.patterns.len()).find_map(|sn| self.try_definition(content, sn));
        }
        candidates
            .iter()
            .find_map(|&sn| self.try_definition(content, sn))
    }

    fn try_definition(&self, content: &str, sn: usize) -> Option<AlertHit> {
        let re = self.patterns[sn].directive.as_ref()?;
        let c = re.captures(content)?;
        let whole = c.get(0)?;
        Some(AlertHit {
            def: sn,
            label: c[1].to_owned(),
            consumed: whole.end(),
            full_width: content.starts_with('［'),
        })
    }
}

fn has_alert_prefix(content: &str) -> bool {
    let mut chars = content.chars();
    match (chars.next(), chars.next()) {
        (Some('['), Some('!')) => true,
        (Some('［'), Some('!' | '！')) => true,
        _ => false,
    }
}

fn label_html(def: &SemanticDefinition, hit: &AlertHit) -> String {
    let stem = prefixed_class(&def.name);
    let (open_b, close_b) = if hit.full_width { ("［", "］") } else { ("[", "]") };
    format!(
        "<strong class=\"{stem}-label\">{}{}{}</strong>",
        joint_span(&stem, open_b),
        escape_html(&hit.label),
        joint_span(&stem, close_b),
    )
}

fn has_visible_content(stream: &TokenStream<'_>, from: usize, to: usize) -> bool {
    (from..to).any(|i| match stream.get(i) {
        Some(Event::Text(t)) => !t.trim().is_empty(),
        Some(Event::Code(_) | Event::InlineHtml(_) | Event::Start(Tag::Image { .. })) => true,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::config::Options;
    use crate::pattern::compile_all;

    fn defs() -> Vec<SemanticDefinition> {
        vec![
            SemanticDefinition::new("note", "aside"),
            SemanticDefinition::new("warning", "aside").with_alias("warn"),
        ]
    }

    fn rewrite(source: &str) -> Option<String> {
        let options = Options::new().with_directive_alerts(true);
        let defs = defs();
        let patterns = compile_all(&defs, &options).unwrap();
        let index = LeadIndex::build(&defs);
        let mut scanner = AlertScanner::new(&defs, &patterns, &index);
        let mut stream = TokenStream::parse(source);
        scanner.apply(&mut stream, 0)?;
        Some(stream.to_html())
    }

    #[test]
    fn test_alert_with_body() {
        let html = rewrite("> [!NOTE]\n> Useful detail.\n").unwrap();
        assert_eq!(
            html,
            "<aside class=\"sc-note\">\n\
             <p><strong class=\"sc-note-label\"><span class=\"sc-note-label-joint\">[</span>NOTE<span class=\"sc-note-label-joint\">]</span></strong></p>\n\
             <p>Useful detail.</p>\n\
             </aside>\n"
        );
    }

    #[test]
    fn test_alert_marker_only_drops_content_paragraph() {
        let html = rewrite("> [!NOTE]\n").unwrap();
        assert_eq!(
            html,
            "<aside class=\"sc-note\">\n\
             <p><strong class=\"sc-note-label\"><span class=\"sc-note-label-joint\">[</span>NOTE<span class=\"sc-note-label-joint\">]</span></strong></p>\n\
             </aside>\n"
        );
    }

    #[test]
    fn test_full_width_alert() {
        let html = rewrite("> ［！警告］\n> 本文。\n");
        // "警告" is not an alias here, so nothing matches; with the
        // alias spelled in ASCII the full-width brackets do.
        assert!(html.is_none());
        let html = rewrite("> ［!warn］\n> 本文。\n").unwrap();
        assert!(html.contains("<span class=\"sc-warning-label-joint\">［</span>"));
        assert!(html.contains("warn<span class=\"sc-warning-label-joint\">］</span>"));
    }

    #[test]
    fn test_plain_blockquote_untouched() {
        assert!(rewrite("> Just a quote.\n").is_none());
        assert!(rewrite("> [NOTE] missing the bang.\n").is_none());
    }

    #[test]
    fn test_alias_matches_alert() {
        let html = rewrite("> [!WARN]\n> Careful.\n").unwrap();
        assert!(html.contains("<aside class=\"sc-warning\">"));
        assert!(html.contains(">WARN<"));
    }

    #[test]
    fn test_alternation_alias_matches_outside_its_bucket() {
        // `nb|memo` is keyed under `n` only; a marker starting with `m`
        // finds no bucket and must fall through to the full table.
        let options = Options::new().with_directive_alerts(true);
        let defs = vec![SemanticDefinition::new("remark", "aside").with_alias("nb|memo")];
        let patterns = compile_all(&defs, &options).unwrap();
        let index = LeadIndex::build(&defs);
        let mut scanner = AlertScanner::new(&defs, &patterns, &index);
        let mut stream = TokenStream::parse("> [!MEMO]\n> Noted.\n");
        scanner.apply(&mut stream, 0).unwrap();
        let html = stream.to_html();
        assert!(html.contains("<aside class=\"sc-remark\">"));
        assert!(html.contains(">MEMO<"));
    }

    #[test]
    fn test_label_case_preserved() {
        let html = rewrite("> [!note]\n> Body.\n").unwrap();
        assert!(html.contains(">note<"));
    }

    #[test]
    fn test_lead_index_buckets() {
        let index = LeadIndex::build(&defs());
        assert_eq!(index.candidates('n'), &[0]);
        assert_eq!(index.candidates('W'), &[1]);
        assert!(index.candidates('x').is_empty());
    }

    #[test]
    fn test_lead_index_fallback_appended() {
        let defs = vec![
            SemanticDefinition::new("note", "aside"),
            SemanticDefinition::new("(notice|remark)", "aside"),
        ];
        let index = LeadIndex::build(&defs);
        assert_eq!(index.candidates('n'), &[0, 1]);
        assert_eq!(index.candidates('x'), &[1]);
    }

    #[test]
    fn test_match_cache_capacity() {
        let mut cache = MatchCache::new();
        for i in 0..(MATCH_CACHE_MAX + 10) {
            cache.insert(format!("[!X{i}]"), None);
        }
        assert_eq!(cache.map.len(), MATCH_CACHE_MAX);
        assert!(cache.get("[!X0]").is_none());
        assert!(cache.get(&format!("[!X{}]", MATCH_CACHE_MAX + 9)).is_some());
    }
}
