//! Mutable event stream over a parsed markdown document.
//!
//! [`TokenStream`] owns the flat [`Event`] sequence produced by
//! `pulldown-cmark` together with the source byte span of each event.
//! The spans serve one purpose the events themselves cannot: a
//! [`Event::Rule`] carries no record of which marker character wrote it,
//! so [`TokenStream::rule_style`] reads the first marker byte back out
//! of the source. Events synthesized during rewriting get an empty span.

use std::ops::Range;

use pulldown_cmark::{Event, Options as ParserOptions, Parser};

/// The marker character a thematic break was written with.
///
/// Two dividers bound a region only when their styles agree, so `* * *`
/// never pairs with `---`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStyle {
    Asterisk,
    Dash,
    Underscore,
}

/// A parsed document as an editable event sequence.
pub struct TokenStream<'a> {
    source: &'a str,
    events: Vec<Event<'a>>,
    spans: Vec<Range<usize>>,
}

impl<'a> TokenStream<'a> {
    /// Parse a markdown document with the default parser options.
    ///
    /// Tables, strikethrough and task lists are enabled; the GFM alert
    /// extension is deliberately not, so `> [!NOTE]` reaches the stream
    /// as an ordinary blockquote with literal text.
    #[must_use]
    pub fn parse(source: &'a str) -> Self {
        let options = ParserOptions::ENABLE_TABLES
            | ParserOptions::ENABLE_STRIKETHROUGH
            | ParserOptions::ENABLE_TASKLISTS;
        Self::parse_with_options(source, options)
    }

    /// Parse a markdown document with explicit parser options.
    #[must_use]
    pub fn parse_with_options(source: &'a str, options: ParserOptions) -> Self {
        let mut events = Vec::new();
        let mut spans = Vec::new();
        for (event, span) in Parser::new_ext(source, options).into_offset_iter() {
            events.push(event);
            spans.push(span);
        }
        Self { source, events, spans }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event<'a>> {
        self.events.get(index)
    }

    #[must_use]
    pub fn events(&self) -> &[Event<'a>] {
        &self.events
    }

    /// The divider style of the [`Event::Rule`] at `index`.
    ///
    /// Returns `None` when the event is not a rule or was synthesized
    /// during rewriting (and therefore has no source span).
    #[must_use]
    pub fn rule_style(&self, index: usize) -> Option<RuleStyle> {
        if !matches!(self.events.get(index), Some(Event::Rule)) {
            return None;
        }
        let span = self.spans.get(index)?.clone();
        let text = self.source.get(span)?;
        text.chars().find_map(|c| match c {
            '*' => Some(RuleStyle::Asterisk),
            '-' => Some(RuleStyle::Dash),
            '_' => Some(RuleStyle::Underscore),
            _ => None,
        })
    }

    /// Insert a synthesized event before `index`.
    pub fn insert(&mut self, index: usize, event: Event<'a>) {
        self.events.insert(index, event);
        self.spans.insert(index, 0..0);
    }

    /// Remove the event at `index`.
    pub fn remove(&mut self, index: usize) {
        self.events.remove(index);
        self.spans.remove(index);
    }

    /// Replace the event at `index`, keeping its source span.
    pub fn replace(&mut self, index: usize, event: Event<'a>) {
        self.events[index] = event;
    }

    /// Render the current event sequence to an HTML string.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(self.source.len() * 2);
        pulldown_cmark::html::push_html(&mut html, self.events.iter().cloned());
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_render_passthrough() {
        let stream = TokenStream::parse("A paragraph.\n");
        assert_eq!(stream.to_html(), "<p>A paragraph.</p>\n");
    }

    #[test]
    fn test_rule_style_from_source() {
        let stream = TokenStream::parse("* * *\n\ntext\n\n---\n\n___\n");
        let styles: Vec<RuleStyle> = (0..stream.len())
            .filter_map(|i| stream.rule_style(i))
            .collect();
        assert_eq!(
            styles,
            vec![RuleStyle::Asterisk, RuleStyle::Dash, RuleStyle::Underscore]
        );
    }

    #[test]
    fn test_rule_style_requires_rule_event() {
        let stream = TokenStream::parse("just text\n");
        assert_eq!(stream.rule_style(0), None);
    }

    #[test]
    fn test_synthesized_event_has_no_style() {
        let mut stream = TokenStream::parse("text\n");
        stream.insert(0, Event::Rule);
        assert_eq!(stream.rule_style(0), None);
    }

    #[test]
    fn test_alert_syntax_stays_literal() {
        // The bracket and bang arrive as separate text events, so the
        // marker is only visible on the concatenated run.
        let stream = TokenStream::parse("> [!NOTE]\n> Body.\n");
        let text: String = stream
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Text(t) => Some(&**t),
                _ => None,
            })
            .collect();
        assert!(text.contains("[!NOTE]"));
    }

    #[test]
    fn test_splice_keeps_events_and_spans_aligned() {
        let mut stream = TokenStream::parse("one\n\ntwo\n");
        let before = stream.len();
        stream.insert(0, Event::Html("<x>\n".into()));
        stream.remove(stream.len() - 1);
        stream.replace(0, Event::Html("<y>\n".into()));
        assert_eq!(stream.len(), before);
        assert_eq!(stream.events.len(), stream.spans.len());
    }
}
