//! The single forward pass that walks a stream and fires rewrites.
//!
//! The cursor is monotone: a successful rewrite reports where scanning
//! resumes, anything else advances by one. Stream length is re-read on
//! every iteration because every rewrite splices. Block positions that
//! already produced a region are tracked so a later iteration cannot
//! re-match a paragraph the pass already rewrote at a shifted index.

use std::collections::HashSet;

use pulldown_cmark::{Event, Tag};

use crate::alert::AlertScanner;
use crate::engine::Engine;
use crate::rewriter::apply_region;
use crate::scanner::find_region;
use crate::stream::TokenStream;

enum Step {
    Quote,
    Divider,
    Block,
    Other,
}

pub(crate) struct Driver<'e> {
    engine: &'e Engine,
    alerts: Option<AlertScanner<'e>>,
    consumed: HashSet<usize>,
}

impl<'e> Driver<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        let alerts = engine.options().directive_alerts.then(|| {
            AlertScanner::new(engine.definitions(), engine.patterns(), engine.lead_index())
        });
        Self {
            engine,
            alerts,
            consumed: HashSet::new(),
        }
    }

    pub fn run(&mut self, stream: &mut TokenStream<'_>) {
        let mut n = 0;
        while n < stream.len() {
            n = match self.step(stream, n) {
                Some(next) if next > n => next,
                _ => n + 1,
            };
        }
    }

    fn step(&mut self, stream: &mut TokenStream<'_>, n: usize) -> Option<usize> {
        if self.consumed.contains(&n) {
            return None;
        }
        let kind = match stream.get(n)? {
            Event::Start(Tag::BlockQuote(_)) => Step::Quote,
            Event::Rule => Step::Divider,
            Event::Start(Tag::Paragraph | Tag::Heading { .. }) => Step::Block,
            _ => Step::Other,
        };
        match kind {
            Step::Quote => self.alert_step(stream, n),
            Step::Divider => self.divider_step(stream, n),
            Step::Block => self.block_step(stream, n),
            Step::Other => None,
        }
    }

    fn alert_step(&mut self, stream: &mut TokenStream<'_>, n: usize) -> Option<usize> {
        let scanner = self.alerts.as_mut()?;
        let out = scanner.apply(stream, n)?;
        tracing::debug!(position = n, "rewrote alert container");
        self.consumed.insert(n);
        Some(out.resume)
    }

    /// Match the region following an opening divider, then keep chaining
    /// adjacent same-style regions off each close.
    fn divider_step(&mut self, stream: &mut TokenStream<'_>, n: usize) -> Option<usize> {
        let style = stream.rule_style(n)?;
        let mut start = n + 1;
        let mut continued = false;
        let mut resume = None;
        loop {
            if self.consumed.contains(&start) {
                break;
            }
            let Some(cand) = find_region(
                stream,
                start,
                Some(style),
                continued,
                self.engine.patterns(),
                self.engine.options(),
            ) else {
                break;
            };
            let def = &self.engine.definitions()[cand.def];
            let Some(out) = apply_region(stream, &cand, def, self.engine.options()) else {
                break;
            };
            tracing::debug!(
                name = %def.name,
                position = start,
                continued,
                "rewrote divider-bounded region"
            );
            self.consumed.insert(start);
            resume = Some(out.resume);
            start = out.close + 1;
            continued = true;
        }
        resume
    }

    fn block_step(&mut self, stream: &mut TokenStream<'_>, n: usize) -> Option<usize> {
        if self.engine.options().require_divider {
            return None;
        }
        // Labels are never recognized on the first line of a list item.
        if n > 0 && matches!(stream.get(n - 1), Some(Event::Start(Tag::Item))) {
            return None;
        }
        let cand = find_region(
            stream,
            n,
            None,
            false,
            self.engine.patterns(),
            self.engine.options(),
        )?;
        let def = &self.engine.definitions()[cand.def];
        let out = apply_region(stream, &cand, def, self.engine.options())?;
        tracing::debug!(name = %def.name, position = n, "rewrote paragraph-bounded region");
        self.consumed.insert(n);
        Some(out.resume)
    }
}
