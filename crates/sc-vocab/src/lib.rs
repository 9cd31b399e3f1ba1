//! Semantic container vocabulary.
//!
//! A vocabulary is an ordered list of [`SemanticDefinition`] entries. The
//! order is significant: the matching engine tries definitions front to
//! back and stops at the first hit, so entries earlier in the list shadow
//! later ones wherever names or aliases overlap.
//!
//! The built-in base table (English) ships embedded as JSON, together
//! with a Japanese alias table. [`build_vocabulary`] merges the requested
//! locale tables into the base list without changing its order.
//!
//! # Example
//!
//! ```
//! let vocab = sc_vocab::build_vocabulary(&["ja"]);
//! let warning = vocab.iter().find(|d| d.name == "warning").unwrap();
//! assert!(warning.aliases.iter().any(|a| a == "警告"));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Attribute value sentinel meaning "substitute the matched label text".
///
/// A definition whose attribute list carries this value (typically on an
/// `aria-label` attribute) switches the engine into accessible-name mode:
/// the label becomes machine-readable metadata and is removed from the
/// visible content entirely.
pub const NAME_SENTINEL: &str = "NAME";

/// One semantic label definition.
///
/// `name` and every alias are regular-expression sources, not plain
/// strings; the pattern compiler joins them into an alternation. Alias
/// capture groups are normalized to non-capturing before compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticDefinition {
    /// Canonical label, also used as the container class name.
    pub name: String,
    /// Output element name for the container (`section`, `aside`, ...).
    pub tag: String,
    /// Ordered attribute list for the container open tag.
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
    /// Localized or alternate spellings, matched case-insensitively.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SemanticDefinition {
    /// Create a definition with no attributes or aliases.
    #[must_use]
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            attrs: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Append an attribute to the container open tag.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append an alias spelling.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Whether any attribute value is the accessible-name sentinel.
    #[must_use]
    pub fn has_name_sentinel(&self) -> bool {
        self.attrs.iter().any(|(_, v)| v == NAME_SENTINEL)
    }
}

/// Errors from loading a user-supplied vocabulary or locale table.
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("invalid vocabulary JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-locale alias table: canonical name to extra spellings.
pub type LocaleAliases = HashMap<String, Vec<String>>;

static BASE: OnceLock<Vec<SemanticDefinition>> = OnceLock::new();
static JA: OnceLock<LocaleAliases> = OnceLock::new();

/// The built-in base (English) vocabulary, in match-priority order.
#[must_use]
pub fn base_vocabulary() -> Vec<SemanticDefinition> {
    BASE.get_or_init(|| {
        serde_json::from_str(include_str!("../data/en.json"))
            .expect("embedded en.json is well-formed")
    })
    .clone()
}

/// The built-in alias table for a locale, if one ships with the crate.
#[must_use]
pub fn locale_aliases(locale: &str) -> Option<&'static LocaleAliases> {
    match locale {
        "ja" => Some(JA.get_or_init(|| {
            serde_json::from_str(include_str!("../data/ja.json"))
                .expect("embedded ja.json is well-formed")
        })),
        _ => None,
    }
}

/// Parse a vocabulary from JSON (same shape as the embedded base table).
pub fn from_json(json: &str) -> Result<Vec<SemanticDefinition>, VocabularyError> {
    Ok(serde_json::from_str(json)?)
}

/// Merge a locale alias table into a definition list in place.
///
/// Aliases are appended to the entry with the matching canonical name;
/// names absent from the list are ignored.
pub fn merge_locale(defs: &mut [SemanticDefinition], table: &LocaleAliases) {
    for def in defs.iter_mut() {
        if let Some(extras) = table.get(&def.name) {
            def.aliases.extend(extras.iter().cloned());
        }
    }
}

/// Build the vocabulary for a set of locales.
///
/// Starts from the base table and merges each requested locale's alias
/// table into it. The locale list is treated as a set (repeats collapse),
/// unknown locales are ignored, and `"en"` is a no-op since it is the
/// base. Alias lists are deduplicated afterwards, first occurrence wins.
/// Output order always matches the base table's order.
#[must_use]
pub fn build_vocabulary(locales: &[&str]) -> Vec<SemanticDefinition> {
    let mut defs = base_vocabulary();

    let mut seen = HashSet::new();
    for &locale in locales {
        if locale.is_empty() || !seen.insert(locale) || locale == "en" {
            continue;
        }
        if let Some(table) = locale_aliases(locale) {
            merge_locale(&mut defs, table);
        }
    }

    for def in &mut defs {
        dedupe_aliases(&mut def.aliases);
    }
    defs
}

/// Remove duplicate aliases, keeping the first occurrence of each.
fn dedupe_aliases(aliases: &mut Vec<String>) {
    if aliases.len() < 2 {
        return;
    }
    let mut seen = HashSet::new();
    aliases.retain(|a| seen.insert(a.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_vocabulary_order_is_stable() {
        let defs = base_vocabulary();
        assert_eq!(defs[0].name, "abstract");
        assert!(defs.iter().any(|d| d.name == "notice"));
        assert!(defs.iter().any(|d| d.name == "warning"));
    }

    #[test]
    fn test_notice_definition_shape() {
        let defs = base_vocabulary();
        let notice = defs.iter().find(|d| d.name == "notice").unwrap();
        assert_eq!(notice.tag, "section");
        assert_eq!(
            notice.attrs,
            vec![("role".to_owned(), "doc-notice".to_owned())]
        );
    }

    #[test]
    fn test_lead_carries_name_sentinel() {
        let defs = base_vocabulary();
        let lead = defs.iter().find(|d| d.name == "lead").unwrap();
        assert!(lead.has_name_sentinel());
    }

    #[test]
    fn test_locale_merge_appends_aliases() {
        let defs = build_vocabulary(&["ja"]);
        let warning = defs.iter().find(|d| d.name == "warning").unwrap();
        assert!(warning.aliases.iter().any(|a| a == "警告"));
        // Base alias order is preserved ahead of locale additions.
        assert_eq!(warning.aliases[0], "warn");
    }

    #[test]
    fn test_locale_merge_keeps_base_order() {
        let base: Vec<String> = base_vocabulary().into_iter().map(|d| d.name).collect();
        let merged: Vec<String> = build_vocabulary(&["ja"]).into_iter().map(|d| d.name).collect();
        assert_eq!(base, merged);
    }

    #[test]
    fn test_unknown_locale_is_ignored() {
        assert_eq!(build_vocabulary(&["xx"]), build_vocabulary(&[]));
    }

    #[test]
    fn test_repeated_locales_collapse() {
        let once = build_vocabulary(&["ja"]);
        let twice = build_vocabulary(&["ja", "ja"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_en_locale_is_noop() {
        assert_eq!(build_vocabulary(&["en"]), build_vocabulary(&[]));
    }

    #[test]
    fn test_alias_dedupe_keeps_first() {
        let mut aliases = vec!["a".to_owned(), "b".to_owned(), "a".to_owned()];
        dedupe_aliases(&mut aliases);
        assert_eq!(aliases, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = r#"[{"name":"box","tag":"div","attrs":[["role","note"]],"aliases":["boxed"]}]"#;
        let defs = from_json(json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "box");
        assert_eq!(defs[0].aliases, vec!["boxed".to_owned()]);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(from_json("not json").is_err());
    }

    #[test]
    fn test_definition_builder() {
        let def = SemanticDefinition::new("custom", "section")
            .with_attr("role", "note")
            .with_alias("customized");
        assert_eq!(def.tag, "section");
        assert_eq!(def.attrs.len(), 1);
        assert_eq!(def.aliases.len(), 1);
        assert!(!def.has_name_sentinel());
    }
}
