use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LANGUAGE: &str = "en";

/// A text field that is either a legacy plain string or a record of parallel
/// strings keyed by language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilingualText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl Default for MultilingualText {
    fn default() -> Self {
        MultilingualText::Localized(BTreeMap::new())
    }
}

impl MultilingualText {
    pub fn localized<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MultilingualText::Localized(
            entries
                .into_iter()
                .map(|(code, text)| (code.into(), text.into()))
                .collect(),
        )
    }

    /// The `en`/`th` pair the backend's create forms expect. Both keys are
    /// always present, empty when not given.
    pub fn en_th(en: impl Into<String>, th: impl Into<String>) -> Self {
        MultilingualText::localized([("en", en.into()), ("th", th.into())])
    }

    /// The non-empty entry for exactly `language`, without fallback. A plain
    /// string answers for every language.
    pub fn get(&self, language: &str) -> Option<&str> {
        match self {
            MultilingualText::Plain(text) => Some(text.as_str()).filter(|text| !text.is_empty()),
            MultilingualText::Localized(entries) => lookup(entries, language),
        }
    }

    pub fn resolve(&self, language: &str) -> String {
        self.resolve_with_default(language, DEFAULT_LANGUAGE)
    }

    pub fn resolve_with_default(&self, language: &str, default_language: &str) -> String {
        match self {
            MultilingualText::Plain(text) => text.clone(),
            MultilingualText::Localized(entries) => lookup(entries, language)
                .or_else(|| lookup(entries, default_language))
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl From<&str> for MultilingualText {
    fn from(value: &str) -> Self {
        MultilingualText::Plain(value.to_string())
    }
}

fn lookup<'a>(entries: &'a BTreeMap<String, String>, language: &str) -> Option<&'a str> {
    let language = language.trim();
    entries
        .get(language)
        .or_else(|| {
            entries
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(language))
                .map(|(_, text)| text)
        })
        .map(String::as_str)
        .filter(|text| !text.is_empty())
}
