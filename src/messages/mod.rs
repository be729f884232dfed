use anyhow::{Context, Result, anyhow};
use serde_json::Value;

pub const FALLBACK_LOCALE: &str = "en";

/// Interface strings for one locale, looked up by dotted key (`reader.translate`).
#[derive(Debug, Clone)]
pub struct Messages {
    locale: String,
    catalog: Value,
    fallback: Value,
}

impl Messages {
    pub fn load(locale: &str) -> Result<Self> {
        let locale = normalize_locale(locale);
        let raw = catalog_source(&locale)
            .ok_or_else(|| anyhow!("no message catalog for locale: {}", locale))?;
        let catalog: Value = serde_json::from_str(raw)
            .with_context(|| format!("failed to parse message catalog: {}", locale))?;
        let fallback = if locale == FALLBACK_LOCALE {
            catalog.clone()
        } else {
            let raw = catalog_source(FALLBACK_LOCALE)
                .ok_or_else(|| anyhow!("no fallback message catalog"))?;
            serde_json::from_str(raw).with_context(|| "failed to parse fallback message catalog")?
        };
        Ok(Self {
            locale,
            catalog,
            fallback,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Returns the message for `key`, or the key itself when neither the locale
    /// nor the fallback catalog defines it.
    pub fn t(&self, key: &str) -> String {
        lookup(&self.catalog, key)
            .or_else(|| lookup(&self.fallback, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Like [`Messages::t`], replacing `{name}` placeholders with `args`.
    pub fn format(&self, key: &str, args: &[(&str, String)]) -> String {
        let mut message = self.t(key);
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }
}

pub fn supported_locales() -> &'static [&'static str] {
    &["en", "th"]
}

fn catalog_source(locale: &str) -> Option<&'static str> {
    match locale {
        "en" => Some(include_str!("en.json")),
        "th" => Some(include_str!("th.json")),
        _ => None,
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().to_lowercase()
}

fn lookup<'a>(catalog: &'a Value, key: &str) -> Option<&'a str> {
    let mut current = catalog;
    for part in key.split('.') {
        current = current.as_object()?.get(part)?;
    }
    current.as_str()
}
