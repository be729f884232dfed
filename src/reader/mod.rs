//! The chapter reader: loading a chapter, laying out its text layers over the
//! page images, and merging on-demand translations into the loaded chapter.

use anyhow::{Result, anyhow};
use serde::{Serialize, Serializer};
use std::fmt;

mod cache;
mod loader;
mod overlay;
mod present;
mod session;

pub use cache::{merge_translation, pending_layers, translate};
pub use loader::{ChapterState, load_chapter};
pub use overlay::{ChapterView, LayerContent, OverlayRect, OverlayRegion, PageView, render_overlay};
pub use present::{HtmlOptions, render_html, render_text};
pub use session::{ReaderSession, TranslateSummary};

pub const ORIGINAL: &str = "original";

/// The language the reader is viewing: the untagged original text, or one of
/// the configured target codes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayLanguage {
    #[default]
    Original,
    Target(String),
}

impl DisplayLanguage {
    pub fn parse(code: &str, supported: &[String]) -> Result<Self> {
        let code = code.trim().to_lowercase();
        if code.is_empty() || code == ORIGINAL {
            return Ok(DisplayLanguage::Original);
        }
        if supported.iter().any(|lang| lang.eq_ignore_ascii_case(&code)) {
            return Ok(DisplayLanguage::Target(code));
        }
        Err(anyhow!(
            "unsupported display language '{}' (expected {} or one of: {})",
            code,
            ORIGINAL,
            supported.join(", ")
        ))
    }

    pub fn code(&self) -> &str {
        match self {
            DisplayLanguage::Original => ORIGINAL,
            DisplayLanguage::Target(code) => code,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            DisplayLanguage::Original => None,
            DisplayLanguage::Target(code) => Some(code),
        }
    }
}

impl fmt::Display for DisplayLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for DisplayLanguage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
