use anyhow::{Result, anyhow};
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use super::cache::{self, merge_translation, pending_layers};
use super::loader::{ChapterState, load_chapter};
use super::overlay::{ChapterView, render_overlay};
use super::DisplayLanguage;
use crate::api::{Backend, error_message};
use crate::models::{Chapter, Translation};

/// One reader session: the chapter being read and the language it is shown in.
/// Dropping the session discards every cached translation with it.
#[derive(Debug, Clone)]
pub struct ReaderSession {
    chapter_id: String,
    state: ChapterState,
    language: DisplayLanguage,
    supported: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslateSummary {
    pub translated: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ReaderSession {
    pub fn new(chapter_id: impl Into<String>, supported_languages: Vec<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            state: ChapterState::NotLoaded,
            language: DisplayLanguage::Original,
            supported: supported_languages,
        }
    }

    pub fn chapter_id(&self) -> &str {
        &self.chapter_id
    }

    pub fn state(&self) -> &ChapterState {
        &self.state
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        self.state.chapter()
    }

    pub fn language(&self) -> &DisplayLanguage {
        &self.language
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported
    }

    /// Loads the chapter once. A session that already loaded or failed keeps
    /// its state; failures are not retried.
    pub async fn load<B: Backend>(&mut self, backend: &B) -> &ChapterState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.state = ChapterState::Loading;
        self.state = ChapterState::from_result(load_chapter(backend, &self.chapter_id).await);
        &self.state
    }

    pub fn set_language(&mut self, code: &str) -> Result<()> {
        self.language = DisplayLanguage::parse(code, &self.supported)?;
        Ok(())
    }

    /// The overlay for the current chapter and language, if the chapter loaded.
    pub fn view(&self) -> Option<ChapterView> {
        self.chapter()
            .map(|chapter| render_overlay(chapter, &self.language))
    }

    /// Translates one layer into the current display language.
    pub async fn translate<B: Backend>(&mut self, backend: &B, layer_id: &str) -> Result<Translation> {
        let target = self.require_target()?;
        let chapter = self
            .state
            .chapter_mut()
            .ok_or_else(|| anyhow!("chapter {} is not loaded", self.chapter_id))?;
        cache::translate(backend, chapter, layer_id, &target).await
    }

    /// Merges a translation obtained elsewhere, e.g. by a request that ran
    /// without holding the session.
    pub fn merge(&mut self, layer_id: &str, translation: Translation) -> bool {
        match self.state.chapter_mut() {
            Some(chapter) => merge_translation(chapter, layer_id, translation),
            None => false,
        }
    }

    /// Requests a translation for every layer lacking the current display
    /// language, at most `concurrency` at a time. Each completion is merged as
    /// it arrives, in whatever order the backend answers.
    pub async fn translate_missing<B: Backend>(
        &mut self,
        backend: &B,
        concurrency: usize,
    ) -> Result<TranslateSummary> {
        let target = self.require_target()?;
        let pending = match self.state.chapter() {
            Some(chapter) => pending_layers(chapter, &target),
            None => return Err(anyhow!("chapter {} is not loaded", self.chapter_id)),
        };
        info!(
            "translating {} layers of chapter {} to {}",
            pending.len(),
            self.chapter_id,
            target
        );

        let mut completions = stream::iter(pending.into_iter().map(|layer_id| {
            let request = backend.translate_layer(&layer_id, &target);
            async move { (layer_id, request.await) }
        }))
        .buffer_unordered(concurrency.max(1));

        let mut summary = TranslateSummary::default();
        while let Some((layer_id, result)) = completions.next().await {
            match result {
                Ok(mut translation) => {
                    if translation.language_code.trim().is_empty() {
                        translation.language_code = target.clone();
                    }
                    if self.merge(&layer_id, translation) {
                        summary.translated.push(layer_id);
                    }
                }
                Err(err) => {
                    warn!("layer {} failed to translate: {:#}", layer_id, err);
                    summary.failed.push((layer_id, error_message(&err)));
                }
            }
        }
        Ok(summary)
    }

    fn require_target(&self) -> Result<String> {
        self.language
            .target()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("select a display language other than original to translate"))
    }
}
