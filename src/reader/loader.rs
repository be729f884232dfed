use anyhow::Result;
use tracing::{debug, warn};

use crate::api::{Backend, error_message};
use crate::models::Chapter;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChapterState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Chapter),
    /// Terminal: the reader shows a not-found view and does not retry.
    LoadFailed(String),
}

impl ChapterState {
    pub fn from_result(result: Result<Chapter>) -> Self {
        match result {
            Ok(chapter) => ChapterState::Loaded(chapter),
            Err(err) => ChapterState::LoadFailed(error_message(&err)),
        }
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        match self {
            ChapterState::Loaded(chapter) => Some(chapter),
            _ => None,
        }
    }

    pub fn chapter_mut(&mut self) -> Option<&mut Chapter> {
        match self {
            ChapterState::Loaded(chapter) => Some(chapter),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChapterState::Loaded(_) | ChapterState::LoadFailed(_))
    }
}

/// Fetches one chapter. The response is trusted as-is apart from collapsing
/// duplicate language codes on a layer, where the later entry wins.
pub async fn load_chapter<B: Backend>(backend: &B, chapter_id: &str) -> Result<Chapter> {
    debug!("loading chapter {}", chapter_id);
    let mut chapter = backend.fetch_chapter(chapter_id).await.inspect_err(|err| {
        warn!("chapter {} failed to load: {:#}", chapter_id, err);
    })?;
    for image in &mut chapter.images {
        for layer in &mut image.text_layers {
            layer.dedupe_translations();
        }
    }
    debug!(
        "chapter {} loaded: {} pages, {} layers",
        chapter.id,
        chapter.images.len(),
        chapter.layers().count()
    );
    Ok(chapter)
}
