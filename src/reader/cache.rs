use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::api::Backend;
use crate::models::{Chapter, Translation};

/// Stores `translation` on the layer with id `layer_id`, wherever it sits in
/// the chapter. A prior entry for the same language is replaced. Returns false
/// when no layer matches.
pub fn merge_translation(chapter: &mut Chapter, layer_id: &str, translation: Translation) -> bool {
    match chapter.find_layer_mut(layer_id) {
        Some(layer) => {
            layer.upsert_translation(translation);
            true
        }
        None => {
            warn!(
                "discarding {} translation for unknown layer {}",
                translation.language_code, layer_id
            );
            false
        }
    }
}

/// Ids of layers that have no translation for `language_code`, in page then
/// layer order as received.
pub fn pending_layers(chapter: &Chapter, language_code: &str) -> Vec<String> {
    chapter
        .layers()
        .filter(|layer| layer.translation(language_code).is_none())
        .map(|layer| layer.id.clone())
        .collect()
}

/// Requests one translation and merges it into `chapter`. Nothing is applied
/// before the backend answers, so a failure leaves the chapter untouched.
pub async fn translate<B: Backend>(
    backend: &B,
    chapter: &mut Chapter,
    layer_id: &str,
    target_lang: &str,
) -> Result<Translation> {
    if chapter.find_layer(layer_id).is_none() {
        return Err(anyhow!("layer {} is not part of chapter {}", layer_id, chapter.id));
    }
    let mut translation = backend.translate_layer(layer_id, target_lang).await?;
    if translation.language_code.trim().is_empty() {
        translation.language_code = target_lang.to_string();
    }
    info!(
        "layer {} translated to {}",
        layer_id, translation.language_code
    );
    merge_translation(chapter, layer_id, translation.clone());
    Ok(translation)
}
