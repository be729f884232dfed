use serde::Serialize;

use super::DisplayLanguage;
use crate::models::{Chapter, LayerKind, TextLayer};

/// A layer's box as percentages of its page image's rendered size, so it
/// scales with the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl OverlayRect {
    pub fn from_layer(layer: &TextLayer) -> Self {
        Self {
            left: percent(layer.position_x),
            top: percent(layer.position_y),
            width: percent(layer.width),
            height: percent(layer.height),
        }
    }

    pub fn css(&self) -> String {
        format!(
            "left: {}%; top: {}%; width: {}%; height: {}%;",
            self.left, self.top, self.width, self.height
        )
    }
}

fn percent(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum LayerContent {
    Original(String),
    Translated(String),
    /// No cached translation for the display language; show the affordance.
    NeedsTranslation,
}

impl LayerContent {
    pub fn text(&self) -> Option<&str> {
        match self {
            LayerContent::Original(text) | LayerContent::Translated(text) => Some(text),
            LayerContent::NeedsTranslation => None,
        }
    }

    pub fn needs_translation(&self) -> bool {
        matches!(self, LayerContent::NeedsTranslation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayRegion {
    pub layer_id: String,
    pub rect: OverlayRect,
    pub kind: LayerKind,
    pub content: LayerContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub image_id: String,
    pub image_url: String,
    pub order: i64,
    pub regions: Vec<OverlayRegion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterView {
    pub chapter_id: String,
    pub title: String,
    pub language: DisplayLanguage,
    pub pages: Vec<PageView>,
}

impl ChapterView {
    pub fn regions(&self) -> impl Iterator<Item = &OverlayRegion> {
        self.pages.iter().flat_map(|page| page.regions.iter())
    }

    pub fn region(&self, layer_id: &str) -> Option<&OverlayRegion> {
        self.regions().find(|region| region.layer_id == layer_id)
    }
}

/// Lays out every text layer of `chapter` for `language`. Pages come out in
/// ascending display order (stable for equal orders); layers keep the order
/// they were received in.
pub fn render_overlay(chapter: &Chapter, language: &DisplayLanguage) -> ChapterView {
    let mut images = chapter.images.iter().collect::<Vec<_>>();
    images.sort_by_key(|image| image.order);

    let pages = images
        .into_iter()
        .map(|image| PageView {
            image_id: image.id.clone(),
            image_url: image.image_url.clone(),
            order: image.order,
            regions: image
                .text_layers
                .iter()
                .map(|layer| OverlayRegion {
                    layer_id: layer.id.clone(),
                    rect: OverlayRect::from_layer(layer),
                    kind: layer.kind,
                    content: layer_content(layer, language),
                })
                .collect(),
        })
        .collect();

    ChapterView {
        chapter_id: chapter.id.clone(),
        title: chapter.title.clone(),
        language: language.clone(),
        pages,
    }
}

fn layer_content(layer: &TextLayer, language: &DisplayLanguage) -> LayerContent {
    match language.target() {
        None => LayerContent::Original(layer.original_text.clone()),
        Some(code) => match layer.translation(code) {
            Some(translation) => LayerContent::Translated(translation.translated_text.clone()),
            None => LayerContent::NeedsTranslation,
        },
    }
}
