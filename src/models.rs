use serde::{Deserialize, Deserializer, Serialize};

use crate::localized::MultilingualText;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<PageImage>,
}

impl Chapter {
    pub fn find_layer(&self, layer_id: &str) -> Option<&TextLayer> {
        self.images
            .iter()
            .flat_map(|image| image.text_layers.iter())
            .find(|layer| layer.id == layer_id)
    }

    pub fn find_layer_mut(&mut self, layer_id: &str) -> Option<&mut TextLayer> {
        self.images
            .iter_mut()
            .flat_map(|image| image.text_layers.iter_mut())
            .find(|layer| layer.id == layer_id)
    }

    pub fn layers(&self) -> impl Iterator<Item = &TextLayer> {
        self.images.iter().flat_map(|image| image.text_layers.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    pub id: String,
    pub image_url: String,
    pub order: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text_layers: Vec<TextLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub id: String,
    pub original_text: String,
    pub position_x: f32,
    pub position_y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type", default)]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_json: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub translations: Vec<Translation>,
}

impl TextLayer {
    pub fn translation(&self, language_code: &str) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|translation| translation.language_code == language_code)
    }

    /// Stores `translation`, replacing any existing entry for the same language.
    pub fn upsert_translation(&mut self, translation: Translation) {
        match self
            .translations
            .iter_mut()
            .find(|existing| existing.language_code == translation.language_code)
        {
            Some(existing) => *existing = translation,
            None => self.translations.push(translation),
        }
    }

    /// Collapses duplicate language codes, keeping the last entry of each.
    pub fn dedupe_translations(&mut self) {
        let incoming = std::mem::take(&mut self.translations);
        for translation in incoming {
            self.upsert_translation(translation);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    Bubble,
    Narration,
    Sfx,
    #[serde(other)]
    Free,
}

impl LayerKind {
    /// Bubbles get a filled rounded background; every other kind is free text.
    pub fn is_enclosed(self) -> bool {
        matches!(self, LayerKind::Bubble)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Bubble => "bubble",
            LayerKind::Narration => "narration",
            LayerKind::Sfx => "sfx",
            LayerKind::Free => "free",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub language_code: String,
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_machine_translated: bool,
    #[serde(default)]
    pub verified: bool,
}

impl Translation {
    pub fn new(language_code: impl Into<String>, translated_text: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            translated_text: translated_text.into(),
            id: None,
            is_machine_translated: false,
            verified: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    #[serde(default)]
    pub title: MultilingualText,
    #[serde(default)]
    pub subtitle: MultilingualText,
    #[serde(default)]
    pub description: MultilingualText,
    #[serde(default)]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<MultilingualText>,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub banner_image_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub season_number: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chapters: Vec<ChapterSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub id: String,
    pub chapter_number: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Reader,
    Creator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Creator => "creator",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_parses_backend_shape() {
        let raw = r#"{
            "id": "ch-1",
            "season_id": "s-1",
            "chapter_number": 3,
            "title": "Arrival",
            "status": "published",
            "published_at": null,
            "images": [
                {
                    "id": "img-1",
                    "chapter_id": "ch-1",
                    "image_url": "https://cdn.example.com/1.png",
                    "order": 1,
                    "text_layers": [
                        {
                            "id": "layer-1",
                            "chapter_image_id": "img-1",
                            "original_text": "Hello",
                            "position_x": 10,
                            "position_y": 20.5,
                            "width": 30,
                            "height": 12,
                            "style_json": {"font": "comic"},
                            "type": "narration",
                            "translations": [
                                {"id": "t-1", "text_layer_id": "layer-1", "language_code": "th", "translated_text": "สวัสดี", "is_machine_translated": true, "verified": false}
                            ]
                        }
                    ]
                },
                {"id": "img-2", "chapter_id": "ch-1", "image_url": "https://cdn.example.com/2.png", "order": 2, "text_layers": null}
            ]
        }"#;
        let chapter: Chapter = serde_json::from_str(raw).expect("chapter");
        assert_eq!(chapter.images.len(), 2);
        assert!(chapter.images[1].text_layers.is_empty());
        let layer = chapter.find_layer("layer-1").expect("layer");
        assert_eq!(layer.kind, LayerKind::Narration);
        assert_eq!(layer.position_y, 20.5);
        assert_eq!(
            layer.translation("th").map(|t| t.translated_text.as_str()),
            Some("สวัสดี")
        );
    }

    #[test]
    fn unknown_layer_type_is_free_text() {
        let raw = r#"{"id":"l","original_text":"BOOM","position_x":0,"position_y":0,"width":5,"height":5,"type":"caption"}"#;
        let layer: TextLayer = serde_json::from_str(raw).expect("layer");
        assert_eq!(layer.kind, LayerKind::Free);
        assert!(!layer.kind.is_enclosed());
        assert!(layer.translations.is_empty());
    }

    #[test]
    fn kind_label_matches_wire_name() {
        for kind in [
            LayerKind::Bubble,
            LayerKind::Narration,
            LayerKind::Sfx,
            LayerKind::Free,
        ] {
            let wire = serde_json::to_value(kind).expect("kind");
            assert_eq!(wire, kind.as_str());
        }
    }

    #[test]
    fn missing_layer_type_defaults_to_bubble() {
        let raw = r#"{"id":"l","original_text":"Hi","position_x":0,"position_y":0,"width":5,"height":5}"#;
        let layer: TextLayer = serde_json::from_str(raw).expect("layer");
        assert!(layer.kind.is_enclosed());
    }

    #[test]
    fn dedupe_keeps_last_entry_per_language() {
        let raw = r#"{"id":"l","original_text":"Hi","position_x":0,"position_y":0,"width":5,"height":5,
            "translations":[
                {"language_code":"th","translated_text":"old"},
                {"language_code":"en","translated_text":"Hi"},
                {"language_code":"th","translated_text":"new"}
            ]}"#;
        let mut layer: TextLayer = serde_json::from_str(raw).expect("layer");
        layer.dedupe_translations();
        assert_eq!(layer.translations.len(), 2);
        assert_eq!(
            layer.translation("th").map(|t| t.translated_text.as_str()),
            Some("new")
        );
    }

    #[test]
    fn user_role_defaults_to_reader() {
        let user: User = serde_json::from_str(r#"{"id":"u-1","email":"a@example.com"}"#)
            .expect("user");
        assert_eq!(user.role, Role::Reader);
        assert_eq!(user.display_name(), "a@example.com");
    }
}
