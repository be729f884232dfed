use serde::{Deserialize, Serialize};

use crate::models::Translation;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct LanguageQuery {
    pub(crate) lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateResponse {
    pub(crate) layer_id: String,
    pub(crate) translation: Translation,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
