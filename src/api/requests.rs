use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::localized::MultilingualText;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TranslateLayerRequest<'a> {
    pub(crate) target_lang: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// The creator publishing form. Text fields go out as `{en, th}` pairs and
/// tags as one pair per tag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSeriesRequest {
    pub title: MultilingualText,
    pub subtitle: MultilingualText,
    pub description: MultilingualText,
    pub author: String,
    pub genres: Vec<String>,
    pub tags: Vec<MultilingualText>,
    pub thumbnail_url: String,
    pub cover_image_url: String,
    pub banner_image_url: String,
    pub status: SeriesStatus,
    pub visibility: Visibility,
    pub nsfw: bool,
    pub monetization_enabled: bool,
    pub monetization_type: UnlockType,
    pub default_unlock_type: UnlockType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesStatus {
    #[default]
    Draft,
    Ongoing,
    Completed,
    Hiatus,
}

impl SeriesStatus {
    pub const ALL: [SeriesStatus; 4] = [
        SeriesStatus::Draft,
        SeriesStatus::Ongoing,
        SeriesStatus::Completed,
        SeriesStatus::Hiatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SeriesStatus::Draft => "draft",
            SeriesStatus::Ongoing => "ongoing",
            SeriesStatus::Completed => "completed",
            SeriesStatus::Hiatus => "hiatus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Public, Visibility::Private, Visibility::Unlisted];

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
        }
    }
}

/// Monetization type and default chapter unlock type share these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockType {
    #[default]
    Free,
    Premium,
}

impl UnlockType {
    pub const ALL: [UnlockType; 2] = [UnlockType::Free, UnlockType::Premium];

    pub fn as_str(self) -> &'static str {
        match self {
            UnlockType::Free => "free",
            UnlockType::Premium => "premium",
        }
    }
}

fn parse_choice<T: Copy>(value: &str, all: &[T], name: fn(T) -> &'static str) -> Result<T, String> {
    let value = value.trim();
    all.iter()
        .copied()
        .find(|choice| name(*choice).eq_ignore_ascii_case(value))
        .ok_or_else(|| {
            let allowed = all.iter().map(|choice| name(*choice)).collect::<Vec<_>>();
            format!("expected one of: {}", allowed.join(", "))
        })
}

impl FromStr for SeriesStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::as_str)
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::as_str)
    }
}

impl FromStr for UnlockType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: Option<String>,
}
