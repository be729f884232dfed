use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::api::{ApiClient, CreateSeriesRequest, UploadResponse, error_message};
use crate::localized::MultilingualText;
use crate::messages::Messages;
use crate::models::Series;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Creator and admin routes need a bearer token; fail before sending without one.
pub fn require_login(client: &ApiClient, messages: &Messages) -> Result<()> {
    if client.has_token() {
        Ok(())
    } else {
        Err(anyhow!(messages.t("auth.login_required")))
    }
}

/// Checks the form the way the backend does (an English title is mandatory)
/// and cleans the list fields: trimmed, blanks dropped, first occurrence kept.
pub fn prepare_series(request: &CreateSeriesRequest, messages: &Messages) -> Result<CreateSeriesRequest> {
    if request.title.get("en").is_none_or(|title| title.trim().is_empty()) {
        return Err(anyhow!(messages.t("creator.title_required")));
    }
    let mut prepared = request.clone();
    prepared.author = prepared.author.trim().to_string();
    prepared.genres = unique_trimmed(request.genres.iter().map(String::as_str));

    let mut seen = Vec::new();
    prepared.tags = request
        .tags
        .iter()
        .filter(|tag| {
            let key = tag.resolve("en").trim().to_lowercase();
            if key.is_empty() || seen.contains(&key) {
                return false;
            }
            seen.push(key);
            true
        })
        .cloned()
        .collect();
    Ok(prepared)
}

/// Tags entered once apply to both languages.
pub fn tags_from(values: &[String]) -> Vec<MultilingualText> {
    unique_trimmed(values.iter().map(String::as_str))
        .into_iter()
        .map(|tag| MultilingualText::en_th(tag.clone(), tag))
        .collect()
}

fn unique_trimmed<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for value in values.map(str::trim).filter(|value| !value.is_empty()) {
        if !unique.iter().any(|existing| existing == value) {
            unique.push(value.to_string());
        }
    }
    unique
}

pub async fn create_series(
    client: &ApiClient,
    request: &CreateSeriesRequest,
    messages: &Messages,
) -> Result<Series> {
    require_login(client, messages)?;
    let request = prepare_series(request, messages)?;
    let series = client.create_series(&request).await?;
    info!("created series {}", series.id);
    Ok(series)
}

/// Turns a cover or banner reference into a URL: http(s) URLs pass through,
/// anything else is read as a local image and uploaded first.
pub async fn resolve_image(client: &ApiClient, reference: &str, messages: &Messages) -> Result<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("http://") || reference.starts_with("https://") {
        return Ok(reference.to_string());
    }
    upload_image(client, Path::new(reference), messages)
        .await
        .map(|response| response.url)
        .map_err(|err| anyhow!("{} ({})", messages.t("creator.upload_failed"), error_message(&err)))
}

pub async fn become_creator(client: &ApiClient, messages: &Messages) -> Result<()> {
    require_login(client, messages)?;
    client.become_creator().await
}

/// Checks the file name and the bytes both look like an image, returning the
/// sniffed mime type.
pub fn validate_image(file_name: &str, bytes: &[u8], messages: &Messages) -> Result<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(anyhow!(messages.t("creator.invalid_file")));
    }
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.mime_type()),
        _ => Err(anyhow!(messages.t("creator.invalid_file"))),
    }
}

pub async fn upload_image(
    client: &ApiClient,
    path: &Path,
    messages: &Messages,
) -> Result<UploadResponse> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime = validate_image(&file_name, &bytes, messages)?;
    require_login(client, messages)?;
    let response = client.upload(&file_name, bytes, mime).await?;
    info!("uploaded {} to {}", file_name, response.url);
    Ok(response)
}
