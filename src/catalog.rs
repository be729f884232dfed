use anyhow::{Result, anyhow};
use tracing::warn;

use crate::api::{ApiClient, error_message};
use crate::messages::Messages;
use crate::models::Series;

/// Picks strings for the interface locale, falling back to the default language.
#[derive(Debug, Clone)]
pub struct Localizer<'a> {
    pub messages: &'a Messages,
    pub default_language: &'a str,
}

impl Localizer<'_> {
    fn text(&self, value: &crate::localized::MultilingualText) -> String {
        value.resolve_with_default(self.messages.locale(), self.default_language)
    }
}

pub async fn list_series(client: &ApiClient, localizer: &Localizer<'_>) -> Result<String> {
    let series = client.list_series().await?;
    Ok(format_series_list(&series, localizer))
}

/// Fetches one series. Any failure becomes the terminal not-found message.
pub async fn show_series(
    client: &ApiClient,
    series_id: &str,
    localizer: &Localizer<'_>,
) -> Result<String> {
    match client.get_series(series_id).await {
        Ok(series) => Ok(format_series_detail(&series, localizer)),
        Err(err) => {
            warn!("series {} failed to load: {}", series_id, error_message(&err));
            Err(anyhow!(localizer.messages.t("series.not_found")))
        }
    }
}

pub fn format_series_list(series: &[Series], localizer: &Localizer<'_>) -> String {
    if series.is_empty() {
        return localizer.messages.t("series.empty");
    }
    series
        .iter()
        .map(|item| {
            let mut line = format!("{}\t{}", item.id, localizer.text(&item.title));
            let description = localizer.text(&item.description);
            if !description.is_empty() {
                line.push('\t');
                line.push_str(&description);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_series_detail(series: &Series, localizer: &Localizer<'_>) -> String {
    let messages = localizer.messages;
    let mut lines = vec![localizer.text(&series.title)];
    let subtitle = localizer.text(&series.subtitle);
    if !subtitle.is_empty() {
        lines.push(subtitle);
    }
    let description = localizer.text(&series.description);
    if !description.is_empty() {
        lines.push(description);
    }
    lines.push(String::new());
    lines.push(format!("{}: {}", messages.t("series.author"), series.author));
    if !series.status.is_empty() {
        lines.push(format!(
            "{}: {}",
            messages.t("series.status"),
            series.status.to_uppercase()
        ));
    }
    if !series.genres.is_empty() {
        lines.push(format!("{}: {}", messages.t("series.genres"), series.genres.join(", ")));
    }
    if !series.tags.is_empty() {
        let tags = series
            .tags
            .iter()
            .map(|tag| localizer.text(tag))
            .collect::<Vec<_>>();
        lines.push(format!("{}: {}", messages.t("series.tags"), tags.join(", ")));
    }

    let mut seasons = series.seasons.iter().collect::<Vec<_>>();
    seasons.sort_by_key(|season| season.season_number);
    for season in seasons {
        lines.push(String::new());
        let mut heading = format!("{} {}", messages.t("series.season"), season.season_number);
        if !season.title.is_empty() {
            heading.push_str(&format!(": {}", season.title));
        }
        lines.push(heading);
        let mut chapters = season.chapters.iter().collect::<Vec<_>>();
        chapters.sort_by_key(|chapter| chapter.chapter_number);
        for chapter in chapters {
            lines.push(format!(
                "  {} {}\t{}\t{}",
                messages.t("series.chapter"),
                chapter.chapter_number,
                chapter.title,
                chapter.id
            ));
        }
    }
    lines.join("\n")
}
