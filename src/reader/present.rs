use anyhow::{Context, Result};
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

use super::overlay::{ChapterView, LayerContent};
use super::{DisplayLanguage, ORIGINAL};
use crate::messages::Messages;

const READER_TEMPLATE: &str = include_str!("templates/reader.html.tera");

#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Render the affordance as a form posting to the preview server.
    pub translate_action: bool,
    /// Display languages offered in the top bar; empty hides the selector.
    pub languages: Vec<String>,
}

#[derive(Serialize)]
struct LanguageLink {
    code: String,
    label: String,
    selected: bool,
}

#[derive(Serialize)]
struct PageContext {
    order: i64,
    image_url: String,
    regions: Vec<RegionContext>,
}

#[derive(Serialize)]
struct RegionContext {
    layer_id: String,
    class: &'static str,
    style: String,
    needs_translation: bool,
    text: String,
}

pub fn render_text(view: &ChapterView, messages: &Messages) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} ({})", view.title, language_label(&view.language, messages)));
    let page_label = messages.t("reader.page");
    let affordance = format!("<{}>", messages.t("reader.translate"));
    for page in &view.pages {
        lines.push(format!("{} {}: {}", page_label, page.order, page.image_url));
        for region in &page.regions {
            let content = match &region.content {
                LayerContent::Original(text) | LayerContent::Translated(text) => text.clone(),
                LayerContent::NeedsTranslation => affordance.clone(),
            };
            lines.push(format!(
                "  - {} [{}] {}%,{}% {}%x{}%: {}",
                region.layer_id,
                region.kind.as_str(),
                region.rect.left,
                region.rect.top,
                region.rect.width,
                region.rect.height,
                content
            ));
        }
    }
    lines.join("\n")
}

pub fn render_html(view: &ChapterView, messages: &Messages, options: &HtmlOptions) -> Result<String> {
    let pages = view
        .pages
        .iter()
        .map(|page| PageContext {
            order: page.order,
            image_url: page.image_url.clone(),
            regions: page
                .regions
                .iter()
                .map(|region| RegionContext {
                    layer_id: region.layer_id.clone(),
                    class: if region.kind.is_enclosed() { "bubble" } else { "free" },
                    style: region.rect.css(),
                    needs_translation: region.content.needs_translation(),
                    text: region.content.text().unwrap_or_default().to_string(),
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    let mut languages = Vec::new();
    if !options.languages.is_empty() {
        let codes = std::iter::once(ORIGINAL.to_string()).chain(options.languages.iter().cloned());
        for code in codes {
            let label = if code == ORIGINAL {
                messages.t("reader.original")
            } else {
                code.clone()
            };
            languages.push(LanguageLink {
                selected: code == view.language.code(),
                code,
                label,
            });
        }
    }

    let mut context = TeraContext::new();
    context.insert("locale", messages.locale());
    context.insert("title", &view.title);
    context.insert("language", view.language.code());
    context.insert("pages", &pages);
    context.insert("languages", &languages);
    context.insert("translate_action", &options.translate_action);
    context.insert("translate_label", &messages.t("reader.translate"));
    context.insert("page_label", &messages.t("reader.page"));
    Tera::one_off(READER_TEMPLATE, &context, true).with_context(|| "failed to render reader page")
}

fn language_label(language: &DisplayLanguage, messages: &Messages) -> String {
    match language {
        DisplayLanguage::Original => messages.t("reader.original"),
        DisplayLanguage::Target(code) => code.clone(),
    }
}
