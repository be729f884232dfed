use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use tracing::debug;

pub mod admin;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod creator;
pub mod localized;
pub mod logging;
pub mod messages;
pub mod models;
mod paths;
pub mod preferences;
pub mod reader;
pub mod server;
pub mod settings;

pub use api::{ApiClient, ApiError, Backend};
pub use reader::{ChapterState, DisplayLanguage, ReaderSession};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<String>,
    pub api_base: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Read(ReadOptions),
    Serve {
        chapter_id: String,
        addr: Option<String>,
    },
    ListSeries,
    ShowSeries {
        series_id: String,
    },
    Login {
        identifier: String,
        password: String,
    },
    Signup(auth::SignupForm),
    Logout,
    WhoAmI,
    BecomeCreator,
    CreateSeries(api::CreateSeriesRequest),
    Upload {
        path: String,
    },
    Ban {
        user_id: String,
    },
    Locale {
        code: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub chapter_id: String,
    pub lang: String,
    pub translate: Vec<String>,
    pub translate_missing: bool,
    pub html: Option<String>,
}

/// Everything a command needs: merged settings, persisted client state, the
/// interface messages and an API client carrying the stored token.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: settings::Settings,
    pub store: preferences::PreferenceStore,
    pub preferences: preferences::Preferences,
    pub messages: messages::Messages,
    pub client: ApiClient,
}

impl AppContext {
    pub fn load(settings_path: Option<&str>, api_base: Option<&str>) -> Result<Self> {
        let mut settings = settings::load_settings(settings_path.map(Path::new))?;
        if let Some(api_base) = api_base {
            settings.set_api_base_url(api_base);
        }
        let store = preferences::PreferenceStore::open_default();
        let preferences = store.load()?;
        let locale = interface_locale(&settings, &preferences);
        let messages = messages::Messages::load(&locale)?;
        let client = ApiClient::from_settings(&settings)?.with_token(preferences.token());
        debug!(
            "api base {}, interface locale {}, client state {}",
            client.base_url(),
            messages.locale(),
            store.path().display()
        );
        Ok(Self {
            settings,
            store,
            preferences,
            messages,
            client,
        })
    }

    pub fn localizer(&self) -> catalog::Localizer<'_> {
        catalog::Localizer {
            messages: &self.messages,
            default_language: &self.settings.default_language,
        }
    }

    pub fn reader_session(&self, chapter_id: &str) -> ReaderSession {
        ReaderSession::new(chapter_id, self.settings.reader_languages.clone())
    }
}

fn interface_locale(settings: &settings::Settings, preferences: &preferences::Preferences) -> String {
    let candidates = preferences
        .locale
        .iter()
        .chain(std::iter::once(&settings.interface_locale));
    for locale in candidates {
        if settings.supports_locale(locale) && messages::supported_locales().contains(&locale.as_str()) {
            return locale.clone();
        }
    }
    messages::FALLBACK_LOCALE.to_string()
}

pub async fn run(config: Config) -> Result<String> {
    let ctx = AppContext::load(config.settings_path.as_deref(), config.api_base.as_deref())?;
    match config.command {
        Command::Read(options) => run_read(&ctx, options).await,
        Command::Serve { chapter_id, addr } => {
            let addr = addr.unwrap_or_else(|| ctx.settings.server_addr.clone());
            let state = server::ServerState::new(
                ctx.client.clone(),
                ctx.reader_session(&chapter_id),
                ctx.messages.clone(),
            );
            server::run_server(state, &addr).await?;
            Ok(String::new())
        }
        Command::ListSeries => catalog::list_series(&ctx.client, &ctx.localizer()).await,
        Command::ShowSeries { series_id } => {
            catalog::show_series(&ctx.client, &series_id, &ctx.localizer()).await
        }
        Command::Login {
            identifier,
            password,
        } => {
            let session = auth::login(&ctx.client, &ctx.store, &identifier, &password)
                .await
                .map_err(|err| auth_error(&ctx, err))?;
            Ok(format!(
                "{}\n{}",
                ctx.messages.t("auth.welcome"),
                format_logged_in(&ctx, &session.user)
            ))
        }
        Command::Signup(form) => {
            let session = auth::signup(&ctx.client, &ctx.store, &form, &ctx.messages)
                .await
                .map_err(|err| auth_error(&ctx, err))?;
            Ok(format_logged_in(&ctx, &session.user))
        }
        Command::Logout => {
            auth::logout(&ctx.store)?;
            Ok(ctx.messages.t("auth.logged_out"))
        }
        Command::WhoAmI => Ok(match ctx.preferences.user() {
            Some(user) => format_logged_in(&ctx, user),
            None => ctx.messages.t("auth.not_logged_in"),
        }),
        Command::BecomeCreator => {
            creator::become_creator(&ctx.client, &ctx.messages).await?;
            Ok(ctx.messages.t("creator.became_creator"))
        }
        Command::CreateSeries(request) => {
            let series = publish_series(&ctx, request).await.map_err(|err| {
                anyhow!(
                    "{}: {}",
                    ctx.messages.t("creator.create_failed"),
                    api::error_message(&err)
                )
            })?;
            Ok(format!(
                "{}\t{}\t{}",
                ctx.messages.t("creator.series_created"),
                series.id,
                series.title.resolve_with_default(ctx.messages.locale(), &ctx.settings.default_language)
            ))
        }
        Command::Upload { path } => {
            let response = creator::upload_image(&ctx.client, Path::new(&path), &ctx.messages).await?;
            Ok(format!("{}\t{}", ctx.messages.t("creator.uploaded"), response.url))
        }
        Command::Ban { user_id } => {
            admin::ban_user(&ctx.client, ctx.preferences.user(), &user_id, &ctx.messages).await?;
            Ok(ctx.messages.t("admin.user_banned"))
        }
        Command::Locale { code } => run_locale(&ctx, code.as_deref()),
    }
}

/// Validates the form, uploads local cover and banner files, then creates the
/// series.
async fn publish_series(ctx: &AppContext, mut request: api::CreateSeriesRequest) -> Result<models::Series> {
    creator::require_login(&ctx.client, &ctx.messages)?;
    creator::prepare_series(&request, &ctx.messages)?;
    request.cover_image_url =
        creator::resolve_image(&ctx.client, &request.cover_image_url, &ctx.messages).await?;
    request.banner_image_url =
        creator::resolve_image(&ctx.client, &request.banner_image_url, &ctx.messages).await?;
    creator::create_series(&ctx.client, &request, &ctx.messages).await
}

async fn run_read(ctx: &AppContext, options: ReadOptions) -> Result<String> {
    let mut session = ctx.reader_session(&options.chapter_id);
    session.set_language(&options.lang)?;
    if let ChapterState::LoadFailed(message) = session.load(&ctx.client).await {
        return Err(anyhow!("{} ({})", ctx.messages.t("reader.not_found"), message));
    }

    let mut notes = Vec::new();
    for layer_id in &options.translate {
        if let Err(err) = session.translate(&ctx.client, layer_id).await {
            notes.push(translation_failed_note(ctx, layer_id, &err));
        }
    }
    if options.translate_missing {
        notes.extend(translate_missing_notes(ctx, &mut session).await?);
    }

    let view = session
        .view()
        .ok_or_else(|| anyhow!(ctx.messages.t("reader.not_found")))?;
    let mut output = match options.html.as_deref() {
        Some(path) => {
            let html = reader::render_html(&view, &ctx.messages, &reader::HtmlOptions::default())?;
            fs::write(path, html).with_context(|| format!("failed to write {}", path))?;
            path.to_string()
        }
        None => reader::render_text(&view, &ctx.messages),
    };
    for note in notes {
        output.push('\n');
        output.push_str(&note);
    }
    Ok(output)
}

/// Runs a batch translate and describes the outcome, one line per failure.
pub async fn translate_missing_notes(
    ctx: &AppContext,
    session: &mut ReaderSession,
) -> Result<Vec<String>> {
    let summary = session
        .translate_missing(&ctx.client, ctx.settings.translate_concurrency)
        .await?;
    if summary.translated.is_empty() && summary.failed.is_empty() {
        return Ok(vec![ctx.messages.t("reader.nothing_to_translate")]);
    }
    let mut notes = vec![ctx.messages.format(
        "reader.translate_summary",
        &[
            ("translated", summary.translated.len().to_string()),
            ("failed", summary.failed.len().to_string()),
        ],
    )];
    for (layer_id, message) in summary.failed {
        notes.push(format!(
            "{} {}: {}",
            ctx.messages.t("reader.translation_failed"),
            layer_id,
            message
        ));
    }
    Ok(notes)
}

pub fn translation_failed_note(ctx: &AppContext, layer_id: &str, err: &anyhow::Error) -> String {
    let reason = if is_unauthorized(err) {
        ctx.messages.t("reader.login_required")
    } else {
        api::error_message(err)
    };
    format!(
        "{} {}: {}",
        ctx.messages.t("reader.translation_failed"),
        layer_id,
        reason
    )
}

fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_unauthorized)
}

fn run_locale(ctx: &AppContext, code: Option<&str>) -> Result<String> {
    let Some(code) = code else {
        return Ok(format!("{}: {}", ctx.messages.t("locale.current"), ctx.messages.locale()));
    };
    let code = code.trim().to_lowercase();
    if !ctx.settings.supports_locale(&code) || !messages::supported_locales().contains(&code.as_str()) {
        return Err(anyhow!("{}: {}", ctx.messages.t("locale.unsupported"), code));
    }
    ctx.store.set_locale(&code)?;
    let messages = messages::Messages::load(&code)?;
    Ok(format!("{}: {}", messages.t("locale.current"), messages.locale()))
}

fn format_logged_in(ctx: &AppContext, user: &models::User) -> String {
    format!(
        "{} {} ({})",
        ctx.messages.t("auth.logged_in"),
        user.display_name(),
        user.role.as_str()
    )
}

fn auth_error(ctx: &AppContext, err: anyhow::Error) -> anyhow::Error {
    if is_unauthorized(&err) {
        return anyhow!(ctx.messages.t("auth.invalid_credentials"));
    }
    let message = api::error_message(&err);
    if message.trim().is_empty() {
        return anyhow!(ctx.messages.t("auth.generic_error"));
    }
    anyhow!(message)
}
