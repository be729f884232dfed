use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};

use webtoon_reader_rust::api::{CreateSeriesRequest, SeriesStatus, UnlockType, Visibility};
use webtoon_reader_rust::auth::SignupForm;
use webtoon_reader_rust::creator;
use webtoon_reader_rust::localized::MultilingualText;
use webtoon_reader_rust::reader::render_text;
use webtoon_reader_rust::{AppContext, ChapterState, Command, Config, ReadOptions, ReaderSession};

#[derive(Parser, Debug)]
#[command(
    name = "webtoon-reader",
    version,
    about = "Read webtoon chapters with translated text overlays"
)]
struct Cli {
    /// Backend API base URL (overrides settings and WEBTOON_API_BASE_URL)
    #[arg(long = "api-base", global = true)]
    api_base: Option<String>,

    /// Read an extra settings TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print a chapter's text overlay, or write it as HTML
    Read(ReadArgs),
    /// Serve a chapter preview over HTTP
    Serve {
        chapter_id: String,
        /// Listen address (default from settings [server])
        #[arg(long = "addr")]
        addr: Option<String>,
    },
    /// Browse series
    #[command(subcommand)]
    Series(SeriesCommand),
    Login {
        identifier: String,
        /// Password (read from stdin when omitted)
        #[arg(short = 'p', long = "password")]
        password: Option<String>,
    },
    Signup {
        #[arg(long = "username")]
        username: String,
        #[arg(long = "email")]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(short = 'p', long = "password")]
        password: Option<String>,
        /// Confirmation (defaults to the password)
        #[arg(long = "confirm-password")]
        confirm_password: Option<String>,
    },
    Logout,
    Whoami,
    /// Upgrade the signed-in account to creator
    BecomeCreator,
    /// Publish a new series (creator only)
    CreateSeries(CreateSeriesArgs),
    /// Upload an image file
    Upload { path: String },
    /// Ban a user (admin only)
    Ban { user_id: String },
    /// Show or set the interface language
    Locale { code: Option<String> },
}

#[derive(Subcommand, Debug)]
enum SeriesCommand {
    List,
    Show { series_id: String },
}

#[derive(Args, Debug)]
struct CreateSeriesArgs {
    /// English title (required)
    title: String,

    #[arg(long = "title-th", default_value = "")]
    title_th: String,

    #[arg(long = "subtitle", default_value = "")]
    subtitle: String,

    #[arg(long = "subtitle-th", default_value = "")]
    subtitle_th: String,

    #[arg(short = 'd', long = "description", default_value = "")]
    description: String,

    #[arg(long = "description-th", default_value = "")]
    description_th: String,

    #[arg(long = "author", default_value = "")]
    author: String,

    /// Genre (repeatable)
    #[arg(long = "genre")]
    genres: Vec<String>,

    /// Tag, used for both languages (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Cover image URL, or a local image file to upload
    #[arg(long = "cover", default_value = "")]
    cover: String,

    /// Banner image URL, or a local image file to upload
    #[arg(long = "banner", default_value = "")]
    banner: String,

    #[arg(long = "thumbnail-url", default_value = "")]
    thumbnail_url: String,

    /// draft, ongoing, completed or hiatus
    #[arg(long = "status", default_value = "draft")]
    status: SeriesStatus,

    /// public, private or unlisted
    #[arg(long = "visibility", default_value = "public")]
    visibility: Visibility,

    #[arg(long = "nsfw")]
    nsfw: bool,

    #[arg(long = "monetization-enabled")]
    monetization_enabled: bool,

    /// free or premium
    #[arg(long = "monetization-type", default_value = "free")]
    monetization_type: UnlockType,

    /// free or premium
    #[arg(long = "default-unlock-type", default_value = "free")]
    default_unlock_type: UnlockType,
}

impl CreateSeriesArgs {
    fn into_request(self) -> CreateSeriesRequest {
        CreateSeriesRequest {
            title: MultilingualText::en_th(self.title, self.title_th),
            subtitle: MultilingualText::en_th(self.subtitle, self.subtitle_th),
            description: MultilingualText::en_th(self.description, self.description_th),
            author: self.author,
            genres: self.genres,
            tags: creator::tags_from(&self.tags),
            thumbnail_url: self.thumbnail_url,
            cover_image_url: self.cover,
            banner_image_url: self.banner,
            status: self.status,
            visibility: self.visibility,
            nsfw: self.nsfw,
            monetization_enabled: self.monetization_enabled,
            monetization_type: self.monetization_type,
            default_unlock_type: self.default_unlock_type,
        }
    }
}

#[derive(Args, Debug)]
struct ReadArgs {
    chapter_id: String,

    /// Display language ("original" or a configured code)
    #[arg(short = 'l', long = "lang", default_value = "original")]
    lang: String,

    /// Translate a layer before printing (repeatable)
    #[arg(short = 't', long = "translate")]
    translate: Vec<String>,

    /// Translate every layer missing the display language
    #[arg(long = "translate-missing")]
    translate_missing: bool,

    /// Write the chapter as an HTML page instead of printing it
    #[arg(long = "html")]
    html: Option<String>,

    /// Start an interactive reader session
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    webtoon_reader_rust::logging::init(cli.verbose)?;

    let command = match cli.command {
        CliCommand::Read(args) if args.interactive => {
            let ctx = AppContext::load(cli.read_settings.as_deref(), cli.api_base.as_deref())?;
            return run_interactive(ctx, &args.chapter_id, &args.lang).await;
        }
        CliCommand::Read(args) => Command::Read(ReadOptions {
            chapter_id: args.chapter_id,
            lang: args.lang,
            translate: args.translate,
            translate_missing: args.translate_missing,
            html: args.html,
        }),
        CliCommand::Serve { chapter_id, addr } => Command::Serve { chapter_id, addr },
        CliCommand::Series(SeriesCommand::List) => Command::ListSeries,
        CliCommand::Series(SeriesCommand::Show { series_id }) => Command::ShowSeries { series_id },
        CliCommand::Login {
            identifier,
            password,
        } => Command::Login {
            identifier,
            password: password_or_stdin(password)?,
        },
        CliCommand::Signup {
            username,
            email,
            password,
            confirm_password,
        } => {
            let password = password_or_stdin(password)?;
            Command::Signup(SignupForm {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            })
        }
        CliCommand::Logout => Command::Logout,
        CliCommand::Whoami => Command::WhoAmI,
        CliCommand::BecomeCreator => Command::BecomeCreator,
        CliCommand::CreateSeries(args) => Command::CreateSeries(args.into_request()),
        CliCommand::Upload { path } => Command::Upload { path },
        CliCommand::Ban { user_id } => Command::Ban { user_id },
        CliCommand::Locale { code } => Command::Locale { code },
    };

    let output = webtoon_reader_rust::run(Config {
        settings_path: cli.read_settings,
        api_base: cli.api_base,
        command,
    })
    .await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if io::stdin().is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(anyhow!("password is required (use --password or stdin)"));
    }
    Ok(password)
}

async fn run_interactive(ctx: AppContext, chapter_id: &str, lang: &str) -> Result<()> {
    let mut session = ctx.reader_session(chapter_id);
    session.set_language(lang)?;
    println!("{}", ctx.messages.t("common.loading"));
    if let ChapterState::LoadFailed(message) = session.load(&ctx.client).await {
        return Err(anyhow!("{} ({})", ctx.messages.t("reader.not_found"), message));
    }
    print_view(&ctx, &session);
    println!("{}", ctx.messages.t("reader.interactive_help"));

    let mut line = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    loop {
        line.clear();
        print!("> ");
        io::stdout().flush()?;
        if stdin_lock.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if handle_interactive_command(input, &ctx, &mut session).await? {
            break;
        }
    }
    Ok(())
}

async fn handle_interactive_command(
    input: &str,
    ctx: &AppContext,
    session: &mut ReaderSession,
) -> Result<bool> {
    let trimmed = input.trim();
    if matches!(trimmed, "/quit" | "/exit") {
        return Ok(true);
    }
    if trimmed == "/help" {
        println!("{}", ctx.messages.t("reader.interactive_help"));
        return Ok(false);
    }
    if trimmed == "/show" {
        print_view(ctx, session);
        return Ok(false);
    }
    if trimmed == "/magic" {
        println!("{}", ctx.messages.t("reader.magic_translate"));
        return Ok(false);
    }
    if trimmed == "/translate-all" {
        match webtoon_reader_rust::translate_missing_notes(ctx, session).await {
            Ok(notes) => notes.iter().for_each(|note| println!("{}", note)),
            Err(err) => eprintln!("{}: {}", ctx.messages.t("common.error"), err),
        }
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/translate") {
        let layer_id = arg.trim();
        if layer_id.is_empty() {
            eprintln!("usage: /translate LAYER_ID");
            return Ok(false);
        }
        match session.translate(&ctx.client, layer_id).await {
            Ok(translation) => println!(
                "{} {}: {}",
                ctx.messages.t("reader.translated"),
                layer_id,
                translation.translated_text
            ),
            Err(err) => eprintln!(
                "{}",
                webtoon_reader_rust::translation_failed_note(ctx, layer_id, &err)
            ),
        }
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/lang") {
        let value = arg.trim();
        if value.is_empty() {
            println!("lang: {}", session.language());
        } else {
            match session.set_language(value) {
                Ok(()) => print_view(ctx, session),
                Err(err) => eprintln!("{}: {}", ctx.messages.t("reader.unknown_language"), err),
            }
        }
        return Ok(false);
    }

    eprintln!("unknown command: {}", trimmed);
    Ok(false)
}

fn print_view(ctx: &AppContext, session: &ReaderSession) {
    match session.view() {
        Some(view) => println!("{}", render_text(&view, &ctx.messages)),
        None => eprintln!("{}", ctx.messages.t("reader.not_found")),
    }
}
