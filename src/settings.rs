use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const API_BASE_ENV: &str = "WEBTOON_API_BASE_URL";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub api_timeout_secs: Option<u64>,
    pub reader_languages: Vec<String>,
    pub default_language: String,
    pub translate_concurrency: usize,
    pub interface_locale: String,
    pub interface_locales: Vec<String>,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_timeout_secs: None,
            reader_languages: vec!["en".to_string(), "th".to_string(), "jp".to_string()],
            default_language: "en".to_string(),
            translate_concurrency: 4,
            interface_locale: "en".to_string(),
            interface_locales: vec!["en".to_string(), "th".to_string()],
            server_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    api: Option<ApiSettings>,
    reader: Option<ReaderSettings>,
    interface: Option<InterfaceSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSettings {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReaderSettings {
    languages: Option<Vec<String>>,
    default_language: Option<String>,
    translate_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct InterfaceSettings {
    locale: Option<String>,
    locales: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    if let Ok(base_url) = std::env::var(API_BASE_ENV) {
        settings.set_api_base_url(&base_url);
    }

    Ok(settings)
}

impl Settings {
    pub fn set_api_base_url(&mut self, value: &str) {
        let value = value.trim().trim_end_matches('/');
        if !value.is_empty() {
            self.api_base_url = value.to_string();
        }
    }

    pub fn supports_locale(&self, code: &str) -> bool {
        self.interface_locales
            .iter()
            .any(|locale| locale.eq_ignore_ascii_case(code.trim()))
    }

    fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(api) = incoming.api {
            if let Some(base_url) = api.base_url {
                self.set_api_base_url(&base_url);
            }
            if let Some(timeout) = api.timeout_secs {
                self.api_timeout_secs = if timeout > 0 { Some(timeout) } else { None };
            }
        }
        if let Some(reader) = incoming.reader {
            if let Some(languages) = reader.languages {
                let languages = normalize_codes(languages);
                if !languages.is_empty() {
                    self.reader_languages = languages;
                }
            }
            if let Some(lang) = reader.default_language {
                if !lang.trim().is_empty() {
                    self.default_language = lang.trim().to_lowercase();
                }
            }
            if let Some(concurrency) = reader.translate_concurrency {
                if concurrency > 0 {
                    self.translate_concurrency = concurrency;
                }
            }
        }
        if let Some(interface) = incoming.interface {
            if let Some(locales) = interface.locales {
                let locales = normalize_codes(locales);
                if !locales.is_empty() {
                    self.interface_locales = locales;
                }
            }
            if let Some(locale) = interface.locale {
                if !locale.trim().is_empty() {
                    self.interface_locale = locale.trim().to_lowercase();
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr.trim().to_string();
                }
            }
        }
    }
}

fn normalize_codes(codes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in codes {
        let code = code.trim().to_lowercase();
        if code.is_empty() || code == crate::reader::ORIGINAL || out.contains(&code) {
            continue;
        }
        out.push(code);
    }
    out
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
