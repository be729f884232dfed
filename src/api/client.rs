use anyhow::{Context, Result, anyhow};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::requests::{
    CreateSeriesRequest, ErrorBody, LoginRequest, SignupRequest, TranslateLayerRequest,
    UploadResponse,
};
use super::{ApiError, Backend, BackendFuture};
use crate::models::{AuthSession, Chapter, Series, Translation};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, None)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::build(
            &settings.api_base_url,
            settings.api_timeout_secs.map(Duration::from_secs),
        )
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot hold paths: {}", base_url));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .with_context(|| "failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|token| !token.trim().is_empty());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get_chapter(&self, chapter_id: &str) -> Result<Chapter> {
        let url = self.endpoint(&["chapters", chapter_id])?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn request_translation(
        &self,
        layer_id: &str,
        target_lang: &str,
    ) -> Result<Translation> {
        let url = self.endpoint(&["creator", "layers", layer_id, "translate"])?;
        let body = TranslateLayerRequest { target_lang };
        self.send_json(self.http.post(url).json(&body)).await
    }

    pub async fn list_series(&self) -> Result<Vec<Series>> {
        let url = self.endpoint(&["series"])?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn get_series(&self, series_id: &str) -> Result<Series> {
        let url = self.endpoint(&["series", series_id])?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn create_series(&self, request: &CreateSeriesRequest) -> Result<Series> {
        let url = self.endpoint(&["creator", "series"])?;
        self.send_json(self.http.post(url).json(request)).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
        let url = self.endpoint(&["auth", "login"])?;
        self.send_json(self.http.post(url).json(request)).await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<()> {
        let url = self.endpoint(&["auth", "signup"])?;
        self.send_empty(self.http.post(url).json(request)).await
    }

    pub async fn become_creator(&self) -> Result<()> {
        let url = self.endpoint(&["users", "become-creator"])?;
        self.send_empty(self.http.post(url)).await
    }

    pub async fn ban_user(&self, user_id: &str) -> Result<()> {
        let url = self.endpoint(&["admin", "users", user_id, "ban"])?;
        self.send_empty(self.http.post(url)).await
    }

    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<UploadResponse> {
        let url = self.endpoint(&["upload"])?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .with_context(|| format!("invalid upload mime type: {}", mime))?;
        let form = Form::new().part("file", part);
        self.send_json(self.http.post(url).multipart(form)).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow!("API base URL cannot hold paths: {}", self.base_url))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_text(&self, request: RequestBuilder) -> Result<String> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| ApiError::network(err.to_string()))?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::network(format!("failed to read response body: {}", err)))?;
        if status.is_success() {
            return Ok(text);
        }
        let message = extract_error(&text).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(ApiError::http(status.as_u16(), message).into())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let text = self.send_text(request).await?;
        serde_json::from_str(&text).with_context(|| "failed to parse backend response JSON")
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.send_text(request).await.map(|_| ())
    }
}

impl Backend for ApiClient {
    fn fetch_chapter(&self, chapter_id: &str) -> BackendFuture<Chapter> {
        let client = self.clone();
        let chapter_id = chapter_id.to_string();
        Box::pin(async move { client.get_chapter(&chapter_id).await })
    }

    fn translate_layer(&self, layer_id: &str, target_lang: &str) -> BackendFuture<Translation> {
        let client = self.clone();
        let layer_id = layer_id.to_string();
        let target_lang = target_lang.to_string();
        Box::pin(async move { client.request_translation(&layer_id, &target_lang).await })
    }
}

fn extract_error(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.error.filter(|message| !message.trim().is_empty())
}
