use anyhow::{Result, anyhow};
use tracing::info;

use crate::api::{ApiClient, LoginRequest, SignupRequest};
use crate::messages::Messages;
use crate::preferences::{PreferenceStore, StoredSession};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Client-side checks run before any signup request is sent.
pub fn validate_signup(form: &SignupForm, messages: &Messages) -> Result<()> {
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(anyhow!(messages.t("auth.password_too_short")));
    }
    if form.password != form.confirm_password {
        return Err(anyhow!(messages.t("auth.password_mismatch")));
    }
    Ok(())
}

pub async fn login(
    client: &ApiClient,
    store: &PreferenceStore,
    identifier: &str,
    password: &str,
) -> Result<StoredSession> {
    let session = client
        .login(&LoginRequest {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        })
        .await?;
    info!("logged in as {}", session.user.display_name());
    store.store_session(&session)
}

/// Registers an account, then signs in with the new email and password.
pub async fn signup(
    client: &ApiClient,
    store: &PreferenceStore,
    form: &SignupForm,
    messages: &Messages,
) -> Result<StoredSession> {
    validate_signup(form, messages)?;
    client
        .signup(&SignupRequest {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        })
        .await?;
    login(client, store, &form.email, &form.password).await
}

pub fn logout(store: &PreferenceStore) -> Result<bool> {
    store.clear_session()
}
