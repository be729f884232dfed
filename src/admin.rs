use anyhow::{Result, anyhow};
use tracing::info;

use crate::api::{ApiClient, error_message};
use crate::messages::Messages;
use crate::models::{Role, User};

/// Bans `user_id`. Only a signed-in admin may try; the backend enforces it again.
pub async fn ban_user(
    client: &ApiClient,
    current_user: Option<&User>,
    user_id: &str,
    messages: &Messages,
) -> Result<()> {
    require_admin(current_user, messages)?;
    client.ban_user(user_id).await.map_err(|err| {
        anyhow!("{}: {}", messages.t("admin.ban_failed"), error_message(&err))
    })?;
    info!("banned user {}", user_id);
    Ok(())
}

pub fn require_admin(current_user: Option<&User>, messages: &Messages) -> Result<()> {
    match current_user {
        Some(user) if user.role == Role::Admin => Ok(()),
        _ => Err(anyhow!(messages.t("admin.access_denied"))),
    }
}
