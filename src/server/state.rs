use tokio::sync::RwLock;

use crate::api::Backend;
use crate::messages::Messages;
use crate::reader::ReaderSession;

/// Shared by every request. Translate requests run against `backend` without
/// holding `session`; the write lock is taken only to merge a result.
pub struct ServerState<B: Backend> {
    pub backend: B,
    pub session: RwLock<ReaderSession>,
    pub messages: Messages,
}

impl<B: Backend> ServerState<B> {
    pub fn new(backend: B, session: ReaderSession, messages: Messages) -> Self {
        Self {
            backend,
            session: RwLock::new(session),
            messages,
        }
    }
}
