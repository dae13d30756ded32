//! Session Registry
//!
//! Keeps every live session addressable by id so several games can run
//! side by side in one process.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::runtime::protocol::{ClientAction, ErrorCode, SessionUpdate};
use crate::runtime::session::{LiveSession, RuntimeConfig, SessionError, SessionId};

/// Manages all active sessions.
pub struct SessionManager {
    /// Active sessions.
    sessions: RwLock<BTreeMap<SessionId, Arc<LiveSession>>>,
    /// Hosting settings applied to new sessions.
    runtime: RuntimeConfig,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            runtime,
        }
    }

    /// Spawn a new session.
    pub async fn create_session(&self, config: EngineConfig) -> SessionId {
        let session = LiveSession::spawn(config, self.runtime.clone());
        let id = session.id();

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::new(session));

        info!(session = %hex::encode(id), total = sessions.len(), "Session registered");
        id
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Option<Arc<LiveSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Get a session by ID, or fail.
    pub async fn require_session(&self, id: &SessionId) -> Result<Arc<LiveSession>, SessionError> {
        self.get_session(id)
            .await
            .ok_or_else(|| SessionError::SessionNotFound(hex::encode(id)))
    }

    /// Route an action to a session.
    pub async fn dispatch(
        &self,
        id: &SessionId,
        action: ClientAction,
    ) -> Result<SessionUpdate, SessionError> {
        let session = self.require_session(id).await?;
        session.apply(action).await
    }

    /// Route a raw JSON action to a session.
    ///
    /// Never fails: malformed payloads and session errors come back as
    /// [`SessionUpdate::Error`] for the client.
    pub async fn dispatch_json(&self, id: &SessionId, text: &str) -> SessionUpdate {
        let action = match ClientAction::from_json(text) {
            Ok(action) => action,
            Err(e) => {
                debug!(session = %hex::encode(id), error = %e, "Invalid action payload");
                return SessionUpdate::error(ErrorCode::InvalidInput, "Invalid message format");
            }
        };

        match self.dispatch(id, action).await {
            Ok(update) => update,
            Err(e) => {
                debug!(session = %hex::encode(id), error = %e, "Action rejected");
                e.to_update()
            }
        }
    }

    /// Shut a session down and forget it. Returns `false` if it was unknown.
    pub async fn remove_session(&self, id: &SessionId) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };

        match removed {
            Some(session) => {
                // Already stopped is fine; it is gone either way
                let _ = session.shutdown().await;
                info!(session = %hex::encode(id), "Session removed");
                true
            }
            None => false,
        }
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Forget sessions whose task has stopped. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_closed());

        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, "Cleaned up closed sessions");
        }
        removed
    }

    /// Shut every session down.
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<LiveSession>> = {
            let mut sessions = self.sessions.write().await;
            std::mem::take(&mut *sessions).into_values().collect()
        };
        for session in drained {
            let _ = session.shutdown().await;
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::IntendedKind;

    fn manager() -> SessionManager {
        SessionManager::new(RuntimeConfig::manual_clock())
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let manager = manager();
        let a = manager.create_session(EngineConfig::default()).await;
        let b = manager.create_session(EngineConfig::default()).await;
        assert_ne!(a, b);
        assert_eq!(manager.session_count().await, 2);

        let session_a = manager.require_session(&a).await.unwrap();
        session_a.submit("hello", IntendedKind::Chat).await.unwrap();
        session_a.report_time_up().await.unwrap();

        let snap_a = session_a.snapshot().await.unwrap();
        let snap_b = manager.get_session(&b).await.unwrap().snapshot().await.unwrap();
        assert_eq!(snap_a.messages.len(), snap_b.messages.len() + 2);
        assert_ne!(snap_a.game.phase, snap_b.game.phase);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_session() {
        let manager = manager();
        let err = manager
            .dispatch(&[9; 16], ClientAction::SyncRequest)
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::SessionNotFound("09".repeat(16)));
    }

    #[tokio::test]
    async fn test_dispatch_routes_action() {
        let manager = manager();
        let id = manager.create_session(EngineConfig::default()).await;

        let reply = manager.dispatch(&id, ClientAction::SyncRequest).await.unwrap();
        assert!(matches!(reply, SessionUpdate::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_dispatch_json_routes_action() {
        let manager = manager();
        let id = manager.create_session(EngineConfig::default()).await;

        let reply = manager
            .dispatch_json(&id, r#"{"type":"submit","content":"hi","kind":"chat"}"#)
            .await;
        assert!(matches!(reply, SessionUpdate::Submitted { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_json_invalid_payload() {
        let manager = manager();
        let id = manager.create_session(EngineConfig::default()).await;

        let reply = manager.dispatch_json(&id, "not json").await;
        match reply {
            SessionUpdate::Error(info) => assert_eq!(info.code, ErrorCode::InvalidInput),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_json_reports_session_errors() {
        let manager = manager();
        let sync = r#"{"type":"sync_request"}"#;

        match manager.dispatch_json(&[7; 16], sync).await {
            SessionUpdate::Error(info) => assert_eq!(info.code, ErrorCode::SessionNotFound),
            other => panic!("expected error, got {:?}", other),
        }

        let id = manager.create_session(EngineConfig::default()).await;
        manager.dispatch(&id, ClientAction::Leave).await.unwrap();
        match manager.dispatch_json(&id, sync).await {
            SessionUpdate::Error(info) => assert_eq!(info.code, ErrorCode::SessionClosed),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cleanup_removes_closed() {
        let manager = manager();
        let id = manager.create_session(EngineConfig::default()).await;
        let keep = manager.create_session(EngineConfig::default()).await;

        manager.dispatch(&id, ClientAction::Leave).await.unwrap();
        assert_eq!(manager.cleanup().await, 1);
        assert!(manager.get_session(&id).await.is_none());
        assert!(manager.get_session(&keep).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_and_shutdown_all() {
        let manager = manager();
        let id = manager.create_session(EngineConfig::default()).await;
        manager.create_session(EngineConfig::default()).await;

        assert!(manager.remove_session(&id).await);
        assert!(!manager.remove_session(&id).await);
        assert_eq!(manager.session_count().await, 1);

        manager.shutdown_all().await;
        assert_eq!(manager.session_count().await, 0);
    }
}
