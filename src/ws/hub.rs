use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    ClientMessage, ContentBroadcast, ContentPayload, PresenceBroadcast, PresencePayload,
    ServerMessage,
};
use crate::ws::document::DocumentStore;
use crate::ws::presence::PresenceStore;
use crate::ws::registry::{ClientHandle, ConnectionRegistry};

/// Hub occupancy counters reported by the diagnostics endpoint.
#[derive(Debug, Clone, Copy)]
pub struct HubStats {
    pub n_conn: u32,
    pub n_users: u32,
    pub n_activity: u32,
    pub content_bytes: u64,
}

/// Everything the hub mutates, behind one lock. Each inbound event takes
/// the lock, is applied, and is fanned out before the lock is released, so
/// the hub's arrival order is the authoritative order.
struct HubState {
    registry: ConnectionRegistry,
    presence: PresenceStore,
    document: DocumentStore,
}

/// The session/broadcast hub for the single shared document. Constructed
/// once at server start and handed to every connection by reference.
pub struct Hub {
    state: Mutex<HubState>,
}

impl Hub {
    pub fn new(activity_log_limit: usize) -> Self {
        Self {
            state: Mutex::new(HubState {
                registry: ConnectionRegistry::new(),
                presence: PresenceStore::new(activity_log_limit),
                document: DocumentStore::new(),
            }),
        }
    }

    /// Accept a connection and hand back its session id.
    pub async fn connect(&self, tx: mpsc::Sender<Arc<String>>) -> Uuid {
        let mut state = self.state.lock().await;
        let session_id = state.registry.register(ClientHandle::new(tx));
        info!(%session_id, "session connected");
        session_id
    }

    /// Apply one inbound frame. Unparseable or unrecognized payloads are
    /// dropped without feedback to the sender.
    pub async fn on_message(&self, session_id: Uuid, raw: &str) {
        let message: ClientMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!(%session_id, error = %e, "dropping unrecognized frame");
                return;
            }
        };

        let mut state = self.state.lock().await;
        match message {
            ClientMessage::UserEvent(user_event) => {
                info!(%session_id, username = %user_event.username, "presence update");
                state.presence.set_user(session_id, &user_event.username);
                state.broadcast_presence();
            }
            ClientMessage::ContentChange(change) => {
                state.document.set_content(change.content);
                state.broadcast_content();
            }
        }
    }

    /// Tear down a session. Safe to call more than once: a second
    /// notification for a session that is already gone is a no-op.
    pub async fn on_disconnect(&self, session_id: Uuid) {
        let mut state = self.state.lock().await;
        if !state.registry.unregister(&session_id) {
            return;
        }
        state.presence.remove_user(&session_id);
        info!(%session_id, "session disconnected");
        state.broadcast_presence();
    }

    pub async fn stats(&self) -> HubStats {
        let state = self.state.lock().await;
        HubStats {
            n_conn: state.registry.len() as u32,
            n_users: state.presence.user_count() as u32,
            n_activity: state.presence.activity_len() as u32,
            content_bytes: state.document.content().len() as u64,
        }
    }

    /// Current document body, as the next content broadcast would carry it.
    pub async fn document_content(&self) -> String {
        self.state.lock().await.document.content().to_string()
    }
}

impl HubState {
    fn broadcast_presence(&self) {
        let (users, user_activity) = self.presence.snapshot();
        self.broadcast(&ServerMessage::UserEvent(PresenceBroadcast {
            data: PresencePayload {
                users,
                user_activity,
            },
        }));
    }

    fn broadcast_content(&self) {
        let (_, user_activity) = self.presence.snapshot();
        self.broadcast(&ServerMessage::ContentChange(ContentBroadcast {
            data: ContentPayload {
                editor_content: self.document.content().to_string(),
                user_activity,
            },
        }));
    }

    /// Serialize once, then write to every open session. A session whose
    /// connection is not writable is skipped; it catches up on the next
    /// full-state broadcast.
    fn broadcast(&self, message: &ServerMessage) {
        let frame = match serde_json::to_string(message) {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                warn!(error = %e, "failed to serialize broadcast");
                return;
            }
        };
        self.registry.for_each_open(|session_id, handle| {
            if !handle.send(Arc::clone(&frame)) {
                debug!(%session_id, "session not writable, skipping");
            }
        });
    }
}
