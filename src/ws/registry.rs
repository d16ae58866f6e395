use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Write half of one client connection. Frames are handed to the
/// connection's writer task through a bounded channel, so handing off a
/// frame never blocks the hub.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<Arc<String>>,
}

impl ClientHandle {
    pub fn new(tx: mpsc::Sender<Arc<String>>) -> Self {
        Self { tx }
    }

    /// Whether the writer task is still draining the channel.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Hand a frame to the writer task. Returns false when the connection
    /// is gone or its outbound buffer is full; the frame is dropped.
    pub fn send(&self, frame: Arc<String>) -> bool {
        self.tx.try_send(frame).is_ok()
    }
}

/// Live connections keyed by session id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<Uuid, ClientHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a connection under a freshly generated session id.
    pub fn register(&mut self, handle: ClientHandle) -> Uuid {
        let session_id = Uuid::new_v4();
        self.connections.insert(session_id, handle);
        session_id
    }

    /// Remove a connection. Returns false when the session was already gone.
    pub fn unregister(&mut self, session_id: &Uuid) -> bool {
        self.connections.remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &Uuid) -> bool {
        self.connections.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Visit every connection whose write side is still open. Closed
    /// connections are skipped; they get cleaned up by their own close
    /// notification.
    pub fn for_each_open<F>(&self, mut f: F)
    where
        F: FnMut(&Uuid, &ClientHandle),
    {
        for (session_id, handle) in &self.connections {
            if handle.is_open() {
                f(session_id, handle);
            }
        }
    }
}
