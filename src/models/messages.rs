use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A connected user as shown in the shared user list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
}

/// Declares or updates the sender's display name.
#[derive(Serialize, Deserialize, Debug)]
pub struct UserEventMessage {
    pub username: String,
}

/// Carries the full new document text.
#[derive(Serialize, Deserialize, Debug)]
pub struct ContentChangeMessage {
    pub content: String,
}

/// Messages a client may send over the collaboration socket. Anything that
/// does not parse as one of these is dropped by the hub.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "userevent")]
    UserEvent(UserEventMessage),
    #[serde(rename = "contentchange")]
    ContentChange(ContentChangeMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub users: HashMap<Uuid, UserProfile>,
    pub user_activity: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContentPayload {
    pub editor_content: String,
    pub user_activity: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PresenceBroadcast {
    pub data: PresencePayload,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContentBroadcast {
    pub data: ContentPayload,
}

/// Messages fanned out to every open session after the hub applies an
/// inbound event.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "userevent")]
    UserEvent(PresenceBroadcast),
    #[serde(rename = "contentchange")]
    ContentChange(ContentBroadcast),
}
