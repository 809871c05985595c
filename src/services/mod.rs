//! Action (service call) schemas
//!
//! Two actions are exposed under the `ma_spotify_lovelace` domain:
//! - `play_spotify`: `{query, speaker_id, content_type = "track"}`
//! - `control_speaker`: `{speaker_id, command, value?}`

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integration domain, used in routes, topics and asset paths
pub const DOMAIN: &str = "ma_spotify_lovelace";
pub const SERVICE_PLAY_SPOTIFY: &str = "play_spotify";
pub const SERVICE_CONTROL_SPEAKER: &str = "control_speaker";

/// Display name of the integration entry
pub const DEFAULT_NAME: &str = "Music Assistant Spotify";

fn default_content_type() -> String {
    "track".to_string()
}

/// `control_speaker` value: either a string or a non-negative number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceValue {
    Number(f64),
    Text(String),
}

impl ServiceValue {
    /// Numeric reading of the value; strings are parsed after trimming
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ServiceValue::Number(n) => Some(*n),
            ServiceValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl fmt::Display for ServiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceValue::Number(n) => write!(f, "{}", n),
            ServiceValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// `play_spotify` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySpotifyRequest {
    pub query: String,
    pub speaker_id: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// `control_speaker` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpeakerRequest {
    pub speaker_id: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ServiceValue>,
}

impl ControlSpeakerRequest {
    /// Reject negative numeric values; strings are checked at dispatch time
    pub fn validate(&self) -> Result<(), String> {
        match self.value {
            Some(ServiceValue::Number(n)) if !(n.is_finite() && n >= 0.0) => Err(format!(
                "expected a positive float for dictionary value @ data['value'], got {}",
                n
            )),
            _ => Ok(()),
        }
    }
}

/// MQTT `<prefix>/<speaker_id>/play` body (speaker comes from the topic)
#[derive(Debug, Clone, Deserialize)]
pub struct PlayMessage {
    pub query: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// MQTT `<prefix>/<speaker_id>/control` body
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMessage {
    pub command: String,
    #[serde(default)]
    pub value: Option<ServiceValue>,
}

impl PlayMessage {
    pub fn into_request(self, speaker_id: String) -> PlaySpotifyRequest {
        PlaySpotifyRequest {
            query: self.query,
            speaker_id,
            content_type: self.content_type,
        }
    }
}

impl ControlMessage {
    pub fn into_request(self, speaker_id: String) -> ControlSpeakerRequest {
        ControlSpeakerRequest {
            speaker_id,
            command: self.command,
            value: self.value,
        }
    }
}
