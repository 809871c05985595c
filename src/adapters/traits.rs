use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// =============================================================================
// Music Assistant data model
// =============================================================================

/// Playback state as reported by Music Assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Playing,
    Paused,
    #[default]
    Idle,
}

impl From<&str> for PlayerState {
    fn from(s: &str) -> Self {
        match s {
            "playing" => PlayerState::Playing,
            "paused" => PlayerState::Paused,
            _ => PlayerState::Idle,
        }
    }
}

/// A Music Assistant player (speaker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub display_name: String,
    pub available: bool,
    pub powered: bool,
    /// Volume as a fraction in [0.0, 1.0]
    pub volume_level: f64,
    pub state: PlayerState,
}

/// A single search hit. Only `item_id` is used to start playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub item_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Search response keyed by facet (`track`, `album`, `artist`, `playlist`, ...)
pub type SearchResults = HashMap<String, Vec<MediaItem>>;

// =============================================================================
// Consumed service boundary
// =============================================================================

/// The Music Assistant operations this bridge delegates to.
///
/// Implemented over HTTP by [`crate::adapters::music_assistant::MusicAssistantClient`].
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait MusicAssistantApi: Send + Sync + 'static {
    /// Look up a player. `Ok(None)` when the id is unknown.
    async fn get_player(&self, player_id: &str) -> Result<Option<Player>>;

    /// List all players.
    async fn players(&self) -> Result<Vec<Player>>;

    async fn player_play(&self, player_id: &str) -> Result<()>;
    async fn player_pause(&self, player_id: &str) -> Result<()>;
    async fn player_stop(&self, player_id: &str) -> Result<()>;
    async fn player_next(&self, player_id: &str) -> Result<()>;
    async fn player_previous(&self, player_id: &str) -> Result<()>;

    /// Set volume. `volume` is a fraction in [0.0, 1.0].
    async fn player_volume_set(&self, player_id: &str, volume: f64) -> Result<()>;

    /// Search the library of the given providers.
    async fn search(
        &self,
        query: &str,
        media_types: &[&str],
        limit: u32,
        providers: &[&str],
    ) -> Result<SearchResults>;

    /// Play an item on a player. `media_type` is omitted for tracks.
    async fn play_media(
        &self,
        player_id: &str,
        item_id: &str,
        media_type: Option<&str>,
    ) -> Result<()>;
}
