//! Music Assistant JSON API client
//!
//! Speaks the Music Assistant command API over HTTP:
//!
//! ```text
//! POST http://HOST:8095/api
//! {"message_id": "12", "command": "players/cmd/play", "args": {"player_id": "..."}}
//! ```
//!
//! Volumes travel as integer percentages (0-100) on the wire and are exposed
//! as fractions (0.0-1.0) through [`MusicAssistantApi`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::adapters::traits::{MediaItem, MusicAssistantApi, Player, PlayerState, SearchResults};

/// Default Music Assistant server port
pub const DEFAULT_PORT: u16 = 8095;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for a single Music Assistant server
pub struct MusicAssistantClient {
    base_url: String,
    token: Option<String>,
    client: Client,
    next_message_id: AtomicU64,
}

impl MusicAssistantClient {
    /// Create a client for `url` (e.g. `http://homeassistant.local:8095`).
    pub fn new(url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            token,
            client,
            next_message_id: AtomicU64::new(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute one command and return its result payload
    async fn execute(&self, command: &str, args: Value) -> Result<Value> {
        let url = format!("{}/api", self.base_url);
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);

        let body = json!({
            "message_id": message_id.to_string(),
            "command": command,
            "args": args,
        });

        debug!(command, args = ?body["args"], "Music Assistant request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Music Assistant request {} failed: {}",
                command,
                response.status()
            ));
        }

        // Commands without a return value may answer with an empty body
        let text = response.text().await?;
        let data: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON from Music Assistant for {}", command))?
        };

        debug!(command, result = ?data, "Music Assistant response");

        if let Some(code) = data.get("error_code") {
            let details = data
                .get("details")
                .and_then(|v| v.as_str())
                .unwrap_or("no details");
            return Err(anyhow!(
                "Music Assistant error {} for {}: {}",
                code,
                command,
                details
            ));
        }

        // Envelope form {"message_id": ..., "result": ...}
        if data.get("message_id").is_some() {
            return Ok(data.get("result").cloned().unwrap_or(Value::Null));
        }

        Ok(data)
    }

    async fn player_command(&self, command: &str, player_id: &str) -> Result<()> {
        self.execute(command, json!({ "player_id": player_id }))
            .await
            .map(|_| ())
    }
}

/// Convert a volume fraction to the integer percentage Music Assistant expects
pub fn fraction_to_percent(volume: f64) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Convert a wire percentage into a fraction
pub fn percent_to_fraction(percent: f64) -> f64 {
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Map a Music Assistant search response key to the singular facet tag.
///
/// The server answers `{"tracks": [...], "albums": [...]}` for a request
/// with `media_types: ["track", "album"]`.
fn facet_key(key: &str) -> String {
    match key {
        "tracks" => "track",
        "albums" => "album",
        "artists" => "artist",
        "playlists" => "playlist",
        "podcasts" => "podcast",
        "audiobooks" => "audiobook",
        other => other,
    }
    .to_string()
}

fn parse_player(value: &Value) -> Option<Player> {
    let player_id = value.get("player_id")?.as_str()?.to_string();
    let display_name = value
        .get("display_name")
        .or_else(|| value.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or(&player_id)
        .to_string();

    Some(Player {
        display_name,
        available: value
            .get("available")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        powered: value
            .get("powered")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        volume_level: value
            .get("volume_level")
            .and_then(|v| v.as_f64())
            .map(percent_to_fraction)
            .unwrap_or(0.0),
        state: value
            .get("state")
            .and_then(|v| v.as_str())
            .map(PlayerState::from)
            .unwrap_or_default(),
        player_id,
    })
}

fn parse_media_item(value: &Value) -> Option<MediaItem> {
    let item_id = value.get("item_id").and_then(|v| {
        // Library ids are numeric, provider ids are strings
        v.as_str()
            .map(|s| s.to_string())
            .or_else(|| v.as_i64().map(|n| n.to_string()))
    })?;

    Some(MediaItem {
        item_id,
        name: value
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        uri: value
            .get("uri")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    })
}

fn parse_search_results(value: &Value) -> SearchResults {
    let mut results = HashMap::new();
    if let Some(obj) = value.as_object() {
        for (key, items) in obj {
            if let Some(items) = items.as_array() {
                let parsed: Vec<MediaItem> = items.iter().filter_map(parse_media_item).collect();
                results.insert(facet_key(key), parsed);
            }
        }
    }
    results
}

#[async_trait]
impl MusicAssistantApi for MusicAssistantClient {
    async fn get_player(&self, player_id: &str) -> Result<Option<Player>> {
        let result = self
            .execute("players/get", json!({ "player_id": player_id }))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(parse_player(&result))
    }

    async fn players(&self) -> Result<Vec<Player>> {
        let result = self.execute("players/all", json!({})).await?;
        Ok(result
            .as_array()
            .map(|arr| arr.iter().filter_map(parse_player).collect())
            .unwrap_or_default())
    }

    async fn player_play(&self, player_id: &str) -> Result<()> {
        self.player_command("players/cmd/play", player_id).await
    }

    async fn player_pause(&self, player_id: &str) -> Result<()> {
        self.player_command("players/cmd/pause", player_id).await
    }

    async fn player_stop(&self, player_id: &str) -> Result<()> {
        self.player_command("players/cmd/stop", player_id).await
    }

    async fn player_next(&self, player_id: &str) -> Result<()> {
        self.player_command("players/cmd/next", player_id).await
    }

    async fn player_previous(&self, player_id: &str) -> Result<()> {
        self.player_command("players/cmd/previous", player_id).await
    }

    async fn player_volume_set(&self, player_id: &str, volume: f64) -> Result<()> {
        // Round at the last moment
        self.execute(
            "players/cmd/volume_set",
            json!({
                "player_id": player_id,
                "volume_level": fraction_to_percent(volume),
            }),
        )
        .await
        .map(|_| ())
    }

    async fn search(
        &self,
        query: &str,
        media_types: &[&str],
        limit: u32,
        providers: &[&str],
    ) -> Result<SearchResults> {
        let result = self
            .execute(
                "music/search",
                json!({
                    "search_query": query,
                    "media_types": media_types,
                    "limit": limit,
                    "providers": providers,
                }),
            )
            .await?;
        Ok(parse_search_results(&result))
    }

    async fn play_media(
        &self,
        player_id: &str,
        item_id: &str,
        media_type: Option<&str>,
    ) -> Result<()> {
        let mut args = json!({
            "queue_id": player_id,
            "media": item_id,
        });
        if let Some(media_type) = media_type {
            args["media_type"] = json!(media_type);
        }
        self.execute("player_queues/play_media", args)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_to_percent_rounds_and_clamps() {
        assert_eq!(fraction_to_percent(0.0), 0);
        assert_eq!(fraction_to_percent(0.456), 46);
        assert_eq!(fraction_to_percent(1.0), 100);
        assert_eq!(fraction_to_percent(1.7), 100);
        assert_eq!(fraction_to_percent(-0.2), 0);
    }

    #[test]
    fn test_percent_to_fraction() {
        assert!((percent_to_fraction(35.0) - 0.35).abs() < 1e-9);
        assert_eq!(percent_to_fraction(150.0), 1.0);
    }

    #[test]
    fn test_parse_player_converts_volume() {
        let value = json!({
            "player_id": "kitchen",
            "display_name": "Kitchen",
            "available": true,
            "powered": true,
            "volume_level": 40,
            "state": "playing"
        });
        let player = parse_player(&value).unwrap();
        assert_eq!(player.player_id, "kitchen");
        assert_eq!(player.display_name, "Kitchen");
        assert!((player.volume_level - 0.4).abs() < 1e-9);
        assert_eq!(player.state, PlayerState::Playing);
    }

    #[test]
    fn test_parse_player_falls_back_to_name() {
        let value = json!({"player_id": "den", "name": "Den Speaker"});
        let player = parse_player(&value).unwrap();
        assert_eq!(player.display_name, "Den Speaker");
        assert!(!player.available);
        assert_eq!(player.state, PlayerState::Idle);
    }

    #[test]
    fn test_parse_player_requires_id() {
        assert!(parse_player(&json!({"display_name": "nameless"})).is_none());
    }

    #[test]
    fn test_parse_search_results_maps_plural_keys() {
        let value = json!({
            "tracks": [
                {"item_id": "spotify-track-1", "name": "One", "uri": "spotify://track/1"},
                {"item_id": 42, "name": "Two"}
            ],
            "albums": [],
            "radio": [{"item_id": "r1", "name": "Radio"}]
        });
        let results = parse_search_results(&value);
        let tracks = &results["track"];
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].item_id, "spotify-track-1");
        assert_eq!(tracks[1].item_id, "42");
        assert!(results["album"].is_empty());
        assert_eq!(results["radio"][0].name, "Radio");
    }

    #[test]
    fn test_parse_search_results_skips_items_without_id() {
        let value = json!({"tracks": [{"name": "no id"}, {"item_id": "ok"}]});
        let results = parse_search_results(&value);
        assert_eq!(results["track"].len(), 1);
        assert_eq!(results["track"][0].item_id, "ok");
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = MusicAssistantClient::new("http://ma.local:8095/", None).unwrap();
        assert_eq!(client.base_url(), "http://ma.local:8095");
    }
}
