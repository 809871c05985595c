#![allow(dead_code)]
//! In-process fake of the Music Assistant API that records every call

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use ma_spotify_lovelace::adapters::traits::{
    MediaItem, MusicAssistantApi, Player, PlayerState, SearchResults,
};

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetPlayer(String),
    Players,
    Play(String),
    Pause(String),
    Stop(String),
    Next(String),
    Previous(String),
    VolumeSet(String, f64),
    Search {
        query: String,
        media_types: Vec<String>,
        limit: u32,
        providers: Vec<String>,
    },
    PlayMedia {
        player_id: String,
        item_id: String,
        media_type: Option<String>,
    },
}

#[derive(Default)]
pub struct RecordingApi {
    players: Vec<Player>,
    search_results: SearchResults,
    fail_transport: bool,
    calls: Mutex<Vec<Call>>,
}

pub fn player(id: &str, volume_level: f64) -> Player {
    Player {
        player_id: id.to_string(),
        display_name: format!("Speaker {}", id),
        available: true,
        powered: true,
        volume_level,
        state: PlayerState::Idle,
    }
}

pub fn item(id: &str) -> MediaItem {
    MediaItem {
        item_id: id.to_string(),
        name: format!("Item {}", id),
        uri: None,
    }
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.players.push(player);
        self
    }

    pub fn with_facet(mut self, facet: &str, items: Vec<MediaItem>) -> Self {
        self.search_results.insert(facet.to_string(), items);
        self
    }

    /// Make every transport/volume/play call fail as a dropped connection would
    pub fn failing_transport(mut self) -> Self {
        self.fail_transport = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than lookups and searches
    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                !matches!(
                    c,
                    Call::GetPlayer(_) | Call::Players | Call::Search { .. }
                )
            })
            .collect()
    }

    pub fn search_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Search { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn transport(&self, call: Call) -> Result<()> {
        self.record(call);
        if self.fail_transport {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl MusicAssistantApi for RecordingApi {
    async fn get_player(&self, player_id: &str) -> Result<Option<Player>> {
        self.record(Call::GetPlayer(player_id.to_string()));
        Ok(self
            .players
            .iter()
            .find(|p| p.player_id == player_id)
            .cloned())
    }

    async fn players(&self) -> Result<Vec<Player>> {
        self.record(Call::Players);
        Ok(self.players.clone())
    }

    async fn player_play(&self, player_id: &str) -> Result<()> {
        self.transport(Call::Play(player_id.to_string()))
    }

    async fn player_pause(&self, player_id: &str) -> Result<()> {
        self.transport(Call::Pause(player_id.to_string()))
    }

    async fn player_stop(&self, player_id: &str) -> Result<()> {
        self.transport(Call::Stop(player_id.to_string()))
    }

    async fn player_next(&self, player_id: &str) -> Result<()> {
        self.transport(Call::Next(player_id.to_string()))
    }

    async fn player_previous(&self, player_id: &str) -> Result<()> {
        self.transport(Call::Previous(player_id.to_string()))
    }

    async fn player_volume_set(&self, player_id: &str, volume: f64) -> Result<()> {
        self.transport(Call::VolumeSet(player_id.to_string(), volume))
    }

    async fn search(
        &self,
        query: &str,
        media_types: &[&str],
        limit: u32,
        providers: &[&str],
    ) -> Result<SearchResults> {
        self.record(Call::Search {
            query: query.to_string(),
            media_types: media_types.iter().map(|s| s.to_string()).collect(),
            limit,
            providers: providers.iter().map(|s| s.to_string()).collect(),
        });
        // Only the requested facets come back
        Ok(self
            .search_results
            .iter()
            .filter(|(k, _)| media_types.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn play_media(
        &self,
        player_id: &str,
        item_id: &str,
        media_type: Option<&str>,
    ) -> Result<()> {
        self.transport(Call::PlayMedia {
            player_id: player_id.to_string(),
            item_id: item_id.to_string(),
            media_type: media_type.map(|s| s.to_string()),
        })
    }
}
