//! Integration registry
//!
//! Holds the live Music Assistant handle between setup and teardown and is
//! the only place where action errors are turned into a success flag. Every
//! operation fails immediately, without calling out, while no handle is
//! installed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::adapters::traits::{MediaItem, MusicAssistantApi, PlayerState};
use crate::bus::{BusEvent, SharedBus};
use crate::control;
use crate::error::{ControlError, SetupError};
use crate::search::{self, DEFAULT_PROVIDER};
use crate::services::{ControlSpeakerRequest, PlaySpotifyRequest, DEFAULT_NAME};

/// Speaker summary served to the dashboard card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerInfo {
    pub id: String,
    pub name: String,
    pub available: bool,
    pub powered: bool,
    pub volume_level: f64,
    pub is_playing: bool,
}

/// Result of a successful config-flow validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub title: &'static str,
}

/// Config-flow check: a Music Assistant server must be configured and answer
/// a player listing.
pub async fn validate_input(
    api: Option<&dyn MusicAssistantApi>,
) -> Result<EntryInfo, SetupError> {
    let api = api.ok_or(SetupError::CannotConnect)?;
    match api.players().await {
        Ok(_) => Ok(EntryInfo {
            title: DEFAULT_NAME,
        }),
        Err(e) if e.is::<reqwest::Error>() => {
            error!("Cannot connect to Music Assistant: {:#}", e);
            Err(SetupError::CannotConnect)
        }
        Err(e) => {
            error!("Unexpected exception validating Music Assistant: {:#}", e);
            Err(SetupError::Unknown(e))
        }
    }
}

/// Handle slot plus the action entry points
pub struct Integration {
    api: RwLock<Option<Arc<dyn MusicAssistantApi>>>,
    provider: String,
    bus: SharedBus,
}

impl Integration {
    pub fn new(bus: SharedBus) -> Self {
        Self::with_provider(bus, DEFAULT_PROVIDER)
    }

    /// Search a provider other than Spotify
    pub fn with_provider(bus: SharedBus, provider: impl Into<String>) -> Self {
        Self {
            api: RwLock::new(None),
            provider: provider.into(),
            bus,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Install the Music Assistant handle. `server` is only used for logging.
    pub async fn setup(&self, api: Arc<dyn MusicAssistantApi>, server: &str) {
        *self.api.write().await = Some(api);
        info!("Successfully connected to Music Assistant at {}", server);
        self.bus.publish(BusEvent::IntegrationReady {
            server: server.to_string(),
        });
    }

    /// Drop the handle; subsequent actions fail until the next setup
    pub async fn teardown(&self) {
        let previous = self.api.write().await.take();
        if previous.is_some() {
            info!("Music Assistant integration unloaded");
            self.bus.publish(BusEvent::IntegrationUnloaded);
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.api.read().await.is_some()
    }

    /// Clone the handle out of the lock so no external call runs under it
    async fn handle(&self) -> Result<Arc<dyn MusicAssistantApi>, ControlError> {
        self.api.read().await.clone().ok_or(ControlError::NotReady)
    }

    /// `control_speaker` action
    pub async fn control_speaker(&self, req: &ControlSpeakerRequest) -> bool {
        let result = match self.handle().await {
            Ok(api) => {
                control::control_speaker(
                    api.as_ref(),
                    &req.speaker_id,
                    &req.command,
                    req.value.as_ref(),
                )
                .await
            }
            Err(e) => Err(e),
        };

        let success = match result {
            Ok(()) => true,
            Err(ControlError::NotReady) => {
                error!("Music Assistant not available");
                false
            }
            Err(ControlError::External(e)) => {
                error!(
                    "Failed to control speaker {} with command {}: {:#}",
                    req.speaker_id, req.command, e
                );
                false
            }
            Err(e) => {
                error!(
                    speaker_id = %req.speaker_id,
                    command = %req.command,
                    "{}",
                    e
                );
                false
            }
        };

        self.bus.publish(BusEvent::SpeakerControlled {
            speaker_id: req.speaker_id.clone(),
            command: req.command.clone(),
            success,
        });
        success
    }

    /// `play_spotify` action
    pub async fn search_and_play(&self, req: &PlaySpotifyRequest) -> bool {
        let result = match self.handle().await {
            Ok(api) => {
                search::search_and_play(
                    api.as_ref(),
                    &req.query,
                    &req.speaker_id,
                    &req.content_type,
                    &self.provider,
                )
                .await
            }
            Err(e) => Err(e),
        };

        let success = match result {
            Ok(()) => true,
            Err(ControlError::NotReady) => {
                error!("Music Assistant not available");
                false
            }
            Err(ControlError::External(e)) => {
                error!("Failed to search and play {:?}: {:#}", req.query, e);
                false
            }
            Err(e) => {
                error!(
                    speaker_id = %req.speaker_id,
                    query = %req.query,
                    "{}",
                    e
                );
                false
            }
        };

        self.bus.publish(BusEvent::ContentPlayed {
            speaker_id: req.speaker_id.clone(),
            query: req.query.clone(),
            content_type: req.content_type.clone(),
            success,
        });
        success
    }

    /// All speakers known to Music Assistant; empty on any failure
    pub async fn get_speakers(&self) -> Vec<SpeakerInfo> {
        let api = match self.handle().await {
            Ok(api) => api,
            Err(_) => {
                error!("Music Assistant not available");
                return Vec::new();
            }
        };

        match api.players().await {
            Ok(players) => players
                .into_iter()
                .map(|p| SpeakerInfo {
                    is_playing: p.state == PlayerState::Playing,
                    id: p.player_id,
                    name: p.display_name,
                    available: p.available,
                    powered: p.powered,
                    volume_level: p.volume_level,
                })
                .collect(),
            Err(e) => {
                error!("Failed to get speakers: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Raw facet search for the card's result list; empty on any failure
    pub async fn search(&self, query: &str, content_type: &str) -> Vec<MediaItem> {
        let api = match self.handle().await {
            Ok(api) => api,
            Err(_) => {
                error!("Music Assistant not available");
                return Vec::new();
            }
        };

        match search::search_facet(api.as_ref(), query, content_type, &self.provider).await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to search {} for {:?}: {:#}", content_type, query, e);
                Vec::new()
            }
        }
    }
}
