//! MQTT Adapter
//!
//! Lets Home Assistant automations call the two actions over MQTT:
//!
//! - `<prefix>/<speaker_id>/control` `{"command": "volume_set", "value": 0.4}`
//! - `<prefix>/<speaker_id>/play` `{"query": "Blue Monday", "content_type": "track"}`
//!
//! Action results from the event bus are published to
//! `<prefix>/<speaker_id>/result`, integration readiness to `<prefix>/status`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use rumqttc::{AsyncClient, ClientError, Event, Incoming, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::bus::{BusEvent, SharedBus};
use crate::integration::Integration;
use crate::services::{ControlMessage, PlayMessage};

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_TOPIC_PREFIX: &str = "ma_spotify_lovelace";

/// MQTT connection status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttStatus {
    pub connected: bool,
    pub host: Option<String>,
    pub port: u16,
    pub topic_prefix: String,
}

/// Which action an incoming topic addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicAction {
    Control,
    Play,
}

/// Split `<prefix>/<speaker_id>/<action>` into speaker and action
pub fn parse_action_topic<'a>(prefix: &str, topic: &'a str) -> Option<(&'a str, TopicAction)> {
    let rest = topic.strip_prefix(prefix)?.strip_prefix('/')?;
    let (speaker_id, action) = rest.rsplit_once('/')?;
    if speaker_id.is_empty() {
        return None;
    }
    let action = match action {
        "control" => TopicAction::Control,
        "play" => TopicAction::Play,
        _ => return None,
    };
    Some((speaker_id, action))
}

/// Topic filters for the two action surfaces
pub fn action_filters(prefix: &str) -> [String; 2] {
    [format!("{}/+/control", prefix), format!("{}/+/play", prefix)]
}

/// Queue subscriptions for both action topics without waiting on the event loop
fn subscribe_actions(client: &AsyncClient, prefix: &str) -> Result<(), ClientError> {
    for filter in action_filters(prefix) {
        client.try_subscribe(filter, QoS::AtLeastOnce)?;
    }
    Ok(())
}

/// Topic and payload an event is published under
pub fn event_topic(prefix: &str, event: &BusEvent) -> (String, serde_json::Value) {
    match event {
        BusEvent::IntegrationReady { server } => (
            format!("{}/status", prefix),
            serde_json::json!({
                "ready": true,
                "server": server
            }),
        ),
        BusEvent::IntegrationUnloaded => (
            format!("{}/status", prefix),
            serde_json::json!({
                "ready": false
            }),
        ),
        BusEvent::SpeakerControlled {
            speaker_id,
            command,
            success,
        } => (
            format!("{}/{}/result", prefix, speaker_id),
            serde_json::json!({
                "action": "control_speaker",
                "command": command,
                "success": success
            }),
        ),
        BusEvent::ContentPlayed {
            speaker_id,
            query,
            content_type,
            success,
        } => (
            format!("{}/{}/result", prefix, speaker_id),
            serde_json::json!({
                "action": "play_spotify",
                "query": query,
                "content_type": content_type,
                "success": success
            }),
        ),
    }
}

/// Internal state
struct MqttState {
    host: Option<String>,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    topic_prefix: String,
    connected: bool,
}

impl Default for MqttState {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            username: None,
            password: None,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            connected: false,
        }
    }
}

/// MQTT Adapter
pub struct MqttAdapter {
    state: Arc<RwLock<MqttState>>,
    client: Arc<RwLock<Option<AsyncClient>>>,
    integration: Arc<Integration>,
    bus: SharedBus,
    shutdown: CancellationToken,
}

impl MqttAdapter {
    pub fn new(integration: Arc<Integration>, bus: SharedBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(MqttState::default())),
            client: Arc::new(RwLock::new(None)),
            integration,
            bus,
            shutdown: CancellationToken::new(),
        }
    }

    /// Configure the MQTT connection
    pub async fn configure(
        &self,
        host: String,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
        topic_prefix: Option<String>,
    ) {
        let mut state = self.state.write().await;
        state.host = Some(host);
        state.port = port.unwrap_or(DEFAULT_PORT);
        state.username = username;
        state.password = password;
        if let Some(prefix) = topic_prefix {
            state.topic_prefix = prefix;
        }
    }

    /// Check if configured
    pub async fn is_configured(&self) -> bool {
        self.state.read().await.host.is_some()
    }

    /// Get connection status
    pub async fn get_status(&self) -> MqttStatus {
        let state = self.state.read().await;
        MqttStatus {
            connected: state.connected,
            host: state.host.clone(),
            port: state.port,
            topic_prefix: state.topic_prefix.clone(),
        }
    }

    /// Start MQTT connection and bridge
    pub async fn start(&self) -> Result<()> {
        let (host, port, username, password, topic_prefix) = {
            let state = self.state.read().await;
            let host = state
                .host
                .clone()
                .ok_or_else(|| anyhow!("MQTT host not configured"))?;
            (
                host,
                state.port,
                state.username.clone(),
                state.password.clone(),
                state.topic_prefix.clone(),
            )
        };

        let mut options = MqttOptions::new("ma-spotify-lovelace", &host, port);
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(user), Some(pass)) = (&username, &password) {
            options.set_credentials(user, pass);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        {
            let mut client_guard = self.client.write().await;
            *client_guard = Some(client.clone());
        }

        tracing::info!("MQTT connecting to {}:{}...", host, port);

        // Event loop: incoming action requests. A clean session starts with no
        // subscriptions, so every ConnAck re-issues them.
        let state = self.state.clone();
        let loop_client = client;
        let integration = self.integration.clone();
        let prefix = topic_prefix.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("MQTT event loop shutting down");
                        break;
                    }
                    result = eventloop.poll() => {
                        match result {
                            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                                let payload = String::from_utf8_lossy(&publish.payload).to_string();
                                Self::handle_message(&integration, &prefix, &publish.topic, &payload);
                            }
                            Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                                tracing::info!("MQTT connected (code: {:?})", ack.code);
                                if let Err(e) = subscribe_actions(&loop_client, &prefix) {
                                    tracing::error!("MQTT subscribe failed: {}", e);
                                }
                                state.write().await.connected = true;
                            }
                            Ok(Event::Incoming(Incoming::Disconnect)) => {
                                tracing::warn!("MQTT disconnected");
                                state.write().await.connected = false;
                            }
                            Err(e) => {
                                tracing::error!("MQTT error: {}", e);
                                state.write().await.connected = false;
                                // Check shutdown before sleeping
                                tokio::select! {
                                    _ = shutdown.cancelled() => break,
                                    _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        });

        // Bus forwarder: action results and readiness
        let client_clone = self.client.clone();
        let bus_clone = self.bus.clone();
        let prefix_clone = topic_prefix;
        let shutdown2 = self.shutdown.clone();

        tokio::spawn(async move {
            let mut rx = bus_clone.subscribe();

            loop {
                tokio::select! {
                    _ = shutdown2.cancelled() => {
                        tracing::info!("MQTT bus forwarder shutting down");
                        break;
                    }
                    result = rx.recv() => {
                        match result {
                            Ok(event) => {
                                if let Some(client) = client_clone.read().await.as_ref() {
                                    if let Err(e) = Self::publish_event(client, &prefix_clone, &event).await {
                                        tracing::debug!("MQTT publish failed: {}", e);
                                    }
                                }
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!("MQTT bus forwarder lagged by {} events", n);
                            }
                        }
                    }
                }
            }
        });

        Ok(())
    }

    /// Dispatch one incoming publish to the integration on its own task
    pub fn handle_message(integration: &Arc<Integration>, prefix: &str, topic: &str, payload: &str) {
        let Some((speaker_id, action)) = parse_action_topic(prefix, topic) else {
            tracing::debug!("Ignoring MQTT message on {}", topic);
            return;
        };
        let speaker_id = speaker_id.to_string();
        let integration = integration.clone();

        match action {
            TopicAction::Control => match serde_json::from_str::<ControlMessage>(payload) {
                Ok(msg) => {
                    let req = msg.into_request(speaker_id);
                    if let Err(e) = req.validate() {
                        tracing::warn!("Rejected MQTT control for {}: {}", req.speaker_id, e);
                        return;
                    }
                    tokio::spawn(async move {
                        integration.control_speaker(&req).await;
                    });
                }
                Err(e) => tracing::warn!("Invalid MQTT control payload on {}: {}", topic, e),
            },
            TopicAction::Play => match serde_json::from_str::<PlayMessage>(payload) {
                Ok(msg) => {
                    let req = msg.into_request(speaker_id);
                    tokio::spawn(async move {
                        integration.search_and_play(&req).await;
                    });
                }
                Err(e) => tracing::warn!("Invalid MQTT play payload on {}: {}", topic, e),
            },
        }
    }

    /// Publish event to MQTT
    async fn publish_event(client: &AsyncClient, prefix: &str, event: &BusEvent) -> Result<()> {
        let (topic, payload) = event_topic(prefix, event);
        let payload_str = serde_json::to_string(&payload)?;

        client
            .publish(&topic, QoS::AtMostOnce, false, payload_str.as_bytes())
            .await?;

        Ok(())
    }

    /// Stop MQTT connection
    pub async fn stop(&self) {
        // Cancel background tasks first
        self.shutdown.cancel();

        let mut client = self.client.write().await;
        if let Some(c) = client.take() {
            let _ = c.disconnect().await;
        }

        self.state.write().await.connected = false;

        tracing::info!("MQTT adapter stopped");
    }
}
