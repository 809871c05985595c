//! Music Assistant client and Home Assistant integrations (MQTT)

pub mod music_assistant;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod traits;
