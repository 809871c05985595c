//! Speaker command dispatch
//!
//! Maps `(speaker_id, command, value)` onto one Music Assistant player call.
//! The command tag is parsed into [`SpeakerCommand`] before anything is sent,
//! so an unknown tag never reaches the server.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::adapters::traits::MusicAssistantApi;
use crate::error::ControlError;
use crate::services::ServiceValue;

/// Relative volume step for `volume_up` / `volume_down`
pub const VOLUME_STEP: f64 = 0.1;

/// The eight speaker commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerCommand {
    Play,
    Pause,
    Stop,
    VolumeSet,
    VolumeUp,
    VolumeDown,
    NextTrack,
    PreviousTrack,
}

impl SpeakerCommand {
    pub const ALL: [SpeakerCommand; 8] = [
        SpeakerCommand::Play,
        SpeakerCommand::Pause,
        SpeakerCommand::Stop,
        SpeakerCommand::VolumeSet,
        SpeakerCommand::VolumeUp,
        SpeakerCommand::VolumeDown,
        SpeakerCommand::NextTrack,
        SpeakerCommand::PreviousTrack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerCommand::Play => "play",
            SpeakerCommand::Pause => "pause",
            SpeakerCommand::Stop => "stop",
            SpeakerCommand::VolumeSet => "volume_set",
            SpeakerCommand::VolumeUp => "volume_up",
            SpeakerCommand::VolumeDown => "volume_down",
            SpeakerCommand::NextTrack => "next_track",
            SpeakerCommand::PreviousTrack => "previous_track",
        }
    }
}

impl fmt::Display for SpeakerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeakerCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpeakerCommand::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ControlError::UnknownCommand(s.to_string()))
    }
}

/// Apply a relative step to a volume fraction, clamped to [0.0, 1.0]
pub fn step_volume(current: f64, delta: f64) -> f64 {
    (current + delta).clamp(0.0, 1.0)
}

/// Coerce the optional service value into a volume fraction
fn volume_value(value: Option<&ServiceValue>) -> Result<f64, ControlError> {
    let value = value.ok_or(ControlError::InvalidValue {
        command: "volume_set",
        reason: "value is required".to_string(),
    })?;
    value.as_f64().ok_or_else(|| ControlError::InvalidValue {
        command: "volume_set",
        reason: format!("{} is not a number", value),
    })
}

/// Run one speaker command against Music Assistant.
///
/// Exactly one mutating call is made on success; the relative volume
/// commands read the player's current level from the lookup first.
pub async fn control_speaker(
    api: &dyn MusicAssistantApi,
    speaker_id: &str,
    command: &str,
    value: Option<&ServiceValue>,
) -> Result<(), ControlError> {
    let command: SpeakerCommand = command.parse()?;

    let player = api
        .get_player(speaker_id)
        .await?
        .ok_or_else(|| ControlError::NotFound(format!("Speaker {}", speaker_id)))?;

    debug!(speaker_id, %command, ?value, "Dispatching speaker command");

    match command {
        SpeakerCommand::Play => api.player_play(speaker_id).await?,
        SpeakerCommand::Pause => api.player_pause(speaker_id).await?,
        SpeakerCommand::Stop => api.player_stop(speaker_id).await?,
        SpeakerCommand::NextTrack => api.player_next(speaker_id).await?,
        SpeakerCommand::PreviousTrack => api.player_previous(speaker_id).await?,
        SpeakerCommand::VolumeSet => {
            let volume = volume_value(value)?;
            api.player_volume_set(speaker_id, volume).await?
        }
        SpeakerCommand::VolumeUp => {
            let volume = step_volume(player.volume_level, VOLUME_STEP);
            api.player_volume_set(speaker_id, volume).await?
        }
        SpeakerCommand::VolumeDown => {
            let volume = step_volume(player.volume_level, -VOLUME_STEP);
            api.player_volume_set(speaker_id, volume).await?
        }
    }

    Ok(())
}
