//! Configuration management

use anyhow::Result;
use serde::Deserialize;

use crate::search::DEFAULT_PROVIDER;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Music Assistant server; the integration stays unready without it
    #[serde(default)]
    pub music_assistant: Option<MusicAssistantConfig>,

    /// Provider every search is restricted to
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
}

fn default_port() -> u16 {
    8099
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

#[derive(Debug, Deserialize)]
pub struct MusicAssistantConfig {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: Option<String>,
}

fn default_mqtt_port() -> u16 {
    1883
}

/// Get config directory (XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> std::path::PathBuf {
    if let Ok(dir) = std::env::var("MASL_CONFIG_DIR") {
        return std::path::PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home)
                .join("Library/Application Support/ma-spotify-lovelace");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return std::path::PathBuf::from(xdg).join("ma-spotify-lovelace");
        }
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home).join(".config/ma-spotify-lovelace");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return std::path::PathBuf::from(appdata).join("ma-spotify-lovelace");
        }
    }

    // Fallback to current directory
    std::path::PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", default_port() as i64)?
        .set_default("provider", DEFAULT_PROVIDER)?
        // Load from config file if it exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // Override with environment variables (MASL_PORT, MASL_MUSIC_ASSISTANT__URL, etc.)
        .add_source(
            ::config::Environment::with_prefix("MASL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // Port precedence: MASL_PORT > PORT > config > default
    if let Ok(port) = std::env::var("MASL_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    } else if let Ok(port) = std::env::var("PORT") {
        // Add-on containers set PORT
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    }

    // MA_URL / MA_TOKEN as used by the Music Assistant add-on
    let ma_url = std::env::var("MA_URL").ok();
    if let Some(ref url) = ma_url {
        builder = builder.set_override("music_assistant.url", url.as_str())?;
    }
    if let Ok(token) = std::env::var("MA_TOKEN") {
        // A token alone must not create a server section without a url
        let has_url = ma_url.is_some()
            || builder
                .build_cloned()?
                .get_string("music_assistant.url")
                .is_ok();
        if has_url {
            builder = builder.set_override("music_assistant.token", token)?;
        } else {
            tracing::warn!("MA_TOKEN is set without a Music Assistant URL; ignoring it");
        }
    }

    let config = builder.build()?;

    Ok(config.try_deserialize()?)
}
