//! Dashboard card assets and sidebar panel registration.
//!
//! The card is compiled into the binary with rust-embed and served under
//! `/static/community/ma_spotify_lovelace/`.

use rust_embed::RustEmbed;
use serde::Serialize;

use crate::services::DOMAIN;

/// File name of the card module
pub const CARD_FILE: &str = "ma-spotify-card.js";

#[derive(RustEmbed)]
#[folder = "lovelace/"]
struct CardAssets;

/// URL prefix the card assets are served under
pub fn static_path() -> String {
    format!("/static/community/{}", DOMAIN)
}

/// URL of the card's JS module
pub fn card_module_url() -> String {
    format!("{}/{}", static_path(), CARD_FILE)
}

/// An embedded asset ready to serve
pub struct Asset {
    pub mime: String,
    pub body: Vec<u8>,
}

/// Look up an embedded asset by path relative to the static root
pub fn get_asset(path: &str) -> Option<Asset> {
    let path = path.trim_start_matches('/');
    let file = CardAssets::get(path)?;
    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Some(Asset {
        mime,
        body: file.data.into_owned(),
    })
}

/// Sidebar panel registration for the host dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelRegistration {
    pub component_name: &'static str,
    pub sidebar_title: &'static str,
    pub sidebar_icon: &'static str,
    pub frontend_url_path: &'static str,
    pub require_admin: bool,
    pub config: PanelConfig,
    /// Extra JS module the dashboard must load
    pub module_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelConfig {
    pub mode: &'static str,
}

pub fn panel_registration() -> PanelRegistration {
    PanelRegistration {
        component_name: "lovelace",
        sidebar_title: "Music Assistant Spotify",
        sidebar_icon: "mdi:spotify",
        frontend_url_path: "ma-spotify",
        require_admin: false,
        config: PanelConfig { mode: "storage" },
        module_url: card_module_url(),
    }
}
