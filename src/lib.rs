//! Music Assistant Spotify Lovelace
//!
//! A bridge between Home Assistant and Music Assistant.
//!
//! This library provides:
//! - Speaker transport and volume control (`control_speaker`)
//! - Spotify search-and-play on a speaker (`play_spotify`)
//! - A dashboard card and sidebar panel registration
//! - MQTT integration for Home Assistant automations
//! - Server-Sent Events for action results

pub mod adapters;
pub mod api;
pub mod bus;
pub mod config;
pub mod control;
pub mod error;
pub mod frontend;
pub mod integration;
pub mod search;
pub mod services;
