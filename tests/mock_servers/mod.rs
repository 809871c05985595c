//! Mock servers for adapter integration testing
//!
//! These mock servers simulate the Music Assistant server so the HTTP client
//! and the full action path can be tested without a real installation.

pub mod music_assistant;

pub use music_assistant::MockMusicAssistant;
