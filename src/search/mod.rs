//! Search-and-play resolution
//!
//! One bounded search (10 results, one provider), first hit of the requested
//! facet, one play call shaped by the content type.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::adapters::traits::{MediaItem, MusicAssistantApi};
use crate::error::ControlError;

/// Result cap for every search, regardless of what the caller asks for
pub const SEARCH_LIMIT: u32 = 10;

/// Provider searched when none is configured
pub const DEFAULT_PROVIDER: &str = "spotify";

/// Playable content kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Track,
    Album,
    Artist,
    Playlist,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Track => "track",
            ContentType::Album => "album",
            ContentType::Artist => "artist",
            ContentType::Playlist => "playlist",
        }
    }

    /// Media kind passed to `play_media`. Tracks play by id alone.
    pub fn media_kind(&self) -> Option<&'static str> {
        match self {
            ContentType::Track => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(ContentType::Track),
            "album" => Ok(ContentType::Album),
            "artist" => Ok(ContentType::Artist),
            "playlist" => Ok(ContentType::Playlist),
            other => Err(ControlError::UnsupportedType(other.to_string())),
        }
    }
}

/// Run the bounded search and return the requested facet.
///
/// A facet missing from the response is returned as an empty list.
pub async fn search_facet(
    api: &dyn MusicAssistantApi,
    query: &str,
    content_type: &str,
    provider: &str,
) -> Result<Vec<MediaItem>, ControlError> {
    let mut results = api
        .search(query, &[content_type], SEARCH_LIMIT, &[provider])
        .await?;
    Ok(results.remove(content_type).unwrap_or_default())
}

/// Search for `query` and play the first hit on `speaker_id`.
///
/// The content type is only checked after the search has returned, so an
/// unsupported tag still costs one search round trip and never plays.
pub async fn search_and_play(
    api: &dyn MusicAssistantApi,
    query: &str,
    speaker_id: &str,
    content_type: &str,
    provider: &str,
) -> Result<(), ControlError> {
    let items = search_facet(api, query, content_type, provider).await?;

    let item = items
        .into_iter()
        .next()
        .ok_or_else(|| ControlError::NotFound(format!("No {} for query {:?}", content_type, query)))?;

    let content_type: ContentType = content_type.parse()?;

    debug!(
        speaker_id,
        item_id = %item.item_id,
        %content_type,
        "Playing first search result"
    );

    api.play_media(speaker_id, &item.item_id, content_type.media_kind())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trip_tags() {
        for tag in ["track", "album", "artist", "playlist"] {
            assert_eq!(tag.parse::<ContentType>().unwrap().as_str(), tag);
        }
    }

    #[test]
    fn test_content_type_rejects_podcast() {
        let err = "podcast".parse::<ContentType>().unwrap_err();
        assert!(matches!(err, ControlError::UnsupportedType(ref t) if t == "podcast"));
    }

    #[test]
    fn test_media_kind_omitted_for_tracks() {
        assert_eq!(ContentType::Track.media_kind(), None);
        assert_eq!(ContentType::Album.media_kind(), Some("album"));
        assert_eq!(ContentType::Artist.media_kind(), Some("artist"));
        assert_eq!(ContentType::Playlist.media_kind(), Some("playlist"));
    }

    #[test]
    fn test_default_is_track() {
        assert_eq!(ContentType::default(), ContentType::Track);
    }
}
