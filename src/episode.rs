use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one episode within the catalog: a podcast id plus zero-based
/// season and episode indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub podcast_id: String,
    pub season_index: u32,
    pub episode_index: u32,
}

impl EpisodeRef {
    pub fn new(podcast_id: impl Into<String>, season_index: u32, episode_index: u32) -> Self {
        Self {
            podcast_id: podcast_id.into(),
            season_index,
            episode_index,
        }
    }

    /// Deterministic identity key used for storage lookups and favourite ids.
    ///
    /// Injective because the indexes are numeric and the podcast id leads:
    /// `{podcastId}-{seasonIndex}-{episodeIndex}`.
    pub fn identity_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.podcast_id, self.season_index, self.episode_index
        )
    }
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity_key())
    }
}
