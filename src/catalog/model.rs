// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::episode::EpisodeRef;

/// A show in the podcast catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

/// One season of a show
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    /// Season number as displayed (1-based)
    pub season: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// One episode as delivered by the catalog provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Audio file URL. Providers vary between `file` and `audio` as the
    /// field name; both are accepted.
    #[serde(default, alias = "audio", skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl Episode {
    /// The playable audio URL, if the provider supplied one
    pub fn audio_url(&self) -> Option<&str> {
        self.file.as_deref().filter(|url| !url.is_empty())
    }
}

impl Podcast {
    /// Build an [`EpisodeRef`] for the episode at the given indexes
    pub fn episode_ref(&self, season_index: u32, episode_index: u32) -> EpisodeRef {
        EpisodeRef::new(self.id.clone(), season_index, episode_index)
    }
}

/// Resolve an [`EpisodeRef`] against the catalog
pub fn find_episode<'a>(
    podcasts: &'a [Podcast],
    episode: &EpisodeRef,
) -> Option<(&'a Podcast, &'a Season, &'a Episode)> {
    let podcast = podcasts.iter().find(|p| p.id == episode.podcast_id)?;
    let season = podcast.seasons.get(episode.season_index as usize)?;
    let ep = season.episodes.get(episode.episode_index as usize)?;
    Some((podcast, season, ep))
}

/// Case-insensitive title/genre filter over the catalog
pub fn filter_podcasts<'a>(podcasts: &'a [Podcast], query: &str) -> Vec<&'a Podcast> {
    let query = query.to_lowercase();
    podcasts
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&query)
                || p.genres.iter().any(|g| g.to_lowercase() == query)
        })
        .collect()
}
