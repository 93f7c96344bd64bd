use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::episode::EpisodeRef;
use crate::notify::{NotificationKind, SharedNotifier};
use crate::storage::SharedStorage;

/// Storage key holding the serialized favourites collection
pub const FAVOURITES_KEY: &str = "favourites";

/// A favourited episode with the display metadata needed to render it
/// without the catalog at hand.
///
/// Field names match the persisted JSON wire format. `id` is the episode's
/// identity key; the collection never holds two records with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteRecord {
    pub podcast_id: String,
    pub season_index: u32,
    pub episode_index: u32,
    pub podcast_title: String,
    pub episode_title: String,
    pub season_number: u32,
    pub image: String,
    pub audio_url: String,
    pub id: String,
    pub added_at: i64,
}

impl FavouriteRecord {
    pub fn episode(&self) -> EpisodeRef {
        EpisodeRef::new(self.podcast_id.clone(), self.season_index, self.episode_index)
    }
}

/// Input to [`FavouritesStore::toggle`]: everything a favourite carries
/// except the derived `id` and the `addedAt` stamp.
#[derive(Debug, Clone)]
pub struct FavouriteMeta {
    pub episode: EpisodeRef,
    pub podcast_title: String,
    pub episode_title: String,
    pub season_number: u32,
    pub image: String,
    pub audio_url: String,
}

impl FavouriteMeta {
    fn into_record(self) -> FavouriteRecord {
        let id = self.episode.identity_key();
        FavouriteRecord {
            podcast_id: self.episode.podcast_id,
            season_index: self.episode.season_index,
            episode_index: self.episode.episode_index,
            podcast_title: self.podcast_title,
            episode_title: self.episode_title,
            season_number: self.season_number,
            image: self.image,
            audio_url: self.audio_url,
            id,
            added_at: Utc::now().timestamp_millis(),
        }
    }
}

/// The inverse of a toggle, attached to its notification.
///
/// Applied through [`FavouritesStore::apply_undo`] against the collection as
/// it stands at invocation time, never against a snapshot taken when the
/// toggle ran. Toggles of other episodes in between are therefore preserved.
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// Re-insert a removed favourite (undo of a removal)
    Insert { record: FavouriteRecord },
    /// Remove an added favourite again (undo of an addition)
    Remove { id: String },
}

/// In-memory favourites collection with cross-session persistence.
///
/// Every mutation is serialized in full under the [`FAVOURITES_KEY`] key.
/// Persistence is armed only once [`hydrate`](Self::hydrate) has restored the
/// previously stored collection; before that a persist is a guarded no-op, so
/// a transiently empty store can never overwrite real data.
pub struct FavouritesStore {
    storage: SharedStorage,
    notifier: SharedNotifier,
    records: Vec<FavouriteRecord>,
    ids: HashSet<String>,
    hydrated: bool,
}

impl FavouritesStore {
    /// Create an empty, not-yet-hydrated store. Call
    /// [`hydrate`](Self::hydrate) before mutating it.
    pub fn new(storage: SharedStorage, notifier: SharedNotifier) -> Self {
        Self {
            storage,
            notifier,
            records: Vec::new(),
            ids: HashSet::new(),
            hydrated: false,
        }
    }

    /// Create a store and immediately restore it from persistence
    pub fn restore(storage: SharedStorage, notifier: SharedNotifier) -> Self {
        let mut store = Self::new(storage, notifier);
        store.hydrate();
        store
    }

    /// Restore the collection from storage and arm persistence.
    ///
    /// An absent or malformed value initializes an empty collection.
    pub fn hydrate(&mut self) {
        let records: Vec<FavouriteRecord> = match self.storage.get(FAVOURITES_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed favourites collection: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to restore favourites: {e}");
                Vec::new()
            }
        };

        self.ids = records.iter().map(|r| r.id.clone()).collect();
        self.records = records;
        self.hydrated = true;
    }

    /// O(1) membership test
    pub fn is_favourited(&self, episode: &EpisodeRef) -> bool {
        self.ids.contains(&episode.identity_key())
    }

    /// The current collection, oldest addition first
    pub fn favourites(&self) -> &[FavouriteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add the episode to the favourites, or remove it if already present.
    ///
    /// Either way the change is persisted immediately and a notification is
    /// raised carrying the inverse operation as its undo.
    pub fn toggle(&mut self, meta: FavouriteMeta) {
        let id = meta.episode.identity_key();

        if self.ids.contains(&id) {
            let removed = self.remove_record(&id);
            self.persist();

            if let Some(record) = removed {
                let message = format!("Removed \"{}\"", record.episode_title);
                self.notifier.notify(
                    &message,
                    NotificationKind::Removed,
                    Some(UndoAction::Insert { record }),
                );
            }
            return;
        }

        let record = meta.into_record();
        let message = format!("Added \"{}\"", record.episode_title);

        self.ids.insert(record.id.clone());
        self.records.push(record);
        self.persist();

        self.notifier.notify(
            &message,
            NotificationKind::Added,
            Some(UndoAction::Remove { id }),
        );
    }

    /// Apply the inverse of an earlier toggle.
    ///
    /// Recomputes against the live collection: a re-insert is skipped when
    /// the id is already back, a removal when it is already gone. No
    /// notification is raised for the undo itself.
    pub fn apply_undo(&mut self, action: UndoAction) {
        match action {
            UndoAction::Insert { record } => {
                if self.ids.contains(&record.id) {
                    return;
                }
                self.ids.insert(record.id.clone());
                self.records.push(record);
                self.persist();
            }
            UndoAction::Remove { id } => {
                if self.remove_record(&id).is_some() {
                    self.persist();
                }
            }
        }
    }

    fn remove_record(&mut self, id: &str) -> Option<FavouriteRecord> {
        self.ids.remove(id);
        let position = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(position))
    }

    fn persist(&self) {
        if !self.hydrated {
            return;
        }

        let json = match serde_json::to_string(&self.records) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to encode favourites: {e}");
                return;
            }
        };

        if let Err(e) = self.storage.set(FAVOURITES_KEY, &json) {
            log::warn!("Failed to persist favourites: {e}");
        }
    }
}
