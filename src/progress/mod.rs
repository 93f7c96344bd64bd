use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::episode::EpisodeRef;
use crate::storage::SharedStorage;

/// Key prefix for per-episode playback position records
pub const PROGRESS_PREFIX: &str = "listen-progress:";
/// Key prefix for per-episode finished markers
pub const STATUS_PREFIX: &str = "listen-status:";

/// Persisted playback position for one episode.
///
/// Field names match the persisted JSON wire format; timestamps are Unix
/// milliseconds. A `duration` of 0.0 means the media length is not known yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub current_time: f64,
    pub duration: f64,
    pub last_updated: i64,
}

/// Persisted marker that an episode was played to its natural end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedStatus {
    pub status: String,
    pub at: i64,
}

impl FinishedStatus {
    fn now() -> Self {
        Self {
            status: "finished".to_string(),
            at: Utc::now().timestamp_millis(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }
}

fn progress_key(episode: &EpisodeRef) -> String {
    format!("{PROGRESS_PREFIX}{}", episode.identity_key())
}

fn status_key(episode: &EpisodeRef) -> String {
    format!("{STATUS_PREFIX}{}", episode.identity_key())
}

/// Tracks and persists per-episode playback progress and finished status.
///
/// Progress and status live in independent key families so a lookup or reset
/// never deserializes unrelated state. Storage faults degrade to no-op reads
/// and writes; nothing here propagates a fatal error.
#[derive(Clone)]
pub struct ProgressTracker {
    storage: SharedStorage,
}

impl ProgressTracker {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Write (or overwrite) the progress record for an episode.
    ///
    /// Values are stored as given; clamping is the playback engine's job.
    pub fn save_progress(&self, episode: &EpisodeRef, current_time: f64, duration: f64) {
        let record = ProgressRecord {
            current_time,
            duration,
            last_updated: Utc::now().timestamp_millis(),
        };

        self.write_json(&progress_key(episode), &record);
    }

    /// Load the saved progress for an episode, if any.
    ///
    /// Missing or undecodable data reads as `None`.
    pub fn load_progress(&self, episode: &EpisodeRef) -> Option<ProgressRecord> {
        self.read_json(&progress_key(episode))
    }

    /// Record that an episode played through to its natural end.
    ///
    /// Also forces an existing progress record's position to its duration so
    /// the episode reads as fully played. With no prior record only the
    /// status is written.
    pub fn mark_finished(&self, episode: &EpisodeRef) {
        self.write_json(&status_key(episode), &FinishedStatus::now());

        if let Some(mut record) = self.load_progress(episode) {
            if record.duration > 0.0 {
                record.current_time = record.duration;
            }
            record.last_updated = Utc::now().timestamp_millis();
            self.write_json(&progress_key(episode), &record);
        }
    }

    /// Load the finished marker for an episode, if any
    pub fn status(&self, episode: &EpisodeRef) -> Option<FinishedStatus> {
        self.read_json(&status_key(episode))
    }

    /// Delete every progress and status record in the store.
    ///
    /// Scans the full key space by prefix; keys outside the two families are
    /// left untouched. Global and irreversible.
    pub fn reset_all(&self) {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("reset_all: failed to enumerate storage keys: {e}");
                return;
            }
        };

        for key in keys {
            if key.starts_with(PROGRESS_PREFIX) || key.starts_with(STATUS_PREFIX) {
                if let Err(e) = self.storage.remove(&key) {
                    log::warn!("reset_all: failed to remove {key}: {e}");
                }
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to encode value for {key}: {e}");
                return;
            }
        };

        if let Err(e) = self.storage.set(key, &json) {
            log::warn!("Failed to persist {key}: {e}");
        }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        match self.storage.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .map_err(|e| log::warn!("Discarding undecodable value at {key}: {e}"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};

    fn tracker() -> (ProgressTracker, SharedStorage) {
        let storage = MemoryStorage::shared();
        (ProgressTracker::new(storage.clone()), storage)
    }

    fn episode() -> EpisodeRef {
        EpisodeRef::new("10716", 0, 2)
    }

    #[test]
    fn save_then_load_roundtrips_exactly() {
        let (tracker, _) = tracker();
        tracker.save_progress(&episode(), 42.5, 300.0);

        let record = tracker.load_progress(&episode()).unwrap();
        assert_eq!(record.current_time, 42.5);
        assert_eq!(record.duration, 300.0);
        assert!(record.last_updated > 0);
    }

    #[test]
    fn load_without_save_returns_none() {
        let (tracker, _) = tracker();
        assert!(tracker.load_progress(&episode()).is_none());
    }

    #[test]
    fn save_overwrites_previous_record() {
        let (tracker, _) = tracker();
        tracker.save_progress(&episode(), 10.0, 300.0);
        tracker.save_progress(&episode(), 3.0, 300.0);

        // Last write wins, even when the position moved backwards
        let record = tracker.load_progress(&episode()).unwrap();
        assert_eq!(record.current_time, 3.0);
    }

    #[test]
    fn records_are_keyed_per_episode() {
        let (tracker, _) = tracker();
        tracker.save_progress(&EpisodeRef::new("a", 0, 0), 10.0, 100.0);
        tracker.save_progress(&EpisodeRef::new("a", 0, 1), 20.0, 100.0);

        assert_eq!(
            tracker
                .load_progress(&EpisodeRef::new("a", 0, 0))
                .unwrap()
                .current_time,
            10.0
        );
        assert_eq!(
            tracker
                .load_progress(&EpisodeRef::new("a", 0, 1))
                .unwrap()
                .current_time,
            20.0
        );
    }

    #[test]
    fn mark_finished_writes_status() {
        let (tracker, _) = tracker();
        tracker.mark_finished(&episode());

        let status = tracker.status(&episode()).unwrap();
        assert!(status.is_finished());
        assert!(status.at > 0);
    }

    #[test]
    fn mark_finished_forces_progress_to_duration() {
        let (tracker, _) = tracker();
        tracker.save_progress(&episode(), 123.0, 300.0);
        tracker.mark_finished(&episode());

        let record = tracker.load_progress(&episode()).unwrap();
        assert_eq!(record.current_time, 300.0);
    }

    #[test]
    fn mark_finished_without_record_writes_only_status() {
        let (tracker, _) = tracker();
        tracker.mark_finished(&episode());

        assert!(tracker.status(&episode()).is_some());
        assert!(tracker.load_progress(&episode()).is_none());
    }

    #[test]
    fn status_without_finish_returns_none() {
        let (tracker, _) = tracker();
        tracker.save_progress(&episode(), 10.0, 300.0);
        assert!(tracker.status(&episode()).is_none());
    }

    #[test]
    fn reset_all_clears_both_key_families() {
        let (tracker, storage) = tracker();
        tracker.save_progress(&episode(), 10.0, 300.0);
        tracker.mark_finished(&episode());

        tracker.reset_all();

        assert!(tracker.load_progress(&episode()).is_none());
        assert!(tracker.status(&episode()).is_none());
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn reset_all_leaves_unrelated_keys_alone() {
        let (tracker, storage) = tracker();
        tracker.save_progress(&episode(), 10.0, 300.0);
        storage.set("favourites", "[]").unwrap();

        tracker.reset_all();

        assert_eq!(storage.get("favourites").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn undecodable_record_reads_as_none() {
        let (tracker, storage) = tracker();
        storage
            .set("listen-progress:10716-0-2", "{not json")
            .unwrap();

        assert!(tracker.load_progress(&episode()).is_none());
    }

    #[test]
    fn persisted_json_uses_wire_field_names() {
        let (tracker, storage) = tracker();
        tracker.save_progress(&episode(), 42.0, 300.0);

        let raw = storage.get("listen-progress:10716-0-2").unwrap().unwrap();
        assert!(raw.contains("\"currentTime\""));
        assert!(raw.contains("\"duration\""));
        assert!(raw.contains("\"lastUpdated\""));
    }
}
