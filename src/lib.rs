pub mod catalog;
pub mod episode;
pub mod error;
pub mod favourites;
pub mod http;
pub mod notify;
pub mod player;
pub mod progress;
pub mod storage;

// Re-export main types for convenience
pub use catalog::{Podcast, Season, fetch_catalog, find_episode, parse_catalog};
pub use episode::EpisodeRef;
pub use error::{CatalogError, PlaybackError, StorageError};
pub use favourites::{FavouriteMeta, FavouriteRecord, FavouritesStore, UndoAction};
pub use http::{HttpClient, ReqwestClient};
pub use notify::{NoopNotifier, NotificationKind, Notifier, SharedNotifier};
pub use player::{
    AudioHandle, MediaEvent, PlaybackSession, Player, PlayerState, ResumeAction, resume_action,
};
pub use progress::{FinishedStatus, ProgressRecord, ProgressTracker};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, Storage};
