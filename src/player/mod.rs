// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod resume;

pub use resume::{ResumeAction, resume_action};

use crate::episode::EpisodeRef;
use crate::error::PlaybackError;
use crate::progress::ProgressTracker;

/// Abstraction over the platform's media primitive (an HTML audio element,
/// a native player process, or a mock in tests).
///
/// The handle itself does no progress tracking and holds no episode
/// identity; [`Player`] is its sole owner and sole writer.
pub trait AudioHandle: Send {
    /// Bind a new source URL, discarding the previous one
    fn set_source(&mut self, src: &str);

    /// The currently bound source URL, if any
    fn source(&self) -> Option<String>;

    /// Start playback. May be rejected (autoplay policy, broken source).
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Stop playback. Always succeeds.
    fn pause(&mut self);

    /// Move the playback position, in seconds
    fn set_position(&mut self, seconds: f64);

    /// Current playback position, in seconds
    fn position(&self) -> f64;

    /// Media duration in seconds, once metadata has loaded
    fn duration(&self) -> Option<f64>;

    /// Set the output volume, `0.0..=1.0`
    fn set_volume(&mut self, volume: f64);
}

/// Events the platform adapter feeds back into the engine as the media
/// element reports them.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Media metadata became available
    MetadataLoaded { duration: f64 },
    /// The playback position advanced (or was moved)
    TimeUpdate { position: f64 },
    /// Playback reached the natural end of the media
    Ended,
}

/// Playback engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No source has been loaded yet
    Empty,
    /// A source is loaded but not playing
    Paused,
    /// A source is loaded and playing
    Playing,
}

/// Snapshot of the single in-memory playback session. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub audio_src: String,
    pub title: Option<String>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub episode: Option<EpisodeRef>,
}

/// The playback engine: a state machine over the one shared audio handle.
///
/// Owns the handle exclusively, so the single-writer invariant is enforced
/// by the interface rather than by convention. While an episode is bound,
/// every [`MediaEvent::TimeUpdate`] forwards the position to the progress
/// tracker, and the natural end of the media marks the episode finished.
///
/// Every operation is recoverable: a rejected play, a seek before metadata,
/// or a missing source log a warning and leave the state unchanged.
pub struct Player {
    handle: Box<dyn AudioHandle>,
    tracker: ProgressTracker,
    state: PlayerState,
    title: Option<String>,
    episode: Option<EpisodeRef>,
    current_time: f64,
    duration: Option<f64>,
    /// One-shot seek target waiting for metadata. Cleared by the load that
    /// installed it being superseded, so it can never fire against a newer
    /// source.
    pending_seek: Option<f64>,
}

impl Player {
    pub fn new(handle: Box<dyn AudioHandle>, tracker: ProgressTracker) -> Self {
        Self {
            handle,
            tracker,
            state: PlayerState::Empty,
            title: None,
            episode: None,
            current_time: 0.0,
            duration: None,
            pending_seek: None,
        }
    }

    /// Load an episode's audio into the handle.
    ///
    /// The source is rebound only if it differs from the current one, so
    /// re-loading the same episode keeps an in-flight fetch and the current
    /// position. `episode` becomes the target of subsequent progress writes.
    /// With `start_at > 0` the position is moved once the duration is known
    /// (immediately if it already is), clamped to `[0, duration]`.
    pub fn load(
        &mut self,
        src: &str,
        episode: EpisodeRef,
        title: Option<&str>,
        start_at: f64,
    ) {
        if src.is_empty() {
            log::warn!("Ignoring load with empty audio source for {episode}");
            return;
        }

        let changed = self.handle.source().as_deref() != Some(src);
        if changed {
            self.handle.set_source(src);
            self.current_time = 0.0;
            self.duration = self.handle.duration();
            if self.state == PlayerState::Playing {
                self.state = PlayerState::Paused;
            }
        } else if let Some(duration) = self.handle.duration() {
            // Refresh from the handle but keep what an earlier metadata
            // event already told us.
            self.duration = Some(duration);
        }

        if title.is_some() {
            self.title = title.map(String::from);
        }
        self.episode = Some(episode);

        // Drop any seek still waiting on the previous load before
        // installing our own.
        self.pending_seek = None;
        if start_at > 0.0 {
            match self.duration {
                Some(duration) => self.apply_seek(start_at, duration),
                None => self.pending_seek = Some(start_at),
            }
        }

        if self.state == PlayerState::Empty {
            self.state = PlayerState::Paused;
        }
    }

    /// Attempt to start playback.
    ///
    /// A rejection (autoplay policy or similar) is logged as a warning and
    /// leaves the engine paused; it is never surfaced as an error.
    pub fn play(&mut self) {
        if self.state == PlayerState::Empty {
            log::warn!("play() called with no source loaded");
            return;
        }

        match self.handle.play() {
            Ok(()) => self.state = PlayerState::Playing,
            Err(e) => {
                log::warn!("Audio play blocked: {e}");
                self.state = PlayerState::Paused;
            }
        }
    }

    /// Stop playback. Always succeeds synchronously.
    pub fn pause(&mut self) {
        if self.state == PlayerState::Empty {
            return;
        }
        self.handle.pause();
        self.state = PlayerState::Paused;
    }

    /// Dispatch to [`play`](Self::play) or [`pause`](Self::pause) based on
    /// the current state
    pub fn toggle_play(&mut self) {
        if self.state == PlayerState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move the playback position.
    ///
    /// Clamped to `[0, duration]` when the duration is known; otherwise the
    /// target is accepted as-is, floored at zero. Play/pause state is not
    /// affected.
    pub fn seek(&mut self, time: f64) {
        match self.duration {
            Some(duration) => self.apply_seek(time, duration),
            None => {
                let target = time.max(0.0);
                self.handle.set_position(target);
                self.current_time = target;
            }
        }
    }

    /// Set the output volume, clamped to `0.0..=1.0`
    pub fn set_volume(&mut self, volume: f64) {
        self.handle.set_volume(volume.clamp(0.0, 1.0));
    }

    /// Convenience composition of [`load`](Self::load) followed by
    /// [`play`](Self::play). Callers wanting resume-prompt semantics decide
    /// `start_at` first via [`resume_action`].
    pub fn play_episode(
        &mut self,
        episode: EpisodeRef,
        audio_url: &str,
        title: Option<&str>,
        start_at: f64,
    ) {
        self.load(audio_url, episode, title, start_at);
        self.play();
    }

    /// Feed a platform media event into the engine
    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MetadataLoaded { duration } => {
                self.duration = Some(duration);
                if let Some(target) = self.pending_seek.take() {
                    self.apply_seek(target, duration);
                }
            }
            MediaEvent::TimeUpdate { position } => {
                self.current_time = position;
                if let Some(episode) = &self.episode {
                    log::debug!("progress tick {episode}: {position:.1}s");
                    self.tracker
                        .save_progress(episode, position, self.duration.unwrap_or(0.0));
                }
            }
            MediaEvent::Ended => {
                if self.state != PlayerState::Empty {
                    self.state = PlayerState::Paused;
                }
                if let Some(episode) = &self.episode {
                    self.tracker.mark_finished(episode);
                }
            }
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Snapshot of the in-memory playback session
    pub fn session(&self) -> PlaybackSession {
        PlaybackSession {
            audio_src: self.handle.source().unwrap_or_default(),
            title: self.title.clone(),
            is_playing: self.is_playing(),
            current_time: self.current_time,
            duration: self.duration,
            episode: self.episode.clone(),
        }
    }

    fn apply_seek(&mut self, time: f64, duration: f64) {
        let target = time.clamp(0.0, duration);
        self.handle.set_position(target);
        self.current_time = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressTracker;
    use crate::storage::{MemoryStorage, SharedStorage};
    use std::sync::{Arc, Mutex};

    /// Mock platform handle with shared interior state so tests can poke at
    /// it (deliver metadata, reject play) after the player takes ownership.
    #[derive(Default)]
    struct MockState {
        source: Option<String>,
        position: f64,
        duration: Option<f64>,
        playing: bool,
        volume: f64,
        reject_play: bool,
        source_binds: usize,
    }

    #[derive(Clone, Default)]
    struct MockHandle(Arc<Mutex<MockState>>);

    impl MockHandle {
        fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
            self.0.lock().unwrap()
        }
    }

    impl AudioHandle for MockHandle {
        fn set_source(&mut self, src: &str) {
            let mut state = self.state();
            state.source = Some(src.to_string());
            state.position = 0.0;
            state.duration = None;
            state.playing = false;
            state.source_binds += 1;
        }

        fn source(&self) -> Option<String> {
            self.state().source.clone()
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            let mut state = self.state();
            if state.reject_play {
                return Err(PlaybackError::StartRejected {
                    reason: "autoplay policy".to_string(),
                });
            }
            state.playing = true;
            Ok(())
        }

        fn pause(&mut self) {
            self.state().playing = false;
        }

        fn set_position(&mut self, seconds: f64) {
            self.state().position = seconds;
        }

        fn position(&self) -> f64 {
            self.state().position
        }

        fn duration(&self) -> Option<f64> {
            self.state().duration
        }

        fn set_volume(&mut self, volume: f64) {
            self.state().volume = volume;
        }
    }

    fn player() -> (Player, MockHandle, SharedStorage) {
        let storage = MemoryStorage::shared();
        let handle = MockHandle::default();
        let player = Player::new(
            Box::new(handle.clone()),
            ProgressTracker::new(storage.clone()),
        );
        (player, handle, storage)
    }

    fn episode() -> EpisodeRef {
        EpisodeRef::new("10716", 0, 2)
    }

    const SRC_A: &str = "https://example.com/a.mp3";
    const SRC_B: &str = "https://example.com/b.mp3";

    #[test]
    fn starts_empty() {
        let (player, _, _) = player();
        assert_eq!(player.state(), PlayerState::Empty);
        assert!(!player.is_playing());
    }

    #[test]
    fn load_transitions_to_paused() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), Some("Episode 3"), 0.0);

        assert_eq!(player.state(), PlayerState::Paused);
        assert_eq!(handle.source().as_deref(), Some(SRC_A));
        assert_eq!(player.session().title.as_deref(), Some("Episode 3"));
    }

    #[test]
    fn load_with_empty_source_is_ignored() {
        let (mut player, _, _) = player();
        player.load("", episode(), None, 0.0);
        assert_eq!(player.state(), PlayerState::Empty);
    }

    #[test]
    fn reloading_same_source_keeps_position() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.handle_event(MediaEvent::TimeUpdate { position: 37.0 });

        player.load(SRC_A, episode(), None, 0.0);

        assert_eq!(player.current_time(), 37.0);
        assert_eq!(handle.state().source_binds, 1);
    }

    #[test]
    fn loading_different_source_resets_position() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.handle_event(MediaEvent::TimeUpdate { position: 37.0 });

        player.load(SRC_B, EpisodeRef::new("10716", 0, 3), None, 0.0);

        assert_eq!(player.current_time(), 0.0);
        assert_eq!(handle.state().source_binds, 2);
    }

    #[test]
    fn play_starts_playback() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.play();

        assert!(player.is_playing());
        assert!(handle.state().playing);
    }

    #[test]
    fn play_without_source_stays_empty() {
        let (mut player, _, _) = player();
        player.play();
        assert_eq!(player.state(), PlayerState::Empty);
    }

    #[test]
    fn rejected_play_stays_paused() {
        let (mut player, handle, _) = player();
        handle.state().reject_play = true;

        player.load(SRC_A, episode(), None, 0.0);
        player.play();

        assert_eq!(player.state(), PlayerState::Paused);
        assert!(!handle.state().playing);
    }

    #[test]
    fn pause_always_succeeds() {
        let (mut player, _, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.play();
        player.pause();

        assert_eq!(player.state(), PlayerState::Paused);
    }

    #[test]
    fn toggle_play_alternates() {
        let (mut player, _, _) = player();
        player.load(SRC_A, episode(), None, 0.0);

        player.toggle_play();
        assert!(player.is_playing());
        player.toggle_play();
        assert!(!player.is_playing());
    }

    #[test]
    fn seek_clamps_to_duration() {
        let (mut player, _, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.handle_event(MediaEvent::MetadataLoaded { duration: 100.0 });

        player.seek(-5.0);
        assert_eq!(player.current_time(), 0.0);

        player.seek(500.0);
        assert_eq!(player.current_time(), 100.0);
    }

    #[test]
    fn seek_before_metadata_accepts_positive_target() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 0.0);

        player.seek(250.0);
        assert_eq!(player.current_time(), 250.0);
        assert_eq!(handle.position(), 250.0);

        player.seek(-9.0);
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn seek_does_not_change_play_state() {
        let (mut player, _, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.play();
        player.handle_event(MediaEvent::MetadataLoaded { duration: 100.0 });

        player.seek(50.0);
        assert!(player.is_playing());
    }

    #[test]
    fn volume_is_clamped() {
        let (mut player, handle, _) = player();
        player.set_volume(1.8);
        assert_eq!(handle.state().volume, 1.0);
        player.set_volume(-0.2);
        assert_eq!(handle.state().volume, 0.0);
    }

    #[test]
    fn start_at_seeks_immediately_when_metadata_known() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 0.0);
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });

        // Same source again, metadata already loaded
        player.load(SRC_A, episode(), None, 42.0);
        assert_eq!(player.current_time(), 42.0);
        assert_eq!(handle.position(), 42.0);
    }

    #[test]
    fn start_at_defers_until_metadata_then_clamps() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 42.0);
        assert_eq!(handle.position(), 0.0);

        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        assert_eq!(player.current_time(), 42.0);
        assert_eq!(handle.position(), 42.0);
    }

    #[test]
    fn deferred_seek_is_clamped_to_short_duration() {
        let (mut player, _, _) = player();
        player.load(SRC_A, episode(), None, 500.0);
        player.handle_event(MediaEvent::MetadataLoaded { duration: 100.0 });
        assert_eq!(player.current_time(), 100.0);
    }

    #[test]
    fn superseding_load_cancels_pending_seek() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 42.0);
        player.load(SRC_B, EpisodeRef::new("10716", 0, 3), None, 0.0);

        // Metadata for the second source arrives; the stale seek must not fire
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(handle.position(), 0.0);
    }

    #[test]
    fn pending_seek_fires_only_once() {
        let (mut player, handle, _) = player();
        player.load(SRC_A, episode(), None, 42.0);
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });

        handle.0.lock().unwrap().position = 60.0;
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        assert_eq!(handle.position(), 60.0);
    }

    #[test]
    fn time_updates_forward_progress_to_tracker() {
        let (mut player, _, storage) = player();
        let tracker = ProgressTracker::new(storage);

        player.load(SRC_A, episode(), None, 0.0);
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        player.handle_event(MediaEvent::TimeUpdate { position: 12.5 });

        let record = tracker.load_progress(&episode()).unwrap();
        assert_eq!(record.current_time, 12.5);
        assert_eq!(record.duration, 300.0);
    }

    #[test]
    fn time_updates_without_bound_episode_do_not_persist() {
        let (mut player, _, storage) = player();
        player.handle_event(MediaEvent::TimeUpdate { position: 12.5 });

        use crate::storage::Storage;
        assert!(storage.keys().unwrap().is_empty());
        assert_eq!(player.current_time(), 12.5);
    }

    #[test]
    fn natural_end_marks_finished_and_pauses() {
        let (mut player, _, storage) = player();
        let tracker = ProgressTracker::new(storage);

        player.play_episode(episode(), SRC_A, Some("Episode 3"), 0.0);
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        player.handle_event(MediaEvent::TimeUpdate { position: 300.0 });
        player.handle_event(MediaEvent::Ended);

        assert_eq!(player.state(), PlayerState::Paused);
        assert!(tracker.status(&episode()).unwrap().is_finished());
        assert_eq!(
            tracker.load_progress(&episode()).unwrap().current_time,
            300.0
        );
    }

    #[test]
    fn resume_scenario_end_to_end() {
        let (mut player, _, storage) = player();
        let tracker = ProgressTracker::new(storage);

        // Start at 42 with duration resolving to 300 asynchronously
        player.play_episode(episode(), SRC_A, None, 42.0);
        assert!(player.is_playing());

        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        assert_eq!(player.current_time(), 42.0);

        // Play through to the natural end
        player.handle_event(MediaEvent::TimeUpdate { position: 300.0 });
        player.handle_event(MediaEvent::Ended);

        assert!(tracker.status(&episode()).unwrap().is_finished());
        assert_eq!(
            tracker.load_progress(&episode()).unwrap().current_time,
            300.0
        );
    }

    #[test]
    fn session_reflects_engine_state() {
        let (mut player, _, _) = player();
        player.load(SRC_A, episode(), Some("Episode 3"), 0.0);
        player.play();
        player.handle_event(MediaEvent::MetadataLoaded { duration: 300.0 });
        player.handle_event(MediaEvent::TimeUpdate { position: 12.0 });

        let session = player.session();
        assert_eq!(session.audio_src, SRC_A);
        assert_eq!(session.title.as_deref(), Some("Episode 3"));
        assert!(session.is_playing);
        assert_eq!(session.current_time, 12.0);
        assert_eq!(session.duration, Some(300.0));
        assert_eq!(session.episode, Some(episode()));
    }

    #[test]
    fn loading_new_source_while_playing_pauses() {
        let (mut player, _, _) = player();
        player.play_episode(episode(), SRC_A, None, 0.0);
        assert!(player.is_playing());

        player.load(SRC_B, EpisodeRef::new("10716", 0, 3), None, 0.0);
        assert_eq!(player.state(), PlayerState::Paused);
    }
}
