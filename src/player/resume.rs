use crate::progress::ProgressRecord;

/// Minimum saved position, in seconds, before a resume prompt is worth showing
const RESUME_THRESHOLD_SECS: f64 = 5.0;

/// A position within this many seconds of the recorded duration counts as
/// effectively finished; restart instead of resuming.
const NEAR_END_SECS: f64 = 3.0;

/// What a caller should do before starting an episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeAction {
    /// Ask the user whether to resume from the saved position or restart
    Prompt { resume_at: f64 },
    /// No meaningful saved position; start from zero without asking
    FromStart,
}

/// Resume-prompt policy, applied by callers before
/// [`Player::play_episode`](crate::player::Player::play_episode).
///
/// Prompts only when more than 5 seconds are saved and the position is not
/// within 3 seconds of the recorded duration. The engine itself stays
/// policy-free and only exposes `start_at`.
pub fn resume_action(progress: Option<&ProgressRecord>) -> ResumeAction {
    let Some(record) = progress else {
        return ResumeAction::FromStart;
    };

    if record.current_time <= RESUME_THRESHOLD_SECS {
        return ResumeAction::FromStart;
    }

    let effectively_finished =
        record.duration > 0.0 && record.duration - record.current_time <= NEAR_END_SECS;
    if effectively_finished {
        return ResumeAction::FromStart;
    }

    ResumeAction::Prompt {
        resume_at: record.current_time,
    }
}
