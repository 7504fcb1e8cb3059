use std::time::Duration;

pub const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";
pub const UPDATE_COMPLETE_STATUS: &str = "UPDATE_COMPLETE";
pub const UPDATE_FAILURE_STATUSES: [&str; 3] = [
    "UPDATE_FAILED",
    "UPDATE_ROLLBACK_FAILED",
    "UPDATE_ROLLBACK_COMPLETE",
];
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// Whether an `UpdateStack` call started an update or was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Started,
    NoChanges,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitProgress {
    Complete,
    Pending,
    Failed { status: String, reason: Option<String> },
}

pub fn is_no_updates_message(message: &str) -> bool {
    message == NO_UPDATES_MESSAGE
}

/// Classifies one poll of the stack status while waiting on an update.
pub fn classify_update_status(
    status: &str,
    status_reason: Option<&str>,
    outcome: UpdateOutcome,
) -> WaitProgress {
    if status == UPDATE_COMPLETE_STATUS {
        return WaitProgress::Complete;
    }
    if UPDATE_FAILURE_STATUSES.contains(&status) {
        return WaitProgress::Failed {
            status: status.to_string(),
            reason: status_reason.map(str::to_string),
        };
    }
    if status.ends_with("_IN_PROGRESS") {
        return WaitProgress::Pending;
    }
    match outcome {
        UpdateOutcome::Started => WaitProgress::Pending,
        // The stack was left as it was, so whatever stable state it is in is final.
        UpdateOutcome::NoChanges => WaitProgress::Complete,
    }
}
