//! Status badge and cell indicator mapping

use crate::models::TaskStatus;

/// Styling family of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Neutral,
    Error,
}

/// Rendered form of a task status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub tone: Tone,
    pub animated: bool,
}

impl Badge {
    fn new(label: impl Into<String>, tone: Tone, animated: bool) -> Self {
        Self {
            label: label.into(),
            tone,
            animated,
        }
    }
}

/// Badge for a task status
///
/// Unrecognised statuses, `failed` and `error` show the raw string.
pub fn status_badge(status: &TaskStatus) -> Badge {
    match status {
        TaskStatus::Completed => Badge::new("Finished", Tone::Success, false),
        TaskStatus::Running => Badge::new("Running", Tone::Info, true),
        TaskStatus::Pending => Badge::new("Pending", Tone::Neutral, false),
        other => Badge::new(other.as_str(), Tone::Error, false),
    }
}

/// Per-cell status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellIndicator {
    Solid,
    Animated,
    Alert,
    Dot,
}

pub fn cell_indicator(status: &str) -> CellIndicator {
    match status {
        "success" => CellIndicator::Solid,
        "running" => CellIndicator::Animated,
        "error" => CellIndicator::Alert,
        _ => CellIndicator::Dot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_badges() {
        let finished = status_badge(&TaskStatus::Completed);
        assert_eq!(finished.label, "Finished");
        assert_eq!(finished.tone, Tone::Success);
        assert!(!finished.animated);

        let running = status_badge(&TaskStatus::Running);
        assert_eq!(running.label, "Running");
        assert_eq!(running.tone, Tone::Info);
        assert!(running.animated);

        let pending = status_badge(&TaskStatus::Pending);
        assert_eq!(pending.label, "Pending");
        assert_eq!(pending.tone, Tone::Neutral);
    }

    #[test]
    fn test_other_statuses_show_raw_string() {
        assert_eq!(status_badge(&TaskStatus::Failed).label, "failed");
        assert_eq!(status_badge(&TaskStatus::Error).tone, Tone::Error);

        let unknown = status_badge(&TaskStatus::Other("cancelled".into()));
        assert_eq!(unknown.label, "cancelled");
        assert_eq!(unknown.tone, Tone::Error);
    }

    #[test]
    fn test_cell_indicators() {
        assert_eq!(cell_indicator("success"), CellIndicator::Solid);
        assert_eq!(cell_indicator("running"), CellIndicator::Animated);
        assert_eq!(cell_indicator("error"), CellIndicator::Alert);
        assert_eq!(cell_indicator("pending"), CellIndicator::Dot);
        assert_eq!(cell_indicator(""), CellIndicator::Dot);
    }
}
