/// Phase definitions for the crawl controller state machine
///
/// A crawl moves through these phases once per page until it reaches one of
/// the two terminal phases.
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Loading state, before the first fetch
    Idle,

    /// Requesting the current URL (including retries)
    Fetching,

    /// Running the field extractor over the fetched page
    Extracting,

    /// Appending extracted records to the sink
    Writing,

    /// Looking for the next page link
    Resolving,

    // ===== Terminal Phases =====
    /// No more pages to fetch, or a budget was exhausted
    Done,

    /// Fetch retries exhausted, a write failed, or the crawl was cancelled
    Failed,
}

impl CrawlPhase {
    /// Returns true for `Done` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the crawl finished without failure
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Any active phase may fall to `Failed`, because cancellation is honored
    /// between every pair of steps.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }

        matches!(
            (self, next),
            (Idle, Fetching)
                | (Idle, Done)
                | (Fetching, Extracting)
                | (Extracting, Writing)
                | (Writing, Resolving)
                | (Writing, Done)
                | (Resolving, Fetching)
                | (Resolving, Done)
        )
    }

    /// Converts the phase to its lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Writing => "writing",
            Self::Resolving => "resolving",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Parses a phase from its lowercase name
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "fetching" => Some(Self::Fetching),
            "extracting" => Some(Self::Extracting),
            "writing" => Some(Self::Writing),
            "resolving" => Some(Self::Resolving),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
