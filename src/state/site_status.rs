/// Site status definitions for tracking indexing progress
///
/// A site is `Indexing` while a run is working on it and ends each run in
/// exactly one terminal status.
use std::fmt;

/// Represents the persisted status of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteStatus {
    /// A crawl for this site is in progress (or was interrupted)
    Indexing,

    /// The last crawl finished traversing every link
    Indexed,

    /// The last crawl failed; see the site's last error
    Failed,
}

impl SiteStatus {
    /// Returns true if this is a terminal status for a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Indexed | Self::Failed)
    }

    /// Returns true if moving from this status to `next` is allowed
    ///
    /// Any status may restart as `Indexing` (re-index). Terminal statuses
    /// are only reachable from `Indexing`. `Indexing -> Indexing` is the
    /// refresh used when a run is interrupted.
    pub fn can_transition_to(&self, next: SiteStatus) -> bool {
        match next {
            Self::Indexing => true,
            Self::Indexed | Self::Failed => matches!(self, Self::Indexing),
        }
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
