/// Phases of a single crawl invocation
///
/// `Idle -> FetchingRoot -> IteratingLinks -> Done | Stopped | Failed`
use std::fmt;

/// Represents where a crawl invocation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Crawl has been created but not started
    Idle,

    /// The site's root page is being fetched
    FetchingRoot,

    /// Outbound links of the root page are being fetched one by one
    IteratingLinks,

    // ===== Terminal Phases =====
    /// Every link was visited
    Done,

    /// The stop signal was observed before all links were visited
    Stopped,

    /// The crawl aborted with an error
    Failed,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Stopped | Self::Failed)
    }

    /// Returns true if moving from this phase to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        match (self, next) {
            (Self::Idle, Self::FetchingRoot) => true,
            (Self::FetchingRoot, Self::IteratingLinks) => true,
            (Self::IteratingLinks, Self::Done) => true,
            (Self::FetchingRoot | Self::IteratingLinks, Self::Stopped | Self::Failed) => true,
            _ => false,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingRoot => "fetching_root",
            Self::IteratingLinks => "iterating_links",
            Self::Done => "done",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(CrawlPhase::Idle.can_transition_to(CrawlPhase::FetchingRoot));
        assert!(CrawlPhase::FetchingRoot.can_transition_to(CrawlPhase::IteratingLinks));
        assert!(CrawlPhase::IteratingLinks.can_transition_to(CrawlPhase::Done));
    }

    #[test]
    fn test_root_cannot_finish_without_links_phase() {
        assert!(!CrawlPhase::FetchingRoot.can_transition_to(CrawlPhase::Done));
        assert!(CrawlPhase::FetchingRoot.can_transition_to(CrawlPhase::Failed));
        assert!(CrawlPhase::FetchingRoot.can_transition_to(CrawlPhase::Stopped));
    }

    #[test]
    fn test_terminal_phases_are_final() {
        for terminal in [CrawlPhase::Done, CrawlPhase::Stopped, CrawlPhase::Failed] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(CrawlPhase::FetchingRoot));
            assert!(!terminal.can_transition_to(CrawlPhase::IteratingLinks));
        }
        assert!(!CrawlPhase::Idle.is_terminal());
    }
}
