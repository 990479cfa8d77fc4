/// Crawl phase definitions for tracking engine progress
///
/// The traversal engine moves through these phases exactly once, in order.
use crate::CrawlError;
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Logging in; no page of the site has been crawled yet
    Authenticating,

    /// Walking the frontier
    Crawling,

    /// Traversal stopped; see [`Termination`] for why
    Finished,
}

/// Why a traversal stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The target number of flags was collected
    TargetReached,

    /// Every discovered path was processed before the target was reached
    FrontierExhausted,
}

impl CrawlPhase {
    /// Returns true if `next` may follow this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Authenticating, Self::Crawling) | (Self::Crawling, Self::Finished)
        )
    }

    /// Moves to `next`, rejecting out-of-order transitions
    pub fn transition_to(&mut self, next: CrawlPhase) -> Result<(), CrawlError> {
        if !self.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticating => "authenticating",
            Self::Crawling => "crawling",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::FrontierExhausted => "frontier_exhausted",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
