use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollType {
    Single,
    Multiple,
}

impl PollType {
    pub fn label(&self) -> &'static str {
        match self {
            PollType::Single => "Single Choice",
            PollType::Multiple => "Multiple Choice",
        }
    }
}

/// Lifecycle of the poll itself, independent of what a viewer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Scheduled,
    Open,
    Voted,
    Closed,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollState::Scheduled => "scheduled",
            PollState::Open => "open",
            PollState::Voted => "voted",
            PollState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// What the current viewer sees. The same `PollState` can render
/// differently per viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Scheduled,
    OpenUnvoted,
    OpenResultsAfterVote,
    OpenNoResults,
    ClosedResultsVisible,
    ClosedResultsHidden,
}

impl DisplayMode {
    pub fn allows_voting(&self) -> bool {
        matches!(self, DisplayMode::OpenUnvoted | DisplayMode::OpenNoResults)
    }

    pub fn reveals_results(&self) -> bool {
        matches!(
            self,
            DisplayMode::OpenResultsAfterVote | DisplayMode::ClosedResultsVisible
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            DisplayMode::ClosedResultsVisible | DisplayMode::ClosedResultsHidden
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub poll_type: PollType,
    pub options: Vec<String>,
    // Keyed by option position; a missing index counts as zero
    #[serde(default)]
    pub votes: BTreeMap<usize, u64>,
    pub state: PollState,
    pub display_mode: DisplayMode,
    #[serde(default)]
    pub has_user_voted: bool,
    #[serde(default)]
    pub user_votes: Vec<usize>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub total_votes: u64,
    #[serde(default = "default_max_votes")]
    pub max_votes_per_user: u32,
}

fn default_max_votes() -> u32 {
    1
}

impl Poll {
    pub fn vote_count(&self, index: usize) -> u64 {
        self.votes.get(&index).copied().unwrap_or(0)
    }

    /// Sum of the per-option counts.
    pub fn tallied_votes(&self) -> u64 {
        self.votes.values().sum()
    }

    /// Denominator used for percentages. The record's `total_votes` is
    /// trusted unless the tally exceeds it, in which case the tally wins so
    /// no option can pass 100%.
    pub fn effective_total(&self) -> u64 {
        self.total_votes.max(self.tallied_votes())
    }

    /// Share of the vote for one option, 0 when nobody has voted.
    pub fn percentage(&self, index: usize) -> f64 {
        let total = self.effective_total();
        if total == 0 {
            return 0.0;
        }
        self.vote_count(index) as f64 / total as f64 * 100.0
    }

    pub fn option_label(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), PollError> {
        if self.options.is_empty() {
            return Err(PollError::NoOptions(self.id.clone()));
        }

        let out_of_range = self
            .votes
            .keys()
            .chain(self.user_votes.iter())
            .find(|index| **index >= self.options.len());
        if let Some(index) = out_of_range {
            return Err(PollError::UnknownOption {
                poll_id: self.id.clone(),
                index: *index,
                options: self.options.len(),
            });
        }

        if self.state == PollState::Scheduled && self.display_mode != DisplayMode::Scheduled {
            return Err(PollError::InconsistentSchedule(self.id.clone()));
        }

        let tallied = self.tallied_votes();
        if tallied > self.total_votes {
            log::warn!(
                "Poll {} reports {} total votes but options sum to {}",
                self.id,
                self.total_votes,
                tallied
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// A post hosting a poll, as supplied by the content provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: Author,
    pub title: String,
    pub content: String,
    pub poll: Poll,
    pub created_at: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Voter {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollFilter {
    #[default]
    All,
    Open,
    Closed,
    Scheduled,
}

impl PollFilter {
    pub fn matches(&self, poll: &Poll) -> bool {
        match self {
            PollFilter::All => true,
            PollFilter::Open => matches!(poll.state, PollState::Open | PollState::Voted),
            PollFilter::Closed => poll.state == PollState::Closed,
            PollFilter::Scheduled => poll.state == PollState::Scheduled,
        }
    }
}

impl FromStr for PollFilter {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PollFilter::All),
            "open" => Ok(PollFilter::Open),
            "closed" => Ok(PollFilter::Closed),
            "scheduled" => Ok(PollFilter::Scheduled),
            other => Err(PollError::InvalidFilter(other.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn poll(display_mode: DisplayMode, votes: &[u64]) -> Poll {
        let state = match display_mode {
            DisplayMode::Scheduled => PollState::Scheduled,
            DisplayMode::ClosedResultsVisible | DisplayMode::ClosedResultsHidden => {
                PollState::Closed
            }
            _ => PollState::Open,
        };
        Poll {
            id: "poll-test".to_string(),
            question: "Pick one".to_string(),
            poll_type: PollType::Single,
            options: (0..votes.len()).map(|i| format!("Option {}", i + 1)).collect(),
            votes: votes.iter().copied().enumerate().collect(),
            state,
            display_mode,
            has_user_voted: false,
            user_votes: Vec::new(),
            start_date: None,
            end_date: None,
            total_votes: votes.iter().sum(),
            max_votes_per_user: 1,
        }
    }
}
