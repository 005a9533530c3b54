use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{Poll, PollState, PollType, Voter};
use crate::voting::render::{bar, short_date};

/// Most voters listed per option in the voters tab.
pub const VOTER_SAMPLE_LIMIT: usize = 8;

const BAR_WIDTH: usize = 30;

/// Source of representative voter identities for an option. Real per-vote
/// attribution is not available, so implementations only promise a sample.
pub trait VoterDirectory: Send + Sync {
    fn sample(&self, poll: &Poll, option: usize, votes: u64, limit: usize) -> Vec<Voter>;
}

/// Hands out the first voters of a fixed list for every option.
#[derive(Debug, Clone, Default)]
pub struct StaticVoterDirectory {
    voters: Vec<Voter>,
}

impl StaticVoterDirectory {
    pub fn new(voters: Vec<Voter>) -> Self {
        Self { voters }
    }
}

impl VoterDirectory for StaticVoterDirectory {
    fn sample(&self, _poll: &Poll, _option: usize, votes: u64, limit: usize) -> Vec<Voter> {
        let take = usize::try_from(votes).unwrap_or(usize::MAX).min(limit);
        self.voters.iter().take(take).cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultsTab {
    #[default]
    Overview,
    Voters,
}

/// Open/closed state and active tab of the results modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultsModal {
    open: bool,
    tab: ResultsTab,
}

impl ResultsModal {
    pub fn open(&mut self) {
        self.open = true;
        self.tab = ResultsTab::Overview;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn select(&mut self, tab: ResultsTab) {
        self.tab = tab;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn tab(&self) -> ResultsTab {
        self.tab
    }
}

/// Option with the highest count; ties go to the lowest index.
pub fn winning_option(poll: &Poll) -> Option<usize> {
    let max = poll.votes.values().copied().max()?;
    poll.votes
        .iter()
        .find(|(_, votes)| **votes == max)
        .map(|(index, _)| *index)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub index: usize,
    pub label: String,
    pub votes: u64,
    pub percentage: f64,
    pub is_winning: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsOverview {
    pub question: String,
    pub total_votes: u64,
    pub poll_type: PollType,
    pub status: PollState,
    pub ended: Option<DateTime<Utc>>,
    pub rows: Vec<ResultRow>,
}

impl ResultsOverview {
    pub fn from_poll(poll: &Poll) -> Self {
        let winner = winning_option(poll);
        let rows = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let votes = poll.vote_count(index);
                ResultRow {
                    index,
                    label: label.clone(),
                    votes,
                    percentage: poll.percentage(index),
                    is_winning: winner == Some(index) && votes > 0,
                }
            })
            .collect();

        Self {
            question: poll.question.clone(),
            total_votes: poll.total_votes,
            poll_type: poll.poll_type,
            status: poll.state,
            ended: poll.end_date,
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoterGroup {
    pub index: usize,
    pub label: String,
    pub votes: u64,
    pub percentage: f64,
    pub voters: Vec<Voter>,
    /// Voters beyond the sample
    pub more: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoterBreakdown {
    pub total_votes: u64,
    pub groups: Vec<VoterGroup>,
}

impl VoterBreakdown {
    pub fn build(poll: &Poll, directory: &dyn VoterDirectory, limit: usize) -> Self {
        let groups = poll
            .options
            .iter()
            .enumerate()
            .filter(|(index, _)| poll.vote_count(*index) > 0)
            .map(|(index, label)| {
                let votes = poll.vote_count(index);
                VoterGroup {
                    index,
                    label: label.clone(),
                    votes,
                    percentage: poll.percentage(index),
                    voters: directory.sample(poll, index, votes, limit),
                    more: votes.saturating_sub(limit as u64),
                }
            })
            .collect();

        Self {
            total_votes: poll.total_votes,
            groups,
        }
    }
}

impl fmt::Display for ResultsOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Poll Results [Admin Only]")?;
        writeln!(f, "{}", self.question)?;
        write!(
            f,
            "Total Votes: {}  |  Poll Type: {}  |  Status: {}",
            self.total_votes,
            self.poll_type.label(),
            self.status
        )?;
        if let Some(ended) = &self.ended {
            write!(f, "  |  Ended: {}", short_date(ended))?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{}", row.label)?;
            if row.is_winning {
                write!(f, "  (Most votes)")?;
            }
            writeln!(
                f,
                "\n  {} votes • {:.1}%\n  {}",
                row.votes,
                row.percentage,
                bar(row.percentage, BAR_WIDTH)
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for VoterBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Voter Breakdown")?;
        if self.total_votes == 0 {
            return write!(
                f,
                "No votes yet. Voter details will appear here once people start voting."
            );
        }
        writeln!(
            f,
            "Total participants: {} • Showing sample voters",
            self.total_votes
        )?;

        for group in &self.groups {
            writeln!(
                f,
                "{}  {} votes ({:.1}%)",
                group.label, group.votes, group.percentage
            )?;
            for (n, voter) in group.voters.iter().enumerate() {
                writeln!(f, "  #{} {} ({})", n + 1, voter.name, voter.role)?;
            }
            if group.more > 0 {
                writeln!(f, "  +{} more voters", group.more)?;
            }
        }
        Ok(())
    }
}
