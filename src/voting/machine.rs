use std::time::Duration;

use crate::models::{DisplayMode, Poll};

/// Seconds a vote stays provisional before it is committed.
pub const AUTO_CONFIRM_SECONDS: u32 = 5;
/// Visual delay between the click and the mode switch.
pub const VOTE_DELAY: Duration = Duration::from_millis(500);

/// Inputs to the poll state machine. Timer events carry the epoch they were
/// scheduled in; events from an earlier epoch are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Click(usize),
    TransitionElapsed { epoch: u64 },
    Tick { epoch: u64 },
    Undo,
    ToggleAdminView,
    Teardown,
}

/// Side effects requested by a transition. The machine never performs them
/// itself; the hosting session does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    InvokeOnVote(usize),
    ScheduleTransition { epoch: u64, delay: Duration },
    CancelTransition,
    StartCountdown { epoch: u64 },
    StopCountdown,
    ShowNotice { remaining: u32 },
    UpdateNotice { remaining: u32 },
    DismissNotice,
    ConfirmVote { option: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight
    Idle,
    /// Click registered, waiting for the visual delay
    Transitioning,
    /// Vote is provisional and can still be undone
    Confirming { remaining: u32 },
    /// Vote committed; no further voting
    Confirmed,
    TornDown,
}

#[derive(Debug, Clone)]
pub struct PollView {
    mode: DisplayMode,
    pre_vote_mode: DisplayMode,
    phase: Phase,
    selected: Vec<usize>,
    option_count: usize,
    admin_view: bool,
    epoch: u64,
    vote_delay: Duration,
    undo_seconds: u32,
}

impl PollView {
    pub fn new(poll: &Poll) -> Self {
        Self::with_timing(poll, VOTE_DELAY, AUTO_CONFIRM_SECONDS)
    }

    pub fn with_timing(poll: &Poll, vote_delay: Duration, undo_seconds: u32) -> Self {
        // Recorded votes only mark "Your choice"; the mode alone gates voting
        Self {
            mode: poll.display_mode,
            pre_vote_mode: poll.display_mode,
            phase: Phase::Idle,
            selected: Vec::new(),
            option_count: poll.options.len(),
            admin_view: false,
            epoch: 0,
            vote_delay,
            undo_seconds: undo_seconds.max(1),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase == Phase::Transitioning
    }

    pub fn admin_view(&self) -> bool {
        self.admin_view
    }

    /// Seconds left on the auto-confirm countdown; the full window when idle.
    pub fn countdown(&self) -> u32 {
        match self.phase {
            Phase::Confirming { remaining } => remaining,
            Phase::Confirmed => 0,
            _ => self.undo_seconds,
        }
    }

    pub fn can_vote(&self) -> bool {
        self.phase == Phase::Idle && self.mode.allows_voting()
    }

    pub fn show_results(&self) -> bool {
        match self.mode {
            DisplayMode::ClosedResultsHidden | DisplayMode::Scheduled => false,
            mode => mode.reveals_results() || self.admin_view,
        }
    }

    /// Whether an option is marked as the viewer's own vote.
    pub fn is_user_choice(&self, poll: &Poll, index: usize) -> bool {
        poll.user_votes.contains(&index)
            || (self.mode == DisplayMode::OpenResultsAfterVote && self.is_selected(index))
    }

    /// Pure transition: returns the next state and the effects to run.
    pub fn transition(&self, event: Event) -> (PollView, Vec<Effect>) {
        let mut next = self.clone();
        let effects = next.apply(event);
        (next, effects)
    }

    /// In-place form of [`PollView::transition`].
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        if self.phase == Phase::TornDown {
            return Vec::new();
        }

        match event {
            Event::Click(index) => self.cast(index),
            Event::TransitionElapsed { epoch } => self.finish_transition(epoch),
            Event::Tick { epoch } => self.tick(epoch),
            Event::Undo => self.undo(),
            Event::ToggleAdminView => {
                self.admin_view = !self.admin_view;
                Vec::new()
            }
            Event::Teardown => {
                let effects = self.release();
                self.phase = Phase::TornDown;
                self.epoch += 1;
                effects
            }
        }
    }

    fn cast(&mut self, index: usize) -> Vec<Effect> {
        if !self.can_vote() || index >= self.option_count {
            log::debug!("Ignoring click on option {} in mode {:?}", index, self.mode);
            return Vec::new();
        }

        self.selected = vec![index];
        self.pre_vote_mode = self.mode;
        self.phase = Phase::Transitioning;
        self.epoch += 1;

        vec![
            Effect::InvokeOnVote(index),
            Effect::ScheduleTransition {
                epoch: self.epoch,
                delay: self.vote_delay,
            },
        ]
    }

    fn finish_transition(&mut self, epoch: u64) -> Vec<Effect> {
        if self.phase != Phase::Transitioning || epoch != self.epoch {
            return Vec::new();
        }

        self.mode = match self.pre_vote_mode {
            DisplayMode::OpenUnvoted => DisplayMode::OpenResultsAfterVote,
            other => other,
        };
        self.phase = Phase::Confirming {
            remaining: self.undo_seconds,
        };

        vec![
            Effect::StartCountdown { epoch },
            Effect::ShowNotice {
                remaining: self.undo_seconds,
            },
        ]
    }

    fn tick(&mut self, epoch: u64) -> Vec<Effect> {
        let remaining = match self.phase {
            Phase::Confirming { remaining } if epoch == self.epoch => remaining,
            _ => return Vec::new(),
        };

        if remaining <= 1 {
            self.phase = Phase::Confirmed;
            let option = self.selected.first().copied().unwrap_or_default();
            vec![
                Effect::StopCountdown,
                Effect::DismissNotice,
                Effect::ConfirmVote { option },
            ]
        } else {
            self.phase = Phase::Confirming {
                remaining: remaining - 1,
            };
            vec![Effect::UpdateNotice {
                remaining: remaining - 1,
            }]
        }
    }

    fn undo(&mut self) -> Vec<Effect> {
        let effects = self.release();
        if effects.is_empty() {
            return effects;
        }

        self.mode = DisplayMode::OpenUnvoted;
        self.selected.clear();
        self.phase = Phase::Idle;
        self.epoch += 1;
        effects
    }

    // Effects that tear down whatever is in flight
    fn release(&self) -> Vec<Effect> {
        match self.phase {
            Phase::Transitioning => vec![Effect::CancelTransition],
            Phase::Confirming { .. } => vec![Effect::StopCountdown, Effect::DismissNotice],
            _ => Vec::new(),
        }
    }
}
