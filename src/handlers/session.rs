use async_trait::async_trait;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::error::PollError;
use crate::models::{DisplayMode, Poll};
use crate::tasks::{Clock, Notice, NoticeId, Notifier, ScheduleCountdown, TaskHandle};
use crate::voting::{
    AUTO_CONFIRM_SECONDS, Effect, Event, PollRender, PollView, ResultsModal, ResultsOverview,
    ResultsTab, VOTE_DELAY, VOTER_SAMPLE_LIMIT, VoterBreakdown, VoterDirectory, render,
};

const TICK: Duration = Duration::from_secs(1);

/// Callback fired at click time with the chosen option index.
pub type OnVote = Box<dyn FnMut(usize) + Send>;

/// Receives a vote once its undo window has passed.
#[async_trait]
pub trait VoteSink: Send + Sync {
    async fn commit(&self, poll_id: &str, option: usize) -> Result<(), PollError>;
}

/// Sink that only records the commit in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogVoteSink;

#[async_trait]
impl VoteSink for LogVoteSink {
    async fn commit(&self, poll_id: &str, option: usize) -> Result<(), PollError> {
        info!("Committed vote for option {} in poll {}", option, poll_id);
        Ok(())
    }
}

/// Timer event addressed to the session in `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub slot: usize,
    pub event: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub vote_delay: Duration,
    pub undo_seconds: u32,
    pub voter_sample: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vote_delay: VOTE_DELAY,
            undo_seconds: AUTO_CONFIRM_SECONDS,
            voter_sample: VOTER_SAMPLE_LIMIT,
        }
    }
}

/// One mounted poll: local view state plus the timers it owns.
pub struct PollSession {
    slot: usize,
    poll: Poll,
    view: PollView,
    modal: ResultsModal,
    config: SessionConfig,
    tx: UnboundedSender<Envelope>,
    notifier: Arc<dyn Notifier>,
    sink: Option<Arc<dyn VoteSink>>,
    on_vote: Option<OnVote>,
    notice: Option<NoticeId>,
    transition_timer: TaskHandle,
    countdown_timer: TaskHandle,
    schedule: Option<ScheduleCountdown>,
}

impl PollSession {
    pub fn new(
        slot: usize,
        poll: Poll,
        config: SessionConfig,
        tx: UnboundedSender<Envelope>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let view = PollView::with_timing(&poll, config.vote_delay, config.undo_seconds);
        Self {
            slot,
            poll,
            view,
            modal: ResultsModal::default(),
            config,
            tx,
            notifier,
            sink: None,
            on_vote: None,
            notice: None,
            transition_timer: TaskHandle::idle(),
            countdown_timer: TaskHandle::idle(),
            schedule: None,
        }
    }

    pub fn with_on_vote<F>(mut self, on_vote: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        self.on_vote = Some(Box::new(on_vote));
        self
    }

    pub fn set_sink(&mut self, sink: Arc<dyn VoteSink>) {
        self.sink = Some(sink);
    }

    /// Start the live countdown if this poll is waiting to open.
    pub fn start_schedule(&mut self, clock: Clock) {
        if self.poll.display_mode != DisplayMode::Scheduled {
            return;
        }
        match (self.poll.start_date, self.schedule.as_mut()) {
            (Some(start), Some(schedule)) => schedule.restart(start),
            (Some(start), None) => {
                self.schedule = Some(ScheduleCountdown::start(&self.poll.id, start, clock))
            }
            (None, _) => debug!("Poll {} is scheduled without a start date", self.poll.id),
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn poll(&self) -> &Poll {
        &self.poll
    }

    pub fn view(&self) -> &PollView {
        &self.view
    }

    pub fn modal(&self) -> &ResultsModal {
        &self.modal
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown_timer.is_active()
    }

    pub fn render(&self) -> PollRender {
        let time_left = self.schedule.as_ref().map(ScheduleCountdown::time_left);
        render(&self.poll, &self.view, time_left)
    }

    pub fn open_results(&mut self) -> ResultsOverview {
        self.modal.open();
        ResultsOverview::from_poll(&self.poll)
    }

    pub fn show_voters(&mut self, directory: &dyn VoterDirectory) -> VoterBreakdown {
        if !self.modal.is_open() {
            self.modal.open();
        }
        self.modal.select(ResultsTab::Voters);
        VoterBreakdown::build(&self.poll, directory, self.config.voter_sample)
    }

    pub fn close_results(&mut self) {
        self.modal.close();
    }

    /// Feed one event through the state machine and carry out its effects.
    pub async fn dispatch(&mut self, event: Event) {
        let effects = self.view.apply(event);
        let mut confirmed = None;
        for effect in effects {
            if let Some(option) = self.perform(effect) {
                confirmed = Some(option);
            }
        }

        if let Some(option) = confirmed {
            self.commit(option).await;
        }
    }

    /// Release every timer and notice this session holds. Safe to call more
    /// than once.
    pub fn teardown(&mut self) {
        for effect in self.view.apply(Event::Teardown) {
            self.perform(effect);
        }
        self.transition_timer.cancel();
        self.countdown_timer.cancel();
        if let Some(schedule) = self.schedule.as_mut() {
            schedule.cancel();
        }
    }

    // Returns the option to commit when the effect confirms a vote
    fn perform(&mut self, effect: Effect) -> Option<usize> {
        match effect {
            Effect::InvokeOnVote(option) => {
                info!("Voted for option {} in poll {}", option, self.poll.id);
                if let Some(on_vote) = self.on_vote.as_mut() {
                    on_vote(option);
                }
            }
            Effect::ScheduleTransition { epoch, delay } => {
                let envelope = Envelope {
                    slot: self.slot,
                    event: Event::TransitionElapsed { epoch },
                };
                self.transition_timer = TaskHandle::after(delay, self.tx.clone(), envelope);
            }
            Effect::CancelTransition => {
                self.transition_timer.cancel();
            }
            Effect::StartCountdown { epoch } => {
                let slot = self.slot;
                self.countdown_timer = TaskHandle::every(TICK, self.tx.clone(), move || Envelope {
                    slot,
                    event: Event::Tick { epoch },
                });
            }
            Effect::StopCountdown => {
                self.countdown_timer.cancel();
            }
            Effect::ShowNotice { remaining } => {
                let notice = Notice::undo(Uuid::new_v4(), remaining);
                self.notifier.show(&notice);
                self.notice = Some(notice.id);
            }
            Effect::UpdateNotice { remaining } => {
                if let Some(id) = self.notice {
                    self.notifier.update(&Notice::undo(id, remaining));
                }
            }
            Effect::DismissNotice => {
                if let Some(id) = self.notice.take() {
                    self.notifier.dismiss(id);
                }
            }
            Effect::ConfirmVote { option } => return Some(option),
        }
        None
    }

    async fn commit(&self, option: usize) {
        let Some(sink) = self.sink.as_ref() else {
            info!("Vote saved automatically for poll {}", self.poll.id);
            self.notifier.success("Vote saved");
            return;
        };

        match sink.commit(&self.poll.id, option).await {
            Ok(()) => {
                info!("Vote saved automatically for poll {}", self.poll.id);
                self.notifier.success("Vote saved");
            }
            Err(e) => {
                error!("Failed to save vote for poll {}: {}", self.poll.id, e);
                self.notifier.failure("Vote could not be saved");
            }
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
