use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;
use std::time::Duration as StdDuration;
use tokio::sync::watch;
use tokio::time::{Instant, interval_at};

use crate::tasks::timer::TaskHandle;

const TICK_SECONDS: u64 = 1;

/// Wall clock that advances with the tokio clock, so paused runtimes move
/// it as well.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    wall: DateTime<Utc>,
    base: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self::anchored(Utc::now())
    }

    pub fn anchored(wall: DateTime<Utc>) -> Self {
        Self {
            wall,
            base: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.base.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall + elapsed
    }
}

/// Remaining time until a poll opens. All fields are zero once the start
/// time has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeLeft {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeLeft {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn until(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let difference = (start - now).num_seconds();
        if difference > 0 {
            Self::from_seconds(difference as u64)
        } else {
            Self::default()
        }
    }

    pub fn is_expired(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d:", self.days)?;
        }
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Live countdown to a scheduled poll's start, recomputed once per second.
/// The task stops after publishing the zero value.
pub struct ScheduleCountdown {
    poll_id: String,
    start: DateTime<Utc>,
    clock: Clock,
    rx: watch::Receiver<TimeLeft>,
    task: TaskHandle,
}

impl ScheduleCountdown {
    pub fn start(poll_id: &str, start: DateTime<Utc>, clock: Clock) -> Self {
        let (rx, task) = spawn_countdown(poll_id.to_string(), start, clock);
        Self {
            poll_id: poll_id.to_string(),
            start,
            clock,
            rx,
            task,
        }
    }

    pub fn time_left(&self) -> TimeLeft {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimeLeft> {
        self.rx.clone()
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn is_running(&self) -> bool {
        self.task.is_active()
    }

    /// Point the countdown at a new start time, replacing the running task.
    pub fn restart(&mut self, start: DateTime<Utc>) {
        if start == self.start && self.task.is_active() {
            return;
        }
        self.task.cancel();
        let (rx, task) = spawn_countdown(self.poll_id.clone(), start, self.clock);
        self.start = start;
        self.rx = rx;
        self.task = task;
    }

    pub fn cancel(&mut self) {
        if self.task.cancel() {
            debug!("Countdown for poll {} cancelled", self.poll_id);
        }
    }
}

fn spawn_countdown(
    poll_id: String,
    start: DateTime<Utc>,
    clock: Clock,
) -> (watch::Receiver<TimeLeft>, TaskHandle) {
    let initial = TimeLeft::until(start, clock.now());
    let (tx, rx) = watch::channel(initial);

    if initial.is_expired() {
        return (rx, TaskHandle::idle());
    }

    let task = TaskHandle::spawn(run_countdown(poll_id, start, clock, tx));
    (rx, task)
}

async fn run_countdown(
    poll_id: String,
    start: DateTime<Utc>,
    clock: Clock,
    tx: watch::Sender<TimeLeft>,
) {
    info!("Starting countdown for poll {} (opens {})", poll_id, start.to_rfc3339());
    let period = StdDuration::from_secs(TICK_SECONDS);
    let mut interval = interval_at(Instant::now() + period, period);

    loop {
        interval.tick().await;
        let left = TimeLeft::until(start, clock.now());
        if tx.send(left).is_err() {
            break;
        }
        if left.is_expired() {
            info!("Start time reached for poll {}", poll_id);
            break;
        }
    }
}
