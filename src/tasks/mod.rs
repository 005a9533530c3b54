pub mod countdown;
pub mod notify;
pub mod timer;

pub use countdown::{Clock, ScheduleCountdown, TimeLeft};
pub use notify::{LogNotifier, Notice, NoticeId, Notifier};
pub use timer::TaskHandle;
