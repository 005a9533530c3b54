use log::{info, warn};
use uuid::Uuid;

pub type NoticeId = Uuid;

/// A dismissible notification, optionally carrying an action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub message: String,
    pub action: Option<String>,
}

impl Notice {
    /// The auto-confirm countdown notice with its Undo action.
    pub fn undo(id: NoticeId, remaining: u32) -> Self {
        Self {
            id,
            message: format!("Auto-saving in {}s", remaining),
            action: Some("Undo".to_string()),
        }
    }
}

/// Toast surface: show a notice under an id, update it in place, dismiss it.
pub trait Notifier: Send + Sync {
    fn show(&self, notice: &Notice);
    fn update(&self, notice: &Notice);
    fn dismiss(&self, id: NoticeId);
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notice: &Notice) {
        match &notice.action {
            Some(action) => info!("[{}] {} ({})", notice.id, notice.message, action),
            None => info!("[{}] {}", notice.id, notice.message),
        }
    }

    fn update(&self, notice: &Notice) {
        info!("[{}] {}", notice.id, notice.message);
    }

    fn dismiss(&self, id: NoticeId) {
        info!("[{}] dismissed", id);
    }

    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn failure(&self, message: &str) {
        warn!("{}", message);
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Record {
        Shown(NoticeId, String),
        Updated(NoticeId, String),
        Dismissed(NoticeId),
        Success(String),
        Failure(String),
    }

    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        records: Mutex<Vec<Record>>,
    }

    impl RecordingNotifier {
        pub fn records(&self) -> Vec<Record> {
            self.records.lock().unwrap().clone()
        }

        fn push(&self, record: Record) {
            self.records.lock().unwrap().push(record);
        }
    }

    impl Notifier for RecordingNotifier {
        fn show(&self, notice: &Notice) {
            self.push(Record::Shown(notice.id, notice.message.clone()));
        }

        fn update(&self, notice: &Notice) {
            self.push(Record::Updated(notice.id, notice.message.clone()));
        }

        fn dismiss(&self, id: NoticeId) {
            self.push(Record::Dismissed(id));
        }

        fn success(&self, message: &str) {
            self.push(Record::Success(message.to_string()));
        }

        fn failure(&self, message: &str) {
            self.push(Record::Failure(message.to_string()));
        }
    }
}
