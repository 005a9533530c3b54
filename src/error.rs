use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Poll {0} has no options")]
    NoOptions(String),
    #[error("Poll {poll_id} references option {index} but only has {options} options")]
    UnknownOption {
        poll_id: String,
        index: usize,
        options: usize,
    },
    #[error("Poll {0} is scheduled but not displayed as scheduled")]
    InconsistentSchedule(String),
    #[error("No such poll: {0}")]
    NoSuchPoll(String),
    #[error("Invalid poll filter: {0}")]
    InvalidFilter(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Failed to read poll data: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse poll data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to commit vote: {0}")]
    Commit(String),
}
