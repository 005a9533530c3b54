pub mod board;
pub mod session;

pub use board::{Board, Reply};
pub use session::{Envelope, LogVoteSink, OnVote, PollSession, SessionConfig, VoteSink};
