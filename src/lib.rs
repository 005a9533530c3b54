pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;
pub mod tasks;
pub mod voting;

pub use error::PollError;
