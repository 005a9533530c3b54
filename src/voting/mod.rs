pub mod machine;
pub mod render;
pub mod results;

pub use machine::{AUTO_CONFIRM_SECONDS, Effect, Event, Phase, PollView, VOTE_DELAY};
pub use render::{BallotView, OptionRow, PollRender, ScheduledView, render};
pub use results::{
    ResultsModal, ResultsOverview, ResultsTab, StaticVoterDirectory, VOTER_SAMPLE_LIMIT,
    VoterBreakdown, VoterDirectory, winning_option,
};
