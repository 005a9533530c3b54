use log::{info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::commands::{Command, HELP, PollSelector};
use crate::error::PollError;
use crate::handlers::session::{Envelope, PollSession, SessionConfig, VoteSink};
use crate::models::{PollFilter, Post};
use crate::tasks::{Clock, Notifier};
use crate::voting::{Event, VoterDirectory};

pub enum Reply {
    Text(String),
    Quit,
}

/// Every poll on a page, sharing one timer event channel.
pub struct Board {
    posts: Vec<Post>,
    sessions: Vec<PollSession>,
    rx: UnboundedReceiver<Envelope>,
    directory: Arc<dyn VoterDirectory>,
}

impl Board {
    pub fn new(
        posts: Vec<Post>,
        config: SessionConfig,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn VoterDirectory>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let sessions = posts
            .iter()
            .enumerate()
            .map(|(slot, post)| {
                let poll_id = post.poll.id.clone();
                PollSession::new(slot, post.poll.clone(), config, tx.clone(), notifier.clone())
                    .with_on_vote(move |option| {
                        info!("Vote callback: option {} in poll {}", option, poll_id)
                    })
            })
            .collect();

        Self {
            posts,
            sessions,
            rx,
            directory,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn VoteSink>) -> Self {
        for session in &mut self.sessions {
            session.set_sink(sink.clone());
        }
        self
    }

    pub fn start_schedules(&mut self, clock: Clock) {
        for session in &mut self.sessions {
            session.start_schedule(clock);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session(&self, slot: usize) -> Option<&PollSession> {
        self.sessions.get(slot)
    }

    pub fn find(&self, selector: &PollSelector) -> Result<usize, PollError> {
        let found = match selector {
            PollSelector::Position(position) => position
                .checked_sub(1)
                .filter(|slot| *slot < self.sessions.len()),
            PollSelector::Id(id) => self.sessions.iter().position(|s| s.poll().id == *id),
        };

        found.ok_or_else(|| {
            PollError::NoSuchPoll(match selector {
                PollSelector::Position(position) => position.to_string(),
                PollSelector::Id(id) => id.clone(),
            })
        })
    }

    /// Next timer event from any session.
    pub async fn next_event(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub async fn deliver(&mut self, envelope: Envelope) {
        match self.sessions.get_mut(envelope.slot) {
            Some(session) => session.dispatch(envelope.event).await,
            None => warn!("Timer event for unknown slot {}", envelope.slot),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Reply, PollError> {
        let text = match command {
            Command::List(filter) => self.list(filter),
            Command::Show(selector) => {
                let slot = self.find(&selector)?;
                self.show(slot)
            }
            Command::Vote(selector, option) => {
                let slot = self.find(&selector)?;
                self.vote(slot, option).await?
            }
            Command::Undo(selector) => {
                let slot = self.find(&selector)?;
                self.sessions[slot].dispatch(Event::Undo).await;
                self.show(slot)
            }
            Command::Admin(selector) => {
                let slot = self.find(&selector)?;
                self.sessions[slot].dispatch(Event::ToggleAdminView).await;
                self.show(slot)
            }
            Command::Results(selector) => {
                let slot = self.find(&selector)?;
                self.sessions[slot].open_results().to_string()
            }
            Command::Voters(selector) => {
                let slot = self.find(&selector)?;
                let directory = Arc::clone(&self.directory);
                self.sessions[slot].show_voters(directory.as_ref()).to_string()
            }
            Command::Close(selector) => {
                let slot = self.find(&selector)?;
                self.sessions[slot].close_results();
                "Results closed".to_string()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }

    pub fn shutdown(&mut self) {
        for session in &mut self.sessions {
            session.teardown();
        }
        info!("Released {} poll sessions", self.sessions.len());
    }

    fn list(&self, filter: PollFilter) -> String {
        let lines: Vec<String> = self
            .posts
            .iter()
            .zip(&self.sessions)
            .enumerate()
            .filter(|(_, (_, session))| filter.matches(session.poll()))
            .map(|(slot, (post, session))| {
                format!(
                    "{}. [{}] {} by {}: {}",
                    slot + 1,
                    session.poll().state,
                    post.title,
                    post.author.name,
                    session.poll().question
                )
            })
            .collect();

        if lines.is_empty() {
            "No polls match this filter".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn show(&self, slot: usize) -> String {
        let post = &self.posts[slot];
        let session = &self.sessions[slot];
        let mut header = format!("#{} {} ({})", slot + 1, post.title, post.author.name);
        if let Some(role) = &post.author.role {
            header.push_str(&format!(" - {}", role));
        }
        format!("{}\n{}", header, session.render())
    }

    async fn vote(&mut self, slot: usize, option: usize) -> Result<String, PollError> {
        let session = &mut self.sessions[slot];
        let options = session.poll().options.len();
        if option == 0 || option > options {
            return Err(PollError::UnknownOption {
                poll_id: session.poll().id.clone(),
                index: option,
                options,
            });
        }

        if !session.view().can_vote() {
            return Ok(format!("{}\n(voting is not available)", self.show(slot)));
        }
        session.dispatch(Event::Click(option - 1)).await;
        Ok(self.show(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::poll;
    use crate::models::{Author, DisplayMode};
    use crate::tasks::notify::recording::RecordingNotifier;
    use crate::voting::{Phase, StaticVoterDirectory};
    use std::time::Duration;
    use tokio::time::timeout;

    fn post(id: &str, mode: DisplayMode, votes: &[u64]) -> Post {
        let mut p = poll(mode, votes);
        p.id = id.to_string();
        Post {
            id: format!("post-{}", id),
            author: Author {
                name: "Kim".to_string(),
                avatar: String::new(),
                role: Some("Moderator".to_string()),
            },
            title: format!("About {}", id),
            content: String::new(),
            poll: p,
            created_at: "1h ago".to_string(),
            likes: 0,
            comments: 0,
            is_liked: false,
            tags: Vec::new(),
        }
    }

    fn board() -> Board {
        Board::new(
            vec![
                post("open", DisplayMode::OpenUnvoted, &[1, 2]),
                post("closed", DisplayMode::ClosedResultsHidden, &[5, 5]),
            ],
            SessionConfig::default(),
            Arc::new(RecordingNotifier::default()),
            Arc::new(StaticVoterDirectory::default()),
        )
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn finds_by_position_and_id() {
        let b = board();
        assert_eq!(b.find(&PollSelector::Position(1)).unwrap(), 0);
        assert_eq!(b.find(&PollSelector::Id("closed".to_string())).unwrap(), 1);
        assert!(b.find(&PollSelector::Position(0)).is_err());
        assert!(b.find(&PollSelector::Position(3)).is_err());
    }

    #[tokio::test]
    async fn list_applies_filter() {
        let mut b = board();
        let all = text(b.execute(Command::List(PollFilter::All)).await.unwrap());
        assert_eq!(all.lines().count(), 2);
        let closed = text(b.execute(Command::List(PollFilter::Closed)).await.unwrap());
        assert!(closed.starts_with("2. [closed]"));
        let scheduled = text(b.execute(Command::List(PollFilter::Scheduled)).await.unwrap());
        assert_eq!(scheduled, "No polls match this filter");
    }

    #[tokio::test(start_paused = true)]
    async fn vote_flows_through_timer_events() {
        let mut b = board();
        let shown = text(
            b.execute(Command::Vote(PollSelector::Position(1), 2))
                .await
                .unwrap(),
        );
        assert!(shown.contains("(o) Option 2"));

        while let Ok(Some(envelope)) = timeout(Duration::from_secs(2), b.next_event()).await {
            b.deliver(envelope).await;
        }
        let session = b.session(0).unwrap();
        assert_eq!(session.view().phase(), Phase::Confirmed);
        assert_eq!(session.view().mode(), DisplayMode::OpenResultsAfterVote);
    }

    #[tokio::test]
    async fn vote_rejects_bad_option_and_closed_poll() {
        let mut b = board();
        assert!(matches!(
            b.execute(Command::Vote(PollSelector::Position(1), 3)).await,
            Err(PollError::UnknownOption { .. })
        ));
        let reply = text(
            b.execute(Command::Vote(PollSelector::Position(2), 1))
                .await
                .unwrap(),
        );
        assert!(reply.contains("voting is not available"));
        assert!(b.session(1).unwrap().view().selected().is_empty());
    }

    #[tokio::test]
    async fn admin_toggle_reveals_results() {
        let mut b = board();
        let before = text(b.execute(Command::Show(PollSelector::Position(1))).await.unwrap());
        assert!(!before.contains('%'));
        let after = text(b.execute(Command::Admin(PollSelector::Position(1))).await.unwrap());
        assert!(after.contains("(67%)"));
    }
}
