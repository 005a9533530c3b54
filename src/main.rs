use log::{error, info};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use site_polls::commands::{self, Command};
use site_polls::config::Config;
use site_polls::handlers::{Board, LogVoteSink, Reply};
use site_polls::models::PollFilter;
use site_polls::store::PollStore;
use site_polls::tasks::{Clock, LogNotifier};
use site_polls::voting::StaticVoterDirectory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store = match PollStore::open(config.data_path.as_deref()).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to load polls: {}", e);
            return Err(e.into());
        }
    };
    info!("Loaded {} polls", store.posts().len());

    let (posts, voters) = store.into_parts();
    let mut board = Board::new(
        posts,
        config.session(),
        Arc::new(LogNotifier),
        Arc::new(StaticVoterDirectory::new(voters)),
    )
    .with_sink(Arc::new(LogVoteSink));
    board.start_schedules(Clock::start());

    if let Reply::Text(listing) = board.execute(Command::List(PollFilter::All)).await? {
        println!("{}\n\nType `help` for commands.", listing);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                let reply = match commands::parse(&line) {
                    Ok(command) => board.execute(command).await,
                    Err(e) => Err(e),
                };
                match reply {
                    Ok(Reply::Text(text)) => println!("{}", text),
                    Ok(Reply::Quit) => break,
                    Err(e) => println!("{}", e),
                }
            }
            Some(envelope) = board.next_event() => {
                board.deliver(envelope).await;
            }
        }
    }

    board.shutdown();
    Ok(())
}
