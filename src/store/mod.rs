use log::info;
use serde::Deserialize;
use std::path::Path;

use crate::error::PollError;
use crate::models::{PollFilter, Post, Voter};

const BUNDLED: &str = include_str!("../../data/posts.json");

#[derive(Debug, Deserialize)]
struct Dataset {
    posts: Vec<Post>,
    #[serde(default)]
    voters: Vec<Voter>,
}

/// Post and voter records supplied by the content provider.
#[derive(Debug, Clone)]
pub struct PollStore {
    posts: Vec<Post>,
    voters: Vec<Voter>,
}

impl PollStore {
    /// Load from `path` when given, otherwise from the bundled mock data.
    pub async fn open(path: Option<&Path>) -> Result<Self, PollError> {
        match path {
            Some(path) => {
                info!("Loading polls from {}", path.display());
                let raw = tokio::fs::read_to_string(path).await?;
                Self::from_json(&raw)
            }
            None => {
                info!("Loading bundled mock polls");
                Self::bundled()
            }
        }
    }

    pub fn bundled() -> Result<Self, PollError> {
        Self::from_json(BUNDLED)
    }

    pub fn from_json(raw: &str) -> Result<Self, PollError> {
        let dataset: Dataset = serde_json::from_str(raw)?;
        for post in &dataset.posts {
            post.poll.validate()?;
        }
        Ok(Self {
            posts: dataset.posts,
            voters: dataset.voters,
        })
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    pub fn filtered(&self, filter: PollFilter) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|post| filter.matches(&post.poll))
            .collect()
    }

    pub fn into_parts(self) -> (Vec<Post>, Vec<Voter>) {
        (self.posts, self.voters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisplayMode;

    #[test]
    fn bundled_data_is_valid() {
        let store = PollStore::bundled().unwrap();
        assert_eq!(store.posts().len(), 6);
        assert!(store.voters().len() > 8);
        assert_eq!(store.filtered(PollFilter::Open).len(), 2);
        assert_eq!(store.filtered(PollFilter::Closed).len(), 3);

        let scheduled = store.filtered(PollFilter::Scheduled);
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].poll.display_mode, DisplayMode::Scheduled);
        assert!(scheduled[0].poll.start_date.is_some());
    }

    #[test]
    fn rejects_invalid_records() {
        let raw = r#"{"posts": [{
            "id": "1",
            "author": {"name": "A", "avatar": ""},
            "title": "t",
            "content": "c",
            "createdAt": "now",
            "poll": {
                "id": "p",
                "question": "q",
                "pollType": "single",
                "options": ["x"],
                "votes": {"3": 1},
                "state": "open",
                "displayMode": "open_unvoted",
                "totalVotes": 1
            }
        }]}"#;
        assert!(matches!(
            PollStore::from_json(raw),
            Err(PollError::UnknownOption { index: 3, .. })
        ));
        assert!(matches!(
            PollStore::from_json("{"),
            Err(PollError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let result = PollStore::open(Some(Path::new("/nonexistent/posts.json"))).await;
        assert!(matches!(result, Err(PollError::Io(_))));
    }
}
