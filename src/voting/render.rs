use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{DisplayMode, Poll, PollState, PollType};
use crate::tasks::countdown::TimeLeft;
use crate::voting::machine::PollView;

const BAR_WIDTH: usize = 20;

/// Proportional bar for a percentage in `[0, 100]`.
pub fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn short_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollRender {
    Scheduled(ScheduledView),
    Ballot(BallotView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledView {
    pub starts_at: Option<DateTime<Utc>>,
    pub time_left: Option<TimeLeft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionRow {
    pub index: usize,
    pub label: String,
    pub votes: u64,
    pub percentage: f64,
    pub selected: bool,
    pub your_choice: bool,
    pub show_result: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedNotice {
    pub closed_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub total_votes: u64,
    pub max_votes: Option<u32>,
    pub ended: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BallotView {
    pub question: String,
    pub rows: Vec<OptionRow>,
    pub voting_enabled: bool,
    pub results_visible: bool,
    pub transitioning: bool,
    pub closed_notice: Option<ClosedNotice>,
    pub footer: Footer,
}

impl BallotView {
    pub fn row(&self, index: usize) -> Option<&OptionRow> {
        self.rows.get(index)
    }
}

/// Compute what a viewer sees for one poll.
pub fn render(poll: &Poll, view: &PollView, time_left: Option<TimeLeft>) -> PollRender {
    // The record decides whether the skeleton is shown, not local state
    if poll.display_mode == DisplayMode::Scheduled || view.mode() == DisplayMode::Scheduled {
        return PollRender::Scheduled(ScheduledView {
            starts_at: poll.start_date,
            time_left: poll.start_date.and(time_left),
        });
    }

    let results_visible = view.show_results();
    let transitioning = view.is_transitioning();
    let selecting = view.mode().allows_voting() || transitioning;

    let rows = poll
        .options
        .iter()
        .enumerate()
        .map(|(index, label)| OptionRow {
            index,
            label: label.clone(),
            votes: poll.vote_count(index),
            percentage: poll.percentage(index),
            selected: selecting && view.is_selected(index),
            your_choice: view.is_user_choice(poll, index),
            show_result: results_visible,
        })
        .collect();

    let closed_notice = if view.mode().is_closed() && !view.admin_view() {
        Some(ClosedNotice {
            closed_on: poll.end_date,
        })
    } else {
        None
    };

    PollRender::Ballot(BallotView {
        question: poll.question.clone(),
        rows,
        voting_enabled: view.can_vote(),
        results_visible,
        transitioning,
        closed_notice,
        footer: Footer {
            total_votes: poll.total_votes,
            max_votes: (poll.poll_type == PollType::Multiple).then_some(poll.max_votes_per_user),
            ended: poll.end_date.filter(|_| poll.state == PollState::Closed),
        },
    })
}

impl fmt::Display for ScheduledView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.starts_at {
            Some(start) => {
                let left = self.time_left.unwrap_or_default();
                write!(
                    f,
                    "Poll starts soon ({})  {}",
                    start.format("%b %-d, %Y %I:%M %p"),
                    left
                )
            }
            None => write!(f, "Poll not started yet"),
        }
    }
}

impl fmt::Display for OptionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.your_choice {
            "(x)"
        } else if self.selected {
            "(o)"
        } else {
            "( )"
        };
        write!(f, "{:>2}. {} {}", self.index + 1, marker, self.label)?;
        if self.your_choice {
            write!(f, "  [Your choice]")?;
        }
        if self.show_result {
            write!(
                f,
                "\n       {} {} ({:.0}%)",
                bar(self.percentage, BAR_WIDTH),
                self.votes,
                self.percentage
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Footer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.total_votes == 1 { "" } else { "s" };
        write!(f, "{} vote{}", self.total_votes, plural)?;
        if let Some(max) = self.max_votes {
            write!(f, " • Max {}", max)?;
        }
        if let Some(end) = &self.ended {
            write!(f, "    Ended {}", short_date(end))?;
        }
        Ok(())
    }
}

impl fmt::Display for BallotView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.question)?;
        if let Some(notice) = &self.closed_notice {
            write!(f, "  ! This poll has ended")?;
            if let Some(date) = &notice.closed_on {
                write!(f, ". Closed on {}", short_date(date))?;
            }
            writeln!(f)?;
        }
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        write!(f, "{}", self.footer)
    }
}

impl fmt::Display for PollRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollRender::Scheduled(view) => write!(f, "{}", view),
            PollRender::Ballot(view) => write!(f, "{}", view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::poll;
    use crate::voting::machine::Event;
    use chrono::TimeZone;

    fn ballot(render: PollRender) -> BallotView {
        match render {
            PollRender::Ballot(view) => view,
            other => panic!("expected a ballot, got {:?}", other),
        }
    }

    #[test]
    fn closed_visible_scenario() {
        let mut p = poll(DisplayMode::ClosedResultsVisible, &[3, 1]);
        p.options = vec!["A".to_string(), "B".to_string()];
        let view = PollView::new(&p);

        let b = ballot(render(&p, &view, None));
        assert!(!b.voting_enabled);
        assert!(b.results_visible);
        assert!(!b.transitioning);
        assert_eq!(b.row(0).unwrap().percentage, 75.0);
        assert_eq!(b.row(1).unwrap().percentage, 25.0);
        assert!(b.closed_notice.is_some());

        let text = b.to_string();
        assert!(text.contains("A"));
        assert!(text.contains("(75%)"));
        assert!(text.contains("(25%)"));
        assert!(text.contains("4 votes"));
    }

    #[test]
    fn open_unvoted_hides_results() {
        let p = poll(DisplayMode::OpenUnvoted, &[3, 1]);
        let b = ballot(render(&p, &PollView::new(&p), None));
        assert!(b.voting_enabled);
        assert!(!b.results_visible);
        assert!(b.rows.iter().all(|row| !row.show_result));
        assert!(!b.to_string().contains('%'));
    }

    #[test]
    fn selection_marks_your_choice_after_vote() {
        let p = poll(DisplayMode::OpenUnvoted, &[3, 1]);
        let mut view = PollView::new(&p);
        view.apply(Event::Click(1));

        let b = ballot(render(&p, &view, None));
        assert!(b.transitioning);
        assert!(b.row(1).unwrap().selected);
        assert!(!b.row(1).unwrap().your_choice);

        let epoch = view.epoch();
        view.apply(Event::TransitionElapsed { epoch });
        let b = ballot(render(&p, &view, None));
        assert!(b.row(1).unwrap().your_choice);
        assert!(b.to_string().contains("[Your choice]"));
    }

    #[test]
    fn admin_overlay_hides_closed_notice() {
        let p = poll(DisplayMode::ClosedResultsVisible, &[1]);
        let mut view = PollView::new(&p);
        view.apply(Event::ToggleAdminView);
        assert!(ballot(render(&p, &view, None)).closed_notice.is_none());
    }

    #[test]
    fn footer_variants() {
        let mut p = poll(DisplayMode::ClosedResultsHidden, &[1, 0]);
        p.poll_type = PollType::Multiple;
        p.max_votes_per_user = 2;
        p.end_date = Some(Utc.with_ymd_and_hms(2024, 1, 20, 23, 59, 59).unwrap());

        let b = ballot(render(&p, &PollView::new(&p), None));
        let footer = b.footer.to_string();
        assert!(footer.starts_with("1 vote • Max 2"));
        assert!(footer.contains("Ended Jan 20, 2024"));
        assert!(b.to_string().contains("Closed on Jan 20, 2024"));
        assert!(!b.results_visible);
    }

    #[test]
    fn scheduled_renders_skeleton() {
        let mut p = poll(DisplayMode::Scheduled, &[0, 0]);
        let start = Utc.with_ymd_and_hms(2030, 1, 15, 15, 30, 0).unwrap();
        p.start_date = Some(start);
        let left = TimeLeft::from_seconds(90);

        match render(&p, &PollView::new(&p), Some(left)) {
            PollRender::Scheduled(view) => {
                assert_eq!(view.starts_at, Some(start));
                assert!(view.to_string().ends_with("00:01:30"));
            }
            other => panic!("expected skeleton, got {:?}", other),
        }

        p.start_date = None;
        let text = render(&p, &PollView::new(&p), Some(left)).to_string();
        assert_eq!(text, "Poll not started yet");
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(bar(50.0, 4), "██░░");
        assert_eq!(bar(0.0, 3), "░░░");
        assert_eq!(bar(140.0, 2), "██");
    }
}
