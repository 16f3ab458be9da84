use super::views::{author_views, ChoiceTally, ResultContext};
use crate::content::{ContentTree, Page, PollsPage, TreeError};

/// Tallies in editor order.
pub fn tallies(polls: &PollsPage) -> Vec<ChoiceTally> {
    polls
        .ordered_choices()
        .into_iter()
        .map(|choice| ChoiceTally {
            id: choice.id,
            choice_text: choice.choice_text.clone(),
            votes: choice.votes,
        })
        .collect()
}

/// Read-only result view for a question page served at `url`.
pub fn result_context<T>(
    tree: &T,
    page: &Page,
    polls: &PollsPage,
    url: &str,
) -> Result<ResultContext, TreeError>
where
    T: ContentTree + ?Sized,
{
    Ok(ResultContext {
        id: page.id,
        title: page.title.clone(),
        url: url.to_string(),
        date: polls.date,
        authors: author_views(tree, &polls.authors)?,
        choices: tallies(polls),
        total_votes: polls.total_votes(),
    })
}
