use serde::Deserialize;
use tracing::{debug, info};

use super::subroute::PollsSubroute;
use super::views::QuestionContext;
use crate::content::{Choice, ChoiceId, ContentTree, Page, PageId, TreeError};

/// Message shown when the vote form arrives without a selection.
pub const MISSING_SELECTION_MESSAGE: &str = "You didn't select a choice.";

/// Submitted vote form. `choice` names a choice id of the current page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteForm {
    #[serde(default)]
    pub choice: Option<String>,
}

impl VoteForm {
    pub fn for_choice(id: ChoiceId) -> Self {
        Self {
            choice: Some(id.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum VoteOutcome {
    /// The tally was incremented; the client should be sent to `redirect`.
    Recorded { choice: Choice, redirect: String },
    /// Nothing was selected; re-render the question with an error message.
    MissingSelection(QuestionContext),
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("choice '{0}' is not part of this poll")]
    ChoiceNotFound(String),
    #[error("page {0} does not accept votes")]
    NotAPoll(PageId),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Handle a vote submitted against `page`, which is served at `page_url`.
pub fn cast_vote<T>(
    tree: &T,
    page: &Page,
    page_url: &str,
    form: VoteForm,
) -> Result<VoteOutcome, VoteError>
where
    T: ContentTree + ?Sized,
{
    let polls = page.as_polls().ok_or(VoteError::NotAPoll(page.id))?;

    let selection = form
        .choice
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty());
    let Some(raw) = selection else {
        debug!(page_id = %page.id, "vote submitted without a selection");
        let context = QuestionContext::build(tree, page, polls, page_url)?
            .with_error(MISSING_SELECTION_MESSAGE);
        return Ok(VoteOutcome::MissingSelection(context));
    };

    let choice_id = raw
        .parse::<u64>()
        .map(ChoiceId)
        .map_err(|_| VoteError::ChoiceNotFound(raw.to_string()))?;
    if polls.choice(choice_id).is_none() {
        return Err(VoteError::ChoiceNotFound(raw.to_string()));
    }

    let choice = tree
        .record_vote(page.id, choice_id)
        .map_err(|err| match err {
            TreeError::NotFound => VoteError::ChoiceNotFound(raw.to_string()),
            other => VoteError::Tree(other),
        })?;
    info!(page_id = %page.id, choice_id = %choice.id, votes = choice.votes, "vote recorded");

    Ok(VoteOutcome::Recorded {
        choice,
        redirect: PollsSubroute::Result.reverse(page_url),
    })
}
