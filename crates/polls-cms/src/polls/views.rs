use chrono::NaiveDate;
use serde::Serialize;

use crate::content::{
    Author, AuthorId, ChoiceId, ContentTree, ImageRef, Page, PageId, PollsPage, RichText,
    TreeError,
};

/// Render context for any servable page, tagged with the template it feeds.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum PageContext {
    HomePage(HomeContext),
    PollsIndexPage(PollsIndexContext),
    PollsPage(QuestionContext),
    PollsResultPage(ResultContext),
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeContext {
    pub title: String,
    pub url: String,
    pub body: RichText,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollsIndexContext {
    pub title: String,
    pub url: String,
    pub intro: RichText,
    pub pollspages: Vec<PollsPageSummary>,
}

/// Link entry for a question page on its listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollsPageSummary {
    pub id: PageId,
    pub title: String,
    pub url: String,
    pub date: NaiveDate,
}

impl PollsPageSummary {
    /// `parent_url` is the listing page's URL, always ending in `/`.
    pub fn from_page(page: &Page, polls: &PollsPage, parent_url: &str) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            url: format!("{parent_url}{}/", page.slug),
            date: polls.date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionContext {
    pub id: PageId,
    pub title: String,
    pub url: String,
    pub date: NaiveDate,
    pub authors: Vec<AuthorView>,
    pub choices: Vec<ChoiceView>,
    pub error_message: Option<String>,
}

impl QuestionContext {
    pub fn build<T>(tree: &T, page: &Page, polls: &PollsPage, url: &str) -> Result<Self, TreeError>
    where
        T: ContentTree + ?Sized,
    {
        Ok(Self {
            id: page.id,
            title: page.title.clone(),
            url: url.to_string(),
            date: polls.date,
            authors: author_views(tree, &polls.authors)?,
            choices: polls
                .ordered_choices()
                .into_iter()
                .map(|choice| ChoiceView {
                    id: choice.id,
                    choice_text: choice.choice_text.clone(),
                })
                .collect(),
            error_message: None,
        })
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub id: ChoiceId,
    pub choice_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultContext {
    pub id: PageId,
    pub title: String,
    pub url: String,
    pub date: NaiveDate,
    pub authors: Vec<AuthorView>,
    pub choices: Vec<ChoiceTally>,
    pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceTally {
    pub id: ChoiceId,
    pub choice_text: String,
    pub votes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: AuthorId,
    pub name: String,
    pub image: Option<ImageRef>,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
            image: author.image,
        }
    }
}

/// Authors that no longer exist are skipped rather than failing the render.
pub(crate) fn author_views<T>(tree: &T, ids: &[AuthorId]) -> Result<Vec<AuthorView>, TreeError>
where
    T: ContentTree + ?Sized,
{
    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(author) = tree.author(*id)? {
            views.push(author.into());
        }
    }
    Ok(views)
}
