//! Editor-side validation for page drafts before they reach the content tree.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::content::{
    AuthorId, Choice, ChoiceId, HomePage, NewAuthor, NewPage, Page, PageContent, PageType,
    PollsIndexPage, PollsPage, RichText, AUTHOR_NAME_MAX_LEN, CHOICE_TEXT_MAX_LEN,
};

/// Minimum number of choices a question page is saved with.
pub const MIN_CHOICES: usize = 2;
pub const TITLE_MAX_LEN: usize = 255;
pub const FUTURE_DATE_MESSAGE: &str = "Pages dated in the future must be saved unpublished.";
const REQUIRED_MESSAGE: &str = "This field is required.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    #[default]
    SaveDraft,
    Publish,
}

impl EditAction {
    pub fn publishes(self) -> bool {
        matches!(self, EditAction::Publish)
    }
}

/// Page payload as submitted by an editor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageDraft {
    Home(HomePageDraft),
    PollsIndex(PollsIndexPageDraft),
    Polls(PollsPageDraft),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HomePageDraft {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: RichText,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollsIndexPageDraft {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub intro: RichText,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollsPageDraft {
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub authors: Vec<AuthorId>,
    #[serde(default)]
    pub choices: Vec<ChoiceDraft>,
}

/// Choice as submitted by an editor. Tallies are owned by the tree and never
/// taken from a draft.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChoiceDraft {
    /// Present when editing a choice the page already owns.
    #[serde(default)]
    pub id: Option<ChoiceId>,
    pub choice_text: String,
}

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("submission failed validation")]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl PageDraft {
    pub fn page_type(&self) -> PageType {
        match self {
            PageDraft::Home(_) => PageType::Home,
            PageDraft::PollsIndex(_) => PageType::PollsIndex,
            PageDraft::Polls(_) => PageType::Polls,
        }
    }

    fn title(&self) -> &str {
        match self {
            PageDraft::Home(draft) => &draft.title,
            PageDraft::PollsIndex(draft) => &draft.title,
            PageDraft::Polls(draft) => &draft.title,
        }
    }

    fn slug(&self) -> &str {
        match self {
            PageDraft::Home(draft) => &draft.slug,
            PageDraft::PollsIndex(draft) => &draft.slug,
            PageDraft::Polls(draft) => &draft.slug,
        }
    }

    /// Check the draft against the editing rules for `action` on `today`.
    pub fn validate(
        &self,
        today: NaiveDate,
        action: EditAction,
        known_authors: &BTreeSet<AuthorId>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validate_title(self.title(), &mut errors);
        validate_slug(self.slug(), &mut errors);
        if let PageDraft::Polls(draft) = self {
            draft.validate_into(today, action, known_authors, &mut errors);
        }
        errors.into_result()
    }

    pub fn into_new_page(self, action: EditAction) -> NewPage {
        let (title, slug, content) = self.into_parts();
        NewPage {
            title,
            slug,
            live: action.publishes(),
            content,
        }
    }

    /// Overwrite `page` with this draft. Saving a draft keeps the current live state.
    /// Choice tallies are left to the tree, which keeps them for owned ids.
    pub fn apply_to(self, page: Page, action: EditAction) -> Page {
        let live = page.live || action.publishes();
        let (title, slug, content) = self.into_parts();
        Page {
            title,
            slug,
            live,
            content,
            ..page
        }
    }

    fn into_parts(self) -> (String, String, PageContent) {
        match self {
            PageDraft::Home(draft) => (
                draft.title,
                draft.slug,
                PageContent::Home(HomePage { body: draft.body }),
            ),
            PageDraft::PollsIndex(draft) => (
                draft.title,
                draft.slug,
                PageContent::PollsIndex(PollsIndexPage { intro: draft.intro }),
            ),
            PageDraft::Polls(draft) => {
                let choices = draft
                    .choices
                    .into_iter()
                    .map(|choice| Choice {
                        id: choice.id.unwrap_or(ChoiceId::UNASSIGNED),
                        choice_text: choice.choice_text.trim().to_string(),
                        votes: 0,
                        sort_order: 0,
                    })
                    .collect();
                (
                    draft.title,
                    draft.slug,
                    PageContent::Polls(PollsPage {
                        date: draft.date,
                        authors: draft.authors,
                        choices,
                    }),
                )
            }
        }
    }
}

impl PollsPageDraft {
    fn validate_into(
        &self,
        today: NaiveDate,
        action: EditAction,
        known_authors: &BTreeSet<AuthorId>,
        errors: &mut ValidationErrors,
    ) {
        if self.date > today && action.publishes() {
            errors.add("date", FUTURE_DATE_MESSAGE);
        }

        if self.choices.len() < MIN_CHOICES {
            errors.add(
                "choices",
                format!("At least {MIN_CHOICES} choices are required."),
            );
        }
        let mut seen = BTreeSet::new();
        for (position, choice) in self.choices.iter().enumerate() {
            if let Some(id) = choice.id {
                if !seen.insert(id) {
                    errors.add(
                        format!("choices[{position}].id"),
                        format!("Choice {id} is listed more than once."),
                    );
                }
            }
            let field = format!("choices[{position}].choice_text");
            let text = choice.choice_text.trim();
            if text.is_empty() {
                errors.add(field, REQUIRED_MESSAGE);
            } else if text.chars().count() > CHOICE_TEXT_MAX_LEN {
                errors.add(
                    field,
                    format!("Ensure this value has at most {CHOICE_TEXT_MAX_LEN} characters."),
                );
            }
        }

        for author in &self.authors {
            if !known_authors.contains(author) {
                errors.add("authors", format!("Unknown author {author}."));
            }
        }
    }
}

/// Publishing an existing page applies the same future-date rule as saving.
pub fn check_publishable(page: &Page, today: NaiveDate) -> Result<(), ValidationErrors> {
    match page.as_polls() {
        Some(polls) if polls.is_dated_after(today) => {
            Err(ValidationErrors::single("date", FUTURE_DATE_MESSAGE))
        }
        _ => Ok(()),
    }
}

pub fn validate_new_author(author: &NewAuthor) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let name = author.name.trim();
    if name.is_empty() {
        errors.add("name", REQUIRED_MESSAGE);
    } else if name.chars().count() > AUTHOR_NAME_MAX_LEN {
        errors.add(
            "name",
            format!("Ensure this value has at most {AUTHOR_NAME_MAX_LEN} characters."),
        );
    }
    errors.into_result()
}

fn validate_title(title: &str, errors: &mut ValidationErrors) {
    let title = title.trim();
    if title.is_empty() {
        errors.add("title", REQUIRED_MESSAGE);
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.add(
            "title",
            format!("Ensure this value has at most {TITLE_MAX_LEN} characters."),
        );
    }
}

fn validate_slug(slug: &str, errors: &mut ValidationErrors) {
    if slug.is_empty() {
        errors.add("slug", REQUIRED_MESSAGE);
        return;
    }
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        errors.add(
            "slug",
            "Use only lowercase letters, numbers, underscores or hyphens.",
        );
    }
}
