use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on a choice's display text.
pub const CHOICE_TEXT_MAX_LEN: usize = 250;
/// Upper bound on an author's display name.
pub const AUTHOR_NAME_MAX_LEN: usize = 255;

/// Identifier of a node in the page tree. Assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a choice owned by a question page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(pub u64);

impl ChoiceId {
    /// Placeholder carried by choices the tree has not stored yet.
    pub const UNASSIGNED: ChoiceId = ChoiceId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub u64);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editor-authored markup, stored and served verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub String);

impl RichText {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to an image held by the host's media storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

/// The page types known to the site and the places they may live in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    PollsIndex,
    Polls,
}

impl PageType {
    pub const fn label(self) -> &'static str {
        match self {
            PageType::Home => "home",
            PageType::PollsIndex => "polls_index",
            PageType::Polls => "polls",
        }
    }

    /// Page types allowed directly beneath this one.
    pub const fn subpage_types(self) -> &'static [PageType] {
        match self {
            PageType::Home => &[PageType::PollsIndex],
            PageType::PollsIndex => &[PageType::Polls],
            PageType::Polls => &[],
        }
    }

    /// Whether a page of this type may be created under `parent`; `None` is the tree root.
    pub fn can_create_at(self, parent: Option<PageType>) -> bool {
        match parent {
            None => self == PageType::Home,
            Some(parent) => parent.subpage_types().contains(&self),
        }
    }

    /// Parent types that accept this page type.
    pub fn allowed_parent_types(self) -> Vec<PageType> {
        [PageType::Home, PageType::PollsIndex, PageType::Polls]
            .into_iter()
            .filter(|parent| self.can_create_at(Some(*parent)))
            .collect()
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A node of the page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub parent: Option<PageId>,
    pub title: String,
    pub slug: String,
    pub live: bool,
    pub content: PageContent,
}

impl Page {
    pub fn page_type(&self) -> PageType {
        self.content.page_type()
    }

    pub fn as_polls(&self) -> Option<&PollsPage> {
        match &self.content {
            PageContent::Polls(polls) => Some(polls),
            _ => None,
        }
    }

    pub fn as_polls_index(&self) -> Option<&PollsIndexPage> {
        match &self.content {
            PageContent::PollsIndex(index) => Some(index),
            _ => None,
        }
    }
}

/// Type-specific fields of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageContent {
    Home(HomePage),
    PollsIndex(PollsIndexPage),
    Polls(PollsPage),
}

impl PageContent {
    pub fn page_type(&self) -> PageType {
        match self {
            PageContent::Home(_) => PageType::Home,
            PageContent::PollsIndex(_) => PageType::PollsIndex,
            PageContent::Polls(_) => PageType::Polls,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomePage {
    #[serde(default)]
    pub body: RichText,
}

/// Listing page: introduces and links its child question pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollsIndexPage {
    #[serde(default)]
    pub intro: RichText,
}

/// Question page owning an ordered set of choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollsPage {
    pub date: NaiveDate,
    #[serde(default)]
    pub authors: Vec<AuthorId>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl PollsPage {
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == id)
    }

    /// True when at least one choice carries non-blank text.
    pub fn has_answerable_choice(&self) -> bool {
        self.choices
            .iter()
            .any(|choice| !choice.choice_text.trim().is_empty())
    }

    pub fn is_dated_after(&self, today: NaiveDate) -> bool {
        self.date > today
    }

    /// Choices in editor order.
    pub fn ordered_choices(&self) -> Vec<&Choice> {
        let mut choices: Vec<&Choice> = self.choices.iter().collect();
        choices.sort_by_key(|choice| (choice.sort_order, choice.id));
        choices
    }

    pub fn total_votes(&self) -> u64 {
        self.choices.iter().map(|choice| u64::from(choice.votes)).sum()
    }
}

/// One selectable option of a question page and its running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default = "unassigned_choice")]
    pub id: ChoiceId,
    pub choice_text: String,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub sort_order: u32,
}

fn unassigned_choice() -> ChoiceId {
    ChoiceId::UNASSIGNED
}

impl Choice {
    pub fn new(choice_text: impl Into<String>) -> Self {
        Self {
            id: ChoiceId::UNASSIGNED,
            choice_text: choice_text.into(),
            votes: 0,
            sort_order: 0,
        }
    }
}

/// Reusable reference data attached to question pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Page payload handed to the tree for insertion. Ids are assigned by the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    pub live: bool,
    pub content: PageContent,
}

impl NewPage {
    pub fn page_type(&self) -> PageType {
        self.content.page_type()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}
