use super::domain::{Author, AuthorId, Choice, ChoiceId, NewAuthor, NewPage, Page, PageId};

/// Page-tree storage the poll logic runs against.
///
/// Hierarchy, publishing state, and reference data live behind this trait so the
/// listing, vote, and result handlers can be exercised against any backend.
pub trait ContentTree: Send + Sync {
    fn root(&self) -> Result<Option<Page>, TreeError>;
    fn page(&self, id: PageId) -> Result<Option<Page>, TreeError>;
    /// Direct children of `parent`, in creation order.
    fn children(&self, parent: PageId) -> Result<Vec<Page>, TreeError>;
    fn insert(&self, parent: Option<PageId>, page: NewPage) -> Result<Page, TreeError>;
    /// Replaces a page's fields. Choice tallies are not taken from `page`: choices
    /// the page already owns keep their stored count and new ones start at zero.
    fn update(&self, page: Page) -> Result<Page, TreeError>;
    fn set_live(&self, id: PageId, live: bool) -> Result<Page, TreeError>;
    /// Removes the page and its subtree, including every owned choice.
    fn delete(&self, id: PageId) -> Result<(), TreeError>;
    /// Adds one vote to a choice owned by `page` as a single storage operation.
    fn record_vote(&self, page: PageId, choice: ChoiceId) -> Result<Choice, TreeError>;
    fn authors(&self) -> Result<Vec<Author>, TreeError>;
    fn author(&self, id: AuthorId) -> Result<Option<Author>, TreeError>;
    fn insert_author(&self, author: NewAuthor) -> Result<Author, TreeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),
    #[error("content tree unavailable: {0}")]
    Unavailable(String),
}
