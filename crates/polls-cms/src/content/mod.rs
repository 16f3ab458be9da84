//! Page-tree capability: page types, storage seam, in-memory backend, and URL resolution.

pub mod domain;
pub mod memory;
pub mod routing;
pub mod tree;

pub use domain::{
    Author, AuthorId, Choice, ChoiceId, HomePage, ImageRef, NewAuthor, NewPage, Page,
    PageContent, PageId, PageType, PollsIndexPage, PollsPage, RichText, AUTHOR_NAME_MAX_LEN,
    CHOICE_TEXT_MAX_LEN,
};
pub use memory::InMemoryContentTree;
pub use routing::{page_url, resolve, Resolved};
pub use tree::{ContentTree, TreeError};
