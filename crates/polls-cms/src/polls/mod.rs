//! Poll pages: listing filter, vote handling, results, editing rules, and HTTP routes.

pub mod editing;
pub mod listing;
pub mod result;
pub mod router;
pub mod subroute;
pub mod viewer;
pub mod views;
pub mod vote;

pub use editing::{EditAction, PageDraft, ValidationErrors};
pub use listing::{index_context, is_publicly_listed, listing, select_polls_pages, ListingPolicy};
pub use result::{result_context, tallies};
pub use router::{admin_router, cms_router, site_router, RequireEditor, SiteState};
pub use subroute::PollsSubroute;
pub use viewer::{EditorTokens, Viewer};
pub use views::PageContext;
pub use vote::{cast_vote, VoteError, VoteForm, VoteOutcome};

#[cfg(test)]
mod tests;
