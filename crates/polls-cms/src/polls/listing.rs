use chrono::{DateTime, NaiveDate, Utc};

use super::viewer::Viewer;
use super::views::{PollsIndexContext, PollsPageSummary};
use crate::content::{page_url, ContentTree, Page, TreeError};

/// Number of question pages shown to anonymous visitors.
pub const PUBLIC_LISTING_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPolicy {
    pub public_limit: usize,
}

impl Default for ListingPolicy {
    fn default() -> Self {
        Self {
            public_limit: PUBLIC_LISTING_LIMIT,
        }
    }
}

/// A question page is public once it is live, dated today or earlier, and has a
/// choice with text.
pub fn is_publicly_listed(page: &Page, today: NaiveDate) -> bool {
    page.live
        && page
            .as_polls()
            .is_some_and(|polls| !polls.is_dated_after(today) && polls.has_answerable_choice())
}

/// Filter and order a listing page's children for `viewer`.
///
/// Only live question pages are listed. Editors also see future-dated and
/// choiceless pages, uncapped; everyone else sees the public subset, capped.
/// Both are newest-first by creation order.
pub fn select_polls_pages(
    children: Vec<Page>,
    now: DateTime<Utc>,
    viewer: &Viewer,
    policy: ListingPolicy,
) -> Vec<Page> {
    let today = now.date_naive();
    let editor = viewer.is_authenticated();

    let mut pages: Vec<Page> = children
        .into_iter()
        .filter(|page| page.live && page.as_polls().is_some())
        .filter(|page| editor || is_publicly_listed(page, today))
        .collect();
    pages.sort_by(|a, b| b.id.cmp(&a.id));

    if !editor {
        pages.truncate(policy.public_limit);
    }
    pages
}

pub fn listing<T>(
    tree: &T,
    index: &Page,
    now: DateTime<Utc>,
    viewer: &Viewer,
    policy: ListingPolicy,
) -> Result<Vec<PollsPageSummary>, TreeError>
where
    T: ContentTree + ?Sized,
{
    let base = page_url(tree, index)?;
    let children = tree.children(index.id)?;

    Ok(select_polls_pages(children, now, viewer, policy)
        .iter()
        .filter_map(|page| {
            page.as_polls()
                .map(|polls| PollsPageSummary::from_page(page, polls, &base))
        })
        .collect())
}

/// Full render context for a listing page; `None` when `index` is not one.
pub fn index_context<T>(
    tree: &T,
    index: &Page,
    now: DateTime<Utc>,
    viewer: &Viewer,
    policy: ListingPolicy,
) -> Result<Option<PollsIndexContext>, TreeError>
where
    T: ContentTree + ?Sized,
{
    let Some(intro) = index.as_polls_index().map(|page| page.intro.clone()) else {
        return Ok(None);
    };

    Ok(Some(PollsIndexContext {
        title: index.title.clone(),
        url: page_url(tree, index)?,
        intro,
        pollspages: listing(tree, index, now, viewer, policy)?,
    }))
}
