use super::domain::Page;
use super::tree::{ContentTree, TreeError};

/// A page matched by URL path plus the segments left for its sub-routes.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub page: Page,
    pub remainder: Vec<String>,
}

/// Walk the tree from the root following the slugs in `path`.
///
/// Draft pages only match when `include_drafts` is set. Matching stops at the first
/// segment with no visible child; that segment and the rest become the remainder.
pub fn resolve<T>(tree: &T, path: &str, include_drafts: bool) -> Result<Option<Resolved>, TreeError>
where
    T: ContentTree + ?Sized,
{
    let Some(mut current) = tree.root()? else {
        return Ok(None);
    };
    if !(current.live || include_drafts) {
        return Ok(None);
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut consumed = 0;
    for segment in &segments {
        let next = tree
            .children(current.id)?
            .into_iter()
            .find(|child| child.slug == *segment && (child.live || include_drafts));
        match next {
            Some(child) => {
                current = child;
                consumed += 1;
            }
            None => break,
        }
    }

    Ok(Some(Resolved {
        page: current,
        remainder: segments[consumed..].iter().map(|s| s.to_string()).collect(),
    }))
}

/// Public URL of `page`: `/` for the root, `/<slug>/.../<slug>/` below it.
pub fn page_url<T>(tree: &T, page: &Page) -> Result<String, TreeError>
where
    T: ContentTree + ?Sized,
{
    let mut slugs = Vec::new();
    let mut cursor = page.clone();
    while let Some(parent_id) = cursor.parent {
        slugs.push(cursor.slug.clone());
        cursor = tree.page(parent_id)?.ok_or(TreeError::NotFound)?;
    }

    if slugs.is_empty() {
        return Ok("/".to_string());
    }
    slugs.reverse();
    Ok(format!("/{}/", slugs.join("/")))
}
