use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Author, AuthorId, Choice, ChoiceId, NewAuthor, NewPage, Page, PageContent, PageId,
};
use super::tree::{ContentTree, TreeError};

/// Mutex-guarded tree used by the service, the demo, and the tests.
#[derive(Default, Clone)]
pub struct InMemoryContentTree {
    state: Arc<Mutex<TreeState>>,
}

#[derive(Default)]
struct TreeState {
    pages: BTreeMap<PageId, Page>,
    authors: BTreeMap<AuthorId, Author>,
    last_page: u64,
    last_choice: u64,
    last_author: u64,
}

impl TreeState {
    fn next_page_id(&mut self) -> PageId {
        self.last_page += 1;
        PageId(self.last_page)
    }

    fn next_choice_id(&mut self) -> ChoiceId {
        self.last_choice += 1;
        ChoiceId(self.last_choice)
    }

    fn next_author_id(&mut self) -> AuthorId {
        self.last_author += 1;
        AuthorId(self.last_author)
    }

    fn slug_taken(&self, parent: Option<PageId>, slug: &str, except: Option<PageId>) -> bool {
        self.pages.values().any(|page| {
            page.parent == parent && page.slug == slug && Some(page.id) != except
        })
    }

    /// Gives fresh ids to choices the page does not own yet and renumbers editor order.
    ///
    /// Tallies come from `stored`, never from the submitted choice: an owned id
    /// keeps its count, and new or repeated entries start at zero.
    fn assign_choices(
        &mut self,
        content: &mut PageContent,
        stored: &BTreeMap<ChoiceId, u32>,
    ) -> Result<(), TreeError> {
        if let PageContent::Polls(polls) = content {
            let mut seen = BTreeSet::new();
            for (position, choice) in polls.choices.iter_mut().enumerate() {
                match stored.get(&choice.id) {
                    Some(votes) if seen.insert(choice.id) => choice.votes = *votes,
                    _ => {
                        choice.id = self.next_choice_id();
                        choice.votes = 0;
                    }
                }
                choice.sort_order = u32::try_from(position).map_err(|_| {
                    TreeError::InvalidPlacement("too many choices on one page".to_string())
                })?;
            }
        }
        Ok(())
    }

    fn subtree(&self, root: PageId) -> Vec<PageId> {
        let mut collected = vec![root];
        let mut cursor = 0;
        while cursor < collected.len() {
            let current = collected[cursor];
            collected.extend(
                self.pages
                    .values()
                    .filter(|page| page.parent == Some(current))
                    .map(|page| page.id),
            );
            cursor += 1;
        }
        collected
    }
}

fn stored_tallies(page: &Page) -> BTreeMap<ChoiceId, u32> {
    page.as_polls()
        .map(|polls| {
            polls
                .choices
                .iter()
                .map(|choice| (choice.id, choice.votes))
                .collect()
        })
        .unwrap_or_default()
}

impl InMemoryContentTree {
    fn lock(&self) -> Result<MutexGuard<'_, TreeState>, TreeError> {
        self.state
            .lock()
            .map_err(|_| TreeError::Unavailable("content tree lock poisoned".to_string()))
    }
}

impl ContentTree for InMemoryContentTree {
    fn root(&self) -> Result<Option<Page>, TreeError> {
        let guard = self.lock()?;
        Ok(guard
            .pages
            .values()
            .find(|page| page.parent.is_none())
            .cloned())
    }

    fn page(&self, id: PageId) -> Result<Option<Page>, TreeError> {
        let guard = self.lock()?;
        Ok(guard.pages.get(&id).cloned())
    }

    fn children(&self, parent: PageId) -> Result<Vec<Page>, TreeError> {
        let guard = self.lock()?;
        Ok(guard
            .pages
            .values()
            .filter(|page| page.parent == Some(parent))
            .cloned()
            .collect())
    }

    fn insert(&self, parent: Option<PageId>, page: NewPage) -> Result<Page, TreeError> {
        let mut guard = self.lock()?;

        let parent_type = match parent {
            Some(parent_id) => Some(
                guard
                    .pages
                    .get(&parent_id)
                    .ok_or(TreeError::NotFound)?
                    .page_type(),
            ),
            None => None,
        };

        let page_type = page.page_type();
        if !page_type.can_create_at(parent_type) {
            let location = parent_type
                .map(|parent| format!("under {parent} pages"))
                .unwrap_or_else(|| "at the tree root".to_string());
            return Err(TreeError::InvalidPlacement(format!(
                "{page_type} pages cannot be created {location}"
            )));
        }

        if parent.is_none() && guard.pages.values().any(|page| page.parent.is_none()) {
            return Err(TreeError::Conflict);
        }
        if guard.slug_taken(parent, &page.slug, None) {
            return Err(TreeError::Conflict);
        }

        let NewPage {
            title,
            slug,
            live,
            mut content,
        } = page;
        guard.assign_choices(&mut content, &BTreeMap::new())?;

        let stored = Page {
            id: guard.next_page_id(),
            parent,
            title,
            slug,
            live,
            content,
        };
        guard.pages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, page: Page) -> Result<Page, TreeError> {
        let mut guard = self.lock()?;
        let existing = guard.pages.get(&page.id).ok_or(TreeError::NotFound)?;

        if existing.page_type() != page.page_type() {
            return Err(TreeError::InvalidPlacement(format!(
                "a {} page cannot become a {} page",
                existing.page_type(),
                page.page_type()
            )));
        }

        let parent = existing.parent;
        let tallies = stored_tallies(existing);
        if guard.slug_taken(parent, &page.slug, Some(page.id)) {
            return Err(TreeError::Conflict);
        }

        let Page {
            id,
            title,
            slug,
            live,
            mut content,
            ..
        } = page;
        guard.assign_choices(&mut content, &tallies)?;

        let stored = Page {
            id,
            parent,
            title,
            slug,
            live,
            content,
        };
        guard.pages.insert(id, stored.clone());
        Ok(stored)
    }

    fn set_live(&self, id: PageId, live: bool) -> Result<Page, TreeError> {
        let mut guard = self.lock()?;
        let page = guard.pages.get_mut(&id).ok_or(TreeError::NotFound)?;
        page.live = live;
        Ok(page.clone())
    }

    fn delete(&self, id: PageId) -> Result<(), TreeError> {
        let mut guard = self.lock()?;
        if !guard.pages.contains_key(&id) {
            return Err(TreeError::NotFound);
        }
        for page_id in guard.subtree(id) {
            guard.pages.remove(&page_id);
        }
        Ok(())
    }

    fn record_vote(&self, page: PageId, choice: ChoiceId) -> Result<Choice, TreeError> {
        let mut guard = self.lock()?;
        let stored = guard.pages.get_mut(&page).ok_or(TreeError::NotFound)?;
        let PageContent::Polls(polls) = &mut stored.content else {
            return Err(TreeError::NotFound);
        };
        let target = polls
            .choices
            .iter_mut()
            .find(|candidate| candidate.id == choice)
            .ok_or(TreeError::NotFound)?;
        target.votes = target.votes.saturating_add(1);
        Ok(target.clone())
    }

    fn authors(&self) -> Result<Vec<Author>, TreeError> {
        let guard = self.lock()?;
        Ok(guard.authors.values().cloned().collect())
    }

    fn author(&self, id: AuthorId) -> Result<Option<Author>, TreeError> {
        let guard = self.lock()?;
        Ok(guard.authors.get(&id).cloned())
    }

    fn insert_author(&self, author: NewAuthor) -> Result<Author, TreeError> {
        let mut guard = self.lock()?;
        let stored = Author {
            id: guard.next_author_id(),
            name: author.name,
            image: author.image,
        };
        guard.authors.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::domain::{HomePage, PollsIndexPage, PollsPage};
    use chrono::NaiveDate;
    use std::thread;

    fn home() -> NewPage {
        NewPage {
            title: "Home".to_string(),
            slug: "home".to_string(),
            live: true,
            content: PageContent::Home(HomePage::default()),
        }
    }

    fn index(slug: &str) -> NewPage {
        NewPage {
            title: "Polls".to_string(),
            slug: slug.to_string(),
            live: true,
            content: PageContent::PollsIndex(PollsIndexPage::default()),
        }
    }

    fn question(slug: &str, choices: &[&str]) -> NewPage {
        NewPage {
            title: slug.to_string(),
            slug: slug.to_string(),
            live: true,
            content: PageContent::Polls(PollsPage {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
                authors: Vec::new(),
                choices: choices.iter().map(|text| Choice::new(*text)).collect(),
            }),
        }
    }

    fn seeded() -> (InMemoryContentTree, Page, Page, Page) {
        let tree = InMemoryContentTree::default();
        let root = tree.insert(None, home()).expect("root inserts");
        let polls = tree.insert(Some(root.id), index("polls")).expect("index inserts");
        let question = tree
            .insert(Some(polls.id), question("lunch", &["Pizza", "Salad"]))
            .expect("question inserts");
        (tree, root, polls, question)
    }

    #[test]
    fn insert_assigns_ids_and_choice_order() {
        let (tree, root, polls, question) = seeded();

        assert_eq!(root.id, PageId(1));
        assert_eq!(polls.parent, Some(root.id));
        let choices = &question.as_polls().expect("question page").choices;
        assert_eq!(choices[0].id, ChoiceId(1));
        assert_eq!(choices[1].id, ChoiceId(2));
        assert_eq!(choices[1].sort_order, 1);
        assert_eq!(tree.children(polls.id).expect("children").len(), 1);
        assert_eq!(tree.root().expect("root").map(|page| page.id), Some(root.id));
    }

    #[test]
    fn insert_enforces_hierarchy_rules() {
        let (tree, root, polls, question) = seeded();

        let misplaced = tree.insert(Some(root.id), question_page("stray"));
        assert!(matches!(misplaced, Err(TreeError::InvalidPlacement(_))));

        let nested_index = tree.insert(Some(question.id), index("nested"));
        assert!(matches!(nested_index, Err(TreeError::InvalidPlacement(_))));

        let second_root = tree.insert(None, home());
        assert!(matches!(second_root, Err(TreeError::Conflict)));

        let orphan = tree.insert(Some(PageId(99)), index("orphan"));
        assert!(matches!(orphan, Err(TreeError::NotFound)));

        let duplicate = tree.insert(Some(polls.id), question_page("lunch"));
        assert!(matches!(duplicate, Err(TreeError::Conflict)));
    }

    fn question_page(slug: &str) -> NewPage {
        question(slug, &["A", "B"])
    }

    #[test]
    fn delete_cascades_to_descendants() {
        let (tree, root, polls, question) = seeded();

        tree.delete(polls.id).expect("delete succeeds");

        assert!(tree.page(polls.id).expect("lookup").is_none());
        assert!(tree.page(question.id).expect("lookup").is_none());
        assert!(tree.page(root.id).expect("lookup").is_some());
        assert!(matches!(
            tree.record_vote(question.id, ChoiceId(1)),
            Err(TreeError::NotFound)
        ));
    }

    #[test]
    fn record_vote_only_touches_owned_choices() {
        let (tree, _, polls, lunch) = seeded();
        let other = tree
            .insert(Some(polls.id), question("dinner", &["Soup"]))
            .expect("second question");
        let foreign = other.as_polls().expect("question page").choices[0].id;

        let updated = tree
            .record_vote(lunch.id, ChoiceId(1))
            .expect("vote recorded");
        assert_eq!(updated.votes, 1);

        assert!(matches!(
            tree.record_vote(lunch.id, foreign),
            Err(TreeError::NotFound)
        ));
        assert!(matches!(
            tree.record_vote(polls.id, ChoiceId(1)),
            Err(TreeError::NotFound)
        ));

        let stored = tree.page(lunch.id).expect("lookup").expect("present");
        let votes: Vec<u32> = stored
            .as_polls()
            .expect("question page")
            .choices
            .iter()
            .map(|choice| choice.votes)
            .collect();
        assert_eq!(votes, vec![1, 0]);
    }

    #[test]
    fn concurrent_votes_are_not_lost() {
        let (tree, _, _, question) = seeded();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tree = tree.clone();
                let page = question.id;
                thread::spawn(move || {
                    for _ in 0..50 {
                        tree.record_vote(page, ChoiceId(2)).expect("vote recorded");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("voter thread");
        }

        let stored = tree.page(question.id).expect("lookup").expect("present");
        let choice = stored
            .as_polls()
            .expect("question page")
            .choice(ChoiceId(2))
            .expect("choice present")
            .clone();
        assert_eq!(choice.votes, 400);
    }

    #[test]
    fn update_keeps_owned_choice_ids_and_assigns_new_ones() {
        let (tree, _, _, question) = seeded();
        tree.record_vote(question.id, ChoiceId(1)).expect("vote");

        let mut edited = tree.page(question.id).expect("lookup").expect("present");
        if let PageContent::Polls(polls) = &mut edited.content {
            polls.choices.remove(1);
            polls.choices.push(Choice::new("Tacos"));
        }
        let stored = tree.update(edited).expect("update succeeds");

        let choices = &stored.as_polls().expect("question page").choices;
        assert_eq!(choices[0].id, ChoiceId(1));
        assert_eq!(choices[0].votes, 1);
        assert_eq!(choices[1].id, ChoiceId(3));
        assert_eq!(choices[1].sort_order, 1);
    }

    #[test]
    fn update_keeps_votes_cast_after_the_page_was_read() {
        let (tree, _, _, question) = seeded();
        let mut edited = tree.page(question.id).expect("lookup").expect("present");
        tree.record_vote(question.id, ChoiceId(1)).expect("vote");
        tree.record_vote(question.id, ChoiceId(2)).expect("vote");

        edited.title = "Lunch today".to_string();
        let stored = tree.update(edited).expect("update succeeds");

        let votes: Vec<u32> = stored
            .as_polls()
            .expect("question page")
            .choices
            .iter()
            .map(|choice| choice.votes)
            .collect();
        assert_eq!(stored.title, "Lunch today");
        assert_eq!(votes, vec![1, 1]);
    }

    #[test]
    fn update_ignores_submitted_tallies() {
        let (tree, _, _, question) = seeded();
        tree.record_vote(question.id, ChoiceId(1)).expect("vote");

        let mut edited = tree.page(question.id).expect("lookup").expect("present");
        if let PageContent::Polls(polls) = &mut edited.content {
            polls.choices[0].votes = 500;
            polls.choices[1].votes = 7;
            let mut fresh = Choice::new("Tacos");
            fresh.votes = 9;
            polls.choices.push(fresh);
        }
        let stored = tree.update(edited).expect("update succeeds");

        let votes: Vec<u32> = stored
            .as_polls()
            .expect("question page")
            .choices
            .iter()
            .map(|choice| choice.votes)
            .collect();
        assert_eq!(votes, vec![1, 0, 0]);
    }

    #[test]
    fn repeated_choice_ids_become_new_choices() {
        let (tree, _, _, question) = seeded();
        tree.record_vote(question.id, ChoiceId(1)).expect("vote");

        let mut edited = tree.page(question.id).expect("lookup").expect("present");
        if let PageContent::Polls(polls) = &mut edited.content {
            let copy = polls.choices[0].clone();
            polls.choices.push(copy);
        }
        let stored = tree.update(edited).expect("update succeeds");

        let polls = stored.as_polls().expect("question page");
        assert_eq!(polls.choices[0].id, ChoiceId(1));
        assert_eq!(polls.choices[0].votes, 1);
        assert_eq!(polls.choices[2].id, ChoiceId(3));
        assert_eq!(polls.choices[2].votes, 0);
        assert_eq!(polls.total_votes(), 1);
    }

    #[test]
    fn update_rejects_type_changes() {
        let (tree, _, polls, _) = seeded();
        let mut edited = tree.page(polls.id).expect("lookup").expect("present");
        edited.content = PageContent::Home(HomePage::default());

        assert!(matches!(
            tree.update(edited),
            Err(TreeError::InvalidPlacement(_))
        ));
    }

    #[test]
    fn set_live_toggles_publication() {
        let (tree, _, _, question) = seeded();
        let draft = tree.set_live(question.id, false).expect("unpublish");
        assert!(!draft.live);
        assert!(matches!(
            tree.set_live(PageId(42), true),
            Err(TreeError::NotFound)
        ));
    }

    #[test]
    fn authors_are_independent_reference_data() {
        let tree = InMemoryContentTree::default();
        let author = tree
            .insert_author(NewAuthor {
                name: "Ada".to_string(),
                image: None,
            })
            .expect("author inserts");

        assert_eq!(author.id, AuthorId(1));
        assert_eq!(tree.authors().expect("authors").len(), 1);
        assert_eq!(
            tree.author(author.id).expect("lookup").map(|a| a.name),
            Some("Ada".to_string())
        );
    }
}
