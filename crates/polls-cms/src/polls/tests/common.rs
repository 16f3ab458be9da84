use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;

use crate::content::{
    Author, AuthorId, Choice, ChoiceId, ContentTree, HomePage, InMemoryContentTree, NewAuthor,
    NewPage, Page, PageContent, PageId, PollsIndexPage, PollsPage, RichText, TreeError,
};
use crate::polls::listing::ListingPolicy;
use crate::polls::router::{cms_router, SiteState};
use crate::polls::viewer::EditorTokens;

pub(super) const EDITOR_TOKEN: &str = "editor-secret";

pub(super) fn past_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 14).expect("valid date")
}

pub(super) fn future_date() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(30)
}

/// Home page with a live `polls` listing page below it.
pub(super) struct Site {
    pub(super) tree: Arc<InMemoryContentTree>,
    pub(super) home: Page,
    pub(super) index: Page,
}

pub(super) fn site() -> Site {
    let tree = Arc::new(InMemoryContentTree::default());
    let home = tree
        .insert(
            None,
            NewPage {
                title: "Home".to_string(),
                slug: "home".to_string(),
                live: true,
                content: PageContent::Home(HomePage {
                    body: RichText::new("<p>Welcome</p>"),
                }),
            },
        )
        .expect("home inserted");
    let index = tree
        .insert(
            Some(home.id),
            NewPage {
                title: "Polls".to_string(),
                slug: "polls".to_string(),
                live: true,
                content: PageContent::PollsIndex(PollsIndexPage {
                    intro: RichText::new("<p>Have your say</p>"),
                }),
            },
        )
        .expect("index inserted");
    Site { tree, home, index }
}

pub(super) fn question_page(slug: &str, date: NaiveDate, live: bool, choices: &[&str]) -> NewPage {
    NewPage {
        title: format!("Question {slug}"),
        slug: slug.to_string(),
        live,
        content: PageContent::Polls(PollsPage {
            date,
            authors: Vec::new(),
            choices: choices.iter().map(|text| Choice::new(*text)).collect(),
        }),
    }
}

impl Site {
    pub(super) fn add_question(
        &self,
        slug: &str,
        date: NaiveDate,
        live: bool,
        choices: &[&str],
    ) -> Page {
        self.tree
            .insert(Some(self.index.id), question_page(slug, date, live, choices))
            .expect("question inserted")
    }

    pub(super) fn add_author(&self, name: &str) -> Author {
        self.tree
            .insert_author(NewAuthor {
                name: name.to_string(),
                image: None,
            })
            .expect("author inserted")
    }

    pub(super) fn reload(&self, page: &Page) -> Page {
        self.tree
            .page(page.id)
            .expect("tree readable")
            .expect("page still exists")
    }

    pub(super) fn router(&self) -> axum::Router {
        router_for(self.tree.clone())
    }
}

pub(super) fn editors() -> EditorTokens {
    EditorTokens::new([("alice", EDITOR_TOKEN)])
}

pub(super) fn router_for<T>(tree: Arc<T>) -> axum::Router
where
    T: ContentTree + 'static,
{
    cms_router(SiteState::new(tree, editors(), ListingPolicy::default()))
}

pub(super) fn votes_of(page: &Page) -> Vec<u32> {
    page.as_polls()
        .expect("question page")
        .ordered_choices()
        .into_iter()
        .map(|choice| choice.votes)
        .collect()
}

pub(super) fn choice_ids(page: &Page) -> Vec<ChoiceId> {
    page.as_polls()
        .expect("question page")
        .ordered_choices()
        .into_iter()
        .map(|choice| choice.id)
        .collect()
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

pub(super) fn editor_get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {EDITOR_TOKEN}"))
        .body(Body::empty())
        .expect("request builds")
}

pub(super) fn vote_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn editor_json(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {EDITOR_TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("payload serializes"),
        ))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableTree;

impl ContentTree for UnavailableTree {
    fn root(&self) -> Result<Option<Page>, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn page(&self, _id: PageId) -> Result<Option<Page>, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn children(&self, _parent: PageId) -> Result<Vec<Page>, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _parent: Option<PageId>, _page: NewPage) -> Result<Page, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _page: Page) -> Result<Page, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn set_live(&self, _id: PageId, _live: bool) -> Result<Page, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: PageId) -> Result<(), TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn record_vote(&self, _page: PageId, _choice: ChoiceId) -> Result<Choice, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn authors(&self) -> Result<Vec<Author>, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn author(&self, _id: AuthorId) -> Result<Option<Author>, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }

    fn insert_author(&self, _author: NewAuthor) -> Result<Author, TreeError> {
        Err(TreeError::Unavailable("database offline".to_string()))
    }
}
