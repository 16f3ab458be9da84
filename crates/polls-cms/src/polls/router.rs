use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::editing::{check_publishable, validate_new_author, EditAction, PageDraft, ValidationErrors};
use super::listing::{index_context, ListingPolicy};
use super::result::result_context;
use super::subroute::PollsSubroute;
use super::viewer::{EditorTokens, Viewer};
use super::views::{HomeContext, PageContext, QuestionContext};
use super::vote::{cast_vote, VoteForm, VoteOutcome};
use crate::content::{
    page_url, resolve, Author, AuthorId, ContentTree, NewAuthor, Page, PageContent, PageId,
    TreeError,
};
use crate::error::AppError;

/// Shared state for the public site and the editor API.
pub struct SiteState<T> {
    pub tree: Arc<T>,
    pub editors: Arc<EditorTokens>,
    pub listing: ListingPolicy,
}

// `derive(Clone)` would demand `T: Clone`; only the `Arc` is cloned.
impl<T> Clone for SiteState<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            editors: self.editors.clone(),
            listing: self.listing,
        }
    }
}

impl<T> SiteState<T>
where
    T: ContentTree + 'static,
{
    pub fn new(tree: Arc<T>, editors: EditorTokens, listing: ListingPolicy) -> Self {
        Self {
            tree,
            editors: Arc::new(editors),
            listing,
        }
    }
}

#[async_trait]
impl<T> FromRequestParts<SiteState<T>> for Viewer
where
    T: ContentTree + 'static,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SiteState<T>,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.editors.identify_headers(&parts.headers))
    }
}

/// Extractor that only succeeds for editors; carries the editor's name.
pub struct RequireEditor(pub String);

#[async_trait]
impl<T> FromRequestParts<SiteState<T>> for RequireEditor
where
    T: ContentTree + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SiteState<T>,
    ) -> Result<Self, Self::Rejection> {
        match state.editors.identify_headers(&parts.headers) {
            Viewer::Editor { name } => Ok(RequireEditor(name)),
            Viewer::Anonymous => Err(AppError::Unauthorized),
        }
    }
}

/// Public site: every path not claimed by another route is resolved against the page tree.
pub fn site_router<T>(state: SiteState<T>) -> Router
where
    T: ContentTree + 'static,
{
    Router::new().fallback(dispatch::<T>).with_state(state)
}

/// Editor API for authors and page management.
pub fn admin_router<T>(state: SiteState<T>) -> Router
where
    T: ContentTree + 'static,
{
    Router::new()
        .route(
            "/admin/api/authors",
            get(list_authors::<T>).post(create_author::<T>),
        )
        .route("/admin/api/pages", post(create_root::<T>))
        .route(
            "/admin/api/pages/:page_id",
            put(update_page::<T>).delete(delete_page::<T>),
        )
        .route(
            "/admin/api/pages/:page_id/children",
            get(list_children::<T>).post(create_child::<T>),
        )
        .route("/admin/api/pages/:page_id/publish", post(publish_page::<T>))
        .route(
            "/admin/api/pages/:page_id/unpublish",
            post(unpublish_page::<T>),
        )
        .with_state(state)
}

/// Site and editor API on one router.
pub fn cms_router<T>(state: SiteState<T>) -> Router
where
    T: ContentTree + 'static,
{
    admin_router(state.clone()).merge(site_router(state))
}

pub(crate) async fn dispatch<T>(
    State(state): State<SiteState<T>>,
    viewer: Viewer,
    method: Method,
    uri: Uri,
    form: Option<Form<VoteForm>>,
) -> Result<Response, AppError>
where
    T: ContentTree + 'static,
{
    let path = uri.path();
    if method == Method::GET || method == Method::HEAD {
        let context = render(&state, &viewer, path)?;
        Ok(Json(context).into_response())
    } else if method == Method::POST {
        let form = form.map(|Form(form)| form).unwrap_or_default();
        submit(&state, &viewer, path, form)
    } else {
        Err(AppError::MethodNotAllowed)
    }
}

fn not_found(path: &str) -> AppError {
    AppError::NotFound(format!("no page at '{path}'"))
}

fn render<T>(state: &SiteState<T>, viewer: &Viewer, path: &str) -> Result<PageContext, AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let resolved =
        resolve(tree, path, viewer.is_authenticated())?.ok_or_else(|| not_found(path))?;
    let page = &resolved.page;
    let url = page_url(tree, page)?;

    match &page.content {
        PageContent::Home(home) if resolved.remainder.is_empty() => {
            Ok(PageContext::HomePage(HomeContext {
                title: page.title.clone(),
                url,
                body: home.body.clone(),
            }))
        }
        PageContent::PollsIndex(_) if resolved.remainder.is_empty() => {
            let context = index_context(tree, page, Utc::now(), viewer, state.listing)?
                .ok_or_else(|| not_found(path))?;
            Ok(PageContext::PollsIndexPage(context))
        }
        PageContent::Polls(polls) => match PollsSubroute::parse(&resolved.remainder) {
            Some(PollsSubroute::Index) => Ok(PageContext::PollsPage(QuestionContext::build(
                tree, page, polls, &url,
            )?)),
            Some(PollsSubroute::Result) => Ok(PageContext::PollsResultPage(result_context(
                tree, page, polls, &url,
            )?)),
            Some(PollsSubroute::Vote) => Err(AppError::MethodNotAllowed),
            None => Err(not_found(path)),
        },
        _ => Err(not_found(path)),
    }
}

fn submit<T>(
    state: &SiteState<T>,
    viewer: &Viewer,
    path: &str,
    form: VoteForm,
) -> Result<Response, AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let resolved =
        resolve(tree, path, viewer.is_authenticated())?.ok_or_else(|| not_found(path))?;

    match (resolved.page.as_polls(), PollsSubroute::parse(&resolved.remainder)) {
        (Some(_), Some(PollsSubroute::Vote)) => {}
        (_, Some(PollsSubroute::Index)) | (Some(_), Some(_)) => {
            return Err(AppError::MethodNotAllowed)
        }
        _ => return Err(not_found(path)),
    }

    let url = page_url(tree, &resolved.page)?;
    match cast_vote(tree, &resolved.page, &url, form)? {
        VoteOutcome::Recorded { redirect, .. } => {
            Ok((StatusCode::FOUND, [(header::LOCATION, redirect)]).into_response())
        }
        VoteOutcome::MissingSelection(context) => {
            Ok((StatusCode::OK, Json(PageContext::PollsPage(context))).into_response())
        }
    }
}

/// Editor request to create or edit a page.
#[derive(Debug, Deserialize)]
pub struct PageEditRequest {
    #[serde(default)]
    pub action: EditAction,
    pub page: PageDraft,
}

#[derive(Debug, Serialize)]
pub struct AdminPageView {
    pub url: String,
    #[serde(flatten)]
    pub page: Page,
}

fn admin_view<T>(tree: &T, page: Page) -> Result<AdminPageView, TreeError>
where
    T: ContentTree + ?Sized,
{
    Ok(AdminPageView {
        url: page_url(tree, &page)?,
        page,
    })
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn known_authors<T>(tree: &T) -> Result<BTreeSet<AuthorId>, TreeError>
where
    T: ContentTree + ?Sized,
{
    Ok(tree.authors()?.into_iter().map(|author| author.id).collect())
}

fn create_page<T>(
    state: &SiteState<T>,
    editor: &str,
    parent: Option<PageId>,
    request: PageEditRequest,
) -> Result<(StatusCode, Json<AdminPageView>), AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let PageEditRequest { action, page } = request;
    page.validate(today(), action, &known_authors(tree)?)?;

    let stored = tree.insert(parent, page.into_new_page(action))?;
    info!(
        editor,
        page_id = %stored.id,
        page_type = %stored.page_type(),
        live = stored.live,
        "page created"
    );
    Ok((StatusCode::CREATED, Json(admin_view(tree, stored)?)))
}

pub(crate) async fn create_root<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Json(request): Json<PageEditRequest>,
) -> Result<(StatusCode, Json<AdminPageView>), AppError>
where
    T: ContentTree + 'static,
{
    create_page(&state, &editor, None, request)
}

pub(crate) async fn create_child<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Path(page_id): Path<u64>,
    Json(request): Json<PageEditRequest>,
) -> Result<(StatusCode, Json<AdminPageView>), AppError>
where
    T: ContentTree + 'static,
{
    create_page(&state, &editor, Some(PageId(page_id)), request)
}

pub(crate) async fn update_page<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Path(page_id): Path<u64>,
    Json(request): Json<PageEditRequest>,
) -> Result<Json<AdminPageView>, AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let existing = tree.page(PageId(page_id))?.ok_or(TreeError::NotFound)?;
    let PageEditRequest { action, page } = request;

    if page.page_type() != existing.page_type() {
        return Err(ValidationErrors::single(
            "type",
            format!(
                "A {} page cannot become a {} page.",
                existing.page_type(),
                page.page_type()
            ),
        )
        .into());
    }

    // A live page stays live, so it is held to the publishing rules.
    let effective = if existing.live {
        EditAction::Publish
    } else {
        action
    };
    page.validate(today(), effective, &known_authors(tree)?)?;

    let stored = tree.update(page.apply_to(existing, action))?;
    info!(editor = %editor, page_id = %stored.id, live = stored.live, "page updated");
    Ok(Json(admin_view(tree, stored)?))
}

pub(crate) async fn publish_page<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Path(page_id): Path<u64>,
) -> Result<Json<AdminPageView>, AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let existing = tree.page(PageId(page_id))?.ok_or(TreeError::NotFound)?;
    check_publishable(&existing, today())?;

    let stored = tree.set_live(existing.id, true)?;
    info!(editor = %editor, page_id = %stored.id, "page published");
    Ok(Json(admin_view(tree, stored)?))
}

pub(crate) async fn unpublish_page<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Path(page_id): Path<u64>,
) -> Result<Json<AdminPageView>, AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let stored = tree.set_live(PageId(page_id), false)?;
    info!(editor = %editor, page_id = %stored.id, "page unpublished");
    Ok(Json(admin_view(tree, stored)?))
}

pub(crate) async fn delete_page<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Path(page_id): Path<u64>,
) -> Result<StatusCode, AppError>
where
    T: ContentTree + 'static,
{
    state.tree.delete(PageId(page_id))?;
    info!(editor = %editor, page_id, "page deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_children<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(_editor): RequireEditor,
    Path(page_id): Path<u64>,
) -> Result<Json<Vec<AdminPageView>>, AppError>
where
    T: ContentTree + 'static,
{
    let tree = state.tree.as_ref();
    let parent = tree.page(PageId(page_id))?.ok_or(TreeError::NotFound)?;
    let views = tree
        .children(parent.id)?
        .into_iter()
        .map(|page| admin_view(tree, page))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

pub(crate) async fn list_authors<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(_editor): RequireEditor,
) -> Result<Json<Vec<Author>>, AppError>
where
    T: ContentTree + 'static,
{
    Ok(Json(state.tree.authors()?))
}

pub(crate) async fn create_author<T>(
    State(state): State<SiteState<T>>,
    RequireEditor(editor): RequireEditor,
    Json(author): Json<NewAuthor>,
) -> Result<(StatusCode, Json<Author>), AppError>
where
    T: ContentTree + 'static,
{
    validate_new_author(&author)?;
    let stored = state.tree.insert_author(NewAuthor {
        name: author.name.trim().to_string(),
        image: author.image,
    })?;
    info!(editor = %editor, author_id = %stored.id, "author created");
    Ok((StatusCode::CREATED, Json(stored)))
}
