use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use polls_cms::content::InMemoryContentTree;
use polls_cms::polls::{cms_router, EditorTokens, ListingPolicy, SiteState};
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "workflow-token";

fn router(tree: Arc<InMemoryContentTree>) -> Router {
    cms_router(SiteState::new(
        tree,
        EditorTokens::new([("editor", TOKEN)]),
        ListingPolicy::default(),
    ))
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn editor_post(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

async fn create(router: &Router, uri: &str, payload: Value) -> Value {
    let response = send(router, editor_post(uri, payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED, "creating via {uri}");
    json_body(response).await
}

#[tokio::test]
async fn editor_builds_a_poll_and_visitors_vote_on_it() {
    let tree = Arc::new(InMemoryContentTree::default());
    let router = router(tree);

    let author = create(
        &router,
        "/admin/api/authors",
        json!({ "name": "Ada Lovelace" }),
    )
    .await;
    let home = create(
        &router,
        "/admin/api/pages",
        json!({
            "action": "publish",
            "page": { "type": "home", "title": "Home", "slug": "home", "body": "<p>Hi</p>" }
        }),
    )
    .await;
    let index = create(
        &router,
        &format!("/admin/api/pages/{}/children", home["id"]),
        json!({
            "action": "publish",
            "page": { "type": "polls_index", "title": "Polls", "slug": "polls" }
        }),
    )
    .await;
    let question = create(
        &router,
        &format!("/admin/api/pages/{}/children", index["id"]),
        json!({
            "action": "publish",
            "page": {
                "type": "polls",
                "title": "Which editor?",
                "slug": "editor",
                "date": "2024-03-14",
                "authors": [author["id"]],
                "choices": [
                    { "choice_text": "Vim" },
                    { "choice_text": "Emacs" }
                ]
            }
        }),
    )
    .await;
    assert_eq!(question["url"], "/polls/editor/");

    let listing = json_body(send(&router, get("/polls/")).await).await;
    assert_eq!(listing["pollspages"][0]["title"], "Which editor?");

    let page = json_body(send(&router, get("/polls/editor/")).await).await;
    assert_eq!(page["authors"][0]["name"], "Ada Lovelace");
    let first_choice = page["choices"][0]["id"].as_u64().expect("choice id");

    let before = json_body(send(&router, get("/polls/editor/result/")).await).await;
    assert_eq!(before["choices"][0]["votes"], 0);
    assert_eq!(before["choices"][1]["votes"], 0);

    let vote = Request::post("/polls/editor/vote/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("choice={first_choice}")))
        .expect("request builds");
    let response = send(&router, vote).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/polls/editor/result/"
    );

    let after = json_body(send(&router, get("/polls/editor/result/")).await).await;
    assert_eq!(after["template"], "polls_result_page");
    assert_eq!(after["choices"][0]["choice_text"], "Vim");
    assert_eq!(after["choices"][0]["votes"], 1);
    assert_eq!(after["choices"][1]["votes"], 0);
    assert_eq!(after["total_votes"], 1);
}
