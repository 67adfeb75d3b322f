use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared::protocol::WireTerm;
use tokio::{net::TcpListener, sync::Mutex};

const GROUP: &str = "a66b7b2f-9f5d-4573-b763-542518574351";
const SET: &str = "f6fc9802-3af3-4200-92de-9fe5f4af4fd2";

#[derive(Clone, Default)]
struct StoreState {
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

#[derive(Debug, Clone)]
struct SeenRequest {
    group: String,
    set: String,
    term: String,
    select: Option<String>,
    authorization: Option<String>,
}

async fn children(
    State(state): State<StoreState>,
    Path((group, set, term)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.requests.lock().await.push(SeenRequest {
        group,
        set,
        term: term.clone(),
        select: query.get("select").cloned(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    });

    match term.as_str() {
        "anchor" => Json(json!({
            "value": [
                WireTerm::labelled("a", "North"),
                WireTerm::labelled("b", "South"),
            ]
        }))
        .into_response(),
        "leaf" | "a b/c" => Json(json!({ "value": [] })).into_response(),
        "down" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
        "garbled" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "unlabelled" => Json(json!({ "value": [{ "id": "x", "labels": [] }] })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_term_store(state: StoreState) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(
            "/sites/hr/_api/v2.1/termStore/groups/:group/sets/:set/terms/:term/children",
            get(children),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/sites/hr/"))
}

fn id(raw: &str) -> TermId {
    TermId::new(raw).expect("id")
}

async fn repository() -> (HttpTermRepository, StoreState) {
    let state = StoreState::default();
    let site_url = spawn_term_store(state.clone()).await.expect("spawn store");
    let endpoint = TermStoreEndpoint::new(&site_url, GROUP, SET).expect("endpoint");
    (HttpTermRepository::new(endpoint), state)
}

#[test]
fn children_url_follows_term_store_layout() {
    let endpoint =
        TermStoreEndpoint::new("https://contoso.sharepoint.com/sites/hr", GROUP, SET)
            .expect("endpoint");
    let url = endpoint.children_url(&id("e8e6feb5-1cf7-47bd-afb7-e352b78bd365"));
    assert_eq!(
        url.as_str(),
        format!(
            "https://contoso.sharepoint.com/sites/hr/_api/v2.1/termStore/groups/{GROUP}/sets/{SET}/terms/e8e6feb5-1cf7-47bd-afb7-e352b78bd365/children?select=*"
        )
    );
}

#[test]
fn endpoint_rejects_bad_configuration() {
    assert!(matches!(
        TermStoreEndpoint::new("not a url", GROUP, SET),
        Err(EndpointError::InvalidSiteUrl(_))
    ));
    assert!(matches!(
        TermStoreEndpoint::new("mailto:someone@example.com", GROUP, SET),
        Err(EndpointError::NotABase(_))
    ));
    assert!(matches!(
        TermStoreEndpoint::new("https://contoso.sharepoint.com", " ", SET),
        Err(EndpointError::MissingIdentifier(_))
    ));
}

#[tokio::test]
async fn fetches_children_in_store_order() {
    let (repo, state) = repository().await;

    let terms = repo.fetch_children(&id("anchor")).await.expect("children");
    assert_eq!(
        terms,
        vec![Term::new(id("a"), "North"), Term::new(id("b"), "South")]
    );

    let seen = state.requests.lock().await.clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].group, GROUP);
    assert_eq!(seen[0].set, SET);
    assert_eq!(seen[0].select.as_deref(), Some("*"));
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn leaf_returns_empty_list() {
    let (repo, _) = repository().await;
    let terms = repo.fetch_children(&id("leaf")).await.expect("children");
    assert!(terms.is_empty());
}

#[tokio::test]
async fn identifiers_are_escaped_as_single_segments() {
    let (repo, state) = repository().await;
    let terms = repo.fetch_children(&id("a b/c")).await.expect("children");
    assert!(terms.is_empty());
    assert_eq!(state.requests.lock().await[0].term, "a b/c");
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let (repo, _) = repository().await;
    let err = repo.fetch_children(&id("down")).await.expect_err("must fail");
    assert_eq!(err, FetchError::status(503, "Service Unavailable"));

    let err = repo.fetch_children(&id("missing")).await.expect_err("must fail");
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn unparseable_body_is_malformed() {
    let (repo, _) = repository().await;
    let err = repo.fetch_children(&id("garbled")).await.expect_err("must fail");
    assert!(matches!(err, FetchError::MalformedPayload(_)));
}

#[tokio::test]
async fn term_without_labels_is_malformed() {
    let (repo, _) = repository().await;
    let err = repo
        .fetch_children(&id("unlabelled"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::MalformedPayload(_)));
}

#[tokio::test]
async fn forwards_access_token() {
    let (repo, state) = repository().await;
    let repo = repo.with_access_token("secret-token");
    repo.fetch_children(&id("leaf")).await.expect("children");
    assert_eq!(
        state.requests.lock().await[0].authorization.as_deref(),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn unreachable_store_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let endpoint =
        TermStoreEndpoint::new(&format!("http://{addr}"), GROUP, SET).expect("endpoint");
    let repo = HttpTermRepository::with_timeout(endpoint, Duration::from_secs(5)).expect("client");
    let err = repo.fetch_children(&id("anchor")).await.expect_err("must fail");
    assert!(matches!(err, FetchError::Transport(_)));
}
