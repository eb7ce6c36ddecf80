//! Integration tests for the HTTP API.
//!
//! Requests are driven through the router with `oneshot`; the manager runs
//! on the in-memory store with a canned rank provider.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tetra_server::api::{AppState, create_router};
use tetra_tourney::db::InMemoryStore;
use tetra_tourney::tetrio::{
    LeagueStats, ProviderError, ProviderResult, RankProvider, TetrioUser, TetrioUserData,
};
use tetra_tourney::tournament::TournamentManager;
use tower::ServiceExt; // For `oneshot` method

struct StubProvider;

#[async_trait]
impl RankProvider for StubProvider {
    async fn fetch_user(&self, username: &str) -> ProviderResult<TetrioUserData> {
        let (rank, rating, country) = match username {
            "alice" => ("a", 18_000.0, "US"),
            "bob" => ("ss", 23_000.0, "US"),
            "carol" => ("b", 14_000.0, "DE"),
            "down" => return Err(ProviderError::Transient("timeout".to_string())),
            other => return Err(ProviderError::NotFound(other.to_string())),
        };
        Ok(TetrioUserData {
            user: TetrioUser {
                id: format!("t-{username}"),
                username: username.to_string(),
                role: "user".to_string(),
                country: Some(country.to_string()),
                avatar_revision: None,
                league: LeagueStats {
                    gamesplayed: 10,
                    gameswon: 5,
                    rating,
                    rank: rank.to_string(),
                    bestrank: None,
                    glicko: None,
                    rd: None,
                    apm: Some(40.0),
                    pps: Some(1.5),
                    vs: None,
                    decaying: false,
                },
            },
        })
    }
}

fn create_test_server() -> axum::Router {
    let store = Arc::new(InMemoryStore::new());
    let manager = TournamentManager::new(store.clone(), store, Arc::new(StubProvider));
    create_router(AppState {
        manager: Arc::new(manager),
    })
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &axum::Router, body: Value) -> i64 {
    let (status, created) = send(app, "POST", "/api/v1/guilds/g1/tournaments", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    created["id"].as_i64().unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_server();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

// ============================================================================
// Tournament Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_get_details() {
    let app = create_test_server();
    let id = create(
        &app,
        json!({"organized_by": "org", "name": "Weekly Cup", "rank_cap": "S", "max_players": 16}),
    )
    .await;

    let (status, embed) = send(&app, "GET", &format!("/api/v1/guilds/g1/tournaments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(embed["title"], "Weekly Cup (OPEN)");
    assert!(embed["description"].as_str().unwrap().contains("**RANK CAP**: S"));

    // Other guilds cannot see it
    let (status, _) = send(&app, "GET", &format!("/api/v1/guilds/g2/tournaments/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_unknown_rank_cap() {
    let app = create_test_server();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/guilds/g1/tournaments",
        Some(json!({"organized_by": "org", "name": "Cup", "rank_cap": "legendary"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("legendary"));
}

#[tokio::test]
async fn test_search_tournaments() {
    let app = create_test_server();
    create(&app, json!({"organized_by": "org", "name": "Weekly Cup"})).await;
    create(&app, json!({"organized_by": "org", "name": "Monthly Open"})).await;

    let (status, choices) = send(&app, "GET", "/api/v1/guilds/g1/tournaments?q=WEEK", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(choices.as_array().unwrap().len(), 1);
    assert_eq!(choices[0]["name"], "Weekly Cup");
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_allowed_and_denied() {
    let app = create_test_server();
    let id = create(
        &app,
        json!({"organized_by": "org", "name": "Cup", "rank_cap": "s", "add_roles": ["r1"]}),
    )
    .await;
    let uri = format!("/api/v1/guilds/g1/tournaments/{id}/register");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"discord_id": "1", "tetrio_username": "alice"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);
    assert_eq!(body["roles_to_add"], json!(["r1"]));
    assert_eq!(body["registered_count"], 1);

    let (status, body) = send(&app, "POST", &uri, Some(json!({"discord_id": "2", "tetrio_username": "bob"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "tier above cap");
    assert_eq!(body["roles_to_add"], json!([]));
}

#[tokio::test]
async fn test_register_provider_failures() {
    let app = create_test_server();
    let id = create(&app, json!({"organized_by": "org", "name": "Cup"})).await;
    let uri = format!("/api/v1/guilds/g1/tournaments/{id}/register");

    let (status, _) = send(&app, "POST", &uri, Some(json!({"discord_id": "1", "tetrio_username": "ghost"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", &uri, Some(json!({"discord_id": "1", "tetrio_username": "down"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body["error"].as_str().unwrap().contains("timeout"));
}

#[tokio::test]
async fn test_status_and_edit_lifecycle() {
    let app = create_test_server();
    let id = create(&app, json!({"organized_by": "org", "name": "Cup"})).await;
    let base = format!("/api/v1/guilds/g1/tournaments/{id}");

    let (status, body) = send(&app, "PATCH", &base, Some(json!({"tr_cap": 20000}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_tr_capped"], true);

    let (status, _) = send(&app, "PATCH", &base, Some(json!({"tr_cap": 99999}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", &format!("{base}/status"), Some(json!({"status": "closed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");

    let (_, body) = send(&app, "POST", &format!("{base}/register"), Some(json!({"discord_id": "1", "tetrio_username": "alice"}))).await;
    assert_eq!(body["reason"], "registration closed");

    send(&app, "POST", &format!("{base}/status"), Some(json!({"status": "finished"}))).await;
    let (status, _) = send(&app, "PATCH", &base, Some(json!({"name": "Too late"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_check_in_and_unregister() {
    let app = create_test_server();
    let id = create(&app, json!({"organized_by": "org", "name": "Cup"})).await;
    let base = format!("/api/v1/guilds/g1/tournaments/{id}");
    send(&app, "POST", &format!("{base}/register"), Some(json!({"discord_id": "1", "tetrio_username": "alice"}))).await;

    let (status, body) = send(&app, "POST", &format!("{base}/check-in"), Some(json!({"discord_id": "1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_checked_in"], false);

    let (_, body) = send(&app, "POST", &format!("{base}/check-in"), Some(json!({"discord_id": "1"}))).await;
    assert_eq!(body["already_checked_in"], true);

    let (status, _) = send(&app, "POST", &format!("{base}/check-in"), Some(json!({"discord_id": "9"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "POST", &format!("{base}/unregister"), Some(json!({"discord_id": "1"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", &format!("{base}/unregister"), Some(json!({"discord_id": "1"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ============================================================================
// Player Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_players_formats() {
    let app = create_test_server();
    let id = create(&app, json!({"organized_by": "org", "name": "Cup"})).await;
    let base = format!("/api/v1/guilds/g1/tournaments/{id}");
    for (discord_id, name) in [("1", "carol"), ("2", "bob"), ("3", "alice")] {
        send(&app, "POST", &format!("{base}/register"), Some(json!({"discord_id": discord_id, "tetrio_username": name}))).await;
    }

    let (status, body) = send(&app, "GET", &format!("{base}/players?sort=rank"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "table");
    let table = body["body"].as_str().unwrap();
    assert!(table.find("bob").unwrap() < table.find("alice").unwrap());
    assert!(table.find("alice").unwrap() < table.find("carol").unwrap());

    let (status, body) = send(&app, "GET", &format!("{base}/players?format=embed"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "embed");

    let (status, _) = send(&app, "GET", &format!("{base}/players?sort=elo"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", &format!("{base}/players?format=xml"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", &format!("{base}/players?format=csv"), None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert!(body["error"].as_str().unwrap().contains("not implemented"));
}

#[tokio::test]
async fn test_list_players_other_game() {
    let app = create_test_server();
    let id = create(&app, json!({"organized_by": "org", "name": "Puyo night", "game": "puyo"})).await;

    let (status, _) = send(&app, "GET", &format!("/api/v1/guilds/g1/tournaments/{id}/players"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_player() {
    let app = create_test_server();
    for name in ["A", "B"] {
        let id = create(&app, json!({"organized_by": "org", "name": name})).await;
        send(
            &app,
            "POST",
            &format!("/api/v1/guilds/g1/tournaments/{id}/register"),
            Some(json!({"discord_id": "1", "tetrio_username": "alice"})),
        )
        .await;
    }

    let (status, card) = send(&app, "GET", "/api/v1/players/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card["title"], "alice");
    assert_eq!(card["fields"][1]["value"], "A");

    let (status, body) = send(&app, "DELETE", "/api/v1/players/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed_from_tournaments"], 2);

    let (status, _) = send(&app, "GET", "/api/v1/players/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/v1/players/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
