use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use skillcheck::auth::Authenticator;
use skillcheck::checklist::{
    skillcheck_router, Catalog, ChecklistItem, ItemId, Level, Sheet, SkillCheckService,
};
use skillcheck::store::MemoryStore;
use std::sync::Arc;
use tower::ServiceExt;

fn item(id: u32, sheet: Sheet, category: &str, level: Level, required: bool) -> ChecklistItem {
    ChecklistItem {
        id: ItemId(id),
        sheet,
        category: category.to_string(),
        subcategory: String::new(),
        level,
        description: format!("check item {id}"),
        required,
    }
}

fn app() -> Router {
    let catalog = Arc::new(Catalog::from_items([
        item(1, Sheet::Business, "行動規範", Level::One, true),
        item(2, Sheet::Business, "論理的思考", Level::One, false),
        item(3, Sheet::Business, "論理的思考", Level::Two, true),
        item(1, Sheet::DataScience, "統計数理", Level::One, true),
        item(2, Sheet::DataScience, "機械学習", Level::Three, false),
    ]));
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(SkillCheckService::new(catalog, Arc::clone(&store)));
    let auth = Arc::new(Authenticator::new(Arc::clone(&store), store, None));
    auth.register("alice", "correct horse").expect("user registers");
    skillcheck_router(service, auth)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/v1/login",
            None,
            Some(json!({ "user_id": "alice", "password": "correct horse" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token string").to_string();
    assert_eq!(token.len(), 32);
    token
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let app = app();
    let (wrong_status, wrong_body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/login",
            None,
            Some(json!({ "user_id": "alice", "password": "nope" })),
        ),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/login",
            None,
            Some(json!({ "user_id": "mallory", "password": "nope" })),
        ),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_stale_tokens() {
    let app = app();
    let (status, _) = send(&app, request(Method::GET, "/api/v1/reports/levels", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/reports/levels", Some("deadbeef"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/v1/logout", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/sheets", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn saved_answers_flow_into_checklist_and_reports() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/v1/sheets/business/answers",
            Some(&token),
            Some(json!({ "answers": { "1": true, "2": false, "3": true } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], 3);
    assert_eq!(body["achieved"], 2);
    assert_eq!(body["sheet"], "business");

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/sheets/business/items?levels=1&required_only=true",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().expect("entry list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], 1);
    assert_eq!(entries[0]["achieved"], true);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/sheets/business/report?level=ALL",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["status"], "ready");
    assert_eq!(body["progress"]["data"]["achieved"], 2);
    assert_eq!(body["progress"]["data"]["progress_percent"], 67);
    let table = body["category_table"]["data"]
        .as_array()
        .expect("category rows");
    let displays: Vec<&str> = table
        .iter()
        .map(|row| row["display"].as_str().expect("display string"))
        .collect();
    assert_eq!(displays, vec!["1/1", "1/2"]);

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/reports/levels", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["data"]["total_display"], "4 / 8");
}

#[tokio::test]
async fn overview_reports_qualification_for_single_level() {
    let app = app();
    let token = login(&app).await;

    for (sheet, answers) in [
        ("business", json!({ "1": true, "2": true })),
        ("data_science", json!({ "1": true })),
    ] {
        let (status, _) = send(
            &app,
            request(
                Method::PUT,
                &format!("/api/v1/sheets/{sheet}/answers"),
                Some(&token),
                Some(json!({ "answers": answers })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/reports/overview?level=1", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"], "★");
    assert_eq!(body["progress"]["data"]["progress_percent"], 100);
    assert_eq!(body["progress"]["data"]["remaining_required"], 0);
    assert_eq!(body["qualification"]["qualified"], true);
    assert_eq!(body["qualification"]["threshold_percent"], 70);
    let axes = body["sheet_radar"]["data"]["axes"]
        .as_array()
        .expect("radar axes");
    assert_eq!(axes.len(), 2);

    let (_, body) = send(
        &app,
        request(Method::GET, "/api/v1/reports/overview", Some(&token), None),
    )
    .await;
    assert_eq!(body["selection"], "ALL");
    assert!(body.get("qualification").is_none());
}

#[tokio::test]
async fn bad_input_maps_to_client_errors() {
    let app = app();
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/sheets/marketing/items", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/reports/overview?level=7",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/v1/sheets/data_engineering/answers",
            Some(&token),
            Some(json!({ "answers": { "1": true } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().expect("message").contains('1'));

    let (_, body) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/sheets/data_engineering/report",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(body["progress"]["status"], "no_data");
    assert_eq!(body["category_radar"]["status"], "no_data");
}
