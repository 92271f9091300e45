// HTTP routes end to end: popup handshake, authenticated Reddit actions, workflow triggers
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use signalscout::session::{MemoryTokenStore, PopupChannel, TokenLifecycleManager, TokenStore};
use signalscout::settings::ScoutSettings;
use signalscout::testing::{MockOAuthCallback, TestFixtures};
use signalscout::workflow::WorkflowClient;
use signalscout::configure_services;
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestState {
    manager: web::Data<TokenLifecycleManager>,
    popup: web::Data<PopupChannel>,
    workflow: web::Data<WorkflowClient>,
    settings: web::Data<ScoutSettings>,
}

impl TestState {
    fn new(settings: ScoutSettings, store: Arc<dyn TokenStore>) -> Self {
        let manager = TokenLifecycleManager::from_settings(&settings, store).unwrap();
        let workflow = WorkflowClient::from_settings(&settings, reqwest::Client::new());
        Self {
            manager: web::Data::new(manager),
            popup: web::Data::new(PopupChannel::new()),
            workflow: web::Data::new(workflow),
            settings: web::Data::new(settings),
        }
    }

    fn for_server(server: &MockServer, store: Arc<dyn TokenStore>) -> Self {
        let mut settings = TestFixtures::settings(&server.uri());
        settings.application.auth_wait_timeout_seconds = 1;
        Self::new(settings, store)
    }

    fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.manager.clone())
            .app_data(self.popup.clone())
            .app_data(self.workflow.clone())
            .app_data(self.settings.clone())
            .configure(configure_services)
    }
}

fn authorization_state(authorization_url: &str) -> String {
    let url = url::Url::parse(authorization_url).unwrap();
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

#[actix_web::test]
async fn test_ping() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/ping").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_popup_handshake_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("code=popup-code"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(TestFixtures::token_response("access-1", Some("refresh-1"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/auth/reddit/login").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let authorization_url = body["authorization_url"].as_str().unwrap();
    assert!(authorization_url.contains("duration=permanent"));
    let oauth_state = authorization_state(authorization_url);

    let callback = MockOAuthCallback::success("popup-code", &oauth_state);
    let req = test::TestRequest::get()
        .uri(&format!(
            "/auth/reddit/callback?{}",
            MockOAuthCallback::query_string(&callback)
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("REDDIT_AUTH_SUCCESS"));
    assert!(html.contains("window.close()"));

    let req = test::TestRequest::get().uri("/auth/reddit/wait").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"status": "success"}));

    let req = test::TestRequest::get().uri("/auth/reddit/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], true);
    assert!(body["expires_at"].is_string());
}

#[actix_web::test]
async fn test_popup_handshake_provider_error() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/auth/reddit/login").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let oauth_state = authorization_state(body["authorization_url"].as_str().unwrap());

    let callback = MockOAuthCallback::error("access_denied", Some(oauth_state.as_str()));
    let req = test::TestRequest::get()
        .uri(&format!(
            "/auth/reddit/callback?{}",
            MockOAuthCallback::query_string(&callback)
        ))
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("REDDIT_AUTH_ERROR"));
    assert!(html.contains("access_denied"));

    let req = test::TestRequest::get().uri("/auth/reddit/wait").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"status": "error", "error": "access_denied"}));

    // The denied attempt cannot be completed afterwards
    assert!(!state.manager.has_pending_authorization().unwrap());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_callback_with_forged_state_is_reported_to_waiter() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/auth/reddit/login").to_request();
    test::call_service(&app, req).await;

    let callback = MockOAuthCallback::success("code", "forged");
    let req = test::TestRequest::get()
        .uri(&format!(
            "/auth/reddit/callback?{}",
            MockOAuthCallback::query_string(&callback)
        ))
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("REDDIT_AUTH_ERROR"));

    let req = test::TestRequest::get().uri("/auth/reddit/wait").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "error");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_incomplete_callback_is_an_error() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/auth/reddit/login").to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/auth/reddit/callback?{}",
            MockOAuthCallback::query_string(&MockOAuthCallback::incomplete())
        ))
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("REDDIT_AUTH_ERROR"));
    assert!(!state.manager.has_pending_authorization().unwrap());
}

#[actix_web::test]
async fn test_wait_without_login_conflicts() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/auth/reddit/wait").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_wait_times_out_without_callback() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/auth/reddit/login").to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/auth/reddit/wait").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[actix_web::test]
async fn test_me_requires_authentication() {
    let server = MockServer::start().await;
    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/api/reddit/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_authenticated");
}

#[actix_web::test]
async fn test_me_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestFixtures::current_user()))
        .mount(&server)
        .await;

    let store = Arc::new(TestFixtures::store_with_tokens(Some("access"), Some("refresh")));
    let state = TestState::for_server(&server, store);
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::get().uri("/api/reddit/me").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["name"], "signal_scout");
    assert_eq!(body["refreshed"], false);
}

#[actix_web::test]
async fn test_comment_route_posts_to_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/comment"))
        .and(body_string_contains("thing_id=t3_abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(TestFixtures::comment_accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(TestFixtures::store_with_tokens(Some("access"), Some("refresh")));
    let state = TestState::for_server(&server, store);
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/reddit/comment")
        .set_json(json!({
            "post_id": "https://www.reddit.com/r/rust/comments/abc123/title/",
            "text": "Thanks for sharing",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["comment"]["thing_id"], "t3_abc123");
    assert_eq!(body["comment"]["comment_name"], "t1_k9x8y7");
}

#[actix_web::test]
async fn test_comment_rejected_by_reddit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/comment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(TestFixtures::comment_rejected("THREAD_LOCKED", "that thread is locked")),
        )
        .mount(&server)
        .await;

    let store = Arc::new(TestFixtures::store_with_tokens(Some("access"), Some("refresh")));
    let state = TestState::for_server(&server, store);
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/reddit/comment")
        .set_json(json!({"post_id": "abc123", "text": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "provider_rejected");
}

#[actix_web::test]
async fn test_comment_requires_text() {
    let server = MockServer::start().await;
    let store = Arc::new(TestFixtures::store_with_tokens(Some("access"), Some("refresh")));
    let state = TestState::for_server(&server, store);
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/reddit/comment")
        .set_json(json!({"post_id": "abc123", "text": "  "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_logout_is_idempotent() {
    let server = MockServer::start().await;
    let store = Arc::new(TestFixtures::store_with_tokens(Some("access"), Some("refresh")));
    let state = TestState::for_server(&server, store);
    let app = test::init_service(state.app()).await;

    for _ in 0..2 {
        let req = test::TestRequest::post().uri("/auth/reddit/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/auth/reddit/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["expires_at"], Value::Null);
}

#[actix_web::test]
async fn test_workflow_search_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TestFixtures::SEARCH_WEBHOOK_PATH))
        .and(body_json(json!({
            "keywords": "(\"stuck\" OR \"blocked\") AND (\"oauth\")",
            "subcommunities": format!("{}/r/LangChain+crewai/search", server.uri()),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Workflow was started"))
        .expect(1)
        .mount(&server)
        .await;

    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/workflow/search")
        .set_json(json!({
            "subreddits": ["LangChain", "r/crewai"],
            "boolean_query": "(\"stuck\" OR \"blocked\") AND (\"oauth\")",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["response"], "Workflow was started");
}

#[actix_web::test]
async fn test_workflow_comment_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TestFixtures::POSTER_WEBHOOK_PATH))
        .and(body_json(json!({"postId": "abc123", "comment": "Great question"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let state = TestState::for_server(&server, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/workflow/comment")
        .set_json(json!({"postId": "abc123", "comment": "Great question"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_workflow_not_configured() {
    let server = MockServer::start().await;
    let mut settings = TestFixtures::settings(&server.uri());
    settings.workflow.search_webhook_url = None;
    let state = TestState::new(settings, Arc::new(MemoryTokenStore::new()));
    let app = test::init_service(state.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/workflow/search")
        .set_json(json!({"subreddits": ["rust"], "boolean_query": "\"async\""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
