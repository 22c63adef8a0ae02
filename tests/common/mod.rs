#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    middleware,
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use warehouse_api::{
    auth::{AuthConfig, AuthService, ADMIN_ROLE},
    config::AppConfig,
    db,
    events::{self, EventHandler, EventSender, LoggingNotifier, StockFeed},
    handlers::AppServices,
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration_tests_secret_value_0123456789";

/// Item numbers seeded into the master list for every test app.
pub const SEEDED_ITEM_NOS: [&str; 3] = ["A1", "A2", "B7"];

/// Application wired the way `main` wires it, backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_token: String,
    pub user_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let stock_feed = StockFeed::new(cfg.stock_feed_capacity);
        let handlers: Vec<Arc<dyn EventHandler>> = vec![
            Arc::new(LoggingNotifier) as Arc<dyn EventHandler>,
            Arc::new(stock_feed.clone()) as Arc<dyn EventHandler>,
        ];
        let event_task = tokio::spawn(events::process_events(event_rx, handlers));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg)));
        let admin_token = auth_service
            .issue_token("admin-1", ADMIN_ROLE)
            .expect("issue admin token");
        let user_token = auth_service
            .issue_token("clerk-1", "user")
            .expect("issue user token");

        let services = AppServices::new(db_arc.clone(), event_sender);
        services
            .master_list
            .replace(SEEDED_ITEM_NOS.iter().map(|s| s.to_string()).collect())
            .await
            .expect("seed master list");

        let state = AppState {
            db: db_arc,
            config: cfg,
            stock_feed,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", warehouse_api::api_v1_routes())
            .layer(middleware::from_fn_with_state(
                auth_service,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .layer(middleware::from_fn(
                warehouse_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            admin_token,
            user_token,
            _event_task: event_task,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Sends the request as a signed-in non-admin user.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(&self.user_token)).await
    }

    pub async fn request_as_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(&self.admin_token))
            .await
    }

    /// Sends the request and returns its status with the decoded JSON body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request_authenticated(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}
