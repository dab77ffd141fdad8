//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::identity::{AccountService, AuthenticationService};
use crate::infrastructure::crypto::JwtConfig;
use crate::interfaces::http::authorization::{
    access_control_middleware, ACTIVATION_PATH, AUTHORITIES_PATH, HEALTH_PATH, LOGIN_PATH,
    USERS_PATH, USER_PATH, USER_RESET_PASSWORD_PATH,
};
use crate::interfaces::http::common::{ApiResponse, MessageResponse};
use crate::interfaces::http::middleware::AuthState;
use crate::interfaces::http::modules::{auth, health, metrics, request_id, users};

/// State shared by every API route; handlers pull their own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub authentication: Arc<AuthenticationService>,
    pub auth: AuthState,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for users::UserHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        users::UserHandlerState {
            accounts: Arc::clone(&s.accounts),
        }
    }
}

impl FromRef<ApiState> for auth::AuthHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        auth::AuthHandlerState {
            authentication: Arc::clone(&s.authentication),
            accounts: Arc::clone(&s.accounts),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            accounts: Arc::clone(&s.accounts),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}

/// Everything the router needs from the composition root
pub struct ApiServices {
    pub accounts: Arc<AccountService>,
    pub authentication: Arc<AuthenticationService>,
    pub jwt_config: JwtConfig,
    /// `GET /metrics` is mounted only when a recorder handle is given
    pub metrics: Option<PrometheusHandle>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::activate_account,
        // Users
        users::create_user,
        users::update_user,
        users::list_users,
        users::get_user,
        users::delete_user,
        users::reset_password,
        users::list_authorities,
    ),
    components(
        schemas(
            ApiResponse<MessageResponse>,
            MessageResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            users::UserDto,
            users::ManagedUserRequest,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Authentication", description = "Login (JWT) and account activation"),
        (name = "Users", description = "Account administration and public user lookup"),
    ),
    info(
        title = "Account Service API",
        version = "1.0.0",
        description = "REST API for managing user accounts",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(services: ApiServices) -> Router {
    let auth_state = AuthState {
        jwt_config: services.jwt_config,
    };

    let state = ApiState {
        accounts: services.accounts,
        authentication: services.authentication,
        auth: auth_state.clone(),
        started_at: Arc::new(Instant::now()),
    };

    // Full paths on one router so `MatchedPath` is exactly the access-table key
    let api_routes = Router::new()
        .route(HEALTH_PATH, get(health::health_check))
        .route(LOGIN_PATH, post(auth::login))
        .route(ACTIVATION_PATH, get(auth::activate_account))
        .route(
            USERS_PATH,
            get(users::list_users)
                .post(users::create_user)
                .put(users::update_user),
        )
        .route(AUTHORITIES_PATH, get(users::list_authorities))
        .route(
            USER_PATH,
            get(users::get_user).delete(users::delete_user),
        )
        .route(USER_RESET_PASSWORD_PATH, post(users::reset_password))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            access_control_middleware,
        ))
        .route_layer(middleware::from_fn(metrics::http_metrics_middleware))
        .with_state(state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new().merge(swagger_routes).merge(api_routes);

    if let Some(handle) = services.metrics {
        router = router.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(metrics::MetricsState { handle }),
        );
    }

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::request_id_middleware))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::application::notifications::test_support::RecordingMailer;
    use crate::application::notifications::{NotificationService, ACTIVATION_SUBJECT};
    use crate::domain::{Account, AccountDraft, AccountRepositoryInterface, Authority};
    use crate::infrastructure::crypto::{create_token, BcryptPasswordEncoder};
    use crate::infrastructure::storage::{InMemoryAccountRepository, InMemoryAuthorityRepository};

    struct TestApp {
        router: Router,
        accounts: Arc<AccountService>,
        repository: Arc<InMemoryAccountRepository>,
        mailer: Arc<RecordingMailer>,
        jwt_config: JwtConfig,
    }

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "account-service".into(),
        }
    }

    fn test_app() -> TestApp {
        let repository = Arc::new(InMemoryAccountRepository::new());
        let encoder = Arc::new(BcryptPasswordEncoder::new(4));
        let mailer = Arc::new(RecordingMailer::default());
        let accounts = Arc::new(AccountService::new(
            repository.clone(),
            Arc::new(InMemoryAuthorityRepository::new()),
            encoder.clone(),
            Arc::new(NotificationService::new(
                mailer.clone(),
                "http://localhost:8080",
            )),
        ));
        let authentication = Arc::new(AuthenticationService::new(
            repository.clone(),
            encoder,
            jwt_config(),
        ));

        let router = create_api_router(ApiServices {
            accounts: accounts.clone(),
            authentication,
            jwt_config: jwt_config(),
            metrics: None,
        });

        TestApp {
            router,
            accounts,
            repository,
            mailer,
            jwt_config: jwt_config(),
        }
    }

    fn token_for(app: &TestApp, authorities: &[Authority]) -> String {
        let account = Account {
            id: 1,
            login: "caller".into(),
            email: "caller@x.com".into(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            lang_key: "en".into(),
            activated: true,
            activation_key: None,
            authorities: authorities.iter().copied().collect::<BTreeSet<_>>(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        create_token(&account, &app.jwt_config).unwrap()
    }

    fn admin_token(app: &TestApp) -> String {
        token_for(app, &[Authority::Admin, Authority::User])
    }

    async fn send(
        app: &TestApp,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed(app: &TestApp, login: &str, email: &str) -> Account {
        app.accounts
            .create(AccountDraft {
                login: login.into(),
                email: email.into(),
                password: Some("secret".into()),
                activated: true,
                ..AccountDraft::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_requires_token() {
        let app = test_app();
        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            None,
            Some(json!({"login": "alice", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_requires_admin_role() {
        let app = test_app();
        let token = token_for(&app, &[Authority::User]);
        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({"login": "alice", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Forbidden: Insufficient permissions");
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_on_protected_route() {
        let app = test_app();
        let response = send(&app, Method::GET, AUTHORITIES_PATH, Some("garbage"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_returns_created_with_location_and_alert() {
        let app = test_app();
        let token = admin_token(&app);
        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({
                "login": "Alice",
                "email": "Alice@X.com",
                "firstName": "Alice",
                "authorities": ["ROLE_USER"]
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/api/v1/users/alice");
        assert_eq!(
            response.headers()["x-accountservice-alert"],
            "accountService.userManagement.created"
        );

        let body = json_body(response).await;
        assert_eq!(body["login"], "alice");
        assert_eq!(body["email"], "alice@x.com");
        assert_eq!(body["firstName"], "Alice");
        assert!(body["id"].as_i64().is_some());
        assert!(body.get("password").is_none());

        let sent = app.mailer.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, ACTIVATION_SUBJECT);
    }

    #[tokio::test]
    async fn create_with_id_is_bad_request() {
        let app = test_app();
        let token = admin_token(&app);
        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({"id": 5, "login": "alice", "email": "a@x.com"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn duplicate_login_and_email_conflict() {
        let app = test_app();
        seed(&app, "alice", "a@x.com").await;
        let token = admin_token(&app);

        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({"login": "ALICE", "email": "b@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({"login": "bob", "email": "A@X.COM"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_body_is_bad_request() {
        let app = test_app();
        let token = admin_token(&app);
        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({"login": "alice", "email": "not-an-email"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_without_id_is_bad_request() {
        let app = test_app();
        let token = admin_token(&app);
        let response = send(
            &app,
            Method::PUT,
            USERS_PATH,
            Some(&token),
            Some(json!({"login": "alice", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let app = test_app();
        let alice = seed(&app, "alice", "a@x.com").await;
        let token = admin_token(&app);

        let response = send(
            &app,
            Method::PUT,
            USERS_PATH,
            Some(&token),
            Some(json!({
                "id": alice.id,
                "login": "alice",
                "email": "a@x.com",
                "lastName": "Liddell",
                "langKey": "fr",
                "activated": true
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["lastName"], "Liddell");
        assert_eq!(body["langKey"], "fr");
    }

    #[tokio::test]
    async fn list_is_public_and_paginated() {
        let app = test_app();
        seed(&app, "alice", "a@x.com").await;
        seed(&app, "bob", "b@x.com").await;
        seed(&app, "carol", "c@x.com").await;

        let response = send(
            &app,
            Method::GET,
            "/api/v1/users?page=0&size=2&sort=login,asc",
            None,
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-total-count"], "3");
        assert!(response.headers()[header::LINK]
            .to_str()
            .unwrap()
            .contains("rel=\"next\""));

        let body = json_body(response).await;
        let logins: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["login"].as_str().unwrap())
            .collect();
        assert_eq!(logins, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn list_rejects_unknown_sort_property() {
        let app = test_app();
        let response = send(&app, Method::GET, "/api/v1/users?sort=password", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_rejects_malformed_paging_with_error_envelope() {
        let app = test_app();
        let response = send(&app, Method::GET, "/api/v1/users?page=abc", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query:"));
    }

    #[tokio::test]
    async fn location_of_login_with_reserved_characters_resolves() {
        let app = test_app();
        let token = admin_token(&app);
        let response = send(
            &app,
            Method::POST,
            USERS_PATH,
            Some(&token),
            Some(json!({"login": "a?b", "email": "ab@x.com"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        assert_eq!(location, "/api/v1/users/a%3Fb");

        let response = send(&app, Method::GET, &location, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["login"], "a?b");
    }

    #[tokio::test]
    async fn get_user_by_login() {
        let app = test_app();
        seed(&app, "alice", "a@x.com").await;

        let response = send(&app, Method::GET, "/api/v1/users/alice", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "a@x.com");

        let response = send(&app, Method::GET, "/api/v1/users/nobody", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = test_app();
        seed(&app, "alice", "a@x.com").await;
        let token = admin_token(&app);

        let response = send(&app, Method::DELETE, "/api/v1/users/alice", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["x-accountservice-alert"],
            "accountService.userManagement.deleted"
        );
        assert!(app.repository.find_by_login("alice").await.unwrap().is_none());

        let response = send(&app, Method::DELETE, "/api/v1/users/alice", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn reset_password_mails_without_echoing_it() {
        let app = test_app();
        seed(&app, "alice", "a@x.com").await;
        let token = admin_token(&app);

        let response = send(
            &app,
            Method::POST,
            "/api/v1/users/alice/reset-password",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let sent = app.mailer.messages();
        let mail = sent.last().unwrap();
        let password = mail.body.trim_end().rsplit(": ").next().unwrap().to_string();

        let body = json_body(response).await;
        assert!(!body.to_string().contains(&password));
    }

    #[tokio::test]
    async fn authorities_are_listed_for_admins() {
        let app = test_app();
        let token = admin_token(&app);
        let response = send(&app, Method::GET, AUTHORITIES_PATH, Some(&token), None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, json!(["ROLE_ADMIN", "ROLE_USER"]));
    }

    #[tokio::test]
    async fn login_returns_bearer_token() {
        let app = test_app();
        seed(&app, "alice", "a@x.com").await;

        let response = send(
            &app,
            Method::POST,
            LOGIN_PATH,
            None,
            Some(json!({"login": "Alice", "password": "secret"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::AUTHORIZATION]
            .to_str()
            .unwrap()
            .starts_with("Bearer "));
        let body = json_body(response).await;
        assert_eq!(body["type"], "Bearer");

        let response = send(
            &app,
            Method::POST,
            LOGIN_PATH,
            None,
            Some(json!({"login": "alice", "password": "wrong"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn activation_key_activates_once() {
        let app = test_app();
        let account = app
            .accounts
            .create(AccountDraft {
                login: "dave".into(),
                email: "d@x.com".into(),
                ..AccountDraft::default()
            })
            .await
            .unwrap();
        let key = account.activation_key.clone().unwrap();
        let uri = format!("/api/v1/user/activation/{}", key);

        let response = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["activated"], true);

        let response = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_app();
        let response = send(&app, Method::GET, HEALTH_PATH, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = test_app();
        let response = send(&app, Method::GET, HEALTH_PATH, None, None).await;
        assert!(response.headers().contains_key(request_id::REQUEST_ID_HEADER));
    }
}
