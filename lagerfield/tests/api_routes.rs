use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use lagerfield::{
    AppConfig, DocumentStore, MemoryStore, Repo, RepoError,
    api::{self, AppState},
    auth::hash_password,
    media::{LocalMediaStore, MediaStore},
    models::{AdminUser, Role},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "s3cret-password";
const BOUNDARY: &str = "lagerfield-test-boundary";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    uploads: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.auth.bcrypt_cost = 4;
        config.auth.jwt_secret = "test-secret".to_string();
        config.server.max_upload_bytes = 1024;
        config.media.upload_dir = uploads.path().to_path_buf();

        let store = Arc::new(MemoryStore::new());
        let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(uploads.path()));
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let router = api::router(AppState::new(config, dyn_store, media)).unwrap();
        Self { router, store, uploads }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn upload(&self, uri: &str, token: &str, field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn register_admin(&self) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "admin", "email": "Admin@Lagerfield.com", "password": ADMIN_PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn editor_token(&self) -> String {
        let hash = hash_password("editor-password", 4).await.unwrap();
        let dyn_store: Arc<dyn DocumentStore> = self.store.clone();
        Repo::<AdminUser>::new(dyn_store)
            .insert(AdminUser::new("editor", "editor@lagerfield.com", hash, Role::Editor))
            .await
            .unwrap();
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "editor@lagerfield.com", "password": "editor-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn root_and_health() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Lagerfield Capital Backend is running!");

    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_is_one_time_and_login_issues_tokens() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "second", "email": "second@lagerfield.com", "password": ADMIN_PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Admin user already exists. Use login instead.");

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "admin@lagerfield.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ADMIN@lagerfield.com", "password": ADMIN_PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "admin@lagerfield.com");
    assert!(body["user"]["lastLogin"].is_string());
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app.call("GET", "/api/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");

    let (status, body) = app.call("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn weak_passwords_are_rejected_at_registration() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "admin", "email": "admin@lagerfield.com", "password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("at least 8"));
}

#[tokio::test]
async fn protected_routes_require_tokens_and_admin_role() {
    let app = TestApp::new();
    app.register_admin().await;

    let (status, body) = app.call("POST", "/api/team", None, Some(json!({"name": "Ada"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");

    let (status, _) = app.call("GET", "/api/settings", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let editor = app.editor_token().await;
    let (status, body) = app
        .call("POST", "/api/team", Some(&editor), Some(json!({"name": "Ada", "title": "Partner"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, body) = app.call("GET", "/api/settings/profile", Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "editor");
}

#[tokio::test]
async fn team_member_crud() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, body) = app
        .call("POST", "/api/team", Some(&token), Some(json!({"name": "  Ada  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("title"));

    let (status, created) = app
        .call(
            "POST",
            "/api/team",
            Some(&token),
            Some(json!({"name": "  Ada  ", "title": "Partner", "socialLinks": {"linkedin": "https://linkedin.com/in/ada"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Ada");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, list) = app.call("GET", "/api/team", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, updated) = app
        .call("PUT", &format!("/api/team/{id}"), Some(&token), Some(json!({"title": "Managing Partner"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Managing Partner");
    assert_eq!(updated["name"], "Ada");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let (status, _) = app.call("DELETE", &format!("/api/team/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call("GET", &format!("/api/team/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Team member not found");

    let (status, body) = app
        .call("PUT", &format!("/api/team/{id}"), Some(&token), Some(json!({"title": "Gone"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Team member not found");
}

#[tokio::test]
async fn insights_accept_content_and_sort_by_date() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    for (title, date) in [("Older", "2023-01-10"), ("Newer", "2024-06-01")] {
        let (status, body) = app
            .call(
                "POST",
                "/api/insights",
                Some(&token),
                Some(json!({"title": title, "author": "Ada", "content": "Body text", "date": date, "tags": [" rates ", "macro"]})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["body"], "Body text");
        assert_eq!(body["tags"], json!(["rates", "macro"]));
    }

    let (_, list) = app.call("GET", "/api/insights", None, None).await;
    let titles: Vec<_> = list.as_array().unwrap().iter().map(|i| i["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Newer"), json!("Older")]);

    let (status, body) = app.call("GET", "/api/insights/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Insight not found");

    let (status, overview) = app.call("GET", "/api/admin/insights-overview", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["totalInsights"], 2);
    assert_eq!(overview["tagDistribution"]["rates"], 2);
    assert_eq!(overview["recentInsights"][0]["title"], "Newer");
}

#[tokio::test]
async fn services_enforce_required_fields_and_unique_slugs() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, body) = app
        .call("POST", "/api/services", Some(&token), Some(json!({"description": "x", "slug": "x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Service name is required.");

    let (status, body) = app
        .call("POST", "/api/services", Some(&token), Some(json!({"name": "Advisory", "slug": "x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Service description is required.");

    let (status, created) = app
        .call(
            "POST",
            "/api/services",
            Some(&token),
            Some(json!({"name": "Wealth Management", "description": "Plans", "slug": " Wealth-Management "})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "wealth-management");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            "POST",
            "/api/services",
            Some(&token),
            Some(json!({"name": "Other", "description": "Plans", "slug": "wealth-management"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Service slug must be unique");

    let (status, by_slug) = app.call("GET", "/api/services/wealth-management", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], id.as_str());

    let (status, by_id) = app.call("GET", &format!("/api/services/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["name"], "Wealth Management");

    let (status, body) = app.call("GET", "/api/services/unknown-service", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Service not found");
}

#[tokio::test]
async fn contact_submissions_flow() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, body) = app
        .call("POST", "/api/contact", None, Some(json!({"name": "Ada", "email": "ada@example.com"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required.");

    let (status, body) = app
        .call(
            "POST",
            "/api/contact",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "subject": "Hello", "message": "Let's talk"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Contact form submitted successfully!");
    assert_eq!(body["contact"]["subject"], "Hello");

    let (status, _) = app.call("GET", "/api/contact", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, list) = app.call("GET", "/api/contact", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, activity) = app.call("GET", "/api/admin/activity", Some(&token), None).await;
    assert_eq!(activity[0]["email"], "ada@example.com");
    assert!(activity[0].get("message").is_none());

    let (_, stats) = app.call("GET", "/api/admin/statistics", Some(&token), None).await;
    assert_eq!(stats["totalContactSubmissions"], 1);
    assert_eq!(stats["totalInsights"], 0);
}

#[tokio::test]
async fn settings_defaults_merge_and_profile_image() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, settings) = app.call("GET", "/api/settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["companyInfo"]["name"], "Lagerfield Capital");
    assert_eq!(settings["security"]["passwordPolicy"], "medium");

    let (status, updated) = app
        .call(
            "PUT",
            "/api/settings",
            Some(&token),
            Some(json!({"companyInfo": {"phone": "555-0100"}, "system": {"maintenanceMode": true}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["companyInfo"]["name"], "Lagerfield Capital");
    assert_eq!(updated["companyInfo"]["phone"], "555-0100");
    assert_eq!(updated["system"]["maintenanceMode"], true);
    assert_eq!(updated["system"]["apiRateLimit"], 1000);

    let (status, body) = app
        .upload("/api/settings/upload-profile-image", &token, "profileImage", "me.png", "image/png", b"png-bytes")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let image_url = body["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/api/uploads/profileImage-"));

    let (_, settings) = app.call("GET", "/api/settings", Some(&token), None).await;
    assert_eq!(settings["profileImageUrl"], image_url.as_str());
}

#[tokio::test]
async fn uploads_validate_type_and_size_and_are_served() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, body) = app
        .upload("/api/uploads", &token, "file", "notes.txt", "text/plain", b"hello")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only image files are allowed!");

    let (status, body) = app
        .upload("/api/uploads", &token, "file", "huge.png", "image/png", &[0u8; 2048])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("File too large"));

    let (status, body) = app
        .upload("/api/uploads?folder=team", &token, "file", "logo.png", "image/png", b"logo")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let url = body["url"].as_str().unwrap().to_string();
    let file_name = url.strip_prefix("/api/uploads/").unwrap();
    assert!(app.uploads.path().join(file_name).exists());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"logo");
}

#[tokio::test]
async fn password_change_and_profile_update() {
    let app = TestApp::new();
    let token = app.register_admin().await;

    let (status, body) = app
        .call(
            "PUT",
            "/api/auth/change-password",
            Some(&token),
            Some(json!({"currentPassword": "wrong-password", "newPassword": "another-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = app
        .call(
            "PUT",
            "/api/settings/change-password",
            Some(&token),
            Some(json!({"currentPassword": ADMIN_PASSWORD, "newPassword": "another-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "admin@lagerfield.com", "password": "another-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = app
        .call(
            "PUT",
            "/api/settings/profile",
            Some(&token),
            Some(json!({"avatarUrl": "https://cdn.example.com/me.png"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["avatarUrl"], "https://cdn.example.com/me.png");
    assert_eq!(profile["username"], "admin");
}

/// Store whose every call fails, like a Redis that refuses connections.
struct UnreachableStore;

fn refused() -> RepoError {
    RepoError::Other {
        message: "connection refused".into(),
    }
}

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn get(&self, _: &str, _: &str) -> Result<Option<Value>, RepoError> {
        Err(refused())
    }

    async fn put(&self, _: &str, _: &str, _: &Value) -> Result<(), RepoError> {
        Err(refused())
    }

    async fn delete(&self, _: &str, _: &str) -> Result<bool, RepoError> {
        Err(refused())
    }

    async fn scan(&self, _: &str) -> Result<Vec<Value>, RepoError> {
        Err(refused())
    }

    async fn count(&self, _: &str) -> Result<u64, RepoError> {
        Err(refused())
    }

    async fn claim_unique(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Option<String>, RepoError> {
        Err(refused())
    }

    async fn release_unique(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), RepoError> {
        Err(refused())
    }

    async fn lookup_unique(&self, _: &str, _: &str, _: &str) -> Result<Option<String>, RepoError> {
        Err(refused())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Err(refused())
    }
}

#[tokio::test]
async fn health_reports_unreachable_store() {
    let uploads = tempfile::tempdir().unwrap();
    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(uploads.path()));
    let router = api::router(AppState::new(AppConfig::default(), Arc::new(UnreachableStore), media)).unwrap();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "connection refused");
}

#[tokio::test]
async fn concurrent_registrations_create_one_admin() {
    let app = TestApp::new();
    let registration = |name: &str| {
        json!({"username": name, "email": format!("{name}@lagerfield.com"), "password": ADMIN_PASSWORD})
    };

    let (first, second) = tokio::join!(
        app.call("POST", "/api/auth/register", None, Some(registration("first"))),
        app.call("POST", "/api/auth/register", None, Some(registration("second"))),
    );

    let statuses = [first.0, second.0];
    assert_eq!(statuses.iter().filter(|status| **status == StatusCode::CREATED).count(), 1);
    assert!(statuses.contains(&StatusCode::BAD_REQUEST));
    let dyn_store: Arc<dyn DocumentStore> = app.store.clone();
    assert_eq!(Repo::<AdminUser>::new(dyn_store).count().await.unwrap(), 1);
}
