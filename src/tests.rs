//! Integration tests for the helpdesk backend.

use std::path::Path;

use axum::{routing::post, Json, Router};
use reqwest::{multipart, Client, RequestBuilder};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, GeminiConfig, LogFormat};
use crate::{build_state, create_router};

const JWT_SECRET: &str = "integration-test-secret";

fn test_config(dir: &Path, gemini: Option<GeminiConfig>) -> Config {
    Config {
        db_path: dir.join("test.sqlite"),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_ttl_hours: 1,
        bcrypt_cost: 4,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        index_path: dir.join("index"),
        upload_dir: dir.join("uploads"),
        max_upload_bytes: 1024 * 1024,
        log_level: "warn".to_string(),
        log_format: LogFormat::Pretty,
        gemini,
        s3: None,
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_gemini(None).await
    }

    async fn with_gemini(gemini: Option<GeminiConfig>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = build_state(test_config(temp_dir.path(), gemini))
            .await
            .expect("Failed to build state");

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestFixture {
            client: Client::new(),
            base_url,
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, token: &str, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    fn post(&self, token: &str, path: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(&body)
    }

    fn put(&self, token: &str, path: &str, body: Value) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token).json(&body)
    }

    fn delete(&self, token: &str, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Sign up and return the session token.
    async fn signup(&self, email: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/signup"))
            .json(&json!({"email": email, "password": "password123", "name": "Test"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

async fn data(resp: reqwest::Response) -> Value {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert!(status.is_success(), "unexpected {}: {}", status, body);
    assert_eq!(body["success"], true);
    body["data"].clone()
}

async fn error_code(resp: reqwest::Response) -> (u16, String) {
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    (status, body["error"]["code"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_signup_login_me() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/signup"))
        .json(&json!({"email": "Admin@Example.com", "password": "password123", "name": "Ada"}))
        .send()
        .await
        .unwrap();
    let session = data(resp).await;
    assert_eq!(session["user"]["email"], "admin@example.com");
    assert_eq!(session["user"]["role"], "admin");
    assert!(session["user"].get("passwordHash").is_none());

    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({"email": "admin@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap();
    let token = data(resp).await["token"].as_str().unwrap().to_string();

    let me = data(fixture.get(&token, "/api/me").send().await.unwrap()).await;
    assert_eq!(me["name"], "Ada");

    // Second account is an agent
    let agent = fixture.signup("agent@example.com").await;
    let me = data(fixture.get(&agent, "/api/me").send().await.unwrap()).await;
    assert_eq!(me["role"], "agent");
}

#[tokio::test]
async fn test_auth_failures() {
    let fixture = TestFixture::new().await;
    fixture.signup("ana@example.com").await;

    // Duplicate email
    let resp = fixture
        .client
        .post(fixture.url("/api/signup"))
        .json(&json!({"email": "ANA@example.com", "password": "password123", "name": "Ana"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (409, "CONFLICT".to_string()));

    // Short password
    let resp = fixture
        .client
        .post(fixture.url("/api/signup"))
        .json(&json!({"email": "bob@example.com", "password": "short", "name": "Bob"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    // Wrong password
    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({"email": "ana@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (401, "UNAUTHORIZED".to_string()));

    // Missing and invalid tokens
    let resp = fixture.client.get(fixture.url("/api/tickets")).send().await.unwrap();
    assert_eq!(error_code(resp).await, (401, "UNAUTHORIZED".to_string()));

    let resp = fixture.get("not-a-jwt", "/api/tickets").send().await.unwrap();
    assert_eq!(error_code(resp).await, (401, "UNAUTHORIZED".to_string()));
}

#[tokio::test]
async fn test_user_administration() {
    let fixture = TestFixture::new().await;
    let admin = fixture.signup("admin@example.com").await;
    let agent = fixture.signup("agent@example.com").await;

    let resp = fixture.get(&agent, "/api/users").send().await.unwrap();
    assert_eq!(error_code(resp).await, (403, "FORBIDDEN".to_string()));

    let users = data(fixture.get(&admin, "/api/users").send().await.unwrap()).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);

    let admin_id = users.iter().find(|u| u["role"] == "admin").unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let agent_id = users.iter().find(|u| u["role"] == "agent").unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // An admin cannot demote themself
    let resp = fixture
        .put(&admin, &format!("/api/users/{}/role", admin_id), json!({"role": "agent"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    let promoted = data(
        fixture
            .put(&admin, &format!("/api/users/{}/role", agent_id), json!({"role": "admin"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(promoted["role"], "admin");

    // Role changes apply to tokens issued before the change
    let resp = fixture.get(&agent, "/api/users").send().await.unwrap();
    assert_eq!(resp.status(), 200);

    fixture
        .put(&admin, &format!("/api/users/{}/role", agent_id), json!({"role": "agent"}))
        .send()
        .await
        .unwrap();
    let resp = fixture.get(&agent, "/api/users").send().await.unwrap();
    assert_eq!(error_code(resp).await, (403, "FORBIDDEN".to_string()));
}

#[tokio::test]
async fn test_config_tables() {
    let fixture = TestFixture::new().await;
    let admin = fixture.signup("admin@example.com").await;
    let agent = fixture.signup("agent@example.com").await;

    let tema = data(
        fixture
            .post(&admin, "/api/config/temas", json!({"name": "Redes", "color": "#1A2b3C"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let tema_id = tema["id"].as_str().unwrap().to_string();

    // Agents can read but not write
    let list = data(fixture.get(&agent, "/api/config/temas").send().await.unwrap()).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let resp = fixture
        .post(&agent, "/api/config/temas", json!({"name": "Hardware"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (403, "FORBIDDEN".to_string()));

    // Unique names
    let resp = fixture
        .post(&admin, "/api/config/temas", json!({"name": "Redes"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (409, "CONFLICT".to_string()));

    // Colors must be #RRGGBB, and required for the palette
    let resp = fixture
        .post(&admin, "/api/config/colores", json!({"name": "Rojo", "color": "red"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));
    let resp = fixture
        .post(&admin, "/api/config/colores", json!({"name": "Rojo"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    let resp = fixture.get(&admin, "/api/config/unknown").send().await.unwrap();
    assert_eq!(error_code(resp).await, (404, "NOT_FOUND".to_string()));

    // Deleting a referenced tema clears the ticket's reference
    let ticket = data(
        fixture
            .post(&agent, "/api/tickets", json!({"title": "Sin red", "temaId": tema_id}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(ticket["temaId"], tema_id.as_str());

    data(
        fixture
            .delete(&admin, &format!("/api/config/temas/{}", tema_id))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let ticket = data(
        fixture
            .get(&agent, &format!("/api/tickets/{}", ticket["id"].as_str().unwrap()))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(ticket["temaId"].is_null());
}

#[tokio::test]
async fn test_ticket_lifecycle_and_stats() {
    let fixture = TestFixture::new().await;
    let token = fixture.signup("agent@example.com").await;

    let ticket = data(
        fixture
            .post(&token, "/api/tickets", json!({"title": "Impresora", "priority": "high"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(ticket["status"], "open");
    assert!(ticket["resolvedAt"].is_null());
    let path = format!("/api/tickets/{}", ticket["id"].as_str().unwrap());

    data(
        fixture
            .post(&token, "/api/tickets", json!({"title": "Correo"}))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let resolved = data(
        fixture
            .put(&token, &path, json!({"status": "resolved"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(resolved["resolvedAt"].is_string());

    let stats = data(
        fixture
            .get(&token, "/api/tickets/stats?days=3")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["open"], 1);
    assert_eq!(stats["byStatus"]["resolved"], 1);
    assert_eq!(stats["byPriority"]["high"], 1);
    assert_eq!(stats["byPriority"]["medium"], 1);

    let created = stats["createdPerDay"].as_array().unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(created[0]["count"], 0);
    assert_eq!(created[2]["count"], 2);
    assert_eq!(stats["resolvedPerDay"][2]["count"], 1);

    let resp = fixture
        .get(&token, "/api/tickets/stats?days=91")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    // Reopening clears the resolution time
    let reopened = data(
        fixture
            .put(&token, &path, json!({"status": "in_progress"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(reopened["resolvedAt"].is_null());

    data(fixture.delete(&token, &path).send().await.unwrap()).await;
    let resp = fixture.get(&token, &path).send().await.unwrap();
    assert_eq!(error_code(resp).await, (404, "NOT_FOUND".to_string()));
}

#[tokio::test]
async fn test_note_permissions() {
    let fixture = TestFixture::new().await;
    let admin = fixture.signup("admin@example.com").await;
    let author = fixture.signup("author@example.com").await;
    let other = fixture.signup("other@example.com").await;

    let note = data(
        fixture
            .post(&author, "/api/notes", json!({"title": "Guardia", "content": "Backups"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let path = format!("/api/notes/{}", note["id"].as_str().unwrap());

    let resp = fixture
        .put(&other, &path, json!({"content": "hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (403, "FORBIDDEN".to_string()));

    let updated = data(
        fixture
            .put(&author, &path, json!({"status": "closed"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(updated["status"], "closed");
    assert_eq!(updated["content"], "Backups");

    let resp = fixture.delete(&other, &path).send().await.unwrap();
    assert_eq!(error_code(resp).await, (403, "FORBIDDEN".to_string()));

    data(fixture.delete(&admin, &path).send().await.unwrap()).await;
}

#[tokio::test]
async fn test_events_and_calendar() {
    let fixture = TestFixture::new().await;
    let token = fixture.signup("agent@example.com").await;

    let monthly = data(
        fixture
            .post(
                &token,
                "/api/events",
                json!({
                    "title": "Cierre de mes",
                    "start": "2024-01-31T16:00:00Z",
                    "end": "2024-01-31T17:00:00Z",
                    "recurrence": "monthly"
                }),
            )
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(monthly["recurrence"], "monthly");

    data(
        fixture
            .post(
                &token,
                "/api/events",
                json!({
                    "title": "Migración",
                    "start": "2024-02-09T22:00:00Z",
                    "end": "2024-02-11T02:00:00Z"
                }),
            )
            .send()
            .await
            .unwrap(),
    )
    .await;

    let days = data(
        fixture
            .get(&token, "/api/events/calendar?from=2024-02-01&to=2024-02-29")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let dates: Vec<&str> = days
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["date"].as_str().unwrap())
        .collect();
    // Multi-day event spans three days; monthly one clamps to Feb 29
    assert_eq!(dates, vec!["2024-02-09", "2024-02-10", "2024-02-11", "2024-02-29"]);
    assert_eq!(days[3]["events"][0]["title"], "Cierre de mes");

    let resp = fixture
        .get(&token, "/api/events/calendar?from=2024-03-01&to=2024-02-01")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    // End before start is rejected
    let resp = fixture
        .post(
            &token,
            "/api/events",
            json!({
                "title": "Roto",
                "start": "2024-02-09T10:00:00Z",
                "end": "2024-02-09T09:00:00Z"
            }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    let path = format!("/api/events/{}", monthly["id"].as_str().unwrap());
    let updated = data(
        fixture
            .put(&token, &path, json!({"location": "Sala 2"}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(updated["location"], "Sala 2");
    data(fixture.delete(&token, &path).send().await.unwrap()).await;
}

#[tokio::test]
async fn test_upload_search_and_delete_resource() {
    let fixture = TestFixture::new().await;
    let token = fixture.signup("agent@example.com").await;

    let form = multipart::Form::new()
        .part(
            "file",
            multipart::Part::bytes(b"Paso 1: instalar el cliente".to_vec())
                .file_name("guia vpn.txt")
                .mime_str("text/plain")
                .unwrap(),
        )
        .text("title", "Guía de conexión")
        .text("tags", "VPN, acceso, vpn");

    let resource = data(
        fixture
            .client
            .post(fixture.url("/api/resources/upload"))
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(resource["kind"], "file");
    assert_eq!(resource["tags"], json!(["vpn", "acceso"]));
    assert_eq!(resource["sizeBytes"], 27);
    let url = resource["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/files/resources/"));
    assert!(url.ends_with("/guia_vpn.txt"));

    // Stored file is served back
    let resp = fixture.client.get(fixture.url(&url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Paso 1: instalar el cliente");

    data(
        fixture
            .post(
                &token,
                "/api/resources",
                json!({"title": "Portal de impresoras", "url": "https://print.example.com"}),
            )
            .send()
            .await
            .unwrap(),
    )
    .await;

    let found = data(
        fixture
            .get(&token, "/api/resources/search?q=vpn")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["results"][0]["resource"]["id"], resource["id"]);

    let links = data(
        fixture
            .get(&token, "/api/resources?kind=link")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(links.as_array().unwrap().len(), 1);

    // Links need an http(s) URL
    let resp = fixture
        .post(&token, "/api/resources", json!({"title": "Roto", "url": "ftp://x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    let path = format!("/api/resources/{}", resource["id"].as_str().unwrap());
    data(fixture.delete(&token, &path).send().await.unwrap()).await;

    let resp = fixture.client.get(fixture.url(&url)).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let found = data(
        fixture
            .get(&token, "/api/resources/search?q=vpn")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(found["total"], 0);

    let on_disk = fixture
        .temp_dir
        .path()
        .join("uploads")
        .join(url.trim_start_matches("/files/"));
    assert!(!on_disk.exists());
}

#[tokio::test]
async fn test_upload_requires_non_empty_file() {
    let fixture = TestFixture::new().await;
    let token = fixture.signup("agent@example.com").await;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(Vec::new()).file_name("empty.txt"),
    );
    let resp = fixture
        .client
        .post(fixture.url("/api/resources/upload"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));
}

#[tokio::test]
async fn test_wizard_signup_flow() {
    let fixture = TestFixture::new().await;

    let mut state = json!({"step": "start"});
    let mut last = Value::Null;
    for input in ["hola", "sign up", "Ana", "ana@example.com", "password123"] {
        let resp = fixture
            .client
            .post(fixture.url("/api/assistant/wizard"))
            .json(&json!({"state": state, "input": input}))
            .send()
            .await
            .unwrap();
        last = data(resp).await;
        state = last["state"].clone();
    }

    assert_eq!(last["done"], true);
    assert_eq!(last["state"]["step"], "done");
    let token = last["token"].as_str().unwrap();
    let me = data(fixture.get(token, "/api/me").send().await.unwrap()).await;
    assert_eq!(me["email"], "ana@example.com");
}

#[tokio::test]
async fn test_wizard_cancel_and_reprompt() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/assistant/wizard"))
        .json(&json!({"state": {"step": "login_email"}, "input": "not an email"}))
        .send()
        .await
        .unwrap();
    let step = data(resp).await;
    assert_eq!(step["state"]["step"], "login_email");
    assert_eq!(step["done"], false);

    let resp = fixture
        .client
        .post(fixture.url("/api/assistant/wizard"))
        .json(&json!({"state": {"step": "login_email"}, "input": "Cancel"}))
        .send()
        .await
        .unwrap();
    assert_eq!(data(resp).await["state"]["step"], "choose_flow");
}

#[tokio::test]
async fn test_assistant_unavailable_without_key() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/assistant"))
        .json(&json!({"message": "¿Cómo configuro la VPN?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        error_code(resp).await,
        (503, "ASSISTANT_UNAVAILABLE".to_string())
    );
}

#[tokio::test]
async fn test_assistant_answers_with_sources() {
    async fn fake_gemini(Json(body): Json<Value>) -> Json<Value> {
        let system = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();
        let grounded = system.contains("Guía VPN");
        Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": format!("grounded={}", grounded)}]}
            }]
        }))
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mock_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let app = Router::new().route("/models/{call}", post(fake_gemini));
        axum::serve(listener, app).await.unwrap();
    });

    let fixture = TestFixture::with_gemini(Some(GeminiConfig {
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        api_base: format!("http://{}", mock_addr),
    }))
    .await;
    let token = fixture.signup("agent@example.com").await;

    data(
        fixture
            .post(
                &token,
                "/api/resources",
                json!({"title": "Guía VPN", "url": "https://wiki.example.com/vpn", "tags": ["vpn"]}),
            )
            .send()
            .await
            .unwrap(),
    )
    .await;

    let resp = fixture
        .client
        .post(fixture.url("/api/assistant"))
        .json(&json!({
            "message": "no me conecta la vpn",
            "history": [{"role": "user", "content": "hola"}, {"role": "assistant", "content": "hola"}]
        }))
        .send()
        .await
        .unwrap();
    let reply = data(resp).await;
    assert_eq!(reply["reply"], "grounded=true");
    assert_eq!(reply["sources"][0]["title"], "Guía VPN");

    let resp = fixture
        .client
        .post(fixture.url("/api/assistant"))
        .json(&json!({"message": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let fixture = TestFixture::new().await;
    let token = fixture.signup("agent@example.com").await;

    // Missing required field
    let resp = fixture
        .post(&token, "/api/tickets", json!({"priority": "high"}))
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    // Body that is not JSON at all
    let resp = fixture
        .client
        .post(fixture.url("/api/tickets"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    // Unparseable query string
    let resp = fixture
        .get(&token, "/api/events/calendar?from=garbage&to=2024-03-01")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));

    let resp = fixture
        .get(&token, "/api/resources/search?q=vpn&limit=many")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(resp).await, (400, "VALIDATION_ERROR".to_string()));
}
