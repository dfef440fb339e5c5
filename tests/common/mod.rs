use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use formdrop::config::{Config, RateLimitConfig, UploadLimits};
use formdrop::db::SubmissionStore;
use formdrop::models::{NewSubmission, Submission};

/// How the in-memory store misbehaves, if at all.
#[derive(Clone, Copy, Default)]
#[allow(dead_code)]
pub enum StoreMode {
    #[default]
    Healthy,
    Failing,
    Slow(Duration),
    Panicking,
}

/// In-memory stand-in for the PostgreSQL store.
pub struct MemoryStore {
    records: Mutex<Vec<Submission>>,
    mode: StoreMode,
}

impl MemoryStore {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, new: &NewSubmission) -> Result<Submission, sqlx::Error> {
        match self.mode {
            StoreMode::Healthy => {}
            StoreMode::Failing => return Err(sqlx::Error::PoolTimedOut),
            StoreMode::Slow(delay) => tokio::time::sleep(delay).await,
            StoreMode::Panicking => panic!("store exploded"),
        }

        let now = Utc::now();
        let submission = Submission {
            id: Uuid::now_v7(),
            name: new.name.clone(),
            social_handle: new.social_handle.clone(),
            images: new.images.clone(),
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(submission.clone());
        Ok(submission)
    }

    async fn list_all(&self) -> Result<Vec<Submission>, sqlx::Error> {
        if let StoreMode::Failing = self.mode {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.records.lock().unwrap().clone())
    }
}

/// A running test server backed by a `MemoryStore` and a temporary upload dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub upload_dir: TempDir,
}

/// One image part for `TestApp::submit`.
pub struct Image {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
}

impl Image {
    pub fn new(filename: &'static str, len: usize) -> Self {
        Self {
            filename,
            bytes: vec![0xAB; len],
        }
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit a multipart form; `None` leaves the text field out entirely.
    pub async fn submit(
        &self,
        name: Option<&str>,
        social_handle: Option<&str>,
        images: Vec<Image>,
    ) -> (Value, StatusCode) {
        let mut form = Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        if let Some(handle) = social_handle {
            form = form.text("socialHandle", handle.to_string());
        }
        for image in images {
            let part = Part::bytes(image.bytes)
                .file_name(image.filename)
                .mime_str("image/png")
                .unwrap();
            form = form.part("images", part);
        }

        let resp = self
            .client
            .post(self.url("/api/submit"))
            .multipart(form)
            .send()
            .await
            .expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn list(&self) -> (Value, StatusCode) {
        self.get_json("/api/submissions").await
    }

    pub async fn get_json(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub fn stored_files(&self) -> Vec<String> {
        list_dir(self.upload_dir.path())
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        upload_dir: upload_dir.to_path_buf(),
        limits: UploadLimits::default(),
        max_body_size: 10 * 1024 * 1024,
        rate_limit: RateLimitConfig::default(),
        request_timeout: Duration::from_secs(30),
        db_connect_timeout: Duration::from_secs(1),
        cors_origins: vec![],
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(StoreMode::Healthy, |_| {}).await
}

/// Spawn a test app, letting the caller adjust the store and config first.
pub async fn spawn_app_with(mode: StoreMode, configure: impl FnOnce(&mut Config)) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let mut config = test_config(upload_dir.path());
    configure(&mut config);

    let store = Arc::new(MemoryStore::new(mode));
    let (app, _state) = formdrop::build_app(store.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        store,
        upload_dir,
    }
}
