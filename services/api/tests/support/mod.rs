//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use api::middleware::{Claims, JwtVerifier, TokenType};
use api::{AppState, create_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::config::{
    AppConfig, AuthConfig, MediaConfig, ServerConfig, StorageConfig, DEFAULT_PRESIGN_TTL_SECS,
};
use common::database::DatabaseConfig;
use jsonwebtoken::{EncodingKey, Header};
use media::VideoRecord;
use media::testing::{FakeTools, MemoryRecordStore, MemoryStorage};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_PRIVATE_KEY: &str = include_str!("../fixtures/jwt_private.pem");
pub const JWT_PUBLIC_KEY: &str = include_str!("../fixtures/jwt_public.pem");
/// Signs tokens the service must not accept
pub const FOREIGN_PRIVATE_KEY: &str = include_str!("../fixtures/other_private.pem");

pub const TEST_BUCKET: &str = "tubely-test";
const BOUNDARY: &str = "tubely-test-boundary";

/// A router wired to in-memory collaborators and a private staging directory
pub struct TestApp {
    pub router: Router,
    pub tools: Arc<FakeTools>,
    pub storage: Arc<MemoryStorage>,
    pub records: Arc<MemoryRecordStore>,
    pub staging: TempDir,
}

impl TestApp {
    pub fn new(tools: FakeTools) -> Self {
        Self::with_upload_limit(tools, 16 * 1024 * 1024)
    }

    pub fn with_upload_limit(tools: FakeTools, max_upload_bytes: u64) -> Self {
        let staging = TempDir::new().unwrap();
        let config = test_config(staging.path().to_path_buf(), max_upload_bytes);

        let tools = Arc::new(tools);
        let storage = Arc::new(MemoryStorage::new());
        let records = Arc::new(MemoryRecordStore::new());
        let jwt = JwtVerifier::from_config(&config.auth).unwrap();

        let state = AppState::new(
            &config,
            tools.clone(),
            storage.clone(),
            records.clone(),
            jwt,
        );

        Self {
            router: create_router(state),
            tools,
            storage,
            records,
            staging,
        }
    }

    /// Insert a fresh record owned by `owner`
    pub fn seed_video(&self, owner: Uuid) -> VideoRecord {
        let record = VideoRecord::draft(owner, "Boots on the ground");
        self.records.insert(record.clone());
        record
    }

    pub fn residual_files(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

fn test_config(staging_dir: PathBuf, max_upload_bytes: u64) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes,
        },
        storage: StorageConfig {
            bucket: TEST_BUCKET.to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            presign_ttl_secs: DEFAULT_PRESIGN_TTL_SECS,
        },
        media: MediaConfig {
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            tool_timeout_secs: 5,
            staging_dir: Some(staging_dir),
        },
        database: DatabaseConfig::default(),
        auth: AuthConfig {
            jwt_public_key: Some(JWT_PUBLIC_KEY.to_string()),
        },
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn sign_claims(claims: &Claims, private_key: &str) -> String {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(jsonwebtoken::Algorithm::RS256), claims, &key).unwrap()
}

pub fn claims_for(user_id: Uuid, token_type: TokenType, expires_in: i64) -> Claims {
    let iat = now();
    Claims {
        sub: user_id,
        roles: vec!["user".to_string()],
        permissions: vec![],
        iat,
        exp: iat.saturating_add_signed(expires_in),
        token_type,
    }
}

/// A valid access token for `user_id`
pub fn access_token(user_id: Uuid) -> String {
    sign_claims(&claims_for(user_id, TokenType::Access, 900), JWT_PRIVATE_KEY)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// A multipart upload with a single file field
pub fn upload(
    video_id: &str,
    token: &str,
    field: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"boots.mp4\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(format!("/videos/{video_id}/upload"))
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// About 2 MB of bytes standing in for an mp4
pub fn sample_video() -> Vec<u8> {
    (0..2 * 1024 * 1024).map(|i| (i % 251) as u8).collect()
}
