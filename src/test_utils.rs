use std::io::Cursor;
use std::path::Path;

use crate::auth::TokenService;
use crate::router::create_router;
use crate::schemas::AppState;
use crate::storage::MediaStorage;
use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use model::entities::user;
use model::users::UserManager;
use sea_orm::{Database, DatabaseConnection};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const TEST_PASSWORD: &str = "testpass123";

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing, storing media below `media_root`
pub async fn setup_test_app_state(media_root: &Path) -> AppState {
    AppState {
        db: setup_test_db().await,
        users: UserManager::new(4),
        tokens: TokenService::new("test-secret", 1),
        media: MediaStorage::new(media_root),
    }
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is taken from RUST_LOG, defaulting to WARN.
fn init_test_tracing() {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    // Another test may have installed it already
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A running test server together with the state behind it.
pub struct TestContext {
    pub server: TestServer,
    pub state: AppState,
    pub media: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        init_test_tracing();

        let media = tempfile::tempdir().expect("Failed to create media directory");
        let state = setup_test_app_state(media.path()).await;
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");

        Self {
            server,
            state,
            media,
        }
    }

    /// Insert a user with [`TEST_PASSWORD`].
    pub async fn create_user(&self, email: &str) -> user::Model {
        self.state
            .users
            .create_user(&self.state.db, Some(email), TEST_PASSWORD)
            .await
            .expect("Failed to create test user")
    }

    /// `Authorization` header carrying a fresh token for `user`.
    pub fn auth_header(&self, user: &user::Model) -> (HeaderName, HeaderValue) {
        let token = self.state.tokens.issue(user).expect("Failed to issue token");
        let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid header value");
        (header::AUTHORIZATION, value)
    }
}

/// A small valid JPEG.
pub fn sample_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(10, 10, image::Rgb([200, 80, 40]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    bytes.into_inner()
}
