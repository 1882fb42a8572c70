use std::sync::Arc;

use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::catalog::{CreateCategoryInput, CreateProductInput},
    sessions::CartSessionStore,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Helper harness for spinning up application state backed by a
/// file-based SQLite database that lives for the duration of one test.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<CartSessionStore>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("failed to create temp dir for test database");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1",
            18_080,
            "test",
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let db_arc = Arc::new(pool);
        let store = Arc::new(CartSessionStore::new(cfg.cart.session_ttl_secs));
        let services =
            AppServices::new(db_arc.clone(), store.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            store,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Seed a product without a category, returning its id.
    pub async fn seed_product(&self, name: &str, price: Decimal) -> Uuid {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                price,
                image_url: None,
                description: None,
                category_id: None,
            })
            .await
            .expect("failed to seed product")
            .id
    }

    /// Seed a category, returning its id.
    #[allow(dead_code)]
    pub async fn seed_category(&self, name: &str, slug: &str) -> Uuid {
        self.state
            .services
            .catalog
            .create_category(CreateCategoryInput {
                name: name.to_string(),
                slug: slug.to_string(),
            })
            .await
            .expect("failed to seed category")
            .id
    }
}
