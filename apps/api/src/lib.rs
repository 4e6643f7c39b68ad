//! # Steel POS API
//!
//! REST back office for the steel shop: invoices, the payment ledger,
//! import orders, catalog, customers and the audit trail.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Routes                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /invoices     │  │ /invoice-      │  │  /import-orders            ││
//! │  │                │  │   payments     │  │                            ││
//! │  │ • CRUD, code   │  │ • register     │  │ • CRUD (pending only)      ││
//! │  │ • summary      │  │ • correct      │  │ • approve → stock          ││
//! │  │ • print        │  │ • delete       │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /customers    │  │  /products     │  │  /audit-logs               ││
//! │  │  /health       │  │  /variants     │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  AuthUser (JWT) ──► Actor ──► steel-db unit of work ──► ApiResponse    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HOST` / `PORT` - bind address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH` - SQLite file (default: ./steel-pos.db)
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - HS256 secret for bearer tokens
//! - `STORE_NAME` - receipt header
//! - `RUST_LOG` - tracing filter (default: info)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod render;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use steel_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::{AuthUser, Claims, JwtManager, Role};
pub use config::ServerConfig;
pub use error::ApiError;
pub use render::{DocumentRenderer, TextReceiptRenderer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        AppState {
            db,
            jwt: Arc::new(JwtManager::new(&config.jwt_secret)),
            renderer: Arc::new(TextReceiptRenderer::new(config.store_name.clone())),
        }
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

/// Builds the router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        // Customers
        .route("/customers", get(routes::customers::list).post(routes::customers::create))
        .route("/customers/phone/{phone}", get(routes::customers::get_by_phone))
        .route(
            "/customers/{id}",
            get(routes::customers::get)
                .put(routes::customers::update)
                .delete(routes::customers::delete),
        )
        // Catalog
        .route("/products", get(routes::products::list).post(routes::products::create))
        .route(
            "/products/{id}",
            get(routes::products::get)
                .put(routes::products::update)
                .delete(routes::products::delete),
        )
        .route("/products/{id}/variants", post(routes::products::add_variant))
        .route(
            "/products/variants/{id}",
            get(routes::products::get_variant)
                .put(routes::products::update_variant)
                .delete(routes::products::delete_variant),
        )
        .route("/variants/{id}/movements", get(routes::products::movements))
        // Invoices
        .route("/invoices", get(routes::invoices::list).post(routes::invoices::create))
        .route("/invoices/summary", get(routes::invoices::summary))
        .route("/invoices/code/{code}", get(routes::invoices::get_by_code))
        .route(
            "/invoices/{id}",
            get(routes::invoices::get)
                .put(routes::invoices::update)
                .delete(routes::invoices::delete),
        )
        .route("/invoices/{id}/print", get(routes::invoices::print))
        // Payment ledger: POST takes the invoice id, the rest a payment id
        .route(
            "/invoice-payments/{id}",
            post(routes::payments::register)
                .get(routes::payments::get)
                .put(routes::payments::correct)
                .delete(routes::payments::delete),
        )
        // Audit trail
        .route("/audit-logs", get(routes::audit_logs::list))
        .route("/audit-logs/entity/{entity_type}/{entity_id}", get(routes::audit_logs::by_entity))
        .route(
            "/audit-logs/id/{id}",
            get(routes::audit_logs::get).delete(routes::audit_logs::delete),
        )
        // Purchasing
        .route(
            "/import-orders",
            get(routes::import_orders::list).post(routes::import_orders::create),
        )
        .route(
            "/import-orders/{id}",
            get(routes::import_orders::get)
                .put(routes::import_orders::update)
                .delete(routes::import_orders::delete),
        )
        .route("/import-orders/{id}/approve", post(routes::import_orders::approve))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
