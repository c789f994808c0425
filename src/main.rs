use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::database::RecordStore;

mod config;
mod database;
mod endpoints;
mod error;
mod model;
mod rules;

/// Builds the application around a record store.
pub fn router(store: Arc<RecordStore>) -> Router {
    // The mobile and web clients are served from elsewhere, so any origin may call in
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(AllowOrigin::any());

    // Layers added last wrap the ones added first
    Router::new()
        .route("/", get(endpoints::status))
        .route("/api/students", get(endpoints::student::list))
        .route("/api/students/register", post(endpoints::student::register))
        .route(
            "/api/students/{position}",
            get(endpoints::student::detail).delete(endpoints::student::delete),
        )
        .route(
            "/api/students/{position}/credit_decrease",
            post(endpoints::student::decrease_credit),
        )
        .route("/api/cashier/total", get(endpoints::cashier::total))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

#[tokio::main]
async fn main() {
    let config = Config::load();

    // Begin logging
    let level = config
        .as_ref()
        .ok()
        .and_then(|c| c.level().ok())
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not set up logging: {e}");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    let store = Arc::new(RecordStore::new(&config.data_file));
    match store.load_all() {
        Ok(records) => info!(
            "Using {} ({} records)",
            store.path().display(),
            records.len()
        ),
        Err(e) => {
            error!("{e}");
            return;
        }
    }

    let app = router(store);

    let served = match &config.tls {
        Some(tls) => {
            if rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .is_err()
            {
                warn!("A rustls crypto provider was already installed");
            }

            let rustls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(c) => c,
                Err(e) => {
                    error!("Could not load TLS certificate: {e}");
                    return;
                }
            };

            info!("Listening on https://{addr}");
            axum_server::bind_rustls(addr, rustls_config)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("Listening on http://{addr}");
            axum_server::bind(addr).serve(app.into_make_service()).await
        }
    };

    if let Err(e) = served {
        error!("Server stopped: {e}");
    }
}
