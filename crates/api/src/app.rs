use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{ConsoleNotifier, Notifier};
use shared::clock::BusinessClock;
use shared::token::AcceptanceTokenSigner;

use crate::config::{Config, ConfigValidationError};
use crate::middleware::{metrics_handler, metrics_middleware};
use crate::routes::{check_ins, guests, health, invitations, visits};
use crate::services::{AdmissionService, LifecycleService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub clock: BusinessClock,
    pub signer: Arc<AcceptanceTokenSigner>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Lifecycle service bound to this request's state.
    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(
            self.pool.clone(),
            self.config.clone(),
            self.clock.clone(),
            self.signer.clone(),
            self.notifier.clone(),
        )
    }

    /// Admission service bound to this request's state.
    pub fn admission(&self) -> AdmissionService {
        AdmissionService::new(
            self.pool.clone(),
            self.config.clone(),
            self.clock.clone(),
            self.notifier.clone(),
        )
    }
}

/// Builds the production application state: system clock in the configured
/// business timezone, console notifier until an email transport exists.
pub fn build_state(config: Config, pool: PgPool) -> Result<AppState, ConfigValidationError> {
    let zone = config.business_zone()?;
    let config = Arc::new(config);
    let signer = Arc::new(AcceptanceTokenSigner::new(
        &config.security.token_secret,
        config.admission.acceptance_token_validity_days,
    ));

    Ok(AppState {
        pool,
        config,
        clock: BusinessClock::new(zone),
        signer,
        notifier: Arc::new(ConsoleNotifier),
    })
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, ConfigValidationError> {
    Ok(create_app_with_state(build_state(config, pool)?))
}

/// Builds the router for a prepared state. Tests inject a fixed clock or a
/// recording notifier through here.
pub fn create_app_with_state(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Staff routes: caller identity header enforced by the handlers.
    let staff_routes = Router::new()
        .route(
            "/api/v1/invitations",
            post(invitations::create_invitation).get(invitations::list_invitations),
        )
        .route(
            "/api/v1/invitations/:invitation_id",
            get(invitations::get_invitation),
        )
        .route(
            "/api/v1/invitations/:invitation_id/activate",
            post(invitations::activate_invitation),
        )
        .route(
            "/api/v1/invitations/:invitation_id/reissue",
            post(invitations::reissue_invitation),
        )
        .route(
            "/api/v1/invitations/:invitation_id/expire",
            post(invitations::expire_invitation),
        )
        .route(
            "/api/v1/visits/:visit_id/check-out",
            post(visits::check_out_visit),
        )
        .route(
            "/api/v1/guests/:guest_id/blacklist",
            post(guests::blacklist_guest).delete(guests::unblacklist_guest),
        )
        .route("/api/v1/guests/:guest_id", delete(guests::purge_guest));

    // Kiosk and guest self-service routes (no staff identity).
    let kiosk_routes = Router::new()
        .route("/api/v1/check-ins", post(check_ins::check_in))
        .route(
            "/api/v1/check-ins/override",
            post(check_ins::override_check_in),
        )
        .route("/api/v1/guests/register", post(guests::register_guest));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .merge(kiosk_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
