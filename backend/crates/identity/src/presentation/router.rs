//! Identity Router

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::domain::repository::AccountRepository;
use crate::infra::mailer::Mailer;
use crate::presentation::handlers::{self, IdentityAppState};
use crate::presentation::middleware::{
    RateLimitState, RouteLimits, SessionLayerState, rate_limit_credential, rate_limit_general,
    rate_limit_lookup, require_admin, require_session,
};

/// Create the identity router.
///
/// Layer ordering matters: `.layer()` wraps the routes added so far, so the
/// last layer added runs first. Rate limiting is always added last to sit
/// outermost and reject excess traffic before any session validation or
/// authorization work.
pub fn identity_router<R, M>(
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
) -> Router
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let app_state = IdentityAppState {
        repo: repo.clone(),
        mailer,
        config: config.clone(),
    };
    let session_state = SessionLayerState { repo, config };
    let rate_limits = RateLimitState::new(RouteLimits::default());

    // Public credential routes: 5 requests / 15 minutes per client
    let credential = Router::new()
        .route("/register", post(handlers::register::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route(
            "/resend-verification",
            post(handlers::resend_verification::<R, M>),
        )
        .with_state(app_state.clone())
        .layer(middleware::from_fn_with_state(
            rate_limits.clone(),
            rate_limit_credential,
        ));

    // Public verification link target
    let verify = Router::new()
        .route(
            "/verify-email/{token}",
            get(handlers::verify_email::<R, M>),
        )
        .with_state(app_state.clone());

    // Identity lookup: 30 requests / minute per client
    let lookup = Router::new()
        .route("/me", get(handlers::me))
        .layer(middleware::from_fn_with_state(
            session_state.clone(),
            require_session::<R>,
        ))
        .layer(middleware::from_fn_with_state(
            rate_limits.clone(),
            rate_limit_lookup,
        ));

    // Other authenticated routes: 60 requests / minute per client
    let general = Router::new()
        .route(
            "/change-password",
            patch(handlers::change_password::<R, M>),
        )
        .route("/account", delete(handlers::delete_account::<R, M>))
        .with_state(app_state.clone())
        .layer(middleware::from_fn_with_state(
            session_state.clone(),
            require_session::<R>,
        ))
        .layer(middleware::from_fn_with_state(
            rate_limits.clone(),
            rate_limit_general,
        ));

    // Admin-only routes: session, then role gate, same general budget
    let admin = Router::new()
        .route(
            "/accounts/{id}/role",
            patch(handlers::update_account_role::<R, M>),
        )
        .route(
            "/accounts/{id}",
            delete(handlers::delete_account_by_id::<R, M>),
        )
        .with_state(app_state)
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            session_state,
            require_session::<R>,
        ))
        .layer(middleware::from_fn_with_state(
            rate_limits,
            rate_limit_general,
        ));

    Router::new()
        .merge(credential)
        .merge(verify)
        .merge(lookup)
        .merge(general)
        .merge(admin)
}
