//! Identity Middleware
//!
//! Three layers, applied outermost first on protected routes:
//! 1. rate limiting - rejects excess traffic before any token work
//! 2. session validation - turns the bearer token into a `CurrentAccount`
//! 3. admin gate - account-role check on admin-only routes

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use platform::client::client_key;
use platform::rate_limit::{MemoryRateLimitStore, RateLimitConfig, now_unix_ms};

use crate::application::config::IdentityConfig;
use crate::application::current_account::ResolveSessionUseCase;
use crate::domain::authorization::{Access, Actor, require_role};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::AccountRole;
use crate::error::IdentityError;

// ============================================================================
// Session validation
// ============================================================================

/// The authenticated account, attached to request extensions by
/// [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

impl CurrentAccount {
    /// Identity view for the authorization engine
    pub fn actor(&self) -> Actor {
        Actor {
            account_id: self.0.account_id,
            role: self.0.role,
        }
    }
}

/// Session middleware state
pub struct SessionLayerState<R>
where
    R: AccountRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<IdentityConfig>,
}

impl<R> Clone for SessionLayerState<R>
where
    R: AccountRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

/// Middleware that requires a valid bearer session.
///
/// Extracts `Authorization: Bearer <token>`, validates signature and expiry,
/// and requires the subject to resolve to a live account with a matching
/// token epoch. Every failure is the one `TokenInvalidOrExpired` outcome.
pub async fn require_session<R>(
    State(state): State<SessionLayerState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let Some(token) = extract_bearer_token(req.headers()) else {
        return Err(IdentityError::TokenInvalidOrExpired.into_response());
    };

    let use_case = ResolveSessionUseCase::new(state.repo.clone(), state.config.clone());

    let account = match use_case.execute(&token).await {
        Ok(account) => account,
        Err(e) => return Err(e.into_response()),
    };

    req.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(req).await)
}

/// Middleware that requires the authenticated account to be an admin.
///
/// Must run inside [`require_session`]. The account is already known to
/// exist, so a deny is an explicit Forbidden, not a hidden NotFound.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, Response> {
    let Some(current) = req.extensions().get::<CurrentAccount>() else {
        return Err(IdentityError::TokenInvalidOrExpired.into_response());
    };

    if require_role(&current.actor(), AccountRole::Admin) == Access::Deny {
        return Err(IdentityError::Forbidden.into_response());
    }

    Ok(next.run(req).await)
}

/// Pull the token out of the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Per-route-class budgets.
#[derive(Debug, Clone)]
pub struct RouteLimits {
    /// Login/registration-adjacent routes
    pub credential: RateLimitConfig,
    /// Identity-lookup ("who am I") route
    pub lookup: RateLimitConfig,
    /// All other authenticated API routes
    pub general: RateLimitConfig,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            credential: RateLimitConfig::new(5, 15 * 60),
            lookup: RateLimitConfig::new(30, 60),
            general: RateLimitConfig::new(60, 60),
        }
    }
}

/// Route class of the guarded route; keys counters so classes never
/// interfere with each other.
#[derive(Debug, Clone, Copy)]
enum RouteClass {
    Credential,
    Lookup,
    General,
}

impl RouteClass {
    fn key_prefix(&self) -> &'static str {
        match self {
            RouteClass::Credential => "credential",
            RouteClass::Lookup => "lookup",
            RouteClass::General => "general",
        }
    }

    fn config<'a>(&self, limits: &'a RouteLimits) -> &'a RateLimitConfig {
        match self {
            RouteClass::Credential => &limits.credential,
            RouteClass::Lookup => &limits.lookup,
            RouteClass::General => &limits.general,
        }
    }
}

/// Rate limit middleware state
#[derive(Clone)]
pub struct RateLimitState {
    pub store: Arc<MemoryRateLimitStore>,
    pub limits: Arc<RouteLimits>,
}

impl RateLimitState {
    pub fn new(limits: RouteLimits) -> Self {
        Self {
            store: Arc::new(MemoryRateLimitStore::new()),
            limits: Arc::new(limits),
        }
    }
}

fn enforce<B>(
    class: RouteClass,
    state: &RateLimitState,
    req: &Request<B>,
) -> Result<(), IdentityError> {
    let direct_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());

    let client = client_key(req.headers(), direct_ip);
    let key = format!("{}:{}", class.key_prefix(), client);

    let now_ms = now_unix_ms();
    let result = state.store.check_at(&key, class.config(&state.limits), now_ms);

    if result.allowed {
        Ok(())
    } else {
        tracing::warn!(
            client = %client,
            class = class.key_prefix(),
            "Rate limit exceeded"
        );
        Err(IdentityError::RateLimited {
            retry_after_secs: result.retry_after_secs(now_ms),
        })
    }
}

/// 5 requests / 15 minutes per client for credential routes
pub async fn rate_limit_credential(
    State(state): State<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    match enforce(RouteClass::Credential, &state, &req) {
        Ok(()) => Ok(next.run(req).await),
        Err(e) => Err(e.into_response()),
    }
}

/// 30 requests / minute per client for the identity-lookup route
pub async fn rate_limit_lookup(
    State(state): State<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    match enforce(RouteClass::Lookup, &state, &req) {
        Ok(()) => Ok(next.run(req).await),
        Err(e) => Err(e.into_response()),
    }
}

/// 60 requests / minute per client for other authenticated routes
pub async fn rate_limit_general(
    State(state): State<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    match enforce(RouteClass::General, &state, &req) {
        Ok(()) => Ok(next.run(req).await),
        Err(e) => Err(e.into_response()),
    }
}
