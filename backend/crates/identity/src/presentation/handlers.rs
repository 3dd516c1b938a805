//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;
use uuid::Uuid;

use kernel::id::AccountId;

use crate::application::config::IdentityConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, DeleteAccountUseCase, LoginInput, LoginUseCase,
    RegisterInput, RegisterUseCase, ResendOutcome, ResendVerificationUseCase, UpdateRoleUseCase,
    VerifyEmailUseCase,
};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::AccountRole;
use crate::error::{IdentityError, IdentityResult};
use crate::infra::mailer::Mailer;
use crate::presentation::dto::{
    AccountResponse, ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse, ResendVerificationRequest, ResendVerificationResponse, UpdateRoleRequest,
    VerifyEmailResponse,
};
use crate::presentation::middleware::CurrentAccount;

/// Shared state for identity handlers
pub struct IdentityAppState<R, M>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<IdentityConfig>,
}

impl<R, M> Clone for IdentityAppState<R, M>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /auth/register
pub async fn register<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> IdentityResult<impl IntoResponse>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let input = RegisterInput {
        email: req.email,
        display_name: req.display_name,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account: AccountResponse::from(&output.account),
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /auth/login
pub async fn login<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> IdentityResult<Json<LoginResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let input = LoginInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok(Json(LoginResponse {
        token: output.token.token.clone(),
        expires_at_ms: output.token.expires_at_ms(),
        account: AccountResponse::from(&output.account),
    }))
}

// ============================================================================
// Identity lookup
// ============================================================================

/// GET /auth/me
pub async fn me(Extension(current): Extension<CurrentAccount>) -> Json<AccountResponse> {
    Json(AccountResponse::from(&current.0))
}

// ============================================================================
// Email verification
// ============================================================================

/// GET /auth/verify-email/{token}
pub async fn verify_email<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Path(token): Path<String>,
) -> IdentityResult<Json<VerifyEmailResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = VerifyEmailUseCase::new(state.repo.clone());

    let account = use_case.execute(&token).await?;

    Ok(Json(VerifyEmailResponse {
        verified: true,
        account: AccountResponse::from(&account),
    }))
}

/// POST /auth/resend-verification
pub async fn resend_verification<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Json(req): Json<ResendVerificationRequest>,
) -> IdentityResult<Json<ResendVerificationResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = ResendVerificationUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let outcome = use_case.execute(req.email).await?;

    let status = match outcome {
        ResendOutcome::Sent => "sent",
        ResendOutcome::AlreadyVerified => "already_verified",
    };

    Ok(Json(ResendVerificationResponse {
        status: status.to_string(),
    }))
}

// ============================================================================
// Password / account management
// ============================================================================

/// PATCH /auth/change-password
pub async fn change_password<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Extension(current): Extension<CurrentAccount>,
    Json(req): Json<ChangePasswordRequest>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());

    let input = ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };

    use_case.execute(&current.0, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /auth/account
pub async fn delete_account<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Extension(current): Extension<CurrentAccount>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = DeleteAccountUseCase::new(state.repo.clone());

    use_case.execute(&current.0.account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin (account-role gated by middleware)
// ============================================================================

/// PATCH /auth/accounts/{id}/role
pub async fn update_account_role<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> IdentityResult<Json<AccountResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let role = AccountRole::from_code(&req.role)
        .ok_or_else(|| IdentityError::Validation(format!("Unknown role: {}", req.role)))?;

    let use_case = UpdateRoleUseCase::new(state.repo.clone());

    let account = use_case
        .execute(&AccountId::from_uuid(account_id), role)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

/// DELETE /auth/accounts/{id}
pub async fn delete_account_by_id<R, M>(
    State(state): State<IdentityAppState<R, M>>,
    Path(account_id): Path<Uuid>,
) -> IdentityResult<StatusCode>
where
    R: AccountRepository + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = DeleteAccountUseCase::new(state.repo.clone());

    use_case.execute(&AccountId::from_uuid(account_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
