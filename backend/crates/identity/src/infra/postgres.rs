//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use sqlx::PgPool;
use uuid::Uuid;

use platform::password::HashedPassword;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{AccountRole, DisplayName, Email};
use crate::domain::verification::PendingVerification;
use crate::error::{IdentityError, IdentityResult};

const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    email,
    display_name,
    display_name_canonical,
    password_hash,
    account_role,
    email_verified,
    verification_digest,
    verification_expires_at,
    token_epoch,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    async fn insert(&self, account: &Account) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                email,
                display_name,
                display_name_canonical,
                password_hash,
                account_role,
                email_verified,
                verification_digest,
                verification_expires_at,
                token_epoch,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.display_name.original())
        .bind(account.display_name.canonical())
        .bind(account.password_hash.as_ref().map(|h| h.as_phc_string()))
        .bind(account.role.id())
        .bind(account.email_verified)
        .bind(account.verification.as_ref().map(|v| v.digest.as_slice()))
        .bind(account.verification.as_ref().map(|v| v.expires_at))
        .bind(account.token_epoch)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> IdentityResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1"
        ))
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_display_name(
        &self,
        canonical: &str,
        exclude: Option<&AccountId>,
    ) -> IdentityResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM accounts
                WHERE display_name_canonical = $1
                  AND ($2::uuid IS NULL OR account_id <> $2)
            )
            "#,
        )
        .bind(canonical)
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, account: &Account) -> IdentityResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2,
                display_name = $3,
                display_name_canonical = $4,
                password_hash = $5,
                account_role = $6,
                email_verified = $7,
                verification_digest = $8,
                verification_expires_at = $9,
                token_epoch = $10,
                updated_at = $11
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.display_name.original())
        .bind(account.display_name.canonical())
        .bind(account.password_hash.as_ref().map(|h| h.as_phc_string()))
        .bind(account.role.id())
        .bind(account.email_verified)
        .bind(account.verification.as_ref().map(|v| v.digest.as_slice()))
        .bind(account.verification.as_ref().map(|v| v.expires_at))
        .bind(account.token_epoch)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, account_id: &AccountId) -> IdentityResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume_verification(
        &self,
        digest: &[u8],
        now: DateTime<Utc>,
    ) -> IdentityResult<Option<Account>> {
        // Single read-modify-write: of any number of concurrent attempts
        // with the same secret, exactly one sees the row with the digest
        // still present and unexpired
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE accounts SET
                email_verified = TRUE,
                verification_digest = NULL,
                verification_expires_at = NULL,
                updated_at = $2
            WHERE verification_digest = $1
              AND verification_expires_at > $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(digest)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }
}

// ============================================================================
// Row mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    email: String,
    display_name: String,
    display_name_canonical: String,
    password_hash: Option<String>,
    account_role: i16,
    email_verified: bool,
    verification_digest: Option<Vec<u8>>,
    verification_expires_at: Option<DateTime<Utc>>,
    token_epoch: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> IdentityResult<Account> {
        let password_hash = self
            .password_hash
            .map(HashedPassword::from_phc_string)
            .transpose()
            // A stored credential that no longer parses is storage
            // corruption, not a wrong password
            .map_err(|e| IdentityError::Internal(format!("Corrupt stored credential: {e}")))?;

        let verification = match (self.verification_digest, self.verification_expires_at) {
            (Some(digest), Some(expires_at)) => Some(PendingVerification { digest, expires_at }),
            (None, None) => None,
            _ => {
                // The CHECK constraint pairs these; seeing one without the
                // other means the store broke its contract
                return Err(IdentityError::Internal(
                    "Unpaired verification fields".to_string(),
                ));
            }
        };

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            email: Email::from_db(self.email),
            display_name: DisplayName::from_db(self.display_name, self.display_name_canonical),
            password_hash,
            role: AccountRole::from_id(self.account_role),
            email_verified: self.email_verified,
            verification,
            token_epoch: self.token_epoch,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
