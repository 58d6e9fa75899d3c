use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// The sidebar shows at most this many spaces, newest first.
pub const SPACES_PAGE_SIZE: i64 = 10;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking a request indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserProfileRow {
    pub id: String,
    /// Stable identifier issued by the identity provider — the correlation key.
    pub clerk_user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    /// "google" | "email" | NULL when the sign-up strategy is unknown.
    pub provider_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_sign_in_at: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpaceRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub url: String,
    pub created_at: String,
}

/// The `{name, url}` projection the sidebar consumes.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct SpaceSummary {
    pub name: String,
    pub url: String,
}

/// Field set applied by a profile upsert (one identity webhook event).
///
/// `created_at` is honored only when the row is first inserted; an update
/// never rewrites it. `last_sign_in_at` overwrites only when present.
#[derive(Debug, Clone)]
pub struct ProfileUpsert {
    pub clerk_user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider_type: Option<String>,
    pub created_at: Option<String>,
    pub last_sign_in_at: Option<String>,
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("spacesd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            use sqlx::ConnectOptions as _;
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ─── User profiles ──────────────────────────────────────────────────────

    /// Insert-or-update a profile keyed on `clerk_user_id`.
    ///
    /// Repeated application of the same event is idempotent: the unique key
    /// guarantees one row per external identity, and conflicting inserts
    /// collapse into field updates.
    pub async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let created_at = profile.created_at.clone().unwrap_or_else(|| now.clone());
        sqlx::query(
            "INSERT INTO user_profiles \
               (id, clerk_user_id, email, first_name, last_name, avatar_url, \
                provider_type, created_at, updated_at, last_sign_in_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(clerk_user_id) DO UPDATE SET \
               email = excluded.email, \
               first_name = excluded.first_name, \
               last_name = excluded.last_name, \
               avatar_url = excluded.avatar_url, \
               provider_type = excluded.provider_type, \
               updated_at = excluded.updated_at, \
               last_sign_in_at = COALESCE(excluded.last_sign_in_at, user_profiles.last_sign_in_at)",
        )
        .bind(&id)
        .bind(&profile.clerk_user_id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .bind(&profile.provider_type)
        .bind(&created_at)
        .bind(&now)
        .bind(&profile.last_sign_in_at)
        .execute(&self.pool)
        .await
        .context("profile upsert failed")?;
        Ok(())
    }

    pub async fn get_profile(&self, clerk_user_id: &str) -> Result<Option<UserProfileRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM user_profiles WHERE clerk_user_id = ?")
                .bind(clerk_user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Resolve the external identity id to the internal profile id.
    pub async fn profile_id_for_identity(&self, clerk_user_id: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM user_profiles WHERE clerk_user_id = ?")
                .bind(clerk_user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Record a sign-in: set `last_sign_in_at` and `updated_at` to now.
    ///
    /// Returns whether a row matched. Zero rows is a success — the provider
    /// may deliver `session.created` before the profile has synced.
    pub async fn touch_last_sign_in(&self, clerk_user_id: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE user_profiles SET last_sign_in_at = ?, updated_at = ? WHERE clerk_user_id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(clerk_user_id)
        .execute(&self.pool)
        .await
        .context("sign-in update failed")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the profile for an external identity. Absent rows are a no-op.
    pub async fn delete_profile(&self, clerk_user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_profiles WHERE clerk_user_id = ?")
            .bind(clerk_user_id)
            .execute(&self.pool)
            .await
            .context("profile delete failed")?;
        Ok(())
    }

    // ─── Spaces ─────────────────────────────────────────────────────────────

    /// Up to [`SPACES_PAGE_SIZE`] spaces owned by `user_id`, newest first,
    /// projected to `{name, url}`.
    pub async fn list_spaces(&self, user_id: &str) -> Result<Vec<SpaceSummary>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT name, url FROM spaces WHERE user_id = ? \
                 ORDER BY created_at DESC LIMIT ?",
            )
            .bind(user_id)
            .bind(SPACES_PAGE_SIZE)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    /// Space creation belongs to the studio pipeline; the accessor exists for
    /// that caller and for test seeding.
    pub async fn insert_space(&self, user_id: &str, name: &str, url: &str) -> Result<SpaceRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO spaces (id, user_id, name, url, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(name)
            .bind(url)
            .bind(&now)
            .execute(&self.pool)
            .await
            .context("space insert failed")?;
        Ok(SpaceRow {
            id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            created_at: now,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
