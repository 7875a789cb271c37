//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres and a `DataStore`
//! implementation over the tables the auth provider and the web app share:
//! `"user"`, `workspace` and `session`. Column names are camelCase and
//! therefore quoted. Timestamps are `timestamp(3)` without time zone and
//! hold UTC.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use plura_core::{
    new_record_id, NewWorkspace, PageRequest, PluraError, PluraResult, Session, StorageError,
    User, Workspace,
};
use plura_storage::DataStore;
use secrecy::{ExposeSecret, SecretString};
use tokio_postgres::{types::ToSql, NoTls, Row};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: SecretString,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "plura".to_string(),
            user: "postgres".to_string(),
            password: SecretString::from(String::new()),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// - `PLURA_DB_HOST`, `PLURA_DB_PORT`, `PLURA_DB_NAME`, `PLURA_DB_USER`,
    ///   `PLURA_DB_PASSWORD`
    /// - `PLURA_DB_POOL_SIZE` (default: 16)
    /// - `PLURA_DB_TIMEOUT` in seconds (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("PLURA_DB_HOST").unwrap_or(defaults.host),
            port: lookup("PLURA_DB_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: lookup("PLURA_DB_NAME").unwrap_or(defaults.dbname),
            user: lookup("PLURA_DB_USER").unwrap_or(defaults.user),
            password: lookup("PLURA_DB_PASSWORD")
                .map(SecretString::from)
                .unwrap_or(defaults.password),
            max_size: lookup("PLURA_DB_POOL_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: lookup("PLURA_DB_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// Connections are opened lazily, so this succeeds without a reachable
    /// server.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.expose_secret().to_string());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.max_size));

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// SQL
// ============================================================================

const USER_COLUMNS: &str =
    r#"id, name, email, "emailVerified", image, "createdAt", "updatedAt""#;

const WORKSPACE_COLUMNS: &str = r#"id, name, "userId", "createdAt", "updatedAt""#;

fn decode_error(entity: &'static str) -> impl Fn(tokio_postgres::Error) -> StorageError {
    move |e| StorageError::DecodeFailed {
        entity,
        reason: e.to_string(),
    }
}

fn user_from_row(row: &Row) -> Result<User, StorageError> {
    let err = decode_error("user");
    Ok(User {
        id: row.try_get("id").map_err(&err)?,
        name: row.try_get("name").map_err(&err)?,
        email: row.try_get("email").map_err(&err)?,
        email_verified: row.try_get("emailVerified").map_err(&err)?,
        image: row.try_get("image").map_err(&err)?,
        created_at: row
            .try_get::<_, NaiveDateTime>("createdAt")
            .map_err(&err)?
            .and_utc(),
        updated_at: row
            .try_get::<_, NaiveDateTime>("updatedAt")
            .map_err(&err)?
            .and_utc(),
    })
}

fn workspace_from_row(row: &Row) -> Result<Workspace, StorageError> {
    let err = decode_error("workspace");
    Ok(Workspace {
        id: row.try_get("id").map_err(&err)?,
        name: row.try_get("name").map_err(&err)?,
        user_id: row.try_get("userId").map_err(&err)?,
        created_at: row
            .try_get::<_, NaiveDateTime>("createdAt")
            .map_err(&err)?
            .and_utc(),
        updated_at: row
            .try_get::<_, NaiveDateTime>("updatedAt")
            .map_err(&err)?
            .and_utc(),
    })
}

fn session_from_row(row: &Row) -> Result<Session, StorageError> {
    let err = decode_error("session");
    Ok(Session {
        id: row.try_get("id").map_err(&err)?,
        token: row.try_get("token").map_err(&err)?,
        user_id: row.try_get("userId").map_err(&err)?,
        expires_at: row
            .try_get::<_, NaiveDateTime>("expiresAt")
            .map_err(&err)?
            .and_utc(),
    })
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// `DataStore` over a deadpool-postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Create a new store with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                reason: e.to_string(),
            })
    }

    /// Run `query` and record its outcome under `operation`/`entity`.
    async fn observed<T, Fut>(
        &self,
        operation: &'static str,
        entity: &'static str,
        query: Fut,
    ) -> PluraResult<T>
    where
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let start = Instant::now();
        let result = query.await;
        if let Some(metrics) = metrics() {
            metrics.record_db_operation(
                operation,
                entity,
                result.is_ok(),
                start.elapsed().as_secs_f64(),
            );
        }
        result.map_err(|e| {
            tracing::error!(operation, entity, error = %e, "Database operation failed");
            PluraError::from(e)
        })
    }

    async fn query_opt<T>(
        &self,
        entity: &'static str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        decode: fn(&Row) -> Result<T, StorageError>,
    ) -> Result<Option<T>, StorageError> {
        let client = self.client().await?;
        let row = client
            .query_opt(sql, params)
            .await
            .map_err(|e| StorageError::QueryFailed {
                entity,
                reason: e.to_string(),
            })?;
        row.as_ref().map(decode).transpose()
    }

    async fn query_all<T>(
        &self,
        entity: &'static str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        decode: fn(&Row) -> Result<T, StorageError>,
    ) -> Result<Vec<T>, StorageError> {
        let client = self.client().await?;
        let rows = client
            .query(sql, params)
            .await
            .map_err(|e| StorageError::QueryFailed {
                entity,
                reason: e.to_string(),
            })?;
        rows.iter().map(decode).collect()
    }
}

#[async_trait]
impl DataStore for PgStore {
    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    async fn user_find_unique(&self, id: &str) -> PluraResult<Option<User>> {
        let sql = format!(r#"SELECT {} FROM "user" WHERE id = $1"#, USER_COLUMNS);
        self.observed(
            "find_unique",
            "user",
            self.query_opt("user", &sql, &[&id], user_from_row),
        )
        .await
    }

    async fn user_find_many(&self, page: &PageRequest) -> PluraResult<Vec<User>> {
        let take = to_i64(page.take);
        let skip = to_i64(page.skip);

        let query = async {
            match &page.cursor {
                // The cursor row opens the page; an unknown cursor matches nothing.
                Some(cursor) => {
                    let sql = format!(
                        r#"SELECT {cols} FROM "user"
                           WHERE id >= $1 AND EXISTS (SELECT 1 FROM "user" c WHERE c.id = $1)
                           ORDER BY id ASC OFFSET $2 LIMIT $3"#,
                        cols = USER_COLUMNS
                    );
                    self.query_all("user", &sql, &[cursor, &skip, &take], user_from_row)
                        .await
                }
                None => {
                    let sql = format!(
                        r#"SELECT {} FROM "user" ORDER BY id ASC OFFSET $1 LIMIT $2"#,
                        USER_COLUMNS
                    );
                    self.query_all("user", &sql, &[&skip, &take], user_from_row)
                        .await
                }
            }
        };
        self.observed("find_many", "user", query).await
    }

    // ========================================================================
    // WORKSPACE OPERATIONS
    // ========================================================================

    async fn workspace_find_unique(&self, id: &str) -> PluraResult<Option<Workspace>> {
        let sql = format!("SELECT {} FROM workspace WHERE id = $1", WORKSPACE_COLUMNS);
        self.observed(
            "find_unique",
            "workspace",
            self.query_opt("workspace", &sql, &[&id], workspace_from_row),
        )
        .await
    }

    async fn workspace_find_many(&self, page: &PageRequest) -> PluraResult<Vec<Workspace>> {
        let take = to_i64(page.take);
        let skip = to_i64(page.skip);

        let query = async {
            match &page.cursor {
                Some(cursor) => {
                    let sql = r#"SELECT w.id, w.name, w."userId", w."createdAt", w."updatedAt"
                           FROM workspace w
                           JOIN workspace c ON c.id = $1
                           WHERE (w."createdAt", w.id) >= (c."createdAt", c.id)
                           ORDER BY w."createdAt" ASC, w.id ASC OFFSET $2 LIMIT $3"#;
                    self.query_all(
                        "workspace",
                        sql,
                        &[cursor, &skip, &take],
                        workspace_from_row,
                    )
                    .await
                }
                None => {
                    let sql = format!(
                        r#"SELECT {} FROM workspace ORDER BY "createdAt" ASC, id ASC OFFSET $1 LIMIT $2"#,
                        WORKSPACE_COLUMNS
                    );
                    self.query_all("workspace", &sql, &[&skip, &take], workspace_from_row)
                        .await
                }
            }
        };
        self.observed("find_many", "workspace", query).await
    }

    async fn workspace_list_by_user(&self, user_id: &str) -> PluraResult<Vec<Workspace>> {
        let sql = format!(
            r#"SELECT {} FROM workspace WHERE "userId" = $1 ORDER BY "createdAt" ASC, id ASC"#,
            WORKSPACE_COLUMNS
        );
        self.observed(
            "list_by_user",
            "workspace",
            self.query_all("workspace", &sql, &[&user_id], workspace_from_row),
        )
        .await
    }

    async fn workspace_create(&self, new: &NewWorkspace) -> PluraResult<Option<Workspace>> {
        new.validate()?;

        let id = new_record_id();
        let now = Utc::now().naive_utc();
        let sql = format!(
            r#"INSERT INTO workspace (id, name, "userId", "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $4)
               RETURNING {}"#,
            WORKSPACE_COLUMNS
        );

        let query = async {
            let client = self.client().await?;
            let row = client
                .query_opt(&sql, &[&id, &new.name, &new.user_id, &now])
                .await
                .map_err(|e| StorageError::InsertFailed {
                    entity: "workspace",
                    reason: e.to_string(),
                })?;
            row.as_ref().map(workspace_from_row).transpose()
        };
        self.observed("create", "workspace", query).await
    }

    async fn workspace_delete_owned(
        &self,
        id: &str,
        owner_id: &str,
    ) -> PluraResult<Option<Workspace>> {
        let sql = format!(
            r#"DELETE FROM workspace WHERE id = $1 AND "userId" = $2 RETURNING {}"#,
            WORKSPACE_COLUMNS
        );
        self.observed(
            "delete_owned",
            "workspace",
            self.query_opt("workspace", &sql, &[&id, &owner_id], workspace_from_row),
        )
        .await
    }

    // ========================================================================
    // SESSION OPERATIONS
    // ========================================================================

    async fn session_find_by_token(&self, token: &str) -> PluraResult<Option<Session>> {
        let sql = r#"SELECT id, token, "userId", "expiresAt" FROM session WHERE token = $1"#;
        self.observed(
            "find_by_token",
            "session",
            self.query_opt("session", sql, &[&token], session_from_row),
        )
        .await
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn health_check(&self) -> PluraResult<()> {
        let query = async {
            let client = self.client().await?;
            client
                .query_one("SELECT 1", &[])
                .await
                .map_err(|e| StorageError::QueryFailed {
                    entity: "health",
                    reason: e.to_string(),
                })?;
            Ok(())
        };
        self.observed("health_check", "pool", query).await
    }
}
