use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row as _};
use tracing::{debug, info, warn};

use super::gateway::{DatabaseError, Gateway, Row, SqlParam};
use crate::config::DatabaseConfig;

/// PostgreSQL gateway over a shared connection pool.
///
/// Expects a `duties (id SERIAL PRIMARY KEY, name TEXT)` table to exist.
pub struct PgGateway {
    pool: PgPool,
    query_logging: bool,
    slow_query_threshold: Option<Duration>,
}

impl PgGateway {
    /// Open the pool once at startup
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool for {} (max_connections={})",
            Self::redact(&connection_string),
            config.max_connections
        );

        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            query_logging: config.enable_query_logging,
            slow_query_threshold: config
                .enable_slow_query_warning
                .then(|| Duration::from_millis(config.slow_query_threshold_ms)),
        }
    }

    /// DATABASE_URL when given, otherwise assembled from host/port/user/password/name
    pub fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        if let Some(url) = &config.url {
            let url = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
            return Ok(url.into());
        }

        let mut url =
            url::Url::parse("postgres://localhost").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_host(Some(&config.host))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_port(Some(config.port))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_username(&config.user)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !config.password.is_empty() {
            url.set_password(Some(&config.password))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        url.set_path(&format!("/{}", config.name));
        Ok(url.into())
    }

    /// Strip the password so the target can be logged
    fn redact(connection_string: &str) -> String {
        match url::Url::parse(connection_string) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }

    /// Every statement is wrapped so rows come back as JSON objects keyed by column
    fn wrap(sql: &str) -> String {
        format!("WITH t AS ({}) SELECT row_to_json(t) AS row FROM t", sql)
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, DatabaseError> {
        let wrapped = Self::wrap(sql);

        let mut query = sqlx::query(&wrapped);
        for param in params {
            query = match param {
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Int(i) => query.bind(*i),
                SqlParam::Null => query.bind(None::<String>),
            };
        }

        if self.query_logging {
            debug!(sql, ?params, "executing statement");
        }

        let started = Instant::now();
        let rows = query.fetch_all(&self.pool).await?;
        let elapsed = started.elapsed();

        if let Some(threshold) = self.slow_query_threshold {
            if elapsed > threshold {
                warn!(sql, elapsed_ms = elapsed.as_millis() as u64, "slow query");
            }
        }

        rows.iter()
            .map(|row| match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(map),
                other => Err(DatabaseError::UnexpectedRow(other.to_string())),
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
