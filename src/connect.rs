use sqlx::postgres::PgPoolOptions;
use url::Url;

use crate::error::DescribeError;
use crate::executor::PgExecutor;

/// A PostgreSQL server URL, normalised to a scheme sqlx accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    url: Url,
}

impl ConnectionConfig {
    /// Parse a `postgres://` URL. SQLAlchemy-style driver suffixes
    /// (`postgresql+psycopg2://` and friends) are accepted and stripped.
    pub fn parse(raw: &str) -> Result<Self, DescribeError> {
        let normalized = if let Some(rest) = raw
            .strip_prefix("postgresql+psycopg2://")
            .or_else(|| raw.strip_prefix("postgresql+asyncpg://"))
            .or_else(|| raw.strip_prefix("postgresql+psycopg://"))
        {
            format!("postgres://{rest}")
        } else if raw.starts_with("postgresql://") || raw.starts_with("postgres://") {
            raw.to_string()
        } else {
            return Err(DescribeError::UnsupportedScheme(
                raw.split("://").next().unwrap_or("unknown").to_string(),
            ));
        };

        let url = Url::parse(&normalized)
            .map_err(|e| DescribeError::Connection(format!("Invalid PostgreSQL URL: {e}")))?;
        Ok(Self { url })
    }

    /// The database named in the URL path, if any.
    pub fn database(&self) -> Option<String> {
        let name = self.url.path().trim_start_matches('/');
        if name.is_empty() {
            return None;
        }
        Some(
            percent_encoding::percent_decode_str(name)
                .decode_utf8_lossy()
                .into_owned(),
        )
    }

    /// The same server and credentials, pointed at `database`.
    pub fn url_for(&self, database: &str) -> Url {
        let mut url = self.url.clone();
        let retargeted = url
            .path_segments_mut()
            .map(|mut segments| {
                segments.clear().push(database);
            })
            .is_ok();
        if !retargeted {
            url.set_path(database);
        }
        url
    }

    /// The target URL with the password masked, for logging.
    pub fn redacted_url_for(&self, database: &str) -> String {
        let mut url = self.url_for(database);
        if url.password().is_some() && url.set_password(Some("***")).is_err() {
            return format!("{}://<redacted>", url.scheme());
        }
        url.to_string()
    }
}

/// Open a pool against `database` on the configured server.
pub async fn connect(
    config: &ConnectionConfig,
    database: &str,
    max_connections: u32,
) -> Result<PgExecutor, DescribeError> {
    tracing::debug!("Connecting to {}", config.redacted_url_for(database));

    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(config.url_for(database).as_str())
        .await?;
    Ok(PgExecutor::new(pool))
}
