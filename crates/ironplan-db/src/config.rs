/// Where the engine's PostgreSQL database lives and how many connections
/// to hold open. The CLI resolves the URL from flags, env and config file.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl DbConfig {
    /// Used when no URL is configured anywhere.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/ironplan";

    /// Pool size used unless overridden.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Override the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Extract the database name from the URL.
    ///
    /// Returns `None` if the URL has no path component. Query parameters
    /// (`?sslmode=...`) are stripped.
    pub fn database_name(&self) -> Option<&str> {
        self.database_url
            .rsplit('/')
            .next()
            .map(|s| s.split('?').next().unwrap_or(s))
            .filter(|s| !s.is_empty())
    }

    /// Return a URL pointing at the `postgres` maintenance database on the
    /// same host. Used to issue `CREATE DATABASE` when the target DB does not
    /// yet exist.
    pub fn maintenance_url(&self) -> String {
        match self.database_url.rfind('/') {
            Some(pos) => {
                let mut url = self.database_url[..pos].to_owned();
                url.push_str("/postgres");
                url
            }
            None => self.database_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(cfg.database_url, "postgresql://localhost:5432/ironplan");
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn database_name_extraction() {
        let cfg = DbConfig::new("postgresql://localhost:5432/lifts");
        assert_eq!(cfg.database_name(), Some("lifts"));
    }

    #[test]
    fn database_name_ignores_query_string() {
        let cfg = DbConfig::new("postgresql://localhost:5432/lifts?sslmode=disable");
        assert_eq!(cfg.database_name(), Some("lifts"));
    }

    #[test]
    fn maintenance_url_replaces_db() {
        let cfg = DbConfig::new("postgresql://localhost:5432/ironplan");
        assert_eq!(
            cfg.maintenance_url(),
            "postgresql://localhost:5432/postgres"
        );
    }

    #[test]
    fn with_max_connections_overrides_pool_size() {
        let cfg = DbConfig::new("postgresql://remotehost:5433/other").with_max_connections(12);
        assert_eq!(cfg.max_connections, 12);
        assert_eq!(cfg.database_name(), Some("other"));
    }
}
