//! PostgreSQL connection settings

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

/// Where bookings are persisted.
///
/// An empty `url` keeps bookings in process memory.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a lifecycle call waits for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Apply the bundled migrations before serving
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn uses_postgres(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.uses_postgres() {
            return Err(ValidationError::MissingRequired("database.url"));
        }
        match self.url.split_once("://") {
            Some(("postgres" | "postgresql", rest)) if !rest.is_empty() => {}
            _ => return Err(ValidationError::InvalidDatabaseUrl),
        }
        if !(1..=MAX_POOL_SIZE).contains(&self.max_connections) {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            run_migrations: false,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_url_means_in_memory() {
        let config = DatabaseConfig::default();
        assert!(!config.uses_postgres());
        assert!(!postgres("   ").uses_postgres());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("database.url"))
        );
    }

    #[test]
    fn both_postgres_schemes_are_accepted() {
        assert!(postgres("postgres://billing@db/billing").validate().is_ok());
        assert!(postgres("postgresql://billing:pw@db:5432/billing")
            .validate()
            .is_ok());
    }

    #[test]
    fn other_schemes_are_rejected() {
        for url in ["mysql://db/billing", "postgres://", "db/billing"] {
            assert_eq!(
                postgres(url).validate(),
                Err(ValidationError::InvalidDatabaseUrl),
                "{url}"
            );
        }
    }

    #[test]
    fn pool_size_must_be_within_bounds() {
        for size in [0, MAX_POOL_SIZE + 1] {
            let config = DatabaseConfig {
                max_connections: size,
                ..postgres("postgres://db/billing")
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));
        }
    }

    #[test]
    fn zero_acquire_timeout_is_rejected() {
        let config = DatabaseConfig {
            acquire_timeout_secs: 0,
            ..postgres("postgres://db/billing")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
        assert_eq!(
            DatabaseConfig::default().acquire_timeout(),
            Duration::from_secs(5)
        );
    }
}
