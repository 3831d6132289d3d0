//! Repository factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `TASK_ID_STRATEGY`: `uuid` (default) | `sequential`
//!
//! Running every migration leaves the uuid schema, so `sequential` with
//! `postgres` needs a database stopped at the first migration. The factory
//! checks the key column and refuses to start on a mismatch.
//!
//! # Example
//!
//! ```ignore
//! let config = RepositoryConfig::from_env()?;
//! let task_repository = RepositoryFactory::new(config).create().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use super::{InMemoryTaskRepository, PostgresTaskRepository, TaskRepository};
use crate::domain::IdentityStrategy;

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local storage, lost on restart.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Storage backend.
    pub storage_mode: StorageMode,
    /// How task identities are assigned.
    pub identity_strategy: IdentityStrategy,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
}

/// Reads an optional variable, treating a non-UTF-8 value as invalid.
fn read_variable(name: &str) -> Result<Option<String>, env::VarError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(error),
    }
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` or `TASK_ID_STRATEGY` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match read_variable("STORAGE_MODE") {
            Ok(Some(value)) => value.parse()?,
            Ok(None) => StorageMode::default(),
            Err(_) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        let identity_strategy = match read_variable("TASK_ID_STRATEGY") {
            Ok(Some(value)) => value
                .parse()
                .map_err(|_| ConfigurationError::InvalidIdentityStrategy(value))?,
            Ok(None) => IdentityStrategy::default(),
            Err(_) => {
                return Err(ConfigurationError::InvalidIdentityStrategy(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        // Empty or whitespace-only means unset
        let database_url = env::var("DATABASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let config = Self {
            storage_mode,
            identity_strategy,
            database_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if `PostgreSQL`
    /// storage is selected without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .identity_strategy(IdentityStrategy::Sequential)
///     .database_url("postgres://localhost/tasks")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    identity_strategy: IdentityStrategy,
    database_url: Option<String>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the identity strategy.
    #[must_use]
    pub const fn identity_strategy(mut self, strategy: IdentityStrategy) -> Self {
        self.identity_strategy = strategy;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            identity_strategy: self.identity_strategy,
            database_url: self.database_url,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during factory configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Invalid identity strategy value.
    #[error("Invalid identity strategy: '{0}'. Expected 'sequential' or 'uuid'")]
    InvalidIdentityStrategy(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// The database schema does not match the identity strategy.
    #[error(
        "The task table has no '{column}' column; TASK_ID_STRATEGY={0} needs the matching schema",
        column = .0.field_name()
    )]
    SchemaMismatch(IdentityStrategy),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Creates the task repository selected by the configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates the task repository.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database connection fails or the
    /// `task` table lacks the key column of the identity strategy (when
    /// `storage_mode` is `Postgres`).
    pub async fn create(&self) -> Result<Arc<dyn TaskRepository + Send + Sync>, FactoryError> {
        let strategy = self.config.identity_strategy;
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Arc::new(InMemoryTaskRepository::new(strategy))),
            StorageMode::Postgres => {
                let pool = self.create_postgres_pool().await?;
                let repository = PostgresTaskRepository::new(pool, strategy);
                let matches = repository
                    .has_key_column()
                    .await
                    .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;
                if !matches {
                    return Err(FactoryError::SchemaMismatch(strategy));
                }
                Ok(Arc::new(repository))
            }
        }
    }

    /// Creates a `PostgreSQL` connection pool.
    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        PgPool::connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // -------------------------------------------------------------------------
    // StorageMode Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[case("in_memory", StorageMode::InMemory)]
    #[case("memory", StorageMode::InMemory)]
    #[case("IN_MEMORY", StorageMode::InMemory)]
    #[case("postgres", StorageMode::Postgres)]
    #[case("pg", StorageMode::Postgres)]
    fn test_storage_mode_from_str_valid(#[case] input: &str, #[case] expected: StorageMode) {
        assert_eq!(input.parse::<StorageMode>(), Ok(expected));
    }

    #[rstest]
    fn test_storage_mode_from_str_invalid() {
        assert_eq!(
            "mysql".parse::<StorageMode>(),
            Err(ConfigurationError::InvalidStorageMode("mysql".to_string()))
        );
    }

    // -------------------------------------------------------------------------
    // RepositoryConfig Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.storage_mode, StorageMode::InMemory);
        assert_eq!(config.identity_strategy, IdentityStrategy::Uuid);
        assert!(config.database_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn test_builder_requires_database_url_for_postgres() {
        let result = RepositoryConfig::builder()
            .storage_mode(StorageMode::Postgres)
            .build();
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingDatabaseUrl);
    }

    #[rstest]
    fn test_builder_sets_every_field() {
        let config = RepositoryConfig::builder()
            .storage_mode(StorageMode::Postgres)
            .identity_strategy(IdentityStrategy::Sequential)
            .database_url("postgres://localhost/tasks")
            .build()
            .unwrap();

        assert_eq!(config.storage_mode, StorageMode::Postgres);
        assert_eq!(config.identity_strategy, IdentityStrategy::Sequential);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/tasks")
        );
    }

    // -------------------------------------------------------------------------
    // RepositoryFactory Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_factory_creates_in_memory_repository() {
        let config = RepositoryConfig::builder()
            .identity_strategy(IdentityStrategy::Sequential)
            .build()
            .unwrap();

        let repository = RepositoryFactory::new(config).create().await.unwrap();

        assert_eq!(
            repository.identity_strategy(),
            IdentityStrategy::Sequential
        );
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_factory_reports_connection_failure() {
        let config = RepositoryConfig::builder()
            .storage_mode(StorageMode::Postgres)
            .database_url("not a url")
            .build()
            .unwrap();

        let result = RepositoryFactory::new(config).create().await;
        assert!(matches!(result, Err(FactoryError::DatabaseConnection(_))));
    }

    #[rstest]
    fn test_schema_mismatch_names_missing_column() {
        let error = FactoryError::SchemaMismatch(IdentityStrategy::Sequential);
        assert_eq!(
            error.to_string(),
            "The task table has no 'id' column; TASK_ID_STRATEGY=sequential needs the matching schema"
        );
    }

    #[rstest]
    #[tokio::test]
    #[ignore = "Requires PostgreSQL instance"]
    async fn test_factory_rejects_sequential_strategy_on_uuid_schema() {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/test".into());
        let config = RepositoryConfig::builder()
            .storage_mode(StorageMode::Postgres)
            .identity_strategy(IdentityStrategy::Sequential)
            .database_url(database_url)
            .build()
            .unwrap();

        let result = RepositoryFactory::new(config).create().await;
        assert!(matches!(
            result,
            Err(FactoryError::SchemaMismatch(IdentityStrategy::Sequential))
        ));
    }
}
