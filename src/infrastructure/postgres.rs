//! `PostgreSQL` repository implementation.
//!
//! Uses `sqlx` with a connection pool and one transaction per mutating
//! operation. The identity column depends on the configured strategy and
//! matches the schema generation in `migrations/`:
//!
//! ```sql
//! -- sequential strategy (first generation)
//! CREATE TABLE task (
//!     id BIGSERIAL PRIMARY KEY,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT DEFAULT NULL,
//!     deadline TIMESTAMP DEFAULT NULL,
//!     completed BOOLEAN NOT NULL DEFAULT FALSE
//! );
//!
//! -- uuid strategy (second generation)
//! CREATE TABLE task (
//!     uuid UUID PRIMARY KEY,
//!     ...
//! );
//! ```

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::domain::{Deadline, IdentityStrategy, NewTask, Task, TaskId};
use crate::infrastructure::repository::{RepositoryFuture, ensure_strategy};
use crate::infrastructure::{RepositoryError, TaskRepository};

const DATA_COLUMNS: &str = "title, description, deadline, completed";

const KEY_COLUMN_SQL: &str = "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = 'task' AND column_name = $1)";

// =============================================================================
// Row Mapping
// =============================================================================

fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|database_error| database_error.is_unique_violation())
}

/// Binds an identifier to the next placeholder.
///
/// Sequential values beyond `i64::MAX` bind as `NULL` and match no row.
fn bind_id<'q>(
    query: Query<'q, Postgres, PgArguments>,
    id: &TaskId,
) -> Query<'q, Postgres, PgArguments> {
    match id {
        TaskId::Sequential(value) => query.bind(i64::try_from(*value).ok()),
        TaskId::Uuid(value) => query.bind(*value),
    }
}

fn task_from_row(row: &PgRow, strategy: IdentityStrategy) -> Result<Task, sqlx::Error> {
    let id = match strategy {
        IdentityStrategy::Sequential => {
            let raw: i64 = row.try_get("id")?;
            let value =
                u64::try_from(raw).map_err(|error| sqlx::Error::Decode(Box::new(error)))?;
            TaskId::Sequential(value)
        }
        IdentityStrategy::Uuid => TaskId::Uuid(row.try_get("uuid")?),
    };

    Ok(Task {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        deadline: row
            .try_get::<Option<chrono::NaiveDateTime>, _>("deadline")?
            .map(Deadline::from_datetime),
        completed: row.try_get("completed")?,
    })
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool, IdentityStrategy::Uuid);
///
/// let task = repository.insert(NewTask::new("My Task")).await?;
/// let found = repository.find_by_id(&task.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
    strategy: IdentityStrategy,
}

impl PostgresTaskRepository {
    /// Creates a repository over the given pool and identity strategy.
    #[must_use]
    pub const fn new(pool: PgPool, strategy: IdentityStrategy) -> Self {
        Self { pool, strategy }
    }

    /// Returns `true` if the `task` table has the key column of the
    /// configured strategy.
    ///
    /// A database migrated to the latest schema only has the `uuid` column,
    /// so the sequential strategy needs a first-generation schema.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DatabaseError`] if the catalog query fails.
    pub async fn has_key_column(&self) -> Result<bool, RepositoryError> {
        sqlx::query_scalar(KEY_COLUMN_SQL)
            .bind(self.key_column())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)
    }

    /// Name of the primary key column for the configured strategy.
    const fn key_column(&self) -> &'static str {
        self.strategy.field_name()
    }

    fn select_all_sql(&self) -> String {
        let key = self.key_column();
        format!("SELECT {key}, {DATA_COLUMNS} FROM task ORDER BY {key} ASC")
    }

    fn select_one_sql(&self) -> String {
        let key = self.key_column();
        format!("SELECT {key}, {DATA_COLUMNS} FROM task WHERE {key} = $1")
    }

    fn insert_sql(&self) -> String {
        match self.strategy {
            IdentityStrategy::Sequential => {
                format!("INSERT INTO task ({DATA_COLUMNS}) VALUES ($1, $2, $3, $4) RETURNING id")
            }
            IdentityStrategy::Uuid => {
                format!("INSERT INTO task (uuid, {DATA_COLUMNS}) VALUES ($1, $2, $3, $4, $5)")
            }
        }
    }

    fn lock_sql(&self) -> String {
        let key = self.key_column();
        format!("SELECT {key} FROM task WHERE {key} = $1 FOR UPDATE")
    }

    fn update_sql(&self) -> String {
        format!(
            "UPDATE task SET title = $1, description = $2, deadline = $3, completed = $4 \
             WHERE {} = $5",
            self.key_column()
        )
    }

    fn delete_sql(&self) -> String {
        format!("DELETE FROM task WHERE {} = $1", self.key_column())
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn identity_strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    fn list(&self) -> RepositoryFuture<Vec<Task>> {
        let pool = self.pool.clone();
        let strategy = self.strategy;
        let sql = self.select_all_sql();

        Box::pin(async move {
            let rows = sqlx::query(&sql)
                .fetch_all(&pool)
                .await
                .map_err(database_error)?;

            rows.iter()
                .map(|row| task_from_row(row, strategy))
                .collect::<Result<Vec<_>, _>>()
                .map_err(database_error)
        })
    }

    fn find_by_id(&self, id: &TaskId) -> RepositoryFuture<Option<Task>> {
        let pool = self.pool.clone();
        let strategy = self.strategy;
        let sql = self.select_one_sql();
        let id = *id;

        Box::pin(async move {
            ensure_strategy(strategy, &id)?;

            let row = bind_id(sqlx::query(&sql), &id)
                .fetch_optional(&pool)
                .await
                .map_err(database_error)?;

            row.map(|row| task_from_row(&row, strategy))
                .transpose()
                .map_err(database_error)
        })
    }

    fn insert(&self, task: NewTask) -> RepositoryFuture<Task> {
        let pool = self.pool.clone();
        let strategy = self.strategy;
        let sql = self.insert_sql();

        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let id = match (strategy, task.id) {
                (IdentityStrategy::Sequential, None) => {
                    let row: (i64,) = sqlx::query_as(&sql)
                        .bind(&task.title)
                        .bind(&task.description)
                        .bind(task.deadline.map(|deadline| *deadline.as_datetime()))
                        .bind(task.completed)
                        .fetch_one(&mut *transaction)
                        .await
                        .map_err(database_error)?;

                    let value = u64::try_from(row.0)
                        .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;
                    TaskId::Sequential(value)
                }
                (IdentityStrategy::Sequential, Some(found)) => {
                    return Err(RepositoryError::IdentityMismatch {
                        expected: strategy,
                        found,
                    });
                }
                (IdentityStrategy::Uuid, requested) => {
                    let id = requested.unwrap_or_else(TaskId::generate_v7);
                    ensure_strategy(strategy, &id)?;

                    bind_id(sqlx::query(&sql), &id)
                        .bind(&task.title)
                        .bind(&task.description)
                        .bind(task.deadline.map(|deadline| *deadline.as_datetime()))
                        .bind(task.completed)
                        .execute(&mut *transaction)
                        .await
                        .map_err(|error| {
                            if is_unique_violation(&error) {
                                RepositoryError::Duplicate(id.to_string())
                            } else {
                                database_error(error)
                            }
                        })?;
                    id
                }
            };

            transaction.commit().await.map_err(database_error)?;

            Ok(task.into_task(id))
        })
    }

    fn update(&self, task: &Task) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let strategy = self.strategy;
        let lock_sql = self.lock_sql();
        let update_sql = self.update_sql();
        let task = task.clone();

        Box::pin(async move {
            ensure_strategy(strategy, &task.id)?;

            let mut transaction = pool.begin().await.map_err(database_error)?;

            let existing = bind_id(sqlx::query(&lock_sql), &task.id)
                .fetch_optional(&mut *transaction)
                .await
                .map_err(database_error)?;

            if existing.is_none() {
                transaction.rollback().await.map_err(database_error)?;
                return Ok(false);
            }

            let query = sqlx::query(&update_sql)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.deadline.map(|deadline| *deadline.as_datetime()))
                .bind(task.completed);
            bind_id(query, &task.id)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;

            Ok(true)
        })
    }

    fn delete(&self, id: &TaskId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let strategy = self.strategy;
        let sql = self.delete_sql();
        let id = *id;

        Box::pin(async move {
            ensure_strategy(strategy, &id)?;

            let mut transaction = pool.begin().await.map_err(database_error)?;

            let result = bind_id(sqlx::query(&sql), &id)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;

            Ok(result.rows_affected() > 0)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
