//! Customer repository for database operations.
//!
//! Queries are built at runtime (no `query!` macros) so the crate builds
//! without a database.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use visitmark_core::{CustomerId, UnitVector, VisitCounters, VisitOutcome};

use super::RepositoryError;
use crate::models::{Customer, RecordedVisit};

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a SqlitePool,
    embedding_dim: usize,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    ///
    /// `embedding_dim` is the configured dimension every stored embedding
    /// must have.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, embedding_dim: usize) -> Self {
        Self {
            pool,
            embedding_dim,
        }
    }

    /// Insert a newly enrolled customer with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the embedding does not
    /// have the configured dimension.
    /// Returns `RepositoryError::Conflict` if the ID already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, embedding), fields(customer_id = %id))]
    pub async fn create(
        &self,
        id: CustomerId,
        display_name: Option<&str>,
        embedding: &UnitVector,
        now: DateTime<Utc>,
    ) -> Result<Customer, RepositoryError> {
        if embedding.dim() != self.embedding_dim {
            return Err(RepositoryError::DataCorruption(format!(
                "refusing to store embedding of dimension {} (expected {})",
                embedding.dim(),
                self.embedding_dim
            )));
        }

        sqlx::query(
            r"
            INSERT INTO customers (
                id, display_name, embedding,
                visits_total, visits_since_reward,
                last_visit_at, created_at, updated_at
            )
            VALUES (?, ?, ?, 0, 0, NULL, ?, ?)
            ",
        )
        .bind(id)
        .bind(display_name)
        .bind(embedding.to_le_bytes())
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("customer id already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        debug!("Inserted customer");

        Ok(Customer {
            id,
            display_name: display_name.map(str::to_owned),
            counters: VisitCounters::default(),
            last_visit_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored counters are
    /// inconsistent.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, display_name, visits_total, visits_since_reward,
                   last_visit_at, created_at, updated_at
            FROM customers
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// List all customers, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any stored counters are
    /// inconsistent.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, display_name, visits_total, visits_since_reward,
                   last_visit_at, created_at, updated_at
            FROM customers
            ORDER BY updated_at DESC, rowid DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    /// Load every enrolled embedding in storage order.
    ///
    /// A corrupt blob fails the whole call; no record is skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored embedding does not
    /// have the configured dimension.
    pub async fn embeddings(&self) -> Result<Vec<(CustomerId, UnitVector)>, RepositoryError> {
        let rows = sqlx::query_as::<_, EmbeddingRow>(
            r"
            SELECT id, embedding
            FROM customers
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut embeddings = Vec::with_capacity(rows.len());
        for r in rows {
            let vector = UnitVector::from_le_bytes(&r.embedding, self.embedding_dim).map_err(|e| {
                RepositoryError::DataCorruption(format!("customer {}: {e}", r.id))
            })?;
            embeddings.push((r.id, vector));
        }

        Ok(embeddings)
    }

    /// Count one visit for a customer.
    ///
    /// A single `UPDATE ... RETURNING` advances both counters in place, so
    /// concurrent visits to the same customer serialize on the row and none
    /// is lost. The reward rule matches [`visitmark_core::record_visit`].
    ///
    /// Returns `None` if the customer no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored counters are
    /// inconsistent.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn record_visit(
        &self,
        id: CustomerId,
        reward_every: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<RecordedVisit>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE customers
            SET visits_total = visits_total + 1,
                visits_since_reward = CASE
                    WHEN visits_since_reward + 1 >= ? THEN 0
                    ELSE visits_since_reward + 1
                END,
                last_visit_at = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING id, display_name, visits_total, visits_since_reward,
                      last_visit_at, created_at, updated_at
            ",
        )
        .bind(reward_every)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            debug!("Customer vanished before visit update");
            return Ok(None);
        };

        let customer = Customer::try_from(row)?;
        let outcome = VisitOutcome::from_counters(customer.counters);

        Ok(Some(RecordedVisit { customer, outcome }))
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this ID.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Internal row type for customer queries.
#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    display_name: Option<String>,
    visits_total: u32,
    visits_since_reward: u32,
    last_visit_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(r: CustomerRow) -> Result<Self, Self::Error> {
        if r.visits_since_reward > r.visits_total {
            return Err(RepositoryError::DataCorruption(format!(
                "customer {}: visits_since_reward {} exceeds visits_total {}",
                r.id, r.visits_since_reward, r.visits_total
            )));
        }

        Ok(Self {
            id: r.id,
            display_name: r.display_name,
            counters: VisitCounters {
                visits_total: r.visits_total,
                visits_since_reward: r.visits_since_reward,
            },
            last_visit_at: r.last_visit_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Internal row type for the matcher query.
#[derive(sqlx::FromRow)]
struct EmbeddingRow {
    id: CustomerId,
    embedding: Vec<u8>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::{connect_in_memory, create_pool, migrate};

    const DIM: usize = 4;

    async fn test_pool() -> SqlitePool {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn unit(raw: &[f32]) -> UnitVector {
        UnitVector::normalize(raw, DIM).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let id = CustomerId::generate();
        let now = Utc::now();

        let created = repo
            .create(id, Some("Ada"), &unit(&[1.0, 0.0, 0.0, 0.0]), now)
            .await
            .unwrap();
        assert_eq!(created.counters, VisitCounters::default());
        assert!(created.last_visit_at.is_none());

        let loaded = repo.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.display_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.created_at, now);
        assert_eq!(loaded.updated_at, now);
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_dimension() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let short = UnitVector::normalize(&[1.0, 0.0], 2).unwrap();

        let err = repo
            .create(CustomerId::generate(), None, &short, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embeddings_roundtrip_exactly() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let vector = unit(&[0.3, -1.7, 2.9, 0.01]);
        let id = CustomerId::generate();
        repo.create(id, None, &vector, Utc::now()).await.unwrap();

        let stored = repo.embeddings().await.unwrap();
        assert_eq!(stored, vec![(id, vector)]);
    }

    #[tokio::test]
    async fn test_embeddings_in_enrollment_order() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let now = Utc::now();
        let first = CustomerId::generate();
        let second = CustomerId::generate();
        repo.create(first, None, &unit(&[1.0, 0.0, 0.0, 0.0]), now)
            .await
            .unwrap();
        repo.create(second, None, &unit(&[0.0, 1.0, 0.0, 0.0]), now + Duration::seconds(1))
            .await
            .unwrap();

        let ids: Vec<CustomerId> = repo
            .embeddings()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_corrupt_embedding_fails_scan() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        repo.create(CustomerId::generate(), None, &unit(&[1.0, 0.0, 0.0, 0.0]), Utc::now())
            .await
            .unwrap();

        sqlx::query("UPDATE customers SET embedding = ?")
            .bind(vec![0_u8; 7])
            .execute(&pool)
            .await
            .unwrap();

        let err = repo.embeddings().await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(ref msg) if msg.contains("7 bytes")));
    }

    #[tokio::test]
    async fn test_record_visit_updates_counters_and_timestamps() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let id = CustomerId::generate();
        let enrolled_at = Utc::now();
        repo.create(id, None, &unit(&[1.0, 0.0, 0.0, 0.0]), enrolled_at)
            .await
            .unwrap();

        let visit_at = enrolled_at + Duration::seconds(30);
        let visit = repo.record_visit(id, 2, visit_at).await.unwrap().unwrap();
        assert_eq!(visit.customer.counters.visits_total, 1);
        assert_eq!(visit.customer.counters.visits_since_reward, 1);
        assert!(!visit.outcome.reward_triggered);

        let visit = repo.record_visit(id, 2, visit_at).await.unwrap().unwrap();
        assert!(visit.outcome.reward_triggered);
        assert_eq!(visit.customer.counters.visits_since_reward, 0);

        let loaded = repo.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.counters.visits_total, 2);
        assert_eq!(loaded.counters.visits_since_reward, 0);
        assert_eq!(loaded.last_visit_at, Some(visit_at));
        assert_eq!(loaded.updated_at, visit_at);
        assert_eq!(loaded.created_at, enrolled_at);
    }

    #[tokio::test]
    async fn test_record_visit_unknown_customer() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let visit = repo
            .record_visit(CustomerId::generate(), 5, Utc::now())
            .await
            .unwrap();
        assert!(visit.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_visits_are_not_lost() {
        let pool = test_pool().await;
        let id = CustomerId::generate();
        CustomerRepository::new(&pool, DIM)
            .create(id, None, &unit(&[1.0, 0.0, 0.0, 0.0]), Utc::now())
            .await
            .unwrap();

        let visits = (0..8).map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                CustomerRepository::new(&pool, DIM)
                    .record_visit(id, 3, Utc::now())
                    .await
            })
        });
        let mut rewards = 0;
        for handle in visits.collect::<Vec<_>>() {
            let visit = handle.await.unwrap().unwrap().unwrap();
            if visit.outcome.reward_triggered {
                rewards += 1;
            }
        }

        let loaded = CustomerRepository::new(&pool, DIM)
            .get(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.counters.visits_total, 8);
        assert_eq!(loaded.counters.visits_since_reward, 2);
        assert_eq!(rewards, 2);
    }

    #[tokio::test]
    async fn test_record_visit_follows_ledger() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let id = CustomerId::generate();
        repo.create(id, None, &unit(&[1.0, 0.0, 0.0, 0.0]), Utc::now())
            .await
            .unwrap();

        let mut expected = VisitCounters::default();
        for _ in 0..10 {
            let want = visitmark_core::record_visit(expected, 3);
            let visit = repo.record_visit(id, 3, Utc::now()).await.unwrap().unwrap();
            assert_eq!(visit.outcome, want);
            assert_eq!(visit.customer.counters, want.counters);
            expected = want.counters;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contended_visits_on_file_database_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("loyalty.sqlite3").display());
        let pool = create_pool(&SecretString::from(url)).await.unwrap();
        migrate(&pool).await.unwrap();

        let id = CustomerId::generate();
        CustomerRepository::new(&pool, DIM)
            .create(id, None, &unit(&[1.0, 0.0, 0.0, 0.0]), Utc::now())
            .await
            .unwrap();

        let mut visits = tokio::task::JoinSet::new();
        for _ in 0..40 {
            let pool = pool.clone();
            visits.spawn(async move {
                CustomerRepository::new(&pool, DIM)
                    .record_visit(id, 5, Utc::now())
                    .await
            });
        }
        let results = visits.join_all().await;

        let mut rewards = 0;
        for result in results {
            if result.unwrap().unwrap().outcome.reward_triggered {
                rewards += 1;
            }
        }
        assert_eq!(rewards, 8);

        let loaded = CustomerRepository::new(&pool, DIM)
            .get(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.counters.visits_total, 40);
        assert_eq!(loaded.counters.visits_since_reward, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at_desc() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let now = Utc::now();
        let older = CustomerId::generate();
        let newer = CustomerId::generate();
        repo.create(older, Some("older"), &unit(&[1.0, 0.0, 0.0, 0.0]), now)
            .await
            .unwrap();
        repo.create(
            newer,
            Some("newer"),
            &unit(&[0.0, 1.0, 0.0, 0.0]),
            now + Duration::seconds(1),
        )
        .await
        .unwrap();

        let ids: Vec<CustomerId> = repo.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![newer, older]);

        repo.record_visit(older, 5, now + Duration::seconds(2))
            .await
            .unwrap()
            .unwrap();
        let ids: Vec<CustomerId> = repo.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![older, newer]);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        let repo = CustomerRepository::new(&pool, DIM);
        let id = CustomerId::generate();
        repo.create(id, None, &unit(&[1.0, 0.0, 0.0, 0.0]), Utc::now())
            .await
            .unwrap();

        repo.delete(id).await.unwrap();
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(matches!(repo.delete(id).await, Err(RepositoryError::NotFound)));
    }
}
