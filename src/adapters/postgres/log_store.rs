//! PostgreSQL implementation of LogStore.
//!
//! Persists the outbox to the `event_log` table (see `migrations/`).
//!
//! Claims are lease columns (`lock_owner`, `locked_until`) stamped by a
//! single `UPDATE ... WHERE id IN (SELECT ... FOR UPDATE SKIP LOCKED)`
//! statement. Row locks only live for that statement, so no transaction is
//! held open while the dispatcher talks to the broker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use std::sync::Arc;

use crate::domain::event_log::{EntryStatus, EventLogEntry, NewLogEntry, Operation, SearchQuery};
use crate::domain::foundation::{DomainError, Eid, EntryId, LockOwner, Timestamp};
use crate::ports::{ClaimRequest, EidGenerator, FailedDelivery, LogStore};

/// PostgreSQL implementation of LogStore.
#[derive(Clone)]
pub struct PostgresLogStore {
    pool: PgPool,
    eid_generator: Arc<dyn EidGenerator>,
}

impl PostgresLogStore {
    /// Creates a new PostgresLogStore.
    pub fn new(pool: PgPool, eid_generator: Arc<dyn EidGenerator>) -> Self {
        Self {
            pool,
            eid_generator,
        }
    }

    /// Appends an entry on the caller's connection.
    ///
    /// Pass the business transaction (`&mut *txn`) so the entry commits or
    /// rolls back together with the domain change.
    pub async fn append_in_txn(
        &self,
        conn: &mut PgConnection,
        entry: NewLogEntry,
    ) -> Result<EventLogEntry, DomainError> {
        let eid = self.eid_generator.generate();
        let created_at = Timestamp::now();

        let row = sqlx::query(
            r#"
            INSERT INTO event_log (
                eid, event_type, operation, payload, status, attempts, created_at
            ) VALUES ($1, $2, $3, $4, 'NEW', 0, $5)
            RETURNING id
            "#,
        )
        .bind(eid.as_uuid())
        .bind(&entry.event_type)
        .bind(entry.operation.code())
        .bind(&entry.payload)
        .bind(created_at.as_datetime())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to append event log entry: {}", e)))?;

        let id: i64 = column(&row, "id")?;
        Ok(EventLogEntry::new(EntryId::new(id), eid, entry, created_at))
    }
}

#[async_trait]
impl LogStore for PostgresLogStore {
    async fn append(&self, entry: NewLogEntry) -> Result<EventLogEntry, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to acquire connection: {}", e)))?;

        self.append_in_txn(&mut conn, entry).await
    }

    async fn claim_batch(&self, request: &ClaimRequest) -> Result<Vec<EventLogEntry>, DomainError> {
        let now = Timestamp::now();
        let until = now.plus(request.lease);
        let max_attempts = request
            .max_attempts
            .map(|max| i32::try_from(max).unwrap_or(i32::MAX));

        let rows = sqlx::query(
            r#"
            UPDATE event_log SET
                lock_owner = $1,
                locked_until = $2
            WHERE id IN (
                SELECT id FROM event_log
                WHERE (locked_until IS NULL OR locked_until <= $3)
                  AND (
                      status = 'NEW'
                      OR (
                          status = 'FAILED'
                          AND (next_attempt_at IS NULL OR next_attempt_at <= $3)
                          AND ($4::int4 IS NULL OR attempts < $4)
                      )
                  )
                ORDER BY id
                LIMIT $5
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, eid, event_type, operation, payload, status, attempts,
                      created_at, last_attempt_at, next_attempt_at, last_error,
                      lock_owner, locked_until
            "#,
        )
        .bind(request.owner.as_str())
        .bind(until.as_datetime())
        .bind(now.as_datetime())
        .bind(max_attempts)
        .bind(i64::from(request.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to claim event log batch: {}", e)))?;

        let mut claimed = rows
            .iter()
            .map(row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        // RETURNING does not preserve the subquery's order.
        claimed.sort_by_key(|e| e.id);
        Ok(claimed)
    }

    async fn mark_sent(&self, owner: &LockOwner, ids: &[EntryId]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE event_log SET
                status = 'SENT',
                last_attempt_at = $3,
                next_attempt_at = NULL,
                last_error = NULL,
                lock_owner = NULL,
                locked_until = NULL
            WHERE id = ANY($1)
              AND lock_owner = $2
              AND status <> 'SENT'
            "#,
        )
        .bind(raw_ids(ids))
        .bind(owner.as_str())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to mark entries sent: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn mark_failed(
        &self,
        owner: &LockOwner,
        failures: &[FailedDelivery],
    ) -> Result<u64, DomainError> {
        if failures.is_empty() {
            return Ok(0);
        }

        let now = Timestamp::now();
        let ids: Vec<i64> = failures.iter().map(|f| f.id.as_i64()).collect();
        let retry_at: Vec<DateTime<Utc>> = failures
            .iter()
            .map(|f| *now.plus(f.retry_after).as_datetime())
            .collect();
        let reasons: Vec<String> = failures.iter().map(|f| f.reason.clone()).collect();

        let result = sqlx::query(
            r#"
            UPDATE event_log AS e SET
                status = 'FAILED',
                attempts = e.attempts + 1,
                last_attempt_at = $2,
                next_attempt_at = f.retry_at,
                last_error = f.reason,
                lock_owner = NULL,
                locked_until = NULL
            FROM UNNEST($3::int8[], $4::timestamptz[], $5::text[]) AS f(id, retry_at, reason)
            WHERE e.id = f.id
              AND e.lock_owner = $1
              AND e.status <> 'SENT'
            "#,
        )
        .bind(owner.as_str())
        .bind(now.as_datetime())
        .bind(ids)
        .bind(retry_at)
        .bind(reasons)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to mark entries failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn release_claims(&self, owner: &LockOwner) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE event_log SET lock_owner = NULL, locked_until = NULL WHERE lock_owner = $1",
        )
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to release claims: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn release_entries(
        &self,
        owner: &LockOwner,
        ids: &[EntryId],
    ) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE event_log SET lock_owner = NULL, locked_until = NULL
            WHERE lock_owner = $1
              AND id = ANY($2)
            "#,
        )
        .bind(owner.as_str())
        .bind(raw_ids(ids))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to release entries: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn requeue(&self, ids: &[EntryId]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = Timestamp::now();

        let result = sqlx::query(
            r#"
            UPDATE event_log SET
                status = 'NEW',
                attempts = 0,
                next_attempt_at = NULL,
                last_error = NULL,
                lock_owner = NULL,
                locked_until = NULL
            WHERE id = ANY($1)
              AND status = 'FAILED'
              AND (locked_until IS NULL OR locked_until <= $2)
            "#,
        )
        .bind(raw_ids(ids))
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to requeue entries: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<EventLogEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, eid, event_type, operation, payload, status, attempts,
                   created_at, last_attempt_at, next_attempt_at, last_error,
                   lock_owner, locked_until
            FROM event_log
            WHERE id > $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY id
            LIMIT $3
            "#,
        )
        .bind(query.cursor.as_i64())
        .bind(query.status.map(|s| s.as_str()))
        .bind(i64::from(query.limit.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to search event log: {}", e)))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn find_by_ids(&self, ids: &[EntryId]) -> Result<Vec<EventLogEntry>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, eid, event_type, operation, payload, status, attempts,
                   created_at, last_attempt_at, next_attempt_at, last_error,
                   lock_owner, locked_until
            FROM event_log
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(raw_ids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::persistence(format!("Failed to fetch entries by id: {}", e)))?;

        rows.iter().map(row_to_entry).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn raw_ids(ids: &[EntryId]) -> Vec<i64> {
    ids.iter().map(EntryId::as_i64).collect()
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::persistence(format!("Failed to get {}: {}", name, e)))
}

fn row_to_entry(row: &PgRow) -> Result<EventLogEntry, DomainError> {
    let id: i64 = column(row, "id")?;
    let eid: uuid::Uuid = column(row, "eid")?;
    let event_type: String = column(row, "event_type")?;
    let operation: String = column(row, "operation")?;
    let payload: String = column(row, "payload")?;
    let status: String = column(row, "status")?;
    let attempts: i32 = column(row, "attempts")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;
    let last_attempt_at: Option<DateTime<Utc>> = column(row, "last_attempt_at")?;
    let next_attempt_at: Option<DateTime<Utc>> = column(row, "next_attempt_at")?;
    let last_error: Option<String> = column(row, "last_error")?;
    let lock_owner: Option<String> = column(row, "lock_owner")?;
    let locked_until: Option<DateTime<Utc>> = column(row, "locked_until")?;

    let operation = Operation::from_code(operation.trim())
        .map_err(|e| DomainError::persistence(format!("Invalid operation code: {}", e)))?;
    let status: EntryStatus = status
        .parse()
        .map_err(|e| DomainError::persistence(format!("Invalid entry status: {}", e)))?;
    let lock_owner = lock_owner
        .map(LockOwner::new)
        .transpose()
        .map_err(|e| DomainError::persistence(format!("Invalid lock owner: {}", e)))?;

    Ok(EventLogEntry {
        id: EntryId::new(id),
        eid: Eid::from_uuid(eid),
        event_type,
        operation,
        payload,
        status,
        attempts: u32::try_from(attempts).unwrap_or(0),
        created_at: Timestamp::from_datetime(created_at),
        last_attempt_at: last_attempt_at.map(Timestamp::from_datetime),
        next_attempt_at: next_attempt_at.map(Timestamp::from_datetime),
        last_error,
        lock_owner,
        locked_until: locked_until.map(Timestamp::from_datetime),
    })
}
