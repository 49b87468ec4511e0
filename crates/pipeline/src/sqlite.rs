//! SQLite-backed durable job queue.
//!
//! Jobs survive process restarts. Claims run inside an `IMMEDIATE`
//! transaction so several worker processes can share one database file.

use crate::queue::{JobQueue, QueuePolicy};
use crate::types::{
    ClaimedJob, DeadLetter, Delivery, JobId, JobStatus, QueueStats, SearchJob, SearchResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use wayfinder_core::{AppError, AppResult};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        payload TEXT NOT NULL,
        visible_after INTEGER NOT NULL,
        receive_count INTEGER NOT NULL DEFAULT 0,
        receipt TEXT
    );

    CREATE TABLE IF NOT EXISTS results (
        job_id TEXT PRIMARY KEY,
        payload TEXT NOT NULL,
        fetched_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS dead_letters (
        job_id TEXT PRIMARY KEY,
        payload TEXT NOT NULL,
        reason TEXT NOT NULL,
        destination TEXT NOT NULL,
        failed_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_jobs_visible ON jobs(visible_after, seq);
"#;

/// Durable queue stored in a single SQLite database.
pub struct SqliteJobQueue {
    conn: Mutex<Connection>,
    policy: QueuePolicy,
}

impl SqliteJobQueue {
    /// Open (or create) the queue database at `path`.
    pub fn open(path: &Path, policy: QueuePolicy) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Queue(format!("Failed to create queue directory: {}", e)))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Queue(format!("Failed to open queue database: {}", e)))?;

        conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Queue(format!("Failed to enable WAL: {}", e)))?;

        let queue = Self::init(conn, policy)?;
        tracing::debug!("Opened job queue at {:?}", path);
        Ok(queue)
    }

    /// Open a private queue that lives only as long as this value.
    pub fn open_in_memory(policy: QueuePolicy) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Queue(format!("Failed to open in-memory queue: {}", e)))?;
        Self::init(conn, policy)
    }

    fn init(conn: Connection, policy: QueuePolicy) -> AppResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| AppError::Queue(format!("Failed to set busy timeout: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Queue(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            policy,
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Queue("Queue connection lock poisoned".to_string()))
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AppError::Queue(format!("Invalid stored timestamp: {}", ms)))
}

fn count<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> AppResult<u64> {
    conn.query_row(sql, params, |row| row.get::<_, i64>(0))
        .map(|v| v as u64)
        .map_err(|e| AppError::Queue(format!("Failed to count jobs: {}", e)))
}

impl JobQueue for SqliteJobQueue {
    fn enqueue(&self, job: &SearchJob) -> AppResult<()> {
        let payload = serde_json::to_string(job)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO jobs (id, payload, visible_after, receive_count) VALUES (?1, ?2, ?3, 0)",
            params![job.id.as_str(), payload, to_millis(job.visible_after)],
        )
        .map_err(|e| AppError::Queue(format!("Failed to enqueue job {}: {}", job.id, e)))?;

        tracing::debug!("Enqueued job {}", job.id);
        Ok(())
    }

    fn claim(&self, now: DateTime<Utc>, visibility: Duration) -> AppResult<Option<Delivery>> {
        let visibility = chrono::Duration::from_std(visibility)
            .map_err(|e| AppError::Queue(format!("Invalid visibility timeout: {}", e)))?;

        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| AppError::Queue(format!("Failed to begin claim: {}", e)))?;

        let row: Option<(String, String, i64)> = tx
            .query_row(
                "SELECT id, payload, receive_count FROM jobs
                 WHERE visible_after <= ?1
                 ORDER BY seq LIMIT 1",
                params![to_millis(now)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| AppError::Queue(format!("Failed to select job: {}", e)))?;

        let Some((id, payload, receive_count)) = row else {
            return Ok(None);
        };

        // An unreadable row is dead-lettered so it cannot block the head of the queue
        let (mut job, dead_reason) = match serde_json::from_str::<SearchJob>(&payload) {
            Ok(job) if receive_count >= i64::from(self.policy.max_attempts) => {
                let reason = format!("exceeded {} delivery attempts", self.policy.max_attempts);
                (job, Some(reason))
            }
            Ok(job) => (job, None),
            Err(e) => {
                let mut job = SearchJob::new(String::new(), now);
                job.id = JobId::from(id.as_str());
                (job, Some(format!("corrupt payload: {}", e)))
            }
        };

        if let Some(reason) = dead_reason {
            job.attempt = receive_count.max(1) as u32;
            let letter = DeadLetter {
                reason,
                destination: self.policy.dead_letter_name.clone(),
                failed_at: now,
                job,
            };

            tx.execute(
                "INSERT OR REPLACE INTO dead_letters (job_id, payload, reason, destination, failed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    serde_json::to_string(&letter.job)?,
                    letter.reason,
                    letter.destination,
                    to_millis(now),
                ],
            )
            .map_err(|e| AppError::Queue(format!("Failed to dead-letter job {}: {}", id, e)))?;
            tx.execute("DELETE FROM jobs WHERE id = ?1", params![id])
                .map_err(|e| AppError::Queue(format!("Failed to remove job {}: {}", id, e)))?;
            tx.commit()
                .map_err(|e| AppError::Queue(format!("Failed to commit claim: {}", e)))?;

            tracing::warn!(
                "Job {} dead-lettered to {} after {} deliveries: {}",
                id,
                letter.destination,
                receive_count,
                letter.reason
            );
            return Ok(Some(Delivery::DeadLettered(letter)));
        }

        let receipt = uuid::Uuid::new_v4().to_string();
        let visible_after = now + visibility;
        tx.execute(
            "UPDATE jobs SET receive_count = receive_count + 1, visible_after = ?1, receipt = ?2
             WHERE id = ?3",
            params![to_millis(visible_after), receipt, id],
        )
        .map_err(|e| AppError::Queue(format!("Failed to claim job {}: {}", id, e)))?;
        tx.commit()
            .map_err(|e| AppError::Queue(format!("Failed to commit claim: {}", e)))?;

        job.attempt = (receive_count + 1) as u32;
        job.visible_after = visible_after;

        tracing::debug!("Claimed job {} (attempt {})", job.id, job.attempt);
        Ok(Some(Delivery::Job(ClaimedJob { job, receipt })))
    }

    fn acknowledge(&self, claim: &ClaimedJob, result: &SearchResult) -> AppResult<bool> {
        let payload = serde_json::to_string(result)?;
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| AppError::Queue(format!("Failed to begin acknowledge: {}", e)))?;

        let removed = tx
            .execute(
                "DELETE FROM jobs WHERE id = ?1 AND receipt = ?2",
                params![claim.job.id.as_str(), claim.receipt],
            )
            .map_err(|e| AppError::Queue(format!("Failed to remove job {}: {}", claim.job.id, e)))?;

        if removed == 1 {
            tx.execute(
                "INSERT OR IGNORE INTO results (job_id, payload, fetched_at) VALUES (?1, ?2, ?3)",
                params![
                    claim.job.id.as_str(),
                    payload,
                    to_millis(result.fetched_at)
                ],
            )
            .map_err(|e| {
                AppError::Queue(format!("Failed to store result for {}: {}", claim.job.id, e))
            })?;
        }

        tx.commit()
            .map_err(|e| AppError::Queue(format!("Failed to commit acknowledge: {}", e)))?;

        Ok(removed == 1)
    }

    fn dead_letter(&self, claim: &ClaimedJob, reason: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let payload = serde_json::to_string(&claim.job)?;
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| AppError::Queue(format!("Failed to begin dead-letter: {}", e)))?;

        let removed = tx
            .execute(
                "DELETE FROM jobs WHERE id = ?1 AND receipt = ?2",
                params![claim.job.id.as_str(), claim.receipt],
            )
            .map_err(|e| AppError::Queue(format!("Failed to remove job {}: {}", claim.job.id, e)))?;

        if removed == 1 {
            tx.execute(
                "INSERT OR REPLACE INTO dead_letters (job_id, payload, reason, destination, failed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    claim.job.id.as_str(),
                    payload,
                    reason,
                    self.policy.dead_letter_name,
                    to_millis(now),
                ],
            )
            .map_err(|e| {
                AppError::Queue(format!("Failed to dead-letter job {}: {}", claim.job.id, e))
            })?;
        }

        tx.commit()
            .map_err(|e| AppError::Queue(format!("Failed to commit dead-letter: {}", e)))?;

        Ok(removed == 1)
    }

    fn status(&self, job_id: &JobId) -> AppResult<JobStatus> {
        let conn = self.lock()?;

        let pending: Option<i64> = conn
            .query_row(
                "SELECT receive_count FROM jobs WHERE id = ?1",
                params![job_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Queue(format!("Failed to look up job {}: {}", job_id, e)))?;
        if let Some(receive_count) = pending {
            return Ok(JobStatus::Pending {
                attempt: receive_count.max(1) as u32,
            });
        }

        let completed: Option<String> = conn
            .query_row(
                "SELECT payload FROM results WHERE job_id = ?1",
                params![job_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Queue(format!("Failed to look up result {}: {}", job_id, e)))?;
        if let Some(payload) = completed {
            return Ok(JobStatus::Completed(serde_json::from_str(&payload)?));
        }

        let failed: Option<String> = conn
            .query_row(
                "SELECT reason FROM dead_letters WHERE job_id = ?1",
                params![job_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| {
                AppError::Queue(format!("Failed to look up dead letter {}: {}", job_id, e))
            })?;
        if let Some(reason) = failed {
            return Ok(JobStatus::Failed { reason });
        }

        Ok(JobStatus::Unknown)
    }

    fn stats(&self, now: DateTime<Utc>) -> AppResult<QueueStats> {
        let conn = self.lock()?;
        let now = to_millis(now);

        Ok(QueueStats {
            ready: count(&conn, "SELECT COUNT(*) FROM jobs WHERE visible_after <= ?1", params![now])?,
            in_flight: count(&conn, "SELECT COUNT(*) FROM jobs WHERE visible_after > ?1", params![now])?,
            completed: count(&conn, "SELECT COUNT(*) FROM results", params![])?,
            dead_lettered: count(&conn, "SELECT COUNT(*) FROM dead_letters", params![])?,
        })
    }

    fn dead_letters(&self) -> AppResult<Vec<DeadLetter>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT payload, reason, destination, failed_at FROM dead_letters
                 ORDER BY failed_at, rowid",
            )
            .map_err(|e| AppError::Queue(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(|e| AppError::Queue(format!("Failed to query dead letters: {}", e)))?;

        let mut letters = Vec::new();
        for row in rows {
            let (payload, reason, destination, failed_at) =
                row.map_err(|e| AppError::Queue(format!("Failed to read dead letter: {}", e)))?;
            letters.push(DeadLetter {
                job: serde_json::from_str(&payload)?,
                reason,
                destination,
                failed_at: from_millis(failed_at)?,
            });
        }

        Ok(letters)
    }

    fn prune(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let conn = self.lock()?;
        let cutoff = to_millis(before);

        let results = conn
            .execute("DELETE FROM results WHERE fetched_at < ?1", params![cutoff])
            .map_err(|e| AppError::Queue(format!("Failed to prune results: {}", e)))?;
        let letters = conn
            .execute("DELETE FROM dead_letters WHERE failed_at < ?1", params![cutoff])
            .map_err(|e| AppError::Queue(format!("Failed to prune dead letters: {}", e)))?;

        tracing::info!(
            "Pruned {} results and {} dead letters older than {}",
            results,
            letters,
            before.to_rfc3339()
        );
        Ok((results + letters) as u64)
    }
}
