//! Asynchronous web search pipeline.
//!
//! Requests are submitted to a durable queue and executed by a pool of
//! workers. The queue provides at-least-once delivery: a claimed job is hidden
//! for a visibility window, a failed attempt simply lets that window lapse so
//! the job is redelivered, and a job delivered more than the configured number
//! of times is moved to a dead-letter table.
//!
//! ```text
//! submit ──► jobs ──claim──► SearchWorker ──search──► provider
//!              ▲                 │
//!              └── window lapses ┤ transient failure
//!                                ├─ ack ──────────► results
//!                                └─ dead-letter ──► dead_letters
//! ```

pub mod clock;
pub mod pipeline;
pub mod pool;
pub mod queue;
pub mod sqlite;
pub mod types;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use pipeline::{AwaitError, SearchRequest, WebSearchPipeline};
pub use pool::WorkerPool;
pub use queue::{JobQueue, QueuePolicy};
pub use sqlite::SqliteJobQueue;
pub use types::{
    ClaimedJob, DeadLetter, Delivery, JobId, JobStatus, QueueStats, SearchJob, SearchJobFailed,
    SearchResult,
};
pub use worker::{JobOutcome, SearchWorker, WorkerSettings};
