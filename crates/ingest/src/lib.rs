//! Ingest adapter for chatsieve.
//!
//! Event sources deliver [`ChatEvent`](chatsieve_core::ChatEvent)s over an
//! mpsc channel. A single [`Dispatcher`] task owns the classifier, queues
//! everything it receives in arrival order and classifies at most
//! `batch_size` events per tick, yielding to the runtime in between.
//!
//! ```text
//!  JsonLinesSource ─┐
//!  MemorySource ────┼─▶ mpsc ─▶ Dispatcher ─▶ Outcome channel
//!  (any source) ────┘            │   FIFO queue
//!                                │   Classifier + StateStore
//!                                └─▶ EventBus (optional)
//! ```

pub mod dispatcher;
pub mod jsonl;
pub mod policy;
pub mod source;

pub use dispatcher::{DispatchStats, Dispatcher, Outcome};
pub use jsonl::JsonLinesSource;
pub use policy::PolicySignals;
pub use source::{EventSource, MemorySource, SourceItem};
