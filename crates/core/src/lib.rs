//! # chatsieve core
//!
//! Domain types, traits, and error definitions for the chatsieve chat spam
//! filter. This crate has **no filtering logic** — it defines the domain
//! model that the filter, ingest and CLI crates work against.
//!
//! ## Design Philosophy
//!
//! Everything the classification engine needs from its host is expressed
//! here as plain data ([`ChatEvent`]) or as a trait ([`HostSignals`]).
//! This enables:
//! - Running several independent classifiers side by side (one per channel)
//! - Testing the engine without any host platform
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod signals;
pub mod verdict;

// Re-export key types at crate root for ergonomics
pub use error::{Error, FilterError, IngestError, Result};
pub use event::{DomainEvent, EventBus};
pub use message::ChatEvent;
pub use signals::{EventFlags, HostSignals};
pub use verdict::{Classification, Evidence, RuleTag, SkipReason, Verdict};
