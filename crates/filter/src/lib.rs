//! Spam classification engine — the part of chatsieve that decides.
//!
//! A [`Classifier`] turns one [`ChatEvent`](chatsieve_core::ChatEvent) into a
//! [`Classification`](chatsieve_core::Classification) by running an ordered
//! chain of rules against the normalized message and a sliding-window
//! [`StateStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌─────────────┐
//! │  ChatEvent  │───▶│  Normalizer  │───▶│ Rule chain  │──▶ Verdict | none
//! └─────────────┘    └──────────────┘    └──────┬──────┘
//!                                               │ observe / record
//!                                        ┌──────┴──────┐
//!                                        │ State store │
//!                                        │  per-sender │
//!                                        │  duplicates │
//!                                        │  signatures │
//!                                        └─────────────┘
//! ```
//!
//! Rules are evaluated in a fixed order and the first one that fires wins.
//! Content rules (emotes, caps, repetition, art) look only at the message;
//! redundancy rules read and update the store. The store is owned by the
//! classifier, so independent classifiers (one per chat room) never share
//! state.
//!
//! # Example
//!
//! ```
//! use chatsieve_config::FilterConfig;
//! use chatsieve_core::{ChatEvent, RuleTag};
//! use chatsieve_filter::Classifier;
//!
//! let mut classifier = Classifier::new(FilterConfig::default()).unwrap();
//! let event = ChatEvent::new("viewer", "HELLO WORLD");
//! let outcome = classifier.classify(&event).unwrap();
//! assert_eq!(outcome.verdict().map(|v| v.rule), Some(RuleTag::AllCaps));
//! ```

mod classifier;
pub mod normalize;
pub mod rules;
pub mod similarity;
pub mod store;

pub use classifier::{Classifier, RuleChain};
pub use normalize::{NormalizedMessage, emote_signature, normalize};
pub use rules::{Rule, RuleContext};
pub use similarity::{are_similar, similarity};
pub use store::StateStore;
