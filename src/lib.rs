//! # crdt-toolbox
//!
//! A toolbox of state-based convergent replicated data types.
//!
//! A CRDT is a data structure that can be mutated independently on
//! disconnected replicas and later merged deterministically into a value all
//! replicas agree on, with no coordination. Replicas exchange *payloads*
//! over whatever channel the application provides; merge is correct for
//! payloads delivered in any order, any number of times.
//!
//! ## Quick Start
//!
//! ```
//! use crdt_toolbox::prelude::*;
//!
//! // Grow-only counter
//! let mut c1 = GCounter::new("device-1");
//! c1.increment();
//!
//! let mut c2 = GCounter::new("device-2");
//! c2.increment();
//!
//! let merged = c1.merged(&c2);
//! assert_eq!(merged.value(), 2);
//! assert!(merged.descends_from(&c1));
//! ```
//!
//! ## Available CRDTs
//!
//! ### Counters
//! - [`GCounter`] - Grow-only counter (increment only)
//! - [`PNCounter`] - Positive-negative counter (increment and decrement)
//!
//! ### Sets
//! - [`GSet`] - Grow-only set (add only)
//! - [`TwoPSet`] - Two-phase set (add and remove, remove is permanent)
//! - [`ORSet`] - Observed-remove set (add wins over concurrent remove)
//! - [`LWWSet`] - Last-writer-wins set (timestamps, ties favor add)
//! - [`EMSet`] - Election set (membership decided by dueling counters)
//!
//! ## The `Crdt` Trait
//!
//! All types implement [`Crdt`]: `payload`/`set_payload`, `value`,
//! `merge`/`merged` and `descends_from`. Merge is commutative, associative
//! and idempotent. The set types also implement [`SetCrdt`].
//!
//! Replica ids and clocks are explicit dependencies, see [`replica`].

#![warn(missing_docs)]

mod crdt;
mod em_set;
mod error;
mod gcounter;
mod gset;
mod lww_set;
mod or_set;
mod pncounter;
mod twop_set;

pub mod codec;
pub mod friendship;
pub mod prelude;
pub mod replica;
pub mod store;

pub use crdt::{Crdt, Element, SetCrdt};
pub use em_set::{EMSet, EMSetPayload, ElectionPayload};
pub use error::{CrdtError, Result};
pub use gcounter::{GCounter, GCounterPayload};
pub use gset::GSet;
pub use lww_set::{LWWSet, LWWSetPayload};
pub use or_set::{ORSet, ORSetPayload, Tag};
pub use pncounter::{PNCounter, PNCounterPayload};
pub use twop_set::{TwoPSet, TwoPSetPayload};
