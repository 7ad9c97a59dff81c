//! Cited answers over a directory of local facts
//!
//! A query is expanded by a language model into related queries, each query
//! is embedded and matched against the in-memory fact store, the model
//! composes a JSON answer citing fact identifiers, and every citation is
//! checked for existence against the store.

pub mod api;
pub mod config;
pub mod error;
pub mod facts;
pub mod metrics;
pub mod provider;
pub mod rag;

pub use config::Config;
pub use error::{RagError, Result};
pub use facts::{Fact, FactIndex, FactStore};
pub use rag::{RagPipeline, VerifiedAnswer};
