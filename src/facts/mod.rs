//! Fact store for retrieval
//!
//! Facts are plain-text files loaded once at startup, each embedded with the
//! configured model. The store is read-only afterwards and is shared between
//! requests behind an `Arc`.

pub mod models;
pub mod similarity;
pub mod store;

pub use models::Fact;
pub use similarity::cosine_similarity;
pub use store::FactStore;

use crate::error::Result;

/// Lookup operations the pipeline needs from a fact collection
///
/// `FactStore` answers `similar` with a linear scan; an approximate
/// nearest-neighbour index can implement this trait instead.
pub trait FactIndex: Send + Sync {
    /// Facts scoring strictly above `threshold`, in index order
    fn similar(&self, query_embedding: &[f64], threshold: f64) -> Result<Vec<&Fact>>;

    fn get(&self, id: &str) -> Option<&Fact>;

    fn len(&self) -> usize;

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
