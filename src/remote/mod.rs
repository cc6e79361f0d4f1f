//! Remote Authority
//!
//! The system of record the board mirrors. Futures are not `Send`: the whole
//! client runs on one thread and continuations share the board through
//! `Rc` handles.

mod http;
mod memory;

use async_trait::async_trait;

use crate::error::BoardResult;
use crate::models::{Item, ItemId, ItemPatch, NewItem, RepositionBatch};

pub use http::HttpAuthority;
pub use memory::{Call, MemoryAuthority, Operation};

#[async_trait(?Send)]
pub trait RemoteAuthority {
    /// All items, ordered by `(position, created_at)`
    async fn fetch_items(&self, project_id: Option<u32>) -> BoardResult<Vec<Item>>;

    /// Create an item at the end of its bucket
    async fn create_item(&self, item: &NewItem) -> BoardResult<Item>;

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> BoardResult<Item>;

    async fn delete_item(&self, id: ItemId) -> BoardResult<()>;

    /// Set many positions at once. Either every entry is applied or the call fails.
    async fn reposition(&self, batch: &RepositionBatch) -> BoardResult<()>;

    /// Flip the important flag, returns the item with its new flag
    async fn toggle_important(&self, id: ItemId) -> BoardResult<Item>;
}
