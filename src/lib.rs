//! Kanban Board Client
//!
//! Optimistic ordering engine for a bucketed board. Drags and importance
//! toggles are applied to the local board at once and confirmed with the
//! remote authority afterwards; any failed write reloads the board.

pub mod commit;
pub mod config;
pub mod context;
pub mod drag;
pub mod error;
pub mod handle;
pub mod models;
pub mod promote;
pub mod remote;
pub mod reorder;
pub mod session;
pub mod store;
pub mod sync;

pub use commit::{CommitCoordinator, CommitOutcome};
pub use config::{BoardConfig, PromotionRollback};
pub use context::BoardContext;
pub use drag::{DragReconciler, FinishedGesture, GestureEnd, HoverTarget};
pub use error::{BoardError, BoardResult};
pub use handle::BoardHandle;
pub use models::{Bucket, Item, ItemId, ItemPatch, NewItem, RepositionBatch, RepositionEntry};
pub use promote::{PromotionEngine, PromotionOutcome};
pub use remote::{HttpAuthority, MemoryAuthority, RemoteAuthority};
pub use session::BoardSession;
pub use store::Board;
pub use sync::ResyncReport;

#[cfg(test)]
mod tests;
