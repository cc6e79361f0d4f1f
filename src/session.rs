//! Board Session
//!
//! Entry point for a board client: owns the context and the drag reconciler,
//! and routes CRUD through the authority before mirroring it locally.

use std::cell::RefCell;
use std::future::Future;

use board_dragdrop::{DragEvent, DragTracker};

use crate::commit::{CommitCoordinator, CommitOutcome};
use crate::config::BoardConfig;
use crate::context::BoardContext;
use crate::drag::{DragReconciler, FinishedGesture, GestureEnd, HoverTarget};
use crate::error::{BoardError, BoardResult};
use crate::handle::BoardHandle;
use crate::models::{Bucket, Item, ItemId, ItemPatch, NewItem};
use crate::promote::{PromotionEngine, PromotionOutcome};
use crate::remote::RemoteAuthority;
use crate::sync::ResyncReport;

pub struct BoardSession<A> {
    ctx: BoardContext<A>,
    reconciler: RefCell<DragReconciler>,
}

impl<A: RemoteAuthority> BoardSession<A> {
    pub fn new(authority: A, config: BoardConfig) -> Self {
        let ctx = BoardContext::new(authority, config);
        let reconciler = RefCell::new(DragReconciler::new(ctx.board().clone()));
        Self { ctx, reconciler }
    }

    pub fn context(&self) -> &BoardContext<A> {
        &self.ctx
    }

    pub fn board(&self) -> &BoardHandle {
        self.ctx.board()
    }

    pub fn authority(&self) -> &A {
        self.ctx.authority()
    }

    /// Pointer tracker using the configured drag threshold
    pub fn tracker(&self) -> DragTracker<Bucket> {
        DragTracker::with_threshold(self.ctx.config().drag_threshold_px)
    }

    /// Initial load. Abandons any gesture in progress.
    pub async fn load(&self) -> BoardResult<ResyncReport> {
        self.reconciler.borrow_mut().reset();
        self.ctx.resync().await
    }

    pub async fn resync(&self) -> BoardResult<ResyncReport> {
        self.ctx.resync().await
    }

    /// Mirror another project, or every item with `None`
    pub async fn select_project(&self, project_id: Option<u32>) -> BoardResult<ResyncReport> {
        log::info!("[BOARD] selecting project {:?}", project_id);
        self.ctx.set_project_id(project_id);
        self.load().await
    }

    // ========================
    // Drag and drop
    // ========================

    pub fn drag_start(&self, id: ItemId) -> bool {
        self.reconciler.borrow_mut().start(id)
    }

    pub fn drag_over(&self, target: HoverTarget) -> bool {
        self.reconciler.borrow_mut().hover(target)
    }

    /// End the gesture now and return its commit. `None` when no gesture was active.
    pub fn drag_end(&self, end: GestureEnd) -> impl Future<Output = Option<CommitOutcome>> + '_ {
        let finished = self.reconciler.borrow_mut().finish(end);
        self.commit(finished)
    }

    /// Feed a recognizer event, committing when it ends a gesture
    pub fn handle_drag_event(
        &self,
        event: DragEvent<Bucket>,
    ) -> impl Future<Output = Option<CommitOutcome>> + '_ {
        let finished = self.reconciler.borrow_mut().handle(event);
        self.commit(finished)
    }

    async fn commit(&self, finished: Option<FinishedGesture>) -> Option<CommitOutcome> {
        Some(CommitCoordinator::new(&self.ctx).commit(finished?).await)
    }

    pub async fn toggle_important(&self, id: ItemId) -> PromotionOutcome {
        PromotionEngine::new(&self.ctx).toggle(id).await
    }

    // ========================
    // CRUD
    // ========================

    /// Create on the authority, then append to its bucket
    pub async fn add_item(&self, mut new: NewItem) -> BoardResult<Item> {
        if new.project_id.is_none() {
            new.project_id = self.ctx.project_id();
        }
        let created = self.ctx.authority().create_item(&new).await?;
        log::info!("[BOARD] created {} in {}", created.id, created.bucket);
        self.board().update(|b| b.insert(created.clone()));
        Ok(created)
    }

    /// Update on the authority, then mirror it.
    ///
    /// A bucket change puts the item last in its new bucket and commits the
    /// positions of both buckets.
    pub async fn update_item(&self, id: ItemId, patch: ItemPatch) -> BoardResult<Item> {
        let updated = self.ctx.authority().update_item(id, &patch).await?;
        let moved_from = self.board().update(|b| {
            let previous = b.bucket_of(id);
            if let Some(from) = previous.filter(|&from| from != updated.bucket) {
                b.move_to_bucket(id, updated.bucket, None);
                b.insert(updated.clone());
                Some(from)
            } else {
                b.insert(updated.clone());
                None
            }
        });

        if let Some(from) = moved_from {
            log::info!("[BOARD] item {} moved {} -> {} by update", id, from, updated.bucket);
            let outcome = CommitCoordinator::new(&self.ctx)
                .renumber(&[updated.bucket, from])
                .await;
            log::debug!("[BOARD] update renumber: {:?}", outcome);
        }

        let current = self.board().with(|b| b.get(id).cloned());
        Ok(current.unwrap_or(updated))
    }

    /// Delete on the authority, then close the gap it leaves
    pub async fn delete_item(&self, id: ItemId) -> BoardResult<CommitOutcome> {
        let bucket = self
            .board()
            .with(|b| b.bucket_of(id))
            .ok_or_else(|| BoardError::NotFound(format!("Item {} not on the board", id)))?;
        self.ctx.authority().delete_item(id).await?;
        log::info!("[BOARD] deleted {} from {}", id, bucket);

        let bucket = self.board().update(|b| b.remove(id)).map_or(bucket, |item| item.bucket);
        Ok(CommitCoordinator::new(&self.ctx).renumber(&[bucket]).await)
    }
}
