//! Commit Coordinator
//!
//! Sends a finished gesture to the remote authority: the bucket change first,
//! then the dense positions of the affected buckets. Any failure falls back to
//! a full resync, never to a compensating write.

use crate::context::BoardContext;
use crate::drag::FinishedGesture;
use crate::error::BoardError;
use crate::models::{Bucket, ItemPatch, RepositionBatch};
use crate::remote::RemoteAuthority;

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Nothing moved and positions were already dense, no request was sent
    Unchanged,
    Committed,
    /// A request failed and the board was reloaded from the authority
    Resynced(BoardError),
    /// A request failed and so did the reload, the board keeps its speculative state
    ResyncFailed { commit: BoardError, resync: BoardError },
    /// The item left the board before anything could be sent
    Vanished,
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed | CommitOutcome::Unchanged)
    }
}

pub struct CommitCoordinator<'a, A> {
    ctx: &'a BoardContext<A>,
}

impl<'a, A: RemoteAuthority> CommitCoordinator<'a, A> {
    pub fn new(ctx: &'a BoardContext<A>) -> Self {
        Self { ctx }
    }

    /// Commit the board state a gesture left behind
    pub async fn commit(&self, gesture: FinishedGesture) -> CommitOutcome {
        let id = gesture.item_id;
        let origin = gesture.origin_bucket;
        let board = self.ctx.board();

        let Some(bucket) = board.with(|b| b.bucket_of(id)) else {
            log::debug!("[COMMIT] item {} vanished before commit", id);
            return CommitOutcome::Vanished;
        };
        let bucket_changed = bucket != origin;
        let untouched = board.with(|b| {
            !bucket_changed
                && b.bucket_sequence(bucket) == gesture.origin_sequence
                && b.is_bucket_dense(bucket)
        });
        if untouched {
            log::debug!("[COMMIT] item {} unchanged, nothing to send", id);
            return CommitOutcome::Unchanged;
        }

        // Settle locally before the first suspension
        board.update(|b| {
            b.renumber_bucket(bucket);
            if bucket_changed {
                b.renumber_bucket(origin);
            }
        });

        if bucket_changed {
            log::info!("[COMMIT] item {} moved {} -> {}", id, origin, bucket);
            let patch = ItemPatch::bucket(bucket);
            if let Err(e) = self.ctx.authority().update_item(id, &patch).await {
                return self.recover(e).await;
            }
        }

        // Re-read after the await: other gestures may have reshaped the bucket
        let Some(current) = board.with(|b| b.bucket_of(id)) else {
            log::debug!("[COMMIT] item {} vanished during commit", id);
            return CommitOutcome::Vanished;
        };
        let mut buckets = vec![current];
        if bucket_changed && origin != current {
            buckets.push(origin);
        }
        self.submit(&buckets).await
    }

    /// Renumber the given buckets and send their positions.
    ///
    /// Sends nothing when every bucket is already dense.
    pub async fn renumber(&self, buckets: &[Bucket]) -> CommitOutcome {
        let all_dense = self
            .ctx
            .board()
            .with(|b| buckets.iter().all(|&bucket| b.is_bucket_dense(bucket)));
        if all_dense {
            return CommitOutcome::Unchanged;
        }
        self.submit(buckets).await
    }

    async fn submit(&self, buckets: &[Bucket]) -> CommitOutcome {
        let entries = self.ctx.board().update(|b| {
            buckets
                .iter()
                .flat_map(|&bucket| b.renumber_bucket(bucket))
                .collect::<Vec<_>>()
        });
        if entries.is_empty() {
            return CommitOutcome::Unchanged;
        }
        let batch = RepositionBatch::new(entries);
        log::debug!("[COMMIT] reposition {} items in {:?}", batch.len(), buckets);
        match self.ctx.authority().reposition(&batch).await {
            Ok(()) => CommitOutcome::Committed,
            Err(e) => self.recover(e).await,
        }
    }

    /// Reload after a failed request
    pub async fn recover(&self, error: BoardError) -> CommitOutcome {
        log::warn!("[COMMIT] request failed, resyncing: {}", error);
        match self.ctx.resync().await {
            Ok(_) => CommitOutcome::Resynced(error),
            Err(resync) => {
                log::error!("[COMMIT] resync after failed commit also failed: {}", resync);
                CommitOutcome::ResyncFailed {
                    commit: error,
                    resync,
                }
            }
        }
    }
}
