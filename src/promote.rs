//! Promotion Engine
//!
//! Toggles the important flag. Promoting also pins the item to the head of
//! its bucket; demoting only clears the flag and leaves positions alone.

use crate::config::PromotionRollback;
use crate::context::BoardContext;
use crate::error::{BoardError, BoardResult};
use crate::models::{Bucket, ItemId, RepositionBatch};
use crate::remote::RemoteAuthority;

#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    Promoted,
    /// The flag is now clear. Also returned when a promotion's toggle came
    /// back unflagged, in which case the item stays at the head of its bucket.
    Demoted,
    NotFound,
    /// A request failed, the flag was put back to `important`
    Reverted { important: bool, error: BoardError },
}

pub struct PromotionEngine<'a, A> {
    ctx: &'a BoardContext<A>,
}

impl<'a, A: RemoteAuthority> PromotionEngine<'a, A> {
    pub fn new(ctx: &'a BoardContext<A>) -> Self {
        Self { ctx }
    }

    pub async fn toggle(&self, id: ItemId) -> PromotionOutcome {
        let Some((important, bucket)) = self
            .ctx
            .board()
            .with(|b| b.get(id).map(|item| (item.important, item.bucket)))
        else {
            log::debug!("[STAR] unknown item {}", id);
            return PromotionOutcome::NotFound;
        };
        if important {
            self.demote(id).await
        } else {
            self.promote(id, bucket).await
        }
    }

    async fn promote(&self, id: ItemId, bucket: Bucket) -> PromotionOutcome {
        let board = self.ctx.board();
        let prior = board.with(|b| b.positions(bucket));
        board.update(|b| b.promote_to_head(id));
        log::debug!("[STAR] promoted {} to head of {}", id, bucket);

        match self.send_promotion(id).await {
            Ok(true) => PromotionOutcome::Promoted,
            Ok(false) => {
                log::warn!(
                    "[STAR] authority left {} unflagged after promotion, keeping head placement",
                    id
                );
                PromotionOutcome::Demoted
            }
            Err(error) => {
                log::warn!("[STAR] promoting {} failed, reverting flag: {}", id, error);
                let rollback = self.ctx.config().promotion_rollback;
                board.update(|b| {
                    b.set_important(id, false);
                    if rollback == PromotionRollback::Full {
                        b.restore_bucket(bucket, &prior);
                    }
                });
                PromotionOutcome::Reverted {
                    important: false,
                    error,
                }
            }
        }
    }

    /// Toggle then reposition. Returns the flag the authority settled on.
    async fn send_promotion(&self, id: ItemId) -> BoardResult<bool> {
        let board = self.ctx.board();
        let updated = self.ctx.authority().toggle_important(id).await?;
        board.update(|b| b.set_important(id, updated.important));

        // The bucket may have changed while the toggle was in flight
        let entries = board.update(|b| b.bucket_of(id).map(|bucket| b.renumber_bucket(bucket)));
        let Some(entries) = entries else {
            return Err(BoardError::NotFound(format!("Item {} left the board", id)));
        };
        self.ctx
            .authority()
            .reposition(&RepositionBatch::new(entries))
            .await?;
        Ok(updated.important)
    }

    async fn demote(&self, id: ItemId) -> PromotionOutcome {
        let board = self.ctx.board();
        board.update(|b| b.set_important(id, false));
        log::debug!("[STAR] demoted {}", id);

        match self.ctx.authority().toggle_important(id).await {
            Ok(updated) => {
                board.update(|b| b.set_important(id, updated.important));
                if updated.important {
                    PromotionOutcome::Promoted
                } else {
                    PromotionOutcome::Demoted
                }
            }
            Err(error) => {
                log::warn!("[STAR] demoting {} failed, reverting flag: {}", id, error);
                board.update(|b| b.set_important(id, true));
                PromotionOutcome::Reverted {
                    important: true,
                    error,
                }
            }
        }
    }
}
