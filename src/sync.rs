//! Resynchronization
//!
//! Throws the local board away and takes the authority's listing. This is the
//! only path allowed to overwrite the board wholesale.

use crate::context::BoardContext;
use crate::error::BoardResult;
use crate::remote::RemoteAuthority;

/// Fetches retried when local writes land while a listing is in flight
const MAX_FETCH_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncReport {
    /// The board now holds this many items from the authority
    Replaced(usize),
    /// A newer resync was issued, or the board kept changing while fetching,
    /// and the listing was dropped
    Superseded,
}

impl<A: RemoteAuthority> BoardContext<A> {
    /// Replace the board with a fresh listing.
    ///
    /// A listing is only applied if the board was not written while it was
    /// in flight, otherwise it is fetched again. A failed fetch leaves the
    /// board as it was.
    pub async fn resync(&self) -> BoardResult<ResyncReport> {
        let generation = self.next_generation();

        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            let revision = self.board().revision();
            let project_id = self.project_id();
            log::debug!(
                "[SYNC] fetching items, generation={} attempt={} project={:?}",
                generation,
                attempt,
                project_id
            );

            let items = match self.authority().fetch_items(project_id).await {
                Ok(items) => items,
                Err(e) => {
                    log::error!("[SYNC] fetch failed, keeping local board: {}", e);
                    return Err(e);
                }
            };

            if !self.is_current_generation(generation) {
                log::debug!("[SYNC] generation {} superseded, dropping {} items", generation, items.len());
                return Ok(ResyncReport::Superseded);
            }
            if self.board().revision() != revision {
                log::debug!("[SYNC] board changed during fetch, listing is stale");
                continue;
            }

            let count = items.len();
            self.board().replace(items);
            log::info!("[SYNC] loaded {} items", count);
            return Ok(ResyncReport::Replaced(count));
        }

        log::warn!(
            "[SYNC] board kept changing over {} fetches, keeping local board",
            MAX_FETCH_ATTEMPTS
        );
        Ok(ResyncReport::Superseded)
    }
}
