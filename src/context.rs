//! Board Context
//!
//! Everything an async continuation needs: the board handle, the remote
//! authority and the settings. Continuations borrow the context and read the
//! board through it after every suspension.

use std::cell::Cell;

use crate::config::BoardConfig;
use crate::handle::BoardHandle;

pub struct BoardContext<A> {
    board: BoardHandle,
    authority: A,
    config: BoardConfig,
    /// Project the board mirrors, `None` for every item
    project_id: Cell<Option<u32>>,
    /// Bumped by every resync, see [`crate::sync`]
    resync_generation: Cell<u64>,
}

impl<A> BoardContext<A> {
    pub fn new(authority: A, config: BoardConfig) -> Self {
        let project_id = Cell::new(config.project_id);
        Self {
            board: BoardHandle::default(),
            authority,
            config,
            project_id,
            resync_generation: Cell::new(0),
        }
    }

    pub fn board(&self) -> &BoardHandle {
        &self.board
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn project_id(&self) -> Option<u32> {
        self.project_id.get()
    }

    pub fn set_project_id(&self, project_id: Option<u32>) {
        self.project_id.set(project_id);
    }

    /// Start a new resync generation and return it
    pub(crate) fn next_generation(&self) -> u64 {
        let generation = self.resync_generation.get() + 1;
        self.resync_generation.set(generation);
        generation
    }

    pub(crate) fn is_current_generation(&self, generation: u64) -> bool {
        self.resync_generation.get() == generation
    }
}
