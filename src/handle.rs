//! Board Handle
//!
//! Shared, always-current access to the store. Async continuations hold a
//! clone of the handle and read through it after every `.await`, never a copy
//! of the items taken before the suspension.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::models::Item;
use crate::store::Board;

#[derive(Clone, Debug, Default)]
pub struct BoardHandle {
    board: Rc<RefCell<Board>>,
    /// Bumped on every write, lets readers tell whether the board moved on
    revision: Rc<Cell<u64>>,
}

impl BoardHandle {
    pub fn new(board: Board) -> Self {
        Self {
            board: Rc::new(RefCell::new(board)),
            revision: Rc::new(Cell::new(0)),
        }
    }

    /// Read the current board. The borrow ends when `f` returns.
    pub fn with<R>(&self, f: impl FnOnce(&Board) -> R) -> R {
        f(&*self.board.borrow())
    }

    /// Mutate the current board. The borrow ends when `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut Board) -> R) -> R {
        let result = f(&mut *self.board.borrow_mut());
        self.revision.set(self.revision.get() + 1);
        result
    }

    /// Owned copy of the board as it is right now
    pub fn snapshot(&self) -> Board {
        self.with(Board::clone)
    }

    /// Discard every local change and take the given listing
    pub fn replace(&self, items: Vec<Item>) {
        self.update(|board| board.replace_all(items));
    }

    pub fn revision(&self) -> u64 {
        self.revision.get()
    }
}
