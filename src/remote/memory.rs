//! In-Memory Authority
//!
//! In-process system of record with the same ordering rules as the board
//! server. Records every call and can be told to fail, which makes it the
//! authority of choice for tests and offline demos.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RemoteAuthority;
use crate::error::{BoardError, BoardResult};
use crate::models::{Bucket, Item, ItemId, ItemPatch, NewItem, RepositionBatch};

/// Logical clock origin for `created_at`, keeps listings deterministic
const CLOCK_EPOCH: i64 = 1_700_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
    Reposition,
    ToggleImportant,
}

/// A request as the authority received it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(Option<u32>),
    Create(NewItem),
    Update(ItemId, ItemPatch),
    Delete(ItemId),
    Reposition(RepositionBatch),
    ToggleImportant(ItemId),
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::Fetch(_) => Operation::Fetch,
            Call::Create(_) => Operation::Create,
            Call::Update(..) => Operation::Update,
            Call::Delete(_) => Operation::Delete,
            Call::Reposition(_) => Operation::Reposition,
            Call::ToggleImportant(_) => Operation::ToggleImportant,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    items: Vec<Item>,
    next_id: ItemId,
    clock: i64,
    fail_next: HashMap<Operation, u32>,
    fail_always: HashSet<Operation>,
    calls: Vec<Call>,
}

impl State {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::from_timestamp(CLOCK_EPOCH + self.clock, 0).unwrap_or_default()
    }

    fn find_mut(&mut self, id: ItemId) -> BoardResult<&mut Item> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| BoardError::NotFound(format!("Item {} not found", id)))
    }

    fn next_position(&self, bucket: Bucket) -> i32 {
        self.items
            .iter()
            .filter(|item| item.bucket == bucket)
            .map(|item| item.position)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Record the call, then fail it if a failure was requested
    fn accept(&mut self, call: Call) -> BoardResult<()> {
        let operation = call.operation();
        self.calls.push(call);
        if self.fail_always.contains(&operation) {
            return Err(BoardError::Network(format!("{:?} unavailable", operation)));
        }
        if let Some(remaining) = self.fail_next.get_mut(&operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BoardError::Network(format!("{:?} failed", operation)));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryAuthority {
    state: RefCell<State>,
}

impl Default for MemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthority {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Seed with existing records, in creation order
    pub fn with_items(items: Vec<Item>) -> Self {
        let authority = Self::new();
        {
            let mut state = authority.state.borrow_mut();
            for mut item in items {
                if item.created_at.is_none() {
                    item.created_at = Some(state.tick());
                }
                state.next_id = state.next_id.max(item.id + 1);
                state.items.push(item);
            }
        }
        authority
    }

    /// Create an item directly, bypassing call recording and failures
    pub fn seed(&self, title: &str, bucket: Bucket) -> Item {
        let mut state = self.state.borrow_mut();
        insert_new(&mut state, &NewItem::new(title, bucket))
    }

    /// Fail the next call of `operation`
    pub fn fail_next(&self, operation: Operation) {
        *self.state.borrow_mut().fail_next.entry(operation).or_insert(0) += 1;
    }

    /// Fail every call of `operation` until [`MemoryAuthority::recover`]
    pub fn fail_always(&self, operation: Operation) {
        self.state.borrow_mut().fail_always.insert(operation);
    }

    pub fn recover(&self) {
        let mut state = self.state.borrow_mut();
        state.fail_next.clear();
        state.fail_always.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Listing as `fetch_items` would return it, without recording a call
    pub fn listing(&self, project_id: Option<u32>) -> Vec<Item> {
        let state = self.state.borrow();
        let mut items: Vec<Item> = state
            .items
            .iter()
            .filter(|item| project_id.is_none() || item.project_id == project_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        items
    }

    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.state.borrow().items.iter().find(|item| item.id == id).cloned()
    }
}

fn insert_new(state: &mut State, new: &NewItem) -> Item {
    let now = state.tick();
    let today = now.date_naive();
    let item = Item {
        id: state.next_id,
        title: new.title.clone(),
        description: new.description.clone(),
        bucket: new.bucket,
        start_date: Some(today),
        due_date: Some(new.due_date.unwrap_or(today)),
        project_id: new.project_id,
        position: state.next_position(new.bucket),
        important: false,
        created_at: Some(now),
        updated_at: Some(now),
    };
    state.next_id += 1;
    state.items.push(item.clone());
    item
}

#[async_trait(?Send)]
impl RemoteAuthority for MemoryAuthority {
    async fn fetch_items(&self, project_id: Option<u32>) -> BoardResult<Vec<Item>> {
        self.state.borrow_mut().accept(Call::Fetch(project_id))?;
        Ok(self.listing(project_id))
    }

    async fn create_item(&self, item: &NewItem) -> BoardResult<Item> {
        let mut state = self.state.borrow_mut();
        state.accept(Call::Create(item.clone()))?;
        Ok(insert_new(&mut state, item))
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> BoardResult<Item> {
        let mut state = self.state.borrow_mut();
        state.accept(Call::Update(id, patch.clone()))?;
        let now = state.tick();
        let item = state.find_mut(id)?;
        patch.apply(item);
        item.updated_at = Some(now);
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ItemId) -> BoardResult<()> {
        let mut state = self.state.borrow_mut();
        state.accept(Call::Delete(id))?;
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() == before {
            return Err(BoardError::NotFound(format!("Item {} not found", id)));
        }
        Ok(())
    }

    async fn reposition(&self, batch: &RepositionBatch) -> BoardResult<()> {
        let mut state = self.state.borrow_mut();
        state.accept(Call::Reposition(batch.clone()))?;
        // Validate every id before touching any
        let missing: Vec<ItemId> = batch
            .items
            .iter()
            .map(|entry| entry.id)
            .filter(|id| !state.items.iter().any(|item| item.id == *id))
            .collect();
        if !missing.is_empty() {
            return Err(BoardError::NotFound(format!("Items not found: {:?}", missing)));
        }
        for entry in &batch.items {
            state.find_mut(entry.id)?.position = entry.position;
        }
        Ok(())
    }

    async fn toggle_important(&self, id: ItemId) -> BoardResult<Item> {
        let mut state = self.state.borrow_mut();
        state.accept(Call::ToggleImportant(id))?;
        let item = state.find_mut(id)?;
        item.important = !item.important;
        Ok(item.clone())
    }
}
