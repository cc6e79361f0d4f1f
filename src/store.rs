//! Board Store
//!
//! Local mirror of the items the remote authority knows about.
//!
//! Items are kept in display order. A bucket's sequence is the subsequence of
//! its members in that order; `position` values only become dense again when a
//! bucket is renumbered.

use std::collections::{HashMap, HashSet};

use crate::models::{Bucket, Item, ItemId, RepositionEntry};
use crate::reorder::{dense_entries, is_dense, move_within_sequence};

/// Sentinel rank that sorts ahead of every real position
const HEAD_SENTINEL: i32 = i32::MIN;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    items: Vec<Item>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a listing that is already in display order
    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn bucket_of(&self, id: ItemId) -> Option<Bucket> {
        self.get(id).map(|item| item.bucket)
    }

    /// Members of a bucket in display order
    pub fn bucket_items(&self, bucket: Bucket) -> Vec<&Item> {
        self.items.iter().filter(|item| item.bucket == bucket).collect()
    }

    pub fn bucket_sequence(&self, bucket: Bucket) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.bucket == bucket)
            .map(|item| item.id)
            .collect()
    }

    /// Current `(id, position)` pairs of a bucket in display order
    pub fn positions(&self, bucket: Bucket) -> Vec<RepositionEntry> {
        self.items
            .iter()
            .filter(|item| item.bucket == bucket)
            .map(|item| RepositionEntry { id: item.id, position: item.position })
            .collect()
    }

    pub fn is_bucket_dense(&self, bucket: Bucket) -> bool {
        is_dense(self.bucket_items(bucket).into_iter().map(|item| item.position))
    }

    /// Every bucket's positions are exactly `0..n`
    pub fn is_settled(&self) -> bool {
        Bucket::ALL.iter().all(|&bucket| self.is_bucket_dense(bucket))
    }

    // ========================
    // CRUD mirror
    // ========================

    /// Append an item, or replace it in place if the id is already known
    pub fn insert(&mut self, item: Item) {
        if !self.upsert(item.clone()) {
            self.items.push(item);
        }
    }

    /// Replace an item by id. Returns false if the id is unknown.
    pub fn upsert(&mut self, updated: Item) -> bool {
        match self.items.iter_mut().find(|item| item.id == updated.id) {
            Some(item) => {
                *item = updated;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.index_of(id)?;
        Some(self.items.remove(index))
    }

    pub fn replace_all(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    pub fn set_important(&mut self, id: ItemId, important: bool) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.important = important;
                true
            }
            None => false,
        }
    }

    // ========================
    // Ordering
    // ========================

    /// Rewrite a bucket's sequence without moving members of other buckets.
    ///
    /// `order` must be a permutation of the bucket's current members.
    pub fn set_bucket_order(&mut self, bucket: Bucket, order: &[ItemId]) -> bool {
        let slots: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.bucket == bucket)
            .map(|(index, _)| index)
            .collect();

        let mut members: HashMap<ItemId, Item> = slots
            .iter()
            .map(|&index| (self.items[index].id, self.items[index].clone()))
            .collect();

        let unique: HashSet<ItemId> = order.iter().copied().collect();
        if order.len() != slots.len()
            || unique.len() != order.len()
            || !order.iter().all(|id| members.contains_key(id))
        {
            return false;
        }

        for (slot, id) in slots.into_iter().zip(order) {
            if let Some(item) = members.remove(id) {
                self.items[slot] = item;
            }
        }
        true
    }

    /// Move `id` to the index `over` holds in their shared bucket
    pub fn reorder_within_bucket(&mut self, id: ItemId, over: ItemId) -> bool {
        let Some(bucket) = self.bucket_of(id) else {
            return false;
        };
        if id == over || self.bucket_of(over) != Some(bucket) {
            return false;
        }
        let sequence = self.bucket_sequence(bucket);
        let (Some(from), Some(to)) = (
            sequence.iter().position(|&x| x == id),
            sequence.iter().position(|&x| x == over),
        ) else {
            return false;
        };
        let moved = move_within_sequence(&sequence, from, to);
        self.set_bucket_order(bucket, &moved)
    }

    /// Move `id` into `bucket`, before `over` if given, otherwise last.
    ///
    /// `over` must already belong to `bucket`.
    pub fn move_to_bucket(&mut self, id: ItemId, bucket: Bucket, over: Option<ItemId>) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if let Some(over) = over {
            if over == id || self.bucket_of(over) != Some(bucket) {
                return false;
            }
        }

        let mut sequence: Vec<ItemId> = self
            .bucket_sequence(bucket)
            .into_iter()
            .filter(|&x| x != id)
            .collect();
        let at = over
            .and_then(|over| sequence.iter().position(|&x| x == over))
            .unwrap_or(sequence.len());
        sequence.insert(at, id);

        self.items[index].bucket = bucket;
        self.set_bucket_order(bucket, &sequence)
    }

    /// Assign dense positions from display order
    pub fn renumber_bucket(&mut self, bucket: Bucket) -> Vec<RepositionEntry> {
        let entries = dense_entries(self.bucket_sequence(bucket));
        self.apply_positions(&entries);
        entries
    }

    /// Reorder a bucket's sequence by its `position` values (stable)
    pub fn sort_bucket_by_position(&mut self, bucket: Bucket) {
        let mut members: Vec<(i32, ItemId)> = self
            .bucket_items(bucket)
            .into_iter()
            .map(|item| (item.position, item.id))
            .collect();
        members.sort_by_key(|&(position, _)| position);
        let order: Vec<ItemId> = members.into_iter().map(|(_, id)| id).collect();
        self.set_bucket_order(bucket, &order);
    }

    /// Flag an item important and pin it to the head of its bucket.
    ///
    /// Returns the bucket's new dense positions.
    pub fn promote_to_head(&mut self, id: ItemId) -> Option<Vec<RepositionEntry>> {
        let index = self.index_of(id)?;
        let bucket = self.items[index].bucket;
        self.items[index].important = true;
        self.items[index].position = HEAD_SENTINEL;
        self.sort_bucket_by_position(bucket);
        Some(self.renumber_bucket(bucket))
    }

    /// Put a bucket back to an earlier order and positions.
    ///
    /// Members that joined the bucket since `prior` was taken keep their
    /// relative order after the restored ones.
    pub fn restore_bucket(&mut self, bucket: Bucket, prior: &[RepositionEntry]) {
        let current = self.bucket_sequence(bucket);
        let mut order: Vec<ItemId> = prior
            .iter()
            .map(|entry| entry.id)
            .filter(|id| current.contains(id))
            .collect();
        let mut next = prior.iter().map(|entry| entry.position).max().unwrap_or(-1) + 1;
        let mut extras = Vec::new();
        for id in current {
            if !order.contains(&id) {
                order.push(id);
                extras.push(RepositionEntry { id, position: next });
                next += 1;
            }
        }
        let restored: Vec<RepositionEntry> = prior
            .iter()
            .filter(|entry| order.contains(&entry.id))
            .copied()
            .collect();
        self.set_bucket_order(bucket, &order);
        self.apply_positions(&restored);
        self.apply_positions(&extras);
    }

    pub fn apply_positions(&mut self, entries: &[RepositionEntry]) {
        for entry in entries {
            if let Some(item) = self.items.iter_mut().find(|item| item.id == entry.id) {
                item.position = entry.position;
            }
        }
    }
}
