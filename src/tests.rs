//! Board scenarios against the in-memory authority

use std::cell::Cell;
use std::sync::OnceLock;

use async_trait::async_trait;
use board_dragdrop::DropTarget;
use tokio::sync::Notify;

use crate::commit::CommitOutcome;
use crate::config::{BoardConfig, PromotionRollback};
use crate::drag::GestureEnd;
use crate::error::{BoardError, BoardResult};
use crate::handle::BoardHandle;
use crate::models::{Bucket, Item, ItemId, ItemPatch, NewItem, RepositionBatch};
use crate::promote::PromotionOutcome;
use crate::remote::{Call, MemoryAuthority, Operation, RemoteAuthority};
use crate::session::BoardSession;
use crate::sync::ResyncReport;

// ========================
// Helpers
// ========================

fn authority(layout: &[(&str, Bucket)]) -> MemoryAuthority {
    let authority = MemoryAuthority::new();
    for &(title, bucket) in layout {
        authority.seed(title, bucket);
    }
    authority
}

async fn loaded<A: RemoteAuthority>(authority: A, config: BoardConfig) -> BoardSession<A> {
    let session = BoardSession::new(authority, config);
    session.load().await.unwrap();
    session
}

fn id_of<A>(session: &BoardSession<A>, title: &str) -> ItemId
where
    A: RemoteAuthority,
{
    session
        .board()
        .with(|b| b.items().iter().find(|i| i.title == title).map(|i| i.id))
        .unwrap()
}

/// `(title, position)` of a bucket in display order
fn column<A: RemoteAuthority>(session: &BoardSession<A>, bucket: Bucket) -> Vec<(String, i32)> {
    session.board().with(|b| {
        b.bucket_items(bucket)
            .into_iter()
            .map(|i| (i.title.clone(), i.position))
            .collect()
    })
}

fn expect(layout: &[(&str, i32)]) -> Vec<(String, i32)> {
    layout.iter().map(|&(t, p)| (t.to_string(), p)).collect()
}

fn last_batch(authority: &MemoryAuthority) -> Option<RepositionBatch> {
    authority.calls().into_iter().rev().find_map(|call| match call {
        Call::Reposition(batch) => Some(batch),
        _ => None,
    })
}

/// Every local item has the bucket and position the authority holds
fn assert_board_agrees(board: &BoardHandle, authority: &MemoryAuthority) {
    for item in board.snapshot().items() {
        let remote = authority.item(item.id).unwrap();
        assert_eq!((item.bucket, item.position), (remote.bucket, remote.position), "item {}", item.id);
    }
}

fn assert_agrees(session: &BoardSession<MemoryAuthority>) {
    assert_board_agrees(session.board(), session.authority());
}

fn batch_entries(batch: &RepositionBatch) -> Vec<(ItemId, i32)> {
    batch.items.iter().map(|e| (e.id, e.position)).collect()
}

fn assert_exclusive(session: &BoardSession<impl RemoteAuthority>) {
    session.board().with(|b| {
        for item in b.items() {
            let homes = Bucket::ALL
                .iter()
                .filter(|&&bucket| b.bucket_sequence(bucket).contains(&item.id))
                .count();
            assert_eq!(homes, 1, "item {}", item.id);
        }
    });
}

/// Holds one call of the chosen operation until released
struct GatedAuthority {
    inner: MemoryAuthority,
    gated: Cell<Option<Operation>>,
    arrived: Notify,
    release: Notify,
}

impl GatedAuthority {
    fn new(inner: MemoryAuthority) -> Self {
        Self {
            inner,
            gated: Cell::new(None),
            arrived: Notify::new(),
            release: Notify::new(),
        }
    }

    fn gate(&self, operation: Operation) {
        self.gated.set(Some(operation));
    }

    async fn pass(&self, operation: Operation) {
        if self.gated.get() == Some(operation) {
            self.gated.set(None);
            self.arrived.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait(?Send)]
impl RemoteAuthority for GatedAuthority {
    async fn fetch_items(&self, project_id: Option<u32>) -> BoardResult<Vec<Item>> {
        // Held after reading, so the response is stale when it lands
        let items = self.inner.fetch_items(project_id).await;
        self.pass(Operation::Fetch).await;
        items
    }

    async fn create_item(&self, item: &NewItem) -> BoardResult<Item> {
        self.pass(Operation::Create).await;
        self.inner.create_item(item).await
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> BoardResult<Item> {
        self.pass(Operation::Update).await;
        self.inner.update_item(id, patch).await
    }

    async fn delete_item(&self, id: ItemId) -> BoardResult<()> {
        self.pass(Operation::Delete).await;
        self.inner.delete_item(id).await
    }

    async fn reposition(&self, batch: &RepositionBatch) -> BoardResult<()> {
        self.pass(Operation::Reposition).await;
        self.inner.reposition(batch).await
    }

    async fn toggle_important(&self, id: ItemId) -> BoardResult<Item> {
        self.pass(Operation::ToggleImportant).await;
        self.inner.toggle_important(id).await
    }
}

// ========================
// Drag and drop
// ========================

#[tokio::test]
async fn test_reorder_within_bucket_commits_dense_positions() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, c) = (id_of(&session, "A"), id_of(&session, "C"));

    assert!(session.drag_start(c));
    assert!(session.drag_over(DropTarget::Item(a)));
    assert_eq!(
        session.board().with(|b| b.bucket_sequence(Bucket::Working)),
        vec![c, a, id_of(&session, "B")]
    );

    let outcome = session.drag_end(GestureEnd::Dropped).await;
    assert_eq!(outcome, Some(CommitOutcome::Committed));
    assert_eq!(column(&session, Bucket::Working), expect(&[("C", 0), ("A", 1), ("B", 2)]));
    assert!(!session
        .authority()
        .calls()
        .iter()
        .any(|call| call.operation() == Operation::Update));
    assert_agrees(&session);
}

#[tokio::test]
async fn test_drop_on_empty_column() {
    let session = loaded(
        authority(&[("X", Bucket::New), ("Y", Bucket::New), ("Z", Bucket::New)]),
        BoardConfig::default(),
    )
    .await;
    let x = id_of(&session, "X");

    session.drag_start(x);
    session.drag_over(DropTarget::Column(Bucket::Complete));
    let outcome = session.drag_end(GestureEnd::Dropped).await;

    assert_eq!(outcome, Some(CommitOutcome::Committed));
    assert_eq!(column(&session, Bucket::Complete), expect(&[("X", 0)]));
    assert_eq!(column(&session, Bucket::New), expect(&[("Y", 0), ("Z", 1)]));

    let calls = session.authority().calls();
    assert_eq!(calls[1], Call::Update(x, ItemPatch::bucket(Bucket::Complete)));
    assert_eq!(last_batch(session.authority()).unwrap().len(), 3);
    assert_agrees(&session);
}

#[tokio::test]
async fn test_cross_bucket_drop_before_item() {
    let session = loaded(
        authority(&[("X", Bucket::New), ("A", Bucket::Working), ("B", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (x, b) = (id_of(&session, "X"), id_of(&session, "B"));

    session.drag_start(x);
    session.drag_over(DropTarget::Item(b));
    session.drag_end(GestureEnd::Dropped).await;

    assert_eq!(
        column(&session, Bucket::Working),
        expect(&[("A", 0), ("X", 1), ("B", 2)])
    );
    assert!(session.board().with(|b| b.is_settled()));
    assert_agrees(&session);
}

#[tokio::test]
async fn test_failed_reposition_resyncs_to_authority() {
    let session = loaded(
        authority(&[("X", Bucket::New), ("A", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (x, a) = (id_of(&session, "X"), id_of(&session, "A"));
    session.authority().fail_next(Operation::Reposition);

    session.drag_start(x);
    session.drag_over(DropTarget::Item(a));
    let outcome = session.drag_end(GestureEnd::Dropped).await;

    assert!(matches!(outcome, Some(CommitOutcome::Resynced(BoardError::Network(_)))));
    // No compensating write: the board shows exactly what the authority stored
    assert_eq!(session.board().snapshot().items(), session.authority().listing(None).as_slice());
}

#[tokio::test]
async fn test_failed_bucket_change_undoes_drag() {
    let session = loaded(
        authority(&[("X", Bucket::New), ("A", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let before = session.board().snapshot();
    let (x, a) = (id_of(&session, "X"), id_of(&session, "A"));
    session.authority().fail_next(Operation::Update);

    session.drag_start(x);
    session.drag_over(DropTarget::Item(a));
    let outcome = session.drag_end(GestureEnd::Dropped).await;

    assert!(matches!(outcome, Some(CommitOutcome::Resynced(_))));
    assert_eq!(session.board().snapshot(), before);
    assert_eq!(session.board().with(|b| b.bucket_of(x)), Some(Bucket::New));
}

#[tokio::test]
async fn test_failed_resync_keeps_speculative_board() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, b) = (id_of(&session, "A"), id_of(&session, "B"));
    session.authority().fail_next(Operation::Reposition);
    session.authority().fail_next(Operation::Fetch);

    session.drag_start(b);
    session.drag_over(DropTarget::Item(a));
    let outcome = session.drag_end(GestureEnd::Dropped).await;

    assert!(matches!(outcome, Some(CommitOutcome::ResyncFailed { .. })));
    assert_eq!(session.board().with(|b| b.bucket_sequence(Bucket::Working)), vec![b, a]);
}

#[tokio::test]
async fn test_cancel_commits_hover_effects() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, c) = (id_of(&session, "A"), id_of(&session, "C"));

    session.drag_start(c);
    session.drag_over(DropTarget::Item(a));
    let outcome = session.drag_end(GestureEnd::Cancelled).await;

    assert_eq!(outcome, Some(CommitOutcome::Committed));
    assert_eq!(column(&session, Bucket::Working), expect(&[("C", 0), ("A", 1), ("B", 2)]));
}

#[tokio::test]
async fn test_gesture_without_change_sends_nothing() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let a = id_of(&session, "A");
    session.authority().clear_calls();

    session.drag_start(a);
    session.drag_over(DropTarget::Item(a));
    session.drag_over(DropTarget::Column(Bucket::Working));
    let outcome = session.drag_end(GestureEnd::Cancelled).await;

    assert_eq!(outcome, Some(CommitOutcome::Unchanged));
    assert!(session.authority().calls().is_empty());
    assert_eq!(session.drag_end(GestureEnd::Dropped).await, None);
}

#[tokio::test]
async fn test_item_deleted_mid_gesture() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, b) = (id_of(&session, "A"), id_of(&session, "B"));

    session.drag_start(b);
    session.drag_over(DropTarget::Item(a));
    // Another session removed the dragged item
    session.authority().delete_item(b).await.unwrap();
    let outcome = session.drag_end(GestureEnd::Dropped).await;

    assert!(matches!(outcome, Some(CommitOutcome::Resynced(BoardError::NotFound(_)))));
    assert!(session.board().with(|board| board.get(b).is_none()));
}

#[tokio::test]
async fn test_pointer_input_drives_commit() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, c) = (id_of(&session, "A"), id_of(&session, "C"));
    let mut tracker = session.tracker();

    tracker.pointer_down(c, 100, 100, 0);
    assert!(tracker.pointer_move(103, 102).is_none());
    let start = tracker.pointer_move(100, 112).unwrap();
    assert_eq!(session.handle_drag_event(start).await, None);

    let over = tracker.enter_item(a).unwrap();
    assert_eq!(session.handle_drag_event(over).await, None);

    let end = tracker.pointer_up().unwrap();
    assert_eq!(session.handle_drag_event(end).await, Some(CommitOutcome::Committed));
    assert_eq!(column(&session, Bucket::Working), expect(&[("C", 0), ("A", 1), ("B", 2)]));
}

#[tokio::test]
async fn test_density_and_exclusivity_over_many_gestures() {
    let titles = ["a", "b", "c", "d", "e", "f", "g"];
    let layout: Vec<(&str, Bucket)> = titles
        .iter()
        .enumerate()
        .map(|(i, &t)| (t, Bucket::ALL[i % 3]))
        .collect();
    let session = loaded(authority(&layout), BoardConfig::default()).await;
    let ids: Vec<ItemId> = titles.iter().map(|t| id_of(&session, t)).collect();

    // Deterministic walk over items and targets
    let mut seed: u32 = 7;
    let mut next = |n: usize| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (seed >> 16) as usize % n
    };
    for _ in 0..40 {
        let dragged = ids[next(ids.len())];
        session.drag_start(dragged);
        for _ in 0..(1 + next(3)) {
            let target = if next(4) == 0 {
                DropTarget::Column(Bucket::ALL[next(3)])
            } else {
                DropTarget::Item(ids[next(ids.len())])
            };
            session.drag_over(target);
        }
        let end = if next(5) == 0 { GestureEnd::Cancelled } else { GestureEnd::Dropped };
        let outcome = session.drag_end(end).await.unwrap();

        assert!(outcome.is_committed(), "{:?}", outcome);
        assert!(session.board().with(|b| b.is_settled()));
        assert_exclusive(&session);
        assert_agrees(&session);
    }
    assert_eq!(session.board().with(|b| b.len()), ids.len());
}

#[tokio::test]
async fn test_commit_reads_board_after_await() {
    let inner = authority(&[
        ("A", Bucket::Working),
        ("B", Bucket::Working),
        ("C", Bucket::Working),
        ("X", Bucket::New),
    ]);
    let session = loaded(GatedAuthority::new(inner), BoardConfig::default()).await;
    let (a, b, c, x) = (
        id_of(&session, "A"),
        id_of(&session, "B"),
        id_of(&session, "C"),
        id_of(&session, "X"),
    );
    session.authority().gate(Operation::Update);

    session.drag_start(x);
    session.drag_over(DropTarget::Column(Bucket::Working));
    let first = session.drag_end(GestureEnd::Dropped);
    let second = async {
        session.authority().arrived.notified().await;
        // The first commit is waiting on its bucket change
        assert!(session.drag_start(c));
        session.drag_over(DropTarget::Item(a));
        let outcome = session.drag_end(GestureEnd::Dropped).await;
        session.authority().release.notify_one();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, Some(CommitOutcome::Committed));
    assert_eq!(second, Some(CommitOutcome::Committed));

    // The first commit's batch was built after it resumed
    let batch = last_batch(&session.authority().inner).unwrap();
    assert_eq!(batch_entries(&batch), vec![(c, 0), (a, 1), (b, 2), (x, 3)]);

    assert_eq!(
        session.board().with(|board| board.bucket_sequence(Bucket::Working)),
        vec![c, a, b, x]
    );
    assert!(session.board().with(|board| board.is_settled()));
    assert_board_agrees(session.board(), &session.authority().inner);
}

#[tokio::test]
async fn test_recovery_resync_keeps_later_commit() {
    let inner = authority(&[
        ("A", Bucket::Working),
        ("B", Bucket::Working),
        ("X", Bucket::New),
        ("Y", Bucket::New),
    ]);
    let session = loaded(GatedAuthority::new(inner), BoardConfig::default()).await;
    let (a, b, x, y) = (
        id_of(&session, "A"),
        id_of(&session, "B"),
        id_of(&session, "X"),
        id_of(&session, "Y"),
    );
    session.authority().inner.fail_next(Operation::Reposition);
    session.authority().gate(Operation::Fetch);

    session.drag_start(b);
    session.drag_over(DropTarget::Item(a));
    let first = session.drag_end(GestureEnd::Dropped);
    let second = async {
        // The failed batch is being recovered and its listing is in flight
        session.authority().arrived.notified().await;
        assert!(session.drag_start(y));
        session.drag_over(DropTarget::Item(x));
        let outcome = session.drag_end(GestureEnd::Dropped).await;
        session.authority().release.notify_one();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, Some(CommitOutcome::Resynced(BoardError::Network(_)))));
    assert_eq!(second, Some(CommitOutcome::Committed));
    assert_eq!(column(&session, Bucket::New), expect(&[("Y", 0), ("X", 1)]));
    assert_eq!(column(&session, Bucket::Working), expect(&[("A", 0), ("B", 1)]));
    assert_board_agrees(session.board(), &session.authority().inner);
}

#[tokio::test]
async fn test_drag_end_finishes_gesture_before_commit_runs() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, b, c) = (id_of(&session, "A"), id_of(&session, "B"), id_of(&session, "C"));

    session.drag_start(c);
    session.drag_over(DropTarget::Item(a));
    let first = session.drag_end(GestureEnd::Dropped);
    // The first commit has not been polled yet
    assert!(session.drag_start(b));
    session.drag_over(DropTarget::Item(a));

    assert_eq!(first.await, Some(CommitOutcome::Committed));
    assert_eq!(session.drag_end(GestureEnd::Dropped).await, Some(CommitOutcome::Committed));
    assert_eq!(column(&session, Bucket::Working), expect(&[("C", 0), ("B", 1), ("A", 2)]));
    assert_agrees(&session);
}

// ========================
// Importance
// ========================

#[tokio::test]
async fn test_promotion_moves_to_head() {
    let session = loaded(
        authority(&[("P", Bucket::Working), ("Q", Bucket::Working), ("R", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let r = id_of(&session, "R");

    assert_eq!(session.toggle_important(r).await, PromotionOutcome::Promoted);
    assert_eq!(column(&session, Bucket::Working), expect(&[("R", 0), ("P", 1), ("Q", 2)]));
    assert!(session.board().with(|b| b.get(r).unwrap().important));
    assert!(session.authority().item(r).unwrap().important);
    assert_agrees(&session);
}

#[tokio::test]
async fn test_failed_promotion_reverts_flag_only() {
    let session = loaded(
        authority(&[("P", Bucket::Working), ("Y", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let y = id_of(&session, "Y");
    session.authority().fail_next(Operation::ToggleImportant);

    let outcome = session.toggle_important(y).await;

    assert!(matches!(outcome, PromotionOutcome::Reverted { important: false, .. }));
    assert!(!session.board().with(|b| b.get(y).unwrap().important));
    // The head placement stays
    assert_eq!(column(&session, Bucket::Working), expect(&[("Y", 0), ("P", 1)]));
}

#[tokio::test]
async fn test_failed_promotion_full_rollback() {
    let config = BoardConfig {
        promotion_rollback: PromotionRollback::Full,
        ..Default::default()
    };
    let session = loaded(
        authority(&[("P", Bucket::Working), ("Y", Bucket::Working)]),
        config,
    )
    .await;
    let y = id_of(&session, "Y");
    session.authority().fail_next(Operation::Reposition);

    let outcome = session.toggle_important(y).await;

    assert!(matches!(outcome, PromotionOutcome::Reverted { important: false, .. }));
    assert!(!session.board().with(|b| b.get(y).unwrap().important));
    assert_eq!(column(&session, Bucket::Working), expect(&[("P", 0), ("Y", 1)]));
}

#[tokio::test]
async fn test_demotion_keeps_positions() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let c = id_of(&session, "C");
    session.toggle_important(c).await;
    let before = column(&session, Bucket::Working);
    session.authority().clear_calls();

    assert_eq!(session.toggle_important(c).await, PromotionOutcome::Demoted);
    assert_eq!(column(&session, Bucket::Working), before);
    assert!(!session.board().with(|b| b.get(c).unwrap().important));
    assert_eq!(session.authority().calls(), vec![Call::ToggleImportant(c)]);
}

#[tokio::test]
async fn test_failed_demotion_restores_flag() {
    let session = loaded(authority(&[("A", Bucket::New)]), BoardConfig::default()).await;
    let a = id_of(&session, "A");
    session.toggle_important(a).await;
    session.authority().fail_next(Operation::ToggleImportant);

    let outcome = session.toggle_important(a).await;

    assert!(matches!(outcome, PromotionOutcome::Reverted { important: true, .. }));
    assert!(session.board().with(|b| b.get(a).unwrap().important));
}

#[tokio::test]
async fn test_drag_while_promotion_in_flight() {
    let inner = authority(&[("P", Bucket::Working), ("Q", Bucket::Working), ("R", Bucket::Working)]);
    let session = loaded(GatedAuthority::new(inner), BoardConfig::default()).await;
    let (p, q, r) = (id_of(&session, "P"), id_of(&session, "Q"), id_of(&session, "R"));
    session.authority().gate(Operation::ToggleImportant);

    let toggle = session.toggle_important(r);
    let drag = async {
        // R is already at the head while its toggle is held
        session.authority().arrived.notified().await;
        assert_eq!(
            session.board().with(|b| b.bucket_sequence(Bucket::Working)),
            vec![r, p, q]
        );
        session.drag_start(q);
        session.drag_over(DropTarget::Item(r));
        let outcome = session.drag_end(GestureEnd::Dropped).await;
        session.authority().release.notify_one();
        outcome
    };
    let (toggle, drag) = tokio::join!(toggle, drag);

    assert_eq!(toggle, PromotionOutcome::Promoted);
    assert_eq!(drag, Some(CommitOutcome::Committed));
    // The promotion's batch follows the order the drag left behind
    let batch = last_batch(&session.authority().inner).unwrap();
    assert_eq!(batch_entries(&batch), vec![(q, 0), (r, 1), (p, 2)]);
    assert!(session.board().with(|b| b.get(r).unwrap().important));
    assert_board_agrees(session.board(), &session.authority().inner);
}

#[tokio::test]
async fn test_promotion_while_drag_commit_in_flight() {
    let inner = authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("X", Bucket::New)]);
    let session = loaded(GatedAuthority::new(inner), BoardConfig::default()).await;
    let (a, b, x) = (id_of(&session, "A"), id_of(&session, "B"), id_of(&session, "X"));
    session.authority().gate(Operation::Update);

    session.drag_start(x);
    session.drag_over(DropTarget::Column(Bucket::Working));
    let commit = session.drag_end(GestureEnd::Dropped);
    let promote = async {
        // X's bucket change is held
        session.authority().arrived.notified().await;
        let outcome = session.toggle_important(b).await;
        session.authority().release.notify_one();
        outcome
    };
    let (commit, promote) = tokio::join!(commit, promote);

    assert_eq!(commit, Some(CommitOutcome::Committed));
    assert_eq!(promote, PromotionOutcome::Promoted);
    let batch = last_batch(&session.authority().inner).unwrap();
    let sent: Vec<ItemId> = batch.items.iter().map(|e| e.id).collect();
    assert_eq!(sent, vec![b, a, x]);
    assert_eq!(column(&session, Bucket::Working), expect(&[("B", 0), ("A", 1), ("X", 2)]));
    assert!(session.authority().inner.item(b).unwrap().important);
    assert_board_agrees(session.board(), &session.authority().inner);
}

#[tokio::test]
async fn test_promotion_left_unflagged_by_authority() {
    let session = loaded(
        authority(&[("P", Bucket::Working), ("Y", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let y = id_of(&session, "Y");
    // Another session flagged Y after this board loaded
    session.authority().toggle_important(y).await.unwrap();

    assert_eq!(session.toggle_important(y).await, PromotionOutcome::Demoted);
    assert!(!session.board().with(|b| b.get(y).unwrap().important));
    assert!(!session.authority().item(y).unwrap().important);
    assert_eq!(column(&session, Bucket::Working), expect(&[("Y", 0), ("P", 1)]));
    assert_agrees(&session);
}

#[tokio::test]
async fn test_toggle_unknown_item() {
    let session = loaded(MemoryAuthority::new(), BoardConfig::default()).await;
    assert_eq!(session.toggle_important(404).await, PromotionOutcome::NotFound);
}

// ========================
// CRUD and resync
// ========================

#[tokio::test]
async fn test_add_item_appends_to_bucket() {
    let session = loaded(authority(&[("A", Bucket::Working)]), BoardConfig::default()).await;

    let created = session.add_item(NewItem::new("B", Bucket::Working)).await.unwrap();
    assert_eq!(created.project_id, None);
    assert_eq!(column(&session, Bucket::Working), expect(&[("A", 0), ("B", 1)]));

    session.select_project(Some(5)).await.unwrap();
    assert!(session.board().with(|b| b.is_empty()));
    let scoped = session.add_item(NewItem::new("C", Bucket::New)).await.unwrap();
    assert_eq!(scoped.project_id, Some(5));
    assert_eq!(session.board().with(|b| b.len()), 1);
}

#[tokio::test]
async fn test_update_moves_item_to_end_of_new_bucket() {
    let session = loaded(
        authority(&[("A", Bucket::New), ("B", Bucket::New), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let a = id_of(&session, "A");

    let updated = session.update_item(a, ItemPatch::bucket(Bucket::Working)).await.unwrap();

    assert_eq!(updated.position, 1);
    assert_eq!(column(&session, Bucket::Working), expect(&[("C", 0), ("A", 1)]));
    assert_eq!(column(&session, Bucket::New), expect(&[("B", 0)]));
    assert_agrees(&session);
}

#[tokio::test]
async fn test_update_without_bucket_change() {
    let session = loaded(authority(&[("A", Bucket::New)]), BoardConfig::default()).await;
    let a = id_of(&session, "A");
    session.authority().clear_calls();

    let patch = ItemPatch {
        title: Some("renamed".to_string()),
        ..Default::default()
    };
    let updated = session.update_item(a, patch.clone()).await.unwrap();

    assert_eq!(updated.title, "renamed");
    assert_eq!(session.authority().calls(), vec![Call::Update(a, patch)]);
}

#[tokio::test]
async fn test_delete_closes_gap() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working), ("C", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let b = id_of(&session, "B");

    let outcome = session.delete_item(b).await.unwrap();

    assert_eq!(outcome, CommitOutcome::Committed);
    assert_eq!(column(&session, Bucket::Working), expect(&[("A", 0), ("C", 1)]));
    assert_agrees(&session);
}

#[tokio::test]
async fn test_delete_last_item_needs_no_batch() {
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let b = id_of(&session, "B");

    assert_eq!(session.delete_item(b).await.unwrap(), CommitOutcome::Unchanged);
    assert!(last_batch(session.authority()).is_none());
}

#[tokio::test]
async fn test_delete_failures() {
    let session = loaded(authority(&[("A", Bucket::Working)]), BoardConfig::default()).await;
    let a = id_of(&session, "A");

    assert!(matches!(session.delete_item(999).await, Err(BoardError::NotFound(_))));

    session.authority().fail_next(Operation::Delete);
    assert!(session.delete_item(a).await.is_err());
    assert!(session.board().with(|b| b.get(a).is_some()));
}

#[tokio::test]
async fn test_stale_resync_is_discarded() {
    let inner = authority(&[("A", Bucket::New), ("B", Bucket::New)]);
    let session = loaded(GatedAuthority::new(inner), BoardConfig::default()).await;
    session.authority().gate(Operation::Fetch);

    let stale = session.resync();
    let fresh = async {
        session.authority().arrived.notified().await;
        session.authority().inner.seed("C", Bucket::New);
        let report = session.resync().await;
        session.authority().release.notify_one();
        report
    };
    let (stale, fresh) = tokio::join!(stale, fresh);

    assert_eq!(stale.unwrap(), ResyncReport::Superseded);
    assert_eq!(fresh.unwrap(), ResyncReport::Replaced(3));
    assert_eq!(session.board().with(|b| b.len()), 3);
}

// ========================
// Diagnostics
// ========================

fn logger() -> &'static rolling_logger::LoggerHandle {
    static LOGGER: OnceLock<(tempfile::TempDir, rolling_logger::LoggerHandle)> = OnceLock::new();
    &LOGGER
        .get_or_init(|| {
            let dir = tempfile::tempdir().unwrap();
            let handle = rolling_logger::init(rolling_logger::LoggerConfig::new(dir.path())).unwrap();
            (dir, handle)
        })
        .1
}

#[tokio::test]
async fn test_failed_commit_is_logged() {
    let logger = logger();
    let session = loaded(
        authority(&[("A", Bucket::Working), ("B", Bucket::Working)]),
        BoardConfig::default(),
    )
    .await;
    let (a, b) = (id_of(&session, "A"), id_of(&session, "B"));
    session.authority().fail_next(Operation::Reposition);

    session.drag_start(b);
    session.drag_over(DropTarget::Item(a));
    session.drag_end(GestureEnd::Dropped).await;

    assert!(logger.dir().exists());
    assert!(logger
        .recent()
        .iter()
        .any(|line| line.contains("[COMMIT]") && line.contains("resyncing")));
}
