use std::cell::RefCell;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    BoardService, Card, CardChange, CardChangeKind, CardService, CardServiceError,
    ChangeNotifier, Column, NewCard, NotifyError, SqliteBoardRepository, SqliteCardRepository,
};
use uuid::Uuid;

struct Fixture {
    conn: rusqlite::Connection,
}

impl Fixture {
    fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
        }
    }

    fn boards(&self) -> BoardService<SqliteBoardRepository<'_>> {
        BoardService::new(SqliteBoardRepository::try_new(&self.conn).unwrap())
    }

    fn cards(&self) -> CardService<SqliteCardRepository<'_>> {
        CardService::new(SqliteCardRepository::try_new(&self.conn).unwrap())
    }

    /// One board with columns `A` and `B`.
    fn two_columns(&self) -> (Column, Column) {
        let boards = self.boards();
        let board = boards.create_board("Board").unwrap();
        let a = boards.create_column(board.uuid, "A").unwrap();
        let b = boards.create_column(board.uuid, "B").unwrap();
        (a, b)
    }

    /// Appends cards named `names` to the end of `column`, in order.
    fn fill(&self, column: &Column, names: &[&str]) -> Vec<Card> {
        let cards = self.cards();
        names
            .iter()
            .map(|name| {
                cards
                    .create_card(NewCard::new(column.board_uuid, *name), column.uuid, i64::MAX)
                    .unwrap()
                    .card
            })
            .collect()
    }

    fn names(&self, column: &Column) -> Vec<String> {
        self.cards()
            .list_cards(column.uuid)
            .unwrap()
            .into_iter()
            .map(|card| card.name)
            .collect()
    }

    fn positions(&self, column: &Column) -> Vec<u32> {
        self.cards()
            .list_cards(column.uuid)
            .unwrap()
            .into_iter()
            .map(|card| card.position.unwrap())
            .collect()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    published: RefCell<Vec<CardChange>>,
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, change: &CardChange) -> Result<(), NotifyError> {
        self.published.borrow_mut().push(change.clone());
        Ok(())
    }
}

#[test]
fn appended_cards_get_contiguous_positions() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    fx.fill(&a, &["one", "two", "three"]);

    assert_eq!(fx.names(&a), vec!["one", "two", "three"]);
    assert_eq!(fx.positions(&a), vec![1, 2, 3]);
}

#[test]
fn add_new_lands_on_top_with_default_name() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    fx.fill(&a, &["one", "two"]);

    let added = fx
        .cards()
        .add_new(a.board_uuid, a.uuid, None, Some("#42".to_string()), None)
        .unwrap();

    assert_eq!(added.card.name, "Empty!");
    assert_eq!(added.card.position, Some(1));
    assert_eq!(added.before, None);
    assert_eq!(fx.names(&a), vec!["Empty!", "one", "two"]);
    assert_eq!(fx.positions(&a), vec![1, 2, 3]);
}

#[test]
fn move_within_clamps_out_of_range_targets() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let cards = fx.fill(&a, &["one", "two", "three"]);
    let service = fx.cards();

    let moved = service.move_within(cards[0].uuid, 99).unwrap();
    assert_eq!(moved.card.position, Some(3));
    assert_eq!(moved.before.unwrap().position, 1);
    assert_eq!(fx.names(&a), vec!["two", "three", "one"]);

    let moved = service.move_within(cards[0].uuid, -5).unwrap();
    assert_eq!(moved.card.position, Some(1));
    assert_eq!(fx.names(&a), vec!["one", "two", "three"]);
    assert_eq!(fx.positions(&a), vec![1, 2, 3]);
}

#[test]
fn move_within_shifts_only_cards_between_old_and_new_position() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let cards = fx.fill(&a, &["c1", "c2", "c3", "c4", "c5"]);

    fx.cards().move_within(cards[3].uuid, 2).unwrap();

    assert_eq!(fx.names(&a), vec!["c1", "c4", "c2", "c3", "c5"]);
    assert_eq!(fx.positions(&a), vec![1, 2, 3, 4, 5]);
}

#[test]
fn move_across_renumbers_both_columns() {
    let fx = Fixture::new();
    let (a, b) = fx.two_columns();
    let in_a = fx.fill(&a, &["a1", "a2", "a3", "a4", "a5"]);
    fx.fill(&b, &["b1", "b2", "b3"]);

    let moved = fx.cards().move_across(in_a[3].uuid, b.uuid, 2).unwrap();

    assert_eq!(moved.card.column_uuid, Some(b.uuid));
    assert_eq!(moved.card.position, Some(2));
    let before = moved.before.unwrap();
    assert_eq!(before.column_uuid, a.uuid);
    assert_eq!(before.position, 4);

    assert_eq!(fx.names(&a), vec!["a1", "a2", "a3", "a5"]);
    assert_eq!(fx.positions(&a), vec![1, 2, 3, 4]);
    assert_eq!(fx.names(&b), vec!["b1", "a4", "b2", "b3"]);
    assert_eq!(fx.positions(&b), vec![1, 2, 3, 4]);
}

#[test]
fn move_across_into_empty_column_clamps_to_first_slot() {
    let fx = Fixture::new();
    let (a, b) = fx.two_columns();
    let in_a = fx.fill(&a, &["a1", "a2"]);

    let moved = fx.cards().move_across(in_a[0].uuid, b.uuid, 7).unwrap();

    assert_eq!(moved.card.position, Some(1));
    assert_eq!(fx.names(&a), vec!["a2"]);
    assert_eq!(fx.positions(&a), vec![1]);
    assert_eq!(fx.names(&b), vec!["a1"]);
}

#[test]
fn move_to_dispatches_on_target_column() {
    let fx = Fixture::new();
    let (a, b) = fx.two_columns();
    let in_a = fx.fill(&a, &["a1", "a2", "a3"]);
    let service = fx.cards();

    service.move_to(in_a[2].uuid, a.uuid, 1).unwrap();
    assert_eq!(fx.names(&a), vec!["a3", "a1", "a2"]);

    service.move_to(in_a[2].uuid, b.uuid, 1).unwrap();
    assert_eq!(fx.names(&a), vec!["a1", "a2"]);
    assert_eq!(fx.names(&b), vec!["a3"]);
}

#[test]
fn remove_leaves_card_unplaced_and_closes_gap() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let cards = fx.fill(&a, &["one", "two", "three"]);
    let service = fx.cards();

    let removed = service.remove(cards[1].uuid).unwrap();

    assert!(!removed.card.is_placed());
    assert_eq!(removed.before.unwrap().position, 2);
    assert_eq!(fx.names(&a), vec!["one", "three"]);
    assert_eq!(fx.positions(&a), vec![1, 2]);

    assert!(matches!(
        service.move_within(cards[1].uuid, 1),
        Err(CardServiceError::CardUnplaced(_))
    ));
    assert!(matches!(
        service.remove(cards[1].uuid),
        Err(CardServiceError::CardUnplaced(_))
    ));
}

#[test]
fn insert_places_unplaced_card_and_rejects_placed_one() {
    let fx = Fixture::new();
    let (a, b) = fx.two_columns();
    let cards = fx.fill(&a, &["one", "two"]);
    fx.fill(&b, &["b1", "b2"]);
    let service = fx.cards();

    service.remove(cards[0].uuid).unwrap();
    let inserted = service.insert(cards[0].uuid, b.uuid, 0).unwrap();

    assert_eq!(inserted.before, None);
    assert_eq!(inserted.card.position, Some(1));
    assert_eq!(fx.names(&b), vec!["one", "b1", "b2"]);
    assert_eq!(fx.positions(&b), vec![1, 2, 3]);

    assert!(matches!(
        service.insert(cards[1].uuid, b.uuid, 1),
        Err(CardServiceError::CardAlreadyPlaced(_))
    ));
    assert_eq!(fx.names(&a), vec!["two"]);
}

#[test]
fn placement_on_another_board_is_rejected_without_changes() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let (foreign, _) = fx.two_columns();
    let cards = fx.fill(&a, &["one", "two"]);
    let service = fx.cards();

    let err = service.move_across(cards[0].uuid, foreign.uuid, 1).unwrap_err();
    assert!(matches!(err, CardServiceError::ColumnNotOnBoard { .. }));
    assert_eq!(fx.names(&a), vec!["one", "two"]);
    assert!(fx.names(&foreign).is_empty());

    let err = service
        .create_card(NewCard::new(a.board_uuid, "stray"), foreign.uuid, 1)
        .unwrap_err();
    assert!(matches!(err, CardServiceError::ColumnNotOnBoard { .. }));
}

#[test]
fn unknown_ids_are_reported_as_not_found() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let service = fx.cards();
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.move_within(missing, 1),
        Err(CardServiceError::CardNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.list_cards(missing),
        Err(CardServiceError::ColumnNotFound(_))
    ));
    assert!(matches!(
        service.create_card(NewCard::new(a.board_uuid, "x"), missing, 1),
        Err(CardServiceError::ColumnNotFound(_))
    ));
}

#[test]
fn delete_closes_gap_in_column() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let cards = fx.fill(&a, &["one", "two", "three"]);
    let service = fx.cards();

    let deleted = service.delete(cards[0].uuid).unwrap();
    assert_eq!(deleted.name, "one");

    assert_eq!(fx.names(&a), vec!["two", "three"]);
    assert_eq!(fx.positions(&a), vec![1, 2]);
    assert!(matches!(
        service.get_card(cards[0].uuid),
        Err(CardServiceError::CardNotFound(_))
    ));
}

#[test]
fn field_edits_validate_and_persist() {
    let fx = Fixture::new();
    let (a, _) = fx.two_columns();
    let card = fx.fill(&a, &["one"]).remove(0);
    let service = fx.cards();

    assert_eq!(card.color.as_str(), "#ffffff");
    let recolored = service.change_color(card.uuid, "#12abEF").unwrap();
    assert_eq!(recolored.color.as_str(), "#12abEF");
    assert!(matches!(
        service.change_color(card.uuid, "red"),
        Err(CardServiceError::InvalidColor(_))
    ));
    assert_eq!(service.get_card(card.uuid).unwrap().color.as_str(), "#12abEF");

    assert!(matches!(
        service.rename(card.uuid, "  "),
        Err(CardServiceError::InvalidDisplayName)
    ));
    let renamed = service.rename(card.uuid, " Ship it ").unwrap();
    assert_eq!(renamed.name, "Ship it");

    let tagged = service
        .set_tags(
            card.uuid,
            &["backend".to_string(), " backend ".to_string(), "ui".to_string()],
        )
        .unwrap();
    assert_eq!(tagged.tags.len(), 2);
    assert!(tagged.tags.contains(&"backend".to_string()));

    let noted = service.update_notes(card.uuid, "blocked on review").unwrap();
    assert_eq!(noted.notes, "blocked on review");
    assert_eq!(noted.position, Some(1));
}

#[test]
fn card_moves_feed_change_notifier() {
    let fx = Fixture::new();
    let (a, b) = fx.two_columns();
    let cards = fx.fill(&a, &["one", "two"]);
    let notifier = RecordingNotifier::default();
    let service = fx.cards();

    let moved = service.move_across(cards[1].uuid, b.uuid, 1).unwrap();
    notifier
        .publish(&moved.change(CardChangeKind::MoveCard))
        .unwrap();

    let published = notifier.published.borrow();
    assert_eq!(published.len(), 1);
    let change = &published[0];
    assert_eq!(change.kind, CardChangeKind::MoveCard);
    assert_eq!(change.card_uuid, cards[1].uuid);
    assert_eq!(change.board_uuid, a.board_uuid);
    assert_eq!(change.display_name, "two");
    assert!(change.is_reposition());
    assert_eq!(change.after.unwrap().column_uuid, b.uuid);
}

#[test]
fn moving_fourth_card_to_top_of_two_card_column() {
    let fx = Fixture::new();
    let (a, b) = fx.two_columns();
    let in_a = fx.fill(&a, &["a1", "a2", "a3", "a4"]);
    fx.fill(&b, &["b1", "b2"]);

    let moved = fx.cards().move_across(in_a[3].uuid, b.uuid, 1).unwrap();

    assert_eq!(moved.card.position, Some(1));
    assert_eq!(fx.positions(&a), vec![1, 2, 3]);
    assert_eq!(fx.names(&b), vec!["a4", "b1", "b2"]);
    assert_eq!(fx.positions(&b), vec![1, 2, 3]);
}
