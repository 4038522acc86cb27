//! Card repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist cards and their per-column positions.
//! - Run every structural mutation (insert/move/remove/delete) as one
//!   load-mutate-write cycle over an [`OrderedColumn`] in one transaction.
//!
//! # Invariants
//! - After every committed mutation each touched column holds positions
//!   exactly `1..=count`.
//! - Card listing is deterministic: `position ASC, uuid ASC`.
//! - A card is only ever placed in a column of its own board.

use crate::model::card::{BoardId, Card, CardColor, CardId, ColumnId, NewCard};
use crate::ordering::OrderedColumn;
use crate::repo::{
    ensure_connection_ready, parse_position, parse_uuid, RepoError, RepoResult, RequiredTable,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const CARD_SELECT_SQL: &str = "SELECT
    uuid,
    board_uuid,
    column_uuid,
    position,
    name,
    issue_no,
    url,
    color,
    notes,
    created_at,
    updated_at
FROM cards";

const REQUIRED_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "cards",
        columns: &[
            "uuid",
            "board_uuid",
            "column_uuid",
            "position",
            "name",
            "issue_no",
            "url",
            "color",
            "notes",
            "created_at",
            "updated_at",
        ],
    },
    RequiredTable {
        name: "card_tags",
        columns: &["card_uuid", "name"],
    },
    RequiredTable {
        name: "board_columns",
        columns: &["uuid", "board_uuid"],
    },
];

/// Repository interface for cards and their column ordering.
pub trait CardRepository {
    /// Creates a card and inserts it into `column_uuid` at `position`
    /// (clamped to `[1, count + 1]`).
    fn create_card(&self, draft: &NewCard, column_uuid: ColumnId, position: i64)
        -> RepoResult<Card>;
    fn get_card(&self, card_uuid: CardId) -> RepoResult<Option<Card>>;
    /// Lists cards of one column by position.
    fn list_cards(&self, column_uuid: ColumnId) -> RepoResult<Vec<Card>>;
    /// Places an unplaced card at `position` (clamped to `[1, count + 1]`).
    fn insert_card(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> RepoResult<Card>;
    /// Reorders a placed card within its column (clamped to `[1, count]`).
    fn move_within(&self, card_uuid: CardId, position: i64) -> RepoResult<Card>;
    /// Removes a placed card from its column and inserts it into another.
    fn move_across(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> RepoResult<Card>;
    /// Detaches a placed card, closing the gap it leaves.
    fn remove_card(&self, card_uuid: CardId) -> RepoResult<Card>;
    /// Persists name, issue reference, url, color and notes.
    fn update_card(&self, card: &Card) -> RepoResult<()>;
    /// Replaces the whole tag set of a card.
    fn set_card_tags(&self, card_uuid: CardId, tags: &[String]) -> RepoResult<()>;
    /// Deletes a card with its tags and observations, closing its gap.
    fn delete_card(&self, card_uuid: CardId) -> RepoResult<()>;
    /// Owning board of a column, if the column exists.
    fn column_board(&self, column_uuid: ColumnId) -> RepoResult<Option<BoardId>>;
}

/// SQLite-backed card repository.
pub struct SqliteCardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn create_card(
        &self,
        draft: &NewCard,
        column_uuid: ColumnId,
        position: i64,
    ) -> RepoResult<Card> {
        let card_uuid = Uuid::new_v4();
        let tx = self.begin()?;
        ensure_column_on_board(&tx, column_uuid, draft.board_uuid, card_uuid)?;

        tx.execute(
            "INSERT INTO cards (
                uuid,
                board_uuid,
                column_uuid,
                position,
                name,
                issue_no,
                url,
                color,
                notes
            ) VALUES (?1, ?2, NULL, NULL, ?3, ?4, ?5, ?6, ?7);",
            params![
                card_uuid.to_string(),
                draft.board_uuid.to_string(),
                draft.name.as_str(),
                draft.issue_no.as_deref(),
                draft.url.as_deref(),
                draft.color.as_str(),
                draft.notes.as_str(),
            ],
        )?;

        let mut order = load_order(&tx, column_uuid)?;
        order
            .insert(card_uuid, position)
            .map_err(|_| RepoError::CardAlreadyPlaced(card_uuid))?;
        write_order(&tx, &order)?;
        tx.commit()?;

        load_required_card(self.conn, card_uuid)
    }

    fn get_card(&self, card_uuid: CardId) -> RepoResult<Option<Card>> {
        load_card(self.conn, card_uuid)
    }

    fn list_cards(&self, column_uuid: ColumnId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE column_uuid = ?1
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([column_uuid.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            let mut card = parse_card_row(row)?;
            card.tags = load_tags(self.conn, card.uuid)?;
            cards.push(card);
        }
        Ok(cards)
    }

    fn insert_card(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> RepoResult<Card> {
        let tx = self.begin()?;
        let card = load_required_card(&tx, card_uuid)?;
        if card.is_placed() {
            return Err(RepoError::CardAlreadyPlaced(card_uuid));
        }
        ensure_column_on_board(&tx, column_uuid, card.board_uuid, card_uuid)?;

        let mut order = load_order(&tx, column_uuid)?;
        order
            .insert(card_uuid, position)
            .map_err(|_| RepoError::CardAlreadyPlaced(card_uuid))?;
        write_order(&tx, &order)?;
        tx.commit()?;

        load_required_card(self.conn, card_uuid)
    }

    fn move_within(&self, card_uuid: CardId, position: i64) -> RepoResult<Card> {
        let tx = self.begin()?;
        let card = load_required_card(&tx, card_uuid)?;
        let column_uuid = card
            .column_uuid
            .ok_or(RepoError::CardUnplaced(card_uuid))?;

        let mut order = load_order(&tx, column_uuid)?;
        order
            .move_within(card_uuid, position)
            .map_err(|_| RepoError::CardUnplaced(card_uuid))?;
        write_order(&tx, &order)?;
        tx.commit()?;

        load_required_card(self.conn, card_uuid)
    }

    fn move_across(
        &self,
        card_uuid: CardId,
        column_uuid: ColumnId,
        position: i64,
    ) -> RepoResult<Card> {
        let tx = self.begin()?;
        let card = load_required_card(&tx, card_uuid)?;
        let source_uuid = card
            .column_uuid
            .ok_or(RepoError::CardUnplaced(card_uuid))?;
        ensure_column_on_board(&tx, column_uuid, card.board_uuid, card_uuid)?;

        if source_uuid == column_uuid {
            let mut order = load_order(&tx, column_uuid)?;
            order
                .move_within(card_uuid, position)
                .map_err(|_| RepoError::CardUnplaced(card_uuid))?;
            write_order(&tx, &order)?;
        } else {
            let mut source = load_order(&tx, source_uuid)?;
            source
                .remove(card_uuid)
                .map_err(|_| RepoError::CardUnplaced(card_uuid))?;
            detach_card(&tx, card_uuid)?;
            write_order(&tx, &source)?;

            let mut target = load_order(&tx, column_uuid)?;
            target
                .insert(card_uuid, position)
                .map_err(|_| RepoError::CardAlreadyPlaced(card_uuid))?;
            write_order(&tx, &target)?;
        }
        tx.commit()?;

        load_required_card(self.conn, card_uuid)
    }

    fn remove_card(&self, card_uuid: CardId) -> RepoResult<Card> {
        let tx = self.begin()?;
        close_gap(&tx, card_uuid)?;
        tx.commit()?;

        load_required_card(self.conn, card_uuid)
    }

    fn update_card(&self, card: &Card) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET
                name = ?2,
                issue_no = ?3,
                url = ?4,
                color = ?5,
                notes = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                card.uuid.to_string(),
                card.name.as_str(),
                card.issue_no.as_deref(),
                card.url.as_deref(),
                card.color.as_str(),
                card.notes.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(card.uuid));
        }
        Ok(())
    }

    fn set_card_tags(&self, card_uuid: CardId, tags: &[String]) -> RepoResult<()> {
        let tx = self.begin()?;
        load_required_card(&tx, card_uuid)?;

        tx.execute(
            "DELETE FROM card_tags WHERE card_uuid = ?1;",
            [card_uuid.to_string()],
        )?;
        for tag in tags {
            tx.execute(
                "INSERT OR IGNORE INTO card_tags (card_uuid, name) VALUES (?1, ?2);",
                params![card_uuid.to_string(), tag.as_str()],
            )?;
        }
        tx.execute(
            "UPDATE cards
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [card_uuid.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_card(&self, card_uuid: CardId) -> RepoResult<()> {
        let tx = self.begin()?;
        let card = load_required_card(&tx, card_uuid)?;
        if card.is_placed() {
            close_gap(&tx, card_uuid)?;
        }
        tx.execute("DELETE FROM cards WHERE uuid = ?1;", [card_uuid.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn column_board(&self, column_uuid: ColumnId) -> RepoResult<Option<BoardId>> {
        column_board(self.conn, column_uuid)
    }
}

fn load_card(conn: &Connection, card_uuid: CardId) -> RepoResult<Option<Card>> {
    let mut stmt = conn.prepare(&format!("{CARD_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([card_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        let mut card = parse_card_row(row)?;
        card.tags = load_tags(conn, card_uuid)?;
        return Ok(Some(card));
    }
    Ok(None)
}

fn load_required_card(conn: &Connection, card_uuid: CardId) -> RepoResult<Card> {
    load_card(conn, card_uuid)?.ok_or(RepoError::CardNotFound(card_uuid))
}

fn load_tags(conn: &Connection, card_uuid: CardId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name
         FROM card_tags
         WHERE card_uuid = ?1
         ORDER BY name ASC;",
    )?;
    let mut rows = stmt.query([card_uuid.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

fn column_board(conn: &Connection, column_uuid: ColumnId) -> RepoResult<Option<BoardId>> {
    let board_uuid: Option<String> = conn
        .query_row(
            "SELECT board_uuid FROM board_columns WHERE uuid = ?1;",
            [column_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    board_uuid
        .map(|value| parse_uuid(&value, "board_columns.board_uuid"))
        .transpose()
}

fn ensure_column_on_board(
    conn: &Connection,
    column_uuid: ColumnId,
    board_uuid: BoardId,
    card_uuid: CardId,
) -> RepoResult<()> {
    match column_board(conn, column_uuid)? {
        None => Err(RepoError::ColumnNotFound(column_uuid)),
        Some(owner) if owner == board_uuid => Ok(()),
        Some(_) => Err(RepoError::CrossBoardPlacement {
            card_uuid,
            column_uuid,
        }),
    }
}

/// Loads one column's card order. Position ties fall back to uuid order.
fn load_order(conn: &Connection, column_uuid: ColumnId) -> RepoResult<OrderedColumn<CardId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM cards
         WHERE column_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([column_uuid.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "cards.uuid")?);
    }
    Ok(OrderedColumn::from_ordered(column_uuid, ids))
}

/// Writes the full position sequence of one column.
fn write_order(conn: &Connection, order: &OrderedColumn<CardId>) -> RepoResult<()> {
    let column_uuid = order.scope().to_string();
    let mut stmt = conn.prepare(
        "UPDATE cards
         SET column_uuid = ?2,
             position = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1
           AND (column_uuid IS NOT ?2 OR position IS NOT ?3);",
    )?;
    for (card_uuid, position) in order.positions() {
        stmt.execute(params![
            card_uuid.to_string(),
            column_uuid.as_str(),
            i64::from(position)
        ])?;
    }
    Ok(())
}

fn detach_card(conn: &Connection, card_uuid: CardId) -> RepoResult<()> {
    conn.execute(
        "UPDATE cards
         SET column_uuid = NULL,
             position = NULL,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        [card_uuid.to_string()],
    )?;
    Ok(())
}

/// Detaches a placed card and renumbers the column it leaves.
fn close_gap(conn: &Connection, card_uuid: CardId) -> RepoResult<()> {
    let card = load_required_card(conn, card_uuid)?;
    let column_uuid = card
        .column_uuid
        .ok_or(RepoError::CardUnplaced(card_uuid))?;

    let mut order = load_order(conn, column_uuid)?;
    order
        .remove(card_uuid)
        .map_err(|_| RepoError::CardUnplaced(card_uuid))?;
    detach_card(conn, card_uuid)?;
    write_order(conn, &order)
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let uuid: String = row.get("uuid")?;
    let board_uuid: String = row.get("board_uuid")?;
    let column_uuid = row
        .get::<_, Option<String>>("column_uuid")?
        .map(|value| parse_uuid(&value, "cards.column_uuid"))
        .transpose()?;
    let position = row
        .get::<_, Option<i64>>("position")?
        .map(|value| parse_position(value, "cards.position"))
        .transpose()?;
    if column_uuid.is_some() != position.is_some() {
        return Err(RepoError::InvalidData(format!(
            "card {uuid} has column and position out of sync"
        )));
    }

    Ok(Card {
        uuid: parse_uuid(&uuid, "cards.uuid")?,
        board_uuid: parse_uuid(&board_uuid, "cards.board_uuid")?,
        column_uuid,
        position,
        name: row.get("name")?,
        issue_no: row.get("issue_no")?,
        url: row.get("url")?,
        color: CardColor::from_stored(row.get::<_, Option<String>>("color")?.as_deref()),
        notes: row.get("notes")?,
        tags: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
