//! Board and column repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A column belongs to exactly one board for its whole lifetime.
//! - Column listing is deterministic: `position ASC, uuid ASC`.

use crate::model::card::{Board, BoardId, Column, ColumnId};
use crate::repo::{
    ensure_connection_ready, parse_position, parse_uuid, RepoError, RepoResult, RequiredTable,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const REQUIRED_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "boards",
        columns: &["uuid", "name", "created_at"],
    },
    RequiredTable {
        name: "board_columns",
        columns: &["uuid", "board_uuid", "name", "position"],
    },
];

/// Repository interface for boards and their columns.
pub trait BoardRepository {
    fn create_board(&self, name: &str) -> RepoResult<Board>;
    fn get_board(&self, board_uuid: BoardId) -> RepoResult<Option<Board>>;
    /// Appends a column to the end of the board.
    fn create_column(&self, board_uuid: BoardId, name: &str) -> RepoResult<Column>;
    fn get_column(&self, column_uuid: ColumnId) -> RepoResult<Option<Column>>;
    fn list_columns(&self, board_uuid: BoardId) -> RepoResult<Vec<Column>>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(&self, name: &str) -> RepoResult<Board> {
        let board_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO boards (uuid, name) VALUES (?1, ?2);",
            params![board_uuid.to_string(), name],
        )?;
        self.get_board(board_uuid)?
            .ok_or(RepoError::BoardNotFound(board_uuid))
    }

    fn get_board(&self, board_uuid: BoardId) -> RepoResult<Option<Board>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, name, created_at
                 FROM boards
                 WHERE uuid = ?1;",
                [board_uuid.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("uuid")?,
                        row.get::<_, String>("name")?,
                        row.get::<_, i64>("created_at")?,
                    ))
                },
            )
            .optional()?;

        row.map(|(uuid, name, created_at)| {
            Ok(Board {
                uuid: parse_uuid(&uuid, "boards.uuid")?,
                name,
                created_at,
            })
        })
        .transpose()
    }

    fn create_column(&self, board_uuid: BoardId, name: &str) -> RepoResult<Column> {
        let column_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let board_exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE uuid = ?1);",
            [board_uuid.to_string()],
            |row| row.get(0),
        )?;
        if board_exists != 1 {
            return Err(RepoError::BoardNotFound(board_uuid));
        }

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1
             FROM board_columns
             WHERE board_uuid = ?1;",
            [board_uuid.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO board_columns (uuid, board_uuid, name, position)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                column_uuid.to_string(),
                board_uuid.to_string(),
                name,
                position
            ],
        )?;
        tx.commit()?;

        self.get_column(column_uuid)?
            .ok_or(RepoError::ColumnNotFound(column_uuid))
    }

    fn get_column(&self, column_uuid: ColumnId) -> RepoResult<Option<Column>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, board_uuid, name, position
             FROM board_columns
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([column_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_column_row(row)?));
        }
        Ok(None)
    }

    fn list_columns(&self, board_uuid: BoardId) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, board_uuid, name, position
             FROM board_columns
             WHERE board_uuid = ?1
             ORDER BY position ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([board_uuid.to_string()])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }
}

fn parse_column_row(row: &Row<'_>) -> RepoResult<Column> {
    let uuid: String = row.get("uuid")?;
    let board_uuid: String = row.get("board_uuid")?;
    Ok(Column {
        uuid: parse_uuid(&uuid, "board_columns.uuid")?,
        board_uuid: parse_uuid(&board_uuid, "board_columns.board_uuid")?,
        name: row.get("name")?,
        position: parse_position(row.get("position")?, "board_columns.position")?,
    })
}
