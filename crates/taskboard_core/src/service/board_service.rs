//! Board and column use-case service.

use crate::model::card::{normalize_display_name, Board, BoardId, Column, ColumnId};
use crate::repo::board_repo::BoardRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from board service operations.
#[derive(Debug)]
pub enum BoardServiceError {
    /// Display name is blank after trim.
    InvalidDisplayName,
    BoardNotFound(BoardId),
    ColumnNotFound(ColumnId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDisplayName => write!(f, "display name must not be blank"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BoardServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::BoardNotFound(id) => Self::BoardNotFound(id),
            RepoError::ColumnNotFound(id) => Self::ColumnNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Board/column service facade.
pub struct BoardService<R: BoardRepository> {
    repo: R,
}

impl<R: BoardRepository> BoardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_board(&self, name: &str) -> Result<Board, BoardServiceError> {
        let name = normalize_display_name(name).map_err(|_| BoardServiceError::InvalidDisplayName)?;
        let board = self.repo.create_board(&name)?;
        info!(
            "event=board_create module=board status=ok board_uuid={}",
            board.uuid
        );
        Ok(board)
    }

    pub fn get_board(&self, board_uuid: BoardId) -> Result<Board, BoardServiceError> {
        self.repo
            .get_board(board_uuid)?
            .ok_or(BoardServiceError::BoardNotFound(board_uuid))
    }

    /// Appends a column to the board.
    pub fn create_column(
        &self,
        board_uuid: BoardId,
        name: &str,
    ) -> Result<Column, BoardServiceError> {
        let name = normalize_display_name(name).map_err(|_| BoardServiceError::InvalidDisplayName)?;
        let column = self.repo.create_column(board_uuid, &name)?;
        info!(
            "event=column_create module=board status=ok board_uuid={} column_uuid={} position={}",
            board_uuid, column.uuid, column.position
        );
        Ok(column)
    }

    pub fn get_column(&self, column_uuid: ColumnId) -> Result<Column, BoardServiceError> {
        self.repo
            .get_column(column_uuid)?
            .ok_or(BoardServiceError::ColumnNotFound(column_uuid))
    }

    /// Columns of a board in creation order.
    pub fn list_columns(&self, board_uuid: BoardId) -> Result<Vec<Column>, BoardServiceError> {
        self.get_board(board_uuid)?;
        Ok(self.repo.list_columns(board_uuid)?)
    }
}
