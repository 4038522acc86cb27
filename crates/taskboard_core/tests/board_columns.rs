use taskboard_core::db::open_db_in_memory;
use taskboard_core::{BoardService, BoardServiceError, SqliteBoardRepository};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn columns_are_appended_in_creation_order() {
    let conn = setup();
    let service = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    let board = service.create_board("  Sprint 12 ").unwrap();
    assert_eq!(board.name, "Sprint 12");

    let todo = service.create_column(board.uuid, "Todo").unwrap();
    let doing = service.create_column(board.uuid, "Doing").unwrap();
    let done = service.create_column(board.uuid, "Done").unwrap();

    let columns = service.list_columns(board.uuid).unwrap();
    let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Todo", "Doing", "Done"]);
    assert_eq!(
        columns.iter().map(|c| c.position).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(service.get_column(doing.uuid).unwrap().board_uuid, board.uuid);
    assert_ne!(todo.uuid, done.uuid);
}

#[test]
fn blank_names_are_rejected() {
    let conn = setup();
    let service = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create_board("   "),
        Err(BoardServiceError::InvalidDisplayName)
    ));

    let board = service.create_board("Board").unwrap();
    assert!(matches!(
        service.create_column(board.uuid, ""),
        Err(BoardServiceError::InvalidDisplayName)
    ));
}

#[test]
fn unknown_board_and_column_are_not_found() {
    let conn = setup();
    let service = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.get_board(missing),
        Err(BoardServiceError::BoardNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.create_column(missing, "Todo"),
        Err(BoardServiceError::BoardNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.list_columns(missing),
        Err(BoardServiceError::BoardNotFound(_))
    ));
    assert!(matches!(
        service.get_column(missing),
        Err(BoardServiceError::ColumnNotFound(_))
    ));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(SqliteBoardRepository::try_new(&conn).is_err());
}
