use rusqlite::Connection;
use todo_core::db::migrations::latest_version;
use todo_core::db::{open_db, open_db_in_memory, DbError};
use todo_core::Store;

const USER_ROW: &str = "INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
     VALUES ('u1', 'alice', 'alice@example.com', 'h', 0, 0);";

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

#[test]
fn fresh_database_is_at_latest_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    let tables = table_names(&conn);
    assert!(tables.iter().any(|name| name == "users"), "{tables:?}");
    assert!(tables.iter().any(|name| name == "todos"), "{tables:?}");
}

#[test]
fn reopening_a_file_database_keeps_its_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.db");

    drop(Store::open(&path).unwrap());
    let conn = open_db(&path).unwrap();

    assert_eq!(user_version(&conn), latest_version());
    assert!(table_names(&conn).iter().any(|name| name == "todos"));
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 42)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::UnsupportedSchemaVersion { db_version: 42, latest_supported }
                if latest_supported == latest_version()
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn schema_rejects_inconsistent_completion_and_orphans() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(USER_ROW, []).unwrap();

    let completed_without_timestamp = conn.execute(
        "INSERT INTO todos (id, owner_id, title, completed, completed_at, created_at, updated_at)
         VALUES ('t1', 'u1', 'title', 1, NULL, 0, 0);",
        [],
    );
    assert!(completed_without_timestamp.is_err());

    let orphan = conn.execute(
        "INSERT INTO todos (id, owner_id, title, completed, completed_at, created_at, updated_at)
         VALUES ('t2', 'nobody', 'title', 0, NULL, 0, 0);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn deleting_a_user_cascades_to_their_todos() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(USER_ROW, []).unwrap();
    conn.execute(
        "INSERT INTO todos (id, owner_id, title, completed, completed_at, created_at, updated_at)
         VALUES ('t1', 'u1', 'title', 0, NULL, 0, 0);",
        [],
    )
    .unwrap();

    conn.execute("DELETE FROM users WHERE id = 'u1';", []).unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM todos;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}
