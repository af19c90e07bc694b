//! Board repository contract and implementations.
//!
//! # Responsibility
//! - Persist and reload whole board snapshots.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save_board` replaces the stored board atomically; a failed save
//!   leaves the previous board intact.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Lane order is stored as `sort_order` and read back unchanged.

use crate::db::DbError;
use crate::model::board::BoardState;
use crate::model::category::{Category, CategoryValidationError};
use crate::model::note::{LinkData, Note};
use crate::ordering::OrderingError;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const REVISION_KEY: &str = "revision";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for board storage.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    /// Backend refused the write for a non-database reason.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
            Self::Unavailable(message) => write!(f, "board storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<OrderingError> for RepoError {
    fn from(value: OrderingError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

impl From<CategoryValidationError> for RepoError {
    fn from(value: CategoryValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Storage backend for board snapshots.
pub trait BoardRepository {
    /// Returns the stored board, or `None` when nothing was saved yet.
    fn load_board(&self) -> RepoResult<Option<BoardState>>;
    fn save_board(&self, state: &BoardState) -> RepoResult<()>;
}

/// Process-local repository for tests and ephemeral boards.
#[derive(Debug, Default)]
pub struct InMemoryBoardRepository {
    stored: RefCell<Option<BoardState>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl InMemoryBoardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Last stored board.
    pub fn stored(&self) -> Option<BoardState> {
        self.stored.borrow().clone()
    }

    /// Makes subsequent saves fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl BoardRepository for InMemoryBoardRepository {
    fn load_board(&self) -> RepoResult<Option<BoardState>> {
        Ok(self.stored.borrow().clone())
    }

    fn save_board(&self, state: &BoardState) -> RepoResult<()> {
        if self.fail_saves.get() {
            return Err(RepoError::Unavailable("saves disabled".to_string()));
        }
        *self.stored.borrow_mut() = Some(state.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Wraps a connection opened through [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn load_board(&self) -> RepoResult<Option<BoardState>> {
        let categories = load_categories(self.conn)?;
        if categories.is_empty() {
            return Ok(None);
        }
        let notes = load_notes(self.conn)?;
        let revision = load_revision(self.conn)?;
        debug!(
            "event=board_load module=repo status=ok categories={} notes={} revision={}",
            categories.len(),
            notes.len(),
            revision
        );
        Ok(Some(BoardState::from_parts(revision, categories, notes)?))
    }

    fn save_board(&self, state: &BoardState) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM link_previews;
             DELETE FROM notes;
             DELETE FROM categories;",
        )?;

        for (category_order, category) in state.categories().iter().enumerate() {
            tx.execute(
                "INSERT INTO categories (uuid, title, icon, color, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    category.id.to_string(),
                    category.title.as_str(),
                    category.icon.as_str(),
                    category.color.as_str(),
                    category_order as i64,
                ],
            )?;
            for (note_order, note) in state.lane_notes(category.id).into_iter().enumerate() {
                insert_note(&tx, note, note_order)?;
            }
        }

        tx.execute(
            "INSERT INTO board_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![REVISION_KEY, state.revision() as i64],
        )?;
        tx.commit()?;

        debug!(
            "event=board_save module=repo status=ok categories={} notes={} revision={}",
            state.categories().len(),
            state.notes_len(),
            state.revision()
        );
        Ok(())
    }
}

fn insert_note(tx: &Transaction<'_>, note: &Note, sort_order: usize) -> RepoResult<()> {
    let note_uuid = note.id.to_string();
    tx.execute(
        "INSERT INTO notes (uuid, category_uuid, text, created_at, pinned, archived, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            note_uuid.as_str(),
            note.category_id.to_string(),
            note.text.as_str(),
            note.created_at,
            bool_to_int(note.pinned),
            bool_to_int(note.archived),
            sort_order as i64,
        ],
    )?;

    if let Some(link) = &note.link_data {
        tx.execute(
            "INSERT INTO link_previews (note_uuid, url, title, description, image, site_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note_uuid.as_str(),
                link.url.as_str(),
                link.title.as_str(),
                link.description.as_str(),
                link.image.as_deref(),
                link.site_name.as_str(),
            ],
        )?;
    }
    Ok(())
}

fn load_categories(conn: &Connection) -> RepoResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title, icon, color
         FROM categories
         ORDER BY sort_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut categories = Vec::new();
    while let Some(row) = rows.next()? {
        let id = parse_uuid(row.get::<_, String>(0)?.as_str(), "categories.uuid")?;
        categories.push(Category::try_with_id(
            id,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        )?);
    }
    Ok(categories)
}

fn load_notes(conn: &Connection) -> RepoResult<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT
            n.uuid,
            n.category_uuid,
            n.text,
            n.created_at,
            n.pinned,
            n.archived,
            lp.url,
            lp.title,
            lp.description,
            lp.image,
            lp.site_name
         FROM notes n
         LEFT JOIN link_previews lp ON lp.note_uuid = n.uuid
         ORDER BY n.category_uuid ASC, n.sort_order ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_note_row(row)?);
    }
    Ok(notes)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id = parse_uuid(row.get::<_, String>(0)?.as_str(), "notes.uuid")?;
    let category_id = parse_uuid(row.get::<_, String>(1)?.as_str(), "notes.category_uuid")?;
    let mut note = Note::with_id(id, category_id, row.get::<_, String>(2)?, row.get(3)?);
    note.pinned = int_to_bool(row.get(4)?, "notes.pinned")?;
    note.archived = int_to_bool(row.get(5)?, "notes.archived")?;

    if let Some(url) = row.get::<_, Option<String>>(6)? {
        note.link_data = Some(LinkData {
            url,
            title: row.get(7)?,
            description: row.get(8)?,
            image: row.get(9)?,
            site_name: row.get(10)?,
        });
    }
    Ok(note)
}

fn load_revision(conn: &Connection) -> RepoResult<u64> {
    let value: Option<i64> = conn
        .query_row(
            "SELECT value FROM board_meta WHERE key = ?1;",
            [REVISION_KEY],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        None => Ok(0),
        Some(value) => u64::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid revision value `{value}` in board_meta"))
        }),
    }
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardRepository, InMemoryBoardRepository, RepoError, SqliteBoardRepository};
    use crate::db::open_db_in_memory;
    use crate::model::board::BoardState;
    use crate::model::category::Category;
    use crate::model::note::{LinkData, Note};

    fn sample_board() -> BoardState {
        let inbox = Category::try_new("Inbox", "📥", "slate").expect("inbox");
        let later = Category::try_new("Later", "⏳", "amber").expect("later");
        let mut first = Note::new(inbox.id, "first");
        first.pinned = true;
        let mut second = Note::new(inbox.id, "see https://example.com");
        second.link_data = Some(LinkData {
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
            description: "Example domain".to_string(),
            image: None,
            site_name: "example.com".to_string(),
        });
        let mut third = Note::new(later.id, "third");
        third.archived = true;
        BoardState::from_parts(3, vec![inbox, later], vec![first, second, third])
            .expect("sample board")
    }

    #[test]
    fn in_memory_repository_counts_saves_and_can_fail() {
        let repo = InMemoryBoardRepository::new();
        assert!(repo.load_board().expect("load").is_none());

        repo.save_board(&sample_board()).expect("save");
        assert_eq!(repo.save_count(), 1);

        repo.set_fail_saves(true);
        let err = repo.save_board(&BoardState::default()).expect_err("save must fail");
        assert!(matches!(err, RepoError::Unavailable(_)));
        assert_eq!(repo.save_count(), 1);
        assert_eq!(repo.stored().map(|board| board.notes_len()), Some(3));
    }

    #[test]
    fn sqlite_repository_round_trips_order_flags_and_preview() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteBoardRepository::new(&conn);
        assert!(repo.load_board().expect("empty load").is_none());

        let board = sample_board();
        repo.save_board(&board).expect("save");
        let loaded = repo.load_board().expect("load").expect("stored board");

        assert_eq!(loaded, board);
        assert!(loaded.check_consistency());
    }

    #[test]
    fn sqlite_save_replaces_previous_board() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteBoardRepository::new(&conn);
        repo.save_board(&sample_board()).expect("first save");

        let replacement = BoardState::with_categories(vec![
            Category::try_new("Only", "⭐", "gold").expect("category"),
        ]);
        repo.save_board(&replacement).expect("second save");

        let loaded = repo.load_board().expect("load").expect("stored board");
        assert_eq!(loaded.categories().len(), 1);
        assert_eq!(loaded.notes_len(), 0);
    }

    #[test]
    fn sqlite_rejects_corrupt_flags() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteBoardRepository::new(&conn);
        repo.save_board(&sample_board()).expect("save");
        conn.execute_batch("PRAGMA ignore_check_constraints = ON; UPDATE notes SET pinned = 7;")
            .expect("corrupt rows");

        let err = repo.load_board().expect_err("corrupt flag must fail");
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
