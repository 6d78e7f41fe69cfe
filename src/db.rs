use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{NewUser, TodoItem, TodoItemRequest, User};

#[derive(Debug, Display, Error)]
pub enum StoreError {
    #[display("duplicate {field}")]
    Conflict { field: &'static str },

    #[display("storage backend error: {message}")]
    Backend { message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref e, ref msg) = err {
            if e.code == ErrorCode::ConstraintViolation {
                let msg = msg.as_deref().unwrap_or_default();
                if msg.contains("users.email") {
                    return StoreError::Conflict { field: "email" };
                }
                if msg.contains("users.username") {
                    return StoreError::Conflict { field: "username" };
                }
            }
        }
        StoreError::Backend {
            message: err.to_string(),
        }
    }
}

/// Persists user credentials. Uniqueness of email and username is the
/// store's job.
pub trait CredentialStore: Send + Sync {
    fn insert_user(&self, user: &NewUser) -> Result<i64, StoreError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
}

/// Persists owner-scoped todo items. Ownership checks happen in the
/// caller; the store only filters by owner when asked to.
pub trait ResourceStore: Send + Sync {
    fn create_todo(&self, owner_id: i64, req: &TodoItemRequest) -> Result<TodoItem, StoreError>;
    fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoItem>, StoreError>;
    fn get_todo(&self, id: &str) -> Result<Option<TodoItem>, StoreError>;
    fn update_todo(&self, id: &str, req: &TodoItemRequest)
        -> Result<Option<TodoItem>, StoreError>;
    fn delete_todo(&self, id: &str) -> Result<bool, StoreError>;
}

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS todos (
        id TEXT PRIMARY KEY,
        owner_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        due_date TEXT,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_todos_owner ON todos(owner_id);
";

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";
const TODO_COLUMNS: &str = "id, owner_id, title, description, due_date, status, created_at";

/// SQLite-backed implementation of both stores.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Backend {
            message: "database mutex poisoned".to_string(),
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<TodoItem> {
    Ok(TodoItem {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl CredentialStore for Database {
    fn insert_user(&self, user: &NewUser) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let created_at: DateTime<Utc> = Utc::now();
        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.username, user.email, user.password_hash, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}

impl ResourceStore for Database {
    fn create_todo(&self, owner_id: i64, req: &TodoItemRequest) -> Result<TodoItem, StoreError> {
        let item = TodoItem {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title: req.title.clone(),
            description: req.description.clone(),
            due_date: req.due_date.clone(),
            status: req.status.clone(),
            created_at: Utc::now(),
        };
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO todos ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                TODO_COLUMNS
            ),
            params![
                item.id,
                item.owner_id,
                item.title,
                item.description,
                item.due_date,
                item.status,
                item.created_at
            ],
        )?;
        Ok(item)
    }

    fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TodoItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM todos WHERE owner_id = ?1 ORDER BY created_at, id",
            TODO_COLUMNS
        ))?;
        let todos = stmt
            .query_map(params![owner_id], todo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(todos)
    }

    fn get_todo(&self, id: &str) -> Result<Option<TodoItem>, StoreError> {
        let conn = self.lock()?;
        let todo = conn
            .query_row(
                &format!("SELECT {} FROM todos WHERE id = ?1", TODO_COLUMNS),
                params![id],
                todo_from_row,
            )
            .optional()?;
        Ok(todo)
    }

    fn update_todo(
        &self,
        id: &str,
        req: &TodoItemRequest,
    ) -> Result<Option<TodoItem>, StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE todos SET title = ?1, description = ?2, due_date = ?3, status = ?4 WHERE id = ?5",
            params![req.title, req.description, req.due_date, req.status, id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        let todo = conn
            .query_row(
                &format!("SELECT {} FROM todos WHERE id = ?1", TODO_COLUMNS),
                params![id],
                todo_from_row,
            )
            .optional()?;
        Ok(todo)
    }

    fn delete_todo(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
