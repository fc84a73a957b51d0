use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{Result, SorterError};
use crate::state::data::{Destination, SessionState};

/// The Library manages the SQLite catalog database.
/// It stores the saved destination list and one resumable session per
/// source folder.
pub struct Library {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Library {
    /// Open the catalog in the user's data directory:
    /// - Linux: ~/.local/share/media-sorter/media_sorter.db
    /// - macOS: ~/Library/Application Support/media-sorter/media_sorter.db
    /// - Windows: %APPDATA%\media-sorter\media_sorter.db
    pub fn new() -> Result<Self> {
        Self::open(&Self::default_db_path()?)
    }

    /// Open (or create) a catalog at an explicit path.
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        info!("📁 Catalog opened at: {}", db_path.display());

        let library = Library {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Catalog path under an explicit data directory
    pub fn db_path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("media-sorter").join("media_sorter.db")
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| SorterError::Io("Could not determine user data directory".to_string()))?;
        Ok(Self::db_path_in(&data_dir))
    }

    /// Create all tables if they don't exist.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        // Destinations keep their on-screen order through `position`
        conn.execute(
            "CREATE TABLE IF NOT EXISTS destinations (
                position        INTEGER PRIMARY KEY,
                name            TEXT NOT NULL,
                key             TEXT NOT NULL UNIQUE,
                path            TEXT NOT NULL
            )",
            [],
        )?;

        // One session per source folder, stored as JSON
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                source_path     TEXT PRIMARY KEY,
                state_json      TEXT NOT NULL,
                last_saved      INTEGER NOT NULL
            )",
            [],
        )?;

        debug!("✅ Catalog schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// All saved destinations in display order
    pub fn destinations(&self) -> Result<Vec<Destination>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name, key, path FROM destinations ORDER BY position")?;

        let rows = stmt.query_map([], |row| {
            let key: String = row.get(1)?;
            let key = key.chars().next().ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    "empty destination key".into(),
                )
            })?;
            Ok(Destination {
                name: row.get(0)?,
                key,
                path: row.get(2)?,
            })
        })?;

        let mut destinations = Vec::new();
        for destination in rows {
            destinations.push(destination?);
        }
        Ok(destinations)
    }

    /// Overwrite the saved destination list with `destinations`.
    pub fn replace_destinations(&self, destinations: &[Destination]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM destinations", [])?;
        for (position, destination) in destinations.iter().enumerate() {
            tx.execute(
                "INSERT INTO destinations (position, name, key, path) VALUES (?1, ?2, ?3, ?4)",
                params![
                    position as i64,
                    &destination.name,
                    destination.key.to_string(),
                    &destination.path,
                ],
            )?;
        }
        tx.commit()?;

        debug!("💾 Saved {} destinations", destinations.len());
        Ok(())
    }

    /// The stored session for `source_path`, if any
    pub fn session(&self, source_path: &str) -> Result<Option<SessionState>> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT state_json FROM sessions WHERE source_path = ?1",
                params![source_path],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace the session for its source folder.
    pub fn save_session(&self, session: &SessionState) -> Result<()> {
        let json = serde_json::to_string(session)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO sessions (source_path, state_json, last_saved) VALUES (?1, ?2, ?3)",
            params![&session.source_path, json, session.last_saved],
        )?;
        Ok(())
    }

    /// Remove the session for `source_path`. Missing sessions are not an error.
    pub fn delete_session(&self, source_path: &str) -> Result<()> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE source_path = ?1",
            params![source_path],
        )?;
        debug!("🗑️  Deleted {} session rows for {}", removed, source_path);
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SorterError::Database("catalog connection lock poisoned".to_string()))
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library() -> (TempDir, Library) {
        let dir = TempDir::new().unwrap();
        let library = Library::open(&Library::db_path_in(dir.path())).unwrap();
        (dir, library)
    }

    fn dest(name: &str, key: char) -> Destination {
        Destination {
            name: name.to_string(),
            key,
            path: format!("/sorted/{}", name.to_lowercase()),
        }
    }

    #[test]
    fn test_empty_catalog() {
        let (_dir, library) = library();
        assert!(library.destinations().unwrap().is_empty());
        assert!(library.session("/in").unwrap().is_none());
    }

    #[test]
    fn test_replace_destinations_keeps_order_and_overwrites() {
        let (_dir, library) = library();

        library
            .replace_destinations(&[dest("Work", 'w'), dest("Family", 'f')])
            .unwrap();
        assert_eq!(
            library.destinations().unwrap(),
            vec![dest("Work", 'w'), dest("Family", 'f')]
        );

        library.replace_destinations(&[dest("Pets", 'p')]).unwrap();
        assert_eq!(library.destinations().unwrap(), vec![dest("Pets", 'p')]);

        // Idempotent
        library.replace_destinations(&[dest("Pets", 'p')]).unwrap();
        assert_eq!(library.destinations().unwrap().len(), 1);
    }

    #[test]
    fn test_session_save_load_delete() {
        let (_dir, library) = library();

        let mut session = SessionState {
            source_path: "/in".to_string(),
            destinations: vec![dest("Family", 'f')],
            current_index: 4,
            last_saved: 42,
            ..SessionState::default()
        };
        session
            .classifications
            .insert("/in/a.jpg".to_string(), "Family".to_string());

        library.save_session(&session).unwrap();
        assert_eq!(library.session("/in").unwrap(), Some(session.clone()));

        session.current_index = 5;
        library.save_session(&session).unwrap();
        assert_eq!(library.session("/in").unwrap().unwrap().current_index, 5);

        library.delete_session("/in").unwrap();
        assert!(library.session("/in").unwrap().is_none());

        // Deleting again is fine
        library.delete_session("/in").unwrap();
    }

    #[test]
    fn test_catalog_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = Library::db_path_in(dir.path());

        Library::open(&path)
            .unwrap()
            .replace_destinations(&[dest("Family", 'f')])
            .unwrap();

        let reopened = Library::open(&path).unwrap();
        assert_eq!(reopened.destinations().unwrap(), vec![dest("Family", 'f')]);
        assert_eq!(reopened.path(), &path);
    }
}
