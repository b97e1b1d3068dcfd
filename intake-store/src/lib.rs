//! Embedded persistence for the consultation intake flow.
//!
//! A SQLite repository plus a filesystem media store. Connections are
//! passed explicitly; every mutation is a plain SQL statement and
//! multi-step writes run inside a transaction.

mod auth;
mod consultations;
mod images;
mod media;

pub use auth::{default_credentials, login, logout, verify, Credential};
pub use consultations::{
    add_consultation, delete_consultation, get_consultation, list_consultations,
    update_consultation,
};
pub use images::{
    delete_image, list_images, update_image, upload_image, ChangeFeed, ImageChange, NewImage,
};
pub use media::{object_path_from_url, MediaStore, IMAGE_BUCKET};

use std::path::Path;

use rusqlite::Connection;

/// Errors raised by the repository and the media store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rejected(#[from] intake_core::IntakeError),
    #[error("malformed stored value: {0}")]
    Corrupt(String),
}

/// Open (or create) the database file and make sure the schema exists.
pub fn open(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database, used by tests.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS consultations (
            id                TEXT PRIMARY KEY,
            number            INTEGER,
            patient_name      TEXT NOT NULL,
            age               INTEGER NOT NULL,
            gender            TEXT NOT NULL,
            contact           TEXT NOT NULL,
            national_id       TEXT,
            condition_name    TEXT NOT NULL,
            condition_type    TEXT NOT NULL,
            body_system       TEXT NOT NULL,
            fee               INTEGER NOT NULL,
            mode              TEXT NOT NULL,
            symptoms          TEXT NOT NULL,
            onset_date        TEXT,
            medical_history   TEXT,
            submitted_at      TEXT NOT NULL,
            paid              INTEGER NOT NULL DEFAULT 0,
            notification_sent INTEGER NOT NULL DEFAULT 0,
            status            TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS counters (
            name  TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS disease_images (
            id            TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            description   TEXT,
            image_url     TEXT NOT NULL,
            display_order INTEGER NOT NULL,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS sessions (
            token     TEXT PRIMARY KEY,
            identity  TEXT NOT NULL,
            role      TEXT NOT NULL,
            issued_at TEXT NOT NULL
        );
        INSERT OR IGNORE INTO counters (name, value) VALUES ('patient_number', 0);",
    )?;
    Ok(())
}
