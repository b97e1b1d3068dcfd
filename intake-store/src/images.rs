//! Disease image CRUD: metadata rows in SQLite, bytes in the media
//! store, and a change feed consumers use to refetch the list.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use intake_core::{DiseaseImage, UploadPolicy};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::media::{extension_of, object_path_from_url, MediaStore, IMAGE_BUCKET};
use crate::StoreError;

/// Change notification emitted after every successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageChange {
    Inserted,
    Updated,
    Deleted,
}

/// Fan-out of image mutations. Subscribers refetch the full list on any
/// event; no incremental payload is carried.
#[derive(Default)]
pub struct ChangeFeed {
    senders: Mutex<Vec<Sender<ImageChange>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ImageChange> {
        let (tx, rx) = channel();
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.push(tx);
        rx
    }

    fn publish(&self, change: ImageChange) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.retain(|sender| sender.send(change).is_ok());
    }
}

/// An upload request before any storage work has happened.
pub struct NewImage<'a> {
    pub bytes: &'a [u8],
    pub original_name: &'a str,
    pub mime: &'a str,
    pub title: String,
    pub description: Option<String>,
}

/// Validate, store the object, then insert the metadata row.
///
/// The policy check runs before any storage or database work. The
/// display order is read in the same transaction as the insert, so two
/// sequential uploads get 0 then 1. A stored object whose metadata
/// insert fails is left behind and logged; there is no rollback.
pub fn upload_image(
    conn: &mut Connection,
    media: &MediaStore,
    feed: &ChangeFeed,
    policy: &UploadPolicy,
    upload: NewImage<'_>,
) -> Result<DiseaseImage, StoreError> {
    policy.check(upload.mime, upload.bytes.len() as u64)?;

    let now = Utc::now();
    let ext = extension_of(upload.original_name).unwrap_or("bin");
    let mut stamp = now.timestamp_millis();
    let mut object_path = format!("{IMAGE_BUCKET}/{stamp}.{ext}");
    while media.exists(&object_path) {
        stamp += 1;
        object_path = format!("{IMAGE_BUCKET}/{stamp}.{ext}");
    }

    let image_url = media.store(&object_path, upload.bytes)?;

    let insert = || -> Result<DiseaseImage, StoreError> {
        let tx = conn.transaction()?;
        let display_order: u32 =
            tx.query_row("SELECT COUNT(*) FROM disease_images", [], |row| row.get(0))?;

        let image = DiseaseImage {
            id: Uuid::new_v4().to_string(),
            title: upload.title,
            description: upload.description,
            image_url,
            display_order,
            created_at: now,
            updated_at: now,
        };

        tx.execute(
            "INSERT INTO disease_images (id, title, description, image_url, display_order,
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                image.id,
                image.title,
                image.description,
                image.image_url,
                image.display_order,
                image.created_at.to_rfc3339(),
                image.updated_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(image)
    };

    match insert() {
        Ok(image) => {
            tracing::info!(id = %image.id, object = %object_path, "image uploaded");
            feed.publish(ImageChange::Inserted);
            Ok(image)
        }
        Err(e) => {
            tracing::warn!(object = %object_path, "metadata insert failed, object orphaned");
            Err(e)
        }
    }
}

/// All images, display order ascending.
pub fn list_images(conn: &Connection) -> Result<Vec<DiseaseImage>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, image_url, display_order, created_at, updated_at
         FROM disease_images ORDER BY display_order ASC, created_at ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut images = Vec::new();
    for row in rows {
        let (id, title, description, image_url, display_order, created_at, updated_at) = row?;
        images.push(DiseaseImage {
            id,
            title,
            description,
            image_url,
            display_order,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        });
    }
    Ok(images)
}

/// Metadata-only patch: title and description.
pub fn update_image(
    conn: &Connection,
    feed: &ChangeFeed,
    id: &str,
    title: &str,
    description: Option<&str>,
) -> Result<(), StoreError> {
    let affected = conn.execute(
        "UPDATE disease_images SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![title, description, Utc::now().to_rfc3339(), id],
    )?;
    if affected > 0 {
        feed.publish(ImageChange::Updated);
    }
    Ok(())
}

/// Remove the stored object (path derived from the public URL) and the
/// metadata row. A missing object is logged and the row still removed.
pub fn delete_image(
    conn: &Connection,
    media: &MediaStore,
    feed: &ChangeFeed,
    id: &str,
    image_url: &str,
) -> Result<(), StoreError> {
    match object_path_from_url(image_url) {
        Some(object_path) => {
            if let Err(e) = media.remove(&object_path) {
                tracing::warn!(object = %object_path, error = %e, "object removal failed");
            }
        }
        None => tracing::warn!(url = image_url, "could not derive object path"),
    }

    let affected = conn.execute("DELETE FROM disease_images WHERE id = ?1", params![id])?;
    if affected > 0 {
        tracing::info!(id, "image deleted");
        feed.publish(ImageChange::Deleted);
    }
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Connection, MediaStore, tempfile::TempDir) {
        let conn = crate::open_in_memory().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let media = MediaStore::new(tmp.path(), "https://media.test");
        (conn, media, tmp)
    }

    fn png_upload<'a>(title: &str) -> NewImage<'a> {
        NewImage {
            bytes: b"png-bytes",
            original_name: "scan.png",
            mime: "image/png",
            title: title.to_string(),
            description: None,
        }
    }

    #[test]
    fn sequential_uploads_get_display_order_zero_then_one() {
        let (mut conn, media, _tmp) = setup();
        let feed = ChangeFeed::new();
        let policy = UploadPolicy::default();

        let first = upload_image(&mut conn, &media, &feed, &policy, png_upload("First")).unwrap();
        let second = upload_image(&mut conn, &media, &feed, &policy, png_upload("Second")).unwrap();

        assert_eq!(first.display_order, 0);
        assert_eq!(second.display_order, 1);

        let listed = list_images(&conn).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "First");
        assert_eq!(listed[1].title, "Second");
    }

    #[test]
    fn rejected_upload_touches_neither_storage_nor_database() {
        let (mut conn, media, tmp) = setup();
        let feed = ChangeFeed::new();
        let policy = UploadPolicy::default();

        let oversize = vec![0u8; 6 * 1024 * 1024];
        let result = upload_image(
            &mut conn,
            &media,
            &feed,
            &policy,
            NewImage {
                bytes: &oversize,
                original_name: "big.png",
                mime: "image/png",
                title: "Too big".to_string(),
                description: None,
            },
        );
        assert!(result.is_err());

        let result = upload_image(
            &mut conn,
            &media,
            &feed,
            &policy,
            NewImage {
                bytes: b"%PDF",
                original_name: "doc.pdf",
                mime: "application/pdf",
                title: "Wrong type".to_string(),
                description: None,
            },
        );
        assert!(result.is_err());

        assert!(list_images(&conn).unwrap().is_empty());
        // The bucket directory was never created.
        assert!(!tmp.path().join(IMAGE_BUCKET).exists());
    }

    #[test]
    fn delete_removes_both_row_and_object() {
        let (mut conn, media, _tmp) = setup();
        let feed = ChangeFeed::new();
        let policy = UploadPolicy::default();

        let image = upload_image(&mut conn, &media, &feed, &policy, png_upload("Gone")).unwrap();
        let object_path = object_path_from_url(&image.image_url).unwrap();
        assert!(media.exists(&object_path));

        delete_image(&conn, &media, &feed, &image.id, &image.image_url).unwrap();

        assert!(!media.exists(&object_path));
        assert!(list_images(&conn).unwrap().is_empty());
    }

    #[test]
    fn feed_reports_every_mutation() {
        let (mut conn, media, _tmp) = setup();
        let feed = ChangeFeed::new();
        let policy = UploadPolicy::default();
        let rx = feed.subscribe();

        let image = upload_image(&mut conn, &media, &feed, &policy, png_upload("Watched")).unwrap();
        update_image(&conn, &feed, &image.id, "Renamed", Some("desc")).unwrap();
        delete_image(&conn, &media, &feed, &image.id, &image.image_url).unwrap();

        assert_eq!(rx.try_recv(), Ok(ImageChange::Inserted));
        assert_eq!(rx.try_recv(), Ok(ImageChange::Updated));
        assert_eq!(rx.try_recv(), Ok(ImageChange::Deleted));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn updating_an_unknown_image_emits_nothing() {
        let (conn, _media, _tmp) = setup();
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();

        update_image(&conn, &feed, "missing", "Title", None).unwrap();
        assert!(rx.try_recv().is_err());
    }
}
