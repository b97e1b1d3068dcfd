//! Filesystem object store standing in for the managed storage bucket.

use std::fs;
use std::path::{Path, PathBuf};

use crate::StoreError;

/// Bucket directory holding uploaded educational images.
pub const IMAGE_BUCKET: &str = "disease-images";

/// Root directory plus the base URL objects are served under.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            base_url,
        }
    }

    /// Write an object and return its public URL.
    pub fn store(&self, object_path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let full = self.root.join(object_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, bytes)?;
        tracing::info!(object = object_path, size = bytes.len(), "object stored");
        Ok(self.public_url(object_path))
    }

    pub fn remove(&self, object_path: &str) -> Result<(), StoreError> {
        fs::remove_file(self.root.join(object_path))?;
        tracing::info!(object = object_path, "object removed");
        Ok(())
    }

    pub fn exists(&self, object_path: &str) -> bool {
        self.root.join(object_path).exists()
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{}", self.base_url, object_path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Derive the bucket-relative object path from a public URL: the last
/// two `/` segments, `bucket/file`. Returns `None` for URLs too short
/// to contain both.
pub fn object_path_from_url(url: &str) -> Option<String> {
    let mut segments = url.rsplit('/');
    let file = segments.next().filter(|s| !s.is_empty())?;
    let bucket = segments.next().filter(|s| !s.is_empty())?;
    Some(format!("{bucket}/{file}"))
}

/// File extension of the uploaded name, without the dot.
pub fn extension_of(name: &str) -> Option<&str> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_takes_the_last_two_segments() {
        let url = "https://storage.example.com/public/disease-images/17000000000.png";
        assert_eq!(
            object_path_from_url(url).as_deref(),
            Some("disease-images/17000000000.png")
        );
        assert_eq!(object_path_from_url("nothing"), None);
    }

    #[test]
    fn store_and_remove_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let media = MediaStore::new(tmp.path(), "https://media.test/");

        let url = media.store("disease-images/1.png", b"png-bytes").unwrap();
        assert_eq!(url, "https://media.test/disease-images/1.png");
        assert!(media.exists("disease-images/1.png"));

        media.remove("disease-images/1.png").unwrap();
        assert!(!media.exists("disease-images/1.png"));
    }

    #[test]
    fn extension_is_taken_from_the_original_name() {
        assert_eq!(extension_of("photo.PNG"), Some("PNG"));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of("noext"), None);
    }
}
