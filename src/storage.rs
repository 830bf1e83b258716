use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Fixed allow-list for event images. Anything else is refused before any
/// bytes touch disk.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Returns the lowercased extension when the filename is acceptable.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, filename: &str, body: Bytes) -> anyhow::Result<()>;
    async fn remove(&self, filename: &str) -> anyhow::Result<()>;
}

/// Stores uploads under a single configured directory.
#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn resolve(&self, filename: &str) -> anyhow::Result<PathBuf> {
        // Stored names are generated server-side, but refuse traversal anyway.
        anyhow::ensure!(
            !filename.contains('/') && !filename.contains('\\') && !filename.contains(".."),
            "invalid filename {filename:?}"
        );
        Ok(self.root.join(filename))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.resolve(filename)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn remove(&self, filename: &str) -> anyhow::Result<()> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_accepts_known_image_extensions() {
        assert_eq!(allowed_extension("banner.PNG").as_deref(), Some("png"));
        assert_eq!(allowed_extension("photo.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("pic.jpg").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("anim.gif").as_deref(), Some("gif"));
    }

    #[test]
    fn allow_list_rejects_everything_else() {
        assert!(allowed_extension("script.exe").is_none());
        assert!(allowed_extension("page.html").is_none());
        assert!(allowed_extension("noextension").is_none());
        assert!(allowed_extension("archive.tar.xz").is_none());
    }

    #[tokio::test]
    async fn resolve_refuses_path_traversal() {
        let store = LocalImageStore::new(std::env::temp_dir().join("crowdconnect-test-uploads"))
            .await
            .expect("store should init");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("a/b.png").is_err());
        assert!(store.resolve("banner.png").is_ok());
    }
}
