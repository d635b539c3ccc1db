//! File-backed checkpoint store.
//!
//! Each session is one `<session_id>.json` file under the configured data
//! directory. Commits write a uniquely-named `.tmp` sibling, sync it, then
//! rename it into place, so a crash mid-write leaves the previous committed
//! state intact. An in-memory write-through cache keeps reads off disk
//! after the first load.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use std::sync::Arc;

use tt_domain::error::{Error, Result};
use tt_domain::tool::Message;

use crate::state::SessionState;
use crate::store::CheckpointStore;

pub struct FileCheckpointStore {
    base_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl FileCheckpointStore {
    /// Open (and create if needed) the checkpoint directory.
    pub fn new(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir).map_err(Error::Io)?;
        tracing::info!(path = %base_dir.display(), "checkpoint store opened");
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.base_dir.join(format!("{session_id}.json")))
    }
}

/// Session IDs become file names, so anything outside
/// alphanumerics, `-` and `_` is rejected before touching the filesystem.
fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() || session_id.len() > 128 {
        return Err(Error::InvalidInput(format!(
            "session id length out of range: {}",
            session_id.len()
        )));
    }
    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidInput(format!(
            "session id contains forbidden characters: {session_id:?}"
        )));
    }
    Ok(())
}

fn read_state_file(path: &Path) -> Result<Option<SessionState>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    let state: SessionState = serde_json::from_str(&raw)
        .map_err(|e| Error::Checkpoint(format!("{}: {e}", path.display())))?;
    Ok(Some(state))
}

/// Write to a uniquely-named `.tmp` sibling, sync, rename into place.
fn write_state_file(path: &Path, state: &SessionState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        uuid::Uuid::new_v4().as_simple()
    );
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = std::fs::File::create(&tmp_path).map_err(Error::Io)?;
    file.write_all(json.as_bytes()).map_err(Error::Io)?;
    file.sync_data().map_err(Error::Io)?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        Error::Io(e)
    })
}

#[async_trait::async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        // Fast path: return from cache.
        {
            let cache = self.cache.read();
            if let Some(state) = cache.get(session_id) {
                return Ok(Some(state.clone()));
            }
        }

        // Slow path: load from disk on a blocking thread.
        let path = self.session_path(session_id)?;
        let state = tokio::task::spawn_blocking(move || read_state_file(&path))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        if let Some(ref s) = state {
            let mut cache = self.cache.write();
            cache.insert(session_id.to_owned(), s.clone());
        }
        Ok(state)
    }

    async fn append_and_commit(
        &self,
        session_id: &str,
        new_messages: Vec<Message>,
        route: Option<String>,
    ) -> Result<SessionState> {
        let mut state = self
            .load(session_id)
            .await?
            .unwrap_or_else(|| SessionState::new(session_id));

        state.messages.extend(new_messages);
        state.step += 1;
        if route.is_some() {
            state.route = route;
        }

        // Persist first; only update the cache when the commit succeeded.
        let path = self.session_path(session_id)?;
        let to_write = state.clone();
        tokio::task::spawn_blocking(move || write_state_file(&path, &to_write))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        {
            let mut cache = self.cache.write();
            cache.insert(session_id.to_owned(), state.clone());
        }

        tracing::debug!(
            session_id,
            step = state.step,
            messages = state.messages.len(),
            "checkpoint committed"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_domain::tool::Message;

    #[tokio::test]
    async fn load_missing_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        assert!(store.load("s-none").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_survives_a_fresh_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileCheckpointStore::new(dir.path()).unwrap();
            store
                .append_and_commit(
                    "s1",
                    vec![Message::user("Hello"), Message::assistant("Hi")],
                    Some("general".into()),
                )
                .await
                .unwrap();
        }
        // New instance, cold cache: state must come back from disk.
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        let state = store.load("s1").await.unwrap().unwrap();
        assert_eq!(state.step, 1);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.route.as_deref(), Some("general"));
    }

    #[tokio::test]
    async fn steps_increase_monotonically() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        let s1 = store
            .append_and_commit("s1", vec![Message::user("a")], None)
            .await
            .unwrap();
        let s2 = store
            .append_and_commit("s1", vec![Message::user("b")], None)
            .await
            .unwrap();
        assert_eq!(s1.step, 1);
        assert_eq!(s2.step, 2);
        assert_eq!(s2.messages.len(), 2);
    }

    #[tokio::test]
    async fn hostile_session_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        for bad in ["../escape", "a/b", "", "x y", "a.b"] {
            let err = store.load(bad).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_a_fresh_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s1.json"), "{not json").unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        let err = store.load("s1").await.unwrap_err();
        assert!(matches!(err, Error::Checkpoint(_)));
    }

    #[tokio::test]
    async fn distinct_sessions_do_not_interfere() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        store
            .append_and_commit("a", vec![Message::user("for a")], None)
            .await
            .unwrap();
        store
            .append_and_commit("b", vec![Message::user("for b")], None)
            .await
            .unwrap();
        let a = store.load("a").await.unwrap().unwrap();
        let b = store.load("b").await.unwrap().unwrap();
        assert_eq!(a.messages[0].content, "for a");
        assert_eq!(b.messages[0].content, "for b");
    }
}
