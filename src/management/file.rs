use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::{Error, Result},
    management::store::{StoreKey, TokenStore},
};

/// AuthState persisted as a flat JSON object in the local data directory.
///
/// The whole map is rewritten on every change through a temp file and a
/// rename, so a crash never leaves a half-written file behind. Unknown keys
/// found on disk are ignored.
pub struct FileTokenStore {
    path: PathBuf,
    state: Mutex<BTreeMap<StoreKey, String>>,
}

impl FileTokenStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.is_file() {
            let content = async_fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Storage(format!("reading {}: {e}", path.display())))?;
            let raw: BTreeMap<String, String> = serde_json::from_str(&content)
                .map_err(|e| Error::Storage(format!("parsing {}: {e}", path.display())))?;
            raw.into_iter()
                .filter_map(|(name, value)| StoreKey::from_name(&name).map(|k| (k, value)))
                .collect()
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = state.len(), "loaded token store");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &BTreeMap<StoreKey, String>) -> Result<()> {
        let raw: BTreeMap<&str, &str> = state
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let json = serde_json::to_string_pretty(&raw)
            .map_err(|e| Error::Storage(format!("serializing token store: {e}")))?;
        write_atomic(&self.path, json).await
    }

    /// Writes `next` to disk, then makes it the live map. The live map is
    /// left untouched when the write fails.
    async fn commit(
        &self,
        state: &mut BTreeMap<StoreKey, String>,
        next: BTreeMap<StoreKey, String>,
    ) -> Result<()> {
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    async fn get(&self, key: StoreKey) -> Option<String> {
        self.state.lock().await.get(&key).cloned()
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        self.set_many(vec![(key, value)]).await
    }

    async fn delete(&self, key: StoreKey) -> Result<()> {
        self.delete_many(&[key]).await
    }

    async fn set_many(&self, entries: Vec<(StoreKey, String)>) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.extend(entries);
        self.commit(&mut state, next).await
    }

    async fn delete_many(&self, keys: &[StoreKey]) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        for key in keys {
            next.remove(key);
        }
        if next.len() == state.len() {
            return Ok(());
        }
        self.commit(&mut state, next).await
    }
}

async fn write_atomic(path: &Path, contents: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::Storage(format!("creating {}: {e}", parent.display())))?;
    }

    let tmp = path.with_extension("json.tmp");
    async_fs::write(&tmp, contents)
        .await
        .map_err(|e| Error::Storage(format!("writing {}: {e}", tmp.display())))?;

    // tokens are secrets, keep the file private to the user
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        async_fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| {
                Error::Storage(format!("setting permissions on {}: {e}", tmp.display()))
            })?;
    }

    async_fs::rename(&tmp, path).await.map_err(|e| {
        Error::Storage(format!(
            "renaming {} to {}: {e}",
            tmp.display(),
            path.display()
        ))
    })
}
