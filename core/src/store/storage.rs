// cartsync/src/store/storage.rs

//! Session-scoped storage: a string key/value area that outlives a page load
//! but not the session. Writes are synchronous; concurrent writers are not
//! coordinated (last writer wins).

use crate::error::CartResult;
use anyhow::Context as AnyhowContext;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

/// Fixed key the serialized cart lives under.
pub const CART_STORAGE_KEY: &str = "cart";

pub trait SessionStorage: Send + Sync {
  fn get(&self, key: &str) -> CartResult<Option<String>>;
  fn set(&self, key: &str, value: &str) -> CartResult<()>;
  fn remove(&self, key: &str) -> CartResult<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStorage for MemorySessionStorage {
  fn get(&self, key: &str) -> CartResult<Option<String>> {
    Ok(self.entries.lock().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> CartResult<()> {
    self.entries.lock().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> CartResult<()> {
    self.entries.lock().remove(key);
    Ok(())
  }
}

/// One file per key under a session directory.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
  dir: PathBuf,
}

impl FileSessionStorage {
  pub fn open(dir: impl Into<PathBuf>) -> CartResult<Self> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating session directory {}", dir.display()))?;
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> PathBuf {
    // Keys are fixed identifiers; keep anything path-like out of the name.
    let file_name: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
      .collect();
    self.dir.join(format!("{}.json", file_name))
  }
}

impl SessionStorage for FileSessionStorage {
  fn get(&self, key: &str) -> CartResult<Option<String>> {
    let path = self.path_for(key);
    match std::fs::read_to_string(&path) {
      Ok(contents) => Ok(Some(contents)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(anyhow::Error::new(e).context(format!("reading {}", path.display())).into()),
    }
  }

  fn set(&self, key: &str, value: &str) -> CartResult<()> {
    let path = self.path_for(key);
    // Write-then-rename: readers never observe a partially written cart.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
  }

  fn remove(&self, key: &str) -> CartResult<()> {
    let path = self.path_for(key);
    match std::fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(anyhow::Error::new(e).context(format!("removing {}", path.display())).into()),
    }
  }
}
