use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    errors::Error,
    ports::{StateStore, UpdateFn},
    Result,
};

pub const NS_AUTH: &str = "authentication";
pub const NS_LANGUAGE: &str = "language";
pub const NS_STATE: &str = "state";

pub const KEY_ADMIN_IDS: &str = "adminIds";
pub const KEY_PENDING: &str = "pending";
pub const KEY_FAILS: &str = "fails";
pub const KEY_SOLO_THREAD: &str = "soloThreadId";
pub const KEY_GROUP_THREAD: &str = "groupThreadId";
pub const KEY_ADDR: &str = "addr";

type Entries = BTreeMap<String, BTreeMap<String, Value>>;

fn apply_update(entries: &mut Entries, namespace: &str, key: &str, f: UpdateFn<'_>) -> Result<()> {
    let current = entries.get(namespace).and_then(|ns| ns.get(key)).cloned();
    let next = f(current)?;
    entries
        .entry(namespace.to_string())
        .or_default()
        .insert(key.to_string(), next);
    Ok(())
}

/// In-memory store. Updates are serialized by a single lock.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn update(&self, namespace: &str, key: &str, f: UpdateFn<'_>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        apply_update(&mut entries, namespace, key, f)
    }
}

/// Write-through JSON file store.
///
/// The whole state lives in one `{namespace: {key: value}}` document which is
/// rewritten (via a temp file + rename) after every mutation.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(txt) if txt.trim().is_empty() => Entries::new(),
            Ok(txt) => serde_json::from_str(&txt)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(path = %path.display(), namespaces = entries.len(), "state store opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn flush(&self, entries: &Entries) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.flush(&entries).await
    }

    async fn update(&self, namespace: &str, key: &str, f: UpdateFn<'_>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        apply_update(&mut entries, namespace, key, f)?;
        self.flush(&entries).await
    }
}

/// Typed access to a [`StateStore`].
#[derive(Clone)]
pub struct Storage {
    inner: Arc<dyn StateStore>,
}

impl Storage {
    pub fn new(inner: Arc<dyn StateStore>) -> Self {
        Self { inner }
    }

    pub async fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>> {
        match self.inner.get(namespace, key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
        }
    }

    pub async fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<T> {
        Ok(self.get(namespace, key).await?.unwrap_or_default())
    }

    pub async fn set<T: Serialize + ?Sized>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        self.inner
            .set(namespace, key, serde_json::to_value(value)?)
            .await
    }

    /// Atomically read, modify and write the value under `namespace/key`.
    ///
    /// A missing (or null) value starts from `T::default()`. Returns whatever `f` returns.
    pub async fn modify<T, R, F>(&self, namespace: &str, key: &str, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        R: Send,
        F: FnOnce(&mut T) -> R + Send,
    {
        let mut out = None;
        let slot = &mut out;
        self.inner
            .update(
                namespace,
                key,
                Box::new(move |current| {
                    let mut value: T = match current {
                        None | Some(Value::Null) => T::default(),
                        Some(v) => serde_json::from_value(v)?,
                    };
                    *slot = Some(f(&mut value));
                    Ok(serde_json::to_value(value)?)
                }),
            )
            .await?;

        out.ok_or_else(|| Error::External(format!("state update for {namespace}/{key} did not run")))
    }
}
