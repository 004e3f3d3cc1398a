use async_trait::async_trait;
use serde_json::Value;

use crate::{
    domain::{Distribution, User, UserId},
    Result,
};

/// Identity/directory service.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Users for `ids`, in the directory's order. Unknown ids are omitted.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>>;

    /// Resolve a tag expression such as `@alice:acme + @bob:acme`.
    async fn resolve_tags(&self, expression: &str) -> Result<Distribution>;
}

/// Machine-translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target` (a language code) and return the first translation.
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

/// Closure applied by [`StateStore::update`]. Receives the current value (if any)
/// and returns the value to store.
pub type UpdateFn<'a> = Box<dyn FnOnce(Option<Value>) -> Result<Value> + Send + 'a>;

/// Process-wide key/value persistence, partitioned by namespace.
///
/// `update` must apply the closure and write its result without another
/// writer observing the intermediate state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>>;
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<()>;
    async fn update(&self, namespace: &str, key: &str, f: UpdateFn<'_>) -> Result<()>;
}

/// Language name to ISO 639-1 code conversion (best-effort).
pub trait LanguageCodes: Send + Sync {
    fn code_for(&self, name: &str) -> Option<String>;
}

/// Source of random natural-language words for login codes.
pub trait WordSource: Send + Sync {
    fn adjective(&self) -> String;
    fn noun(&self) -> String;
}
