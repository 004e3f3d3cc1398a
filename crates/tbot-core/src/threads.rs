use uuid::Uuid;

use crate::{
    domain::ThreadId,
    store::{Storage, KEY_GROUP_THREAD, KEY_SOLO_THREAD, NS_AUTH},
    Result,
};

pub const COMPLIANCE_THREAD_TITLE: &str = "Compliance Alerts";
pub const LOGIN_THREAD_TITLE: &str = "Message Bot Login";

/// Return the thread id stored under `authentication/<key>`, creating it on first use.
///
/// Runs inside one store update, so concurrent first calls agree on a single id.
pub async fn get_or_create(storage: &Storage, key: &str) -> Result<ThreadId> {
    let id = storage
        .modify(NS_AUTH, key, |slot: &mut Option<String>| {
            slot.get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone()
        })
        .await?;
    Ok(ThreadId(id))
}

/// Thread for compliance notices sent to the admin set.
pub async fn solo_auth_thread(storage: &Storage) -> Result<ThreadId> {
    get_or_create(storage, KEY_SOLO_THREAD).await
}

/// Thread used to deliver login codewords.
pub async fn group_auth_thread(storage: &Storage) -> Result<ThreadId> {
    get_or_create(storage, KEY_GROUP_THREAD).await
}
