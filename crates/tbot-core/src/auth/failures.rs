use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    notify::{Broadcaster, Notice},
    store::{Storage, KEY_FAILS, NS_AUTH},
    utils::relative_time,
    Result,
};

pub const DEFAULT_FAIL_THRESHOLD: u32 = 10;

/// Failed login attempts since the last successful one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounter {
    pub count: u32,
    pub since: DateTime<Utc>,
}

impl FailureCounter {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self { count: 0, since: now }
    }
}

pub fn security_alert(counter: &FailureCounter, now: DateTime<Utc>) -> String {
    format!(
        "SECURITY ALERT!\n\n{} failed login attempts (last successful login was {})",
        counter.count,
        relative_time(counter.since, now)
    )
}

/// Record one failed attempt. Returns the counter after the increment.
///
/// Every increment that lands at or above `threshold` sends a security notice,
/// not only the first one.
pub async fn increment(
    storage: &Storage,
    broadcaster: &Broadcaster,
    threshold: u32,
    now: DateTime<Utc>,
) -> Result<FailureCounter> {
    let counter = storage
        .modify(NS_AUTH, KEY_FAILS, |slot: &mut Option<FailureCounter>| {
            let c = slot.get_or_insert_with(|| FailureCounter::fresh(now));
            c.count = c.count.saturating_add(1);
            c.clone()
        })
        .await?;

    if counter.count >= threshold {
        warn!(count = counter.count, "failed login attempts over threshold");
        broadcaster
            .broadcast_notice(Notice::new(security_alert(&counter, now)))
            .await?;
    }

    Ok(counter)
}

pub async fn reset(storage: &Storage, now: DateTime<Utc>) -> Result<()> {
    storage
        .set(NS_AUTH, KEY_FAILS, &FailureCounter::fresh(now))
        .await
}

/// The stored counter, if any failure or success has been recorded yet.
pub async fn current(storage: &Storage) -> Result<Option<FailureCounter>> {
    storage.get(NS_AUTH, KEY_FAILS).await
}
