use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::UserId, ports::WordSource};

/// A login code waiting to be confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChallenge {
    pub code: String,
    pub expires: DateTime<Utc>,
}

/// Persisted under `authentication/pending`.
pub type PendingMap = BTreeMap<UserId, PendingChallenge>;

impl PendingChallenge {
    /// Two random words, valid for `ttl` from `now`.
    pub fn generate(words: &dyn WordSource, ttl: Duration, now: DateTime<Utc>) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(1));
        Self {
            code: format!("{} {}", words.adjective(), words.noun()),
            expires: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires < now
    }
}

/// Drop every challenge that expired before `now`.
pub fn purge_expired(mut pending: PendingMap, now: DateTime<Utc>) -> PendingMap {
    pending.retain(|_, c| !c.is_expired(now));
    pending
}

/// Outcome of checking a submitted code against the pending map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeCheck {
    Missing,
    Mismatch,
    Matched,
}

/// Purge, compare and (on match) consume, as one step over the map.
pub fn check_and_consume(
    pending: &mut PendingMap,
    user_id: &UserId,
    code: &str,
    now: DateTime<Utc>,
) -> CodeCheck {
    *pending = purge_expired(std::mem::take(pending), now);
    match pending.get(user_id) {
        None => CodeCheck::Missing,
        Some(c) if c.code != code => CodeCheck::Mismatch,
        Some(_) => {
            pending.remove(user_id);
            CodeCheck::Matched
        }
    }
}

/// "one minute", "5 minutes", "30 seconds".
pub fn describe_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    match secs {
        60 => "one minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{s} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedWords;

    fn map_with(uid: &str, code: &str, expires: DateTime<Utc>) -> PendingMap {
        PendingMap::from([(
            UserId::from(uid),
            PendingChallenge {
                code: code.to_string(),
                expires,
            },
        )])
    }

    #[test]
    fn generated_code_is_two_words_one_minute_out() {
        let now = Utc::now();
        let c = PendingChallenge::generate(&FixedWords, Duration::from_secs(60), now);
        assert_eq!(c.code, "brave otter");
        assert_eq!(c.expires, now + chrono::Duration::seconds(60));
        assert!(!c.is_expired(now));
        assert!(c.is_expired(now + chrono::Duration::seconds(61)));
    }

    #[test]
    fn purge_is_idempotent() {
        let now = Utc::now();
        let mut pending = map_with("old", "a b", now - chrono::Duration::seconds(1));
        pending.insert(
            UserId::from("new"),
            PendingChallenge {
                code: "c d".to_string(),
                expires: now + chrono::Duration::seconds(30),
            },
        );

        let once = purge_expired(pending, now);
        let twice = purge_expired(once.clone(), now);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
        assert!(once.contains_key(&UserId::from("new")));
    }

    #[test]
    fn check_consumes_only_on_match() {
        let now = Utc::now();
        let uid = UserId::from("u1");
        let mut pending = map_with("u1", "brave otter", now + chrono::Duration::seconds(30));

        assert_eq!(check_and_consume(&mut pending, &uid, "wrong words", now), CodeCheck::Mismatch);
        assert_eq!(pending.len(), 1);

        assert_eq!(check_and_consume(&mut pending, &uid, "brave otter", now), CodeCheck::Matched);
        assert!(pending.is_empty());

        assert_eq!(check_and_consume(&mut pending, &uid, "brave otter", now), CodeCheck::Missing);
    }

    #[test]
    fn expired_challenge_is_missing_even_with_right_code() {
        let now = Utc::now();
        let uid = UserId::from("u1");
        let mut pending = map_with("u1", "brave otter", now - chrono::Duration::seconds(1));
        assert_eq!(check_and_consume(&mut pending, &uid, "brave otter", now), CodeCheck::Missing);
        assert!(pending.is_empty());
    }

    #[test]
    fn ttl_descriptions() {
        assert_eq!(describe_ttl(Duration::from_secs(60)), "one minute");
        assert_eq!(describe_ttl(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe_ttl(Duration::from_secs(30)), "30 seconds");
    }
}
