//! Challenge-response login and the administrator registry.
//!
//! A login code can only be issued to a user who is already an administrator.
//! Codes are delivered over the transport, live for a short window, and are
//! consumed by the first successful validation. Every state change here goes
//! through [`Storage::modify`], so the pending map, fail counter and admin set
//! are never read-modified-written by two callers at once.

pub mod challenge;
pub mod error;
pub mod failures;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub use challenge::{CodeCheck, PendingChallenge, PendingMap};
pub use error::AuthError;
pub use failures::FailureCounter;

use crate::{
    config::Config,
    domain::{normalize_tag, AdminEntry, Distribution, UserId},
    messaging::{port::MessageSender, types::OutgoingMessage},
    notify::{Broadcaster, Notice},
    ports::{Directory, WordSource},
    store::{Storage, KEY_ADMIN_IDS, KEY_PENDING, NS_AUTH},
    threads::{group_auth_thread, LOGIN_THREAD_TITLE},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct AuthSettings {
    /// How long an issued code stays valid.
    pub code_ttl: Duration,
    /// Fail count at which security notices start going out.
    pub fail_threshold: u32,
    /// Delay before reporting an incorrect code.
    pub fail_delay: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(60),
            fail_threshold: failures::DEFAULT_FAIL_THRESHOLD,
            fail_delay: Duration::from_millis(500),
        }
    }
}

impl From<&Config> for AuthSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            code_ttl: cfg.auth_code_ttl,
            fail_threshold: cfg.auth_fail_threshold,
            fail_delay: cfg.auth_fail_delay,
        }
    }
}

pub struct AuthService {
    storage: Storage,
    directory: Arc<dyn Directory>,
    sender: Arc<dyn MessageSender>,
    words: Arc<dyn WordSource>,
    broadcaster: Broadcaster,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        storage: Storage,
        directory: Arc<dyn Directory>,
        sender: Arc<dyn MessageSender>,
        words: Arc<dyn WordSource>,
        settings: AuthSettings,
    ) -> Self {
        let broadcaster = Broadcaster::new(storage.clone(), directory.clone(), sender.clone());
        Self {
            storage,
            directory,
            sender,
            words,
            broadcaster,
            settings,
        }
    }

    async fn admin_ids(&self) -> Result<Vec<UserId>> {
        self.storage.get_or_default(NS_AUTH, KEY_ADMIN_IDS).await
    }

    /// Resolve `tag` to exactly one user, or fail with `InvalidTarget`.
    async fn resolve_single(&self, tag: &str) -> Result<(UserId, Distribution)> {
        let dist = self.directory.resolve_tags(&normalize_tag(tag)).await?;
        let Some(uid) = dist.single_user().cloned() else {
            return Err(AuthError::InvalidTarget.into());
        };
        Ok((uid, dist))
    }

    /// Issue a login code to the administrator named by `tag_or_id`.
    ///
    /// Returns the resolved user id; the caller submits it back with the code.
    pub async fn send_auth_code(&self, tag_or_id: &str) -> Result<UserId> {
        self.send_auth_code_at(tag_or_id, Utc::now()).await
    }

    pub async fn send_auth_code_at(&self, tag_or_id: &str, now: DateTime<Utc>) -> Result<UserId> {
        let (uid, dist) = self.resolve_single(tag_or_id).await?;
        if !self.admin_ids().await?.contains(&uid) {
            return Err(AuthError::NotAuthorized.into());
        }

        let challenge = PendingChallenge::generate(self.words.as_ref(), self.settings.code_ttl, now);
        let text = format!(
            "codewords: {}\n(valid for {})",
            challenge.code,
            challenge::describe_ttl(self.settings.code_ttl)
        );
        self.storage
            .modify(NS_AUTH, KEY_PENDING, |pending: &mut PendingMap| {
                pending.insert(uid.clone(), challenge);
            })
            .await?;

        let thread_id = group_auth_thread(&self.storage).await?;
        let msg = OutgoingMessage::text(dist, thread_id, text).titled(LOGIN_THREAD_TITLE);
        if let Err(e) = self.sender.send(msg).await {
            warn!(user = %uid, error = %e, "failed to deliver login codewords");
        }

        info!(user = %uid, "login codewords issued");
        Ok(uid)
    }

    /// Check `code` against the pending challenge for `user_id`.
    pub async fn validate_auth_code(&self, user_id: &UserId, code: &str) -> Result<()> {
        self.validate_auth_code_at(user_id, code, Utc::now()).await
    }

    pub async fn validate_auth_code_at(
        &self,
        user_id: &UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let check = self
            .storage
            .modify(NS_AUTH, KEY_PENDING, |pending: &mut PendingMap| {
                challenge::check_and_consume(pending, user_id, code, now)
            })
            .await?;

        match check {
            CodeCheck::Missing => Err(AuthError::NoChallengePending.into()),
            CodeCheck::Mismatch => {
                warn!(user = %user_id, "incorrect login codewords");
                if let Err(e) = failures::increment(
                    &self.storage,
                    &self.broadcaster,
                    self.settings.fail_threshold,
                    now,
                )
                .await
                {
                    warn!(error = %e, "failed to record login failure");
                }
                tokio::time::sleep(self.settings.fail_delay).await;
                Err(AuthError::IncorrectCode.into())
            }
            CodeCheck::Matched => {
                self.broadcaster
                    .broadcast_notice(Notice::new("LOGIN").by(user_id).without_listing())
                    .await?;
                failures::reset(&self.storage, now).await?;
                info!(user = %user_id, "login succeeded");
                Ok(())
            }
        }
    }

    /// Current administrators as `{id, label}`, in stored order.
    pub async fn get_administrators(&self) -> Result<Vec<AdminEntry>> {
        let ids = self.admin_ids().await?;
        let mut users = self.directory.get_users(&ids).await?;
        users.sort_by_key(|u| ids.iter().position(|id| id == &u.id));
        Ok(users.iter().map(AdminEntry::from).collect())
    }

    pub async fn add_administrator(&self, add_tag: &str, actor: &UserId) -> Result<Vec<AdminEntry>> {
        let (uid, _) = self.resolve_single(add_tag).await?;

        let added = self
            .storage
            .modify(NS_AUTH, KEY_ADMIN_IDS, |ids: &mut Vec<UserId>| {
                if ids.contains(&uid) {
                    false
                } else {
                    ids.push(uid.clone());
                    true
                }
            })
            .await?;
        info!(user = %uid, actor = %actor, added, "administrator added");

        self.broadcaster
            .broadcast_notice(Notice::new(format!("ADDED <<{uid}>> to authorized users")).by(actor))
            .await?;

        self.get_administrators().await
    }

    /// Remove `remove_id` from the admin set.
    ///
    /// The notice goes out before the removal is persisted, so its listing
    /// still names the removed administrator.
    pub async fn remove_administrator(
        &self,
        remove_id: &UserId,
        actor: &UserId,
    ) -> Result<Vec<AdminEntry>> {
        if !self.admin_ids().await?.contains(remove_id) {
            return Err(AuthError::NotFound.into());
        }

        self.broadcaster
            .broadcast_notice(
                Notice::new(format!("REMOVING <<{remove_id}>> from authorized users")).by(actor),
            )
            .await?;

        self.storage
            .modify(NS_AUTH, KEY_ADMIN_IDS, |ids: &mut Vec<UserId>| {
                ids.retain(|id| id != remove_id);
            })
            .await?;
        info!(user = %remove_id, actor = %actor, "administrator removed");

        self.get_administrators().await
    }

    pub async fn failure_count(&self) -> Result<u32> {
        Ok(failures::current(&self.storage).await?.map_or(0, |c| c.count))
    }
}
