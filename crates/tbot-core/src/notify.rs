//! Compliance notices delivered to the current administrators.

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use tracing::{info, warn};

use crate::{
    domain::{User, UserId},
    messaging::{port::MessageSender, types::OutgoingMessage},
    ports::Directory,
    store::{Storage, KEY_ADMIN_IDS, NS_AUTH},
    threads::{solo_auth_thread, COMPLIANCE_THREAD_TITLE},
    Result,
};

pub const UNKNOWN_USER: &str = "<unknown>";

/// A notice to broadcast. `note` may contain `<<userId>>` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub note: String,
    pub actor: Option<UserId>,
    pub list_all: bool,
}

impl Notice {
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            actor: None,
            list_all: true,
        }
    }

    /// Attribute the notice to `actor`.
    pub fn by(mut self, actor: &UserId) -> Self {
        self.actor = Some(actor.clone());
        self
    }

    /// Skip the "Current authorized users" listing.
    pub fn without_listing(mut self) -> Self {
        self.list_all = false;
        self
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<<([^>]*)>>").expect("valid regex"))
}

fn label_of(users: &[User], id: &str) -> String {
    users
        .iter()
        .find(|u| u.id.as_str() == id)
        .map(User::label)
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}

/// Build the notice body.
///
/// `users` are the broadcast recipients; `transient_actor` marks an actor who
/// was added for this notice only and must not show up in the admin listing.
pub fn compose(notice: &Notice, users: &[User], transient_actor: bool) -> String {
    let mut body = notice.note.clone();

    if let Some(actor) = &notice.actor {
        body.push_str("\n\nPerformed by ");
        body.push_str(&label_of(users, actor.as_str()));
    }

    if notice.list_all {
        let listing = users
            .iter()
            .filter(|u| !(transient_actor && Some(&u.id) == notice.actor.as_ref()))
            .map(User::label)
            .collect::<Vec<_>>()
            .join("\n");
        body.push_str("\n\nCurrent authorized users:\n");
        body.push_str(&listing);
    }

    placeholder_re()
        .replace_all(&body, |caps: &Captures<'_>| label_of(users, &caps[1]))
        .into_owned()
}

/// Sends notices to every administrator (plus a non-member actor, for that notice only).
#[derive(Clone)]
pub struct Broadcaster {
    storage: Storage,
    directory: Arc<dyn Directory>,
    sender: Arc<dyn MessageSender>,
}

impl Broadcaster {
    pub fn new(
        storage: Storage,
        directory: Arc<dyn Directory>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            storage,
            directory,
            sender,
        }
    }

    /// Compose and deliver `notice`.
    ///
    /// Store and directory failures propagate. A failed send is logged and
    /// otherwise ignored.
    pub async fn broadcast_notice(&self, notice: Notice) -> Result<()> {
        let mut ids: Vec<UserId> = self.storage.get_or_default(NS_AUTH, KEY_ADMIN_IDS).await?;
        let mut transient_actor = false;
        if let Some(actor) = &notice.actor {
            if !ids.contains(actor) {
                ids.push(actor.clone());
                transient_actor = true;
            }
        }

        let users = self.directory.get_users(&ids).await?;
        if users.is_empty() {
            warn!("no administrators to notify; dropping notice");
            return Ok(());
        }

        let expression = users
            .iter()
            .map(User::fq_tag)
            .collect::<Vec<_>>()
            .join(" + ");
        let distribution = self.directory.resolve_tags(&expression).await?;
        let text = compose(&notice, &users, transient_actor);
        let thread_id = solo_auth_thread(&self.storage).await?;

        let msg = OutgoingMessage::text(distribution, thread_id, text).titled(COMPLIANCE_THREAD_TITLE);
        match self.sender.send(msg).await {
            Ok(()) => info!(recipients = users.len(), "compliance notice sent"),
            Err(e) => warn!(error = %e, "failed to send compliance notice"),
        }
        Ok(())
    }
}
