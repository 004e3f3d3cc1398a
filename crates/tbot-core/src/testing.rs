//! Hand-rolled collaborator fakes shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{Distribution, Slug, TagWarning, User, UserId},
    errors::Error,
    messaging::{
        port::{IdentityKeys, MessageSender},
        types::OutgoingMessage,
    },
    ports::{Directory, Translator, WordSource},
    Result,
};

pub const ORG: &str = "acme";

pub fn user(id: &str, tag: &str, first_name: &str) -> User {
    User {
        id: UserId::from(id),
        tag: Slug {
            slug: tag.to_string(),
        },
        org: Slug {
            slug: ORG.to_string(),
        },
        first_name: Some(first_name.to_string()),
        middle_name: None,
        last_name: Some("Test".to_string()),
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    users: Mutex<Vec<User>>,
    get_users_calls: Mutex<usize>,
    resolve_calls: Mutex<Vec<String>>,
    fail_resolve: Mutex<bool>,
    reversed: bool,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: &str, tag: &str, first_name: &str) -> Self {
        self.users.lock().unwrap().push(user(id, tag, first_name));
        self
    }

    /// Return `get_users` results in reverse request order.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    pub fn get_users_calls(&self) -> usize {
        *self.get_users_calls.lock().unwrap()
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.lock().unwrap().len()
    }

    pub fn resolved_expressions(&self) -> Vec<String> {
        self.resolve_calls.lock().unwrap().clone()
    }

    pub fn fail_next_resolve(&self) {
        *self.fail_resolve.lock().unwrap() = true;
    }

    fn lookup(&self, term: &str) -> Option<UserId> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| {
                term == u.fq_tag()
                    || term == format!("@{}", u.tag.slug)
                    || term == format!("@{}", u.id)
            })
            .map(|u| u.id.clone())
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        *self.get_users_calls.lock().unwrap() += 1;
        let users = self.users.lock().unwrap();
        let mut found: Vec<User> = ids
            .iter()
            .filter_map(|id| users.iter().find(|u| &u.id == id).cloned())
            .collect();
        if self.reversed {
            found.reverse();
        }
        Ok(found)
    }

    async fn resolve_tags(&self, expression: &str) -> Result<Distribution> {
        self.resolve_calls
            .lock()
            .unwrap()
            .push(expression.to_string());
        {
            let mut fail = self.fail_resolve.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(Error::External("directory unavailable".to_string()));
            }
        }

        let mut dist = Distribution::default();
        for term in expression.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            match self.lookup(term) {
                Some(id) if !dist.userids.contains(&id) => dist.userids.push(id),
                Some(_) => {}
                None => dist.warnings.push(TagWarning {
                    kind: "unknown".to_string(),
                    cue: term.to_string(),
                }),
            }
        }
        Ok(dist)
    }
}

/// Translator returning `"[<lang>] <text>"`, or the text unchanged for identity languages.
#[derive(Default)]
pub struct FakeTranslator {
    calls: Mutex<Vec<(String, String)>>,
    identity: Mutex<HashSet<String>>,
    fixed: Mutex<HashMap<String, String>>,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make translations into `lang` echo the input back.
    pub fn identity_for(self, lang: &str) -> Self {
        self.identity.lock().unwrap().insert(lang.to_string());
        self
    }

    pub fn fixed(self, lang: &str, out: &str) -> Self {
        self.fixed
            .lock()
            .unwrap()
            .insert(lang.to_string(), out.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, lang: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, l)| l == lang)
            .count()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), target.to_string()));
        if self.identity.lock().unwrap().contains(target) {
            return Ok(format!(" {text} "));
        }
        if let Some(out) = self.fixed.lock().unwrap().get(target) {
            return Ok(out.clone());
        }
        Ok(format!("[{target}] {text}"))
    }
}

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingMessage>>,
    accepted_keys: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let s = Self::default();
        *s.fail.lock().unwrap() = true;
        s
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn accepted_keys(&self) -> Vec<String> {
        self.accepted_keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, msg: OutgoingMessage) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(Error::External("transport down".to_string()));
        }
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

#[async_trait]
impl IdentityKeys for RecordingSender {
    async fn accept_identity_key(&self, addr: &str) -> Result<()> {
        self.accepted_keys.lock().unwrap().push(addr.to_string());
        Ok(())
    }
}

pub struct FixedWords;

impl WordSource for FixedWords {
    fn adjective(&self) -> String {
        "brave".to_string()
    }

    fn noun(&self) -> String {
        "otter".to_string()
    }
}
