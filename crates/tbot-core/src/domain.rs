use std::fmt;

use serde::{Deserialize, Serialize};

/// Directory user id (opaque string, usually a UUID).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Conversation thread id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

/// Transport message id, used to reference the message being replied to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub slug: String,
}

/// Snapshot of a directory user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub tag: Slug,
    #[serde(default)]
    pub org: Slug,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    /// `@tag:org`
    pub fn fq_tag(&self) -> String {
        format!("@{}:{}", self.tag.slug, self.org.slug)
    }

    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .map(|s| s.as_deref().unwrap_or("").trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.fq_tag(), self.full_name())
    }
}

/// A problem reported by the directory while resolving a tag expression.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagWarning {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub cue: String,
}

/// Result of resolving a tag expression.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(default)]
    pub userids: Vec<UserId>,
    #[serde(default)]
    pub warnings: Vec<TagWarning>,
    /// Normalized expression as returned by the directory, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal: Option<String>,
}

impl Distribution {
    /// The resolved id when this distribution names exactly one user with no warnings.
    pub fn single_user(&self) -> Option<&UserId> {
        match (self.userids.as_slice(), self.warnings.is_empty()) {
            ([only], true) => Some(only),
            _ => None,
        }
    }
}

/// `{id, label}` row returned by admin registry operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEntry {
    pub id: UserId,
    pub label: String,
}

impl From<&User> for AdminEntry {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            label: u.label(),
        }
    }
}

/// Prefix `@` to a bare tag or id.
pub fn normalize_tag(raw: &str) -> String {
    if raw.starts_with('@') {
        raw.to_string()
    } else {
        format!("@{raw}")
    }
}
