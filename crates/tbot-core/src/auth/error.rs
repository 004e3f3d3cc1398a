use std::collections::BTreeMap;

/// Caller-facing failures of the login and admin-registry operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Tag did not resolve to exactly one user, or resolved with warnings.
    #[error("not a recognized tag, please try again")]
    InvalidTarget,

    /// Tag resolved, but the user is not an administrator.
    #[error("not an authorized user")]
    NotAuthorized,

    #[error("no authentication pending, please start over")]
    NoChallengePending,

    #[error("incorrect codewords, please try again")]
    IncorrectCode,

    /// Removal target is not in the admin set.
    #[error("administrator id not found")]
    NotFound,
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidTarget | AuthError::NotFound => 400,
            AuthError::NotAuthorized | AuthError::NoChallengePending | AuthError::IncorrectCode => {
                403
            }
        }
    }

    /// Request field the error is attributed to.
    pub fn field(&self) -> &'static str {
        match self {
            AuthError::InvalidTarget | AuthError::NotAuthorized => "tag",
            AuthError::NoChallengePending | AuthError::IncorrectCode => "code",
            AuthError::NotFound => "id",
        }
    }

    /// `{field: [message]}` body for the administrative surface.
    pub fn field_errors(&self) -> BTreeMap<&'static str, Vec<String>> {
        BTreeMap::from([(self.field(), vec![self.to_string()])])
    }
}
