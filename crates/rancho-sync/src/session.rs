//! The operator session.
//!
//! Created by the auth layer at login and destroyed at logout.  The loader
//! and the outbound engine receive it explicitly on every call instead of
//! reading ambient storage: "logged in" is whoever holds a `Session` value.

/// Bearer credential plus the acting operator's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token sent as the `X-Authorization` header.
    pub token: String,
    /// Id of the logged-in operator, attached to every uploaded check-in.
    pub operator_id: i64,
}

impl Session {
    pub fn new(token: impl Into<String>, operator_id: i64) -> Self {
        Self {
            token: token.into(),
            operator_id,
        }
    }
}
