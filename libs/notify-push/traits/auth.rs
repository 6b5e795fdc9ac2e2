use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Static username/password pair used for the socket handshake
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication material held between socket-open and the handshake send
///
/// Consumed by [`PendingAuth::into_frames`]; it never outlives one attempt.
#[derive(Clone, PartialEq, Eq)]
pub enum PendingAuth {
    /// One-shot token obtained from the pre-auth endpoint
    Token(String),
    /// Static credential pair
    Credentials(Credentials),
}

impl PendingAuth {
    /// The two handshake frames, in send order
    ///
    /// A token is sent as an empty username frame followed by the token;
    /// credentials are sent as username then password.
    pub fn into_frames(self) -> [String; 2] {
        match self {
            PendingAuth::Token(token) => [String::new(), token],
            PendingAuth::Credentials(Credentials { username, password }) => [username, password],
        }
    }
}

impl fmt::Debug for PendingAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingAuth::Token(_) => f.write_str("PendingAuth::Token(<redacted>)"),
            PendingAuth::Credentials(c) => write!(f, "PendingAuth::Credentials({:?})", c),
        }
    }
}

/// Trait for providing the handshake credentials
///
/// Implement this trait to define how the client authenticates a freshly
/// opened channel.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produce the authentication to send once the socket opens
    ///
    /// Called once per connect attempt, before the socket is opened.
    ///
    /// # Arguments
    /// * `pre_auth_url` - The capability-reported pre-auth endpoint
    ///
    /// # Returns
    /// * `Ok(auth)` - Send these frames after the socket opens
    /// * `Err(PushError)` - The attempt is aborted and counted as a failure
    async fn pending_auth(&self, pre_auth_url: &str) -> Result<PendingAuth>;
}

/// Auth provider that always answers with a fixed credential pair
///
/// No network call is made.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl AuthProvider for StaticCredentials {
    async fn pending_auth(&self, _pre_auth_url: &str) -> Result<PendingAuth> {
        Ok(PendingAuth::Credentials(self.credentials.clone()))
    }
}
