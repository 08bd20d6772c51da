//! Session lifecycle.
//!
//! ```text
//!              restore(Some)            logout / expiry
//!   Loading ──────────────────► Authenticated ─────────────► Anonymous
//!      │                              ▲                          │
//!      │ restore(None) / read failed  │          login           │
//!      └──────────────────────► Anonymous ───────────────────────┘
//! ```
//!
//! The bearer token is the sole authority for authenticated requests. While
//! the session is `Loading` no authenticated operation may start; once it
//! leaves `Loading` it never returns there.

use rider_proto::profile::{Availability, Profile};

use crate::error::SessionError;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Persisted token not read yet.
    Loading,
    /// No token.
    Anonymous,
    /// Token present.
    Authenticated,
}

/// Authentication state and the rider's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phase: Phase,
    token: Option<String>,
    user: Option<Profile>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session waiting for the persisted token.
    pub const fn new() -> Self {
        Self { phase: Phase::Loading, token: None, user: None }
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// True only before the persisted token has been read.
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// True while a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.phase == Phase::Authenticated
    }

    /// Bearer token, if authenticated.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Rider profile, once fetched.
    pub fn user(&self) -> Option<&Profile> {
        self.user.as_ref()
    }

    /// Bearer token for an authenticated operation.
    ///
    /// # Errors
    ///
    /// [`SessionError::Loading`] before the token was read,
    /// [`SessionError::NotAuthenticated`] without a token.
    pub fn require_token(&self) -> Result<&str, SessionError> {
        match (self.phase, self.token.as_deref()) {
            (Phase::Loading, _) => Err(SessionError::Loading),
            (Phase::Authenticated, Some(token)) => Ok(token),
            _ => Err(SessionError::NotAuthenticated),
        }
    }

    /// Leave `Loading` with the persisted token, if any. Blank tokens count
    /// as absent.
    ///
    /// Returns `true` if the session became authenticated. Calls after the
    /// first are ignored.
    pub fn restore(&mut self, token: Option<String>) -> bool {
        if !self.is_loading() {
            return false;
        }
        match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                self.phase = Phase::Authenticated;
                self.token = Some(token);
                true
            },
            None => {
                self.phase = Phase::Anonymous;
                false
            },
        }
    }

    /// Adopt a freshly issued token.
    ///
    /// # Errors
    ///
    /// [`SessionError::Loading`] before the persisted token was read,
    /// [`SessionError::AlreadyAuthenticated`] if a session exists.
    pub fn login(&mut self, token: String) -> Result<(), SessionError> {
        match self.phase {
            Phase::Loading => Err(SessionError::Loading),
            Phase::Authenticated => Err(SessionError::AlreadyAuthenticated),
            Phase::Anonymous => {
                self.phase = Phase::Authenticated;
                self.token = Some(token);
                Ok(())
            },
        }
    }

    /// Drop token and profile. Returns `true` if a session was ended.
    ///
    /// Logging out while loading settles the session as anonymous.
    pub fn logout(&mut self) -> bool {
        let was_authenticated = self.is_authenticated();
        self.phase = Phase::Anonymous;
        self.token = None;
        self.user = None;
        was_authenticated
    }

    /// Store the fetched profile.
    pub fn set_user(&mut self, profile: Profile) {
        self.user = Some(profile);
    }

    /// Optimistically set the availability toggle. Returns the previous
    /// value for rollback, or `None` if no profile is loaded.
    pub fn set_availability(&mut self, status: Availability) -> Option<Availability> {
        self.user.as_mut().map(|user| std::mem::replace(&mut user.status, status))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rider_proto::{AccountId, payout::EWallet};

    use super::*;

    fn profile() -> Profile {
        Profile {
            id: AccountId::new("r1"),
            image_file: None,
            firstname: "Jo".into(),
            lastname: "Reyes".into(),
            email: "jo@example.com".into(),
            contact: String::new(),
            status: Availability::Offline,
            wallet: EWallet::default(),
        }
    }

    #[test]
    fn loading_rejects_authenticated_work() {
        let session = Session::new();
        assert!(session.is_loading());
        assert_eq!(session.require_token(), Err(SessionError::Loading));
    }

    #[test]
    fn restore_with_token_authenticates() {
        let mut session = Session::new();
        assert!(session.restore(Some("tok".into())));
        assert_eq!(session.require_token().unwrap(), "tok");

        // Second restore is ignored
        assert!(!session.restore(None));
        assert!(session.is_authenticated());
    }

    #[test]
    fn blank_token_restores_anonymous() {
        let mut session = Session::new();
        assert!(!session.restore(Some("  ".into())));
        assert_eq!(session.phase(), Phase::Anonymous);
        assert_eq!(session.require_token(), Err(SessionError::NotAuthenticated));
    }

    #[test]
    fn login_requires_settled_anonymous_session() {
        let mut session = Session::new();
        assert_eq!(session.login("t".into()), Err(SessionError::Loading));

        session.restore(None);
        session.login("t".into()).unwrap();
        assert_eq!(session.login("u".into()), Err(SessionError::AlreadyAuthenticated));
    }

    #[test]
    fn logout_clears_profile() {
        let mut session = Session::new();
        session.restore(Some("tok".into()));
        session.set_user(profile());

        assert!(session.logout());
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(!session.logout());
    }

    #[test]
    fn availability_returns_previous_value() {
        let mut session = Session::new();
        assert_eq!(session.set_availability(Availability::Available), None);

        session.restore(Some("tok".into()));
        session.set_user(profile());
        assert_eq!(session.set_availability(Availability::Available), Some(Availability::Offline));
        assert_eq!(session.user().unwrap().status, Availability::Available);
    }
}
