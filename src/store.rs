use std::collections::HashMap;
use std::sync::Mutex;

use time::OffsetDateTime;

use crate::models::{access_token::AccessToken, oauth_code::AuthorizationCode, user::UserRecord};

/// Why a code redemption was refused. Every variant maps to the same
/// `invalid_grant` wire error; the distinction only feeds logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemError {
    UnknownCode,
    Expired,
    AlreadyUsed,
    ClientMismatch,
    RedirectMismatch,
}

/// Process-lifetime state: the two mutable credential maps plus the
/// immutable user directory. Entries are never removed; expiry is checked
/// lazily at the moment of use.
///
/// The mutexes are held only for short synchronous sections and never
/// across an await, so plain `std::sync::Mutex` is enough here.
pub struct MemoryStore {
    codes: Mutex<HashMap<String, AuthorizationCode>>,
    tokens: Mutex<HashMap<String, AccessToken>>,
    users: HashMap<String, UserRecord>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let users = UserRecord::seed()
            .into_iter()
            .map(|u| (u.email.clone(), u))
            .collect();
        Self {
            codes: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            users,
        }
    }

    /// Seeded users ordered by email, for rendering the login form.
    pub fn list_users(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users
    }

    pub fn find_user(&self, email: &str) -> Option<UserRecord> {
        self.users.get(email).cloned()
    }

    pub fn create_code(&self, code: String, record: AuthorizationCode) {
        self.codes.lock().expect("code store poisoned").insert(code, record);
    }

    /// Atomic check-and-set for code redemption: the lookup, the expiry and
    /// binding checks, and the used-flag flip all happen under one lock
    /// acquisition, so two concurrent exchanges of the same code cannot both
    /// succeed.
    pub fn redeem_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        now: OffsetDateTime,
    ) -> Result<AuthorizationCode, RedeemError> {
        let mut codes = self.codes.lock().expect("code store poisoned");
        let record = codes.get_mut(code).ok_or(RedeemError::UnknownCode)?;

        if record.is_expired(now) {
            return Err(RedeemError::Expired);
        }
        if record.used {
            return Err(RedeemError::AlreadyUsed);
        }
        if record.client_id != client_id {
            return Err(RedeemError::ClientMismatch);
        }
        if record.redirect_uri != redirect_uri {
            return Err(RedeemError::RedirectMismatch);
        }

        record.used = true;
        Ok(record.clone())
    }

    pub fn create_token(&self, token: String, record: AccessToken) {
        self.tokens.lock().expect("token store poisoned").insert(token, record);
    }

    pub fn get_token(&self, token: &str) -> Option<AccessToken> {
        self.tokens.lock().expect("token store poisoned").get(token).cloned()
    }
}
