use time::OffsetDateTime;

/// A bearer token minted by the token endpoint. Never mutated, never
/// revoked; validity is re-checked against `expires_at` on every use.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub user_email: String,
    pub expires_at: OffsetDateTime,
    pub scope: String,
}

impl AccessToken {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}
