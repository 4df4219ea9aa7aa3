use time::OffsetDateTime;

/// A pending or redeemed authorization code.
///
/// Keyed by the opaque code string in the store. The record is mutated
/// exactly once, when the used flag is set at redemption; entries are never
/// deleted (abandoned codes simply sit out their expiry).
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub user_email: String,
    pub expires_at: OffsetDateTime,
    pub used: bool,
}

impl AuthorizationCode {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}
