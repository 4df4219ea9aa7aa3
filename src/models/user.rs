use serde::{Deserialize, Serialize};

/// A seeded test identity. The struct doubles as the userinfo response body,
/// so the field names here are the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub sub: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub username: String,
}

impl UserRecord {
    /// The two identities every fresh process knows about.
    pub fn seed() -> Vec<UserRecord> {
        vec![
            UserRecord {
                id: "12345".into(),
                sub: "12345".into(),
                name: "Test User".into(),
                email: "test@company.com".into(),
                company: "Test Company Ltd".into(),
                username: "testuser".into(),
            },
            UserRecord {
                id: "67890".into(),
                sub: "67890".into(),
                name: "Admin User".into(),
                email: "admin@company.com".into(),
                company: "Test Company Ltd".into(),
                username: "admin".into(),
            },
        ]
    }
}
