use std::fmt;

use serde::Serialize;

/// Username of the account seeded into an empty `admin` table.
pub const DEFAULT_ADMIN_USERNAME: &str = "Culte";

/// Password of the seeded account. Stored and compared as plaintext.
pub const DEFAULT_ADMIN_PASSWORD: &str = "Culte@Pr0t3ction";

/// The single privileged account allowed to edit and delete records.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admin")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_never_leaks() {
        let admin = Admin {
            id: 1,
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        };
        assert!(!format!("{:?}", admin).contains(DEFAULT_ADMIN_PASSWORD));
        let json = serde_json::to_string(&admin).unwrap();
        assert!(!json.contains("password"));
    }
}
