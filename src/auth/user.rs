use std::fmt;

use anyhow::Error;
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Member,
    Trainer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Member => "member",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        }
    }

    // Stored role strings came through several hands in the legacy data, so
    // parsing ignores case. Everything downstream works on the enum.
    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "trainer" => Ok(Role::Trainer),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub role: Role,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
    pub email: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub role: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub email: Option<String>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            role: Role::from_str(&user.role.unwrap_or_default()).unwrap_or(Role::Member),
            username: user.username.unwrap_or_default(),
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            birthday: user.birthday,
            email: user.email.unwrap_or_default(),
        }
    }
}

/// Gate a handler to the given roles. `None` means nobody is logged in.
pub fn authorize<'u>(user: Option<&'u User>, allowed: &[Role]) -> Result<&'u User, AppError> {
    let user = user.ok_or_else(|| AppError::Authentication("Not logged in".to_string()))?;

    if allowed.contains(&user.role) {
        Ok(user)
    } else {
        tracing::warn!(
            username = %user.username,
            role = %user.role,
            allowed = ?allowed,
            "Access denied"
        );
        Err(AppError::Authorization(format!(
            "Role {} may not access this resource",
            user.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Role) -> User {
        User {
            id: 1,
            role,
            username: "test_user".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            birthday: None,
            email: "test@example.com".to_string(),
        }
    }

    #[test]
    fn role_parsing_ignores_case() {
        assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("TRAINER").unwrap(), Role::Trainer);
        assert_eq!(Role::from_str("member").unwrap(), Role::Member);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn authorize_rejects_anonymous() {
        let result = authorize(None, &[Role::Member]);
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn authorize_rejects_disallowed_role() {
        let member = user_with_role(Role::Member);
        let result = authorize(Some(&member), &[Role::Admin, Role::Trainer]);
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[test]
    fn authorize_accepts_allowed_role() {
        let trainer = user_with_role(Role::Trainer);
        let user = authorize(Some(&trainer), &[Role::Admin, Role::Trainer]).unwrap();
        assert_eq!(user.id, 1);
    }
}
