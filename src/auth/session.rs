use actix_session::Session;

use crate::errors::AppError;

pub const WEEKS_EDIT: &str = "weeks.edit";
pub const PUBLISHERS_EDIT: &str = "publishers.edit";
pub const DIRECTORY_EDIT: &str = "directory.edit";
pub const SETTINGS_MANAGE: &str = "settings.manage";

/// Permission codes of the logged-in user, with a `has()` method for templates.
#[derive(Debug, Clone, Default)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|p| p == code)
    }

    pub fn from_csv(csv: &str) -> Self {
        let codes = csv
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Permissions(codes)
    }
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

/// Logged-in user id, or a session error that redirects to the login page.
pub fn require_user_id(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or_else(|| AppError::Session("Not logged in".to_string()))
}

pub fn get_username(session: &Session) -> Result<String, AppError> {
    session
        .get::<String>("username")
        .map_err(|e| AppError::Session(e.to_string()))?
        .ok_or_else(|| AppError::Session("No username in session".to_string()))
}

pub fn get_permissions(session: &Session) -> Result<Permissions, AppError> {
    session
        .get::<String>("permissions")
        .map_err(|e| AppError::Session(e.to_string()))?
        .map(|csv| Permissions::from_csv(&csv))
        .ok_or_else(|| AppError::Session("No permissions in session".to_string()))
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}

/// Check permission; returns Err(AppError) if denied.
pub fn require_permission(session: &Session, code: &str) -> Result<(), AppError> {
    if get_permissions(session)?.has(code) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_parse_from_csv() {
        let p = Permissions::from_csv("weeks.edit, settings.manage,,");
        assert!(p.has(WEEKS_EDIT));
        assert!(p.has(SETTINGS_MANAGE));
        assert!(!p.has(PUBLISHERS_EDIT));
        assert_eq!(p.0.len(), 2);
    }
}
