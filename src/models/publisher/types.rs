use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assignments::AssignmentPermission;

pub const GENDERS: [(&str, &str); 2] = [("brother", "Brother"), ("sister", "Sister")];

pub const PRIVILEGES: [(&str, &str); 7] = [
    ("elder", "Elder"),
    ("ministerial-servant", "Ministerial Servant"),
    ("publisher", "Publisher"),
    ("unbaptized-publisher", "Unbaptized Publisher"),
    ("pioneer", "Regular Pioneer"),
    ("auxiliary-pioneer", "Auxiliary Pioneer"),
    ("special-pioneer", "Special Pioneer"),
];

/// A period in which a publisher is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

/// Row of the publisher list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublisherListItem {
    pub id: i64,
    pub display_name: String,
    pub gender: String,
    pub group_name: String,
    /// Comma-separated assignment permission tags.
    pub permissions: String,
}

/// Full publisher record for the edit form.
#[derive(Debug, Clone, Default)]
pub struct PublisherDetail {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub surname: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub privileges: Vec<String>,
    pub assignment_permissions: BTreeSet<AssignmentPermission>,
    pub group_id: Option<i64>,
    pub absences: Vec<Absence>,
    pub has_login: bool,
}

impl PublisherDetail {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.surname)
    }

    pub fn has_privilege(&self, code: &str) -> bool {
        self.privileges.iter().any(|p| p == code)
    }

    pub fn has_permission(&self, tag: &str) -> bool {
        AssignmentPermission::parse(tag).is_some_and(|p| self.assignment_permissions.contains(&p))
    }
}

/// Validated data for creating or updating a publisher.
#[derive(Debug, Clone, Default)]
pub struct PublisherInput {
    /// Login name; generated when left blank.
    pub username: String,
    pub first_name: String,
    pub surname: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub privileges: Vec<String>,
    pub assignment_permissions: BTreeSet<AssignmentPermission>,
    pub group_id: Option<i64>,
    pub absences: Vec<Absence>,
    /// Argon2 hash. `None` keeps the current password (or none).
    pub password_hash: Option<String>,
}

impl PublisherInput {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.surname)
    }
}

/// Name publishers are listed and matched by: `"<first name> <surname>"`.
pub fn display_name(first_name: &str, surname: &str) -> String {
    format!("{} {}", first_name.trim(), surname.trim()).trim().to_string()
}

/// Credentials for login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub password: String,
}
