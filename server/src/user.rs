use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::BackendError;
use crate::film::FilmId;

/// The id of a user row.
pub type UserId = i64;

/// A single registered user, with friend and like ids attached.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// The id of the user.
    pub id: UserId,

    /// The email address.
    pub email: String,

    /// The unique account handle.
    pub login: String,

    /// The display name. Defaults to the login when left blank.
    pub name: String,

    /// The date of birth.
    pub birthday: NaiveDate,

    /// The ids of users this user has an outbound friendship edge to.
    pub friends: Vec<UserId>,

    /// The ids of films this user has liked.
    pub likes: Vec<FilmId>,
}

/// A user as submitted by a client.
#[derive(Clone, Debug, Deserialize)]
pub struct UserDraft {
    /// The id of the user. Absent on creation, required on update.
    pub id: Option<UserId>,

    /// The email address.
    pub email: String,

    /// The account handle.
    pub login: String,

    /// The display name, if any.
    #[serde(default)]
    pub name: Option<String>,

    /// The date of birth.
    pub birthday: NaiveDate,
}

impl UserDraft {
    /// Checks the field-level rules.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(BackendError::InvalidEmail {
                email: self.email.clone(),
            });
        }

        if self.login.is_empty() || self.login.chars().any(char::is_whitespace) {
            return Err(BackendError::InvalidLogin {
                login: self.login.clone(),
            });
        }

        let today = Utc::now().naive_utc().date();

        if self.birthday > today {
            return Err(BackendError::BirthdayInFuture {
                birthday: self.birthday,
            });
        }

        Ok(())
    }

    /// Returns the display name to store: the submitted name, or the login
    /// when the name is blank or absent.
    pub fn effective_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.login,
        }
    }
}
