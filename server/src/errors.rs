use chrono::NaiveDate;
use thiserror::Error;
use warp::reject;

use crate::film::FilmId;
use crate::label::{GenreId, RatingId};
use crate::user::UserId;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents a film submitted without a name.
    #[error("film name must not be blank")]
    BlankFilmName,

    /// Represents a film description over the length limit.
    #[error("film description is {length} characters, over the {limit} limit")]
    DescriptionTooLong { length: usize, limit: usize },

    /// Represents a release date before the birth of cinema.
    #[error("release date {date} is before {earliest}")]
    ReleaseDateTooEarly { date: NaiveDate, earliest: NaiveDate },

    /// Represents a film duration that is not a positive number of minutes.
    #[error("film duration must be positive, got {duration}")]
    NonPositiveDuration { duration: i32 },

    /// Represents an email address without an `@`.
    #[error("invalid email address {email:?}")]
    InvalidEmail { email: String },

    /// Represents a blank login or one containing whitespace.
    #[error("invalid login {login:?}: must be non-blank with no whitespace")]
    InvalidLogin { login: String },

    /// Represents a birthday after today.
    #[error("birthday {birthday} is in the future")]
    BirthdayInFuture { birthday: NaiveDate },

    /// Represents an update submitted without an id.
    #[error("an id is required when updating")]
    MissingId,

    /// Represents a user trying to friend or unfriend themselves.
    #[error("user {user_id} cannot befriend themselves")]
    SelfFriendship { user_id: UserId },

    /// Represents a reference to a film that does not exist.
    #[error("film with id {0} not found")]
    FilmNotFound(FilmId),

    /// Represents a reference to a user that does not exist.
    #[error("user with id {0} not found")]
    UserNotFound(UserId),

    /// Represents a reference to a genre that does not exist.
    #[error("genre with id {0} not found")]
    GenreNotFound(GenreId),

    /// Represents a reference to an MPA rating that does not exist.
    #[error("MPA rating with id {0} not found")]
    RatingNotFound(RatingId),

    /// Represents a like that already exists.
    #[error("user {user_id} has already liked film {film_id}")]
    DuplicateLike { film_id: FilmId, user_id: UserId },

    /// Represents an attempt to remove a like that does not exist.
    #[error("user {user_id} has no like on film {film_id}")]
    LikeNotFound { film_id: FilmId, user_id: UserId },

    /// Represents a stored film whose rating row no longer resolves.
    /// Fatal for the read in question.
    #[error("film {film_id} references missing rating {rating_id}")]
    MissingRating { film_id: FilmId, rating_id: RatingId },

    /// Represents a duplicate row rejected by a database constraint.
    #[error("unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },
}

impl reject::Reject for BackendError {}
