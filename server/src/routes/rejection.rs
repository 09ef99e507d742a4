use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;
use crate::film::FilmId;
use crate::label::{GenreId, RatingId};
use crate::user::UserId;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    AddFriend { user_id: UserId, friend_id: UserId },
    CommonFriends { user_id: UserId, other_id: UserId },
    // the field-less contexts are struct variants so they flatten as `{}`
    CreateFilm {},
    CreateUser {},
    DeleteFilm { id: FilmId },
    DeleteUser { id: UserId },
    Films {},
    Film { id: FilmId },
    Friends { user_id: UserId },
    Genres {},
    Genre { id: GenreId },
    Like { film_id: FilmId, user_id: UserId },
    Popular { count: i64 },
    Ratings {},
    Rating { id: RatingId },
    RemoveFriend { user_id: UserId, friend_id: UserId },
    Unlike { film_id: FilmId, user_id: UserId },
    UpdateFilm { id: Option<FilmId> },
    UpdateUser { id: Option<UserId> },
    Users {},
    User { id: UserId },
}

impl Context {
    pub fn add_friend(user_id: UserId, friend_id: UserId) -> Context {
        Context::AddFriend { user_id, friend_id }
    }

    pub fn common_friends(user_id: UserId, other_id: UserId) -> Context {
        Context::CommonFriends { user_id, other_id }
    }

    pub fn create_film() -> Context {
        Context::CreateFilm {}
    }

    pub fn create_user() -> Context {
        Context::CreateUser {}
    }

    pub fn delete_film(id: FilmId) -> Context {
        Context::DeleteFilm { id }
    }

    pub fn delete_user(id: UserId) -> Context {
        Context::DeleteUser { id }
    }

    pub fn films() -> Context {
        Context::Films {}
    }

    pub fn film(id: FilmId) -> Context {
        Context::Film { id }
    }

    pub fn friends(user_id: UserId) -> Context {
        Context::Friends { user_id }
    }

    pub fn genres() -> Context {
        Context::Genres {}
    }

    pub fn genre(id: GenreId) -> Context {
        Context::Genre { id }
    }

    pub fn like(film_id: FilmId, user_id: UserId) -> Context {
        Context::Like { film_id, user_id }
    }

    pub fn popular(count: i64) -> Context {
        Context::Popular { count }
    }

    pub fn ratings() -> Context {
        Context::Ratings {}
    }

    pub fn rating(id: RatingId) -> Context {
        Context::Rating { id }
    }

    pub fn remove_friend(user_id: UserId, friend_id: UserId) -> Context {
        Context::RemoveFriend { user_id, friend_id }
    }

    pub fn unlike(film_id: FilmId, user_id: UserId) -> Context {
        Context::Unlike { film_id, user_id }
    }

    pub fn update_film(id: Option<FilmId>) -> Context {
        Context::UpdateFilm { id }
    }

    pub fn update_user(id: Option<UserId>) -> Context {
        Context::UpdateUser { id }
    }

    pub fn users() -> Context {
        Context::Users {}
    }

    pub fn user(id: UserId) -> Context {
        Context::User { id }
    }
}
