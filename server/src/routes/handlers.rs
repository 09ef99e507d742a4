use std::time::{Duration, Instant};

use log::debug;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::catalog;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::film::{FilmDraft, FilmId};
use crate::label::{GenreId, RatingId};
use crate::routes::{
    query::PopularQuery,
    rejection::{Context, Rejection},
};
use crate::social;
use crate::user::{UserDraft, UserId};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn films_list(environment: Environment) -> RouteResult {
    timed! {
        let films = catalog::list_films(&environment.db)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::films(), e))?;

        json(&films)
    }
}

pub async fn film_create(environment: Environment, draft: FilmDraft) -> RouteResult {
    timed! {
        debug!(environment.logger, "Creating film..."; "name" => &draft.name);

        let film = catalog::create_film(&environment.db, draft)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::create_film(), e))?;

        with_status(json(&film), StatusCode::CREATED)
    }
}

pub async fn film_update(environment: Environment, draft: FilmDraft) -> RouteResult {
    timed! {
        let id = draft.id;
        debug!(environment.logger, "Updating film..."; "id" => ?id);

        let film = catalog::update_film(&environment.db, draft)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::update_film(id), e))?;

        json(&film)
    }
}

pub async fn film_retrieve(environment: Environment, id: FilmId) -> RouteResult {
    timed! {
        let film = catalog::get_film(&environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::film(id), e))?;

        json(&film)
    }
}

pub async fn film_delete(environment: Environment, id: FilmId) -> RouteResult {
    timed! {
        debug!(environment.logger, "Deleting film..."; "id" => id);

        catalog::delete_film(&environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::delete_film(id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn popular(environment: Environment, query: PopularQuery) -> RouteResult {
    timed! {
        let count = query
            .count
            .unwrap_or(environment.config.popular_default_count);

        let films = catalog::top_rated(&environment.db, count)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::popular(count), e))?;

        json(&films)
    }
}

pub async fn like(environment: Environment, film_id: FilmId, user_id: UserId) -> RouteResult {
    timed! {
        debug!(environment.logger, "Recording like..."; "film_id" => film_id, "user_id" => user_id);

        catalog::like_film(&environment.db, film_id, user_id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::like(film_id, user_id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn unlike(environment: Environment, film_id: FilmId, user_id: UserId) -> RouteResult {
    timed! {
        debug!(environment.logger, "Removing like..."; "film_id" => film_id, "user_id" => user_id);

        catalog::unlike_film(&environment.db, film_id, user_id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::unlike(film_id, user_id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn users_list(environment: Environment) -> RouteResult {
    timed! {
        let users = social::list_users(&environment.db)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::users(), e))?;

        json(&users)
    }
}

pub async fn user_create(environment: Environment, draft: UserDraft) -> RouteResult {
    timed! {
        debug!(environment.logger, "Creating user..."; "login" => &draft.login);

        let user = social::create_user(&environment.db, draft)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::create_user(), e))?;

        with_status(json(&user), StatusCode::CREATED)
    }
}

pub async fn user_update(environment: Environment, draft: UserDraft) -> RouteResult {
    timed! {
        let id = draft.id;
        debug!(environment.logger, "Updating user..."; "id" => ?id);

        let user = social::update_user(&environment.db, draft)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::update_user(id), e))?;

        json(&user)
    }
}

pub async fn user_retrieve(environment: Environment, id: UserId) -> RouteResult {
    timed! {
        let user = social::get_user(&environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::user(id), e))?;

        json(&user)
    }
}

pub async fn user_delete(environment: Environment, id: UserId) -> RouteResult {
    timed! {
        debug!(environment.logger, "Deleting user..."; "id" => id);

        social::delete_user(&environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::delete_user(id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn friend_add(
    environment: Environment,
    user_id: UserId,
    friend_id: UserId,
) -> RouteResult {
    timed! {
        debug!(environment.logger, "Adding friend..."; "user_id" => user_id, "friend_id" => friend_id);

        social::add_friend(&environment.db, user_id, friend_id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::add_friend(user_id, friend_id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn friend_remove(
    environment: Environment,
    user_id: UserId,
    friend_id: UserId,
) -> RouteResult {
    timed! {
        debug!(environment.logger, "Removing friend..."; "user_id" => user_id, "friend_id" => friend_id);

        social::remove_friend(&environment.db, user_id, friend_id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::remove_friend(user_id, friend_id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn friends_list(environment: Environment, user_id: UserId) -> RouteResult {
    timed! {
        let friends = social::friends_of(&environment.db, user_id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::friends(user_id), e))?;

        json(&friends)
    }
}

pub async fn common_friends(
    environment: Environment,
    user_id: UserId,
    other_id: UserId,
) -> RouteResult {
    timed! {
        let friends = social::common_friends(&environment.db, user_id, other_id)
            .await
            .map_err(|e: BackendError| {
                Rejection::new(Context::common_friends(user_id, other_id), e)
            })?;

        json(&friends)
    }
}

pub async fn genres_list(environment: Environment) -> RouteResult {
    timed! {
        let genres = catalog::list_genres(&environment.db)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::genres(), e))?;

        // TODO make this cacheable
        json(&genres)
    }
}

pub async fn genre_retrieve(environment: Environment, id: GenreId) -> RouteResult {
    timed! {
        let genre = catalog::get_genre(&environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::genre(id), e))?;

        json(&genre)
    }
}

pub async fn ratings_list(environment: Environment) -> RouteResult {
    timed! {
        let ratings = catalog::list_ratings(&environment.db)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::ratings(), e))?;

        // TODO make this cacheable
        json(&ratings)
    }
}

pub async fn rating_retrieve(environment: Environment, id: RatingId) -> RouteResult {
    timed! {
        let rating = catalog::get_rating(&environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::rating(id), e))?;

        json(&rating)
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
