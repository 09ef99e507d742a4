use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum request body size to accept. This should be enforced by
/// the HTTP gateway, so on the Rust side it’s set to an unreasonably
/// large number.
const MAX_CONTENT_LENGTH: u64 = 2 * 1024 * 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        BlankFilmName
        | DescriptionTooLong { .. }
        | ReleaseDateTooEarly { .. }
        | NonPositiveDuration { .. }
        | InvalidEmail { .. }
        | InvalidLogin { .. }
        | BirthdayInFuture { .. }
        | MissingId
        | SelfFriendship { .. } => StatusCode::BAD_REQUEST,
        FilmNotFound(..) | UserNotFound(..) | GenreNotFound(..) | RatingNotFound(..) => {
            StatusCode::NOT_FOUND
        }
        DuplicateLike { .. } | LikeNotFound { .. } | UniqueViolation { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use serde::de::DeserializeOwned;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post, put, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;
    use crate::film::FilmId;
    use crate::label::{GenreId, RatingId};
    use crate::user::UserId;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    fn body<T: DeserializeOwned + Send>(
    ) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
        warp::body::content_length_limit(MAX_CONTENT_LENGTH).and(warp::body::json())
    }

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let $route_variable = warp::any()
                .map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_films_list_route => films_list, rt; p("films"), end(), g());
    route!(make_film_create_route => film_create, rt; p("films"), end(), post(), body());
    route!(make_film_update_route => film_update, rt; p("films"), end(), put(), body());
    route!(make_popular_route => popular, rt; p!("films" / "popular"), query::<q::PopularQuery>(), end(), g());
    route!(make_film_retrieve_route => film_retrieve, rt; p("films"), par::<FilmId>(), end(), g());
    route!(make_film_delete_route => film_delete, rt; p("films"), par::<FilmId>(), end(), delete());
    route!(make_like_route => like, rt; p!("films" / FilmId / "like" / UserId), end(), put());
    route!(make_unlike_route => unlike, rt; p!("films" / FilmId / "like" / UserId), end(), delete());

    route!(make_users_list_route => users_list, rt; p("users"), end(), g());
    route!(make_user_create_route => user_create, rt; p("users"), end(), post(), body());
    route!(make_user_update_route => user_update, rt; p("users"), end(), put(), body());
    route!(make_user_retrieve_route => user_retrieve, rt; p("users"), par::<UserId>(), end(), g());
    route!(make_user_delete_route => user_delete, rt; p("users"), par::<UserId>(), end(), delete());
    route!(make_common_friends_route => common_friends, rt; p!("users" / UserId / "friends" / "common" / UserId), end(), g());
    route!(make_friends_list_route => friends_list, rt; p!("users" / UserId / "friends"), end(), g());
    route!(make_friend_add_route => friend_add, rt; p!("users" / UserId / "friends" / UserId), end(), put());
    route!(make_friend_remove_route => friend_remove, rt; p!("users" / UserId / "friends" / UserId), end(), delete());

    route!(make_genres_list_route => genres_list, rt; p("genres"), end(), g());
    route!(make_genre_retrieve_route => genre_retrieve, rt; p("genres"), par::<GenreId>(), end(), g());
    route!(make_ratings_list_route => ratings_list, rt; p("mpa"), end(), g());
    route!(make_rating_retrieve_route => rating_retrieve, rt; p("mpa"), par::<RatingId>(), end(), g());
}
