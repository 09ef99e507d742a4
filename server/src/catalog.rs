//! The film side of the service: catalog CRUD, the like ledger, the
//! popularity ranking, and the read-only reference data.

use crate::db::Db;
use crate::environment::SafeDb;
use crate::errors::BackendError;
use crate::film::{Film, FilmDraft, FilmId};
use crate::label::{Genre, GenreId, MpaRating, RatingId};
use crate::user::UserId;

pub async fn list_films(db: &SafeDb) -> Result<Vec<Film>, BackendError> {
    let mut films = db.retrieve_films().await?;

    attach_genres(db, &mut films).await?;

    Ok(films)
}

pub async fn get_film(db: &SafeDb, id: FilmId) -> Result<Film, BackendError> {
    let mut film = db
        .retrieve_film(id)
        .await?
        .ok_or(BackendError::FilmNotFound(id))?;

    film.genres = db.film_genres(id).await?;

    Ok(film)
}

pub async fn create_film(db: &SafeDb, draft: FilmDraft) -> Result<Film, BackendError> {
    draft.validate()?;
    resolve_references(db, &draft).await?;

    let id = db.insert_film(&draft).await?;

    get_film(db, id).await
}

pub async fn update_film(db: &SafeDb, draft: FilmDraft) -> Result<Film, BackendError> {
    let id = draft.id.ok_or(BackendError::MissingId)?;

    draft.validate()?;
    resolve_references(db, &draft).await?;

    if !db.update_film(id, &draft).await? {
        return Err(BackendError::FilmNotFound(id));
    }

    get_film(db, id).await
}

pub async fn delete_film(db: &SafeDb, id: FilmId) -> Result<(), BackendError> {
    if !db.delete_film(id).await? {
        return Err(BackendError::FilmNotFound(id));
    }

    Ok(())
}

pub async fn like_film(db: &SafeDb, film_id: FilmId, user_id: UserId) -> Result<(), BackendError> {
    ensure_film_exists(db, film_id).await?;
    ensure_user_exists(db, user_id).await?;

    if db.has_like(film_id, user_id).await? {
        return Err(BackendError::DuplicateLike { film_id, user_id });
    }

    db.insert_like(film_id, user_id).await
}

pub async fn unlike_film(
    db: &SafeDb,
    film_id: FilmId,
    user_id: UserId,
) -> Result<(), BackendError> {
    ensure_film_exists(db, film_id).await?;
    ensure_user_exists(db, user_id).await?;

    if !db.has_like(film_id, user_id).await? {
        return Err(BackendError::LikeNotFound { film_id, user_id });
    }

    db.delete_like(film_id, user_id).await
}

/// Returns up to `count` films ordered by like count descending, ties
/// broken by ascending film id. A non-positive count yields nothing.
pub async fn top_rated(db: &SafeDb, count: i64) -> Result<Vec<Film>, BackendError> {
    if count <= 0 {
        return Ok(vec![]);
    }

    let mut films = db.top_films(count).await?;

    attach_genres(db, &mut films).await?;

    Ok(films)
}

pub async fn list_genres(db: &SafeDb) -> Result<Vec<Genre>, BackendError> {
    db.retrieve_genres().await
}

pub async fn get_genre(db: &SafeDb, id: GenreId) -> Result<Genre, BackendError> {
    db.retrieve_genre(id)
        .await?
        .ok_or(BackendError::GenreNotFound(id))
}

pub async fn list_ratings(db: &SafeDb) -> Result<Vec<MpaRating>, BackendError> {
    db.retrieve_ratings().await
}

pub async fn get_rating(db: &SafeDb, id: RatingId) -> Result<MpaRating, BackendError> {
    db.retrieve_rating(id)
        .await?
        .ok_or(BackendError::RatingNotFound(id))
}

/// Checks that the rating and genre ids in a draft all resolve against the
/// reference data.
async fn resolve_references(db: &SafeDb, draft: &FilmDraft) -> Result<(), BackendError> {
    db.retrieve_rating(draft.mpa.id)
        .await?
        .ok_or(BackendError::RatingNotFound(draft.mpa.id))?;

    for genre_id in draft.genre_ids() {
        db.retrieve_genre(genre_id)
            .await?
            .ok_or(BackendError::GenreNotFound(genre_id))?;
    }

    Ok(())
}

async fn attach_genres(db: &SafeDb, films: &mut [Film]) -> Result<(), BackendError> {
    for film in films.iter_mut() {
        film.genres = db.film_genres(film.id).await?;
    }

    Ok(())
}

async fn ensure_film_exists(db: &SafeDb, id: FilmId) -> Result<(), BackendError> {
    db.retrieve_film(id)
        .await?
        .ok_or(BackendError::FilmNotFound(id))?;

    Ok(())
}

async fn ensure_user_exists(db: &SafeDb, id: UserId) -> Result<(), BackendError> {
    db.retrieve_user(id)
        .await?
        .ok_or(BackendError::UserNotFound(id))?;

    Ok(())
}
