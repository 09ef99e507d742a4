use futures::future::BoxFuture;

use crate::errors::BackendError;
use crate::film::{Film, FilmDraft, FilmId};
use crate::label::{Genre, GenreId, MpaRating, RatingId};
use crate::user::{User, UserDraft, UserId};

/// A directed friendship edge between two users.
#[derive(Clone, Copy, Debug)]
pub struct Friendship {
    /// The user who sent the request.
    pub initiator_user_id: UserId,

    /// The user on the receiving end.
    pub friend_user_id: UserId,

    /// Whether the reverse edge also exists, making the relationship mutual.
    pub confirmed: bool,
}

pub trait Db {
    fn retrieve_films(&self) -> BoxFuture<Result<Vec<Film>, BackendError>>;

    fn retrieve_film(&self, id: FilmId) -> BoxFuture<Result<Option<Film>, BackendError>>;

    fn insert_film(&self, draft: &FilmDraft) -> BoxFuture<Result<FilmId, BackendError>>;

    fn update_film(&self, id: FilmId, draft: &FilmDraft)
        -> BoxFuture<Result<bool, BackendError>>;

    fn delete_film(&self, id: FilmId) -> BoxFuture<Result<bool, BackendError>>;

    fn film_genres(&self, id: FilmId) -> BoxFuture<Result<Vec<Genre>, BackendError>>;

    fn top_films(&self, limit: i64) -> BoxFuture<Result<Vec<Film>, BackendError>>;

    fn insert_like(&self, film_id: FilmId, user_id: UserId)
        -> BoxFuture<Result<(), BackendError>>;

    fn delete_like(&self, film_id: FilmId, user_id: UserId)
        -> BoxFuture<Result<(), BackendError>>;

    fn has_like(&self, film_id: FilmId, user_id: UserId)
        -> BoxFuture<Result<bool, BackendError>>;

    fn user_likes(&self, user_id: UserId) -> BoxFuture<Result<Vec<FilmId>, BackendError>>;

    fn retrieve_users(&self) -> BoxFuture<Result<Vec<User>, BackendError>>;

    fn retrieve_user(&self, id: UserId) -> BoxFuture<Result<Option<User>, BackendError>>;

    fn insert_user(&self, draft: &UserDraft) -> BoxFuture<Result<UserId, BackendError>>;

    fn update_user(&self, id: UserId, draft: &UserDraft)
        -> BoxFuture<Result<bool, BackendError>>;

    fn delete_user(&self, id: UserId) -> BoxFuture<Result<bool, BackendError>>;

    fn retrieve_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<Option<Friendship>, BackendError>>;

    fn insert_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<(), BackendError>>;

    fn confirm_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<(), BackendError>>;

    fn delete_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<bool, BackendError>>;

    fn demote_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<(), BackendError>>;

    fn friend_ids(&self, user_id: UserId) -> BoxFuture<Result<Vec<UserId>, BackendError>>;

    fn retrieve_genres(&self) -> BoxFuture<Result<Vec<Genre>, BackendError>>;

    fn retrieve_genre(&self, id: GenreId) -> BoxFuture<Result<Option<Genre>, BackendError>>;

    fn retrieve_ratings(&self) -> BoxFuture<Result<Vec<MpaRating>, BackendError>>;

    fn retrieve_rating(&self, id: RatingId)
        -> BoxFuture<Result<Option<MpaRating>, BackendError>>;
}

#[cfg(test)]
pub(crate) mod mock;

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::postgres::{PgPool, PgRow};

    use super::Friendship;
    use crate::errors::BackendError;
    use crate::film::{Film, FilmDraft, FilmId};
    use crate::label::{Genre, GenreId, MpaRating, RatingId};
    use crate::user::{User, UserDraft, UserId};

    const LIKES_PAIR_CONSTRAINT: &str = "likes_pair";
    const FRIENDSHIP_PAIR_CONSTRAINT: &str = "friendship_pair";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn retrieve_films(&self) -> BoxFuture<Result<Vec<Film>, BackendError>> {
            async move {
                let films = sqlx::query(include_str!("queries/retrieve_films.sql"))
                    .try_map(|row: PgRow| film_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(films)
            }
            .boxed()
        }

        fn retrieve_film(&self, id: FilmId) -> BoxFuture<Result<Option<Film>, BackendError>> {
            async move {
                let film = sqlx::query(include_str!("queries/retrieve_film.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| film_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(film)
            }
            .boxed()
        }

        fn insert_film(&self, draft: &FilmDraft) -> BoxFuture<Result<FilmId, BackendError>> {
            let draft = draft.clone();

            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let (id,): (FilmId,) = sqlx::query_as(include_str!("queries/create_film.sql"))
                    .bind(&draft.name)
                    .bind(&draft.description)
                    .bind(draft.release_date)
                    .bind(draft.duration)
                    .bind(draft.mpa.id)
                    .fetch_one(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                replace_genres(&mut tx, id, &draft.genre_ids()).await?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(id)
            }
            .boxed()
        }

        fn update_film(
            &self,
            id: FilmId,
            draft: &FilmDraft,
        ) -> BoxFuture<Result<bool, BackendError>> {
            let draft = draft.clone();

            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let updated = sqlx::query(include_str!("queries/update_film.sql"))
                    .bind(id)
                    .bind(&draft.name)
                    .bind(&draft.description)
                    .bind(draft.release_date)
                    .bind(draft.duration)
                    .bind(draft.mpa.id)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if updated == 0 {
                    return Ok(false);
                }

                sqlx::query(include_str!("queries/clear_film_genres.sql"))
                    .bind(id)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                replace_genres(&mut tx, id, &draft.genre_ids()).await?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(true)
            }
            .boxed()
        }

        fn delete_film(&self, id: FilmId) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let deleted = sqlx::query(include_str!("queries/delete_film.sql"))
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                Ok(deleted > 0)
            }
            .boxed()
        }

        fn film_genres(&self, id: FilmId) -> BoxFuture<Result<Vec<Genre>, BackendError>> {
            async move {
                let genres = sqlx::query(include_str!("queries/film_genres.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| {
                        Ok(Genre {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                        })
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(genres)
            }
            .boxed()
        }

        fn top_films(&self, limit: i64) -> BoxFuture<Result<Vec<Film>, BackendError>> {
            async move {
                let films = sqlx::query(include_str!("queries/top_films.sql"))
                    .bind(limit)
                    .try_map(|row: PgRow| film_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(films)
            }
            .boxed()
        }

        fn insert_like(
            &self,
            film_id: FilmId,
            user_id: UserId,
        ) -> BoxFuture<Result<(), BackendError>> {
            async move {
                sqlx::query(include_str!("queries/create_like.sql"))
                    .bind(film_id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn delete_like(
            &self,
            film_id: FilmId,
            user_id: UserId,
        ) -> BoxFuture<Result<(), BackendError>> {
            async move {
                sqlx::query(include_str!("queries/delete_like.sql"))
                    .bind(film_id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn has_like(
            &self,
            film_id: FilmId,
            user_id: UserId,
        ) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let (exists,): (bool,) =
                    sqlx::query_as(include_str!("queries/has_like.sql"))
                        .bind(film_id)
                        .bind(user_id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(exists)
            }
            .boxed()
        }

        fn user_likes(&self, user_id: UserId) -> BoxFuture<Result<Vec<FilmId>, BackendError>> {
            async move {
                let likes: Vec<(FilmId,)> =
                    sqlx::query_as(include_str!("queries/user_likes.sql"))
                        .bind(user_id)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(likes.into_iter().map(|(film_id,)| film_id).collect())
            }
            .boxed()
        }

        fn retrieve_users(&self) -> BoxFuture<Result<Vec<User>, BackendError>> {
            async move {
                let users = sqlx::query(include_str!("queries/retrieve_users.sql"))
                    .try_map(|row: PgRow| user_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(users)
            }
            .boxed()
        }

        fn retrieve_user(&self, id: UserId) -> BoxFuture<Result<Option<User>, BackendError>> {
            async move {
                let user = sqlx::query(include_str!("queries/retrieve_user.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| user_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(user)
            }
            .boxed()
        }

        fn insert_user(&self, draft: &UserDraft) -> BoxFuture<Result<UserId, BackendError>> {
            let draft = draft.clone();

            async move {
                let name = draft.effective_name().to_owned();

                let (id,): (UserId,) = sqlx::query_as(include_str!("queries/create_user.sql"))
                    .bind(&draft.email)
                    .bind(&draft.login)
                    .bind(name)
                    .bind(draft.birthday)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(id)
            }
            .boxed()
        }

        fn update_user(
            &self,
            id: UserId,
            draft: &UserDraft,
        ) -> BoxFuture<Result<bool, BackendError>> {
            let draft = draft.clone();

            async move {
                let name = draft.effective_name().to_owned();

                let updated = sqlx::query(include_str!("queries/update_user.sql"))
                    .bind(id)
                    .bind(&draft.email)
                    .bind(&draft.login)
                    .bind(name)
                    .bind(draft.birthday)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                Ok(updated > 0)
            }
            .boxed()
        }

        fn delete_user(&self, id: UserId) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let deleted = sqlx::query(include_str!("queries/delete_user.sql"))
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                Ok(deleted > 0)
            }
            .boxed()
        }

        fn retrieve_friendship(
            &self,
            initiator: UserId,
            friend: UserId,
        ) -> BoxFuture<Result<Option<Friendship>, BackendError>> {
            async move {
                let edge = sqlx::query(include_str!("queries/retrieve_friendship.sql"))
                    .bind(initiator)
                    .bind(friend)
                    .try_map(|row: PgRow| {
                        Ok(Friendship {
                            initiator_user_id: try_get(&row, "initiator_user_id")?,
                            friend_user_id: try_get(&row, "friend_user_id")?,
                            confirmed: try_get(&row, "confirmed")?,
                        })
                    })
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(edge)
            }
            .boxed()
        }

        fn insert_friendship(
            &self,
            initiator: UserId,
            friend: UserId,
        ) -> BoxFuture<Result<(), BackendError>> {
            async move {
                sqlx::query(include_str!("queries/create_friendship.sql"))
                    .bind(initiator)
                    .bind(friend)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn confirm_friendship(
            &self,
            initiator: UserId,
            friend: UserId,
        ) -> BoxFuture<Result<(), BackendError>> {
            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                sqlx::query(include_str!("queries/confirm_friendship.sql"))
                    .bind(initiator)
                    .bind(friend)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                sqlx::query(include_str!("queries/confirm_reverse_friendship.sql"))
                    .bind(friend)
                    .bind(initiator)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn delete_friendship(
            &self,
            initiator: UserId,
            friend: UserId,
        ) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let deleted = sqlx::query(include_str!("queries/delete_friendship.sql"))
                    .bind(initiator)
                    .bind(friend)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                Ok(deleted > 0)
            }
            .boxed()
        }

        fn demote_friendship(
            &self,
            initiator: UserId,
            friend: UserId,
        ) -> BoxFuture<Result<(), BackendError>> {
            async move {
                sqlx::query(include_str!("queries/demote_friendship.sql"))
                    .bind(initiator)
                    .bind(friend)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn friend_ids(&self, user_id: UserId) -> BoxFuture<Result<Vec<UserId>, BackendError>> {
            async move {
                let ids: Vec<(UserId,)> =
                    sqlx::query_as(include_str!("queries/friend_ids.sql"))
                        .bind(user_id)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;

                Ok(ids.into_iter().map(|(id,)| id).collect())
            }
            .boxed()
        }

        fn retrieve_genres(&self) -> BoxFuture<Result<Vec<Genre>, BackendError>> {
            async move {
                let genres = sqlx::query(include_str!("queries/retrieve_genres.sql"))
                    .try_map(|row: PgRow| {
                        Ok(Genre {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                        })
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(genres)
            }
            .boxed()
        }

        fn retrieve_genre(&self, id: GenreId) -> BoxFuture<Result<Option<Genre>, BackendError>> {
            async move {
                let genre = sqlx::query(include_str!("queries/retrieve_genre.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| {
                        Ok(Genre {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                        })
                    })
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(genre)
            }
            .boxed()
        }

        fn retrieve_ratings(&self) -> BoxFuture<Result<Vec<MpaRating>, BackendError>> {
            async move {
                let ratings = sqlx::query(include_str!("queries/retrieve_ratings.sql"))
                    .try_map(|row: PgRow| {
                        Ok(MpaRating {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                        })
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(ratings)
            }
            .boxed()
        }

        fn retrieve_rating(
            &self,
            id: RatingId,
        ) -> BoxFuture<Result<Option<MpaRating>, BackendError>> {
            async move {
                let rating = sqlx::query(include_str!("queries/retrieve_rating.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| {
                        Ok(MpaRating {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                        })
                    })
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(rating)
            }
            .boxed()
        }
    }

    async fn replace_genres(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        film_id: FilmId,
        genre_ids: &[GenreId],
    ) -> Result<(), BackendError> {
        for genre_id in genre_ids {
            sqlx::query(include_str!("queries/add_film_genre.sql"))
                .bind(film_id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        Ok(())
    }

    fn film_from_row(row: &PgRow) -> Result<Film, sqlx::Error> {
        let id: FilmId = try_get(row, "id")?;
        let rating_id: RatingId = try_get(row, "rating_id")?;
        let rating_name: Option<String> = try_get(row, "rating_name")?;

        // the foreign key makes this unreachable unless the rating row was
        // removed out-of-band
        let rating_name = rating_name.ok_or_else(|| {
            sqlx::Error::Decode(Box::new(BackendError::MissingRating { film_id: id, rating_id }))
        })?;

        Ok(Film {
            id,
            name: try_get(row, "name")?,
            description: try_get(row, "description")?,
            release_date: try_get(row, "release_date")?,
            duration: try_get(row, "duration")?,
            mpa: MpaRating {
                id: rating_id,
                name: rating_name,
            },
            genres: vec![],
        })
    }

    fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
        Ok(User {
            id: try_get(row, "id")?,
            email: try_get(row, "email")?,
            login: try_get(row, "login")?,
            name: try_get(row, "name")?,
            birthday: try_get(row, "birthday")?,
            friends: vec![],
            likes: vec![],
        })
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e) if e.constraint() == Some(LIKES_PAIR_CONSTRAINT) => {
                BackendError::UniqueViolation {
                    constraint: LIKES_PAIR_CONSTRAINT.to_owned(),
                }
            }
            Error::Database(ref e) if e.constraint() == Some(FRIENDSHIP_PAIR_CONSTRAINT) => {
                BackendError::UniqueViolation {
                    constraint: FRIENDSHIP_PAIR_CONSTRAINT.to_owned(),
                }
            }
            Error::Decode(e) => match e.downcast::<BackendError>() {
                Ok(backend) => *backend,
                Err(e) => BackendError::Sqlx {
                    source: Error::Decode(e),
                },
            },
            _ => BackendError::Sqlx { source: error },
        }
    }
}
