use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chrono::NaiveDate;
use futures::future::{self, BoxFuture, FutureExt};

use super::{Db, Friendship};
use crate::errors::BackendError;
use crate::film::{Film, FilmDraft, FilmId};
use crate::label::{Genre, GenreId, MpaRating, RatingId};
use crate::user::{User, UserDraft, UserId};

const LIKES_PAIR_CONSTRAINT: &str = "likes_pair";
const FRIENDSHIP_PAIR_CONSTRAINT: &str = "friendship_pair";

#[derive(Clone, Debug)]
struct FilmRow {
    name: String,
    description: Option<String>,
    release_date: NaiveDate,
    duration: i32,
    rating_id: RatingId,
    genre_ids: BTreeSet<GenreId>,
}

#[derive(Clone, Debug)]
struct UserRow {
    email: String,
    login: String,
    name: String,
    birthday: NaiveDate,
}

#[derive(Default)]
struct State {
    films: BTreeMap<FilmId, FilmRow>,
    users: BTreeMap<UserId, UserRow>,
    likes: BTreeSet<(FilmId, UserId)>,
    friendships: BTreeMap<(UserId, UserId), bool>,
    next_film_id: FilmId,
    next_user_id: UserId,
}

/// An in-memory stand-in for the relational store, seeded with the standard
/// reference data. Behaves like the Postgres implementation, including the
/// unique-constraint rejections.
pub(crate) struct MockDb {
    state: RwLock<State>,
    genres: Vec<Genre>,
    ratings: Vec<MpaRating>,
}

impl MockDb {
    pub(crate) fn new() -> Self {
        MockDb {
            state: RwLock::new(State {
                next_film_id: 1,
                next_user_id: 1,
                ..Default::default()
            }),
            genres: vec![
                Genre::new(1, "Comedy"),
                Genre::new(2, "Drama"),
                Genre::new(3, "Cartoon"),
                Genre::new(4, "Thriller"),
                Genre::new(5, "Documentary"),
                Genre::new(6, "Action"),
            ],
            ratings: vec![
                MpaRating::new(1, "G"),
                MpaRating::new(2, "PG"),
                MpaRating::new(3, "PG-13"),
                MpaRating::new(4, "R"),
                MpaRating::new(5, "NC-17"),
            ],
        }
    }

    /// Points a stored film at a rating id that does not resolve, simulating
    /// reference data removed out-of-band.
    pub(crate) fn corrupt_film_rating(&self, film_id: FilmId, rating_id: RatingId) {
        let mut state = self.state.write().unwrap();

        if let Some(film) = state.films.get_mut(&film_id) {
            film.rating_id = rating_id;
        }
    }

    fn film_from_row(&self, id: FilmId, row: &FilmRow) -> Result<Film, BackendError> {
        let mpa = self
            .ratings
            .iter()
            .find(|rating| rating.id == row.rating_id)
            .cloned()
            .ok_or(BackendError::MissingRating {
                film_id: id,
                rating_id: row.rating_id,
            })?;

        Ok(Film {
            id,
            name: row.name.clone(),
            description: row.description.clone(),
            release_date: row.release_date,
            duration: row.duration,
            mpa,
            genres: vec![],
        })
    }

    fn user_from_row(&self, id: UserId, row: &UserRow) -> User {
        User {
            id,
            email: row.email.clone(),
            login: row.login.clone(),
            name: row.name.clone(),
            birthday: row.birthday,
            friends: vec![],
            likes: vec![],
        }
    }
}

impl Db for MockDb {
    fn retrieve_films(&self) -> BoxFuture<Result<Vec<Film>, BackendError>> {
        let state = self.state.read().unwrap();

        let films = state
            .films
            .iter()
            .map(|(id, row)| self.film_from_row(*id, row))
            .collect();

        future::ready(films).boxed()
    }

    fn retrieve_film(&self, id: FilmId) -> BoxFuture<Result<Option<Film>, BackendError>> {
        let state = self.state.read().unwrap();

        let film = state
            .films
            .get(&id)
            .map(|row| self.film_from_row(id, row))
            .transpose();

        future::ready(film).boxed()
    }

    fn insert_film(&self, draft: &FilmDraft) -> BoxFuture<Result<FilmId, BackendError>> {
        let mut state = self.state.write().unwrap();

        let id = state.next_film_id;
        state.next_film_id += 1;

        let row = FilmRow {
            name: draft.name.clone(),
            description: draft.description.clone(),
            release_date: draft.release_date,
            duration: draft.duration,
            rating_id: draft.mpa.id,
            genre_ids: draft.genre_ids().into_iter().collect(),
        };
        state.films.insert(id, row);

        future::ready(Ok(id)).boxed()
    }

    fn update_film(&self, id: FilmId, draft: &FilmDraft) -> BoxFuture<Result<bool, BackendError>> {
        let mut state = self.state.write().unwrap();

        let updated = match state.films.get_mut(&id) {
            Some(row) => {
                row.name = draft.name.clone();
                row.description = draft.description.clone();
                row.release_date = draft.release_date;
                row.duration = draft.duration;
                row.rating_id = draft.mpa.id;
                row.genre_ids = draft.genre_ids().into_iter().collect();
                true
            }
            None => false,
        };

        future::ready(Ok(updated)).boxed()
    }

    fn delete_film(&self, id: FilmId) -> BoxFuture<Result<bool, BackendError>> {
        let mut state = self.state.write().unwrap();

        let deleted = state.films.remove(&id).is_some();
        state.likes.retain(|(film_id, _)| *film_id != id);

        future::ready(Ok(deleted)).boxed()
    }

    fn film_genres(&self, id: FilmId) -> BoxFuture<Result<Vec<Genre>, BackendError>> {
        let state = self.state.read().unwrap();

        let genres = state
            .films
            .get(&id)
            .map(|row| {
                row.genre_ids
                    .iter()
                    .filter_map(|genre_id| {
                        self.genres.iter().find(|genre| genre.id == *genre_id)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        future::ready(Ok(genres)).boxed()
    }

    fn top_films(&self, limit: i64) -> BoxFuture<Result<Vec<Film>, BackendError>> {
        let state = self.state.read().unwrap();

        let mut ranked: Vec<(usize, FilmId)> = state
            .films
            .keys()
            .map(|id| {
                let count = state.likes.iter().filter(|(film_id, _)| film_id == id).count();
                (count, *id)
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.truncate(limit.max(0) as usize);

        let films = ranked
            .into_iter()
            .map(|(_, id)| self.film_from_row(id, &state.films[&id]))
            .collect();

        future::ready(films).boxed()
    }

    fn insert_like(&self, film_id: FilmId, user_id: UserId) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        let result = if state.likes.insert((film_id, user_id)) {
            Ok(())
        } else {
            Err(BackendError::UniqueViolation {
                constraint: LIKES_PAIR_CONSTRAINT.to_owned(),
            })
        };

        future::ready(result).boxed()
    }

    fn delete_like(&self, film_id: FilmId, user_id: UserId) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        state.likes.remove(&(film_id, user_id));

        future::ready(Ok(())).boxed()
    }

    fn has_like(&self, film_id: FilmId, user_id: UserId) -> BoxFuture<Result<bool, BackendError>> {
        let state = self.state.read().unwrap();

        let exists = state.likes.contains(&(film_id, user_id));

        future::ready(Ok(exists)).boxed()
    }

    fn user_likes(&self, user_id: UserId) -> BoxFuture<Result<Vec<FilmId>, BackendError>> {
        let state = self.state.read().unwrap();

        let likes = state
            .likes
            .iter()
            .filter(|(_, liker)| *liker == user_id)
            .map(|(film_id, _)| *film_id)
            .collect();

        future::ready(Ok(likes)).boxed()
    }

    fn retrieve_users(&self) -> BoxFuture<Result<Vec<User>, BackendError>> {
        let state = self.state.read().unwrap();

        let users = state
            .users
            .iter()
            .map(|(id, row)| self.user_from_row(*id, row))
            .collect();

        future::ready(Ok(users)).boxed()
    }

    fn retrieve_user(&self, id: UserId) -> BoxFuture<Result<Option<User>, BackendError>> {
        let state = self.state.read().unwrap();

        let user = state.users.get(&id).map(|row| self.user_from_row(id, row));

        future::ready(Ok(user)).boxed()
    }

    fn insert_user(&self, draft: &UserDraft) -> BoxFuture<Result<UserId, BackendError>> {
        let mut state = self.state.write().unwrap();

        let id = state.next_user_id;
        state.next_user_id += 1;

        let row = UserRow {
            email: draft.email.clone(),
            login: draft.login.clone(),
            name: draft.effective_name().to_owned(),
            birthday: draft.birthday,
        };
        state.users.insert(id, row);

        future::ready(Ok(id)).boxed()
    }

    fn update_user(&self, id: UserId, draft: &UserDraft) -> BoxFuture<Result<bool, BackendError>> {
        let mut state = self.state.write().unwrap();

        let name = draft.effective_name().to_owned();
        let updated = match state.users.get_mut(&id) {
            Some(row) => {
                row.email = draft.email.clone();
                row.login = draft.login.clone();
                row.name = name;
                row.birthday = draft.birthday;
                true
            }
            None => false,
        };

        future::ready(Ok(updated)).boxed()
    }

    fn delete_user(&self, id: UserId) -> BoxFuture<Result<bool, BackendError>> {
        let mut state = self.state.write().unwrap();

        let deleted = state.users.remove(&id).is_some();
        state.likes.retain(|(_, user_id)| *user_id != id);
        state
            .friendships
            .retain(|(initiator, friend), _| *initiator != id && *friend != id);

        future::ready(Ok(deleted)).boxed()
    }

    fn retrieve_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<Option<Friendship>, BackendError>> {
        let state = self.state.read().unwrap();

        let edge = state
            .friendships
            .get(&(initiator, friend))
            .map(|confirmed| Friendship {
                initiator_user_id: initiator,
                friend_user_id: friend,
                confirmed: *confirmed,
            });

        future::ready(Ok(edge)).boxed()
    }

    fn insert_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        let result = if state.friendships.contains_key(&(initiator, friend)) {
            Err(BackendError::UniqueViolation {
                constraint: FRIENDSHIP_PAIR_CONSTRAINT.to_owned(),
            })
        } else {
            state.friendships.insert((initiator, friend), false);
            Ok(())
        };

        future::ready(result).boxed()
    }

    fn confirm_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        state.friendships.insert((initiator, friend), true);

        if let Some(confirmed) = state.friendships.get_mut(&(friend, initiator)) {
            *confirmed = true;
        }

        future::ready(Ok(())).boxed()
    }

    fn delete_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<bool, BackendError>> {
        let mut state = self.state.write().unwrap();

        let deleted = state.friendships.remove(&(initiator, friend)).is_some();

        future::ready(Ok(deleted)).boxed()
    }

    fn demote_friendship(
        &self,
        initiator: UserId,
        friend: UserId,
    ) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        if let Some(confirmed) = state.friendships.get_mut(&(initiator, friend)) {
            *confirmed = false;
        }

        future::ready(Ok(())).boxed()
    }

    fn friend_ids(&self, user_id: UserId) -> BoxFuture<Result<Vec<UserId>, BackendError>> {
        let state = self.state.read().unwrap();

        let ids = state
            .friendships
            .keys()
            .filter(|(initiator, _)| *initiator == user_id)
            .map(|(_, friend)| *friend)
            .collect();

        future::ready(Ok(ids)).boxed()
    }

    fn retrieve_genres(&self) -> BoxFuture<Result<Vec<Genre>, BackendError>> {
        future::ready(Ok(self.genres.clone())).boxed()
    }

    fn retrieve_genre(&self, id: GenreId) -> BoxFuture<Result<Option<Genre>, BackendError>> {
        let genre = self.genres.iter().find(|genre| genre.id == id).cloned();

        future::ready(Ok(genre)).boxed()
    }

    fn retrieve_ratings(&self) -> BoxFuture<Result<Vec<MpaRating>, BackendError>> {
        future::ready(Ok(self.ratings.clone())).boxed()
    }

    fn retrieve_rating(&self, id: RatingId) -> BoxFuture<Result<Option<MpaRating>, BackendError>> {
        let rating = self.ratings.iter().find(|rating| rating.id == id).cloned();

        future::ready(Ok(rating)).boxed()
    }
}
