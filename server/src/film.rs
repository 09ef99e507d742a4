use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::errors::BackendError;
use crate::label::{Genre, GenreId, MpaRating, RatingId};

/// The id of a film row.
pub type FilmId = i64;

/// The maximum accepted description length, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

lazy_static! {
    /// The premiere date of the first film ever shown. Nothing can have
    /// been released earlier.
    pub static ref EARLIEST_RELEASE_DATE: NaiveDate =
        NaiveDate::from_ymd_opt(1895, 12, 28).expect("valid calendar date");
}

/// A single film in the catalog, with its rating and genres resolved.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    /// The id of the film.
    pub id: FilmId,

    /// The title.
    pub name: String,

    /// The synopsis, if any.
    pub description: Option<String>,

    /// The theatrical release date.
    pub release_date: NaiveDate,

    /// The running time in minutes.
    pub duration: i32,

    /// The resolved MPA rating.
    pub mpa: MpaRating,

    /// The resolved genres, deduplicated and ordered by genre id.
    pub genres: Vec<Genre>,
}

/// A client-submitted reference to an MPA rating by id.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct RatingRef {
    pub id: RatingId,
}

/// A client-submitted reference to a genre by id.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GenreRef {
    pub id: GenreId,
}

/// A film as submitted by a client, before its rating and genre ids are
/// resolved against reference data.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmDraft {
    /// The id of the film. Absent on creation, required on update.
    pub id: Option<FilmId>,

    /// The title.
    pub name: String,

    /// The synopsis, if any.
    #[serde(default)]
    pub description: Option<String>,

    /// The theatrical release date.
    pub release_date: NaiveDate,

    /// The running time in minutes.
    pub duration: i32,

    /// The MPA rating reference.
    pub mpa: RatingRef,

    /// The genre references, in any order, possibly with duplicates.
    #[serde(default)]
    pub genres: Vec<GenreRef>,
}

impl FilmDraft {
    /// Checks the field-level rules that need no reference data.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.name.trim().is_empty() {
            return Err(BackendError::BlankFilmName);
        }

        if let Some(description) = &self.description {
            let length = description.chars().count();

            if length > MAX_DESCRIPTION_LENGTH {
                return Err(BackendError::DescriptionTooLong {
                    length,
                    limit: MAX_DESCRIPTION_LENGTH,
                });
            }
        }

        if self.release_date < *EARLIEST_RELEASE_DATE {
            return Err(BackendError::ReleaseDateTooEarly {
                date: self.release_date,
                earliest: *EARLIEST_RELEASE_DATE,
            });
        }

        if self.duration <= 0 {
            return Err(BackendError::NonPositiveDuration {
                duration: self.duration,
            });
        }

        Ok(())
    }

    /// Returns the submitted genre ids, deduplicated and in ascending order.
    pub fn genre_ids(&self) -> Vec<GenreId> {
        let mut ids: Vec<GenreId> = self.genres.iter().map(|genre| genre.id).collect();

        ids.sort_unstable();
        ids.dedup();

        ids
    }
}
