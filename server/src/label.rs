use serde::{Deserialize, Serialize};

/// The id of a genre row.
pub type GenreId = i32;

/// The id of an MPA rating row.
pub type RatingId = i32;

/// A film genre. Static reference data, read-only from this service's
/// perspective.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

impl Genre {
    pub fn new(id: GenreId, name: impl Into<String>) -> Self {
        Genre {
            id,
            name: name.into(),
        }
    }
}

/// An MPA content rating. Static reference data.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MpaRating {
    pub id: RatingId,
    pub name: String,
}

impl MpaRating {
    pub fn new(id: RatingId, name: impl Into<String>) -> Self {
        MpaRating {
            id,
            name: name.into(),
        }
    }
}
