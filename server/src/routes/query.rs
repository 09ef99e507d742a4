use serde::Deserialize;

/// The query string accepted by `GET /films/popular`.
#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub count: Option<i64>,
}
