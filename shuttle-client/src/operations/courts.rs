use serde::Serialize;
use shuttle_core::Court;

use super::{CreateVars, IdVars, NoVars, UpdateVars};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CourtInput {
    pub name: String,
    pub price: f64,
    pub active: bool,
}

operation!(
    FetchCourts,
    Query,
    "fetchCourts",
    NoVars => Vec<Court>,
    concat!("query FetchCourts { fetchCourts { ", court_fields!(), " } }")
);

operation!(
    FetchCourt,
    Query,
    "fetchCourt",
    IdVars => Option<Court>,
    concat!("query FetchCourt($id: ID!) { fetchCourt(id: $id) { ", court_fields!(), " } }")
);

operation!(
    CreateCourt,
    Mutation,
    "createCourt",
    CreateVars<CourtInput> => Court,
    concat!(
        "mutation CreateCourt($input: CourtInput!) { createCourt(input: $input) { ",
        court_fields!(),
        " } }"
    )
);

operation!(
    UpdateCourt,
    Mutation,
    "updateCourt",
    UpdateVars<CourtInput> => Court,
    concat!(
        "mutation UpdateCourt($id: ID!, $input: CourtInput!) { updateCourt(id: $id, input: $input) { ",
        court_fields!(),
        " } }"
    )
);
