use serde::Serialize;
use shuttle_core::Shuttle;

use super::{CreateVars, IdVars, NoVars, UpdateVars};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShuttleInput {
    pub name: String,
    pub price: f64,
    pub active: bool,
}

operation!(
    FetchShuttles,
    Query,
    "fetchShuttles",
    NoVars => Vec<Shuttle>,
    concat!("query FetchShuttles { fetchShuttles { ", shuttle_fields!(), " } }")
);

operation!(
    FetchShuttle,
    Query,
    "fetchShuttle",
    IdVars => Option<Shuttle>,
    concat!(
        "query FetchShuttle($id: ID!) { fetchShuttle(id: $id) { ",
        shuttle_fields!(),
        " } }"
    )
);

operation!(
    CreateShuttle,
    Mutation,
    "createShuttle",
    CreateVars<ShuttleInput> => Shuttle,
    concat!(
        "mutation CreateShuttle($input: ShuttleInput!) { createShuttle(input: $input) { ",
        shuttle_fields!(),
        " } }"
    )
);

operation!(
    UpdateShuttle,
    Mutation,
    "updateShuttle",
    UpdateVars<ShuttleInput> => Shuttle,
    concat!(
        "mutation UpdateShuttle($id: ID!, $input: ShuttleInput!) { ",
        "updateShuttle(id: $id, input: $input) { ",
        shuttle_fields!(),
        " } }"
    )
);
