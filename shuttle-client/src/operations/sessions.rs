use serde::Serialize;
use shuttle_core::{CourtId, Session, SessionId, ShuttleId, UserId};

use super::{CreateVars, IdVars, NoVars};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionInput {
    pub court: Option<CourtId>,
    pub shuttle: Option<ShuttleId>,
    pub available_players: Vec<UserId>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayersVars {
    pub id: SessionId,
    pub player_ids: Vec<UserId>,
}

operation!(
    FetchSessions,
    Query,
    "fetchSessions",
    NoVars => Vec<Session>,
    concat!("query FetchSessions { fetchSessions { ", session_fields!(), " } }")
);

operation!(
    FetchSession,
    Query,
    "fetchSession",
    IdVars => Option<Session>,
    concat!(
        "query FetchSession($id: ID!) { fetchSession(id: $id) { ",
        session_fields!(),
        " } }"
    )
);

operation!(
    StartSession,
    Mutation,
    "startSession",
    CreateVars<StartSessionInput> => Session,
    concat!(
        "mutation StartSession($input: StartSessionInput!) { startSession(input: $input) { ",
        session_fields!(),
        " } }"
    )
);

operation!(
    EndSession,
    Mutation,
    "endSession",
    IdVars => Session,
    concat!(
        "mutation EndSession($id: ID!) { endSession(id: $id) { ",
        session_fields!(),
        " } }"
    )
);

operation!(
    AddPlayersToSession,
    Mutation,
    "addPlayersToSession",
    AddPlayersVars => Session,
    concat!(
        "mutation AddPlayersToSession($id: ID!, $playerIds: [ID!]!) { ",
        "addPlayersToSession(id: $id, playerIds: $playerIds) { ",
        session_fields!(),
        " } }"
    )
);
