use chrono::{DateTime, Utc};
use serde::Serialize;
use shuttle_core::{CourtId, Game, GameStatus, SessionId, ShuttleId, Side, UserId};

use super::{CreateVars, IdVars, NoVars, SessionIdVars, UpdateVars};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShuttleUsageInput {
    pub shuttle: ShuttleId,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInput {
    pub session_id: SessionId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub status: GameStatus,
    pub winner: Option<Side>,
    #[serde(rename = "A1")]
    pub a1: UserId,
    #[serde(rename = "A2")]
    pub a2: Option<UserId>,
    #[serde(rename = "B1")]
    pub b1: UserId,
    #[serde(rename = "B2")]
    pub b2: Option<UserId>,
    pub court: CourtId,
    pub shuttles_used: Vec<ShuttleUsageInput>,
}

operation!(
    FetchGame,
    Query,
    "fetchGame",
    IdVars => Option<Game>,
    concat!("query FetchGame($id: ID!) { fetchGame(id: $id) { ", game_fields!(), " } }")
);

operation!(
    FetchGames,
    Query,
    "fetchGames",
    NoVars => Vec<Game>,
    concat!("query FetchGames { fetchGames { ", game_fields!(), " } }")
);

operation!(
    FetchGamesBySession,
    Query,
    "fetchGamesBySession",
    SessionIdVars => Vec<Game>,
    concat!(
        "query FetchGamesBySession($sessionId: ID!) { ",
        "fetchGamesBySession(sessionId: $sessionId) { ",
        game_fields!(),
        " } }"
    )
);

operation!(
    CreateGame,
    Mutation,
    "createGame",
    CreateVars<GameInput> => Game,
    concat!(
        "mutation CreateGame($input: GameInput!) { createGame(input: $input) { ",
        game_fields!(),
        " } }"
    )
);

operation!(
    UpdateGame,
    Mutation,
    "updateGame",
    UpdateVars<GameInput> => Game,
    concat!(
        "mutation UpdateGame($id: ID!, $input: GameInput!) { updateGame(id: $id, input: $input) { ",
        game_fields!(),
        " } }"
    )
);

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_game_input_wire_shape() {
        let input = GameInput {
            session_id: "s1".to_string(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            end: None,
            status: GameStatus::Ongoing,
            winner: None,
            a1: "u1".to_string(),
            a2: None,
            b1: "u2".to_string(),
            b2: None,
            court: "c1".to_string(),
            shuttles_used: vec![],
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["A1"], "u1");
        assert!(json["A2"].is_null());
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["status"], "ongoing");
        assert_eq!(json["shuttlesUsed"], serde_json::json!([]));
    }
}
