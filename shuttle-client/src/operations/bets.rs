use serde::Serialize;
use shuttle_core::{Bet, GameId, UserId};

use super::{CreateVars, GameIdVars, IdVars, NoVars, SessionIdVars, UpdateVars};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetInput {
    pub game_id: GameId,
    pub bet_type: String,
    pub bet_amount: f64,
    pub paid: bool,
    pub bettor_for_a: UserId,
    pub bettor_for_b: UserId,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetUpdateInput {
    pub bet_type: String,
    pub bet_amount: f64,
    pub paid: bool,
    pub active: bool,
    pub bettor_for_a: UserId,
    pub bettor_for_b: UserId,
}

operation!(
    FetchBet,
    Query,
    "fetchBet",
    IdVars => Option<Bet>,
    concat!("query FetchBet($id: ID!) { fetchBet(id: $id) { ", bet_fields!(), " } }")
);

operation!(
    FetchBets,
    Query,
    "fetchBets",
    NoVars => Vec<Bet>,
    concat!("query FetchBets { fetchBets { ", bet_fields!(), " } }")
);

operation!(
    FetchBetsByGame,
    Query,
    "fetchBetsByGame",
    GameIdVars => Vec<Bet>,
    concat!(
        "query FetchBetsByGame($gameId: ID!) { fetchBetsByGame(gameId: $gameId) { ",
        bet_fields!(),
        " } }"
    )
);

operation!(
    FetchBetsBySession,
    Query,
    "fetchBetsBySession",
    SessionIdVars => Vec<Bet>,
    concat!(
        "query FetchBetsBySession($sessionId: ID!) { ",
        "fetchBetsBySession(sessionId: $sessionId) { ",
        bet_fields!(),
        " } }"
    )
);

operation!(
    CreateBet,
    Mutation,
    "createBet",
    CreateVars<BetInput> => Bet,
    concat!(
        "mutation CreateBet($input: BetInput!) { createBet(input: $input) { ",
        bet_fields!(),
        " } }"
    )
);

operation!(
    UpdateBet,
    Mutation,
    "updateBet",
    UpdateVars<BetUpdateInput> => Bet,
    concat!(
        "mutation UpdateBet($id: ID!, $input: BetUpdateInput!) { updateBet(id: $id, input: $input) { ",
        bet_fields!(),
        " } }"
    )
);
