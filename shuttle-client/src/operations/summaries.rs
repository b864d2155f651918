use shuttle_core::{GameSummary, SessionBetsSummary, SessionSummary};

use super::{GameIdVars, SessionIdVars};

operation!(
    FetchGameSummary,
    Query,
    "fetchGameSummary",
    GameIdVars => GameSummary,
    concat!(
        "query FetchGameSummary($gameId: ID!) { fetchGameSummary(gameId: $gameId) { ",
        "gameId courtFee shuttleFee total players { user { id name } amount } } }"
    )
);

operation!(
    FetchSessionSummary,
    Query,
    "fetchSessionSummary",
    SessionIdVars => SessionSummary,
    concat!(
        "query FetchSessionSummary($sessionId: ID!) { fetchSessionSummary(sessionId: $sessionId) { ",
        "sessionId courtTotal shuttleTotal total gamesPlayed ",
        "players { user { id name } gamesPlayed wins losses amount } ",
        "sponsors { sponsor { id name } amount sponsored { id name } } } }"
    )
);

operation!(
    FetchSessionBetsSummary,
    Query,
    "fetchSessionBetsSummary",
    SessionIdVars => SessionBetsSummary,
    concat!(
        "query FetchSessionBetsSummary($sessionId: ID!) { ",
        "fetchSessionBetsSummary(sessionId: $sessionId) { ",
        "sessionId totalWagered bettors { user { id name } wins losses net unpaid } } }"
    )
);
