use std::fmt::Display;

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Sessions,
    Session { id: String },
    SessionGame { session_id: String, game_id: String },
    SessionBets { session_id: String },
    SessionSummary { session_id: String },
    SessionBetsSummary { session_id: String },
    GameBets { game_id: String },
    GameSummary { game_id: String },
    Bet { id: String },
    Users,
    User { id: String },
    Courts,
    Court { id: String },
    Shuttles,
    Shuttle { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl Route {
    pub fn parse(path: &str) -> Result<Self, UnknownRoute> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let route = match segments.as_slice() {
            ["sessions"] => Route::Sessions,
            ["sessions", session] => Route::Session { id: session.to_string() },
            ["sessions", session, "games", game] => Route::SessionGame {
                session_id: session.to_string(),
                game_id: game.to_string(),
            },
            ["sessions", session, "bets"] => Route::SessionBets {
                session_id: session.to_string(),
            },
            ["sessions", session, "summary"] => Route::SessionSummary {
                session_id: session.to_string(),
            },
            ["sessions", session, "bets", "summary"] => Route::SessionBetsSummary {
                session_id: session.to_string(),
            },
            ["games", game, "bets"] => Route::GameBets { game_id: game.to_string() },
            ["games", game, "summary"] => Route::GameSummary { game_id: game.to_string() },
            ["bets", bet] => Route::Bet { id: bet.to_string() },
            ["users"] => Route::Users,
            ["users", user] => Route::User { id: user.to_string() },
            ["courts"] => Route::Courts,
            ["courts", court] => Route::Court { id: court.to_string() },
            ["shuttles"] => Route::Shuttles,
            ["shuttles", shuttle] => Route::Shuttle { id: shuttle.to_string() },
            _ => return Err(UnknownRoute(path.to_string())),
        };
        Ok(route)
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Sessions => write!(f, "/sessions"),
            Route::Session { id } => write!(f, "/sessions/{}", id),
            Route::SessionGame {
                session_id,
                game_id,
            } => write!(f, "/sessions/{}/games/{}", session_id, game_id),
            Route::SessionBets { session_id } => write!(f, "/sessions/{}/bets", session_id),
            Route::SessionSummary { session_id } => write!(f, "/sessions/{}/summary", session_id),
            Route::SessionBetsSummary { session_id } => {
                write!(f, "/sessions/{}/bets/summary", session_id)
            }
            Route::GameBets { game_id } => write!(f, "/games/{}/bets", game_id),
            Route::GameSummary { game_id } => write!(f, "/games/{}/summary", game_id),
            Route::Bet { id } => write!(f, "/bets/{}", id),
            Route::Users => write!(f, "/users"),
            Route::User { id } => write!(f, "/users/{}", id),
            Route::Courts => write!(f, "/courts"),
            Route::Court { id } => write!(f, "/courts/{}", id),
            Route::Shuttles => write!(f, "/shuttles"),
            Route::Shuttle { id } => write!(f, "/shuttles/{}", id),
        }
    }
}

impl std::str::FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_routes() {
        assert_eq!(
            Route::parse("/sessions/s1/games/g2").unwrap(),
            Route::SessionGame {
                session_id: "s1".to_string(),
                game_id: "g2".to_string()
            }
        );
        assert_eq!(
            Route::parse("sessions/s1/bets/summary/").unwrap(),
            Route::SessionBetsSummary {
                session_id: "s1".to_string()
            }
        );
        assert_eq!(Route::parse("/users").unwrap(), Route::Users);
    }

    #[test]
    fn test_display_matches_parse() {
        for path in [
            "/sessions",
            "/sessions/s1",
            "/sessions/s1/bets",
            "/sessions/s1/summary",
            "/games/g1/bets",
            "/games/g1/summary",
            "/bets/b1",
            "/courts/c1",
            "/shuttles",
        ] {
            assert_eq!(Route::parse(path).unwrap().to_string(), path);
        }
    }

    #[test]
    fn test_unknown_routes() {
        for path in ["", "/", "/games/g1", "/sessions/s1/games", "/teams"] {
            assert!(Route::parse(path).is_err(), "{} should not parse", path);
        }
    }
}
