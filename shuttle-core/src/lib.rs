mod clock;
mod reduce;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use clock::{ClockParseError, ClockTime, Meridiem};
pub use reduce::{shuttles_by_type, total_shuttles};

pub type UserId = String;
pub type CourtId = String;
pub type ShuttleId = String;
pub type SessionId = String;
pub type GameId = String;
pub type BetId = String;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Lightweight user reference as embedded in games, bets and sponsor lists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub active: bool,
    #[serde(default)]
    pub sponsors: Vec<UserRef>,
}

impl User {
    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
    pub price: f64,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shuttle {
    pub id: ShuttleId,
    pub name: String,
    pub price: f64,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShuttleUsage {
    pub quantity: u32,
    pub shuttle: Shuttle,
}

/// Start/end of a game as listed inside its session, in play order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionGame {
    pub id: GameId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub court: Option<Court>,
    pub shuttle: Option<Shuttle>,
    #[serde(default)]
    pub available_players: Vec<UserRef>,
    #[serde(default)]
    pub games: Vec<SessionGame>,
}

impl Session {
    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    pub fn last_game(&self) -> Option<&SessionGame> {
        self.games.last()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Ongoing,
    Completed,
}

impl std::str::FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Ok(GameStatus::Ongoing),
            "completed" => Ok(GameStatus::Completed),
            other => Err(format!("unknown game status: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Side::A),
            "b" => Ok(Side::B),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub status: GameStatus,
    pub winner: Option<Side>,
    #[serde(rename = "A1")]
    pub a1: UserRef,
    #[serde(rename = "A2")]
    pub a2: Option<UserRef>,
    #[serde(rename = "B1")]
    pub b1: UserRef,
    #[serde(rename = "B2")]
    pub b2: Option<UserRef>,
    pub court: Option<Court>,
    #[serde(default)]
    pub shuttles_used: Vec<ShuttleUsage>,
    pub active: bool,
}

impl Game {
    pub fn is_doubles(&self) -> bool {
        self.a2.is_some() || self.b2.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: BetId,
    pub bet_type: String,
    pub bet_amount: f64,
    pub paid: bool,
    pub active: bool,
    pub bettor_for_a: UserRef,
    pub bettor_for_b: UserRef,
    #[serde(default)]
    pub game_id: Option<GameId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerShare {
    pub user: UserRef,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: GameId,
    pub court_fee: f64,
    pub shuttle_fee: f64,
    pub total: f64,
    #[serde(default)]
    pub players: Vec<PlayerShare>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSessionTotal {
    pub user: UserRef,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SponsorTotal {
    pub sponsor: UserRef,
    pub amount: f64,
    #[serde(default)]
    pub sponsored: Vec<UserRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub court_total: f64,
    pub shuttle_total: f64,
    pub total: f64,
    pub games_played: u32,
    #[serde(default)]
    pub players: Vec<PlayerSessionTotal>,
    #[serde(default)]
    pub sponsors: Vec<SponsorTotal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BettorTally {
    pub user: UserRef,
    pub wins: u32,
    pub losses: u32,
    pub net: f64,
    pub unpaid: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBetsSummary {
    pub session_id: SessionId,
    pub total_wagered: f64,
    #[serde(default)]
    pub bettors: Vec<BettorTally>,
}
