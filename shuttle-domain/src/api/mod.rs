use std::sync::Arc;

use shuttle_client::{
    FetchPolicy,
    operations::{
        auth::LoginPayload,
        bets::{BetInput, BetUpdateInput},
        courts::CourtInput,
        games::GameInput,
        sessions::StartSessionInput,
        shuttles::ShuttleInput,
        users::UserInput,
    },
};
use shuttle_core::{
    Bet, Court, Game, GameSummary, Session, SessionBetsSummary, SessionSummary, Shuttle, User,
    UserId,
};

use crate::ServiceResult;

mod graphql;
pub mod mock;

pub use graphql::GraphqlBackend;

/// Every backend call the console makes.
///
/// Single-entity fetches, summaries and per-session or per-game lists always
/// go to the network; the plain collection lists take a [`FetchPolicy`].
#[async_trait::async_trait]
pub trait BackendApi {
    async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginPayload>;
    async fn logout(&self, access_token: &str) -> ServiceResult<()>;

    async fn fetch_users(&self, policy: FetchPolicy) -> ServiceResult<Vec<User>>;
    async fn fetch_user(&self, id: &str) -> ServiceResult<User>;
    async fn create_user(&self, input: UserInput) -> ServiceResult<User>;
    async fn update_user(&self, id: &str, input: UserInput) -> ServiceResult<User>;
    async fn update_user_sponsors(&self, id: &str, sponsor_ids: Vec<UserId>) -> ServiceResult<User>;

    async fn fetch_courts(&self, policy: FetchPolicy) -> ServiceResult<Vec<Court>>;
    async fn fetch_court(&self, id: &str) -> ServiceResult<Court>;
    async fn create_court(&self, input: CourtInput) -> ServiceResult<Court>;
    async fn update_court(&self, id: &str, input: CourtInput) -> ServiceResult<Court>;

    async fn fetch_shuttles(&self, policy: FetchPolicy) -> ServiceResult<Vec<Shuttle>>;
    async fn fetch_shuttle(&self, id: &str) -> ServiceResult<Shuttle>;
    async fn create_shuttle(&self, input: ShuttleInput) -> ServiceResult<Shuttle>;
    async fn update_shuttle(&self, id: &str, input: ShuttleInput) -> ServiceResult<Shuttle>;

    async fn fetch_sessions(&self, policy: FetchPolicy) -> ServiceResult<Vec<Session>>;
    async fn fetch_session(&self, id: &str) -> ServiceResult<Session>;
    async fn start_session(&self, input: StartSessionInput) -> ServiceResult<Session>;
    async fn end_session(&self, id: &str) -> ServiceResult<Session>;
    async fn add_players_to_session(
        &self,
        id: &str,
        player_ids: Vec<UserId>,
    ) -> ServiceResult<Session>;

    async fn fetch_game(&self, id: &str) -> ServiceResult<Game>;
    async fn fetch_games(&self, policy: FetchPolicy) -> ServiceResult<Vec<Game>>;
    async fn fetch_games_by_session(&self, session_id: &str) -> ServiceResult<Vec<Game>>;
    async fn create_game(&self, input: GameInput) -> ServiceResult<Game>;
    async fn update_game(&self, id: &str, input: GameInput) -> ServiceResult<Game>;

    async fn fetch_bet(&self, id: &str) -> ServiceResult<Bet>;
    async fn fetch_bets(&self, policy: FetchPolicy) -> ServiceResult<Vec<Bet>>;
    async fn fetch_bets_by_game(&self, game_id: &str) -> ServiceResult<Vec<Bet>>;
    async fn fetch_bets_by_session(&self, session_id: &str) -> ServiceResult<Vec<Bet>>;
    async fn create_bet(&self, input: BetInput) -> ServiceResult<Bet>;
    async fn update_bet(&self, id: &str, input: BetUpdateInput) -> ServiceResult<Bet>;

    async fn fetch_game_summary(&self, game_id: &str) -> ServiceResult<GameSummary>;
    async fn fetch_session_summary(&self, session_id: &str) -> ServiceResult<SessionSummary>;
    async fn fetch_session_bets_summary(
        &self,
        session_id: &str,
    ) -> ServiceResult<SessionBetsSummary>;
}

pub type ArcBackendApi = Arc<Box<dyn BackendApi + Send + Sync + 'static>>;
