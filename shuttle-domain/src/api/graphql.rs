use shuttle_client::{
    FetchPolicy, GraphqlClient, Operation,
    operations::{
        CreateVars, GameIdVars, IdVars, NoVars, SessionIdVars, UpdateVars,
        auth::{Login, LoginPayload, LoginVars, Logout},
        bets::{
            BetInput, BetUpdateInput, CreateBet, FetchBet, FetchBets, FetchBetsByGame,
            FetchBetsBySession, UpdateBet,
        },
        courts::{CourtInput, CreateCourt, FetchCourt, FetchCourts, UpdateCourt},
        games::{CreateGame, FetchGame, FetchGames, FetchGamesBySession, GameInput, UpdateGame},
        sessions::{
            AddPlayersToSession, AddPlayersVars, EndSession, FetchSession, FetchSessions,
            StartSession, StartSessionInput,
        },
        shuttles::{CreateShuttle, FetchShuttle, FetchShuttles, ShuttleInput, UpdateShuttle},
        summaries::{FetchGameSummary, FetchSessionBetsSummary, FetchSessionSummary},
        users::{CreateUser, FetchUser, FetchUsers, SponsorsVars, UpdateUser, UpdateUserSponsors, UserInput},
    },
};
use shuttle_core::{
    Bet, Court, Game, GameSummary, Session, SessionBetsSummary, SessionSummary, Shuttle, User,
    UserId,
};

use crate::{ServiceError, ServiceResult, api::BackendApi};

/// [`BackendApi`] adapter over the GraphQL client.
pub struct GraphqlBackend {
    client: GraphqlClient,
}

impl GraphqlBackend {
    pub fn new(client: GraphqlClient) -> Self {
        Self { client }
    }

    async fn run<O: Operation>(
        &self,
        variables: &O::Variables,
        policy: FetchPolicy,
    ) -> ServiceResult<O::Output> {
        self.client
            .execute::<O>(variables, policy)
            .await
            .map_err(|e| {
                log::debug!("{} failed: {}", O::NAME, e);
                ServiceError::from(e)
            })
    }

    async fn mutate<O: Operation>(&self, variables: &O::Variables) -> ServiceResult<O::Output> {
        let output = self.run::<O>(variables, FetchPolicy::NetworkOnly).await?;
        // cached lists may now be stale
        self.client.invalidate_cache();
        Ok(output)
    }

    async fn fetch_one<O, T>(&self, kind: &str, id: &str) -> ServiceResult<T>
    where
        O: Operation<Variables = IdVars, Output = Option<T>>,
        T: Send,
    {
        match self
            .run::<O>(&IdVars::new(id), FetchPolicy::NetworkOnly)
            .await?
        {
            Some(entity) => Ok(entity),
            None => ServiceError::not_found(format!("{} {} does not exist", kind, id)),
        }
    }
}

#[async_trait::async_trait]
impl BackendApi for GraphqlBackend {
    async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginPayload> {
        let vars = LoginVars {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.run::<Login>(&vars, FetchPolicy::NetworkOnly).await
    }

    async fn logout(&self, access_token: &str) -> ServiceResult<()> {
        let client = self
            .client
            .with_token(Some(access_token.to_string()))
            .map_err(ServiceError::from)?;
        client
            .execute::<Logout>(&NoVars {}, FetchPolicy::NetworkOnly)
            .await?;
        Ok(())
    }

    async fn fetch_users(&self, policy: FetchPolicy) -> ServiceResult<Vec<User>> {
        self.run::<FetchUsers>(&NoVars {}, policy).await
    }

    async fn fetch_user(&self, id: &str) -> ServiceResult<User> {
        self.fetch_one::<FetchUser, _>("user", id).await
    }

    async fn create_user(&self, input: UserInput) -> ServiceResult<User> {
        self.mutate::<CreateUser>(&CreateVars { input }).await
    }

    async fn update_user(&self, id: &str, input: UserInput) -> ServiceResult<User> {
        self.mutate::<UpdateUser>(&UpdateVars {
            id: id.to_string(),
            input,
        })
        .await
    }

    async fn update_user_sponsors(&self, id: &str, sponsor_ids: Vec<UserId>) -> ServiceResult<User> {
        self.mutate::<UpdateUserSponsors>(&SponsorsVars {
            id: id.to_string(),
            sponsor_ids,
        })
        .await
    }

    async fn fetch_courts(&self, policy: FetchPolicy) -> ServiceResult<Vec<Court>> {
        self.run::<FetchCourts>(&NoVars {}, policy).await
    }

    async fn fetch_court(&self, id: &str) -> ServiceResult<Court> {
        self.fetch_one::<FetchCourt, _>("court", id).await
    }

    async fn create_court(&self, input: CourtInput) -> ServiceResult<Court> {
        self.mutate::<CreateCourt>(&CreateVars { input }).await
    }

    async fn update_court(&self, id: &str, input: CourtInput) -> ServiceResult<Court> {
        self.mutate::<UpdateCourt>(&UpdateVars {
            id: id.to_string(),
            input,
        })
        .await
    }

    async fn fetch_shuttles(&self, policy: FetchPolicy) -> ServiceResult<Vec<Shuttle>> {
        self.run::<FetchShuttles>(&NoVars {}, policy).await
    }

    async fn fetch_shuttle(&self, id: &str) -> ServiceResult<Shuttle> {
        self.fetch_one::<FetchShuttle, _>("shuttle", id).await
    }

    async fn create_shuttle(&self, input: ShuttleInput) -> ServiceResult<Shuttle> {
        self.mutate::<CreateShuttle>(&CreateVars { input }).await
    }

    async fn update_shuttle(&self, id: &str, input: ShuttleInput) -> ServiceResult<Shuttle> {
        self.mutate::<UpdateShuttle>(&UpdateVars {
            id: id.to_string(),
            input,
        })
        .await
    }

    async fn fetch_sessions(&self, policy: FetchPolicy) -> ServiceResult<Vec<Session>> {
        self.run::<FetchSessions>(&NoVars {}, policy).await
    }

    async fn fetch_session(&self, id: &str) -> ServiceResult<Session> {
        self.fetch_one::<FetchSession, _>("session", id).await
    }

    async fn start_session(&self, input: StartSessionInput) -> ServiceResult<Session> {
        self.mutate::<StartSession>(&CreateVars { input }).await
    }

    async fn end_session(&self, id: &str) -> ServiceResult<Session> {
        self.mutate::<EndSession>(&IdVars::new(id)).await
    }

    async fn add_players_to_session(
        &self,
        id: &str,
        player_ids: Vec<UserId>,
    ) -> ServiceResult<Session> {
        self.mutate::<AddPlayersToSession>(&AddPlayersVars {
            id: id.to_string(),
            player_ids,
        })
        .await
    }

    async fn fetch_game(&self, id: &str) -> ServiceResult<Game> {
        self.fetch_one::<FetchGame, _>("game", id).await
    }

    async fn fetch_games(&self, policy: FetchPolicy) -> ServiceResult<Vec<Game>> {
        self.run::<FetchGames>(&NoVars {}, policy).await
    }

    async fn fetch_games_by_session(&self, session_id: &str) -> ServiceResult<Vec<Game>> {
        let vars = SessionIdVars {
            session_id: session_id.to_string(),
        };
        self.run::<FetchGamesBySession>(&vars, FetchPolicy::NetworkOnly)
            .await
    }

    async fn create_game(&self, input: GameInput) -> ServiceResult<Game> {
        self.mutate::<CreateGame>(&CreateVars { input }).await
    }

    async fn update_game(&self, id: &str, input: GameInput) -> ServiceResult<Game> {
        self.mutate::<UpdateGame>(&UpdateVars {
            id: id.to_string(),
            input,
        })
        .await
    }

    async fn fetch_bet(&self, id: &str) -> ServiceResult<Bet> {
        self.fetch_one::<FetchBet, _>("bet", id).await
    }

    async fn fetch_bets(&self, policy: FetchPolicy) -> ServiceResult<Vec<Bet>> {
        self.run::<FetchBets>(&NoVars {}, policy).await
    }

    async fn fetch_bets_by_game(&self, game_id: &str) -> ServiceResult<Vec<Bet>> {
        let vars = GameIdVars {
            game_id: game_id.to_string(),
        };
        self.run::<FetchBetsByGame>(&vars, FetchPolicy::NetworkOnly)
            .await
    }

    async fn fetch_bets_by_session(&self, session_id: &str) -> ServiceResult<Vec<Bet>> {
        let vars = SessionIdVars {
            session_id: session_id.to_string(),
        };
        self.run::<FetchBetsBySession>(&vars, FetchPolicy::NetworkOnly)
            .await
    }

    async fn create_bet(&self, input: BetInput) -> ServiceResult<Bet> {
        self.mutate::<CreateBet>(&CreateVars { input }).await
    }

    async fn update_bet(&self, id: &str, input: BetUpdateInput) -> ServiceResult<Bet> {
        self.mutate::<UpdateBet>(&UpdateVars {
            id: id.to_string(),
            input,
        })
        .await
    }

    async fn fetch_game_summary(&self, game_id: &str) -> ServiceResult<GameSummary> {
        let vars = GameIdVars {
            game_id: game_id.to_string(),
        };
        self.run::<FetchGameSummary>(&vars, FetchPolicy::NetworkOnly)
            .await
    }

    async fn fetch_session_summary(&self, session_id: &str) -> ServiceResult<SessionSummary> {
        let vars = SessionIdVars {
            session_id: session_id.to_string(),
        };
        self.run::<FetchSessionSummary>(&vars, FetchPolicy::NetworkOnly)
            .await
    }

    async fn fetch_session_bets_summary(
        &self,
        session_id: &str,
    ) -> ServiceResult<SessionBetsSummary> {
        let vars = SessionIdVars {
            session_id: session_id.to_string(),
        };
        self.run::<FetchSessionBetsSummary>(&vars, FetchPolicy::NetworkOnly)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use shuttle_client::{ClientConfig, test_support::HttpStub};

    use super::*;

    fn court(id: &str) -> Value {
        json!({ "id": id, "name": format!("Court {}", id), "price": 150.0, "active": true })
    }

    fn backend(stub: &HttpStub, token: Option<&str>) -> GraphqlBackend {
        let config = ClientConfig::new(stub.url(), "ws://127.0.0.1:1");
        let client = GraphqlClient::new(config, token.map(str::to_string)).unwrap();
        GraphqlBackend::new(client)
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cached_lists() {
        let stub = HttpStub::start(vec![
            json!({ "data": { "fetchCourts": [court("c1")] } }),
            json!({ "data": { "createCourt": court("c2") } }),
            json!({ "data": { "fetchCourts": [court("c1"), court("c2")] } }),
        ])
        .await;
        let api = backend(&stub, Some("tok-1"));

        api.fetch_courts(FetchPolicy::CacheFirst).await.unwrap();
        let cached = api.fetch_courts(FetchPolicy::CacheFirst).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(stub.operations(), vec!["FetchCourts"]);

        let created = api
            .create_court(CourtInput {
                name: "Court c2".to_string(),
                price: 150.0,
                active: true,
            })
            .await
            .expect("court created");
        assert_eq!(created.id, "c2");

        let courts = api.fetch_courts(FetchPolicy::CacheFirst).await.unwrap();
        assert_eq!(courts.len(), 2);
        assert_eq!(
            stub.operations(),
            vec!["FetchCourts", "CreateCourt", "FetchCourts"]
        );
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_found() {
        let stub = HttpStub::start(vec![json!({ "data": { "fetchCourt": null } })]).await;
        let api = backend(&stub, Some("tok-1"));

        let result = api.fetch_court("c404").await;
        assert!(matches!(result, Err(ServiceError::NotFound(msg)) if msg.contains("c404")));
        assert_eq!(stub.requests()[0].body["variables"]["id"], "c404");
    }

    #[tokio::test]
    async fn test_backend_errors_are_mapped() {
        let stub = HttpStub::start(vec![json!({
            "data": null,
            "errors": [{ "message": "session already ended" }]
        })])
        .await;
        let api = backend(&stub, Some("tok-1"));

        let result = api.end_session("s1").await;
        assert!(matches!(result, Err(ServiceError::Backend(msg)) if msg == "session already ended"));
    }

    #[tokio::test]
    async fn test_logout_carries_the_given_token() {
        let stub = HttpStub::start(vec![json!({ "data": { "logout": true } })]).await;
        let api = backend(&stub, None);

        api.logout("tok-9").await.expect("logged out");
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].operation(), Some("Logout"));
        assert_eq!(requests[0].header("authorization"), Some("Bearer tok-9"));
    }
}
