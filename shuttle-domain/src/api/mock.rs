use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
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
    Bet, Court, Game, GameId, GameSummary, Session, SessionBetsSummary, SessionGame, SessionId,
    SessionSummary, Shuttle, ShuttleUsage, User, UserId, UserRef,
};

use crate::{ServiceError, ServiceResult, api::BackendApi};

/// In-memory backend state. Writes are applied so that follow-up fetches see
/// them, and every input is kept for assertions.
#[derive(Default)]
pub struct MockState {
    pub users: Vec<User>,
    pub courts: Vec<Court>,
    pub shuttles: Vec<Shuttle>,
    pub sessions: Vec<Session>,
    pub games: Vec<Game>,
    pub bets: Vec<Bet>,
    pub game_summaries: HashMap<GameId, GameSummary>,
    pub session_summaries: HashMap<SessionId, SessionSummary>,
    pub bets_summaries: HashMap<SessionId, SessionBetsSummary>,

    pub calls: Vec<String>,
    pub failing: HashSet<String>,
    pub logged_out: Vec<String>,
    pub user_inputs: Vec<(Option<UserId>, UserInput)>,
    pub sponsor_updates: Vec<(UserId, Vec<UserId>)>,
    pub court_inputs: Vec<(Option<String>, CourtInput)>,
    pub shuttle_inputs: Vec<(Option<String>, ShuttleInput)>,
    pub game_inputs: Vec<(Option<GameId>, GameInput)>,
    pub bet_inputs: Vec<BetInput>,
    pub bet_updates: Vec<(String, BetUpdateInput)>,
    next_id: u32,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn user_ref(&self, id: &str) -> UserRef {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(User::to_ref)
            .unwrap_or_else(|| UserRef {
                id: id.to_string(),
                name: id.to_string(),
            })
    }

    fn build_game(&self, id: GameId, input: &GameInput) -> Game {
        Game {
            id,
            session_id: Some(input.session_id.clone()),
            start: input.start,
            end: input.end,
            status: input.status,
            winner: input.winner,
            a1: self.user_ref(&input.a1),
            a2: input.a2.as_deref().map(|id| self.user_ref(id)),
            b1: self.user_ref(&input.b1),
            b2: input.b2.as_deref().map(|id| self.user_ref(id)),
            court: self.courts.iter().find(|c| c.id == input.court).cloned(),
            shuttles_used: input
                .shuttles_used
                .iter()
                .filter_map(|usage| {
                    let shuttle = self.shuttles.iter().find(|s| s.id == usage.shuttle)?;
                    Some(ShuttleUsage {
                        quantity: usage.quantity,
                        shuttle: shuttle.clone(),
                    })
                })
                .collect(),
            active: true,
        }
    }

    fn sync_session_game(&mut self, game: &Game) {
        let Some(session_id) = &game.session_id else {
            return;
        };
        if let Some(session) = self.sessions.iter_mut().find(|s| &s.id == session_id) {
            let entry = SessionGame {
                id: game.id.clone(),
                start: game.start,
                end: game.end,
            };
            match session.games.iter_mut().find(|g| g.id == game.id) {
                Some(existing) => *existing = entry,
                None => session.games.push(entry),
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct MockBackendApi {
    pub state: Arc<Mutex<MockState>>,
}

#[allow(unused)]
impl MockBackendApi {
    pub fn seed(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.state.lock());
    }

    pub fn fail_on(&self, operation: &str) {
        self.state.lock().failing.insert(operation.to_string());
    }

    pub fn recover(&self, operation: &str) {
        self.state.lock().failing.remove(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    fn enter(&self, operation: &str) -> ServiceResult<parking_lot::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(ServiceError::Backend(format!("{} rejected", operation)));
        }
        Ok(state)
    }
}

fn find<T: Clone>(items: &[T], kind: &str, id: &str, matches: impl Fn(&T) -> bool) -> ServiceResult<T> {
    match items.iter().find(|item| matches(item)) {
        Some(item) => Ok(item.clone()),
        None => ServiceError::not_found(format!("{} {} does not exist", kind, id)),
    }
}

#[async_trait::async_trait]
impl BackendApi for MockBackendApi {
    async fn login(&self, username: &str, _password: &str) -> ServiceResult<LoginPayload> {
        let state = self.enter("login")?;
        match state.users.iter().find(|u| u.username == username) {
            Some(user) => Ok(LoginPayload {
                access_token: format!("token-{}", user.username),
                user: user.clone(),
            }),
            None => ServiceError::unauthorized("Invalid username or password"),
        }
    }

    async fn logout(&self, access_token: &str) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.calls.push("logout".to_string());
        state.logged_out.push(access_token.to_string());
        if state.failing.contains("logout") {
            return Err(ServiceError::Network("logout rejected".to_string()));
        }
        Ok(())
    }

    async fn fetch_users(&self, _policy: FetchPolicy) -> ServiceResult<Vec<User>> {
        Ok(self.enter("fetchUsers")?.users.clone())
    }

    async fn fetch_user(&self, id: &str) -> ServiceResult<User> {
        let state = self.enter("fetchUser")?;
        find(&state.users, "user", id, |u| u.id == id)
    }

    async fn create_user(&self, input: UserInput) -> ServiceResult<User> {
        let mut state = self.enter("createUser")?;
        let user = User {
            id: state.next_id("user"),
            name: input.name.clone(),
            username: input.username.clone(),
            contact: input.contact.clone(),
            role: input.role,
            active: input.active,
            sponsors: Vec::new(),
        };
        state.user_inputs.push((None, input));
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &str, input: UserInput) -> ServiceResult<User> {
        let mut state = self.enter("updateUser")?;
        state.user_inputs.push((Some(id.to_string()), input.clone()));
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return ServiceError::not_found(format!("user {} does not exist", id));
        };
        user.name = input.name;
        user.username = input.username;
        user.contact = input.contact;
        user.role = input.role;
        user.active = input.active;
        Ok(user.clone())
    }

    async fn update_user_sponsors(&self, id: &str, sponsor_ids: Vec<UserId>) -> ServiceResult<User> {
        let mut state = self.enter("updateUserSponsors")?;
        state
            .sponsor_updates
            .push((id.to_string(), sponsor_ids.clone()));
        let sponsors: Vec<UserRef> = sponsor_ids.iter().map(|s| state.user_ref(s)).collect();
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return ServiceError::not_found(format!("user {} does not exist", id));
        };
        user.sponsors = sponsors;
        Ok(user.clone())
    }

    async fn fetch_courts(&self, _policy: FetchPolicy) -> ServiceResult<Vec<Court>> {
        Ok(self.enter("fetchCourts")?.courts.clone())
    }

    async fn fetch_court(&self, id: &str) -> ServiceResult<Court> {
        let state = self.enter("fetchCourt")?;
        find(&state.courts, "court", id, |c| c.id == id)
    }

    async fn create_court(&self, input: CourtInput) -> ServiceResult<Court> {
        let mut state = self.enter("createCourt")?;
        let court = Court {
            id: state.next_id("court"),
            name: input.name.clone(),
            price: input.price,
            active: input.active,
        };
        state.court_inputs.push((None, input));
        state.courts.push(court.clone());
        Ok(court)
    }

    async fn update_court(&self, id: &str, input: CourtInput) -> ServiceResult<Court> {
        let mut state = self.enter("updateCourt")?;
        state.court_inputs.push((Some(id.to_string()), input.clone()));
        let Some(court) = state.courts.iter_mut().find(|c| c.id == id) else {
            return ServiceError::not_found(format!("court {} does not exist", id));
        };
        court.name = input.name;
        court.price = input.price;
        court.active = input.active;
        Ok(court.clone())
    }

    async fn fetch_shuttles(&self, _policy: FetchPolicy) -> ServiceResult<Vec<Shuttle>> {
        Ok(self.enter("fetchShuttles")?.shuttles.clone())
    }

    async fn fetch_shuttle(&self, id: &str) -> ServiceResult<Shuttle> {
        let state = self.enter("fetchShuttle")?;
        find(&state.shuttles, "shuttle", id, |s| s.id == id)
    }

    async fn create_shuttle(&self, input: ShuttleInput) -> ServiceResult<Shuttle> {
        let mut state = self.enter("createShuttle")?;
        let shuttle = Shuttle {
            id: state.next_id("shuttle"),
            name: input.name.clone(),
            price: input.price,
            active: input.active,
        };
        state.shuttle_inputs.push((None, input));
        state.shuttles.push(shuttle.clone());
        Ok(shuttle)
    }

    async fn update_shuttle(&self, id: &str, input: ShuttleInput) -> ServiceResult<Shuttle> {
        let mut state = self.enter("updateShuttle")?;
        state
            .shuttle_inputs
            .push((Some(id.to_string()), input.clone()));
        let Some(shuttle) = state.shuttles.iter_mut().find(|s| s.id == id) else {
            return ServiceError::not_found(format!("shuttle {} does not exist", id));
        };
        shuttle.name = input.name;
        shuttle.price = input.price;
        shuttle.active = input.active;
        Ok(shuttle.clone())
    }

    async fn fetch_sessions(&self, _policy: FetchPolicy) -> ServiceResult<Vec<Session>> {
        Ok(self.enter("fetchSessions")?.sessions.clone())
    }

    async fn fetch_session(&self, id: &str) -> ServiceResult<Session> {
        let state = self.enter("fetchSession")?;
        find(&state.sessions, "session", id, |s| s.id == id)
    }

    async fn start_session(&self, input: StartSessionInput) -> ServiceResult<Session> {
        let mut state = self.enter("startSession")?;
        let session = Session {
            id: state.next_id("session"),
            start: chrono::Utc::now(),
            end: None,
            court: input
                .court
                .as_ref()
                .and_then(|id| state.courts.iter().find(|c| &c.id == id).cloned()),
            shuttle: input
                .shuttle
                .as_ref()
                .and_then(|id| state.shuttles.iter().find(|s| &s.id == id).cloned()),
            available_players: input
                .available_players
                .iter()
                .map(|id| state.user_ref(id))
                .collect(),
            games: Vec::new(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn end_session(&self, id: &str) -> ServiceResult<Session> {
        let mut state = self.enter("endSession")?;
        let Some(session) = state.sessions.iter_mut().find(|s| s.id == id) else {
            return ServiceError::not_found(format!("session {} does not exist", id));
        };
        session.end = Some(chrono::Utc::now());
        Ok(session.clone())
    }

    async fn add_players_to_session(
        &self,
        id: &str,
        player_ids: Vec<UserId>,
    ) -> ServiceResult<Session> {
        let mut state = self.enter("addPlayersToSession")?;
        let players: Vec<UserRef> = player_ids.iter().map(|p| state.user_ref(p)).collect();
        let Some(session) = state.sessions.iter_mut().find(|s| s.id == id) else {
            return ServiceError::not_found(format!("session {} does not exist", id));
        };
        for player in players {
            if !session.available_players.contains(&player) {
                session.available_players.push(player);
            }
        }
        Ok(session.clone())
    }

    async fn fetch_game(&self, id: &str) -> ServiceResult<Game> {
        let state = self.enter("fetchGame")?;
        find(&state.games, "game", id, |g| g.id == id)
    }

    async fn fetch_games(&self, _policy: FetchPolicy) -> ServiceResult<Vec<Game>> {
        Ok(self.enter("fetchGames")?.games.clone())
    }

    async fn fetch_games_by_session(&self, session_id: &str) -> ServiceResult<Vec<Game>> {
        let state = self.enter("fetchGamesBySession")?;
        Ok(state
            .games
            .iter()
            .filter(|g| g.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect())
    }

    async fn create_game(&self, input: GameInput) -> ServiceResult<Game> {
        let mut state = self.enter("createGame")?;
        let id = state.next_id("game");
        let game = state.build_game(id, &input);
        state.game_inputs.push((None, input));
        state.games.push(game.clone());
        state.sync_session_game(&game);
        Ok(game)
    }

    async fn update_game(&self, id: &str, input: GameInput) -> ServiceResult<Game> {
        let mut state = self.enter("updateGame")?;
        if !state.games.iter().any(|g| g.id == id) {
            return ServiceError::not_found(format!("game {} does not exist", id));
        }
        let game = state.build_game(id.to_string(), &input);
        state.game_inputs.push((Some(id.to_string()), input));
        if let Some(existing) = state.games.iter_mut().find(|g| g.id == id) {
            *existing = game.clone();
        }
        state.sync_session_game(&game);
        Ok(game)
    }

    async fn fetch_bet(&self, id: &str) -> ServiceResult<Bet> {
        let state = self.enter("fetchBet")?;
        find(&state.bets, "bet", id, |b| b.id == id)
    }

    async fn fetch_bets(&self, _policy: FetchPolicy) -> ServiceResult<Vec<Bet>> {
        Ok(self.enter("fetchBets")?.bets.clone())
    }

    async fn fetch_bets_by_game(&self, game_id: &str) -> ServiceResult<Vec<Bet>> {
        let state = self.enter("fetchBetsByGame")?;
        Ok(state
            .bets
            .iter()
            .filter(|b| b.game_id.as_deref() == Some(game_id))
            .cloned()
            .collect())
    }

    async fn fetch_bets_by_session(&self, session_id: &str) -> ServiceResult<Vec<Bet>> {
        let state = self.enter("fetchBetsBySession")?;
        let games: HashSet<&str> = state
            .games
            .iter()
            .filter(|g| g.session_id.as_deref() == Some(session_id))
            .map(|g| g.id.as_str())
            .collect();
        Ok(state
            .bets
            .iter()
            .filter(|b| b.game_id.as_deref().is_some_and(|g| games.contains(g)))
            .cloned()
            .collect())
    }

    async fn create_bet(&self, input: BetInput) -> ServiceResult<Bet> {
        let mut state = self.enter("createBet")?;
        let bet = Bet {
            id: state.next_id("bet"),
            bet_type: input.bet_type.clone(),
            bet_amount: input.bet_amount,
            paid: input.paid,
            active: true,
            bettor_for_a: state.user_ref(&input.bettor_for_a),
            bettor_for_b: state.user_ref(&input.bettor_for_b),
            game_id: Some(input.game_id.clone()),
        };
        state.bet_inputs.push(input);
        state.bets.push(bet.clone());
        Ok(bet)
    }

    async fn update_bet(&self, id: &str, input: BetUpdateInput) -> ServiceResult<Bet> {
        let mut state = self.enter("updateBet")?;
        state.bet_updates.push((id.to_string(), input.clone()));
        let bettor_for_a = state.user_ref(&input.bettor_for_a);
        let bettor_for_b = state.user_ref(&input.bettor_for_b);
        let Some(bet) = state.bets.iter_mut().find(|b| b.id == id) else {
            return ServiceError::not_found(format!("bet {} does not exist", id));
        };
        bet.bet_type = input.bet_type;
        bet.bet_amount = input.bet_amount;
        bet.paid = input.paid;
        bet.active = input.active;
        bet.bettor_for_a = bettor_for_a;
        bet.bettor_for_b = bettor_for_b;
        Ok(bet.clone())
    }

    async fn fetch_game_summary(&self, game_id: &str) -> ServiceResult<GameSummary> {
        let state = self.enter("fetchGameSummary")?;
        match state.game_summaries.get(game_id) {
            Some(summary) => Ok(summary.clone()),
            None => ServiceError::not_found(format!("no summary for game {}", game_id)),
        }
    }

    async fn fetch_session_summary(&self, session_id: &str) -> ServiceResult<SessionSummary> {
        let state = self.enter("fetchSessionSummary")?;
        match state.session_summaries.get(session_id) {
            Some(summary) => Ok(summary.clone()),
            None => ServiceError::not_found(format!("no summary for session {}", session_id)),
        }
    }

    async fn fetch_session_bets_summary(
        &self,
        session_id: &str,
    ) -> ServiceResult<SessionBetsSummary> {
        let state = self.enter("fetchSessionBetsSummary")?;
        match state.bets_summaries.get(session_id) {
            Some(summary) => Ok(summary.clone()),
            None => ServiceError::not_found(format!("no bets summary for session {}", session_id)),
        }
    }
}
