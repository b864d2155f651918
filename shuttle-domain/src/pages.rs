use std::sync::Arc;

use parking_lot::Mutex;
use shuttle_client::{FetchPolicy, operations::sessions::StartSessionInput};
use shuttle_core::{
    Bet, Court, Game, GameSummary, Session, SessionBetsSummary, SessionSummary, Shuttle, User,
    UserId, total_shuttles,
};

use crate::{
    ServiceResult,
    api::ArcBackendApi,
    describe,
    notify::{ArcNotifier, NoticeLevel},
    panel::Refresh,
};

/// Query state of one slice of a page.
#[derive(Clone, Debug, PartialEq)]
pub enum Loadable<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    pub fn from_result(result: ServiceResult<T>) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(e) => Loadable::Failed(e.to_string()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}

/// A page slice shared with whoever renders it.
#[derive(Clone)]
pub struct Slice<T>(Arc<Mutex<Loadable<T>>>);

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Loadable::Loading)))
    }
}

impl<T: Clone> Slice<T> {
    pub fn get(&self) -> Loadable<T> {
        self.0.lock().clone()
    }

    fn set(&self, result: ServiceResult<T>) {
        *self.0.lock() = Loadable::from_result(result);
    }
}

/// Collections that back a plain list page.
#[async_trait::async_trait]
pub trait Listed: Clone + Send + Sync + 'static {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>>;
}

#[async_trait::async_trait]
impl Listed for User {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>> {
        api.fetch_users(policy).await
    }
}

#[async_trait::async_trait]
impl Listed for Court {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>> {
        api.fetch_courts(policy).await
    }
}

#[async_trait::async_trait]
impl Listed for Shuttle {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>> {
        api.fetch_shuttles(policy).await
    }
}

#[async_trait::async_trait]
impl Listed for Session {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>> {
        api.fetch_sessions(policy).await
    }
}

#[async_trait::async_trait]
impl Listed for Game {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>> {
        api.fetch_games(policy).await
    }
}

#[async_trait::async_trait]
impl Listed for Bet {
    async fn fetch_all(api: &ArcBackendApi, policy: FetchPolicy) -> ServiceResult<Vec<Self>> {
        api.fetch_bets(policy).await
    }
}

#[derive(Clone)]
pub struct ListPage<T> {
    api: ArcBackendApi,
    items: Slice<Vec<T>>,
}

pub type UsersPage = ListPage<User>;
pub type CourtsPage = ListPage<Court>;
pub type ShuttlesPage = ListPage<Shuttle>;
pub type GamesPage = ListPage<Game>;
pub type BetsPage = ListPage<Bet>;

impl<T: Listed> ListPage<T> {
    pub fn new(api: ArcBackendApi) -> Self {
        Self {
            api,
            items: Slice::default(),
        }
    }

    pub async fn load(&self) {
        self.items
            .set(T::fetch_all(&self.api, FetchPolicy::CacheFirst).await);
    }

    pub async fn refetch(&self) {
        self.items
            .set(T::fetch_all(&self.api, FetchPolicy::NetworkOnly).await);
    }

    pub fn items(&self) -> Loadable<Vec<T>> {
        self.items.get()
    }
}

#[async_trait::async_trait]
impl<T: Listed> Refresh for ListPage<T> {
    async fn refresh(&self) {
        self.refetch().await;
    }
}

/// Session list plus the session lifecycle actions.
#[derive(Clone)]
pub struct SessionsPage {
    list: ListPage<Session>,
    notifier: ArcNotifier,
}

impl SessionsPage {
    pub fn new(api: ArcBackendApi, notifier: ArcNotifier) -> Self {
        Self {
            list: ListPage::new(api),
            notifier,
        }
    }

    pub async fn load(&self) {
        self.list.load().await;
    }

    pub fn sessions(&self) -> Loadable<Vec<Session>> {
        self.list.items()
    }

    async fn settle(
        &self,
        result: ServiceResult<Session>,
        done: &str,
        attempted: &str,
    ) -> ServiceResult<Session> {
        match result {
            Ok(session) => {
                self.notifier.notify(NoticeLevel::Success, done);
                self.list.refetch().await;
                Ok(session)
            }
            Err(e) => {
                self.notifier
                    .notify(NoticeLevel::Error, &describe(attempted, &e));
                Err(e)
            }
        }
    }

    pub async fn start_session(&self, input: StartSessionInput) -> ServiceResult<Session> {
        let result = self.list.api.start_session(input).await;
        self.settle(result, "Session started", "start session").await
    }

    pub async fn end_session(&self, id: &str) -> ServiceResult<Session> {
        let result = self.list.api.end_session(id).await;
        self.settle(result, "Session ended", "end session").await
    }

    pub async fn add_players(&self, id: &str, player_ids: Vec<UserId>) -> ServiceResult<Session> {
        let result = self.list.api.add_players_to_session(id, player_ids).await;
        self.settle(result, "Players added", "add players").await
    }
}

#[async_trait::async_trait]
impl Refresh for SessionsPage {
    async fn refresh(&self) {
        self.list.refetch().await;
    }
}

/// One session with its games; both are fetched concurrently.
#[derive(Clone)]
pub struct SessionDetailPage {
    api: ArcBackendApi,
    session_id: String,
    session: Slice<Session>,
    games: Slice<Vec<Game>>,
}

impl SessionDetailPage {
    pub fn new(api: ArcBackendApi, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            session: Slice::default(),
            games: Slice::default(),
        }
    }

    pub async fn load(&self) {
        let session = async {
            self.session
                .set(self.api.fetch_session(&self.session_id).await)
        };
        let games = async {
            self.games
                .set(self.api.fetch_games_by_session(&self.session_id).await)
        };
        tokio::join!(session, games);
    }

    pub fn session(&self) -> Loadable<Session> {
        self.session.get()
    }

    pub fn games(&self) -> Loadable<Vec<Game>> {
        self.games.get()
    }

    pub fn total_shuttles(&self) -> Option<u32> {
        self.games.get().loaded().map(|games| total_shuttles(games))
    }
}

#[async_trait::async_trait]
impl Refresh for SessionDetailPage {
    async fn refresh(&self) {
        self.load().await;
    }
}

#[derive(Clone)]
pub struct GameBetsPage {
    api: ArcBackendApi,
    game_id: String,
    game: Slice<Game>,
    bets: Slice<Vec<Bet>>,
}

impl GameBetsPage {
    pub fn new(api: ArcBackendApi, game_id: impl Into<String>) -> Self {
        Self {
            api,
            game_id: game_id.into(),
            game: Slice::default(),
            bets: Slice::default(),
        }
    }

    pub async fn load(&self) {
        let game = async { self.game.set(self.api.fetch_game(&self.game_id).await) };
        let bets = async {
            self.bets
                .set(self.api.fetch_bets_by_game(&self.game_id).await)
        };
        tokio::join!(game, bets);
    }

    pub fn game(&self) -> Loadable<Game> {
        self.game.get()
    }

    pub fn bets(&self) -> Loadable<Vec<Bet>> {
        self.bets.get()
    }
}

#[async_trait::async_trait]
impl Refresh for GameBetsPage {
    async fn refresh(&self) {
        self.load().await;
    }
}

#[derive(Clone)]
pub struct SessionBetsPage {
    api: ArcBackendApi,
    session_id: String,
    bets: Slice<Vec<Bet>>,
}

impl SessionBetsPage {
    pub fn new(api: ArcBackendApi, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            bets: Slice::default(),
        }
    }

    pub async fn load(&self) {
        self.bets
            .set(self.api.fetch_bets_by_session(&self.session_id).await);
    }

    pub fn bets(&self) -> Loadable<Vec<Bet>> {
        self.bets.get()
    }

    pub fn unpaid_total(&self) -> Option<f64> {
        self.bets.get().loaded().map(|bets| {
            bets.iter()
                .filter(|b| b.active && !b.paid)
                .map(|b| b.bet_amount)
                .sum()
        })
    }
}

#[async_trait::async_trait]
impl Refresh for SessionBetsPage {
    async fn refresh(&self) {
        self.load().await;
    }
}

#[derive(Clone)]
pub struct BetDetailPage {
    api: ArcBackendApi,
    bet_id: String,
    bet: Slice<Bet>,
}

impl BetDetailPage {
    pub fn new(api: ArcBackendApi, bet_id: impl Into<String>) -> Self {
        Self {
            api,
            bet_id: bet_id.into(),
            bet: Slice::default(),
        }
    }

    pub async fn load(&self) {
        self.bet.set(self.api.fetch_bet(&self.bet_id).await);
    }

    pub fn bet(&self) -> Loadable<Bet> {
        self.bet.get()
    }
}

#[derive(Clone)]
pub struct GameSummaryPage {
    api: ArcBackendApi,
    game_id: String,
    summary: Slice<GameSummary>,
}

impl GameSummaryPage {
    pub fn new(api: ArcBackendApi, game_id: impl Into<String>) -> Self {
        Self {
            api,
            game_id: game_id.into(),
            summary: Slice::default(),
        }
    }

    pub async fn load(&self) {
        self.summary
            .set(self.api.fetch_game_summary(&self.game_id).await);
    }

    pub fn summary(&self) -> Loadable<GameSummary> {
        self.summary.get()
    }
}

#[derive(Clone)]
pub struct SessionSummaryPage {
    api: ArcBackendApi,
    session_id: String,
    summary: Slice<SessionSummary>,
    games: Slice<Vec<Game>>,
}

impl SessionSummaryPage {
    pub fn new(api: ArcBackendApi, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            summary: Slice::default(),
            games: Slice::default(),
        }
    }

    pub async fn load(&self) {
        let summary = async {
            self.summary
                .set(self.api.fetch_session_summary(&self.session_id).await)
        };
        let games = async {
            self.games
                .set(self.api.fetch_games_by_session(&self.session_id).await)
        };
        tokio::join!(summary, games);
    }

    pub fn summary(&self) -> Loadable<SessionSummary> {
        self.summary.get()
    }

    pub fn games(&self) -> Loadable<Vec<Game>> {
        self.games.get()
    }
}

#[derive(Clone)]
pub struct SessionBetsSummaryPage {
    api: ArcBackendApi,
    session_id: String,
    summary: Slice<SessionBetsSummary>,
}

impl SessionBetsSummaryPage {
    pub fn new(api: ArcBackendApi, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            summary: Slice::default(),
        }
    }

    pub async fn load(&self) {
        self.summary
            .set(self.api.fetch_session_bets_summary(&self.session_id).await);
    }

    pub fn summary(&self) -> Loadable<SessionBetsSummary> {
        self.summary.get()
    }
}
