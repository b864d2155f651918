use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;
use shuttle_client::{FetchPolicy, GraphqlClient, operations::sessions::StartSessionInput};
use shuttle_core::{Bet, Court, Game, GameStatus, Shuttle, Side, User};
use shuttle_domain::{
    api::{ArcBackendApi, GraphqlBackend},
    auth::{ArcSessionStore, AuthBridge, SessionContext},
    betting::{BetBatchForm, BetBatchPanel, BettorEntry, BettorPair, search_users},
    forms::{BetForm, CourtForm, ShuttleForm, UserForm},
    notify::{ArcNotifier, LogNotifier},
    pages::{
        BetDetailPage, GameBetsPage, GameSummaryPage, ListPage, Listed, Loadable,
        SessionBetsPage, SessionBetsSummaryPage, SessionDetailPage, SessionSummaryPage,
        SessionsPage,
    },
    panel::{CrudPanel, EntityForm},
    routes::Route,
    schedule::{GameEditor, PlayerSlot, ShuttleRow},
};

use crate::{
    cli::{
        BetCommand, Command, GameCommand, GameFields, PricedCommand, SessionCommand,
        UserCommand, UserFields,
    },
    config::AppConfig,
    render,
    store::FileSessionStore,
};

pub struct App {
    config: AppConfig,
    client: GraphqlClient,
    auth: AuthBridge,
    context: SessionContext,
    notifier: ArcNotifier,
    json: bool,
}

impl App {
    pub fn new(config: AppConfig, json: bool) -> anyhow::Result<Self> {
        let client = GraphqlClient::new(config.client.clone(), None)
            .context("Invalid GraphQL configuration")?;
        let anonymous: ArcBackendApi = Arc::new(Box::new(GraphqlBackend::new(client.clone())));
        let store: ArcSessionStore =
            Arc::new(Box::new(FileSessionStore::new(config.session_file.clone())));
        let auth = AuthBridge::new(anonymous, &config.session_secret, store);

        let mut context = SessionContext::default();
        auth.restore(&mut context)?;

        Ok(Self {
            config,
            client,
            auth,
            context,
            notifier: Arc::new(Box::new(LogNotifier)),
            json,
        })
    }

    /// Backend bound to the signed-in user's credential.
    fn api(&self) -> anyhow::Result<ArcBackendApi> {
        let Some(token) = self.context.access_token() else {
            bail!("Not signed in; run `shuttle-console login <username>` first");
        };
        let client = self.client.with_token(Some(token.to_string()))?;
        Ok(Arc::new(Box::new(GraphqlBackend::new(client))))
    }

    pub async fn shutdown(&self) {
        self.client.close().await;
    }

    fn emit<T: Serialize>(&self, state: &Loadable<T>, text: impl Fn(&T) -> String) {
        if self.json {
            if let Loadable::Loaded(value) = state {
                match serde_json::to_string_pretty(value) {
                    Ok(json) => println!("{}", json),
                    Err(e) => log::error!("Failed to encode output: {}", e),
                }
                return;
            }
        }
        print!("{}", render::loadable(state, text));
    }

    pub async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Login { username, password } => {
                let session = self
                    .auth
                    .sign_in(&mut self.context, &username, &password)
                    .await?;
                println!(
                    "Signed in as {} ({}) until {}",
                    session.user.name,
                    session.user.role.as_str(),
                    render::when(session.expires_at, self.config.zone)
                );
            }
            Command::Logout => {
                self.auth.sign_out(&mut self.context).await;
                println!("Signed out");
            }
            Command::Whoami => match self.context.user() {
                Some(user) => println!("{} (@{}, {})", user.name, user.username, user.role.as_str()),
                None => println!("Not signed in"),
            },
            Command::Show { route } => {
                let route = Route::parse(&route)?;
                self.show(route).await?;
            }
            Command::Court(command) => self.priced::<CourtForm>(command, render::courts).await?,
            Command::Shuttle(command) => {
                self.priced::<ShuttleForm>(command, render::shuttles).await?
            }
            Command::User(command) => self.user(command).await?,
            Command::Session(command) => self.session(command).await?,
            Command::Game(command) => self.game(command).await?,
            Command::Bet(command) => self.bet(command).await?,
        }
        Ok(())
    }

    async fn show(&self, route: Route) -> anyhow::Result<()> {
        let api = self.api()?;
        let zone = self.config.zone;
        match route {
            Route::Sessions => {
                let page = SessionsPage::new(api, self.notifier.clone());
                page.load().await;
                self.emit(&page.sessions(), |s| render::sessions(s, zone));
            }
            Route::Session { id } => {
                let page = SessionDetailPage::new(api, id);
                page.load().await;
                self.emit(&page.session(), |s| render::session(s, zone));
                self.emit(&page.games(), |g| render::games(g, zone));
            }
            Route::SessionGame { game_id, .. } => {
                let game = Loadable::from_result(api.fetch_game(&game_id).await);
                self.emit(&game, |g| format!("{}\n", render::game_line(g, zone)));
            }
            Route::SessionBets { session_id } => {
                let page = SessionBetsPage::new(api, session_id);
                page.load().await;
                self.emit(&page.bets(), |b| render::bets(b));
                if let Some(unpaid) = page.unpaid_total() {
                    println!("Unpaid: {:.2}", unpaid);
                }
            }
            Route::SessionSummary { session_id } => {
                let page = SessionSummaryPage::new(api, session_id);
                page.load().await;
                self.emit(&page.summary(), render::session_summary);
                self.emit(&page.games(), |g| render::games(g, zone));
            }
            Route::SessionBetsSummary { session_id } => {
                let page = SessionBetsSummaryPage::new(api, session_id);
                page.load().await;
                self.emit(&page.summary(), render::bets_summary);
            }
            Route::GameBets { game_id } => {
                let page = GameBetsPage::new(api, game_id);
                page.load().await;
                self.emit(&page.game(), |g| format!("{}\n", render::game_line(g, zone)));
                self.emit(&page.bets(), |b| render::bets(b));
            }
            Route::GameSummary { game_id } => {
                let page = GameSummaryPage::new(api, game_id);
                page.load().await;
                self.emit(&page.summary(), render::game_summary);
            }
            Route::Bet { id } => {
                let page = BetDetailPage::new(api, id);
                page.load().await;
                self.emit(&page.bet(), |b| format!("{}\n", render::bet_line(b)));
            }
            Route::Users => self.list::<User>(api, |u| render::users(u)).await,
            Route::User { id } => {
                let user = Loadable::from_result(api.fetch_user(&id).await);
                self.emit(&user, |u| render::users(std::slice::from_ref(u)));
            }
            Route::Courts => self.list::<Court>(api, |c| render::courts(c)).await,
            Route::Court { id } => {
                let court = Loadable::from_result(api.fetch_court(&id).await);
                self.emit(&court, |c| render::courts(std::slice::from_ref(c)));
            }
            Route::Shuttles => self.list::<Shuttle>(api, |s| render::shuttles(s)).await,
            Route::Shuttle { id } => {
                let shuttle = Loadable::from_result(api.fetch_shuttle(&id).await);
                self.emit(&shuttle, |s| render::shuttles(std::slice::from_ref(s)));
            }
        }
        Ok(())
    }

    async fn list<T: Listed + Serialize>(
        &self,
        api: ArcBackendApi,
        text: impl Fn(&Vec<T>) -> String,
    ) {
        let page = ListPage::<T>::new(api);
        page.load().await;
        self.emit(&page.items(), text);
    }

    async fn priced<F>(
        &self,
        command: PricedCommand,
        text: fn(&[F::Entity]) -> String,
    ) -> anyhow::Result<()>
    where
        F: EntityForm + PricedFields,
        F::Entity: Listed + Serialize,
    {
        let api = self.api()?;
        let list = ListPage::<F::Entity>::new(api.clone());
        let mut panel =
            CrudPanel::<F>::new(api, self.notifier.clone()).with_refresh(Arc::new(Box::new(list.clone())));
        match command {
            PricedCommand::Add {
                name,
                price,
                inactive,
            } => {
                panel.open_create();
                panel.form_mut().apply(Some(name), Some(price), Some(!inactive));
            }
            PricedCommand::Edit {
                id,
                name,
                price,
                active,
            } => {
                panel.open_edit(&id).await?;
                panel.form_mut().apply(name, price, active);
            }
        }
        panel.submit().await?;
        self.emit(&list.items(), |items| text(items));
        Ok(())
    }

    async fn user(&self, command: UserCommand) -> anyhow::Result<()> {
        let api = self.api()?;
        let list = ListPage::<User>::new(api.clone());
        let mut panel = CrudPanel::<UserForm>::new(api, self.notifier.clone())
            .with_refresh(Arc::new(Box::new(list.clone())));
        match command {
            UserCommand::Add(fields) => {
                panel.open_create();
                apply_user_fields(panel.form_mut(), fields);
            }
            UserCommand::Edit { id, fields } => {
                panel.open_edit(&id).await?;
                apply_user_fields(panel.form_mut(), fields);
            }
            UserCommand::Sponsors { id, sponsors } => {
                panel.open_edit(&id).await?;
                panel.form_mut().sponsors = sponsors;
            }
        }
        let user = panel.submit().await?;
        print!("{}", render::users(std::slice::from_ref(&user)));
        Ok(())
    }

    async fn session(&self, command: SessionCommand) -> anyhow::Result<()> {
        let page = SessionsPage::new(self.api()?, self.notifier.clone());
        let session = match command {
            SessionCommand::Start {
                court,
                shuttle,
                players,
            } => {
                page.start_session(StartSessionInput {
                    court,
                    shuttle,
                    available_players: players,
                })
                .await?
            }
            SessionCommand::End { id } => page.end_session(&id).await?,
            SessionCommand::AddPlayers { id, players } => page.add_players(&id, players).await?,
        };
        print!("{}", render::session(&session, self.config.zone));
        Ok(())
    }

    async fn game(&self, command: GameCommand) -> anyhow::Result<()> {
        let zone = self.config.zone;
        match command {
            GameCommand::List => {
                self.list::<Game>(self.api()?, |g| render::games(g, zone))
                    .await;
                Ok(())
            }
            GameCommand::Add {
                session,
                active_court,
                fields,
            } => {
                self.save_game(session, fields, GameTarget::Create { active_court })
                    .await
            }
            GameCommand::Edit {
                session,
                game,
                fields,
                status,
                winner,
            } => {
                let target = GameTarget::Edit {
                    game,
                    status,
                    winner,
                };
                self.save_game(session, fields, target).await
            }
        }
    }

    async fn save_game(
        &self,
        session_id: String,
        fields: GameFields,
        target: GameTarget,
    ) -> anyhow::Result<()> {
        let api = self.api()?;
        let zone = self.config.zone;
        let session = api.fetch_session(&session_id).await?;
        let detail = SessionDetailPage::new(api.clone(), session_id);
        let mut editor = GameEditor::new(api, self.notifier.clone(), session, zone)
            .with_refresh(Arc::new(Box::new(detail.clone())));

        let creating = match target {
            GameTarget::Create { active_court } => {
                editor.set_active_court(active_court);
                editor.open_create();
                true
            }
            GameTarget::Edit {
                game,
                status,
                winner,
            } => {
                editor.open_edit(&game).await?;
                if let Some(status) = status {
                    editor.set_status(status);
                }
                if winner.is_some() {
                    editor.set_winner(winner);
                }
                false
            }
        };
        apply_game_fields(&mut editor, &fields)?;

        let game = editor.submit().await?;
        println!("Saved {}", render::game_line(&game, zone));
        if creating {
            let next = editor.form();
            if let (Some(start), Some(end)) = (next.start, next.end) {
                println!("Next game defaults to {} - {}", start, end);
            }
        }
        self.emit(&detail.games(), |g| render::games(g, zone));
        Ok(())
    }

    async fn bet(&self, command: BetCommand) -> anyhow::Result<()> {
        let api = self.api()?;
        match command {
            BetCommand::List => {
                self.list::<Bet>(api, |b| render::bets(b)).await;
            }
            BetCommand::Add {
                game,
                bet_type,
                amount,
                paid,
                pairs,
            } => {
                let users = api.fetch_users(FetchPolicy::NetworkOnly).await?;
                let rows = pairs
                    .iter()
                    .map(|pair| parse_pair(pair, &users))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let form = BetBatchForm {
                    game_id: game.clone(),
                    bet_type,
                    bet_amount: amount,
                    paid,
                    rows,
                };
                let page = GameBetsPage::new(api.clone(), game);
                let mut panel = BetBatchPanel::new(api, self.notifier.clone())
                    .with_refresh(Arc::new(Box::new(page.clone())));
                let outcome = panel.submit(&form).await?;
                for user in &outcome.created_users {
                    println!("Created bettor {} (@{})", user.name, user.username);
                }
                self.emit(&page.bets(), |b| render::bets(b));
            }
            BetCommand::Paid { id, unpaid } => {
                let mut panel = CrudPanel::<BetForm>::new(api, self.notifier.clone());
                panel.open_edit(&id).await?;
                panel.form_mut().paid = !unpaid;
                let bet = panel.submit().await?;
                println!("{}", render::bet_line(&bet));
            }
        }
        Ok(())
    }
}

enum GameTarget {
    Create {
        active_court: Option<String>,
    },
    Edit {
        game: String,
        status: Option<GameStatus>,
        winner: Option<Side>,
    },
}

/// Courts and shuttles take the same three edits.
pub trait PricedFields {
    fn apply(&mut self, name: Option<String>, price: Option<f64>, active: Option<bool>);
}

macro_rules! priced_fields {
    ($form:ty) => {
        impl PricedFields for $form {
            fn apply(&mut self, name: Option<String>, price: Option<f64>, active: Option<bool>) {
                if let Some(name) = name {
                    self.name = name;
                }
                if let Some(price) = price {
                    self.price = price;
                }
                if let Some(active) = active {
                    self.active = active;
                }
            }
        }
    };
}

priced_fields!(CourtForm);
priced_fields!(ShuttleForm);

fn apply_user_fields(form: &mut UserForm, fields: UserFields) {
    if let Some(name) = fields.name {
        form.name = name;
    }
    if let Some(username) = fields.username {
        form.username = username;
    }
    if fields.contact.is_some() {
        form.contact = fields.contact;
    }
    if fields.password.is_some() {
        form.password = fields.password;
    }
    if let Some(role) = fields.role {
        form.role = role;
    }
    if let Some(active) = fields.active {
        form.active = active;
    }
    if !fields.sponsors.is_empty() {
        form.sponsors = fields.sponsors;
    }
}

fn apply_game_fields(editor: &mut GameEditor, fields: &GameFields) -> anyhow::Result<()> {
    let slots = [
        (PlayerSlot::A1, &fields.a1),
        (PlayerSlot::A2, &fields.a2),
        (PlayerSlot::B1, &fields.b1),
        (PlayerSlot::B2, &fields.b2),
    ];
    for (slot, value) in slots {
        if let Some(value) = value {
            let player = (value != "none").then(|| value.clone());
            editor.set_player(slot, player);
        }
    }
    if let Some(court) = &fields.court {
        editor.set_court(Some(court.clone()));
    }
    if let Some(start) = fields.start {
        editor.set_start(start);
    }
    if let Some(end) = fields.end {
        editor.set_end(Some(end));
    }
    if fields.no_shuttles {
        editor.set_shuttles(vec![ShuttleRow::default()]);
    } else if !fields.shuttles.is_empty() {
        let rows = fields
            .shuttles
            .iter()
            .map(|s| parse_shuttle(s))
            .collect::<anyhow::Result<Vec<_>>>()?;
        editor.set_shuttles(rows);
    }
    Ok(())
}

fn parse_shuttle(arg: &str) -> anyhow::Result<ShuttleRow> {
    let (id, quantity) = match arg.split_once(':') {
        Some((id, quantity)) => {
            let quantity: u32 = quantity
                .trim()
                .parse()
                .with_context(|| format!("Invalid shuttle quantity in '{}'", arg))?;
            (id, quantity)
        }
        None => (arg, 1),
    };
    let id = id.trim();
    if id.is_empty() {
        bail!("Shuttle usage '{}' is missing a shuttle id", arg);
    }
    Ok(ShuttleRow {
        shuttle: Some(id.to_string()),
        quantity: Some(quantity),
    })
}

fn parse_pair(arg: &str, users: &[User]) -> anyhow::Result<BettorPair> {
    let Some((a, b)) = arg.split_once(',') else {
        bail!("Bettor pair '{}' must look like <A>,<B>", arg);
    };
    Ok(BettorPair {
        a: parse_bettor(a, users)?,
        b: parse_bettor(b, users)?,
    })
}

/// Blank, `@id`, an exact name/username match, or a new bettor.
fn parse_bettor(text: &str, users: &[User]) -> anyhow::Result<BettorEntry> {
    let text = text.trim();
    if let Some(id) = text.strip_prefix('@') {
        return Ok(BettorEntry::Existing(id.to_string()));
    }
    let exact: Vec<&User> = search_users(users, text)
        .into_iter()
        .filter(|u| u.name.eq_ignore_ascii_case(text) || u.username.eq_ignore_ascii_case(text))
        .collect();
    match exact.as_slice() {
        [] => Ok(BettorEntry::typed(text)),
        [user] => Ok(BettorEntry::Existing(user.id.clone())),
        _ => bail!("'{}' matches several users; use @<id>", text),
    }
}
