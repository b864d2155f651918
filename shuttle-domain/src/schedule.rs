use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use shuttle_client::operations::games::{GameInput, ShuttleUsageInput};
use shuttle_core::{
    ClockTime, CourtId, Game, GameId, GameStatus, Session, ShuttleId, Side, UserId, UserRef,
};

use crate::{
    FieldError, ServiceError, ServiceResult,
    api::ArcBackendApi,
    describe,
    notify::{ArcNotifier, NoticeLevel},
    panel::{ArcRefresh, PendingFlag},
};

/// How far a create-mode start may sit before its anchor before it is taken
/// to mean the following day.
const EARLY_START_HOURS: i64 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerSlot {
    A1,
    A2,
    B1,
    B2,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 4] = [PlayerSlot::A1, PlayerSlot::A2, PlayerSlot::B1, PlayerSlot::B2];

    fn index(self) -> usize {
        match self {
            PlayerSlot::A1 => 0,
            PlayerSlot::A2 => 1,
            PlayerSlot::B1 => 2,
            PlayerSlot::B2 => 3,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShuttleRow {
    pub shuttle: Option<ShuttleId>,
    pub quantity: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameForm {
    pub players: [Option<UserId>; 4],
    pub court: Option<CourtId>,
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
    pub shuttles: Vec<ShuttleRow>,
    pub status: GameStatus,
    pub winner: Option<Side>,
}

impl GameForm {
    pub fn player(&self, slot: PlayerSlot) -> Option<&UserId> {
        self.players[slot.index()].as_ref()
    }

    fn from_game(game: &Game, zone: FixedOffset) -> Self {
        let mut shuttles: Vec<ShuttleRow> = game
            .shuttles_used
            .iter()
            .map(|usage| ShuttleRow {
                shuttle: Some(usage.shuttle.id.clone()),
                quantity: Some(usage.quantity),
            })
            .collect();
        if shuttles.is_empty() {
            shuttles.push(ShuttleRow::default());
        }
        let id = |user: &UserRef| user.id.clone();
        Self {
            players: [
                Some(id(&game.a1)),
                game.a2.as_ref().map(id),
                Some(id(&game.b1)),
                game.b2.as_ref().map(id),
            ],
            court: game.court.as_ref().map(|c| c.id.clone()),
            start: Some(ClockTime::from_instant(game.start, zone)),
            end: game.end.map(|end| ClockTime::from_instant(end, zone)),
            shuttles,
            status: game.status,
            winner: game.winner,
        }
    }
}

/// Inputs the create-mode defaults are derived from.
#[derive(Clone, Copy, Debug)]
pub struct DefaultsContext<'a> {
    pub session: &'a Session,
    pub active_court: Option<&'a CourtId>,
    pub zone: FixedOffset,
}

impl DefaultsContext<'_> {
    /// One minute after the last game's end, or 5:00 PM.
    pub fn start(&self) -> ClockTime {
        match self.session.last_game().and_then(|game| game.end) {
            Some(end) => ClockTime::from_instant(end, self.zone).plus_minutes(1),
            None => ClockTime::FIVE_PM,
        }
    }

    pub fn court(&self) -> Option<CourtId> {
        self.active_court
            .cloned()
            .or_else(|| self.session.court.as_ref().map(|c| c.id.clone()))
    }

    pub fn shuttles(&self) -> Vec<ShuttleRow> {
        vec![ShuttleRow {
            shuttle: self.session.shuttle.as_ref().map(|s| s.id.clone()),
            quantity: Some(1),
        }]
    }

    pub fn form(&self) -> GameForm {
        let start = self.start();
        GameForm {
            players: Default::default(),
            court: self.court(),
            start: Some(start),
            end: Some(start.top_of_hour()),
            shuttles: self.shuttles(),
            status: GameStatus::Ongoing,
            winner: None,
        }
    }

    /// Calendar date a new game starting at `start` falls on. The anchor is
    /// the last game's end (or its start while it runs), else the session
    /// start; a clock value well before the anchor belongs to the next day.
    pub fn date_for(&self, start: ClockTime) -> NaiveDate {
        let anchor = self
            .session
            .last_game()
            .map(|game| game.end.unwrap_or(game.start))
            .unwrap_or(self.session.start);
        let date = local_date(anchor, self.zone);
        if start.to_instant(date, self.zone) < anchor - Duration::hours(EARLY_START_HOURS) {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        }
    }
}

fn local_date(instant: DateTime<Utc>, zone: FixedOffset) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Creating,
    Editing { game_id: GameId },
    Submitting { game_id: Option<GameId> },
}

/// Create/edit flow for the games of one session.
pub struct GameEditor {
    api: ArcBackendApi,
    notifier: ArcNotifier,
    on_saved: Option<ArcRefresh>,
    zone: FixedOffset,
    session: Session,
    active_court: Option<CourtId>,
    state: EditorState,
    form: GameForm,
    end_touched: bool,
    /// Date of the game being edited.
    edit_date: Option<NaiveDate>,
    errors: Vec<FieldError>,
    pending: PendingFlag,
}

impl GameEditor {
    pub fn new(
        api: ArcBackendApi,
        notifier: ArcNotifier,
        session: Session,
        zone: FixedOffset,
    ) -> Self {
        Self {
            api,
            notifier,
            on_saved: None,
            zone,
            session,
            active_court: None,
            state: EditorState::Closed,
            form: GameForm::default(),
            end_touched: false,
            edit_date: None,
            errors: Vec::new(),
            pending: PendingFlag::default(),
        }
    }

    pub fn with_refresh(mut self, hook: ArcRefresh) -> Self {
        self.on_saved = Some(hook);
        self
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn form(&self) -> &GameForm {
        &self.form
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn pending(&self) -> PendingFlag {
        self.pending.clone()
    }

    fn defaults(&self) -> DefaultsContext<'_> {
        DefaultsContext {
            session: &self.session,
            active_court: self.active_court.as_ref(),
            zone: self.zone,
        }
    }

    fn reapply_defaults(&mut self) {
        if self.state != EditorState::Creating {
            return;
        }
        let defaults = self.defaults();
        let start = defaults.start();
        let court = defaults.court();
        let shuttles = defaults.shuttles();
        self.form.start = Some(start);
        self.form.court = court;
        self.form.shuttles = shuttles;
        if !self.end_touched {
            self.form.end = Some(start.top_of_hour());
        }
    }

    pub fn set_active_court(&mut self, court: Option<CourtId>) {
        self.active_court = court;
        self.reapply_defaults();
    }

    /// Swaps in a fresher copy of the session.
    pub fn sync_session(&mut self, session: Session) {
        self.session = session;
        self.reapply_defaults();
    }

    pub fn open_create(&mut self) {
        self.end_touched = false;
        self.form = self.defaults().form();
        self.edit_date = None;
        self.errors.clear();
        self.state = EditorState::Creating;
    }

    pub async fn open_edit(&mut self, game_id: &str) -> ServiceResult<()> {
        let game = match self.api.fetch_game(game_id).await {
            Ok(game) => game,
            Err(e) => {
                self.notifier
                    .notify(NoticeLevel::Error, &describe("load game", &e));
                return Err(e);
            }
        };
        self.form = GameForm::from_game(&game, self.zone);
        self.edit_date = Some(local_date(game.start, self.zone));
        self.errors.clear();
        self.state = EditorState::Editing {
            game_id: game.id.clone(),
        };
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = EditorState::Closed;
        self.form = GameForm::default();
        self.edit_date = None;
        self.errors.clear();
    }

    pub fn set_start(&mut self, start: ClockTime) {
        self.form.start = Some(start);
        if self.state == EditorState::Creating && !self.end_touched {
            self.form.end = Some(start.top_of_hour());
        }
    }

    pub fn set_end(&mut self, end: Option<ClockTime>) {
        self.form.end = end;
        self.end_touched = true;
    }

    pub fn set_player(&mut self, slot: PlayerSlot, player: Option<UserId>) {
        self.form.players[slot.index()] = player;
    }

    pub fn set_court(&mut self, court: Option<CourtId>) {
        self.form.court = court;
    }

    pub fn set_shuttles(&mut self, rows: Vec<ShuttleRow>) {
        self.form.shuttles = rows;
    }

    pub fn set_status(&mut self, status: GameStatus) {
        self.form.status = status;
    }

    pub fn set_winner(&mut self, winner: Option<Side>) {
        self.form.winner = winner;
    }

    /// Session players not already placed in one of the other slots.
    pub fn slot_options(&self, slot: PlayerSlot) -> Vec<&UserRef> {
        let taken: HashSet<&UserId> = PlayerSlot::ALL
            .iter()
            .filter(|other| **other != slot)
            .filter_map(|other| self.form.player(*other))
            .collect();
        self.session
            .available_players
            .iter()
            .filter(|player| !taken.contains(&player.id))
            .collect()
    }

    /// Validates the form and builds the request body.
    pub fn package(&self, editing: bool) -> ServiceResult<GameInput> {
        let mut errors = Vec::new();
        let required = |slot: PlayerSlot, errors: &mut Vec<FieldError>| {
            let player = self.form.player(slot).cloned();
            if player.is_none() {
                errors.push(FieldError::new(
                    format!("{:?}", slot),
                    "Player is required",
                ));
            }
            player
        };
        let a1 = required(PlayerSlot::A1, &mut errors);
        let b1 = required(PlayerSlot::B1, &mut errors);
        for slot in PlayerSlot::ALL {
            let Some(player) = self.form.player(slot) else {
                continue;
            };
            if !self.slot_options(slot).iter().any(|p| &p.id == player) {
                errors.push(FieldError::new(
                    format!("{:?}", slot),
                    "Player is not available for this slot",
                ));
            }
        }
        if self.form.court.is_none() {
            errors.push(FieldError::new("court", "Court is required"));
        }
        if self.form.start.is_none() {
            errors.push(FieldError::new("start", "Start time is required"));
        }
        let shuttles_used = match package_shuttles(&self.form.shuttles) {
            Ok(rows) => rows,
            Err(row_errors) => {
                errors.extend(row_errors);
                Vec::new()
            }
        };
        let (Some(a1), Some(b1), Some(court), Some(start), true) = (
            a1,
            b1,
            self.form.court.clone(),
            self.form.start,
            errors.is_empty(),
        ) else {
            return Err(ServiceError::Invalid(errors));
        };

        let date = match (editing, self.edit_date) {
            (true, Some(date)) => date,
            _ => self.defaults().date_for(start),
        };
        Ok(GameInput {
            session_id: self.session.id.clone(),
            start: start.to_instant(date, self.zone),
            end: self.form.end.map(|end| end.to_instant(date, self.zone)),
            status: if editing {
                self.form.status
            } else {
                GameStatus::Ongoing
            },
            winner: self.form.winner,
            a1,
            a2: self.form.player(PlayerSlot::A2).cloned(),
            b1,
            b2: self.form.player(PlayerSlot::B2).cloned(),
            court,
            shuttles_used,
        })
    }

    pub async fn submit(&mut self) -> ServiceResult<Game> {
        let game_id = match &self.state {
            EditorState::Closed => return ServiceError::not_possible("No game is open"),
            EditorState::Submitting { .. } => {
                return ServiceError::not_possible("A save is already in progress");
            }
            EditorState::Creating => None,
            EditorState::Editing { game_id } => Some(game_id.clone()),
        };
        let Some(_guard) = self.pending.try_begin() else {
            return ServiceError::not_possible("A save is already in progress");
        };

        let input = match self.package(game_id.is_some()) {
            Ok(input) => input,
            Err(e) => {
                self.errors = e.field_errors().to_vec();
                return Err(e);
            }
        };
        self.errors.clear();

        let previous = std::mem::replace(
            &mut self.state,
            EditorState::Submitting {
                game_id: game_id.clone(),
            },
        );
        let result = match &game_id {
            None => {
                log::debug!("Creating game in session {} without an idempotency key", self.session.id);
                self.api.create_game(input).await
            }
            Some(id) => self.api.update_game(id, input).await,
        };
        let game = match result {
            Ok(game) => game,
            Err(e) => {
                log::warn!("Saving game failed: {}", e);
                self.notifier
                    .notify(NoticeLevel::Error, &describe("save game", &e));
                self.state = previous;
                return Err(e);
            }
        };

        match self.api.fetch_session(&self.session.id).await {
            Ok(session) => self.session = session,
            Err(e) => log::warn!("Failed to refresh session {}: {}", self.session.id, e),
        }
        if let Some(hook) = &self.on_saved {
            hook.refresh().await;
        }

        self.state = EditorState::Closed;
        if game_id.is_none() {
            // next game starts where this one ended
            self.end_touched = false;
            self.form = self.defaults().form();
            self.notifier.notify(NoticeLevel::Success, "Game created");
        } else {
            self.form = GameForm::default();
            self.notifier.notify(NoticeLevel::Success, "Game updated");
        }
        Ok(game)
    }
}

/// A lone row without a shuttle means no shuttles were used.
fn package_shuttles(rows: &[ShuttleRow]) -> Result<Vec<ShuttleUsageInput>, Vec<FieldError>> {
    if let [only] = rows {
        if only.shuttle.is_none() {
            return Ok(Vec::new());
        }
    }
    let mut errors = Vec::new();
    let mut usages = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match (&row.shuttle, row.quantity) {
            (Some(shuttle), Some(quantity)) if quantity > 0 => usages.push(ShuttleUsageInput {
                shuttle: shuttle.clone(),
                quantity,
            }),
            (None, _) => errors.push(FieldError::new(
                format!("shuttles[{}].shuttle", i),
                "Shuttle is required",
            )),
            (Some(_), _) => errors.push(FieldError::new(
                format!("shuttles[{}].quantity", i),
                "Quantity must be at least 1",
            )),
        }
    }
    if errors.is_empty() {
        Ok(usages)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use shuttle_core::{Court, SessionGame, Shuttle};

    use crate::{api::mock::MockBackendApi, notify::MockNotifier};

    use super::*;

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn clock(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn player(id: &str) -> UserRef {
        UserRef {
            id: id.to_string(),
            name: id.to_uppercase(),
        }
    }

    fn session(games: Vec<SessionGame>) -> Session {
        Session {
            id: "s1".to_string(),
            // 5:30 PM on 2024-03-09 in UTC+8
            start: Utc.with_ymd_and_hms(2024, 3, 9, 9, 30, 0).unwrap(),
            end: None,
            court: Some(Court {
                id: "c1".to_string(),
                name: "Court 1".to_string(),
                price: 200.0,
                active: true,
            }),
            shuttle: Some(Shuttle {
                id: "sh1".to_string(),
                name: "Feather".to_string(),
                price: 90.0,
                active: true,
            }),
            available_players: vec![player("p1"), player("p2"), player("p3"), player("p4")],
            games,
        }
    }

    fn finished_at(hour: u32, minute: u32) -> SessionGame {
        SessionGame {
            id: "g0".to_string(),
            start: Utc.with_ymd_and_hms(2024, 3, 9, 9, 40, 0).unwrap(),
            end: Some(Utc.with_ymd_and_hms(2024, 3, 9, hour, minute, 0).unwrap()),
        }
    }

    fn editor(api: &MockBackendApi, notifier: &MockNotifier, session: Session) -> GameEditor {
        api.seed(|state| {
            state.sessions.push(session.clone());
            state.courts.extend(session.court.clone());
            state.shuttles.extend(session.shuttle.clone());
        });
        GameEditor::new(
            Arc::new(Box::new(api.clone())),
            Arc::new(Box::new(notifier.clone())),
            session,
            zone(),
        )
    }

    fn fill_players(editor: &mut GameEditor) {
        editor.set_player(PlayerSlot::A1, Some("p1".to_string()));
        editor.set_player(PlayerSlot::B1, Some("p2".to_string()));
    }

    #[test]
    fn test_defaults_follow_last_game() {
        // 10:47 UTC is 6:47 PM in UTC+8
        let session = session(vec![finished_at(10, 47)]);
        let mut editor = editor(&MockBackendApi::default(), &MockNotifier::default(), session);
        editor.open_create();

        let form = editor.form();
        assert_eq!(form.start, Some(clock("6:48 PM")));
        assert_eq!(form.end, Some(clock("6:00 PM")));
        assert_eq!(form.court.as_deref(), Some("c1"));
        assert_eq!(
            form.shuttles,
            vec![ShuttleRow {
                shuttle: Some("sh1".to_string()),
                quantity: Some(1)
            }]
        );
    }

    #[test]
    fn test_defaults_without_finished_game() {
        let mut ongoing = finished_at(10, 47);
        ongoing.end = None;
        for games in [vec![], vec![ongoing]] {
            let mut editor = editor(
                &MockBackendApi::default(),
                &MockNotifier::default(),
                session(games),
            );
            editor.open_create();
            assert_eq!(editor.form().start, Some(ClockTime::FIVE_PM));
            assert_eq!(editor.form().end, Some(ClockTime::FIVE_PM));
        }
    }

    #[test]
    fn test_active_court_wins() {
        let mut editor = editor(
            &MockBackendApi::default(),
            &MockNotifier::default(),
            session(vec![]),
        );
        editor.open_create();
        editor.set_active_court(Some("c9".to_string()));
        assert_eq!(editor.form().court.as_deref(), Some("c9"));
    }

    #[test]
    fn test_manual_end_survives_recompute() {
        let mut editor = editor(
            &MockBackendApi::default(),
            &MockNotifier::default(),
            session(vec![]),
        );
        editor.open_create();
        editor.set_start(clock("7:13 PM"));
        assert_eq!(editor.form().end, Some(clock("7:00 PM")));

        editor.set_end(Some(clock("7:45 PM")));
        editor.set_start(clock("8:05 PM"));
        assert_eq!(editor.form().end, Some(clock("7:45 PM")));

        editor.sync_session(session(vec![finished_at(10, 47)]));
        assert_eq!(editor.form().start, Some(clock("6:48 PM")));
        assert_eq!(editor.form().end, Some(clock("7:45 PM")));

        editor.open_create();
        editor.set_start(clock("9:20 PM"));
        assert_eq!(editor.form().end, Some(clock("9:00 PM")));
    }

    #[test]
    fn test_selected_player_hidden_from_other_slots() {
        let mut editor = editor(
            &MockBackendApi::default(),
            &MockNotifier::default(),
            session(vec![]),
        );
        editor.open_create();
        editor.set_player(PlayerSlot::A1, Some("p1".to_string()));

        let ids = |slot| -> Vec<String> {
            editor
                .slot_options(slot)
                .iter()
                .map(|p| p.id.clone())
                .collect()
        };
        assert_eq!(ids(PlayerSlot::A1), vec!["p1", "p2", "p3", "p4"]);
        for slot in [PlayerSlot::A2, PlayerSlot::B1, PlayerSlot::B2] {
            assert_eq!(ids(slot), vec!["p2", "p3", "p4"]);
        }
    }

    #[tokio::test]
    async fn test_placeholder_shuttle_row_sends_empty_list() {
        let api = MockBackendApi::default();
        let mut editor = editor(&api, &MockNotifier::default(), session(vec![]));
        editor.open_create();
        fill_players(&mut editor);
        editor.set_shuttles(vec![ShuttleRow::default()]);

        editor.submit().await.expect("game created");
        let state = api.state.lock();
        let (_, input) = &state.game_inputs[0];
        assert!(input.shuttles_used.is_empty());
        assert_eq!(input.status, GameStatus::Ongoing);
        assert_eq!(input.a2, None);
        assert_eq!(input.start, Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_create_rolls_forward() {
        let api = MockBackendApi::default();
        let notifier = MockNotifier::default();
        let mut editor = editor(&api, &notifier, session(vec![]));
        editor.open_create();
        fill_players(&mut editor);
        editor.set_start(clock("5:10 PM"));
        editor.set_end(Some(clock("5:32 PM")));

        editor.submit().await.expect("game created");
        assert_eq!(editor.state(), &EditorState::Closed);
        assert_eq!(editor.session().games.len(), 1);
        assert_eq!(editor.form().start, Some(clock("5:33 PM")));
        assert_eq!(editor.form().end, Some(clock("5:00 PM")));
        assert_eq!(editor.form().players, [None, None, None, None]);
        assert_eq!(api.calls(), vec!["createGame", "fetchSession"]);
        assert_eq!(
            notifier.get_notices(),
            vec![(NoticeLevel::Success, "Game created".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failure_preserves_input() {
        let api = MockBackendApi::default();
        api.fail_on("createGame");
        let notifier = MockNotifier::default();
        let mut editor = editor(&api, &notifier, session(vec![]));
        editor.open_create();
        fill_players(&mut editor);
        let before = editor.form().clone();

        assert!(editor.submit().await.is_err());
        assert_eq!(editor.state(), &EditorState::Creating);
        assert_eq!(editor.form(), &before);
        assert_eq!(notifier.errors().len(), 1);
        assert!(!editor.pending().is_pending());
    }

    #[tokio::test]
    async fn test_validation_blocks_submit() {
        let api = MockBackendApi::default();
        let mut editor = editor(&api, &MockNotifier::default(), session(vec![]));
        editor.open_create();
        editor.set_shuttles(vec![
            ShuttleRow {
                shuttle: Some("sh1".to_string()),
                quantity: None,
            },
            ShuttleRow::default(),
        ]);

        let err = editor.submit().await.unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["A1", "B1", "shuttles[0].quantity", "shuttles[1].shuttle"]
        );
        assert_eq!(editor.errors().len(), 4);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edit_passes_status_and_uses_game_date() {
        let api = MockBackendApi::default();
        let session = session(vec![]);
        let mut editor = editor(&api, &MockNotifier::default(), session.clone());
        let game = Game {
            id: "g1".to_string(),
            session_id: Some(session.id.clone()),
            // 1:15 AM on 2024-03-10 in UTC+8
            start: Utc.with_ymd_and_hms(2024, 3, 9, 17, 15, 0).unwrap(),
            end: None,
            status: GameStatus::Ongoing,
            winner: None,
            a1: player("p1"),
            a2: Some(player("p3")),
            b1: player("p2"),
            b2: Some(player("p4")),
            court: session.court.clone(),
            shuttles_used: Vec::new(),
            active: true,
        };
        api.seed(|state| state.games.push(game));

        editor.open_edit("g1").await.expect("game loaded");
        assert_eq!(
            editor.state(),
            &EditorState::Editing {
                game_id: "g1".to_string()
            }
        );
        assert_eq!(editor.form().start, Some(clock("1:15 AM")));
        assert_eq!(editor.form().shuttles, vec![ShuttleRow::default()]);

        editor.set_status(GameStatus::Completed);
        editor.set_winner(Some(Side::B));
        editor.set_end(Some(clock("1:40 AM")));
        let updated = editor.submit().await.expect("game updated");
        assert_eq!(updated.status, GameStatus::Completed);

        let state = api.state.lock();
        let (id, input) = &state.game_inputs[0];
        assert_eq!(id.as_deref(), Some("g1"));
        assert_eq!(input.winner, Some(Side::B));
        assert_eq!(input.b2.as_deref(), Some("p4"));
        assert_eq!(
            input.end,
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 17, 40, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_slot_conflicts_block_submit() {
        let api = MockBackendApi::default();
        let mut editor = editor(&api, &MockNotifier::default(), session(vec![]));
        editor.open_create();
        editor.set_player(PlayerSlot::A1, Some("p1".to_string()));
        editor.set_player(PlayerSlot::B1, Some("p1".to_string()));
        editor.set_player(PlayerSlot::B2, Some("stranger".to_string()));

        let err = editor.submit().await.unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["A1", "B1", "B2"]);
        assert!(api.calls().is_empty());
        assert!(api.state.lock().game_inputs.is_empty());
    }

    #[test]
    fn test_date_for_rolls_past_midnight() {
        let mut late = session(vec![]);
        // 11:30 PM on 2024-03-09 in UTC+8
        late.start = Utc.with_ymd_and_hms(2024, 3, 9, 15, 30, 0).unwrap();
        let defaults = DefaultsContext {
            session: &late,
            active_court: None,
            zone: zone(),
        };
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(defaults.date_for(clock("11:45 PM")), day);
        assert_eq!(defaults.date_for(clock("6:00 PM")), day);
        assert_eq!(defaults.date_for(clock("12:40 AM")), day.succ_opt().unwrap());
    }

    #[tokio::test]
    async fn test_default_start_after_midnight_uses_next_day() {
        // last game ends 12:20 AM / 11:59 PM local
        for (end, expected) in [((16, 20), (16, 21)), ((15, 59), (16, 0))] {
            let api = MockBackendApi::default();
            let mut late = session(vec![finished_at(end.0, end.1)]);
            late.start = Utc.with_ymd_and_hms(2024, 3, 9, 15, 30, 0).unwrap();
            let mut editor = editor(&api, &MockNotifier::default(), late);
            editor.open_create();
            fill_players(&mut editor);
            editor.submit().await.expect("game created");

            let state = api.state.lock();
            let (_, input) = &state.game_inputs[0];
            assert_eq!(
                input.start,
                Utc.with_ymd_and_hms(2024, 3, 9, expected.0, expected.1, 0).unwrap()
            );
        }
    }
}
