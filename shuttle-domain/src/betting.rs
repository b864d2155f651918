use std::collections::HashMap;

use shuttle_client::operations::{bets::BetInput, users::UserInput};
use shuttle_core::{Bet, GameId, Role, User, UserId};

use crate::{
    FieldError, ServiceError, ServiceResult,
    api::ArcBackendApi,
    describe,
    notify::{ArcNotifier, NoticeLevel},
    panel::{ArcRefresh, PendingFlag},
};

/// One side of a bettor pair as typed by the operator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BettorEntry {
    #[default]
    Blank,
    Existing(UserId),
    NewName(String),
}

impl BettorEntry {
    /// Free text; blank text stays blank.
    pub fn typed(text: &str) -> Self {
        match text.trim() {
            "" => BettorEntry::Blank,
            name => BettorEntry::NewName(name.to_string()),
        }
    }

    fn resolved(&self) -> Option<ResolvedBettor> {
        match self {
            BettorEntry::Blank => None,
            BettorEntry::Existing(id) => Some(ResolvedBettor::Existing(id.clone())),
            BettorEntry::NewName(name) => match name.trim() {
                "" => None,
                name => Some(ResolvedBettor::New(name.to_string())),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BettorPair {
    pub a: BettorEntry,
    pub b: BettorEntry,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedBettor {
    Existing(UserId),
    New(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPair {
    pub a: ResolvedBettor,
    pub b: ResolvedBettor,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BetBatchForm {
    pub game_id: GameId,
    pub bet_type: String,
    pub bet_amount: f64,
    pub paid: bool,
    pub rows: Vec<BettorPair>,
}

impl BetBatchForm {
    /// Applies carry-forward and validates, without touching the network.
    ///
    /// A blank side on any row after the first takes the previous row's
    /// resolved bettor for that side. The first row must name both.
    pub fn resolve(&self) -> ServiceResult<Vec<ResolvedPair>> {
        let mut errors = Vec::new();
        if self.bet_type.trim().is_empty() {
            errors.push(FieldError::new("bet_type", "Bet type is required"));
        }
        if !self.bet_amount.is_finite() || self.bet_amount < 0.0 {
            errors.push(FieldError::new("bet_amount", "Amount cannot be negative"));
        }
        if self.rows.is_empty() {
            errors.push(FieldError::new("rows", "At least one bettor pair is required"));
        }

        let mut pairs: Vec<ResolvedPair> = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let previous = pairs.last();
            let a = row.a.resolved().or_else(|| previous.map(|p| p.a.clone()));
            let b = row.b.resolved().or_else(|| previous.map(|p| p.b.clone()));
            match (a, b) {
                (Some(a), Some(b)) => pairs.push(ResolvedPair { a, b }),
                (a, b) => {
                    if a.is_none() {
                        errors.push(FieldError::new(format!("rows[{}].a", i), "Bettor is required"));
                    }
                    if b.is_none() {
                        errors.push(FieldError::new(format!("rows[{}].b", i), "Bettor is required"));
                    }
                    // later rows cannot inherit from an unresolved row
                    break;
                }
            }
        }

        if errors.is_empty() {
            Ok(pairs)
        } else {
            Err(ServiceError::Invalid(errors))
        }
    }
}

/// Existing users whose name or username contains `query`, case-insensitively.
pub fn search_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    users
        .iter()
        .filter(|u| u.active)
        .filter(|u| {
            u.name.to_lowercase().contains(&query) || u.username.to_lowercase().contains(&query)
        })
        .collect()
}

/// Username given to a bettor created from free text.
pub fn username_for(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BetBatchOutcome {
    pub bets: Vec<Bet>,
    pub created_users: Vec<User>,
}

pub struct BetBatchPanel {
    api: ArcBackendApi,
    notifier: ArcNotifier,
    on_saved: Option<ArcRefresh>,
    pending: PendingFlag,
    errors: Vec<FieldError>,
}

impl BetBatchPanel {
    pub fn new(api: ArcBackendApi, notifier: ArcNotifier) -> Self {
        Self {
            api,
            notifier,
            on_saved: None,
            pending: PendingFlag::default(),
            errors: Vec::new(),
        }
    }

    pub fn with_refresh(mut self, hook: ArcRefresh) -> Self {
        self.on_saved = Some(hook);
        self
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn pending(&self) -> PendingFlag {
        self.pending.clone()
    }

    pub async fn submit(&mut self, form: &BetBatchForm) -> ServiceResult<BetBatchOutcome> {
        let Some(_guard) = self.pending.try_begin() else {
            return ServiceError::not_possible("A save is already in progress");
        };
        let pairs = match form.resolve() {
            Ok(pairs) => pairs,
            Err(e) => {
                self.errors = e.field_errors().to_vec();
                return Err(e);
            }
        };
        self.errors.clear();

        let mut outcome = BetBatchOutcome::default();
        match self.create_all(form, &pairs, &mut outcome).await {
            Ok(()) => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("Recorded {} bet(s)", outcome.bets.len()),
                );
                if let Some(hook) = &self.on_saved {
                    hook.refresh().await;
                }
                Ok(outcome)
            }
            Err(e) => {
                log::warn!(
                    "Bet batch for game {} stopped after {} of {} bets: {}",
                    form.game_id,
                    outcome.bets.len(),
                    pairs.len(),
                    e
                );
                self.notifier
                    .notify(NoticeLevel::Error, &describe("record bets", &e));
                if !outcome.bets.is_empty() {
                    if let Some(hook) = &self.on_saved {
                        hook.refresh().await;
                    }
                }
                Err(e)
            }
        }
    }

    async fn create_all(
        &self,
        form: &BetBatchForm,
        pairs: &[ResolvedPair],
        outcome: &mut BetBatchOutcome,
    ) -> ServiceResult<()> {
        let mut created: HashMap<String, UserId> = HashMap::new();
        for pair in pairs {
            let a = self.bettor_id(&pair.a, &mut created, outcome).await?;
            let b = self.bettor_id(&pair.b, &mut created, outcome).await?;
            let bet = self
                .api
                .create_bet(BetInput {
                    game_id: form.game_id.clone(),
                    bet_type: form.bet_type.trim().to_string(),
                    bet_amount: form.bet_amount,
                    paid: form.paid,
                    bettor_for_a: a,
                    bettor_for_b: b,
                })
                .await?;
            outcome.bets.push(bet);
        }
        Ok(())
    }

    async fn bettor_id(
        &self,
        bettor: &ResolvedBettor,
        created: &mut HashMap<String, UserId>,
        outcome: &mut BetBatchOutcome,
    ) -> ServiceResult<UserId> {
        let name = match bettor {
            ResolvedBettor::Existing(id) => return Ok(id.clone()),
            ResolvedBettor::New(name) => name,
        };
        let key = name.to_lowercase();
        if let Some(id) = created.get(&key) {
            return Ok(id.clone());
        }
        let user = self
            .api
            .create_user(UserInput {
                name: name.clone(),
                username: username_for(name),
                contact: None,
                password: None,
                role: Role::User,
                active: true,
            })
            .await?;
        log::info!("Created bettor {} ({})", user.name, user.id);
        created.insert(key, user.id.clone());
        let id = user.id.clone();
        outcome.created_users.push(user);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{api::mock::MockBackendApi, notify::MockNotifier};

    use super::*;

    fn pair(a: &str, b: &str) -> BettorPair {
        BettorPair {
            a: BettorEntry::typed(a),
            b: BettorEntry::typed(b),
        }
    }

    fn form(rows: Vec<BettorPair>) -> BetBatchForm {
        BetBatchForm {
            game_id: "g1".to_string(),
            bet_type: "Winner".to_string(),
            bet_amount: 20.0,
            paid: false,
            rows,
        }
    }

    fn panel(api: &MockBackendApi) -> BetBatchPanel {
        BetBatchPanel::new(
            Arc::new(Box::new(api.clone())),
            Arc::new(Box::new(MockNotifier::default())),
        )
    }

    #[test]
    fn test_blank_side_carries_forward() {
        let pairs = form(vec![pair("Alice", "Bob"), pair("", "Carol")])
            .resolve()
            .expect("resolved");
        assert_eq!(pairs[1].a, ResolvedBettor::New("Alice".to_string()));
        assert_eq!(pairs[1].b, ResolvedBettor::New("Carol".to_string()));
    }

    #[test]
    fn test_carry_forward_chains_and_keeps_existing_ids() {
        let rows = vec![
            BettorPair {
                a: BettorEntry::Existing("u1".to_string()),
                b: BettorEntry::typed("Bob"),
            },
            pair("", "Carol"),
            pair("  ", "Dan"),
        ];
        let pairs = form(rows).resolve().expect("resolved");
        assert!(
            pairs
                .iter()
                .all(|p| p.a == ResolvedBettor::Existing("u1".to_string()))
        );
    }

    #[test]
    fn test_incomplete_first_row_is_rejected() {
        for row in [pair("Alice", ""), pair("", "Bob"), pair("", "")] {
            let err = form(vec![row, pair("Carol", "Dan")]).resolve().unwrap_err();
            assert!(err.field_errors().iter().all(|e| e.field.starts_with("rows[0]")));
        }
        let err = form(vec![]).resolve().unwrap_err();
        assert_eq!(err.field_errors()[0].field, "rows");
    }

    #[tokio::test]
    async fn test_invalid_batch_makes_no_calls() {
        let api = MockBackendApi::default();
        let mut panel = panel(&api);
        let result = panel.submit(&form(vec![pair("Alice", "")])).await;
        assert!(matches!(result, Err(ServiceError::Invalid(_))));
        assert_eq!(panel.errors()[0].field, "rows[0].b");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_bettor_created_once() {
        let api = MockBackendApi::default();
        let mut panel = panel(&api);
        let outcome = panel
            .submit(&form(vec![
                pair("Alice", "Bob"),
                pair("", "Carol"),
                pair("alice", "Dan"),
            ]))
            .await
            .expect("batch recorded");

        assert_eq!(outcome.bets.len(), 3);
        let names: Vec<&str> = outcome.created_users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol", "Dan"]);
        assert_eq!(api.call_count("createUser"), 4);

        let state = api.state.lock();
        let alice = &outcome.created_users[0].id;
        assert!(state.bet_inputs.iter().all(|b| &b.bettor_for_a == alice));
        assert!(state.bet_inputs.iter().all(|b| b.game_id == "g1"));
        assert_eq!(state.user_inputs[0].1.username, "alice");
    }

    #[test]
    fn test_search_users() {
        let user = |id: &str, name: &str, active: bool| User {
            id: id.to_string(),
            name: name.to_string(),
            username: username_for(name),
            contact: None,
            role: Role::User,
            active,
            sponsors: Vec::new(),
        };
        let users = vec![
            user("1", "Mary Ann", true),
            user("2", "Ann Lee", false),
            user("3", "Bob", true),
        ];
        let found: Vec<&str> = search_users(&users, "ANN").iter().map(|u| u.id.as_str()).collect();
        assert_eq!(found, vec!["1"]);
        assert!(search_users(&users, " ").is_empty());
        assert_eq!(username_for("  Mary   Ann "), "mary.ann");
    }
}
