use shuttle_client::operations::bets::{BetInput, BetUpdateInput};
use shuttle_core::{Bet, GameId, UserId};
use validator::Validate;

use crate::{FieldError, ServiceError, ServiceResult, api::ArcBackendApi, panel::EntityForm};

/// Single-bet form used by the edit dialog. Batch entry lives in
/// [`crate::betting`].
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct BetForm {
    pub game_id: Option<GameId>,
    #[validate(length(min = 1, message = "Bet type is required"))]
    pub bet_type: String,
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub bet_amount: f64,
    pub paid: bool,
    pub active: bool,
    #[validate(length(min = 1, message = "Bettor for side A is required"))]
    pub bettor_for_a: UserId,
    #[validate(length(min = 1, message = "Bettor for side B is required"))]
    pub bettor_for_b: UserId,
}

#[async_trait::async_trait]
impl EntityForm for BetForm {
    type Entity = Bet;

    const KIND: &'static str = "bet";

    async fn fetch(api: &ArcBackendApi, id: &str) -> ServiceResult<Bet> {
        api.fetch_bet(id).await
    }

    fn from_entity(bet: &Bet) -> Self {
        Self {
            game_id: bet.game_id.clone(),
            bet_type: bet.bet_type.clone(),
            bet_amount: bet.bet_amount,
            paid: bet.paid,
            active: bet.active,
            bettor_for_a: bet.bettor_for_a.id.clone(),
            bettor_for_b: bet.bettor_for_b.id.clone(),
        }
    }

    fn normalize(&mut self) {
        self.bet_type = self.bet_type.trim().to_string();
    }

    fn extra_errors(&self, editing: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !self.bet_amount.is_finite() {
            errors.push(FieldError::new("bet_amount", "Amount must be a number"));
        }
        if !editing && self.game_id.is_none() {
            errors.push(FieldError::new("game_id", "Game is required"));
        }
        errors
    }

    async fn create(&self, api: &ArcBackendApi) -> ServiceResult<Bet> {
        let Some(game_id) = self.game_id.clone() else {
            return ServiceError::invalid("game_id", "Game is required");
        };
        api.create_bet(BetInput {
            game_id,
            bet_type: self.bet_type.clone(),
            bet_amount: self.bet_amount,
            paid: self.paid,
            bettor_for_a: self.bettor_for_a.clone(),
            bettor_for_b: self.bettor_for_b.clone(),
        })
        .await
    }

    async fn update(&self, api: &ArcBackendApi, id: &str) -> ServiceResult<Bet> {
        api.update_bet(
            id,
            BetUpdateInput {
                bet_type: self.bet_type.clone(),
                bet_amount: self.bet_amount,
                paid: self.paid,
                active: self.active,
                bettor_for_a: self.bettor_for_a.clone(),
                bettor_for_b: self.bettor_for_b.clone(),
            },
        )
        .await
    }
}
