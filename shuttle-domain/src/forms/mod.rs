mod bet;
mod court;
mod shuttle;
mod user;

pub use bet::BetForm;
pub use court::CourtForm;
pub use shuttle::ShuttleForm;
pub use user::UserForm;

use crate::FieldError;

pub(crate) fn finite_price(price: f64) -> Vec<FieldError> {
    if price.is_finite() {
        Vec::new()
    } else {
        vec![FieldError::new("price", "Price must be a number")]
    }
}
