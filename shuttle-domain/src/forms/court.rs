use shuttle_client::operations::courts::CourtInput;
use shuttle_core::Court;
use validator::Validate;

use crate::{FieldError, ServiceResult, api::ArcBackendApi, forms::finite_price, panel::EntityForm};

#[derive(Clone, Debug, PartialEq, Validate)]
pub struct CourtForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: f64,
    pub active: bool,
}

impl Default for CourtForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: 0.0,
            active: true,
        }
    }
}

impl CourtForm {
    fn input(&self) -> CourtInput {
        CourtInput {
            name: self.name.clone(),
            price: self.price,
            active: self.active,
        }
    }
}

#[async_trait::async_trait]
impl EntityForm for CourtForm {
    type Entity = Court;

    const KIND: &'static str = "court";

    async fn fetch(api: &ArcBackendApi, id: &str) -> ServiceResult<Court> {
        api.fetch_court(id).await
    }

    fn from_entity(court: &Court) -> Self {
        Self {
            name: court.name.clone(),
            price: court.price,
            active: court.active,
        }
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    fn extra_errors(&self, _editing: bool) -> Vec<FieldError> {
        finite_price(self.price)
    }

    async fn create(&self, api: &ArcBackendApi) -> ServiceResult<Court> {
        api.create_court(self.input()).await
    }

    async fn update(&self, api: &ArcBackendApi, id: &str) -> ServiceResult<Court> {
        api.update_court(id, self.input()).await
    }
}

#[cfg(test)]
mod tests {
    use crate::validate_fields;

    use super::*;

    #[test]
    fn test_court_validation() {
        let mut form = CourtForm {
            name: "Court 1".to_string(),
            price: -5.0,
            active: true,
        };
        let errors = validate_fields(&form);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "price");
        assert_eq!(errors[0].message, "Price must be greater than 0");

        form.price = 0.01;
        assert!(validate_fields(&form).is_empty());

        form.price = f64::NAN;
        assert_eq!(form.extra_errors(false).len(), 1);
    }
}
