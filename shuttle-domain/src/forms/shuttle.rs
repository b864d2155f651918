use shuttle_client::operations::shuttles::ShuttleInput;
use shuttle_core::Shuttle;
use validator::Validate;

use crate::{FieldError, ServiceResult, api::ArcBackendApi, forms::finite_price, panel::EntityForm};

#[derive(Clone, Debug, PartialEq, Validate)]
pub struct ShuttleForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: f64,
    pub active: bool,
}

impl Default for ShuttleForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: 0.0,
            active: true,
        }
    }
}

impl ShuttleForm {
    fn input(&self) -> ShuttleInput {
        ShuttleInput {
            name: self.name.clone(),
            price: self.price,
            active: self.active,
        }
    }
}

#[async_trait::async_trait]
impl EntityForm for ShuttleForm {
    type Entity = Shuttle;

    const KIND: &'static str = "shuttle";

    async fn fetch(api: &ArcBackendApi, id: &str) -> ServiceResult<Shuttle> {
        api.fetch_shuttle(id).await
    }

    fn from_entity(shuttle: &Shuttle) -> Self {
        Self {
            name: shuttle.name.clone(),
            price: shuttle.price,
            active: shuttle.active,
        }
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    fn extra_errors(&self, _editing: bool) -> Vec<FieldError> {
        finite_price(self.price)
    }

    async fn create(&self, api: &ArcBackendApi) -> ServiceResult<Shuttle> {
        api.create_shuttle(self.input()).await
    }

    async fn update(&self, api: &ArcBackendApi, id: &str) -> ServiceResult<Shuttle> {
        api.update_shuttle(id, self.input()).await
    }
}
