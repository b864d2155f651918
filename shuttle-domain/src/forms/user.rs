use std::collections::HashSet;

use shuttle_client::operations::users::UserInput;
use shuttle_core::{Role, User, UserId};
use validator::Validate;

use crate::{FieldError, ServiceResult, api::ArcBackendApi, panel::EntityForm};

#[derive(Clone, Debug, PartialEq, Validate)]
pub struct UserForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    pub contact: Option<String>,
    /// Never pre-filled; left empty on edit to keep the current password.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Role,
    pub active: bool,
    pub sponsors: Vec<UserId>,
    loaded_sponsors: Vec<UserId>,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            username: String::new(),
            contact: None,
            password: None,
            role: Role::User,
            active: true,
            sponsors: Vec::new(),
            loaded_sponsors: Vec::new(),
        }
    }
}

impl UserForm {
    fn input(&self) -> UserInput {
        UserInput {
            name: self.name.clone(),
            username: self.username.clone(),
            contact: self.contact.clone(),
            password: self.password.clone(),
            role: self.role,
            active: self.active,
        }
    }

    fn sponsors_changed(&self) -> bool {
        let mut current = self.sponsors.clone();
        let mut loaded = self.loaded_sponsors.clone();
        current.sort();
        loaded.sort();
        current != loaded
    }
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl EntityForm for UserForm {
    type Entity = User;

    const KIND: &'static str = "user";

    async fn fetch(api: &ArcBackendApi, id: &str) -> ServiceResult<User> {
        api.fetch_user(id).await
    }

    fn from_entity(user: &User) -> Self {
        let sponsors: Vec<UserId> = user.sponsors.iter().map(|s| s.id.clone()).collect();
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            contact: user.contact.clone(),
            password: None,
            role: user.role,
            active: user.active,
            loaded_sponsors: sponsors.clone(),
            sponsors,
        }
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.username = self.username.trim().to_string();
        self.contact = blank_to_none(&self.contact);
        self.password = self.password.take().filter(|p| !p.is_empty());
        let mut seen = HashSet::new();
        self.sponsors.retain(|id| seen.insert(id.clone()));
    }

    fn extra_errors(&self, editing: bool) -> Vec<FieldError> {
        if !editing && self.password.is_none() {
            return vec![FieldError::new("password", "Password is required")];
        }
        Vec::new()
    }

    async fn create(&self, api: &ArcBackendApi) -> ServiceResult<User> {
        let user = api.create_user(self.input()).await?;
        if self.sponsors.is_empty() {
            return Ok(user);
        }
        api.update_user_sponsors(&user.id, self.sponsors.clone())
            .await
    }

    async fn update(&self, api: &ArcBackendApi, id: &str) -> ServiceResult<User> {
        let user = api.update_user(id, self.input()).await?;
        if !self.sponsors_changed() {
            return Ok(user);
        }
        api.update_user_sponsors(id, self.sponsors.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shuttle_core::UserRef;

    use crate::{
        ServiceError,
        api::mock::MockBackendApi,
        notify::{ArcNotifier, MockNotifier},
        panel::CrudPanel,
    };

    use super::*;

    fn user(id: &str, sponsors: &[&str]) -> User {
        User {
            id: id.to_string(),
            name: format!("Player {}", id),
            username: id.to_string(),
            contact: None,
            role: Role::User,
            active: true,
            sponsors: sponsors
                .iter()
                .map(|s| UserRef {
                    id: s.to_string(),
                    name: s.to_string(),
                })
                .collect(),
        }
    }

    fn panel(api: &MockBackendApi) -> CrudPanel<UserForm> {
        let notifier: ArcNotifier = Arc::new(Box::new(MockNotifier::default()));
        CrudPanel::new(Arc::new(Box::new(api.clone())), notifier)
    }

    #[tokio::test]
    async fn test_create_requires_password() {
        let api = MockBackendApi::default();
        let mut panel = panel(&api);
        panel.open_create();
        panel.form_mut().name = "Ana".to_string();
        panel.form_mut().username = "ana".to_string();
        panel.form_mut().password = Some(String::new());

        let err = panel.submit().await.unwrap_err();
        assert!(matches!(&err, ServiceError::Invalid(fields) if fields[0].field == "password"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_sponsors_issues_second_call() {
        let api = MockBackendApi::default();
        api.seed(|state| state.users.push(user("boss", &[])));
        let mut panel = panel(&api);
        panel.open_create();
        let form = panel.form_mut();
        form.name = "Ana".to_string();
        form.username = "ana".to_string();
        form.contact = Some("  ".to_string());
        form.password = Some("secret1".to_string());
        form.sponsors = vec!["boss".to_string()];

        let created = panel.submit().await.expect("user created");
        assert_eq!(created.sponsors[0].id, "boss");
        assert_eq!(api.calls(), vec!["createUser", "updateUserSponsors"]);
        let state = api.state.lock();
        assert_eq!(state.user_inputs[0].1.contact, None);
    }

    #[tokio::test]
    async fn test_edit_leaves_password_and_unchanged_sponsors_alone() {
        let api = MockBackendApi::default();
        api.seed(|state| {
            state.users.push(user("boss", &[]));
            state.users.push(user("u1", &["boss"]));
        });
        let mut panel = panel(&api);
        panel.open_edit("u1").await.expect("user loaded");
        assert_eq!(panel.form().password, None);
        panel.form_mut().name = "Renamed".to_string();

        panel.submit().await.expect("user updated");
        assert_eq!(api.calls(), vec!["fetchUser", "updateUser"]);
        let state = api.state.lock();
        let (id, input) = &state.user_inputs[0];
        assert_eq!(id.as_deref(), Some("u1"));
        assert_eq!(input.password, None);
    }
}
