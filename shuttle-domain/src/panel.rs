use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use validator::Validate;

use crate::{
    FieldError, ServiceError, ServiceResult,
    api::ArcBackendApi,
    describe,
    notify::{ArcNotifier, NoticeLevel},
    validate_fields,
};

/// Marks a submission in flight. Only one guard can exist at a time.
#[derive(Clone, Default)]
pub struct PendingFlag(Arc<AtomicBool>);

pub struct PendingGuard(Arc<AtomicBool>);

impl PendingFlag {
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn try_begin(&self) -> Option<PendingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PendingGuard(self.0.clone()))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Re-fetch hook run by a panel after a successful save.
#[async_trait::async_trait]
pub trait Refresh {
    async fn refresh(&self);
}

pub type ArcRefresh = Arc<Box<dyn Refresh + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait EntityForm: Validate + Clone + Default + Send + Sync + 'static {
    type Entity: Clone + Send + Sync;

    const KIND: &'static str;

    async fn fetch(api: &ArcBackendApi, id: &str) -> ServiceResult<Self::Entity>;

    fn from_entity(entity: &Self::Entity) -> Self;

    /// Trims and blanks optional inputs before validation.
    fn normalize(&mut self) {}

    /// Checks that depend on whether the form creates or edits.
    fn extra_errors(&self, _editing: bool) -> Vec<FieldError> {
        Vec::new()
    }

    async fn create(&self, api: &ArcBackendApi) -> ServiceResult<Self::Entity>;

    async fn update(&self, api: &ArcBackendApi, id: &str) -> ServiceResult<Self::Entity>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelMode {
    Closed,
    Create,
    Edit(String),
}

/// Shared create/edit flow for the reference-data entities.
pub struct CrudPanel<F: EntityForm> {
    api: ArcBackendApi,
    notifier: ArcNotifier,
    on_saved: Option<ArcRefresh>,
    mode: PanelMode,
    form: F,
    errors: Vec<FieldError>,
    pending: PendingFlag,
}

impl<F: EntityForm> CrudPanel<F> {
    pub fn new(api: ArcBackendApi, notifier: ArcNotifier) -> Self {
        Self {
            api,
            notifier,
            on_saved: None,
            mode: PanelMode::Closed,
            form: F::default(),
            errors: Vec::new(),
            pending: PendingFlag::default(),
        }
    }

    pub fn with_refresh(mut self, hook: ArcRefresh) -> Self {
        self.on_saved = Some(hook);
        self
    }

    pub fn mode(&self) -> &PanelMode {
        &self.mode
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn pending(&self) -> PendingFlag {
        self.pending.clone()
    }

    pub fn open_create(&mut self) {
        self.mode = PanelMode::Create;
        self.form = F::default();
        self.errors.clear();
    }

    pub async fn open_edit(&mut self, id: &str) -> ServiceResult<()> {
        let entity = match F::fetch(&self.api, id).await {
            Ok(entity) => entity,
            Err(e) => {
                self.notifier
                    .notify(NoticeLevel::Error, &describe(format!("load {}", F::KIND), &e));
                return Err(e);
            }
        };
        self.form = F::from_entity(&entity);
        self.mode = PanelMode::Edit(id.to_string());
        self.errors.clear();
        Ok(())
    }

    pub fn close(&mut self) {
        self.mode = PanelMode::Closed;
        self.form = F::default();
        self.errors.clear();
    }

    pub async fn submit(&mut self) -> ServiceResult<F::Entity> {
        let editing = match &self.mode {
            PanelMode::Closed => return ServiceError::not_possible("Nothing is open for editing"),
            PanelMode::Create => None,
            PanelMode::Edit(id) => Some(id.clone()),
        };
        let Some(_guard) = self.pending.try_begin() else {
            return ServiceError::not_possible("A save is already in progress");
        };

        self.form.normalize();
        let mut errors = validate_fields(&self.form);
        errors.extend(self.form.extra_errors(editing.is_some()));
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(ServiceError::Invalid(errors));
        }
        self.errors.clear();

        let result = match &editing {
            None => self.form.create(&self.api).await,
            Some(id) => self.form.update(&self.api, id).await,
        };
        match result {
            Ok(entity) => {
                let verb = if editing.is_some() { "updated" } else { "created" };
                self.notifier
                    .notify(NoticeLevel::Success, &format!("{} {}", capitalize(F::KIND), verb));
                self.close();
                if let Some(hook) = &self.on_saved {
                    hook.refresh().await;
                }
                Ok(entity)
            }
            Err(e) => {
                log::warn!("Saving {} failed: {}", F::KIND, e);
                self.notifier
                    .notify(NoticeLevel::Error, &describe(format!("save {}", F::KIND), &e));
                Err(e)
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
