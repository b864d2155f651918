use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Sink for the short success/failure notices shown after an action.
pub trait Notifier {
    fn notify(&self, level: NoticeLevel, message: &str);
}

pub type ArcNotifier = Arc<Box<dyn Notifier + Send + Sync + 'static>>;

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{}", message),
            NoticeLevel::Error => log::error!("{}", message),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub notices: Arc<Mutex<Vec<(NoticeLevel, String)>>>,
}

#[allow(unused)]
impl MockNotifier {
    pub fn get_notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|(level, _)| *level == NoticeLevel::Error)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().push((level, message.to_string()));
    }
}
