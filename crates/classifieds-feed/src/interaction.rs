//! The UI surface the core talks back to: transient notices and the login modal.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Notification and authentication-interrupt sink.
///
/// A 401 from any authenticated action is reported as a warning notice
/// followed by [`Interaction::open_login`]; it is never shown as a bare error.
pub trait Interaction: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn open_login(&self);
}

/// Routes notices to `tracing`. Used by the CLI, where there is no modal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInteraction;

impl Interaction for TracingInteraction {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!(?level, "{message}"),
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
    }

    fn open_login(&self) {
        tracing::warn!("login required; set CLASSIFIEDS_AUTH_TOKEN and retry");
    }
}
