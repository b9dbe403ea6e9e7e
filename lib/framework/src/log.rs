use std::time::Instant;

use tokio::task_local;
use tracing::Instrument;
use tracing::Level;
use tracing::debug;
use tracing::info_span;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use crate::exception::CoreRsResult;
use crate::exception::Exception;
use crate::exception::Severity;

task_local! {
    static CURRENT_ACTION_ID: String
}

/// Console logging, filtered by `RUST_LOG` and defaulting to info.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false) // generally cloud log console doesn't support color
                .with_line_number(true)
                .with_thread_ids(true)
                .with_filter(filter),
        )
        .init();
}

macro_rules! log_event {
    (level = $level:expr, error_code = $error_code:expr, $($arg:tt)+) => {
        match ($level, $error_code) {
            (::tracing::Level::WARN, Some(error_code)) => ::tracing::warn!(error_code, $($arg)+),
            (::tracing::Level::WARN, None) => ::tracing::warn!($($arg)+),
            (_, Some(error_code)) => ::tracing::error!(error_code, $($arg)+),
            (_, None) => ::tracing::error!($($arg)+),
        }
    };
}

pub fn random_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Runs `task` as one traceable unit of work, everything logged inside carries the action id.
pub async fn start_action<T>(action: &str, ref_id: Option<String>, task: T)
where
    T: Future<Output = CoreRsResult<()>>,
{
    let action_id = random_id();
    let action_span = info_span!("action", action, action_id, ref_id);
    CURRENT_ACTION_ID
        .scope(
            action_id,
            async {
                let start_time = Instant::now();
                let result = task.await;
                debug!(elapsed = ?start_time.elapsed(), "action finished");
                if let Err(e) = result {
                    log_exception(&e);
                }
            }
            .instrument(action_span),
        )
        .await;
}

pub fn log_exception(e: &Exception) {
    let level = match e.severity {
        Severity::Warn => Level::WARN,
        Severity::Error => Level::ERROR,
    };
    let message = &e.message;
    log_event!(
        level = level,
        error_code = e.code,
        trace = e.to_string(),
        "{message}"
    );
}

pub fn current_action_id() -> Option<String> {
    CURRENT_ACTION_ID.try_with(Clone::clone).ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn random_id() {
        let first = super::random_id();
        let second = super::random_id();
        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn current_action_id() {
        assert_eq!(super::current_action_id(), None);
        super::start_action("test", None, async {
            assert!(super::current_action_id().is_some());
            Ok(())
        })
        .await;
    }
}
