use std::future::Future;
use std::sync::LazyLock;

use tokio_util::task::TaskTracker;
use tracing::debug;
use tracing::info;

use crate::exception::CoreRsResult;
use crate::log;
use crate::log::current_action_id;

static TASK_TRACKER: LazyLock<TaskTracker> = LazyLock::new(TaskTracker::new);

/// Detaches `task` as its own action, referencing the action that spawned it.
pub fn spawn_action<T>(name: &'static str, task: T)
where
    T: Future<Output = CoreRsResult<()>> + Send + 'static,
{
    let ref_id = current_action_id();
    TASK_TRACKER.spawn(async move {
        log::start_action(name, ref_id, async {
            debug!(task = name, "context");
            task.await
        })
        .await;
    });
}

pub async fn shutdown() {
    info!("waiting for {} task(s) to finish", TASK_TRACKER.len());
    TASK_TRACKER.close();
    TASK_TRACKER.wait().await;
    info!("tasks finished");
}
