use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};

use super::parser::parse;
use super::types::HelperCommand;
use crate::routing::{CallbackRouter, RouteOutcome};

/// How long commands still running at end of input may take to finish.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Runs one command to completion. `Quit` is handled by [`serve`].
pub async fn execute(router: &CallbackRouter, command: HelperCommand) {
    let workflows = router.workflows();
    match command {
        HelperCommand::OpenHome => workflows.open_home_note().await,
        HelperCommand::OpenDaily(date) => workflows.open_daily_note(date.as_deref()).await,
        HelperCommand::CreateDaily(date) => workflows.create_daily_note(Some(&date)).await,
        HelperCommand::EnsureDaily(date) => {
            let outcome = workflows.ensure_daily_note(Some(&date)).await;
            tracing::info!("daily note lookup for {date}: {outcome:?}");
        }
        HelperCommand::SyncAll => {
            workflows.sync_now().await;
        }
        HelperCommand::SyncDate(date) => workflows.sync_date(Some(&date)).await,
        HelperCommand::Template(name) => {
            workflows.create_note_from_template(&name).await;
        }
        HelperCommand::TodayEvents => workflows.create_note_with_today_events().await,
        HelperCommand::ListTemplates => {
            for name in workflows.note_template_names().await {
                println!("{name}");
            }
        }
        HelperCommand::LaunchAtLogin(enabled) => workflows.set_launch_at_login(enabled).await,
        HelperCommand::Click => workflows.perform_default_action().await,
        HelperCommand::Callback(url) => {
            if let RouteOutcome::Ignored(reason) = router.route(&url).await {
                tracing::debug!("callback not handled: {reason}");
            }
        }
        HelperCommand::Quit => {}
    }
}

/// Reads commands from `input` until end of input or `quit`.
///
/// Each command runs on its own task, so a lookup can be answered by a
/// callback arriving on a later line. Tasks still running afterwards get
/// `grace` to finish and are aborted after that. Returns how many were aborted.
pub async fn serve<R>(router: Arc<CallbackRouter>, input: R, grace: Duration) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut tasks = JoinSet::new();
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("failed to read input: {error}");
                break;
            }
        };
        while let Some(result) = tasks.try_join_next() {
            report(result);
        }

        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                tracing::error!("{error}");
                continue;
            }
        };
        if command == HelperCommand::Quit {
            break;
        }
        let router = Arc::clone(&router);
        tasks.spawn(async move { execute(&router, command).await });
    }

    drain(tasks, grace).await
}

async fn drain(mut tasks: JoinSet<()>, grace: Duration) -> usize {
    if tasks.is_empty() {
        return 0;
    }
    tracing::debug!("waiting for {} running commands", tasks.len());
    let finished = tokio::time::timeout(grace, async {
        while let Some(result) = tasks.join_next().await {
            report(result);
        }
    })
    .await;
    if finished.is_ok() {
        return 0;
    }
    let aborted = tasks.len();
    tracing::warn!("aborting {aborted} commands still running after {grace:?}");
    tasks.shutdown().await;
    aborted
}

fn report(result: Result<(), JoinError>) {
    if let Err(error) = result {
        tracing::error!("command task failed: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::MemoryCalendarStore;
    use crate::context::HelperContext;
    use crate::platform::RecordingPlatform;
    use crate::settings::Settings;
    use crate::workflow::NoteWorkflows;

    fn router(platform: Arc<RecordingPlatform>, lookup_timeout: Duration) -> Arc<CallbackRouter> {
        let ctx = HelperContext::new(
            Settings::default_new(),
            platform,
            Arc::new(MemoryCalendarStore::empty()),
        )
        .expect("context")
        .with_lookup_timeout(lookup_timeout);
        Arc::new(CallbackRouter::new(NoteWorkflows::new(Arc::new(ctx))))
    }

    #[tokio::test]
    async fn execute_runs_workflows_and_routes_callbacks() {
        let platform = Arc::new(RecordingPlatform::new());
        let router = router(platform.clone(), Duration::from_secs(1));
        execute(&router, HelperCommand::SyncDate("2024-01-02".to_string())).await;
        assert_eq!(platform.take_opened().len(), 1);

        execute(
            &router,
            HelperCommand::Callback("fodabear://sync-note?id=N-1".to_string()),
        )
        .await;
        assert!(platform
            .last_opened()
            .expect("fetch")
            .starts_with("bear://x-callback-url/open-note?id=N-1"));
    }

    #[tokio::test]
    async fn serve_waits_for_running_commands() {
        let platform = Arc::new(RecordingPlatform::new());
        let router = router(platform.clone(), Duration::from_millis(50));
        let input: &[u8] = b"ensure-daily 2024-01-02\n";

        let aborted = serve(router, input, Duration::from_secs(5)).await;

        assert_eq!(aborted, 0);
        let opened = platform.opened();
        assert_eq!(opened.len(), 2);
        assert!(opened[0].starts_with("bear://x-callback-url/search?"));
        assert!(opened[1].starts_with("bear://x-callback-url/create?"));
    }

    #[tokio::test]
    async fn serve_stops_at_quit_and_skips_bad_lines() {
        let platform = Arc::new(RecordingPlatform::new());
        let router = router(platform.clone(), Duration::from_secs(1));
        let input: &[u8] = b"bogus\n\nsync 2024-01-02\nquit\nsync 2024-01-03\n";

        assert_eq!(serve(router, input, Duration::from_secs(5)).await, 0);
        assert_eq!(platform.opened().len(), 1);
    }

    #[tokio::test]
    async fn serve_aborts_after_grace_and_withdraws_lookups() {
        let platform = Arc::new(RecordingPlatform::new());
        let router = router(platform.clone(), Duration::from_secs(30));
        let input: &[u8] = b"ensure-daily 2024-01-02\n";

        let aborted = serve(Arc::clone(&router), input, Duration::from_millis(50)).await;

        assert_eq!(aborted, 1);
        assert!(router.workflows().context().pending().is_empty());
        assert_eq!(platform.opened().len(), 1);
    }
}
