use std::sync::Arc;
use std::time::Duration;

use bearhelper::bear::encoding::parse_query;
use bearhelper::bear::encode;
use bearhelper::calendar::{CalendarEvent, CalendarInfo, MemoryCalendarStore};
use bearhelper::pending::{LookupOutcome, NoteSnapshot};
use bearhelper::platform::RecordingPlatform;
use bearhelper::{CallbackRouter, HelperContext, NoteWorkflows, RouteOutcome, Settings};
use chrono::{Local, TimeZone};

fn param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    parse_query(query)
        .into_iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value)
}

fn setup() -> (CallbackRouter, Arc<RecordingPlatform>) {
    let mut settings = Settings::default_new();
    settings.selected_calendar_ids = vec!["work".to_string()];
    settings.daily_note_tag = "journal".to_string();

    let start = Local
        .with_ymd_and_hms(2024, 1, 2, 9, 0, 0)
        .single()
        .expect("time");
    let store = MemoryCalendarStore::new(
        vec![CalendarInfo {
            id: "work".to_string(),
            title: "Work".to_string(),
        }],
        vec![CalendarEvent {
            title: "Standup".to_string(),
            start,
            end: start + chrono::Duration::minutes(30),
            calendar_id: "work".to_string(),
        }],
    );
    let platform = Arc::new(RecordingPlatform::new());
    let ctx = HelperContext::new(settings, platform.clone(), Arc::new(store))
        .expect("context")
        .with_lookup_timeout(Duration::from_secs(5));
    (
        CallbackRouter::new(NoteWorkflows::new(Arc::new(ctx))),
        platform,
    )
}

#[tokio::test]
async fn sync_round_trip_fills_calendar_block() {
    let (router, platform) = setup();
    router.workflows().sync_date(Some("2024-01-02")).await;

    let request = platform.take_opened().pop().expect("fetch sent");
    let success = param(&request, "x-success").expect("x-success");
    let callback = format!(
        "{success}&title=2024-01-02&identifier=N-1&note={}",
        encode("# 2024-01-02\n## Calendar Events\n- [ ] old\n\nnotes")
    );
    assert!(matches!(router.route(&callback).await, RouteOutcome::Dispatched(_)));

    let update = platform.last_opened().expect("update sent");
    assert_eq!(param(&update, "id").as_deref(), Some("N-1"));
    assert!(param(&update, "text")
        .expect("text")
        .contains("- [x] 09:00 - 09:30: Standup"));

    // The same callback a second time has nothing left to resume.
    platform.take_opened();
    assert!(matches!(router.route(&callback).await, RouteOutcome::Ignored(_)));
    assert!(platform.opened().is_empty());
}

#[tokio::test]
async fn ensure_daily_resolves_through_search_callback() {
    let (router, platform) = setup();
    let workflows = router.workflows().clone();
    let waiter = tokio::spawn(async move { workflows.ensure_daily_note(Some("2024-01-02")).await });

    let search = loop {
        if let Some(url) = platform.last_opened() {
            break url;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    assert!(search.starts_with("bear://x-callback-url/search?"));
    assert_eq!(param(&search, "tag").as_deref(), Some("journal"));

    let success = param(&search, "x-success").expect("x-success");
    let notes = r#"[{"title":"2024-01-02","identifier":"N-7"}]"#;
    let callback = format!("{success}&notes={}", encode(notes));
    assert!(matches!(router.route(&callback).await, RouteOutcome::Dispatched(_)));

    let outcome = waiter.await.expect("join");
    assert_eq!(
        outcome,
        LookupOutcome::Found(NoteSnapshot {
            id: "N-7".to_string(),
            title: "2024-01-02".to_string(),
        })
    );
    assert!(platform
        .last_opened()
        .expect("sync sent")
        .starts_with("bear://x-callback-url/open-note?id=N-7"));
}

#[tokio::test]
async fn missing_daily_note_is_created_from_template() {
    let (router, platform) = setup();
    router.workflows().open_daily_note(Some("2024-01-02")).await;

    let open = platform.take_opened().pop().expect("open sent");
    let error = param(&open, "x-error").expect("x-error");
    assert!(matches!(router.route(&error).await, RouteOutcome::Dispatched(_)));

    let create = platform.last_opened().expect("create sent");
    assert!(create.starts_with("bear://x-callback-url/create?"));
    assert_eq!(param(&create, "tags").as_deref(), Some("daily,journal"));
    assert!(param(&create, "x-success")
        .expect("x-success")
        .starts_with("fodabear://replace-sync-placeholder?request_id="));
}
