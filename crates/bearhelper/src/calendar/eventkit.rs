//! EventKit-backed calendar store.
//!
//! Queries run as small Swift scripts fed to `swift -` over stdin; each script
//! prints one JSON document on stdout, or a line starting with `error:`.

use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{HelperError, HelperResult};

use super::store::CalendarStore;
use super::types::{CalendarAuthorization, CalendarEvent, CalendarInfo};

const SCRIPT_PRELUDE: &str = r#"import EventKit
import Foundation

let store = EKEventStore()

func emit(_ value: Any) {
    let data = try! JSONSerialization.data(withJSONObject: value, options: [])
    print(String(data: data, encoding: .utf8)!)
}

func requireAccess() {
    let status = EKEventStore.authorizationStatus(for: .event)
    if #available(macOS 14.0, *) {
        if status != .fullAccess {
            print("error:Calendar access not granted.")
            exit(1)
        }
    } else if status != .authorized {
        print("error:Calendar access not granted.")
        exit(1)
    }
}
"#;

#[derive(Debug, Default)]
pub struct EventKitStore;

impl EventKitStore {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    title: String,
    start: f64,
    end: f64,
    calendar: String,
}

#[async_trait]
impl CalendarStore for EventKitStore {
    fn id(&self) -> &str {
        "eventkit"
    }

    async fn authorization(&self) -> CalendarAuthorization {
        match run_swift_json::<i64>(&authorization_script()).await {
            Ok(raw) => map_authorization(raw),
            Err(error) => {
                tracing::warn!("calendar authorization check failed: {error}");
                CalendarAuthorization::NotDetermined
            }
        }
    }

    async fn request_access(&self) -> HelperResult<bool> {
        run_swift_json::<bool>(&request_access_script()).await
    }

    async fn calendars(&self) -> HelperResult<Vec<CalendarInfo>> {
        run_swift_json::<Vec<CalendarInfo>>(&calendars_script()).await
    }

    async fn events(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
        calendar_ids: &[String],
    ) -> HelperResult<Vec<CalendarEvent>> {
        let script = events_script(start.timestamp(), end.timestamp());
        let ids = calendar_ids_json(calendar_ids)?;
        let raw =
            run_swift_json_with_env::<Vec<RawEvent>>(&script, &[(CALENDAR_IDS_ENV, &ids)]).await?;
        raw.into_iter().map(map_event).collect()
    }
}

fn map_authorization(raw: i64) -> CalendarAuthorization {
    // EKAuthorizationStatus raw values; 4 is write-only access, which cannot read events.
    match raw {
        0 => CalendarAuthorization::NotDetermined,
        1 => CalendarAuthorization::Restricted,
        3 => CalendarAuthorization::Authorized,
        _ => CalendarAuthorization::Denied,
    }
}

fn map_event(raw: RawEvent) -> HelperResult<CalendarEvent> {
    Ok(CalendarEvent {
        title: raw.title,
        start: local_from_epoch(raw.start)?,
        end: local_from_epoch(raw.end)?,
        calendar_id: raw.calendar,
    })
}

fn local_from_epoch(seconds: f64) -> HelperResult<DateTime<Local>> {
    DateTime::<Utc>::from_timestamp(seconds.floor() as i64, 0)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| HelperError::Internal(format!("event timestamp {seconds} out of range")))
}

fn authorization_script() -> String {
    format!("{SCRIPT_PRELUDE}\nprint(EKEventStore.authorizationStatus(for: .event).rawValue)\n")
}

fn request_access_script() -> String {
    format!(
        r#"{SCRIPT_PRELUDE}
let semaphore = DispatchSemaphore(value: 0)
var granted = false
if #available(macOS 14.0, *) {{
    store.requestFullAccessToEvents {{ ok, _ in
        granted = ok
        semaphore.signal()
    }}
}} else {{
    store.requestAccess(to: .event) {{ ok, _ in
        granted = ok
        semaphore.signal()
    }}
}}
semaphore.wait()
print(granted ? "true" : "false")
"#
    )
}

fn calendars_script() -> String {
    format!(
        r#"{SCRIPT_PRELUDE}
requireAccess()
emit(store.calendars(for: .event).map {{ ["id": $0.calendarIdentifier, "title": $0.title] }})
"#
    )
}

/// Environment variable carrying the wanted calendar ids as a JSON array.
const CALENDAR_IDS_ENV: &str = "BEARHELPER_CALENDAR_IDS";

fn calendar_ids_json(calendar_ids: &[String]) -> HelperResult<String> {
    serde_json::to_string(calendar_ids)
        .map_err(|error| HelperError::Internal(format!("calendar id encoding failed: {error}")))
}

fn events_script(start: i64, end: i64) -> String {
    format!(
        r#"{SCRIPT_PRELUDE}
requireAccess()
let idsJson = ProcessInfo.processInfo.environment["{CALENDAR_IDS_ENV}"] ?? "[]"
let wanted = (try? JSONSerialization.jsonObject(with: Data(idsJson.utf8))) as? [String] ?? []
let calendars = store.calendars(for: .event).filter {{ wanted.contains($0.calendarIdentifier) }}
if calendars.isEmpty {{
    emit([] as [Any])
    exit(0)
}}
let start = Date(timeIntervalSince1970: {start})
let end = Date(timeIntervalSince1970: {end})
let predicate = store.predicateForEvents(withStart: start, end: end, calendars: calendars)
emit(store.events(matching: predicate).map {{ event in
    [
        "title": event.title ?? "",
        "start": event.startDate.timeIntervalSince1970,
        "end": event.endDate.timeIntervalSince1970,
        "calendar": event.calendar.calendarIdentifier,
    ] as [String: Any]
}})
"#
    )
}

async fn run_swift_json<T: serde::de::DeserializeOwned>(script: &str) -> HelperResult<T> {
    run_swift_json_with_env(script, &[]).await
}

async fn run_swift_json_with_env<T: serde::de::DeserializeOwned>(
    script: &str,
    env: &[(&str, &str)],
) -> HelperResult<T> {
    let stdout = run_swift_script(script, env).await?;
    serde_json::from_str(stdout.trim())
        .map_err(|error| HelperError::Internal(format!("unexpected EventKit output: {error}")))
}

async fn run_swift_script(script: &str, env: &[(&str, &str)]) -> HelperResult<String> {
    let mut child = Command::new("swift")
        .arg("-")
        .envs(env.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| HelperError::Internal(format!("failed to start swift: {error}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(script.as_bytes())
            .await
            .map_err(|error| HelperError::Internal(format!("failed to send script: {error}")))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|error| HelperError::Internal(format!("swift did not finish: {error}")))?;
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if let Some(message) = stdout.strip_prefix("error:") {
        return Err(HelperError::InvalidInput(message.trim().to_string()));
    }
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let filtered: Vec<&str> = stderr
            .lines()
            .filter(|line| !line.contains("warning:"))
            .collect();
        return Err(HelperError::Internal(format!(
            "swift exited with {}: {}",
            output.status,
            filtered.join("\n")
        )));
    }
    Ok(stdout)
}
