use super::types::HelperCommand;
use crate::bear::CALLBACK_SCHEME;
use crate::error::{HelperError, HelperResult};

/// Parses one input line. Blank lines and `#` comments yield `None`.
///
/// Arguments run to the end of the line, so dates like `Jan 2, 2024` and
/// template names with spaces need no quoting.
pub fn parse(input: &str) -> HelperResult<Option<HelperCommand>> {
    let line = input.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if is_callback_url(line) {
        return Ok(Some(HelperCommand::Callback(line.to_string())));
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, normalize_argument(rest)),
        None => (line, None),
    };

    let command = match (keyword.to_ascii_lowercase().as_str(), rest) {
        ("home", None) => HelperCommand::OpenHome,
        ("daily", date) => HelperCommand::OpenDaily(date),
        ("create-daily", Some(date)) => HelperCommand::CreateDaily(date),
        ("ensure-daily", Some(date)) => HelperCommand::EnsureDaily(date),
        ("sync", None) => HelperCommand::SyncAll,
        ("sync", Some(date)) => HelperCommand::SyncDate(date),
        ("template", Some(name)) => HelperCommand::Template(name),
        ("events", None) => HelperCommand::TodayEvents,
        ("templates", None) => HelperCommand::ListTemplates,
        ("login", Some(state)) => HelperCommand::LaunchAtLogin(parse_switch(&state)?),
        ("click", None) => HelperCommand::Click,
        ("quit" | "exit", None) => HelperCommand::Quit,
        ("create-daily" | "ensure-daily" | "template" | "login", None) => {
            return Err(HelperError::InvalidInput(format!(
                "'{keyword}' needs an argument"
            )))
        }
        ("home" | "events" | "templates" | "click" | "quit" | "exit", Some(_)) => {
            return Err(HelperError::InvalidInput(format!(
                "'{keyword}' takes no argument"
            )))
        }
        _ => {
            return Err(HelperError::InvalidInput(format!(
                "unknown command '{keyword}'"
            )))
        }
    };
    Ok(Some(command))
}

fn is_callback_url(line: &str) -> bool {
    line.split_once("://")
        .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case(CALLBACK_SCHEME))
}

fn parse_switch(state: &str) -> HelperResult<bool> {
    match state.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        other => Err(HelperError::InvalidInput(format!(
            "expected on or off, got '{other}'"
        ))),
    }
}

fn normalize_argument(rest: &str) -> Option<String> {
    let joined = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> HelperCommand {
        parse(input).expect("valid").expect("command")
    }

    #[test]
    fn bare_keywords() {
        assert_eq!(parsed("home"), HelperCommand::OpenHome);
        assert_eq!(parsed("daily"), HelperCommand::OpenDaily(None));
        assert_eq!(parsed("sync"), HelperCommand::SyncAll);
        assert_eq!(parsed("events"), HelperCommand::TodayEvents);
        assert_eq!(parsed("templates"), HelperCommand::ListTemplates);
        assert_eq!(parsed("CLICK"), HelperCommand::Click);
        assert_eq!(parsed("quit"), HelperCommand::Quit);
    }

    #[test]
    fn arguments_keep_inner_spaces() {
        assert_eq!(
            parsed("daily   Jan 2,   2024 "),
            HelperCommand::OpenDaily(Some("Jan 2, 2024".to_string()))
        );
        assert_eq!(
            parsed("template Weekly Review"),
            HelperCommand::Template("Weekly Review".to_string())
        );
        assert_eq!(
            parsed("sync 2024-01-02"),
            HelperCommand::SyncDate("2024-01-02".to_string())
        );
        assert_eq!(
            parsed("ensure-daily 2024-01-02"),
            HelperCommand::EnsureDaily("2024-01-02".to_string())
        );
    }

    #[test]
    fn login_takes_a_switch() {
        assert_eq!(parsed("login on"), HelperCommand::LaunchAtLogin(true));
        assert_eq!(parsed("login OFF"), HelperCommand::LaunchAtLogin(false));
        assert!(matches!(parse("login maybe"), Err(HelperError::InvalidInput(_))));
        assert!(matches!(parse("login"), Err(HelperError::InvalidInput(_))));
    }

    #[test]
    fn callback_urls_pass_through() {
        assert_eq!(
            parsed("  fodabear://sync-note?id=1 "),
            HelperCommand::Callback("fodabear://sync-note?id=1".to_string())
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse("").expect("ok"), None);
        assert_eq!(parse("   ").expect("ok"), None);
        assert_eq!(parse("# note to self").expect("ok"), None);
    }

    #[test]
    fn argument_mistakes_are_rejected() {
        assert!(matches!(parse("create-daily"), Err(HelperError::InvalidInput(_))));
        assert!(matches!(parse("home now"), Err(HelperError::InvalidInput(_))));
        assert!(matches!(parse("launch"), Err(HelperError::InvalidInput(_))));
    }
}
