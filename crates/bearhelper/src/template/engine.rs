use chrono::NaiveDate;
use regex::Regex;

use crate::calendar::NO_EVENTS_MESSAGE;
use crate::dates::DateFormat;
use crate::error::{HelperError, HelperResult};
use crate::utils::time::today_local;

pub const DEFAULT_CALENDAR_SECTION_HEADER: &str = "## Calendar Events";
pub const DEFAULT_DAILY_SECTION_HEADER: &str = "## Daily";

const DATE_PLACEHOLDER_PATTERN: &str = r"%date\(([-+]?\d*)\)%";

/// Outcome of a structural section edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionEdit {
    Replaced(String),
    /// The section header was not found; carries the original content.
    Unchanged(String),
}

impl SectionEdit {
    pub fn is_replaced(&self) -> bool {
        matches!(self, SectionEdit::Replaced(_))
    }

    pub fn content(&self) -> &str {
        match self {
            SectionEdit::Replaced(content) | SectionEdit::Unchanged(content) => content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            SectionEdit::Replaced(content) | SectionEdit::Unchanged(content) => content,
        }
    }
}

/// Resolves `%date(N)%` placeholders and rewrites the calendar and daily-link sections.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    date_format: DateFormat,
    calendar_header: String,
    daily_header: String,
    placeholder: Regex,
    calendar_block: Regex,
    daily_block: Regex,
}

impl TemplateEngine {
    pub fn new(
        date_format: DateFormat,
        calendar_header: &str,
        daily_header: &str,
    ) -> HelperResult<Self> {
        let placeholder = compile(DATE_PLACEHOLDER_PATTERN)?;
        // Header line, then checklist lines (or the no-events line) up to the first other line.
        let calendar_block = compile(&format!(
            r"(?m)^{}(?:\n|\z)(?:- \[[ xX]\] [^\n]*(?:\n|\z)|{}(?:\n|\z))*",
            regex::escape(calendar_header),
            regex::escape(NO_EVENTS_MESSAGE),
        ))?;
        let daily_block = compile(&format!(
            r"(?m)^{}\n- \[\[[^\[\]\n]*\]\]",
            regex::escape(daily_header)
        ))?;

        Ok(Self {
            date_format,
            calendar_header: calendar_header.to_string(),
            daily_header: daily_header.to_string(),
            placeholder,
            calendar_block,
            daily_block,
        })
    }

    pub fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    /// Substitutes every `%date(N)%` relative to `anchor`, a date in the configured format.
    ///
    /// An anchor that does not parse falls back to today.
    pub fn render_placeholders(&self, content: &str, anchor: &str) -> String {
        let anchor_date = match self.date_format.parse(anchor) {
            Ok(date) => date,
            Err(error) => {
                tracing::warn!("template anchor '{anchor}' unusable, using today: {error}");
                today_local()
            }
        };
        self.render_placeholders_at(content, anchor_date)
    }

    pub fn render_placeholders_at(&self, content: &str, anchor: NaiveDate) -> String {
        let matches: Vec<_> = self
            .placeholder
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let days = caps
                    .get(1)
                    .and_then(|offset| offset.as_str().parse::<i64>().ok())
                    .unwrap_or(0);
                Some((whole.range(), days))
            })
            .collect();

        let mut rendered = content.to_string();
        // Back to front, so earlier offsets stay valid.
        for (range, days) in matches.into_iter().rev() {
            match self.date_format.format_offset(anchor, days) {
                Some(value) => rendered.replace_range(range, &value),
                None => tracing::warn!("date placeholder offset {days} out of range"),
            }
        }
        rendered
    }

    /// Replaces the calendar header and the checklist block below it with `events`.
    pub fn replace_calendar_section(&self, content: &str, events: &str) -> SectionEdit {
        let Some(found) = self.calendar_block.find(content) else {
            return SectionEdit::Unchanged(content.to_string());
        };

        let mut updated = String::with_capacity(content.len() + events.len());
        updated.push_str(&content[..found.start()]);
        updated.push_str(&self.calendar_header);
        updated.push('\n');
        if !events.is_empty() {
            updated.push_str(events);
            updated.push('\n');
        }
        updated.push_str(&content[found.end()..]);
        SectionEdit::Replaced(updated)
    }

    /// Points the `- [[date]]` link under the daily header at `date`.
    pub fn replace_daily_section(&self, content: &str, date: &str) -> SectionEdit {
        let Some(found) = self.daily_block.find(content) else {
            return SectionEdit::Unchanged(content.to_string());
        };

        let updated = format!(
            "{}{}\n- [[{}]]{}",
            &content[..found.start()],
            self.daily_header,
            date,
            &content[found.end()..]
        );
        SectionEdit::Replaced(updated)
    }

    /// Body for a freshly created daily note: placeholders, then the calendar block.
    pub fn render_daily_note(&self, content: &str, date: &str, events: &str) -> String {
        let rendered = self.render_placeholders(content, date);
        self.replace_calendar_section(&rendered, events).into_content()
    }

    /// Home-note refresh. The daily link is updated before the calendar block.
    pub fn refresh_home_note(&self, content: &str, date: &str, events: &str) -> String {
        let daily = self.replace_daily_section(content, date);
        if !daily.is_replaced() {
            tracing::debug!("home note has no '{}' section", self.daily_header);
        }
        let calendar = self.replace_calendar_section(daily.content(), events);
        if !calendar.is_replaced() {
            tracing::debug!("home note has no '{}' section", self.calendar_header);
        }
        calendar.into_content()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(
            DateFormat::default(),
            DEFAULT_CALENDAR_SECTION_HEADER,
            DEFAULT_DAILY_SECTION_HEADER,
        )
        .expect("default template patterns compile")
    }
}

fn compile(pattern: &str) -> HelperResult<Regex> {
    Regex::new(pattern)
        .map_err(|error| HelperError::Internal(format!("invalid template pattern: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TemplateEngine {
        TemplateEngine::default()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn date_placeholders_use_calendar_arithmetic() {
        let engine = engine();
        let out = engine.render_placeholders(
            "prev %date(-1)% today %date()% zero %date(0)% next %date(+1)% plain %date(1)%",
            "2024-01-31",
        );
        assert_eq!(
            out,
            "prev 2024-01-30 today 2024-01-31 zero 2024-01-31 next 2024-02-01 plain 2024-02-01"
        );
    }

    #[test]
    fn placeholders_cross_year_boundaries() {
        let engine = engine();
        assert_eq!(
            engine.render_placeholders_at("%date(-1)%|%date(+366)%", date(2024, 1, 1)),
            "2023-12-31|2025-01-01"
        );
    }

    #[test]
    fn placeholders_with_long_format_keep_offsets_valid() {
        let format = DateFormat::new("EEEE, MMMM d, yyyy").expect("pattern");
        let engine = TemplateEngine::new(format, "## Calendar Events", "## Daily").expect("engine");
        let template = "[%date(-1)%] [%date()%] [%date(+1)%]";
        let out = engine.render_placeholders_at(template, date(2024, 2, 28));
        assert_eq!(
            out,
            concat!(
                "[Tuesday, February 27, 2024] [Wednesday, February 28, 2024] ",
                "[Thursday, February 29, 2024]",
            )
        );
    }

    #[test]
    fn malformed_placeholders_are_left_alone() {
        let engine = engine();
        let content = "%date(x)% %date(+)% %date% date(1)";
        let out = engine.render_placeholders_at(content, date(2024, 5, 1));
        assert_eq!(out, "%date(x)% 2024-05-01 %date% date(1)");
    }

    #[test]
    fn unparsable_anchor_falls_back_to_today() {
        let engine = engine();
        let out = engine.render_placeholders("%date()%", "not-a-date");
        assert_eq!(out, today_local().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn calendar_section_replaces_header_and_checklist() {
        let engine = engine();
        let content = concat!(
            "# 2024-01-01\n## Calendar Events\n",
            "- [ ] 08:00 - 09:00: Old\n- [x] 07:00 - 07:30: Older\n## Notes\nkeep\n",
        );
        let edit = engine.replace_calendar_section(content, "- [ ] 10:00 - 11:00: New");
        assert_eq!(
            edit,
            SectionEdit::Replaced(
                "# 2024-01-01\n## Calendar Events\n- [ ] 10:00 - 11:00: New\n## Notes\nkeep\n"
                    .to_string()
            )
        );
    }

    #[test]
    fn calendar_section_missing_is_unchanged() {
        let engine = engine();
        let content = "# Title\n### Calendar Events\n- [ ] x\n";
        let edit = engine.replace_calendar_section(content, "- [ ] 10:00 - 11:00: New");
        assert_eq!(edit, SectionEdit::Unchanged(content.to_string()));
        assert!(!edit.is_replaced());
    }

    #[test]
    fn calendar_section_is_idempotent() {
        let engine = engine();
        let content = "intro\n## Calendar Events\n- [ ] 01:00 - 02:00: Stale\ntail";
        for events in [
            "- [x] 09:00 - 09:30: Standup\n- [ ] 13:00 - 14:00: Review",
            NO_EVENTS_MESSAGE,
            "",
        ] {
            let once = engine.replace_calendar_section(content, events).into_content();
            let twice = engine.replace_calendar_section(&once, events).into_content();
            assert_eq!(once, twice, "events {events:?}");
            assert!(once.ends_with("tail"));
        }
    }

    #[test]
    fn calendar_section_at_end_without_newline() {
        let engine = engine();
        let edit = engine.replace_calendar_section(
            "a\n## Calendar Events\n- [ ] 01:00 - 02:00: x",
            "- [ ] 03:00 - 04:00: y",
        );
        assert_eq!(edit.content(), "a\n## Calendar Events\n- [ ] 03:00 - 04:00: y\n");
    }

    #[test]
    fn custom_calendar_header_is_matched_literally() {
        let engine = TemplateEngine::new(DateFormat::default(), "## Agenda (today)", "## Daily")
            .expect("engine");
        let edit = engine.replace_calendar_section("## Agenda (today)\n- [ ] old\n", "- [ ] new");
        assert_eq!(edit.content(), "## Agenda (today)\n- [ ] new\n");
    }

    #[test]
    fn daily_section_swaps_link_date() {
        let engine = engine();
        let content = "# Home\n## Daily\n- [[2024-01-01]]\n\n## Calendar Events\n";
        let edit = engine.replace_daily_section(content, "2024-01-02");
        assert_eq!(
            edit,
            SectionEdit::Replaced(
                "# Home\n## Daily\n- [[2024-01-02]]\n\n## Calendar Events\n".to_string()
            )
        );
    }

    #[test]
    fn daily_section_requires_link_on_next_line() {
        let engine = engine();
        let content = "## Daily\n\n- [[2024-01-01]]";
        assert_eq!(
            engine.replace_daily_section(content, "2024-01-02"),
            SectionEdit::Unchanged(content.to_string())
        );
    }

    #[test]
    fn home_refresh_updates_link_then_calendar() {
        let engine = engine();
        let content =
            "## Daily\n- [[2024-01-01]]\n## Calendar Events\n- [ ] 01:00 - 02:00: Old\nend";
        let out = engine.refresh_home_note(content, "2024-01-02", "- [ ] 09:00 - 10:00: New");
        assert_eq!(
            out,
            "## Daily\n- [[2024-01-02]]\n## Calendar Events\n- [ ] 09:00 - 10:00: New\nend"
        );
    }

    #[test]
    fn daily_note_renders_placeholders_and_events() {
        let engine = engine();
        let template = "# %date()%\n[[%date(-1)%]] | [[%date(+1)%]]\n## Calendar Events\n";
        let out = engine.render_daily_note(template, "2024-03-01", NO_EVENTS_MESSAGE);
        assert_eq!(
            out,
            format!(
                "# 2024-03-01\n[[2024-02-29]] | [[2024-03-02]]\n## Calendar Events\n{}\n",
                NO_EVENTS_MESSAGE
            )
        );
    }
}
