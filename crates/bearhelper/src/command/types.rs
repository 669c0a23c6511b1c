/// One line of input to the helper: a menu command or a forwarded callback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperCommand {
    /// `home`
    OpenHome,
    /// `daily [date]`
    OpenDaily(Option<String>),
    /// `create-daily <date>`
    CreateDaily(String),
    /// `ensure-daily <date>`
    EnsureDaily(String),
    /// `sync`
    SyncAll,
    /// `sync <date>`
    SyncDate(String),
    /// `template <name>`
    Template(String),
    /// `events`
    TodayEvents,
    /// `templates`
    ListTemplates,
    /// `login on|off`
    LaunchAtLogin(bool),
    /// `click`
    Click,
    /// A `fodabear://` URL handed over by the platform shell.
    Callback(String),
    /// `quit`
    Quit,
}
