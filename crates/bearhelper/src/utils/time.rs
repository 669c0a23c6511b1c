use chrono::{DateTime, Local, NaiveDate};

pub fn now_local() -> DateTime<Local> {
    Local::now()
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
