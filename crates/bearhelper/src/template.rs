//! Note templates and the placeholder/section engine applied to them.

pub mod engine;
pub mod model;

pub use engine::{
    SectionEdit, TemplateEngine, DEFAULT_CALENDAR_SECTION_HEADER, DEFAULT_DAILY_SECTION_HEADER,
};
pub use model::{
    find_daily_template, find_template_by_name, note_templates, remove_templates,
    upsert_template, Template, DAILY_TEMPLATE_NAME,
};
