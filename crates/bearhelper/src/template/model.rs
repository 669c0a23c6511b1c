use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DAILY_TEMPLATE_NAME: &str = "Daily";

/// A user-defined note template. Identity is the `id`; names are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub tag: String,
    #[serde(default)]
    pub is_daily: bool,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            tag: tag.into(),
            is_daily: false,
        }
    }

    /// Template seeded when the stored collection is empty.
    pub fn default_daily() -> Self {
        Self {
            is_daily: true,
            ..Self::new(DAILY_TEMPLATE_NAME, "Default daily template", "daily")
        }
    }
}

/// Replaces the template with the same id, or appends it.
pub fn upsert_template(templates: &mut Vec<Template>, template: Template) {
    match templates.iter_mut().find(|existing| existing.id == template.id) {
        Some(existing) => *existing = template,
        None => templates.push(template),
    }
}

/// Removes every template whose id is in `ids`. Returns how many were removed.
pub fn remove_templates(templates: &mut Vec<Template>, ids: &HashSet<Uuid>) -> usize {
    let before = templates.len();
    templates.retain(|template| !ids.contains(&template.id));
    before - templates.len()
}

/// The template used for daily notes: the first flagged one, else the one named `Daily`.
pub fn find_daily_template(templates: &[Template]) -> Option<&Template> {
    templates
        .iter()
        .find(|template| template.is_daily)
        .or_else(|| {
            templates
                .iter()
                .find(|template| template.name == DAILY_TEMPLATE_NAME)
        })
}

pub fn find_template_by_name<'a>(templates: &'a [Template], name: &str) -> Option<&'a Template> {
    templates.iter().find(|template| template.name == name)
}

/// Templates offered as "Create <name> Note" actions.
pub fn note_templates(templates: &[Template]) -> impl Iterator<Item = &Template> {
    templates.iter().filter(|template| !template.is_daily)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_by_id_and_appends_new() {
        let mut templates = vec![Template::new("Meeting", "# Meeting", "work")];
        let mut edited = templates[0].clone();
        edited.content = "# Meeting %date()%".to_string();
        upsert_template(&mut templates, edited.clone());
        assert_eq!(templates, vec![edited]);

        upsert_template(&mut templates, Template::new("Meeting", "copy", "work"));
        assert_eq!(templates.len(), 2);
    }

    #[test]
    fn remove_by_id_set() {
        let a = Template::new("A", "", "");
        let b = Template::new("B", "", "");
        let mut templates = vec![a.clone(), b.clone()];
        let removed = remove_templates(&mut templates, &HashSet::from([a.id]));
        assert_eq!(removed, 1);
        assert_eq!(templates, vec![b]);
    }

    #[test]
    fn daily_template_prefers_flag_over_name() {
        let named = Template::new(DAILY_TEMPLATE_NAME, "by name", "daily");
        let flagged = Template {
            is_daily: true,
            ..Template::new("Journal", "by flag", "journal")
        };
        assert_eq!(
            find_daily_template(&[named.clone(), flagged.clone()]),
            Some(&flagged)
        );
        assert_eq!(find_daily_template(&[named.clone()]), Some(&named));
        assert_eq!(find_daily_template(&[]), None);
    }

    #[test]
    fn note_templates_skip_daily() {
        let daily = Template::default_daily();
        let meeting = Template::new("Meeting", "", "");
        let templates = vec![daily, meeting.clone()];
        let names: Vec<_> = note_templates(&templates).map(|t| t.name.clone()).collect();
        assert_eq!(names, vec![meeting.name]);
    }

    #[test]
    fn deserializes_stored_collection() {
        let json = r#"[
            {"id":"6F9619FF-8B86-D011-B42D-00C04FC964FF","name":"Daily",
             "content":"x","tag":"daily","isDaily":false},
            {"id":"7c9e6679-7425-40de-944b-e07fc1f90ae7","name":"Old","content":"y","tag":""}
        ]"#;
        let templates: Vec<Template> = serde_json::from_str(json).expect("templates");
        assert_eq!(templates.len(), 2);
        assert!(!templates[1].is_daily);
        assert_eq!(find_daily_template(&templates).map(|t| t.content.as_str()), Some("x"));
    }
}
