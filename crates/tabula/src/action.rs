pub mod base_path;

use crate::html;

use tabula_core::{ActionConfig, CustomButtons, Privileges, Row, Verb};

use std::collections::BTreeSet;

/// One row action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub name: String,
    pub color: String,
    pub icon: String,

    /// Set when the button stands for a default verb.
    pub verb: Option<Verb>,
}

impl Button {
    pub fn new(name: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Button {
        let name = name.into();
        Button {
            verb: normalize_verb(&name),
            name,
            color: color.into(),
            icon: icon.into(),
        }
    }

    /// The default button for a verb.
    pub fn for_verb(verb: Verb) -> Button {
        let (color, icon) = match verb {
            Verb::View => ("success", "eye"),
            Verb::Insert => ("info", "plus"),
            Verb::Edit => ("primary", "pencil"),
            Verb::Delete => ("danger", "times"),
        };
        Button {
            name: verb.as_str().to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            verb: Some(verb),
        }
    }

    /// Parses the `name|color|icon` grammar. A bare name gets the `default`
    /// color and the `link` icon; empty parts fall back the same way.
    pub fn parse(spec: &str) -> Option<Button> {
        let mut parts = spec.split('|').map(str::trim);
        let name = parts.next().filter(|name| !name.is_empty())?;
        let color = parts.next().filter(|c| !c.is_empty()).unwrap_or("default");
        let icon = parts.next().filter(|i| !i.is_empty()).unwrap_or("link");
        Some(Button::new(name, color, icon))
    }
}

/// Maps caller-facing verb synonyms onto [`Verb`].
pub fn normalize_verb(name: &str) -> Option<Verb> {
    match name.trim().to_ascii_lowercase().as_str() {
        "view" | "show" | "index" | "read" | "detail" => Some(Verb::View),
        "insert" | "create" | "add" | "new" | "store" => Some(Verb::Insert),
        "edit" | "update" | "modify" => Some(Verb::Edit),
        "delete" | "destroy" | "remove" => Some(Verb::Delete),
        _ => None,
    }
}

/// Composes the action button set from verbs, removals, privileges and custom
/// buttons.
#[derive(Debug, Default, Clone)]
pub struct ActionResolver {
    privileges: Privileges,
}

impl ActionResolver {
    pub fn new(privileges: Privileges) -> ActionResolver {
        ActionResolver { privileges }
    }

    pub fn resolve_config(&self, config: &ActionConfig) -> Vec<Button> {
        self.resolve(
            &config.enabled_verbs,
            &config.removed_verbs,
            &config.custom_buttons,
        )
    }

    /// Returns the ordered button list: surviving default verbs in
    /// `view, insert, edit, delete` order, then custom buttons in declaration
    /// order.
    ///
    /// The verb set is `enabled - removed ∪ custom`. A custom button named
    /// after a verb restyles that verb instead of adding a second button.
    /// Verbs the user is not granted are dropped last, whatever their source.
    pub fn resolve(
        &self,
        enabled: &BTreeSet<Verb>,
        removed: &[String],
        custom: &CustomButtons,
    ) -> Vec<Button> {
        let removed: BTreeSet<Verb> = removed
            .iter()
            .filter_map(|name| {
                let verb = normalize_verb(name);
                if verb.is_none() {
                    tracing::debug!(name = %name, "ignoring removal of unknown verb");
                }
                verb
            })
            .collect();

        let custom: Vec<Button> = match custom {
            CustomButtons::None => vec![],
            CustomButtons::Defaults => Verb::ALL.into_iter().map(Button::for_verb).collect(),
            CustomButtons::List(specs) => specs.iter().filter_map(|s| Button::parse(s)).collect(),
        };

        let mut buttons: Vec<Button> = Verb::ALL
            .into_iter()
            .filter(|verb| enabled.contains(verb) && !removed.contains(verb))
            .map(Button::for_verb)
            .collect();

        for button in custom {
            match button.verb {
                Some(verb) => match buttons.iter_mut().find(|b| b.verb == Some(verb)) {
                    Some(existing) => {
                        existing.color = button.color;
                        existing.icon = button.icon;
                    }
                    None => {
                        let at = buttons
                            .iter()
                            .position(|b| b.verb.map_or(true, |v| v > verb))
                            .unwrap_or(buttons.len());
                        buttons.insert(at, Button::for_verb(verb).styled(&button));
                    }
                },
                None => {
                    if !buttons.iter().any(|b| b.name == button.name) {
                        buttons.push(button);
                    }
                }
            }
        }

        buttons.retain(|button| match button.verb {
            Some(verb) => self.privileges.allows(verb),
            None => true,
        });

        buttons
    }
}

impl Button {
    fn styled(mut self, other: &Button) -> Button {
        self.color = other.color.clone();
        self.icon = other.icon.clone();
        self
    }
}

/// Buttons bound to a base path, ready to render once per row.
#[derive(Debug, Clone)]
pub struct ActionSet {
    pub buttons: Vec<Button>,
    pub base_path: String,
    pub row_identifier: String,
    pub soft_delete_field: String,
}

impl ActionSet {
    /// Effective verb set, including verbs that do not render per row.
    pub fn verbs(&self) -> BTreeSet<&str> {
        self.buttons.iter().map(|b| b.name.as_str()).collect()
    }

    /// Buttons rendered in each row. Insert is a table-level action and
    /// never renders per row.
    pub fn row_buttons(&self) -> impl Iterator<Item = &Button> {
        self.buttons.iter().filter(|b| b.verb != Some(Verb::Insert))
    }

    pub fn is_empty(&self) -> bool {
        self.row_buttons().next().is_none()
    }

    /// Renders the action cell for `row`. Rows without an identifier get an
    /// empty cell.
    pub fn render(&self, row: &Row) -> String {
        let id = row.value(&self.row_identifier);
        if id.is_empty() {
            return String::new();
        }
        let id: String = url::form_urlencoded::byte_serialize(id.render().as_bytes()).collect();
        let trashed = !row.value(&self.soft_delete_field).is_null();

        let mut out = String::from(r#"<div class="action-buttons">"#);
        for button in self.row_buttons() {
            let button = match (button.verb, trashed) {
                (Some(Verb::Delete), true) => Button {
                    name: "restore".to_string(),
                    color: "warning".to_string(),
                    icon: "recycle".to_string(),
                    verb: Some(Verb::Delete),
                },
                _ => button.clone(),
            };
            out.push_str(&self.render_button(&button, &id));
        }
        out.push_str("</div>");
        out
    }

    fn render_button(&self, button: &Button, id: &str) -> String {
        let href = format!("{}/{}/{}", self.base_path, id, button.name);
        format!(
            r#"<a href="{href}" class="btn btn-{color} btn-xs btn-{name}" title="{title}"><i class="fa fa-{icon}"></i></a>"#,
            href = html::escape(&href),
            color = html::escape(&button.color),
            name = html::escape(&button.name),
            title = html::escape(&tabula_core::default_label(&button.name)),
            icon = html::escape(&button.icon),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(buttons: &[Button]) -> Vec<&str> {
        buttons.iter().map(|b| b.name.as_str()).collect()
    }

    fn set(buttons: Vec<Button>) -> ActionSet {
        ActionSet {
            buttons,
            base_path: "/admin/users".into(),
            row_identifier: "id".into(),
            soft_delete_field: "deleted_at".into(),
        }
    }

    #[test]
    fn removals_use_synonyms() {
        let buttons = ActionResolver::default().resolve(
            &Verb::defaults(),
            &["destroy".into(), "create".into()],
            &CustomButtons::None,
        );
        assert_eq!(names(&buttons), vec!["view", "edit"]);
    }

    #[test]
    fn synonyms_normalize() {
        assert_eq!(normalize_verb("show"), Some(Verb::View));
        assert_eq!(normalize_verb("Index"), Some(Verb::View));
        assert_eq!(normalize_verb("add"), Some(Verb::Insert));
        assert_eq!(normalize_verb("modify"), Some(Verb::Edit));
        assert_eq!(normalize_verb("destroy"), Some(Verb::Delete));
        assert_eq!(normalize_verb("approve"), None);
    }

    #[test]
    fn custom_button_grammar() {
        assert_eq!(
            Button::parse("approve|success|check"),
            Some(Button::new("approve", "success", "check"))
        );
        assert_eq!(
            Button::parse("export"),
            Some(Button::new("export", "default", "link"))
        );
        assert_eq!(Button::parse(""), None);
    }

    #[test]
    fn true_expands_default_verbs() {
        let buttons = ActionResolver::default().resolve(
            &BTreeSet::new(),
            &[],
            &CustomButtons::Defaults,
        );
        assert_eq!(names(&buttons), vec!["view", "insert", "edit", "delete"]);
        assert_eq!(buttons[0].color, "success");
        assert_eq!(buttons[0].icon, "eye");
        assert_eq!(buttons[2].color, "primary");
        assert_eq!(buttons[2].icon, "pencil");
        assert_eq!(buttons[3].color, "danger");
        assert_eq!(buttons[3].icon, "times");
    }

    #[test]
    fn custom_verb_button_restyles_in_place() {
        let buttons = ActionResolver::default().resolve(
            &Verb::defaults(),
            &[],
            &CustomButtons::List(vec!["edit|warning|pen".into(), "approve|success|check".into()]),
        );
        assert_eq!(names(&buttons), vec!["view", "insert", "edit", "delete", "approve"]);
        assert_eq!(buttons[2].color, "warning");
    }

    #[test]
    fn privileges_gate_verbs_but_not_custom_buttons() {
        let privileges = Privileges::granting(&["staff"], [Verb::View]);
        let buttons = ActionResolver::new(privileges).resolve(
            &Verb::defaults(),
            &[],
            &CustomButtons::List(vec!["approve".into()]),
        );
        assert_eq!(names(&buttons), vec!["view", "approve"]);
    }

    #[test]
    fn renders_hrefs_from_base_path() {
        let row = Row::new().with("id", 7).with("deleted_at", tabula_core::Value::Null);
        let html = set(vec![Button::for_verb(Verb::Edit), Button::new("approve", "success", "check")])
            .render(&row);
        assert!(html.contains(r#"href="/admin/users/7/edit""#));
        assert!(html.contains("btn-approve"));
        assert!(html.contains("fa-check"));
    }

    #[test]
    fn soft_deleted_rows_get_restore() {
        let row = Row::new().with("id", 7).with("deleted_at", "2024-01-01");
        let html = set(vec![Button::for_verb(Verb::Delete)]).render(&row);
        assert!(html.contains("/admin/users/7/restore"));
        assert!(!html.contains("/7/delete"));

        let live = Row::new().with("id", 7);
        let html = set(vec![Button::for_verb(Verb::Delete)]).render(&live);
        assert!(html.contains("/admin/users/7/delete"));
    }

    #[test]
    fn insert_never_renders_per_row() {
        let actions = set(vec![Button::for_verb(Verb::Insert)]);
        assert!(actions.is_empty());
        assert!(actions.verbs().contains("insert"));
    }

    #[test]
    fn rows_without_identifier_render_nothing() {
        let html = set(vec![Button::for_verb(Verb::View)]).render(&Row::new());
        assert_eq!(html, "");
    }
}
