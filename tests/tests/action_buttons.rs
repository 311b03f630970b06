use pretty_assertions::assert_eq;
use tabula::{ActionResolver, ActionSet, Button};
use tabula_core::{ActionConfig, Privileges, Row, Verb};

fn names(buttons: &[Button]) -> Vec<&str> {
    buttons.iter().map(|button| button.name.as_str()).collect()
}

fn row_set(buttons: Vec<Button>) -> ActionSet {
    ActionSet {
        buttons,
        base_path: "/admin/orders".to_string(),
        row_identifier: "id".to_string(),
        soft_delete_field: "deleted_at".to_string(),
    }
}

#[test]
fn removed_verbs_leave_view_and_edit() {
    let config = ActionConfig::new().remove("delete").remove("insert");
    let buttons = ActionResolver::default().resolve_config(&config);
    assert_eq!(names(&buttons), vec!["view", "edit"]);
}

#[test]
fn removal_synonyms() {
    let config = ActionConfig::new().remove("destroy").remove("create").remove("show");
    let buttons = ActionResolver::default().resolve_config(&config);
    assert_eq!(names(&buttons), vec!["edit"]);
}

#[test]
fn custom_button_renders_class_and_icon() {
    let config = ActionConfig::none().button("approve|success|check");
    let buttons = ActionResolver::default().resolve_config(&config);
    assert_eq!(names(&buttons), vec!["approve"]);

    let html = row_set(buttons).render(&Row::new().with("id", 7));
    assert!(html.contains("btn-approve"), "{html}");
    assert!(html.contains("btn-success"), "{html}");
    assert!(html.contains("fa-check"), "{html}");
    assert!(html.contains(r#"href="/admin/orders/7/approve""#), "{html}");
}

#[test]
fn privileges_gate_last() {
    let privileges = Privileges::granting(&["clerk"], [Verb::View]);
    let config = ActionConfig::new().button("edit|warning|pen").button("export|info|download");
    let buttons = ActionResolver::new(privileges).resolve_config(&config);
    assert_eq!(names(&buttons), vec!["view", "export"]);

    let root = Privileges::granting(&["root"], []);
    let buttons = ActionResolver::new(root).resolve_config(&ActionConfig::new());
    assert_eq!(names(&buttons), vec!["view", "insert", "edit", "delete"]);
}

#[test]
fn insert_never_renders_per_row() {
    let buttons = ActionResolver::default().resolve_config(&ActionConfig::new());
    let html = row_set(buttons).render(&Row::new().with("id", 1));
    assert!(!html.contains("insert"), "{html}");
    assert!(html.contains("/admin/orders/1/delete"), "{html}");
}

#[test]
fn rows_without_identifier_get_no_buttons() {
    let buttons = ActionResolver::default().resolve_config(&ActionConfig::new());
    assert_eq!(row_set(buttons).render(&Row::new().with("name", "x")), "");
}
