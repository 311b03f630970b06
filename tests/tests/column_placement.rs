use pretty_assertions::assert_eq;
use tabula::ColumnResolver;
use tabula_core::{FormulaSpec, RelationSpec};

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn resolve(requested: &[&str], formulas: &[FormulaSpec]) -> Vec<String> {
    ColumnResolver::new()
        .resolve(&fields(requested), &[], formulas)
        .columns
}

#[test]
fn last_after_lands_before_action() {
    let total = FormulaSpec::new("total", "Total", ["name"]).placement("last", true);
    assert_eq!(
        resolve(&["id", "name", "action"], &[total]),
        vec!["id", "name", "total", "action"]
    );
}

#[test]
fn last_before_lands_before_final_column() {
    let before = FormulaSpec::new("before_last", "Before Last", ["name"]).placement("last", false);
    assert_eq!(
        resolve(&["id", "name"], &[before]),
        vec!["id", "before_last", "name"]
    );
}

#[test]
fn first_anchor_respects_numbering() {
    let a = FormulaSpec::new("a", "A", ["id"]).placement("first", true);
    let b = FormulaSpec::new("b", "B", ["id"]).placement("first", true);

    assert_eq!(
        resolve(&["number_lists", "id", "name"], &[a.clone(), b.clone()]),
        vec!["number_lists", "a", "b", "id", "name"]
    );
    assert_eq!(resolve(&["id", "name"], &[a, b]), vec!["a", "b", "id", "name"]);
}

#[test]
fn missing_anchor_is_skipped() {
    let orphan = FormulaSpec::new("orphan", "Orphan", ["id"]).placement("nonexistent", true);
    let resolved = ColumnResolver::new().resolve(&fields(&["id", "name"]), &[], &[orphan]);

    assert_eq!(resolved.columns, vec!["id", "name"]);
    assert!(!resolved.labels.contains_key("orphan"));
}

#[test]
fn custom_anchor_before_and_after() {
    let after = FormulaSpec::new("after_id", "After", ["id"]).placement("id", true);
    let before = FormulaSpec::new("before_name", "Before", ["name"]).placement("name", false);
    assert_eq!(
        resolve(&["id", "name", "email"], &[after, before]),
        vec!["id", "after_id", "before_name", "name", "email"]
    );
}

#[test]
fn relation_rewrite_keeps_position() {
    let resolved = ColumnResolver::new()
        .schema(["id", "user_id", "amount"])
        .resolve(
            &fields(&["id", "user_name", "amount"]),
            &[RelationSpec::new("user_name", "users.name", "User Name", "user_id")],
            &[],
        );

    assert_eq!(resolved.columns, vec!["id", "users.name", "user_id", "amount"]);
    assert_eq!(resolved.labels["users.name"], "User Name");
}
