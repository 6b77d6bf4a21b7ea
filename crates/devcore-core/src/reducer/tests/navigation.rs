use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn navigate_replaces_view_and_props() {
    let mut state = state();
    let mut props = ViewProps::new();
    props.insert("initialCode".to_string(), json!("fn main() {}"));

    let effects = reduce(
        &mut state,
        Action::Navigate {
            view: ViewId::from("ai-code-explainer"),
            props: props.clone(),
        },
    );

    assert_eq!(state.active_view, ViewId::from("ai-code-explainer"));
    assert_eq!(state.view_props, props);
    assert_eq!(effects, vec![StoreEffect::PersistSnapshot]);
}

#[test]
fn props_are_discarded_on_every_navigation() {
    let mut state = state();
    let mut props = ViewProps::new();
    props.insert("initialCode".to_string(), json!("select 1"));
    reduce(
        &mut state,
        Action::Navigate {
            view: ViewId::from("sql-formatter"),
            props,
        },
    );

    reduce(&mut state, Action::navigate("settings"));
    assert!(state.view_props.is_empty());
}

#[test]
fn renavigating_same_view_resets_props_without_persisting() {
    let mut state = state();
    let mut props = ViewProps::new();
    props.insert("k".to_string(), json!(1));
    state.view_props = props;

    let current = state.active_view.0.clone();
    let effects = reduce(&mut state, Action::navigate(current));
    assert!(effects.is_empty());
    assert!(state.view_props.is_empty());
}
