mod common;

use common::row;
use proptest::prelude::*;
use rowsmith::data::{Dataset, Value};
use rowsmith::error::EngineError;
use rowsmith::history::Workspace;
use rowsmith::transform::QuickAction;

fn initial() -> Dataset {
    Dataset::from_rows(
        "contacts.csv",
        vec![
            row(&[("name", " Ann ".into()), ("tier", "GOLD".into())]),
            row(&[("name", " Ann ".into()), ("tier", "GOLD".into())]),
        ],
    )
}

#[test]
fn each_applied_step_is_one_snapshot() {
    let mut workspace = Workspace::new(initial());
    for action in [QuickAction::Trim, QuickAction::Dedupe, QuickAction::Lowercase] {
        let next = action.apply(&workspace.current().rows);
        workspace.apply(next, action.label());
    }
    assert_eq!(workspace.len(), 4);
    assert_eq!(
        workspace.current().rows,
        vec![row(&[("name", "ann".into()), ("tier", "gold".into())])]
    );
    let labels = workspace
        .entries()
        .iter()
        .map(|s| s.description.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec![
            "Imported contacts.csv",
            "Trim Whitespace",
            "Remove Duplicates",
            "Convert to Lowercase"
        ]
    );
}

#[test]
fn undo_restores_previous_snapshot_exactly() {
    let mut workspace = Workspace::new(initial());
    let trimmed = QuickAction::Trim.apply(&workspace.current().rows);
    workspace.apply(trimmed, "Trim Whitespace");
    let restored = workspace.undo().unwrap().clone();
    assert_eq!(restored, initial());
    assert!(matches!(workspace.undo(), Err(EngineError::NothingToUndo)));
}

#[test]
fn apply_takes_columns_from_the_new_rows() {
    let mut workspace = Workspace::new(initial());
    workspace.apply(vec![row(&[("full_name", Value::text("Ann"))])], "rewrite");
    assert_eq!(workspace.current().columns, vec!["full_name"]);
    assert_eq!(workspace.current().name, "contacts.csv");
}

#[test]
fn snapshots_have_distinct_ids() {
    let mut workspace = Workspace::new(initial());
    workspace.push(initial(), "copy");
    let entries = workspace.entries();
    assert_ne!(entries[0].id, entries[1].id);
    assert!(entries[0].created_at <= entries[1].created_at);
}

#[test]
fn workspace_profile_tracks_current_rows() {
    let mut workspace = Workspace::new(initial());
    assert_eq!(workspace.profile().total_rows, 2);
    let deduped = QuickAction::Dedupe.apply(&workspace.current().rows);
    workspace.apply(deduped, "Remove Duplicates");
    assert_eq!(workspace.profile().total_rows, 1);
}

proptest! {
    #[test]
    fn n_pushes_undo_back_to_start(sizes in prop::collection::vec(0usize..5, 0..12)) {
        let mut workspace = Workspace::new(initial());
        for (step, size) in sizes.iter().enumerate() {
            let rows = (0..*size)
                .map(|i| row(&[("step", (step as i64).into()), ("i", (i as i64).into())]))
                .collect();
            workspace.push(Dataset::from_rows("contacts.csv", rows), format!("step {step}"));
        }
        for _ in 0..sizes.len() {
            prop_assert!(workspace.undo().is_ok());
        }
        prop_assert_eq!(workspace.current(), &initial());
        prop_assert!(matches!(workspace.undo(), Err(EngineError::NothingToUndo)));
    }
}
