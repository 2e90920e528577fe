mod common;

use common::row;
use proptest::prelude::*;
use rowsmith::data::{Row, Value};
use rowsmith::join::{JoinStrategy, JoinType, join};

fn strategy(join_type: JoinType) -> JoinStrategy {
    JoinStrategy::new(join_type, "id", "id")
}

#[test]
fn left_join_without_match_keeps_primary_row_untouched() {
    let primary = vec![row(&[("id", 1i64.into()), ("x", "a".into())])];
    let secondary = vec![row(&[("id", 2i64.into()), ("y", "b".into())])];
    let out = join(&primary, &secondary, &strategy(JoinType::Left));
    assert_eq!(out, primary);
}

#[test]
fn inner_join_drops_unmatched_primary_rows() {
    let primary = vec![
        row(&[("id", 1i64.into()), ("x", "a".into())]),
        row(&[("id", 2i64.into()), ("x", "b".into())]),
    ];
    let secondary = vec![row(&[("id", 2i64.into()), ("y", "B".into())])];
    let out = join(&primary, &secondary, &strategy(JoinType::Inner));
    assert_eq!(
        out,
        vec![row(&[("id", 2i64.into()), ("x", "b".into()), ("y", "B".into())])]
    );
}

#[test]
fn keys_match_by_string_form() {
    let primary = vec![row(&[("id", 7i64.into())])];
    let secondary = vec![row(&[("id", "7".into()), ("y", "seven".into())])];
    let out = join(&primary, &secondary, &strategy(JoinType::Inner));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get("id"), Some(&Value::Number(7.0)));
    assert_eq!(out[0].get("y"), Some(&Value::text("seven")));
}

#[test]
fn outer_join_appends_unmatched_secondary_rows_in_order() {
    let primary = vec![
        row(&[("id", 1i64.into()), ("x", "a".into())]),
        row(&[("id", 3i64.into()), ("x", "c".into())]),
    ];
    let secondary = vec![
        row(&[("id", 5i64.into()), ("y", "e".into())]),
        row(&[("id", 1i64.into()), ("y", "A".into())]),
        row(&[("id", 4i64.into()), ("y", "d".into())]),
    ];
    let out = join(&primary, &secondary, &strategy(JoinType::Outer));
    assert_eq!(
        out,
        vec![
            row(&[("id", 1i64.into()), ("x", "a".into()), ("y", "A".into())]),
            row(&[("id", 3i64.into()), ("x", "c".into())]),
            row(&[("id", 5i64.into()), ("y", "e".into())]),
            row(&[("id", 4i64.into()), ("y", "d".into())]),
        ]
    );
}

#[test]
fn primary_rows_without_the_key_column_are_kept_by_left_join() {
    let primary = vec![row(&[("other", 1i64.into())])];
    let secondary = vec![row(&[("id", 1i64.into())])];
    assert_eq!(join(&primary, &secondary, &strategy(JoinType::Left)), primary);
    assert!(join(&primary, &secondary, &strategy(JoinType::Inner)).is_empty());
}

fn keyed_rows(tag: &'static str) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(0i64..6, 0..12).prop_map(move |keys| {
        keys.into_iter()
            .map(|k| row(&[("id", k.into()), (tag, Value::text(format!("{tag}{k}")))]))
            .collect()
    })
}

proptest! {
    #[test]
    fn join_cardinality_is_ordered(primary in keyed_rows("p"), secondary in keyed_rows("s")) {
        let inner = join(&primary, &secondary, &strategy(JoinType::Inner)).len();
        let left = join(&primary, &secondary, &strategy(JoinType::Left)).len();
        let outer = join(&primary, &secondary, &strategy(JoinType::Outer)).len();
        prop_assert!(inner <= left);
        prop_assert!(left <= outer);
        prop_assert_eq!(left, primary.len());
    }
}
