use dnd_tree::{DropPosition, FlatRecord, Forest};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuItem {
    name: String,
    order_num: u32,
    #[serde(default)]
    status: u8,
}

fn menu_records() -> Vec<FlatRecord<u32, MenuItem>> {
    let raw = json!([
        { "id": 2, "pid": 0, "orderNum": 1, "name": "Parent 1" },
        { "id": 3, "pid": 0, "orderNum": 2, "name": "Parent 2" },
        { "id": 42, "pid": 0, "orderNum": 41, "name": "Parent 3" },
        { "id": 4, "pid": 3, "orderNum": 3, "name": "Child 2-1" },
        { "id": 11, "pid": 3, "orderNum": 10, "name": "Child 2-2", "status": 1 },
        { "id": 20, "pid": 3, "orderNum": 10, "name": "Child 2-3", "status": 1 },
        { "id": 50, "pid": 20, "orderNum": 10, "name": "Child 2-3-1", "status": 1 }
    ]);
    serde_json::from_value(raw).unwrap()
}

fn dump(forest: &Forest<u32, MenuItem>) -> String {
    forest.outline_with(|node| format!("{} {}", node.id(), node.data().name))
}

#[test]
fn builds_menu_tree_from_flat_records() {
    let forest = Forest::from_flat(menu_records()).unwrap();

    assert_eq!(
        dump(&forest).trim(),
        r#"2 Parent 1
3 Parent 2
  4 Child 2-1
  11 Child 2-2
  20 Child 2-3
    50 Child 2-3-1
42 Parent 3"#
    );
    assert_eq!(forest.len(), 7);
    assert_eq!(forest.find(&50).unwrap().data().status, 1);
}

#[test]
fn moved_menu_serializes_nested() {
    let forest = Forest::from_flat(menu_records()).unwrap();
    let moved = forest
        .move_node(&20, &2, DropPosition::Child)
        .and_then(|f| f.move_node(&42, &3, DropPosition::Before))
        .unwrap();

    assert_eq!(
        dump(&moved).trim(),
        r#"2 Parent 1
  20 Child 2-3
    50 Child 2-3-1
42 Parent 3
3 Parent 2
  4 Child 2-1
  11 Child 2-2"#
    );

    let value = serde_json::to_value(&moved).unwrap();
    assert_eq!(value[0]["children"][0]["id"], json!(20));
    assert_eq!(value[0]["children"][0]["pid"], json!(2));
    assert_eq!(value[0]["children"][0]["orderNum"], json!(10));
    assert_eq!(value[1].get("pid"), None);

    let reloaded: Forest<u32, MenuItem> = serde_json::from_value(value).unwrap();
    assert_eq!(reloaded, moved);
}

#[test]
fn nested_json_with_wrong_parent_ids_is_restamped() {
    let json = r#"[
        { "id": 1, "pid": 7, "name": "a", "orderNum": 1,
          "children": [ { "id": 2, "pid": 9, "name": "b", "orderNum": 2 } ] }
    ]"#;
    let forest: Forest<u32, MenuItem> = Forest::from_json_str(json).unwrap();
    assert_eq!(forest.find(&1).unwrap().pid(), None);
    assert_eq!(forest.find(&2).unwrap().pid(), Some(&1));
}

#[test]
fn nested_json_with_duplicate_ids_fails() {
    let json = r#"[
        { "id": 1, "name": "a", "orderNum": 1 },
        { "id": 1, "name": "b", "orderNum": 2 }
    ]"#;
    let err = Forest::<u32, MenuItem>::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}
