use formtask_core::{
    box_to_polygon, hash_task, stable_hash_string, Answer, BoundingBox, ImageSource, Span,
    TaskDraft,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn span(label: &str, coords: (i64, i64, i64, i64)) -> Span {
    let bbox = BoundingBox::new(coords.0, coords.1, coords.2, coords.3).unwrap();
    Span {
        points: box_to_polygon(&bbox),
        label: label.to_string(),
    }
}

fn draft(answer: Answer) -> TaskDraft {
    TaskDraft {
        image: ImageSource::Path("images/a.png".into()),
        spans: vec![span("header", (1, 2, 9, 8)), span("answer", (0, 0, 3, 3))],
        answer,
    }
}

#[test]
fn hashing_is_deterministic() {
    let first = hash_task(&draft(Answer::Accept)).unwrap();
    let second = hash_task(&draft(Answer::Accept)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.input_hash.len(), 64);
}

#[test]
fn input_hash_ignores_answer_but_task_hash_does_not() {
    let accepted = hash_task(&draft(Answer::Accept)).unwrap();
    let rejected = hash_task(&draft(Answer::Reject)).unwrap();
    assert_eq!(accepted.input_hash, rejected.input_hash);
    assert_ne!(accepted.task_hash, rejected.task_hash);
}

#[test]
fn construction_path_does_not_change_hashes() {
    let mut spans = Vec::new();
    spans.push(span("header", (1, 2, 9, 8)));
    spans.extend([span("answer", (0, 0, 3, 3))]);
    let built = TaskDraft {
        answer: Answer::Accept,
        spans,
        image: ImageSource::Path(String::from("images/") + "a.png"),
    };
    assert_eq!(
        hash_task(&built).unwrap(),
        hash_task(&draft(Answer::Accept)).unwrap()
    );
}

#[test]
fn span_order_is_part_of_the_content() {
    let mut reversed = draft(Answer::Accept);
    reversed.spans.reverse();
    assert_ne!(
        hash_task(&reversed).unwrap().input_hash,
        hash_task(&draft(Answer::Accept)).unwrap().input_hash
    );
}

#[test]
fn sealed_task_carries_its_hashes() {
    let expected = hash_task(&draft(Answer::Ignore)).unwrap();
    let task = draft(Answer::Ignore).seal().unwrap();
    assert_eq!(task.input_hash, expected.input_hash);
    assert_eq!(task.task_hash, expected.task_hash);
    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(value["answer"], json!("ignore"));
    assert_eq!(value["image"], json!("images/a.png"));
}

proptest! {
    #[test]
    fn object_key_order_does_not_affect_hash(
        keys in proptest::collection::btree_set("[a-z]{1,6}", 1..8)
    ) {
        let forward: Map<String, Value> =
            keys.iter().map(|k| (k.clone(), json!(k.len()))).collect();
        let mut backward = Map::new();
        for key in keys.iter().rev() {
            backward.insert(key.clone(), json!(key.len()));
        }
        prop_assert_eq!(
            stable_hash_string(&Value::Object(forward)).unwrap(),
            stable_hash_string(&Value::Object(backward)).unwrap()
        );
    }
}
