use std::collections::HashMap;

use menagerie_db::database::inventory::apply_delta;

#[test]
fn adds_into_empty_bucket() {
    let mut bucket = HashMap::new();
    apply_delta(&mut bucket, "Capture Ball", 3).unwrap();
    assert_eq!(bucket.get("Capture Ball"), Some(&3));
}

#[test]
fn accumulates_onto_existing_entry() {
    let mut bucket = HashMap::from([("Oran Berry".to_string(), 2i64)]);
    apply_delta(&mut bucket, "Oran Berry", 5).unwrap();
    assert_eq!(bucket.get("Oran Berry"), Some(&7));
}

#[test]
fn refuses_overdraw_and_leaves_bucket_untouched() {
    let mut bucket = HashMap::from([("Mystery Egg".to_string(), 1i64)]);
    let err = apply_delta(&mut bucket, "Mystery Egg", -2).unwrap_err();
    assert!(err.contains("Not enough"));
    assert_eq!(bucket.get("Mystery Egg"), Some(&1));
}

#[test]
fn zeroed_entries_are_dropped() {
    let mut bucket = HashMap::from([("Potion".to_string(), 2i64)]);
    apply_delta(&mut bucket, "Potion", -2).unwrap();
    assert!(!bucket.contains_key("Potion"));
}

#[test]
fn spending_an_absent_item_fails() {
    let mut bucket: HashMap<String, i64> = HashMap::new();
    assert!(apply_delta(&mut bucket, "Rare Candy", -1).is_err());
}
