#![cfg(feature = "serde")]

use lgoap_core::{KeyTraits, KeyType, KeyValue, Param, TemplateLibrary};

#[test]
fn templates_deserialize_from_json() {
    let json = r#"{
        "Base": { "name": "Base", "keys": [
            { "name": "alive", "key_type": "Boolean", "default": { "Boolean": true } }
        ]},
        "Guard": { "name": "Guard", "parent": "Base", "keys": [
            { "name": "alert", "key_type": "Integer", "traits": 3 },
            null
        ]}
    }"#;
    let library: TemplateLibrary = serde_json::from_str(json).unwrap();

    let guard = library.get("Guard").unwrap();
    let alert = guard.keys[0].as_ref().unwrap();
    assert_eq!(alert.key_type, KeyType::Integer);
    assert!(alert.traits.contains(KeyTraits::INSTANCE_SYNCED));
    assert!(alert.traits.contains(KeyTraits::BROADCAST_ON_UNEXPECTED_CHANGE));
    assert_eq!(alert.default_value(), Some(KeyValue::Integer(0)));

    // The empty slot survives deserialization and is caught by validation.
    assert_eq!(library.validate().len(), 1);
}

#[test]
fn params_use_externally_tagged_variants() {
    let params: Vec<Param> = serde_json::from_str(r#"[{"Key":"ammo"},{"Integer":3}]"#).unwrap();
    assert_eq!(params, vec![Param::key("ammo"), Param::Integer(3)]);
}
