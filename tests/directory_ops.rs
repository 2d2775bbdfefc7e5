mod common;

use common::Fixture;
use ldif_store::error::Error;
use ldif_store::ops::{self, Mod};
use ldif_store::Dn;

#[test]
fn add_modify_delete_round_trip() {
    let fixture = Fixture::new();
    let alice = fixture.add_person("alice");

    ops::modify(
        &fixture.backend,
        &alice,
        &[Mod::Replace {
            attr: "description".into(),
            values: vec!["likes rust".into()],
        }],
    )
    .unwrap();

    let fetched = ops::get_entry(&fixture.backend, &alice).unwrap();
    assert_eq!(fetched.values("description"), &["likes rust".to_string()]);

    ops::delete(&fixture.backend, &alice).unwrap();
    assert!(matches!(
        ops::get_entry(&fixture.backend, &alice),
        Err(Error::NoSuchObject)
    ));
}

#[test]
fn rename_moves_entry_and_children_stay_reachable() {
    let fixture = Fixture::new();
    let people = fixture.suffix_child("ou=people");
    let mut ou = ldif_store::Entry::new(people.to_string(), people.clone());
    ou.add_value("objectClass", "organizationalUnit".into());
    ou.add_value("ou", "people".into());
    ops::add(&fixture.backend, ou).unwrap();

    let mut alice = ldif_store::Entry::new(
        "cn=alice,ou=people,dc=example,dc=com".into(),
        Dn::parse("cn=alice,ou=people,dc=example,dc=com"),
    );
    alice.add_value("objectClass", "person".into());
    alice.add_value("cn", "alice".into());
    ops::add(&fixture.backend, alice).unwrap();

    let renamed = ops::rename(
        &fixture.backend,
        &Dn::parse("ou=people,dc=example,dc=com"),
        Dn::parse("ou=staff"),
        None,
        &[Mod::Replace {
            attr: "ou".into(),
            values: vec!["staff".into()],
        }],
    )
    .unwrap();
    assert_eq!(renamed.to_string(), "ou=staff,dc=example,dc=com");

    let moved_child = ops::get_entry(&fixture.backend, &Dn::parse("cn=alice,ou=staff,dc=example,dc=com"));
    assert!(moved_child.is_ok());
}

#[test]
fn delete_non_leaf_is_rejected() {
    let fixture = Fixture::new();
    fixture.add_person("alice");
    let result = ops::delete(&fixture.backend, &fixture.suffix);
    assert!(matches!(result, Err(Error::NotAllowedOnNonLeaf)));
}
