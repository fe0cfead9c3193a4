//! Integration tests for removal and inventory scoping.

mod common;

use common::{labels, owned_labels, FakeRuntime};
use work_env::{inventory, ownership, removal, ResourceKind, WorkEnvError};

fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
    let mut out = Vec::new();
    f(&mut out);
    String::from_utf8(out).unwrap()
}

/// A batch containing one foreign container removes nothing
#[test]
fn test_remove_containers_verifies_whole_batch_first() {
    let runtime = FakeRuntime::new()
        .with_owned_container("a", "myenv")
        .with_container("b", "postgres", labels("app", "db"))
        .with_owned_container("c", "myenv");

    let result = removal::remove_containers(&runtime, &["a", "b", "c"]);

    assert!(matches!(result, Err(WorkEnvError::NotOwned { .. })));
    assert!(runtime.mutations().is_empty());
    assert_eq!(runtime.container_names(), vec!["a", "b", "c"]);
}

#[test]
fn test_remove_containers_missing_target_removes_nothing() {
    let runtime = FakeRuntime::new().with_owned_container("a", "myenv");

    let result = removal::remove_containers(&runtime, &["a", "ghost"]);

    assert!(matches!(result, Err(WorkEnvError::NotFound { .. })));
    assert!(runtime.container("a").is_some());
}

#[test]
fn test_remove_containers_all_owned() {
    let runtime = FakeRuntime::new()
        .with_owned_container("a", "myenv")
        .with_owned_container("b", "myenv");

    removal::remove_containers(&runtime, &["a".to_string(), "b".to_string()]).unwrap();

    assert_eq!(
        runtime.mutations(),
        vec!["remove_container a", "remove_container b"]
    );
    assert!(runtime.container_names().is_empty());
}

#[test]
fn test_remove_containers_partial_failure_stops_batch() {
    let runtime = FakeRuntime::new()
        .with_owned_container("a", "myenv")
        .with_owned_container("b", "myenv")
        .with_owned_container("c", "myenv");
    runtime.fail_on("remove_container b");

    let result = removal::remove_containers(&runtime, &["a", "b", "c"]);

    assert!(matches!(result, Err(WorkEnvError::Runtime { .. })));
    // `a` stays removed, `c` is never attempted
    assert_eq!(runtime.container_names(), vec!["b", "c"]);
    assert!(!runtime.calls().contains(&"remove_container c".to_string()));
}

#[test]
fn test_remove_containers_repeated_target_removed_once() {
    let runtime = FakeRuntime::new()
        .with_owned_container("a", "myenv")
        .with_owned_container("b", "myenv");

    removal::remove_containers(&runtime, &["a", "a", "b"]).unwrap();

    assert_eq!(
        runtime.mutations(),
        vec!["remove_container a", "remove_container b"]
    );
    assert!(runtime.container_names().is_empty());
}

#[test]
fn test_remove_images_partial_failure_stops_batch() {
    let runtime = FakeRuntime::new()
        .with_image("one", owned_labels())
        .with_image("two", owned_labels())
        .with_image("three", owned_labels());
    runtime.fail_on("remove_image two");

    let result = removal::remove_images(&runtime, &["one", "two", "three"]);

    match result {
        Err(WorkEnvError::Runtime { operation, .. }) => {
            assert_eq!(operation, "remove image 'two'")
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
    assert!(!runtime.has_image("one"));
    assert!(runtime.has_image("two"));
    assert!(runtime.has_image("three"));
    assert!(!runtime.calls().contains(&"remove_image three".to_string()));
}

#[test]
fn test_remove_images_requires_exact_label() {
    let runtime = FakeRuntime::new()
        .with_image("myenv", owned_labels())
        .with_image("ubuntu", labels("app", "work-env-old"));

    let result = removal::remove_images(&runtime, &["myenv", "ubuntu"]);

    match result {
        Err(WorkEnvError::NotOwned { kind, name, found }) => {
            assert_eq!(kind, ResourceKind::Image);
            assert_eq!(name, "ubuntu");
            assert_eq!(found.as_deref(), Some("work-env-old"));
        }
        other => panic!("expected NotOwned, got {:?}", other),
    }
    assert!(runtime.has_image("myenv"));
    assert!(runtime.mutations().is_empty());
}

#[test]
fn test_remove_images_owned() {
    let runtime = FakeRuntime::new().with_image("myenv:v2", owned_labels());

    removal::remove_images(&runtime, &["myenv:v2"]).unwrap();

    assert!(!runtime.has_image("myenv:v2"));
}

#[test]
fn test_verify_image_missing() {
    let runtime = FakeRuntime::new();
    assert!(matches!(
        ownership::verify_image(&runtime, "nothing"),
        Err(WorkEnvError::NotFound {
            kind: ResourceKind::Image,
            ..
        })
    ));
}

#[test]
fn test_verify_container_returns_metadata() {
    let runtime = FakeRuntime::new().with_owned_container("work", "myenv");
    let details = ownership::verify_container(&runtime, "work").unwrap();
    assert!(!details.running);
    assert_eq!(details.path, "/usr/local/bin/entrypoint.sh");
    assert_eq!(details.args, vec!["zsh"]);
}

#[test]
fn test_list_images_only_shows_owned() {
    let runtime = FakeRuntime::new()
        .with_image("myenv", owned_labels())
        .with_image("myenv:v2", owned_labels())
        .with_image("ubuntu", labels("app", "other"))
        .with_image("alpine", Default::default());

    let listed = output(|out| inventory::list_images(&runtime, out).unwrap());

    assert_eq!(listed, "myenv\nmyenv:v2\n");
}

#[test]
fn test_list_containers_empty_prints_nothing() {
    let runtime = FakeRuntime::new().with_container("db", "postgres", labels("app", "db"));

    let listed = output(|out| inventory::list_containers(&runtime, out).unwrap());

    assert!(listed.is_empty());
}

#[test]
fn test_list_failure_is_runtime_error() {
    let runtime = FakeRuntime::new();
    runtime.fail_on("list containers");

    let mut out = Vec::new();
    let result = inventory::list_containers(&runtime, &mut out);

    assert!(matches!(result, Err(WorkEnvError::Runtime { .. })));
    assert!(out.is_empty());
}
