// vim: tw=80
//! Tracking which double observes which subject
#![deny(warnings)]

use mockingbird::*;

fn setup() -> (Registry, Patchboard, Subject, Subject) {
    let board = Patchboard::new();
    let os = Subject::named("os");
    let time = Subject::named("time");
    board.define(&os, "getcwd", |_| Ok(Value::from("/home")));
    board.define(&time, "time", |_| Ok(Value::from(0)));
    let registry = Registry::new().substitution(board.clone());
    (registry, board, os, time)
}

#[test]
fn observe_once() {
    let (mut registry, _board, os, _time) = setup();
    let a = registry.observe(&os);
    let b = registry.observe(&os);
    assert!(a.ptr_eq(&b));
    assert_eq!(registry.len(), 1);
    assert_eq!(a.name(), "os");
    assert_eq!(a.subject(), Some(os.clone()));
    assert!(registry.mock_for(&os).unwrap().ptr_eq(&a));
    assert_eq!(registry.subject_of(&a), Some(os));
}

#[test]
fn unstub_all() {
    let (mut registry, board, os, time) = setup();
    registry.observe(&os).when("getcwd", args!()).unwrap().then_return("/tmp");
    registry.observe(&time).when("time", args!()).unwrap().then_return(42);
    assert_eq!(board.invoke(&os, "getcwd", args!()).unwrap(),
               Value::from("/tmp"));
    assert_eq!(board.invoke(&time, "time", args!()).unwrap(),
               Value::from(42));
    registry.unstub_all().unwrap();
    assert!(registry.is_empty());
    assert_eq!(board.invoke(&os, "getcwd", args!()).unwrap(),
               Value::from("/home"));
    assert_eq!(board.invoke(&time, "time", args!()).unwrap(), Value::from(0));
}

#[test]
fn unstub_one() {
    let (mut registry, board, os, time) = setup();
    registry.observe(&os).when("getcwd", args!()).unwrap().then_return("/tmp");
    registry.observe(&time).when("time", args!()).unwrap().then_return(42);
    registry.unstub(&os).unwrap();
    assert!(registry.mock_for(&os).is_none());
    assert!(registry.mock_for(&time).is_some());
    assert!(!board.is_patched(&os, "getcwd"));
    assert!(board.is_patched(&time, "time"));
    // Unknown subjects are ignored
    registry.unstub(&Subject::named("sys")).unwrap();
}

#[test]
fn register_and_unregister() {
    let mut registry = Registry::new();
    let subject = Subject::named("dog");
    let dog = Double::new("dog");
    registry.register(subject.clone(), dog.clone());
    registry.register(subject.clone(), dog.clone());
    assert_eq!(registry.len(), 1);
    let other = Double::new("other dog");
    registry.register(subject.clone(), other.clone());
    assert!(registry.mock_for(&subject).unwrap().ptr_eq(&other));
    assert!(registry.unregister(&subject).unwrap().ptr_eq(&other));
    assert!(registry.unregister(&subject).is_none());
}

#[test]
fn registry_settings() {
    let settings = Settings{strict: true, ..Default::default()};
    let mut registry = Registry::with_settings(settings);
    let dog = registry.observe(&Subject::named("dog"));
    assert!(dog.settings().strict);
    assert_eq!(dog.call("bark", args!()).unwrap_err().kind(),
               ErrorKind::UnexpectedInvocation);
}

#[test]
fn clear_forgets_without_restoring() {
    let (mut registry, board, os, _time) = setup();
    let double = registry.observe(&os);
    double.when("getcwd", args!()).unwrap().then_return("/tmp");
    registry.clear();
    assert!(registry.doubles().is_empty());
    assert!(board.is_patched(&os, "getcwd"));
    double.unstub().unwrap();
    assert!(!board.is_patched(&os, "getcwd"));
}
