// vim: tw=80
//! When several rules match a call, the most specific one answers
#![deny(warnings)]

use mockingbird::*;

fn answer(dog: &Double, a: Args) -> Value {
    dog.call("f", a).unwrap()
}

#[test]
fn closed_beats_open_declared_first() {
    let dog = Double::new("dog");
    dog.when("f", args!(1)).unwrap().then_return("closed");
    dog.when("f", args!(ANY_REST)).unwrap().then_return("open");
    assert_eq!(answer(&dog, args!(1)), Value::from("closed"));
    assert_eq!(answer(&dog, args!(2)), Value::from("open"));
}

#[test]
fn closed_beats_open_declared_last() {
    let dog = Double::new("dog");
    dog.when("f", args!(ANY_REST)).unwrap().then_return("open");
    dog.when("f", args!(any())).unwrap().then_return("closed");
    assert_eq!(answer(&dog, args!(1)), Value::from("closed"));
    assert_eq!(answer(&dog, args!(1, 2)), Value::from("open"));
}

#[test]
fn literal_beats_matcher_beats_any() {
    let dog = Double::new("dog");
    dog.when("f", args!(1)).unwrap().then_return("literal");
    dog.when("f", args!(gt(0))).unwrap().then_return("matcher");
    dog.when("f", args!(any())).unwrap().then_return("any");
    assert_eq!(answer(&dog, args!(1)), Value::from("literal"));
    assert_eq!(answer(&dog, args!(2)), Value::from("matcher"));
    assert_eq!(answer(&dog, args!(-2)), Value::from("any"));
}

#[test]
fn eq_counts_as_literal() {
    let dog = Double::new("dog");
    dog.when("f", args!(eq(1))).unwrap().then_return("eq");
    dog.when("f", args!(ge(1))).unwrap().then_return("ge");
    assert_eq!(answer(&dog, args!(1)), Value::from("eq"));
}

#[test]
fn leftmost_slot_decides() {
    let dog = Double::new("dog");
    dog.when("f", args!(1, any())).unwrap().then_return("left");
    dog.when("f", args!(any(), 2)).unwrap().then_return("right");
    assert_eq!(answer(&dog, args!(1, 2)), Value::from("left"));
}

#[test]
fn most_recent_wins_ties() {
    let dog = Double::new("dog");
    dog.when("f", args!(gt(0))).unwrap().then_return("first");
    dog.when("f", args!(lt(10))).unwrap().then_return("second");
    assert_eq!(answer(&dog, args!(5)), Value::from("second"));
    // Rebinding refreshes recency
    dog.when("f", args!(gt(0))).unwrap().then_return("third");
    assert_eq!(answer(&dog, args!(5)), Value::from("third"));
}

#[test]
fn names_are_separate() {
    let dog = Double::new("dog");
    dog.when("f", args!(ANY_REST)).unwrap().then_return("f");
    dog.when("g", args!(1)).unwrap().then_return("g");
    assert_eq!(dog.call("g", args!(1)).unwrap(), Value::from("g"));
    assert_eq!(dog.call("f", args!(1)).unwrap(), Value::from("f"));
}
