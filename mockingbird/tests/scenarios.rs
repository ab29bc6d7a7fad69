// vim: tw=80
//! End-to-end dog/bark scenarios
#![deny(warnings)]

use mockingbird::*;
use pretty_assertions::assert_eq;

#[test]
fn bark_twice() {
    let dog = Double::new("dog");
    dog.when("bark", args!("Miau")).unwrap().then_return("Wuff");
    assert_eq!(dog.call("bark", args!("Miau")).unwrap(), Value::from("Wuff"));
    assert_eq!(dog.call("bark", args!("Miau")).unwrap(), Value::from("Wuff"));
    dog.verify_with("bark", args!("Miau"),
                    VerifyOptions{times: Some(2), ..Default::default()})
        .unwrap();
    let e = dog.verify_with("bark", args!("Miau"),
                            VerifyOptions{times: Some(1), ..Default::default()})
        .unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Verification);
    assert_eq!(e.to_string(), "Wanted times: 1, actual times: 2");
}

#[test]
fn loose_then_exact() {
    let dog = Double::new("dog");
    dog.when("bark", args!(ANY_REST)).unwrap().then_return("loose");
    dog.when("bark", args!("Miau")).unwrap().then_return("exact");
    assert_eq!(dog.call("bark", args!("Miau")).unwrap(), Value::from("exact"));
    assert_eq!(dog.call("bark", args!("Wuff")).unwrap(), Value::from("loose"));
}

#[test]
fn exact_beats_loose_in_either_order() {
    for exact_first in [true, false] {
        let f = Double::new("f");
        let loose = || {
            f.when("f", args!(ANY_REST)).unwrap().then_return("loose");
        };
        let exact = || {
            f.when("f", args!(1, 2)).unwrap().then_return("exact");
        };
        if exact_first {
            exact();
            loose();
        } else {
            loose();
            exact();
        }
        assert_eq!(f.call("f", args!(1, 2)).unwrap(), Value::from("exact"));
    }
}

#[test]
fn a_call_matches_itself() {
    let call = CallArgs::new(args!(1, "two", 3.0; four = vec![4])).unwrap();
    let dog = Double::strict("dog");
    dog.when("f", args!(1, "two", 3.0; four = vec![4])).unwrap()
        .then_return(true);
    assert_eq!(dog.call_args("f", call.clone()).unwrap(), Value::from(true));
    let pattern = ArgumentPattern::literal(&call);
    assert_eq!(pattern.render("f"), call.render("f"));
}

#[test]
fn nan_matches_itself() {
    let dog = Double::strict("dog");
    dog.when("f", args!(f64::NAN)).unwrap().then_return("nan");
    assert_eq!(dog.call("f", args!(f64::NAN)).unwrap(), Value::from("nan"));
    assert_ne!(Value::from(f64::NAN), Value::from(1.0));
}
