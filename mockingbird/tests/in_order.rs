// vim: tw=80
//! Verifying the order of calls across doubles
#![deny(warnings)]

use mockingbird::*;
use pretty_assertions::assert_eq;

fn message(r: Result<()>) -> String {
    r.unwrap_err().to_string()
}

#[test]
fn interleaved() {
    let a = Double::new("a");
    let b = Double::new("b");
    let in_order = InOrder::new(&[&a, &b]).unwrap();
    a.call("x", args!()).unwrap();
    b.call("y", args!()).unwrap();
    a.call("x", args!()).unwrap();

    in_order.verify(&a, "x", args!(), 1).unwrap();
    in_order.verify(&b, "y", args!(), 1).unwrap();
    in_order.verify(&a, "x", args!(), 1).unwrap();
    assert!(in_order.remaining().is_empty());
    assert!(a.invocations().iter().all(|i| i.verified_in_order()));
    verify_no_more_interactions(&[&a, &b]).unwrap();
}

#[test]
fn wrong_double() {
    let a = Double::new("a");
    let b = Double::new("b");
    let in_order = InOrder::new(&[&a, &b]).unwrap();
    a.call("x", args!()).unwrap();
    b.call("y", args!()).unwrap();
    a.call("x", args!()).unwrap();

    assert_eq!(message(in_order.verify(&b, "y", args!(), 1)),
               "Wanted a call from b, but got a.x() instead!");
    // The failure consumed nothing
    assert_eq!(in_order.remaining().len(), 3);
}

#[test]
fn wrong_call() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("bark", args!("Wuff")).unwrap();
    assert_eq!(message(in_order.verify(&dog, "bark", args!("Miau"), 1)),
               "Wanted bark(\"Miau\") to be invoked, got bark(\"Wuff\") \
                instead.");
}

#[test]
fn runs_are_counted() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    for _ in 0..3 {
        dog.call("bark", args!()).unwrap();
    }
    dog.call("sit", args!()).unwrap();
    assert_eq!(message(in_order.verify(&dog, "bark", args!(), 2)),
               "Wanted times: 2, actual times: 3");
    in_order.verify(&dog, "bark", args!(), VerificationMode::AtLeast(1))
        .unwrap();
    in_order.verify(&dog, "sit", args!(), 1).unwrap();
}

#[test]
fn run_failures_list_the_run() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("bark", args!("Wuff")).unwrap();
    dog.call("bark", args!("Wuff")).unwrap();
    match in_order.verify(&dog, "bark", args!("Wuff"), 1).unwrap_err() {
        Error::Verification{mode, actual, found, ..} => {
            assert_eq!(mode, Some(VerificationMode::Times(1)));
            assert_eq!(actual, Some(2));
            assert_eq!(found, vec!["bark(\"Wuff\")".to_owned(); 2]);
        },
        other => panic!("unexpected error {:?}", other)
    }
}

#[test]
fn invalid_modes() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("bark", args!()).unwrap();
    let e = in_order.verify(&dog, "bark", args!(),
                            VerificationMode::Between(2, 1)).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Argument);
    let e = in_order.verify(&dog, "bark", args!(),
                            VerificationMode::AtLeast(0)).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Argument);
    // Nothing was consumed
    assert_eq!(in_order.remaining().len(), 1);
}

#[test]
fn exhausted_queue() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    assert_eq!(message(in_order.verify(&dog, "bark", args!(), 1)),
               "There are no recorded invocations.");
    dog.call("bark", args!()).unwrap();
    in_order.verify(&dog, "bark", args!(), 1).unwrap();
    assert_eq!(message(in_order.verify(&dog, "bark", args!(), 1)),
               "There are no more recorded invocations.");
}

#[test]
fn optional_steps() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("sit", args!()).unwrap();
    in_order.verify(&dog, "bark", args!(), VerificationMode::never()).unwrap();
    in_order.verify(&dog, "bark", args!(), VerificationMode::AtMost(2))
        .unwrap();
    in_order.verify(&dog, "sit", args!(), 1).unwrap();
    in_order.verify(&dog, "sit", args!(), VerificationMode::AtMost(1))
        .unwrap();
}

#[test]
fn calls_before_the_session_are_not_queued() {
    let dog = Double::new("dog");
    dog.call("bark", args!()).unwrap();
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("sit", args!()).unwrap();
    in_order.verify(&dog, "sit", args!(), 1).unwrap();
}

#[test]
fn unobserved_double() {
    let a = Double::new("a");
    let b = Double::new("b");
    let in_order = InOrder::new(&[&a]).unwrap();
    let e = in_order.verify(&b, "y", args!(), 1).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Argument);
    assert_eq!(e.to_string(), "b is not part of that InOrder.");
}

#[test]
fn duplicate_double() {
    let a = Double::new("a");
    let e = InOrder::new(&[&a, &a.clone()]).err().unwrap();
    assert_eq!(e.kind(), ErrorKind::Argument);
    assert_eq!(e.to_string(), "a is provided more than once");
}

#[test]
fn closed_sessions_stop_recording() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("bark", args!()).unwrap();
    in_order.close();
    in_order.close();
    assert!(in_order.is_closed());
    dog.call("sit", args!()).unwrap();
    assert_eq!(in_order.queued().len(), 1);
    // Queued entries can still be verified
    in_order.verify(&dog, "bark", args!(), 1).unwrap();
}

#[test]
fn overlapping_sessions() {
    let a = Double::new("a");
    let b = Double::new("b");
    let first = InOrder::new(&[&a, &b]).unwrap();
    let second = InOrder::new(&[&b]).unwrap();
    a.call("x", args!()).unwrap();
    b.call("y", args!()).unwrap();
    assert_eq!(first.queued().len(), 2);
    assert_eq!(second.queued().len(), 1);
    second.verify(&b, "y", args!(), 1).unwrap();
    first.verify(&a, "x", args!(), 1).unwrap();
    first.verify(&b, "y", args!(), 1).unwrap();
}

#[test]
fn captors() {
    let dog = Double::new("dog");
    let in_order = InOrder::new(&[&dog]).unwrap();
    dog.call("bark", args!("Wuff")).unwrap();
    dog.call("bark", args!("Grr")).unwrap();
    let sound = captor();
    in_order.verify(&dog, "bark", args!(&sound), 2).unwrap();
    assert_eq!(sound.all_values(),
               vec![Value::from("Wuff"), Value::from("Grr")]);
}
