use super::*;

#[test]
fn admits_up_to_capacity() {
    let gate = ConcurrencyGate::new(2);

    let first = gate.try_acquire();
    let second = gate.try_acquire();
    let third = gate.try_acquire();

    assert!(first.is_some());
    assert!(second.is_some());
    assert!(third.is_none());
    assert_eq!(gate.available(), 0);
    assert_eq!(gate.in_flight(), 2);
}

#[test]
fn drop_releases_slot() {
    let gate = ConcurrencyGate::new(1);

    let permit = gate.try_acquire().expect("first acquire should succeed");
    assert!(gate.try_acquire().is_none());

    drop(permit);

    assert_eq!(gate.available(), 1);
    assert!(gate.try_acquire().is_some());
}

#[test]
fn release_happens_once_per_permit() {
    let gate = ConcurrencyGate::new(3);

    {
        let _a = gate.try_acquire().expect("acquire should succeed");
        let _b = gate.try_acquire().expect("acquire should succeed");
        assert_eq!(gate.in_flight(), 2);
    }

    assert_eq!(gate.in_flight(), 0);
    assert_eq!(gate.available(), gate.capacity());
}
