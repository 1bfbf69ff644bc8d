//! Group routing: per-device command selection within one atomic send.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tactus::gain::{Custom, Uniform};
use tactus::modulation::Static;
use tactus::{
    ArrayUnit, Controller, Device, Drive, Error, Group, Intensity, Phase, Point3, Segment,
};
use tactus_test_harness::MockLink;

async fn open_two() -> Controller<MockLink> {
    Controller::open(
        [
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ],
        MockLink::new(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn devices_receive_their_keyed_gain() {
    let mut array = open_two().await;
    let group = Group::new(|dev: &Device| Some(if dev.idx() == 0 { "a" } else { "b" }))
        .set("a", Uniform::new(Intensity::new(0x80)))
        .unwrap()
        .set("b", Uniform::new(Intensity::new(0x40)).with_phase(Phase::PI))
        .unwrap();
    array.send(group).await.unwrap();

    assert!(
        array.link()
            .drives(0, Segment::S0)
            .iter()
            .all(|d| *d == Drive::new(Phase::ZERO, Intensity::new(0x80)))
    );
    assert!(
        array.link()
            .drives(1, Segment::S0)
            .iter()
            .all(|d| *d == Drive::new(Phase::PI, Intensity::new(0x40)))
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn unknown_key_fails_and_updates_nothing() {
    let mut array = open_two().await;
    let group = Group::new(|dev: &Device| Some(if dev.idx() == 0 { "a" } else { "b" }))
        .set("a", Uniform::new(Intensity::MAX))
        .unwrap();
    let result = array.send(group).await;
    assert!(matches!(result, Err(Error::UnknownGroupKey)));

    for idx in 0..2 {
        assert!(
            array.link()
                .drives(idx, Segment::S0)
                .iter()
                .all(|d| *d == Drive::NULL),
            "device {idx} must be untouched"
        );
    }
    array.close().await.unwrap();
}

#[tokio::test]
async fn none_key_is_a_per_device_noop() {
    let mut array = open_two().await;
    let group = Group::new(|dev: &Device| (dev.idx() == 1).then_some("b"))
        .set("b", Uniform::new(Intensity::MAX))
        .unwrap();
    array.send(group).await.unwrap();

    assert!(
        array.link()
            .drives(0, Segment::S0)
            .iter()
            .all(|d| *d == Drive::NULL)
    );
    assert!(
        array.link()
            .drives(1, Segment::S0)
            .iter()
            .all(|d| d.intensity == Intensity::MAX)
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn disabled_device_is_excluded_from_routing_and_compute() {
    let mut array = open_two().await;
    array.geometry_mut().get_mut(0).unwrap().set_enable(false);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let group = Group::new(|_: &Device| Some("all"))
        .set(
            "all",
            Custom::new(move |dev: &Device, _| {
                assert_ne!(dev.idx(), 0, "compute must never see device 0");
                counter.fetch_add(1, Ordering::SeqCst);
                Drive::new(Phase::ZERO, Intensity::MAX)
            }),
        )
        .unwrap();
    array.send(group).await.unwrap();

    let per_device = array.geometry().get(1).unwrap().num_transducers();
    assert_eq!(calls.load(Ordering::SeqCst), per_device);
    assert!(
        array.link()
            .drives(0, Segment::S0)
            .iter()
            .all(|d| *d == Drive::NULL),
        "disabled device's drives stay zero"
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn shared_key_computes_once_for_both_devices() {
    let mut array = open_two().await;
    let produces = Arc::new(AtomicUsize::new(0));
    let counter = produces.clone();
    // Count per-transducer invocations: one produce over both devices
    // computes each transducer once.
    let group = Group::new(|_: &Device| Some("shared"))
        .set(
            "shared",
            Custom::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Drive::new(Phase::ZERO, Intensity::MAX)
            }),
        )
        .unwrap();
    array.send(group).await.unwrap();
    assert_eq!(
        produces.load(Ordering::SeqCst),
        array.geometry().num_transducers()
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn group_entry_may_be_a_datagram_pair() {
    let mut array = open_two().await;
    let group = Group::new(|dev: &Device| (dev.idx() == 0).then_some("both"))
        .set("both", (Static::new(), Uniform::new(Intensity::MAX)))
        .unwrap();
    array.send(group).await.unwrap();

    assert_eq!(array.link().modulation(0, Segment::S0), &[0xFF, 0xFF]);
    assert!(
        array.link()
            .drives(0, Segment::S0)
            .iter()
            .all(|d| d.intensity == Intensity::MAX)
    );
    // Device 1 was excluded: neither half reached it.
    assert!(
        array.link()
            .drives(1, Segment::S0)
            .iter()
            .all(|d| *d == Drive::NULL)
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn duplicate_key_rejected_at_registration() {
    let result = Group::new(|dev: &Device| Some(dev.idx()))
        .set(0, Uniform::new(Intensity::MAX))
        .unwrap()
        .set(0, Uniform::new(Intensity::MIN));
    assert!(matches!(result, Err(Error::KeyAlreadyExists)));
}
