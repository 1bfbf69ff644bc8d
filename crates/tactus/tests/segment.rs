//! Segment double-buffering and transition-mode behavior, observed
//! through the mock link's firmware model.

use tactus::modulation::Custom;
use tactus::gain::Uniform;
use tactus::{
    ArrayUnit, Controller, Drive, FiniteTransitionMode, Intensity, LoopBehavior, LoopExt, Phase,
    Point3, SamplingConfig, Segment, SegmentExt, Silencer, SwapSegment, TransitionMode,
};
use tactus_test_harness::MockLink;

async fn open_one() -> Controller<MockLink> {
    Controller::open([ArrayUnit::new(Point3::ORIGIN)], MockLink::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn staging_write_leaves_active_segment_unchanged() {
    let mut array = open_one().await;
    let staged = Custom::new(vec![1, 2, 3, 4], SamplingConfig::FREQ_4K)
        .with_segment(Segment::S1, TransitionMode::Later);

    // Producing and sending the same wrapped datagram twice stages
    // identical content both times and never flips the active segment.
    for _ in 0..2 {
        array.send(&staged).await.unwrap();
        assert_eq!(array.link().modulation_segment(0), Segment::S0);
        assert_eq!(array.link().modulation(0, Segment::S1), &[1, 2, 3, 4]);
    }
    array.close().await.unwrap();
}

#[tokio::test]
async fn immediate_transition_flips_active_segment() {
    let mut array = open_one().await;
    array.send(
        Custom::new(vec![9, 9], SamplingConfig::FREQ_4K)
            .with_segment(Segment::S1, TransitionMode::Immediate),
    )
    .await
    .unwrap();
    assert_eq!(array.link().modulation_segment(0), Segment::S1);
    assert_eq!(
        array.link().modulation_transition(0),
        Some(TransitionMode::Immediate)
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn swap_segment_flips_without_rewriting_content() {
    let mut array = open_one().await;
    array.send(
        Custom::new(vec![5, 6], SamplingConfig::FREQ_4K)
            .with_segment(Segment::S1, TransitionMode::Later),
    )
    .await
    .unwrap();
    assert_eq!(array.link().modulation_segment(0), Segment::S0);

    array.send(SwapSegment::Modulation(Segment::S1, TransitionMode::Immediate))
        .await
        .unwrap();
    assert_eq!(array.link().modulation_segment(0), Segment::S1);
    assert_eq!(array.link().modulation(0, Segment::S1), &[5, 6]);
    array.close().await.unwrap();
}

#[tokio::test]
async fn finite_loop_carries_count_and_trigger() {
    let mut array = open_one().await;
    array.send(Silencer::disable()).await.unwrap();
    array.send(
        Custom::new(vec![1, 2, 3], SamplingConfig::FREQ_4K)
            .with_finite_loop(Segment::S1, FiniteTransitionMode::SyncIdx, 3)
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(
        array.link().modulation_loop(0, Segment::S1),
        LoopBehavior::finite(3).unwrap()
    );
    assert_eq!(array.link().modulation_segment(0), Segment::S1);
    assert_eq!(
        array.link().modulation_transition(0),
        Some(TransitionMode::SyncIdx)
    );
    array.close().await.unwrap();
}

#[tokio::test]
async fn loop_behavior_staged_with_explicit_segment() {
    let mut array = open_one().await;
    array.send(
        Custom::new(vec![7, 8], SamplingConfig::FREQ_4K).with_loop_behavior(
            Segment::S1,
            TransitionMode::Later,
            LoopBehavior::ONCE,
        ),
    )
    .await
    .unwrap();
    assert_eq!(array.link().modulation_loop(0, Segment::S1), LoopBehavior::ONCE);
    assert_eq!(array.link().modulation_segment(0), Segment::S0, "Later never flips");
    array.close().await.unwrap();
}

#[tokio::test]
async fn gain_segments_are_independent_buffers() {
    let mut array = open_one().await;
    array.send(
        Uniform::new(Intensity::new(0x11)).with_segment(Segment::S1, TransitionMode::Later),
    )
    .await
    .unwrap();
    // Staging S1 leaves the active S0 drives untouched (all zero).
    assert_eq!(array.link().gain_segment(0), Segment::S0);
    assert!(
        array.link()
            .drives(0, Segment::S0)
            .iter()
            .all(|d| *d == Drive::NULL)
    );
    assert!(
        array.link()
            .drives(0, Segment::S1)
            .iter()
            .all(|d| d.intensity == Intensity::new(0x11) && d.phase == Phase::ZERO)
    );

    array.send(SwapSegment::Gain(Segment::S1)).await.unwrap();
    assert_eq!(array.link().gain_segment(0), Segment::S1);
    array.close().await.unwrap();
}
