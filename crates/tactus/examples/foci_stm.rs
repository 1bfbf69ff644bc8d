//! Spatio-temporal modulation example.
//!
//! Sweeps a focal point around a circle at a 100 Hz pattern rate, staged
//! into segment S1 with a sync-index transition.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p tactus --example foci_stm
//! ```

use tactus::stm::FociStm;
use tactus::{
    ArrayUnit, Controller, Point3, Segment, SegmentExt, Silencer, TransitionMode,
};
use tactus_test_harness::MockLink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut array = Controller::open([ArrayUnit::new(Point3::ORIGIN)], MockLink::new()).await?;

    // STM steps change phase abruptly; turn smoothing off.
    array.send(Silencer::disable()).await?;

    let center = array.geometry().center() + Point3::new(0.0, 0.0, 150.0);
    let circle = (0..50).map(|i| {
        let theta = 2.0 * std::f32::consts::PI * i as f32 / 50.0;
        center + Point3::new(30.0 * theta.cos(), 30.0 * theta.sin(), 0.0)
    });

    // 50 samples at 100 Hz: the firmware samples foci at 5 kHz.
    let stm = FociStm::new(100.0_f32, circle)?;
    println!(
        "Pattern: {} samples, sampling division {}",
        stm.num_samples(),
        stm.sampling_config()?.division()
    );

    array.send(stm.with_segment(Segment::S1, TransitionMode::SyncIdx))
        .await?;

    println!(
        "Active foci-STM segment: {}",
        array.link().foci_stm_segment(0)
    );
    println!(
        "Staged samples in S1: {}",
        array.link().foci_stm(0, Segment::S1).len()
    );

    array.close().await?;
    Ok(())
}
