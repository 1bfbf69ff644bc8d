//! Basic focus + modulation example.
//!
//! Demonstrates opening a controller, configuring the silencer, and
//! emitting a 150 Hz amplitude-modulated focal point. Runs against the
//! emulated mock link, so no hardware is required.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p tactus --example basic_focus
//! ```

use tactus::gain::Focus;
use tactus::modulation::Sine;
use tactus::{ArrayUnit, Controller, Point3, Segment, Silencer};
use tactus_test_harness::MockLink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut array = Controller::open([ArrayUnit::new(Point3::ORIGIN)], MockLink::new()).await?;

    println!("Connected to {} device(s)", array.geometry().num_devices());
    for version in array.firmware_version().await? {
        println!("  {version}");
    }

    // Smooth transitions with the default silencer.
    array.send(Silencer::new()).await?;

    // A focal point 150 mm above the array center, pulsing at 150 Hz.
    let center = array.geometry().center();
    let focus = Focus::new(center + Point3::new(0.0, 0.0, 150.0));
    array.send((Sine::new(150.0), focus)).await?;

    let buffer = array.link().modulation(0, Segment::S0);
    println!(
        "Modulation: {} samples at division {}",
        buffer.len(),
        array.link().modulation_division(0, Segment::S0)
    );
    let drives = array.link().drives(0, Segment::S0);
    println!(
        "First transducer drive: phase {}, intensity {}",
        drives[0].phase, drives[0].intensity
    );

    array.close().await?;
    Ok(())
}
