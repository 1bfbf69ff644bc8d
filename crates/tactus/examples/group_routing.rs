//! Per-device group routing example.
//!
//! Splits a two-unit geometry into a "focus" half and a "silent" half and
//! updates both in one atomic send.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p tactus --example group_routing
//! ```

use tactus::gain::{Focus, Null};
use tactus::modulation::Static;
use tactus::{ArrayUnit, Controller, Device, Group, Point3, Segment};
use tactus_test_harness::MockLink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let units = [
        ArrayUnit::new(Point3::ORIGIN),
        ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
    ];
    let mut array = Controller::open(units, MockLink::new()).await?;

    let group = Group::new(|dev: &Device| {
        if dev.idx() == 0 {
            Some("focus")
        } else {
            Some("silent")
        }
    })
    .set(
        "focus",
        (Static::new(), Focus::new(Point3::new(90.0, 80.0, 150.0))),
    )?
    .set("silent", Null::new())?;

    array.send(group).await?;

    for idx in 0..array.geometry().num_devices() {
        let drives = array.link().drives(idx, Segment::S0);
        let active: usize = drives.iter().filter(|d| d.intensity.value() > 0).count();
        println!("Device {idx}: {active} transducers emitting");
    }

    array.close().await?;
    Ok(())
}
