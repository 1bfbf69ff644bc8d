//! Array geometry: devices, transducers, and their placement.
//!
//! A [`Geometry`] is an ordered sequence of [`Device`]s, each of which owns
//! a fixed grid of [`Transducer`]s. The geometry is created by the
//! controller from a list of [`ArrayUnit`] placements and is structurally
//! immutable afterwards except through [`Geometry::reconfigure`]. The only
//! mutable per-device state is the `enable` flag and the speed of sound.

use std::fmt;

use crate::sampling::BASE_FREQ_HZ;

/// Number of transducers along one side of an array unit.
pub const UNIT_SIDE: usize = 16;

/// Number of transducers on one array unit.
pub const UNIT_TRANSDUCERS: usize = UNIT_SIDE * UNIT_SIDE;

/// Center-to-center transducer spacing in millimeters.
pub const TRANSDUCER_PITCH_MM: f32 = 10.16;

/// Default speed of sound in air, in mm/s.
pub const DEFAULT_SOUND_SPEED: f32 = 340e3;

/// A point or vector in 3-D space, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point3 {
    /// The origin.
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a point from its coordinates.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Point3 { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, rhs: Point3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product.
    pub fn cross(self, rhs: Point3) -> Point3 {
        Point3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Euclidean length.
    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Return this vector scaled to unit length.
    ///
    /// Returns the zero vector unchanged.
    pub fn normalized(self) -> Point3 {
        let n = self.norm();
        if n > 0.0 { self * (1.0 / n) } else { self }
    }
}

impl std::ops::Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f32) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A unit quaternion describing an array unit's orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// Scalar part.
    pub w: f32,
    /// Vector part, x.
    pub x: f32,
    /// Vector part, y.
    pub y: f32,
    /// Vector part, z.
    pub z: f32,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a rotation of `angle_rad` radians about `axis`.
    pub fn from_axis_angle(axis: Point3, angle_rad: f32) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle_rad / 2.0).sin_cos();
        Quaternion {
            w: c,
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate(self, p: Point3) -> Point3 {
        let v = Point3::new(self.x, self.y, self.z);
        let t = v.cross(p) * 2.0;
        p + t * self.w + v.cross(t)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

/// Placement of one physical array unit within the geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayUnit {
    position: Point3,
    rotation: Quaternion,
}

impl ArrayUnit {
    /// Place a unit with its first transducer at `position`, unrotated.
    pub const fn new(position: Point3) -> Self {
        ArrayUnit {
            position,
            rotation: Quaternion::IDENTITY,
        }
    }

    /// Set the orientation of the unit.
    pub const fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self
    }
}

/// A single ultrasound transducer.
///
/// Owned by its [`Device`]; has no independent lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Transducer {
    idx: usize,
    dev_idx: usize,
    position: Point3,
}

impl Transducer {
    /// Index of this transducer within its device.
    pub const fn idx(&self) -> usize {
        self.idx
    }

    /// Index of the owning device within the geometry.
    pub const fn dev_idx(&self) -> usize {
        self.dev_idx
    }

    /// World-space position of the transducer, in millimeters.
    pub const fn position(&self) -> Point3 {
        self.position
    }
}

/// One addressable device (array unit) in the geometry.
#[derive(Debug, Clone)]
pub struct Device {
    idx: usize,
    enable: bool,
    sound_speed: f32,
    rotation: Quaternion,
    transducers: Vec<Transducer>,
}

impl Device {
    fn new(idx: usize, unit: &ArrayUnit) -> Self {
        let transducers = (0..UNIT_TRANSDUCERS)
            .map(|i| {
                let col = (i % UNIT_SIDE) as f32;
                let row = (i / UNIT_SIDE) as f32;
                let local = Point3::new(col * TRANSDUCER_PITCH_MM, row * TRANSDUCER_PITCH_MM, 0.0);
                Transducer {
                    idx: i,
                    dev_idx: idx,
                    position: unit.position + unit.rotation.rotate(local),
                }
            })
            .collect();
        Device {
            idx,
            enable: true,
            sound_speed: DEFAULT_SOUND_SPEED,
            rotation: unit.rotation,
            transducers,
        }
    }

    /// Index of this device within the geometry.
    pub const fn idx(&self) -> usize {
        self.idx
    }

    /// Whether this device participates in computation and routing.
    pub const fn enable(&self) -> bool {
        self.enable
    }

    /// Enable or disable this device.
    ///
    /// Disabled devices are excluded from gain computation and from group
    /// routing; they receive no commands.
    pub fn set_enable(&mut self, enable: bool) {
        self.enable = enable;
    }

    /// Speed of sound used for this device's wave computations, in mm/s.
    pub const fn sound_speed(&self) -> f32 {
        self.sound_speed
    }

    /// Set the speed of sound, in mm/s.
    pub fn set_sound_speed(&mut self, sound_speed: f32) {
        self.sound_speed = sound_speed;
    }

    /// Set the speed of sound from an air temperature in kelvin.
    pub fn set_sound_speed_from_temp(&mut self, temp_k: f32) {
        // Ideal diatomic gas: c = sqrt(γRT/M), γ=1.4, R=8.314 J/(mol K),
        // M=28.96 g/mol for air. Converted to mm/s.
        let c = (1.4 * 8.314_462_6 * temp_k / 28.964_7e-3).sqrt();
        self.sound_speed = c * 1e3;
    }

    /// Ultrasound wavelength at this device's speed of sound, in mm.
    pub fn wavelength(&self) -> f32 {
        self.sound_speed / BASE_FREQ_HZ as f32
    }

    /// Ultrasound wavenumber at this device's speed of sound, in rad/mm.
    pub fn wavenumber(&self) -> f32 {
        2.0 * std::f32::consts::PI / self.wavelength()
    }

    /// Orientation of this device.
    pub const fn rotation(&self) -> Quaternion {
        self.rotation
    }

    /// Number of transducers on this device.
    pub fn num_transducers(&self) -> usize {
        self.transducers.len()
    }

    /// The transducers of this device, in index order.
    pub fn transducers(&self) -> &[Transducer] {
        &self.transducers
    }

    /// Iterate over the transducers of this device.
    pub fn iter(&self) -> std::slice::Iter<'_, Transducer> {
        self.transducers.iter()
    }

    /// Center position of this device (mean of transducer positions).
    pub fn center(&self) -> Point3 {
        let sum = self
            .transducers
            .iter()
            .fold(Point3::ORIGIN, |acc, t| acc + t.position);
        sum * (1.0 / self.transducers.len() as f32)
    }
}

impl<'a> IntoIterator for &'a Device {
    type Item = &'a Transducer;
    type IntoIter = std::slice::Iter<'a, Transducer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transducers.iter()
    }
}

/// The full array geometry: an ordered sequence of devices.
#[derive(Debug, Clone)]
pub struct Geometry {
    devices: Vec<Device>,
}

impl Geometry {
    /// Build a geometry from unit placements.
    pub fn new(units: impl IntoIterator<Item = ArrayUnit>) -> Self {
        Geometry {
            devices: units
                .into_iter()
                .enumerate()
                .map(|(idx, unit)| Device::new(idx, &unit))
                .collect(),
        }
    }

    /// Number of devices, including disabled ones.
    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    /// Total number of transducers across all devices.
    pub fn num_transducers(&self) -> usize {
        self.devices.iter().map(Device::num_transducers).sum()
    }

    /// Center position of all devices.
    pub fn center(&self) -> Point3 {
        let sum = self
            .devices
            .iter()
            .fold(Point3::ORIGIN, |acc, d| acc + d.center());
        sum * (1.0 / self.devices.len() as f32)
    }

    /// Iterate over all devices, including disabled ones.
    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    /// Iterate over the enabled devices only.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.enable())
    }

    /// Get a device by index.
    pub fn get(&self, idx: usize) -> Option<&Device> {
        self.devices.get(idx)
    }

    /// Get a mutable device by index.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Device> {
        self.devices.get_mut(idx)
    }

    /// Replace the entire geometry with new unit placements.
    ///
    /// All devices come back enabled with the default speed of sound; this
    /// is the only structural mutation the geometry supports.
    pub fn reconfigure(&mut self, units: impl IntoIterator<Item = ArrayUnit>) {
        *self = Geometry::new(units);
    }

    /// A copy of this geometry with only the devices satisfying `keep`
    /// still enabled. Used for per-key group routing.
    pub(crate) fn masked(&self, keep: impl Fn(&Device) -> bool) -> Geometry {
        let mut clone = self.clone();
        for dev in &mut clone.devices {
            if dev.enable {
                dev.enable = keep(dev);
            }
        }
        clone
    }
}

impl<'a> IntoIterator for &'a Geometry {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
