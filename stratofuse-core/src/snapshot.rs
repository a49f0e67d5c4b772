//! Shared Sensor Snapshot
//!
//! ## Overview
//!
//! Sensor drivers run as independent polling tasks. Each one writes its
//! latest value into a per-channel atomic slot of a shared
//! [`SensorSnapshot`]; the estimation task reads all slots into a
//! [`SensorFrame`] right before calling
//! [`Estimator::estimate_frame`](crate::Estimator::estimate_frame).
//!
//! ```text
//! accel task ──┐
//! gyro task  ──┤  store (Relaxed)   ┌──────────────┐   load (Relaxed)
//! mag task   ──┼──────────────────→ │ SensorSnapshot│ ─────────────────→ SensorFrame
//! baro task  ──┘                    └──────────────┘
//! ```
//!
//! ## Consistency
//!
//! Every `f32` is stored as its bit pattern in an `AtomicU32` with
//! `Relaxed` ordering. Individual components are never torn, but a frame is
//! *not* a transaction: accel, gyro, mag and baro may come from slightly
//! different instants, and even the three axes of one vector may straddle a
//! driver update. The estimator is a smoothing filter, so this is acceptable.
//!
//! ## Driver Seam
//!
//! Drivers implement [`SensorSource`], whose `read` follows the `nb`
//! convention: `WouldBlock` while a conversion is pending, `Other(e)` on bus
//! failure. Register-level driver code lives outside this crate.
//!
//! ```rust
//! use stratofuse_core::snapshot::{SensorReading, SensorSnapshot, SensorSource};
//!
//! struct FixedBaro;
//!
//! impl SensorSource for FixedBaro {
//!     type Error = ();
//!     fn read(&mut self) -> nb::Result<SensorReading, ()> {
//!         Ok(SensorReading::Barometer(12.5))
//!     }
//! }
//!
//! static SNAPSHOT: SensorSnapshot = SensorSnapshot::new();
//!
//! SNAPSHOT.poll(&mut FixedBaro, 40).unwrap();
//! let frame = SNAPSHOT.load();
//! assert_eq!(frame.baro_altitude, 12.5);
//! assert_eq!(frame.timestamp, 40);
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fusion::matrix::Vector3;
use crate::time::Timestamp;

/// Closed set of sensor channels the estimator consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorKind {
    /// Accelerometer
    Accelerometer,
    /// Gyroscope
    Gyroscope,
    /// Magnetometer
    Magnetometer,
    /// Barometric altimeter
    Barometer,
}

/// One reading from one sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorReading {
    /// Specific force, body frame
    Accelerometer(Vector3),
    /// Angular rate (rad/s), body frame
    Gyroscope(Vector3),
    /// Magnetic field (device units), body frame
    Magnetometer(Vector3),
    /// Pressure altitude (m)
    Barometer(f32),
}

impl SensorReading {
    /// Channel this reading belongs to
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Accelerometer(_) => SensorKind::Accelerometer,
            Self::Gyroscope(_) => SensorKind::Gyroscope,
            Self::Magnetometer(_) => SensorKind::Magnetometer,
            Self::Barometer(_) => SensorKind::Barometer,
        }
    }
}

/// Non-blocking sensor driver
pub trait SensorSource {
    /// Bus or device error
    type Error;

    /// Fetch the latest reading
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while no fresh sample is ready.
    fn read(&mut self) -> nb::Result<SensorReading, Self::Error>;
}

/// Composite of the latest value on every channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorFrame {
    /// Accelerometer
    pub accel: Vector3,
    /// Gyroscope (rad/s)
    pub gyro: Vector3,
    /// Magnetometer
    pub mag: Vector3,
    /// Barometric altitude (m)
    pub baro_altitude: f32,
    /// Time of the most recent store (ms)
    pub timestamp: Timestamp,
}

/// Lock-free latest-value store shared between driver tasks and the
/// estimation task
#[derive(Debug)]
pub struct SensorSnapshot {
    accel: [AtomicU32; 3],
    gyro: [AtomicU32; 3],
    mag: [AtomicU32; 3],
    baro_altitude: AtomicU32,
    timestamp: AtomicU32,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSnapshot {
    /// All channels zero, usable in a `static`
    pub const fn new() -> Self {
        Self {
            accel: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            gyro: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            mag: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            baro_altitude: AtomicU32::new(0),
            timestamp: AtomicU32::new(0),
        }
    }

    /// Publish one reading taken at `timestamp`
    pub fn store(&self, reading: &SensorReading, timestamp: Timestamp) {
        match reading {
            SensorReading::Accelerometer(v) => store_vector(&self.accel, v),
            SensorReading::Gyroscope(v) => store_vector(&self.gyro, v),
            SensorReading::Magnetometer(v) => store_vector(&self.mag, v),
            SensorReading::Barometer(altitude) => store_f32(&self.baro_altitude, *altitude),
        }
        self.timestamp.store(timestamp, Ordering::Relaxed);
    }

    /// Read `source` once and publish the result
    ///
    /// Returns the channel that was updated. `WouldBlock` and driver errors
    /// leave the snapshot untouched.
    pub fn poll<S: SensorSource>(
        &self,
        source: &mut S,
        timestamp: Timestamp,
    ) -> nb::Result<SensorKind, S::Error> {
        let reading = source.read()?;
        self.store(&reading, timestamp);
        Ok(reading.kind())
    }

    /// Best-effort composite of all channels
    pub fn load(&self) -> SensorFrame {
        SensorFrame {
            accel: load_vector(&self.accel),
            gyro: load_vector(&self.gyro),
            mag: load_vector(&self.mag),
            baro_altitude: load_f32(&self.baro_altitude),
            timestamp: self.timestamp.load(Ordering::Relaxed),
        }
    }
}

fn store_f32(slot: &AtomicU32, value: f32) {
    slot.store(value.to_bits(), Ordering::Relaxed);
}

fn load_f32(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Relaxed))
}

fn store_vector(slots: &[AtomicU32; 3], v: &Vector3) {
    for (slot, value) in slots.iter().zip(v) {
        store_f32(slot, *value);
    }
}

fn load_vector(slots: &[AtomicU32; 3]) -> Vector3 {
    [load_f32(&slots[0]), load_f32(&slots[1]), load_f32(&slots[2])]
}
