// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

use crate::motor::{BusError, InvalidVelocityError, Motor, MotorBus};
use aprox_eq::AproxEq;
use core::fmt;
use std::error::Error;

/// Per-side speeds for a differential drive, one value for the left pair of
/// motors and one for the right.
#[derive(AproxEq, Clone, Copy, Debug, Default, PartialEq)]
pub struct DriveSpeeds {
    pub left: f64,
    pub right: f64,
}

/// Maps stick readings to tank speeds: each stick commands its own side of
/// the drive, exactly as read. No mixing, clamping, deadband, or filtering.
#[inline]
#[must_use]
pub fn tank(left_y: f64, right_y: f64) -> DriveSpeeds {
    DriveSpeeds {
        left: left_y,
        right: right_y,
    }
}

/// Maps a forward and a rotation axis to per-side speeds, positive rotation
/// turning clockwise. The robot drives tank, this mapping is here for rigs
/// that want single-stick driving.
#[inline]
#[must_use]
pub fn arcade(forward: f64, rotate: f64) -> DriveSpeeds {
    DriveSpeeds {
        left: forward + rotate,
        right: forward - rotate,
    }
}

/// A differential drivetrain: two motors a side, every motor on a side
/// commanded identically.
pub struct Differential {
    left: [Motor; 2],
    right: [Motor; 2],
}

impl Differential {
    /// Creates a drivetrain from its left and right motor pairs.
    #[must_use]
    pub fn new(left: [Motor; 2], right: [Motor; 2]) -> Self {
        Self { left, right }
    }

    /// Commands both left motors with `speeds.left` and both right motors
    /// with `speeds.right`, sending the resulting packets on the given bus.
    pub fn apply(&mut self, speeds: DriveSpeeds, bus: &mut dyn MotorBus) -> DriveResult<()> {
        for motor in &mut self.left {
            bus.send(motor.set(speeds.left as f32)?)?;
        }

        for motor in &mut self.right {
            bus.send(motor.set(speeds.right as f32)?)?;
        }

        Ok(())
    }

    /// Commands every motor to zero velocity.
    #[inline]
    pub fn stop(&mut self, bus: &mut dyn MotorBus) -> DriveResult<()> {
        self.apply(DriveSpeeds::default(), bus)
    }

    /// Last commanded velocities ordered left front, left back, right front,
    /// right back.
    #[must_use]
    pub fn velocities(&self) -> [f32; 4] {
        [
            self.left[0].velocity(),
            self.left[1].velocity(),
            self.right[0].velocity(),
            self.right[1].velocity(),
        ]
    }
}

/// Result of commanding the drivetrain.
pub type DriveResult<T> = Result<T, DriveError>;

/// An error commanding the drivetrain, either a bad velocity or a bus that
/// would not take the packet.
#[derive(Debug, Clone)]
pub enum DriveError {
    Velocity(InvalidVelocityError),
    Bus(BusError),
}

impl From<InvalidVelocityError> for DriveError {
    fn from(err: InvalidVelocityError) -> Self {
        Self::Velocity(err)
    }
}

impl From<BusError> for DriveError {
    fn from(err: BusError) -> Self {
        Self::Bus(err)
    }
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Velocity(e) => write!(f, "drive: {}", e),
            Self::Bus(e) => write!(f, "drive: {}", e),
        }
    }
}

impl Error for DriveError {}

#[cfg(test)]
mod tests {
    use super::{arcade, tank, Differential, DriveSpeeds};
    use crate::{motor::Motor, sim::SimBus};
    use aprox_eq::assert_aprox_eq;

    fn drivetrain() -> Differential {
        Differential::new(
            [Motor::new(1, false), Motor::new(2, false)],
            [Motor::new(3, true), Motor::new(4, true)],
        )
    }

    #[test]
    fn tank_is_identity() {
        let mut l = -1f64;

        while l <= 1f64 {
            let mut r = -1f64;

            while r <= 1f64 {
                let speeds = tank(l, r);

                assert_eq!(speeds.left, l);
                assert_eq!(speeds.right, r);

                r += 0.125;
            }

            l += 0.125;
        }
    }

    #[test]
    fn arcade_mixes_forward_and_rotate() {
        assert_aprox_eq!(
            arcade(0.5, 0.25),
            DriveSpeeds {
                left: 0.75,
                right: 0.25,
            }
        );

        assert_aprox_eq!(
            arcade(0.5, -0.25),
            DriveSpeeds {
                left: 0.25,
                right: 0.75,
            }
        );

        // No rotation drives both sides the same.
        assert_aprox_eq!(
            arcade(0.8, 0.0),
            DriveSpeeds {
                left: 0.8,
                right: 0.8,
            }
        );
    }

    #[test]
    fn apply_commands_pairs_identically() {
        let mut drive = drivetrain();
        let mut bus = SimBus::new();

        drive.apply(tank(50.0, -30.0), &mut bus).unwrap();

        assert_eq!(drive.velocities(), [50f32, 50f32, -30f32, -30f32]);

        // Left side is not reversed so the wire value matches, the right
        // side is reversed so the wire value is negated.
        assert_eq!(bus.velocity(1), Some(50f32));
        assert_eq!(bus.velocity(2), Some(50f32));
        assert_eq!(bus.velocity(3), Some(30f32));
        assert_eq!(bus.velocity(4), Some(30f32));
    }

    #[test]
    fn stop_zeroes_every_motor() {
        let mut drive = drivetrain();
        let mut bus = SimBus::new();

        drive.apply(tank(0.6, 0.4), &mut bus).unwrap();
        drive.stop(&mut bus).unwrap();

        assert_eq!(drive.velocities(), [0f32; 4]);

        for port in 1..=4u8 {
            assert_eq!(bus.velocity(port), Some(0f32));
        }
    }

    #[test]
    fn bad_velocity_is_refused() {
        let mut drive = drivetrain();
        let mut bus = SimBus::new();

        assert!(drive.apply(tank(f64::NAN, 0.0), &mut bus).is_err());
    }
}
