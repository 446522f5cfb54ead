// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

use crate::serial::{self, Header};
use core::fmt;
use std::error::Error;

/// A handle to a single drive motor on the serial bus. The port and reversal
/// flag are fixed at construction and never change.
#[derive(Clone, Copy, Debug)]
pub struct Motor {
    /// Address of the motor on the serial bus.
    port: u8,

    /// Whether the motor's direction of travel is flipped relative to its
    /// commanded velocity. Motors mounted mirrored across the chassis need
    /// this so that one velocity command moves both sides the same way.
    reversed: bool,

    /// Last commanded velocity, exactly as given to `Motor::set()`.
    velocity: f32,
}

impl Motor {
    /// Creates a new motor handle for the given bus port.
    #[must_use]
    pub fn new(port: u8, reversed: bool) -> Self {
        Motor {
            port,
            reversed,
            velocity: 0f32,
        }
    }

    /// Records the commanded velocity and generates the packet that commands
    /// it. The velocity passes through exactly as given, no scaling and no
    /// clamping, its range is the bus device's business. Returns an error if
    /// `velocity` is infinite or `NaN` (as checked by `f32::is_finite()`).
    pub fn set(
        &mut self,
        velocity: f32,
    ) -> Result<serial::Packet<MotorHeader, MotorData>, InvalidVelocityError> {
        if !velocity.is_finite() {
            return Err(InvalidVelocityError);
        }

        self.velocity = velocity;
        Ok(self.gen_packet())
    }

    /// Generates a serial packet commanding the motor's set velocity. The
    /// wire value is negated for reversed motors, the recorded commanded
    /// velocity is not.
    #[must_use]
    pub fn gen_packet(&self) -> serial::Packet<MotorHeader, MotorData> {
        let wire = match self.reversed {
            true => -self.velocity,
            false => self.velocity,
        };

        serial::Packet::new(
            MotorHeader {
                port: self.port,
                cmd: MotorCmd::SetVelocity,
            },
            MotorData::Velocity(wire),
        )
    }

    /// Gets the motor's last commanded velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Gets the motor's bus port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u8 {
        self.port
    }

    /// Whether the motor was constructed reversed.
    #[inline]
    #[must_use]
    pub fn reversed(&self) -> bool {
        self.reversed
    }
}

/// The seam between motor handles and whatever carries their packets to real
/// hardware. Implemented by `serial::Client` for the robot and by
/// `sim::SimBus` for bench runs and tests.
pub trait MotorBus {
    /// Queues a motor packet for delivery, returning its header on success.
    fn send(&mut self, packet: serial::Packet<MotorHeader, MotorData>) -> BusResult<MotorHeader>;
}

impl MotorBus for serial::Client {
    fn send(&mut self, packet: serial::Packet<MotorHeader, MotorData>) -> BusResult<MotorHeader> {
        serial::Client::send(self, packet).map_err(|_| BusError)
    }
}

/// Represents a serial packet header intended for a motor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotorHeader {
    pub(crate) port: u8,
    pub(crate) cmd: MotorCmd,
}

impl MotorHeader {
    /// The bus port this header addresses.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u8 {
        self.port
    }
}

impl serial::Header for MotorHeader {
    fn extract<T, U>(packet: &serial::Packet<T, U>) -> serial::ExtractionResult<Self>
    where
        T: serial::Header,
        U: serial::Data,
    {
        match packet.head.get() {
            (p, c) if c == MotorCmd::SetVelocity as u8 => Ok(Self {
                port: p,
                cmd: MotorCmd::SetVelocity,
            }),

            _ => Err(serial::ExtractionError),
        }
    }

    fn get(&self) -> (u8, u8) {
        (self.port, self.cmd as u8)
    }
}

/// Data being sent to a motor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotorData {
    Velocity(f32),
}

impl serial::Data for MotorData {
    fn extract<T, U>(packet: &serial::Packet<T, U>) -> serial::ExtractionResult<MotorData>
    where
        T: serial::Header,
        U: serial::Data,
    {
        let head = MotorHeader::extract(packet)?;

        match head.cmd {
            MotorCmd::SetVelocity => Ok(Self::Velocity(f32::from_bits(packet.data.get()))),
        }
    }

    fn get(&self) -> u32 {
        match self {
            Self::Velocity(v) => v.to_bits(),
        }
    }
}

/// Represents the command of a packet sent to a motor.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorCmd {
    /// Set the commanded velocity of the motor.
    SetVelocity = 1u8,
}

/// An invalid velocity was given to the motor.
#[derive(Debug, Clone)]
pub struct InvalidVelocityError;

impl fmt::Display for InvalidVelocityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid velocity, must be a real decimal")
    }
}

impl Error for InvalidVelocityError {}

/// Result of queueing a packet on a `MotorBus`.
pub type BusResult<T> = Result<T, BusError>;

/// The bus could not take the packet, which for the serial client means its
/// worker thread has returned with an error.
#[derive(Debug, Clone, Copy)]
pub struct BusError;

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "motor bus could not queue packet")
    }
}

impl Error for BusError {}

#[cfg(test)]
mod tests {
    use super::{Motor, MotorData};
    use crate::serial::{Data, Header, Packet, SerialData};

    #[test]
    fn records_commanded_velocity_exactly() {
        let mut motor = Motor::new(1, false);

        for v in [0f32, 50f32, -30f32, 127f32, -127f32, 0.25f32] {
            motor.set(v).unwrap();
            assert_eq!(motor.velocity(), v);
        }
    }

    #[test]
    fn reversal_negates_wire_value_only() {
        let mut motor = Motor::new(3, true);
        let packet = motor.set(-30f32).unwrap();

        assert_eq!(motor.velocity(), -30f32);
        assert_eq!(packet.data, MotorData::Velocity(30f32));
        assert!(motor.reversed());
    }

    #[test]
    fn rejects_non_finite_velocities() {
        let mut motor = Motor::new(2, false);

        assert!(motor.set(f32::NAN).is_err());
        assert!(motor.set(f32::INFINITY).is_err());
        assert!(motor.set(f32::NEG_INFINITY).is_err());

        // A failed set leaves the previous command in place.
        assert_eq!(motor.velocity(), 0f32);
    }

    #[test]
    fn packet_survives_the_wire() {
        let mut motor = Motor::new(4, false);
        let packet = motor.set(42.5f32).unwrap();

        let serial_data: SerialData = packet.into();
        let generic = Packet::<(u8, u8), u32>::parse(serial_data);

        let head = super::MotorHeader::extract(&generic).unwrap();
        let data = MotorData::extract(&generic).unwrap();

        assert_eq!(head.port(), 4);
        assert_eq!(data, MotorData::Velocity(42.5f32));
    }
}
