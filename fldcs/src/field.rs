// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

use gpio::{sysfs::SysFsGpioInput, GpioIn, GpioValue};
use std::io;

/// What the field is asking of a connected robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldMode {
    Disabled,
    Autonomous,
    Driver,
}

/// One poll of the competition field connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldStatus {
    pub connected: bool,
    pub mode: FieldMode,
}

impl FieldStatus {
    /// No field attached. The mode is nominal, a disconnected robot is under
    /// driver control.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            connected: false,
            mode: FieldMode::Driver,
        }
    }

    /// A field attached and asking for the given mode.
    #[must_use]
    pub const fn connected(mode: FieldMode) -> Self {
        Self {
            connected: true,
            mode,
        }
    }
}

/// Source of the field connection's state, polled once per runner iteration.
pub trait FieldControl {
    fn status(&mut self) -> FieldStatus;
}

/// Field control wired to three GPIO input pins: presence (a field or
/// competition switch is attached), enable, and autonomous select. A pin
/// that fails to read counts as low, an absent field must never enable the
/// robot.
pub struct GpioField {
    presence: SysFsGpioInput,
    auton: SysFsGpioInput,
    enable: SysFsGpioInput,
}

impl GpioField {
    /// Opens the three field input pins.
    pub fn open(presence: u16, auton: u16, enable: u16) -> io::Result<Self> {
        Ok(Self {
            presence: SysFsGpioInput::open(presence)?,
            auton: SysFsGpioInput::open(auton)?,
            enable: SysFsGpioInput::open(enable)?,
        })
    }
}

impl FieldControl for GpioField {
    fn status(&mut self) -> FieldStatus {
        if !high(self.presence.read_value()) {
            return FieldStatus::disconnected();
        }

        let mode = match (high(self.enable.read_value()), high(self.auton.read_value())) {
            (false, _) => FieldMode::Disabled,
            (true, true) => FieldMode::Autonomous,
            (true, false) => FieldMode::Driver,
        };

        FieldStatus::connected(mode)
    }
}

#[inline]
fn high<E>(value: Result<GpioValue, E>) -> bool {
    matches!(value, Ok(GpioValue::High))
}
