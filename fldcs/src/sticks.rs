// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

/// Operator stick input: two analog Y axes, one per drive side. Readings are
/// bounded, their sign and scale belong to the backend.
pub trait Sticks {
    /// Pumps the backend's event queue. Call once per control iteration
    /// before reading axes.
    fn poll(&mut self);

    /// Deflection of the left stick along its Y axis.
    fn left_y(&self) -> f64;

    /// Deflection of the right stick along its Y axis.
    fn right_y(&self) -> f64;
}

/// Stick input from whatever gamepad gilrs finds. The most recently active
/// gamepad drives, axes with no data read as zero.
pub struct GilrsSticks {
    gilrs: gilrs::Gilrs,
    active: Option<gilrs::GamepadId>,
}

impl GilrsSticks {
    /// Creates the gilrs backend. Errors come from the platform's input
    /// stack, not from any particular gamepad being missing.
    pub fn new() -> Result<Self, gilrs::Error> {
        Ok(Self {
            gilrs: gilrs::Gilrs::new()?,
            active: None,
        })
    }

    fn axis(&self, axis: gilrs::Axis) -> f64 {
        let id = match self.active {
            Some(id) => id,
            None => return 0f64,
        };

        match self.gilrs.gamepad(id).axis_data(axis) {
            Some(a) => a.value() as f64,
            None => 0f64,
        }
    }
}

impl Sticks for GilrsSticks {
    fn poll(&mut self) {
        while let Some(event) = self.gilrs.next_event() {
            self.active = Some(event.id);
        }
    }

    fn left_y(&self) -> f64 {
        self.axis(gilrs::Axis::LeftStickY)
    }

    fn right_y(&self) -> f64 {
        self.axis(gilrs::Axis::RightStickY)
    }
}
