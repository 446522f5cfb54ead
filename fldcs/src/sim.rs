// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

//! Simulated hardware backends. These stand in for the serial bus, gamepad,
//! panel, and field connection so the whole control loop runs on a bench or
//! in a unit test with no robot attached.

use crate::{
    field::{FieldControl, FieldStatus},
    motor::{BusResult, MotorBus, MotorData, MotorHeader},
    panel::{Panel, PanelError, PanelResult, LINE_COUNT},
    serial::Packet,
    sticks::Sticks,
};
use std::collections::{HashMap, VecDeque};

/// A motor bus that records every packet instead of driving pins.
#[derive(Default)]
pub struct SimBus {
    sent: Vec<Packet<MotorHeader, MotorData>>,
    velocities: HashMap<u8, f32>,
}

impl SimBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last wire velocity sent to the given port, `None` if the port was
    /// never commanded.
    #[must_use]
    pub fn velocity(&self, port: u8) -> Option<f32> {
        self.velocities.get(&port).copied()
    }

    /// Every packet sent, in order.
    #[must_use]
    pub fn sent(&self) -> &[Packet<MotorHeader, MotorData>] {
        &self.sent
    }
}

impl MotorBus for SimBus {
    fn send(&mut self, packet: Packet<MotorHeader, MotorData>) -> BusResult<MotorHeader> {
        let MotorData::Velocity(v) = packet.data;

        self.velocities.insert(packet.head.port(), v);
        self.sent.push(packet);
        Ok(packet.head)
    }
}

/// Sticks that read whatever a test wrote into them.
#[derive(Default)]
pub struct SimSticks {
    pub left_y: f64,
    pub right_y: f64,
}

impl SimSticks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sticks for SimSticks {
    fn poll(&mut self) {}

    fn left_y(&self) -> f64 {
        self.left_y
    }

    fn right_y(&self) -> f64 {
        self.right_y
    }
}

/// An in-memory panel with a settable button mask.
pub struct SimPanel {
    lines: [Option<String>; LINE_COUNT],

    /// Mask of buttons currently held, `BTN_*` bits.
    pub buttons: u8,
}

impl SimPanel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: std::array::from_fn(|_| None),
            buttons: 0,
        }
    }

    /// Text currently shown at the given line, `None` for a cleared or
    /// never-written line.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line)?.as_deref()
    }
}

impl Default for SimPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for SimPanel {
    fn set_line(&mut self, line: usize, text: &str) -> PanelResult<()> {
        match self.lines.get_mut(line) {
            Some(slot) => {
                *slot = Some(text.to_owned());
                Ok(())
            }
            None => Err(PanelError { line }),
        }
    }

    fn clear_line(&mut self, line: usize) -> PanelResult<()> {
        match self.lines.get_mut(line) {
            Some(slot) => {
                *slot = None;
                Ok(())
            }
            None => Err(PanelError { line }),
        }
    }

    fn buttons(&mut self) -> u8 {
        self.buttons
    }
}

/// Field control that replays a scripted sequence of statuses. Each queued
/// status is returned once, after which the last one repeats.
pub struct ScriptField {
    queue: VecDeque<FieldStatus>,
    current: FieldStatus,
}

impl ScriptField {
    /// Creates a field reporting the given status until told otherwise.
    #[must_use]
    pub fn new(initial: FieldStatus) -> Self {
        Self {
            queue: VecDeque::new(),
            current: initial,
        }
    }

    /// Queues a status to report on a later poll.
    pub fn push(&mut self, status: FieldStatus) {
        self.queue.push_back(status);
    }
}

impl FieldControl for ScriptField {
    fn status(&mut self) -> FieldStatus {
        if let Some(next) = self.queue.pop_front() {
            self.current = next;
        }

        self.current
    }
}
