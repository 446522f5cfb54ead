// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

use crate::{
    field::{FieldControl, FieldMode, FieldStatus},
    motor::MotorBus,
    panel::Panel,
    sticks::Sticks,
};
use std::{error::Error, fmt::Display, mem, time};

/// Checks an `Option<time::Instant>`, if its a `Some` variant then its value
/// is returned, otherwise if its variant is `None` then
/// `time::Instant::now()` is returned.
macro_rules! now_if_none {
    ($t:expr) => {
        match $t {
            None => std::time::Instant::now(),
            Some(t) => t,
        }
    };
}

/// Manages the running of a `Bot` implementation: polls the field, keeps the
/// competition phase, and dispatches one bounded iteration of the active
/// phase per call to `BotRunner::run()`. Hardware goes in as concrete
/// backends and reaches the `Bot` as trait objects, so the simulated
/// backends in `sim` substitute freely.
pub struct BotRunner<T, F, B, S, P>
where
    T: Bot,
    F: FieldControl,
    B: MotorBus,
    S: Sticks,
    P: Panel,
{
    phase: Phase,
    comp_inited: bool,
    field: F,
    bus: B,
    sticks: S,
    panel: P,
    bot: T,
}

impl<T, F, B, S, P> BotRunner<T, F, B, S, P>
where
    T: Bot,
    F: FieldControl,
    B: MotorBus,
    S: Sticks,
    P: Panel,
{
    /// Creates a new `BotRunner` for running the given `Bot` implementation.
    /// The returned instance starts in `Phase::Initialize` with a value of
    /// the time it was created.
    #[must_use]
    pub fn new(bot: T, field: F, bus: B, sticks: S, panel: P) -> Self {
        Self {
            phase: Phase::Initialize(Some(time::Instant::now())),
            comp_inited: false,
            field,
            bus,
            sticks,
            panel,
            bot,
        }
    }

    /// Starts a loop calling `BotRunner::run()`. Errors out of a phase are
    /// handed to `Bot::fault()` and the loop keeps going, the field decides
    /// when a phase ends, not a failed iteration.
    pub fn start(&mut self) {
        loop {
            if let Err(e) = self.run() {
                self.bot.fault(&e);
            }
        }
    }

    /// Runs one iteration: polls the field, moves to the phase it asks for
    /// if that changed, then dispatches the `Bot`'s handler for the current
    /// phase. Should be called in a loop, `BotRunner::start()` does exactly
    /// that.
    pub fn run(&mut self) -> BotResult<()> {
        let status = self.field.status();

        // Initialize runs to completion, exactly once, before any
        // field-driven phase gets a look in.
        if matches!(self.phase, Phase::Initialize(_)) {
            let result = self.bot.init(&mut self.bus, &mut self.panel);
            self.set_phase(self.desired(status));
            return result;
        }

        let desired = self.desired(status);

        if mem::discriminant(&desired) != mem::discriminant(&self.phase) {
            self.set_phase(desired);
        }

        self.bot.base(self.phase, &mut self.panel)?;

        match self.phase {
            // Handled above, a completed initialize never comes back.
            Phase::Initialize(_) => Ok(()),

            Phase::CompInit(t) => {
                let result = self.bot.comp_init(
                    t.unwrap_or(time::Instant::now()),
                    &mut self.bus,
                    &mut self.panel,
                );

                self.comp_inited = true;
                self.set_phase(Phase::Disabled(None));
                result
            }

            Phase::Disabled(t) => self.bot.disabled(
                t.unwrap_or(time::Instant::now()),
                &mut self.bus,
                &mut self.panel,
            ),

            Phase::Autonomous(t) => self.bot.autonomous(
                t.unwrap_or(time::Instant::now()),
                &mut self.bus,
                &mut self.panel,
            ),

            Phase::Opcontrol(t) => self.bot.opcontrol(
                t.unwrap_or(time::Instant::now()),
                &mut self.sticks,
                &mut self.bus,
                &mut self.panel,
            ),
        }
    }

    /// The phase the last polled field status asks for. With no field
    /// attached the robot is under driver control, a connected field owns
    /// the mode, and the first disabled poll from a field runs competition
    /// setup before settling into disabled.
    fn desired(&self, status: FieldStatus) -> Phase {
        match status {
            FieldStatus {
                connected: false, ..
            } => Phase::Opcontrol(None),

            FieldStatus {
                mode: FieldMode::Disabled,
                ..
            } => match self.comp_inited {
                true => Phase::Disabled(None),
                false => Phase::CompInit(None),
            },

            FieldStatus {
                mode: FieldMode::Autonomous,
                ..
            } => Phase::Autonomous(None),

            FieldStatus {
                mode: FieldMode::Driver,
                ..
            } => Phase::Opcontrol(None),
        }
    }

    /// Sets the `Bot`'s phase to the given, and if the given `Phase` has a
    /// parameter of `None` populates it with the current time.
    #[inline]
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = match phase {
            Phase::Initialize(t) => Phase::Initialize(Some(now_if_none!(t))),
            Phase::CompInit(t) => Phase::CompInit(Some(now_if_none!(t))),
            Phase::Disabled(t) => Phase::Disabled(Some(now_if_none!(t))),
            Phase::Autonomous(t) => Phase::Autonomous(Some(now_if_none!(t))),
            Phase::Opcontrol(t) => Phase::Opcontrol(Some(now_if_none!(t))),
        }
    }

    /// The current competition phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The `Bot` being run, for bench inspection.
    #[inline]
    #[must_use]
    pub fn bot(&self) -> &T {
        &self.bot
    }

    /// The motor bus backend, for bench inspection.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutable access to the stick backend, for bench scripting.
    #[inline]
    pub fn sticks_mut(&mut self) -> &mut S {
        &mut self.sticks
    }

    /// The panel backend, for bench inspection.
    #[inline]
    #[must_use]
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Mutable access to the panel backend, for bench scripting.
    #[inline]
    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    /// Mutable access to the field backend, for bench scripting.
    #[inline]
    pub fn field_mut(&mut self) -> &mut F {
        &mut self.field
    }
}

/// Represents the custom struct that holds the custom code for running a
/// bot. All default implementations of phase handlers simply do nothing.
///
/// The looping phases are written as single iterations: the handler does one
/// pass of its work and returns, and the runner re-invokes it while the
/// field keeps the phase active. Giving the field somewhere to interrupt
/// between iterations is what lets a phase end without being force-killed.
pub trait Bot {
    /// Runs exactly once as soon as the runner starts, before any
    /// field-driven phase. Keep it short, every other phase waits on it.
    #[allow(unused_variables)]
    fn init(&mut self, bus: &mut dyn MotorBus, panel: &mut dyn Panel) -> BotResult<()> {
        Ok(())
    }

    /// Runs exactly once, on the first disabled poll with a field attached.
    /// Intended for competition-specific setup such as an autonomous
    /// selector on the panel.
    ///
    /// # Arguments
    ///
    /// * `time` - The time the phase was entered.
    #[allow(unused_variables)]
    fn comp_init(
        &mut self,
        time: time::Instant,
        bus: &mut dyn MotorBus,
        panel: &mut dyn Panel,
    ) -> BotResult<()> {
        Ok(())
    }

    /// Runs every iteration of every field-driven phase, before the phase's
    /// own handler. Houses work that spans phases: panel button polling,
    /// telemetry, log upkeep.
    ///
    /// # Arguments
    ///
    /// * `phase` - The current phase with a value of the time it was
    /// entered.
    #[allow(unused_variables)]
    fn base(&mut self, phase: Phase, panel: &mut dyn Panel) -> BotResult<()> {
        Ok(())
    }

    /// One iteration of the disabled phase. May not operate physically
    /// moving devices, holding the drivetrain at zero is the usual body.
    #[allow(unused_variables)]
    fn disabled(
        &mut self,
        time: time::Instant,
        bus: &mut dyn MotorBus,
        panel: &mut dyn Panel,
    ) -> BotResult<()> {
        Ok(())
    }

    /// One iteration of the autonomous phase, `time` being the instant the
    /// phase was entered, which is what timed routines measure from.
    #[allow(unused_variables)]
    fn autonomous(
        &mut self,
        time: time::Instant,
        bus: &mut dyn MotorBus,
        panel: &mut dyn Panel,
    ) -> BotResult<()> {
        Ok(())
    }

    /// One iteration of the teleoperated phase: read sticks, command
    /// motors, sleep the control tick.
    #[allow(unused_variables)]
    fn opcontrol(
        &mut self,
        time: time::Instant,
        sticks: &mut dyn Sticks,
        bus: &mut dyn MotorBus,
        panel: &mut dyn Panel,
    ) -> BotResult<()> {
        Ok(())
    }

    /// Called by `BotRunner::start()` when a phase handler returns an
    /// error. The loop continues afterwards.
    #[allow(unused_variables)]
    fn fault(&mut self, err: &BotError) {}
}

/// Represents a potential phase of a `Bot` instance. All variants hold a
/// value of `Option<time::Instant>` which will be populated with
/// `Some(time::Instant::now())` once they are used to set the phase of a
/// `Bot` instance.
#[derive(Clone, Copy, Debug)]
pub enum Phase {
    /// Program startup, runs once before anything else.
    Initialize(Option<time::Instant>),

    /// Competition-specific setup, runs once on first contact with a field.
    CompInit(Option<time::Instant>),

    /// Field attached but the robot is not enabled. Moving devices hold
    /// still.
    Disabled(Option<time::Instant>),

    /// The robot runs under its own control, no operator input.
    Autonomous(Option<time::Instant>),

    /// The robot runs under operator control.
    Opcontrol(Option<time::Instant>),
}

impl Phase {
    /// Short name of the phase, for logs and telemetry.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::CompInit(_) => "comp-init",
            Self::Disabled(_) => "disabled",
            Self::Autonomous(_) => "autonomous",
            Self::Opcontrol(_) => "opcontrol",
        }
    }
}

/// Represents the result of a phase handler related to the `Bot` trait or
/// `BotRunner` struct.
pub type BotResult<T> = Result<T, BotError>;

/// Represents an error that can occur within a phase handler related to the
/// `Bot` trait or `BotRunner` struct.
#[derive(Clone, Debug)]
pub struct BotError {
    pub msg: String,
}

impl BotError {
    #[must_use]
    pub fn new(msg: String) -> Self {
        Self { msg }
    }
}

impl Error for BotError {}

impl Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error running bot: {}", self.msg)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bot, BotResult, BotRunner, Phase};
    use crate::{
        field::{FieldMode, FieldStatus},
        motor::MotorBus,
        panel::Panel,
        sim::{ScriptField, SimBus, SimPanel, SimSticks},
        sticks::Sticks,
    };
    use std::time;

    /// Records the order its handlers run in.
    #[derive(Default)]
    struct TraceBot {
        calls: Vec<&'static str>,
    }

    impl Bot for TraceBot {
        fn init(&mut self, _: &mut dyn MotorBus, _: &mut dyn Panel) -> BotResult<()> {
            self.calls.push("init");
            Ok(())
        }

        fn comp_init(
            &mut self,
            _: time::Instant,
            _: &mut dyn MotorBus,
            _: &mut dyn Panel,
        ) -> BotResult<()> {
            self.calls.push("comp_init");
            Ok(())
        }

        fn base(&mut self, _: Phase, _: &mut dyn Panel) -> BotResult<()> {
            self.calls.push("base");
            Ok(())
        }

        fn disabled(
            &mut self,
            _: time::Instant,
            _: &mut dyn MotorBus,
            _: &mut dyn Panel,
        ) -> BotResult<()> {
            self.calls.push("disabled");
            Ok(())
        }

        fn autonomous(
            &mut self,
            _: time::Instant,
            _: &mut dyn MotorBus,
            _: &mut dyn Panel,
        ) -> BotResult<()> {
            self.calls.push("autonomous");
            Ok(())
        }

        fn opcontrol(
            &mut self,
            _: time::Instant,
            _: &mut dyn Sticks,
            _: &mut dyn MotorBus,
            _: &mut dyn Panel,
        ) -> BotResult<()> {
            self.calls.push("opcontrol");
            Ok(())
        }
    }

    fn runner(
        initial: FieldStatus,
    ) -> BotRunner<TraceBot, ScriptField, SimBus, SimSticks, SimPanel> {
        BotRunner::new(
            TraceBot::default(),
            ScriptField::new(initial),
            SimBus::new(),
            SimSticks::new(),
            SimPanel::new(),
        )
    }

    #[test]
    fn no_field_means_opcontrol_after_init() {
        let mut runner = runner(FieldStatus::disconnected());

        runner.run().unwrap();
        assert!(matches!(runner.phase(), Phase::Opcontrol(Some(_))));

        runner.run().unwrap();
        runner.run().unwrap();

        assert_eq!(
            runner.bot().calls,
            ["init", "base", "opcontrol", "base", "opcontrol"]
        );
    }

    #[test]
    fn first_field_contact_runs_comp_init_once() {
        let mut runner = runner(FieldStatus::connected(FieldMode::Disabled));

        runner.run().unwrap();
        assert!(matches!(runner.phase(), Phase::CompInit(Some(_))));

        runner.run().unwrap();
        assert!(matches!(runner.phase(), Phase::Disabled(Some(_))));

        runner.run().unwrap();
        runner.run().unwrap();

        assert_eq!(
            runner.bot().calls,
            ["init", "base", "comp_init", "base", "disabled", "base", "disabled"]
        );
    }

    #[test]
    fn field_mode_changes_switch_phases_between_iterations() {
        let mut runner = runner(FieldStatus::connected(FieldMode::Autonomous));

        runner.run().unwrap();
        runner.run().unwrap();
        assert!(matches!(runner.phase(), Phase::Autonomous(Some(_))));

        runner
            .field_mut()
            .push(FieldStatus::connected(FieldMode::Driver));
        runner.run().unwrap();
        assert!(matches!(runner.phase(), Phase::Opcontrol(Some(_))));

        runner
            .field_mut()
            .push(FieldStatus::connected(FieldMode::Disabled));
        runner.run().unwrap();

        assert_eq!(
            runner.bot().calls,
            ["init", "base", "autonomous", "base", "opcontrol", "base", "comp_init"]
        );
    }

    #[test]
    fn phase_entry_time_is_stable_for_the_phase() {
        let mut runner = runner(FieldStatus::disconnected());

        runner.run().unwrap();
        let entered = match runner.phase() {
            Phase::Opcontrol(Some(t)) => t,
            other => panic!("expected opcontrol, got {:?}", other),
        };

        runner.run().unwrap();
        runner.run().unwrap();

        match runner.phase() {
            Phase::Opcontrol(Some(t)) => assert_eq!(t, entered),
            other => panic!("expected opcontrol, got {:?}", other),
        }
    }
}
