//! # Command executor
//!
//! Runs vehicle maneuvers one at a time from a FIFO queue. Each maneuver is a
//! small state machine with the lifecycle:
//!
//! 1. `on_start` once, when it becomes the current command
//! 2. `execute` every update until it reports completion
//! 3. `on_end` once, after which it is dropped
//!
//! [`CmdExec::clear`] drops the pending queue and the current command without
//! calling `on_end`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod lane_change;
mod move_fwd;
mod params;
mod turn_arc;
mod turn_by_angle;
mod wait;

pub use lane_change::LaneChange;
pub use move_fwd::MoveForward;
pub use params::{CmdParams, Turn90Params, TurnArcParams};
pub use turn_arc::{Compass, TurnArc};
pub use turn_by_angle::TurnByAngle;
pub use wait::Wait;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::fmt::Display;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::veh_ctx::VehicleContext;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A stateful unit of motion executed to completion against a vehicle.
pub trait Maneuver {
    /// Capture the starting state, called once before the first `execute`.
    fn on_start(&mut self, ctx: &mut dyn VehicleContext);

    /// Advance the maneuver by `dt` seconds, returning `true` once complete.
    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool;

    /// Called once after `execute` has returned `true`.
    fn on_end(&mut self, _ctx: &mut dyn VehicleContext) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// FIFO executor of vehicle commands.
#[derive(Debug, Default)]
pub struct CmdExec {
    queue: VecDeque<VehicleCommand>,
    current: Option<VehicleCommand>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// All maneuvers the executor can run.
#[derive(Debug, Clone)]
pub enum VehicleCommand {
    MoveForward(MoveForward),
    LaneChange(LaneChange),
    TurnByAngle(TurnByAngle),
    TurnArc(TurnArc),
    Wait(Wait),
}

/// Kind of a command, without its state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum CmdKind {
    MoveForward,
    LaneChange,
    TurnByAngle,
    TurnArc,
    Wait,
}

/// Side to turn or change lane toward.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDir {
    Left,
    Right,
}

/// Outcome of one executor update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmdStatus {
    /// No command was run.
    Idle,

    /// A command of this kind ran and has not finished.
    Running(CmdKind),

    /// A command of this kind finished during this update.
    Completed(CmdKind),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdExec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command to the end of the queue.
    pub fn enqueue(&mut self, cmd: VehicleCommand) {
        debug!("Enqueued {}", cmd);
        self.queue.push_back(cmd);
    }

    /// Drop all pending commands and abort the current one without calling
    /// its `on_end`.
    pub fn clear(&mut self) {
        if self.current.is_some() || !self.queue.is_empty() {
            debug!(
                "Clearing command queue ({} pending, current {:?})",
                self.queue.len(),
                self.current_kind()
            );
        }
        self.queue.clear();
        self.current = None;
    }

    /// `true` if there is no current command and the queue is empty.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    pub fn num_pending(&self) -> usize {
        self.queue.len()
    }

    pub fn current_kind(&self) -> Option<CmdKind> {
        self.current.as_ref().map(|c| c.kind())
    }

    /// Run the current command for one update, starting the next queued one
    /// if there is no current command.
    pub fn update(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> CmdStatus {
        if self.current.is_none() {
            if let Some(mut next) = self.queue.pop_front() {
                debug!("Starting {}", next);
                next.on_start(ctx);
                self.current = Some(next);
            }
        }

        let cmd = match self.current.as_mut() {
            Some(c) => c,
            None => return CmdStatus::Idle,
        };

        let kind = cmd.kind();

        if cmd.execute(dt, ctx) {
            cmd.on_end(ctx);
            debug!("Finished {}", kind);
            self.current = None;
            CmdStatus::Completed(kind)
        } else {
            CmdStatus::Running(kind)
        }
    }
}

impl VehicleCommand {
    pub fn kind(&self) -> CmdKind {
        match self {
            VehicleCommand::MoveForward(_) => CmdKind::MoveForward,
            VehicleCommand::LaneChange(_) => CmdKind::LaneChange,
            VehicleCommand::TurnByAngle(_) => CmdKind::TurnByAngle,
            VehicleCommand::TurnArc(_) => CmdKind::TurnArc,
            VehicleCommand::Wait(_) => CmdKind::Wait,
        }
    }

    fn inner(&mut self) -> &mut dyn Maneuver {
        match self {
            VehicleCommand::MoveForward(c) => c,
            VehicleCommand::LaneChange(c) => c,
            VehicleCommand::TurnByAngle(c) => c,
            VehicleCommand::TurnArc(c) => c,
            VehicleCommand::Wait(c) => c,
        }
    }
}

impl Maneuver for VehicleCommand {
    fn on_start(&mut self, ctx: &mut dyn VehicleContext) {
        self.inner().on_start(ctx)
    }

    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool {
        self.inner().execute(dt, ctx)
    }

    fn on_end(&mut self, ctx: &mut dyn VehicleContext) {
        self.inner().on_end(ctx)
    }
}

impl Display for VehicleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VehicleCommand::{}", self.kind())
    }
}

impl Display for CmdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CmdKind::MoveForward => "MoveForward",
            CmdKind::LaneChange => "LaneChange",
            CmdKind::TurnByAngle => "TurnByAngle",
            CmdKind::TurnArc => "TurnArc",
            CmdKind::Wait => "Wait",
        };
        write!(f, "{}", name)
    }
}

impl TurnDir {
    /// Sign of the turn, left positive.
    pub fn sign(&self) -> f64 {
        match self {
            TurnDir::Left => 1.0,
            TurnDir::Right => -1.0,
        }
    }
}

impl From<MoveForward> for VehicleCommand {
    fn from(c: MoveForward) -> Self {
        VehicleCommand::MoveForward(c)
    }
}

impl From<LaneChange> for VehicleCommand {
    fn from(c: LaneChange) -> Self {
        VehicleCommand::LaneChange(c)
    }
}

impl From<TurnByAngle> for VehicleCommand {
    fn from(c: TurnByAngle) -> Self {
        VehicleCommand::TurnByAngle(c)
    }
}

impl From<TurnArc> for VehicleCommand {
    fn from(c: TurnArc) -> Self {
        VehicleCommand::TurnArc(c)
    }
}

impl From<Wait> for VehicleCommand {
    fn from(c: Wait) -> Self {
        VehicleCommand::Wait(c)
    }
}
