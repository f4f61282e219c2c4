//! # Drive manager
//!
//! [`DriveMgr`] runs one vehicle through the world, frame by frame. Each call
//! to `proc` does, in order:
//!
//! - Move every mounted sensor to its world pose
//! - Run the emergency raycast and the front, left and right sector sweeps
//! - Check the emergency brake guard, clearing the command queue on a trigger
//! - Track intersections, starting a turn on entry if the policy asks for one
//! - Run the command executor, or cruise forward when it is idle
//! - Notify the policy when a turn completes
//! - Archive the frame telemetry
//!
//! External control goes through [`DriveMgr::enqueue`],
//! [`DriveMgr::lane_change`], [`DriveMgr::clear`] and
//! [`DriveMgr::reset_brake`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod safety;

pub use params::*;
pub use safety::{SafetyGuard, SafetyParams};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use nalgebra::Vector2;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session,
};

use crate::cmd_exec::{CmdExec, CmdKind, CmdStatus, LaneChange, TurnArc, TurnDir, VehicleCommand};
use crate::loc::Pose;
use crate::mount::{MountRegistry, MountResult};
use crate::per::{RaycastSensor, SectorSweepSensor, SensorReading};
use crate::turn_policy::{build_policy, TurnDecision, TurnPolicy};
use crate::veh_ctx::{KinematicCtx, VehicleContext};
use crate::world::{IntersectionDetector, IntersectionHit, RectWorld, WorldError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Frame supervisor for a single kinematic vehicle.
pub struct DriveMgr {
    params: DriveMgrParams,
    world: RectWorld,

    ctx: KinematicCtx,
    exec: CmdExec,
    policy: Box<dyn TurnPolicy>,

    /// Sensors, owned by the sites they are mounted on.
    sensors: MountRegistry<Sensor>,

    guard: SafetyGuard,
    detector: IntersectionDetector,

    /// Units: seconds
    time_s: f64,

    status: DriveStatus,

    arch_status: Archiver,
}

/// Data needed to initialise the manager.
#[derive(Debug, Clone, Default)]
pub struct DriveMgrInit {
    pub params: DriveMgrParams,
    pub world: RectWorld,
}

/// Summary of one frame, also archived as the frame telemetry.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DriveStatus {
    /// Units: seconds
    pub time_s: f64,

    pub x: f64,
    pub y: f64,

    /// Units: radians
    pub heading_rad: f64,

    /// Units: world units/second
    pub speed: f64,

    pub decision: TurnDecision,
    pub active_cmd: Option<CmdKind>,
    pub emergency_brake: bool,
    pub in_intersection: bool,

    /// Distances reported by the emergency raycast and the sweeps.
    ///
    /// Units: world units
    pub d_emergency: f64,
    pub d_front: f64,
    pub d_left: f64,
    pub d_right: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DriveMgrError {
    #[error("Invalid world: {0}")]
    WorldError(WorldError),

    #[error("Could not mount a sensor on the \"{0}\" site: {1:?}")]
    MountError(&'static str, MountResult),

    #[error("Could not archive the drive telemetry: {0}")]
    ArchiveError(ArchiveError),
}

/// A sensor carried by the vehicle.
#[derive(Debug, Clone)]
pub enum Sensor {
    Raycast(RaycastSensor),
    Sweep(SectorSweepSensor),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveMgr {
    fn default() -> Self {
        let params = DriveMgrParams::default();
        let policy = build_policy(params.policy, &params.sticky_policy, &params.trend_policy);

        Self {
            guard: SafetyGuard::new(params.safety.clone()),
            sensors: MountRegistry::new(params.mount_sites.clone(), params.max_mounts),
            params,
            world: RectWorld::default(),
            ctx: KinematicCtx::default(),
            exec: CmdExec::new(),
            policy,
            detector: IntersectionDetector::default(),
            time_s: 0.0,
            status: DriveStatus::default(),
            arch_status: Archiver::default(),
        }
    }
}

impl Default for DriveStatus {
    fn default() -> Self {
        Self {
            time_s: 0.0,
            x: 0.0,
            y: 0.0,
            heading_rad: 0.0,
            speed: 0.0,
            decision: TurnDecision::Straight,
            active_cmd: None,
            emergency_brake: false,
            in_intersection: false,
            d_emergency: 0.0,
            d_front: 0.0,
            d_left: 0.0,
            d_right: 0.0,
        }
    }
}

impl State for DriveMgr {
    type InitData = DriveMgrInit;
    type InitError = DriveMgrError;

    /// Frame length in seconds.
    type InputData = f64;
    type OutputData = Pose;
    type StatusReport = DriveStatus;
    type ProcError = DriveMgrError;

    fn init(
        &mut self,
        init_data: Self::InitData,
        session: Option<&Session>,
    ) -> Result<(), Self::InitError> {
        let DriveMgrInit { params, world } = init_data;

        world.validate().map_err(DriveMgrError::WorldError)?;

        let spawn = Pose::new(
            params.spawn.x,
            params.spawn.y,
            params.spawn.heading_deg.to_radians(),
        );

        // Mount the sensors
        let mut sensors = MountRegistry::new(params.mount_sites.clone(), params.max_mounts);
        let parts = vec![
            (SITE_NOSE, Sensor::Raycast(RaycastSensor::new(params.emergency_ray.clone()))),
            (SITE_FRONT, Sensor::Sweep(SectorSweepSensor::new(&params.front_sweep))),
            (SITE_LEFT, Sensor::Sweep(SectorSweepSensor::new(&params.side_sweep))),
            (SITE_RIGHT, Sensor::Sweep(SectorSweepSensor::new(&params.side_sweep))),
        ];
        for (site, part) in parts {
            sensors
                .mount(site, part)
                .map_err(|(r, _)| DriveMgrError::MountError(site, r))?;
        }

        if let Some(s) = session {
            self.arch_status = Archiver::from_path(s, "drive_mgr/status.csv")
                .map_err(DriveMgrError::ArchiveError)?;
        }

        self.policy = build_policy(params.policy, &params.sticky_policy, &params.trend_policy);
        self.guard = SafetyGuard::new(params.safety.clone());
        self.detector = IntersectionDetector::new(world.intersections.clone());
        self.ctx = KinematicCtx::new(spawn);
        self.exec = CmdExec::new();
        self.sensors = sensors;
        self.world = world;
        self.params = params;
        self.time_s = 0.0;
        self.status = DriveStatus::default();

        info!(
            "DriveMgr initialised at ({:.2}, {:.2}) with {} obstacles and {} intersections",
            spawn.x(),
            spawn.y(),
            self.world.obstacles.len(),
            self.world.intersections.len()
        );

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let dt = input_data.max(0.0);
        let start_heading = self.ctx.heading();

        self.ctx.begin_frame();
        self.guard.tick(dt, start_heading);

        // ---- PERCEPTION ----

        self.sync_sensor_poses();

        let emergency = self.detect(SITE_NOSE);
        let front = self.detect(SITE_FRONT);
        let left = self.detect(SITE_LEFT);
        let right = self.detect(SITE_RIGHT);

        trace!(
            "Readings: emergency {:.2}, front {:.2}, left {:.2}, right {:.2}",
            emergency.distance,
            front.distance,
            left.distance,
            right.distance
        );

        // ---- SAFETY ----

        if self.guard.check(&emergency) {
            self.guard.abort_lane_change();
            self.exec.clear();
        }

        // ---- DECISION ----

        let hit = self.detector.update(self.ctx.x(), self.ctx.y());

        let mut decision = TurnDecision::Straight;
        if !self.guard.is_braked() && !self.is_turning() {
            decision = self
                .policy
                .decide(front.distance, left.distance, right.distance, dt);

            if hit.entered {
                if let Some(dir) = decision.turn_dir() {
                    self.start_turn(dir, &hit);
                }
            }
        }

        // ---- MOTION ----

        let mut cmd_status = CmdStatus::Idle;
        if !self.guard.is_braked() {
            cmd_status = self.exec.update(dt, &mut self.ctx);

            if cmd_status == CmdStatus::Idle {
                self.ctx.apply(0.0, self.params.cruise_speed * dt, 0.0);
            }
        }

        self.ctx.end_frame(dt);

        match cmd_status {
            CmdStatus::Running(CmdKind::LaneChange) if !self.guard.is_lane_changing() => {
                self.guard.on_lane_change_start(start_heading);
            }
            CmdStatus::Completed(CmdKind::LaneChange) => {
                if !self.guard.is_lane_changing() {
                    self.guard.on_lane_change_start(start_heading);
                }
                self.guard.on_lane_change_end();
            }
            CmdStatus::Completed(CmdKind::TurnArc) | CmdStatus::Completed(CmdKind::TurnByAngle) => {
                info!(
                    "Turn committed, new corridor left {:.2} right {:.2}",
                    left.distance, right.distance
                );
                self.policy.on_turn_committed(left.distance, right.distance);
            }
            _ => (),
        }

        // ---- TELEMETRY ----

        self.time_s += dt;

        let pose = self.ctx.pose();
        self.status = DriveStatus {
            time_s: self.time_s,
            x: pose.x(),
            y: pose.y(),
            heading_rad: pose.heading(),
            speed: pose.speed,
            decision,
            active_cmd: self.exec.current_kind(),
            emergency_brake: self.guard.is_braked(),
            in_intersection: hit.inside,
            d_emergency: emergency.distance,
            d_front: front.distance,
            d_left: left.distance,
            d_right: right.distance,
        };

        self.write().map_err(DriveMgrError::ArchiveError)?;

        Ok((pose, self.status))
    }
}

impl Archived for DriveMgr {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_status.serialise(self.status)
    }
}

impl DriveMgr {
    /// Append a command to the back of the queue.
    pub fn enqueue(&mut self, cmd: VehicleCommand) {
        if self.guard.is_braked() {
            warn!("Emergency brake engaged, {} will wait for a brake reset", cmd);
        }
        self.exec.enqueue(cmd);
    }

    /// Drop the queue and change one lane to the left or right.
    ///
    /// Refused while the emergency brake is latched, in which case `false`
    /// is returned.
    pub fn lane_change(&mut self, left: bool) -> bool {
        if self.guard.is_braked() {
            warn!("Lane change refused, emergency brake engaged");
            return false;
        }

        let dir = if left { TurnDir::Left } else { TurnDir::Right };

        self.clear();
        self.exec.enqueue(
            LaneChange::new(
                dir,
                self.params.lane_change_offset,
                self.params.lane_change_length,
                self.params.lane_change_duration_s,
            )
            .into(),
        );

        true
    }

    /// Drop all pending commands and abort the current one.
    pub fn clear(&mut self) {
        self.exec.clear();
        self.guard.on_lane_change_end();
    }

    /// Release the emergency brake.
    pub fn reset_brake(&mut self) {
        self.guard.reset();
    }

    pub fn params(&self) -> &DriveMgrParams {
        &self.params
    }

    pub fn pose(&self) -> Pose {
        self.ctx.pose()
    }

    pub fn is_braked(&self) -> bool {
        self.guard.is_braked()
    }

    pub fn is_idle(&self) -> bool {
        self.exec.is_idle()
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn last_status(&self) -> &DriveStatus {
        &self.status
    }

    /// The sensor mounted on a site.
    pub fn sensor(&self, site: &str) -> Option<&Sensor> {
        self.sensors.get(site)
    }

    fn is_turning(&self) -> bool {
        matches!(
            self.exec.current_kind(),
            Some(CmdKind::TurnArc) | Some(CmdKind::TurnByAngle)
        )
    }

    /// Place each sensor at its site, the nose using the guard's heading.
    fn sync_sensor_poses(&mut self) {
        let vehicle = self.ctx.pose();

        let mut nose_vehicle = vehicle;
        nose_vehicle.set_heading(self.guard.sensor_heading(vehicle.heading()));

        for site in [SITE_NOSE, SITE_FRONT, SITE_LEFT, SITE_RIGHT].iter() {
            let carrier = if *site == SITE_NOSE {
                &nose_vehicle
            } else {
                &vehicle
            };

            let pose = match self.sensors.world_pose(site, carrier) {
                Some(p) => p,
                None => continue,
            };

            match self.sensors.get_mut(site) {
                Some(Sensor::Raycast(s)) => s.set_pose(pose),
                Some(Sensor::Sweep(s)) => s.set_pose(pose),
                None => (),
            }
        }
    }

    fn detect(&mut self, site: &str) -> SensorReading {
        let world = &self.world;
        match self.sensors.get_mut(site) {
            Some(Sensor::Raycast(s)) => s.detect(world),
            Some(Sensor::Sweep(s)) => s.detect(world),
            None => SensorReading {
                triggered: false,
                distance: 0.0,
                angle: 0.0,
                label: "",
            },
        }
    }

    /// Queue a turn through the intersection just entered.
    fn start_turn(&mut self, dir: TurnDir, hit: &IntersectionHit) {
        let rect = match hit.rect {
            Some(r) => r,
            None => return,
        };
        let centre = hit.centre.unwrap_or_else(|| rect.centre());

        // Exit lane half a lane to the right of the exit heading
        let exit_heading = self.ctx.heading() + dir.sign() * FRAC_PI_2;
        let right = Vector2::new(exit_heading.sin(), -exit_heading.cos());
        let lane_centre = centre + right * (0.5 * self.params.lane_width);

        info!(
            "Entered intersection {:?}, turning {:?}",
            hit.index.unwrap_or_default(),
            dir
        );
        debug!("Exit lane centre ({:.2}, {:.2})", lane_centre.x, lane_centre.y);

        self.guard.abort_lane_change();
        self.exec.clear();
        self.exec.enqueue(
            TurnArc::new(dir, rect, lane_centre, self.params.cmd.turn_arc.clone()).into(),
        );
        self.policy.on_turn_started();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd_exec::MoveForward;
    use crate::world::Rect;

    const DT: f64 = 1.0 / 60.0;

    fn mgr(world: RectWorld) -> DriveMgr {
        let mut m = DriveMgr::default();
        m.init(
            DriveMgrInit {
                params: DriveMgrParams::default(),
                world,
            },
            None,
        )
        .unwrap();
        m
    }

    #[test]
    fn test_cruise_when_idle() {
        let mut m = mgr(RectWorld::default());

        for _ in 0..60 {
            let (_, status) = m.proc(&DT).unwrap();
            assert_eq!(status.active_cmd, None);
        }

        // One second at the cruise speed
        assert!((m.pose().x() - 4.0).abs() < 1e-9);
        assert!(m.pose().y().abs() < 1e-12);
        assert!((m.last_status().speed - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_emergency_brake_latches() {
        let world = RectWorld::new(vec![Rect::new(10.0, -5.0, 1.0, 10.0)], vec![]);
        let mut m = mgr(world);
        m.enqueue(MoveForward::new(100.0, 4.0).into());

        let mut frames = 0;
        while !m.is_braked() {
            m.proc(&DT).unwrap();
            frames += 1;
            assert!(frames < 1000);
        }
        let stopped_at = m.pose().x();
        assert!(stopped_at < 10.0);
        assert!(m.is_idle());

        // Lane changes are refused while braked
        assert!(!m.lane_change(true));
        for _ in 0..30 {
            let (_, status) = m.proc(&DT).unwrap();
            assert!(status.emergency_brake);
            assert_eq!(status.speed, 0.0);
        }
        assert_eq!(m.pose().x(), stopped_at);

        m.reset_brake();
        assert!(!m.is_braked());
    }

    fn nose_heading(m: &DriveMgr) -> f64 {
        match m.sensor(SITE_NOSE) {
            Some(Sensor::Raycast(s)) => s.pose().heading(),
            _ => panic!("no raycast on the nose"),
        }
    }

    #[test]
    fn test_turn_ends_lane_change() {
        // Eastbound road ending in a wall, with a road leading north
        let world = RectWorld::new(
            vec![
                Rect::new(-5.0, -5.0, 43.0, 1.0),
                Rect::new(-5.0, 4.0, 35.0, 1.0),
                Rect::new(37.0, -4.0, 1.0, 50.0),
                Rect::new(29.0, 5.0, 1.0, 40.0),
            ],
            vec![Rect::new(30.0, -4.0, 6.0, 8.0)],
        );

        let mut params = DriveMgrParams::default();
        params.spawn.x = 20.0;
        params.sticky_policy.front_hard = 8.0;

        let mut m = DriveMgr::default();
        m.init(DriveMgrInit { params, world }, None).unwrap();

        while m.pose().x() < 27.0 {
            m.proc(&DT).unwrap();
            assert!(m.time_s() < 5.0);
        }
        assert!(m.lane_change(true));

        // The junction turn cuts the lane change short
        let mut interrupted = false;
        for _ in 0..(60 * 6) {
            let was_lane_changing = m.guard.is_lane_changing();
            m.proc(&DT).unwrap();

            if was_lane_changing && m.exec.current_kind() == Some(CmdKind::TurnArc) {
                interrupted = true;
                assert!(!m.guard.in_transient());
            }
        }
        assert!(interrupted);
        assert!(!m.guard.in_transient());

        // Nose follows the vehicle once more
        m.sync_sensor_poses();
        assert!((nose_heading(&m) - m.pose().heading()).abs() < 1e-9);
    }

    #[test]
    fn test_clear_during_lane_change() {
        let mut m = mgr(RectWorld::default());
        assert!(m.lane_change(false));

        for _ in 0..10 {
            m.proc(&DT).unwrap();
        }
        assert!(m.guard.is_lane_changing());
        let frozen = nose_heading(&m);

        m.clear();
        assert!(!m.guard.is_lane_changing());

        // Grace period runs out and the nose tracks the vehicle again
        for _ in 0..30 {
            m.proc(&DT).unwrap();
        }
        assert!(!m.guard.in_transient());
        m.sync_sensor_poses();
        assert!((nose_heading(&m) - m.pose().heading()).abs() < 1e-9);
        assert!((frozen - m.pose().heading()).abs() > 1e-3);
    }

    #[test]
    fn test_missing_site_fails_init() {
        let mut params = DriveMgrParams::default();
        params.mount_sites.retain(|s| s.name != SITE_LEFT);

        let mut m = DriveMgr::default();
        let res = m.init(
            DriveMgrInit {
                params,
                world: RectWorld::default(),
            },
            None,
        );
        assert!(matches!(
            res,
            Err(DriveMgrError::MountError(SITE_LEFT, MountResult::FailedInvalidSite))
        ));
    }
}
