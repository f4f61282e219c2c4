//! End to end scenarios across the command, perception, decision and force
//! model layers.

use std::f64::consts::{FRAC_PI_2, PI};

use util::module::State;
use veh_lib::{
    cmd_exec::{CmdExec, CmdStatus, LaneChange, MoveForward, Turn90Params, TurnByAngle, TurnDir},
    drive_mgr::{DriveMgr, DriveMgrInit, DriveMgrParams},
    dyn_model::{DynamicsIntegrator, Surface, VehicleParams},
    loc::Pose,
    turn_policy::{StickyPolicyParams, StickyTurnPolicy, TurnDecision, TurnPolicy},
    veh_ctx::{KinematicCtx, VehicleContext},
    world::{Rect, RectWorld},
};

const DT: f64 = 1.0 / 60.0;

/// Run the executor until it goes idle, returning the number of updates.
fn run_to_idle(exec: &mut CmdExec, ctx: &mut KinematicCtx, dt: f64) -> usize {
    let mut frames = 0;
    loop {
        ctx.begin_frame();
        let status = exec.update(dt, ctx);
        ctx.end_frame(dt);

        if status == CmdStatus::Idle {
            return frames;
        }

        frames += 1;
        assert!(frames < 100_000, "executor never went idle");
    }
}

#[test]
fn test_lane_change_lands_on_lane() {
    let mut exec = CmdExec::new();
    let mut ctx = KinematicCtx::new(Pose::default());

    exec.enqueue(LaneChange::new(TurnDir::Left, 1.0, 8.0, 0.8).into());
    run_to_idle(&mut exec, &mut ctx, DT);

    assert!((ctx.x() - 8.0).abs() < 1e-9);
    assert!((ctx.y() - 1.0).abs() < 1e-9);
    assert!(ctx.heading().abs() < 1e-6);
}

#[test]
fn test_turn_left_90_timing() {
    let mut exec = CmdExec::new();
    let mut ctx = KinematicCtx::new(Pose::default());

    exec.enqueue(TurnByAngle::left_90(&Turn90Params::default()).into());
    let frames = run_to_idle(&mut exec, &mut ctx, DT);

    // One second of straight delay then 1.5 degrees per frame
    assert!(frames as f64 * DT >= 2.0 - 1e-9);
    assert!((ctx.heading() - FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn test_queue_runs_in_order() {
    let mut exec = CmdExec::new();
    let mut ctx = KinematicCtx::new(Pose::default());

    exec.enqueue(MoveForward::new(2.0, 4.0).into());
    exec.enqueue(TurnByAngle::new(-FRAC_PI_2, 0.1, 0.0, 1e-9, 1, 0.0).into());
    exec.enqueue(MoveForward::new(3.0, 4.0).into());
    run_to_idle(&mut exec, &mut ctx, DT);

    assert!((ctx.x() - 2.0).abs() < 1e-9);
    assert!((ctx.y() + 3.0).abs() < 1e-9);
    assert!((ctx.heading() + FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn test_move_forward_granularity() {
    let mut ends = Vec::new();

    for dt in [1.0 / 30.0, 1.0 / 60.0, 1.0 / 120.0, 0.37].iter() {
        let mut exec = CmdExec::new();
        let mut ctx = KinematicCtx::new(Pose::new(0.0, 0.0, 0.7));
        exec.enqueue(MoveForward::new(10.0, 4.0).into());
        run_to_idle(&mut exec, &mut ctx, *dt);
        ends.push(ctx.position());
    }

    for e in ends.iter() {
        assert!((e - ends[0]).norm() < 1e-9);
        assert!((e.norm() - 10.0).abs() < 1e-9);
    }
}

#[test]
fn test_sticky_hysteresis() {
    let mut p = StickyTurnPolicy::new(StickyPolicyParams::default());
    p.on_turn_committed(5.0, 5.0);

    // Noise inside the band never turns
    for i in 0..500 {
        let wobble = if i % 2 == 0 { 0.1 } else { -0.1 };
        assert_eq!(
            p.decide(10.0, 5.0 + wobble, 5.0 - wobble, DT),
            TurnDecision::Straight
        );
    }

    // A sustained drift below the baseline turns after k_stable calls
    let mut decisions = Vec::new();
    for _ in 0..StickyPolicyParams::default().k_stable {
        decisions.push(p.decide(10.0, 3.0, 7.0, DT));
    }
    assert!(decisions[..decisions.len() - 1]
        .iter()
        .all(|d| *d == TurnDecision::Straight));
    assert_eq!(decisions.last(), Some(&TurnDecision::TurnLeft));
}

#[test]
fn test_engine_stall_and_restart() {
    let params = VehicleParams {
        fuel_capacity: Some(0.5),
        ..Default::default()
    };
    let mut integrator = DynamicsIntegrator::from_params(&params);
    integrator.bus_mut().set_throttle01(1.0);
    let mut pose = Pose::default();

    let mut peak_speed: f64 = 0.0;
    let mut stalled_at = None;
    for i in 0..(120 * 5) {
        let report = integrator.step(1.0 / 120.0, &mut pose);
        peak_speed = peak_speed.max(report.speed_ms);

        if report.engine.stalled && stalled_at.is_none() {
            stalled_at = Some(i);
            assert_eq!(report.engine.torque_nm, 0.0);
        }
    }

    assert!(stalled_at.is_some());
    assert!(integrator.engine().is_stalled());
    assert!(pose.speed < peak_speed);
    assert!(pose.speed >= 0.0);

    assert!(integrator.engine_mut().refuel(1.0));
    assert!(!integrator.engine().is_stalled());
}

#[test]
fn test_friction_circle_holds() {
    for surface in [Surface::Dry, Surface::Wet].iter() {
        let mut integrator = DynamicsIntegrator::from_params(&VehicleParams::default());
        integrator.set_surface(*surface);
        integrator.bus_mut().set_throttle01(1.0);
        integrator.bus_mut().set_steer_deg(30.0);
        let mut pose = Pose::default();

        for _ in 0..(120 * 4) {
            integrator.step(1.0 / 120.0, &mut pose);

            for w in integrator.wheels() {
                let f = w.fx().hypot(w.fy());
                assert!(
                    f <= w.force_limit_n() + 1e-6,
                    "{} exceeds the limit {}",
                    f,
                    w.force_limit_n()
                );
            }
            assert!(pose.heading() > -PI && pose.heading() <= PI);
        }
    }
}

#[test]
fn test_drive_mgr_turns_at_t_junction() {
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

    let mut mgr = DriveMgr::default();
    mgr.init(DriveMgrInit { params, world }, None).unwrap();

    let mut entered = false;
    for _ in 0..(60 * 8) {
        let (_, status) = mgr.proc(&DT).unwrap();
        entered |= status.in_intersection;
        assert!(!status.emergency_brake);
    }

    let pose = mgr.pose();
    assert!(entered);
    assert!((pose.heading() - FRAC_PI_2).abs() < 1e-6);
    assert!(pose.y() > 5.0);
    assert!(pose.x() > 30.0 && pose.x() < 37.0);
}

#[test]
fn test_drive_mgr_lane_change_then_brake() {
    let world = RectWorld::new(vec![Rect::new(30.0, 1.0, 1.0, 2.0)], vec![]);

    let mut mgr = DriveMgr::default();
    mgr.init(
        DriveMgrInit {
            params: DriveMgrParams::default(),
            world,
        },
        None,
    )
    .unwrap();

    assert!(mgr.lane_change(true));
    while !mgr.is_idle() {
        mgr.proc(&DT).unwrap();
        assert!(mgr.time_s() < 5.0);
    }
    assert!((mgr.pose().y() - 2.0).abs() < 1e-9);

    // Cruise into the obstacle now sitting in the new lane
    while !mgr.is_braked() {
        mgr.proc(&DT).unwrap();
        assert!(mgr.time_s() < 20.0);
    }
    assert!(mgr.pose().x() < 30.0);

    mgr.reset_brake();
    assert!(!mgr.is_braked());
}
