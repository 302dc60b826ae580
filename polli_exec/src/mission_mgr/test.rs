//! MissionMgr state machine tests

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::Point2;

use super::*;
use crate::loco_ctrl::MnvrType;
use crate::vision::color_table::{ColorBandSet, HsvBand};
use crate::vision::flower_detector::{self, FlowerDetector};
use crate::vision::{FlowerCandidate, FlowerType};

// ------------------------------------------------------------------------------------------------
// HELPERS
// ------------------------------------------------------------------------------------------------

/// Ground colour outside every band
const GROUND: [u8; 3] = [80, 160, 80];

/// Course yellow, inside the female band
const YELLOW: [u8; 3] = [255, 200, 0];

/// Marker white
const MARKER: [u8; 3] = [255, 255, 255];

fn colors() -> ColorBandSet {
    ColorBandSet {
        female: HsvBand {
            lower: [20, 100, 100],
            upper: [30, 255, 255],
        },
        male: HsvBand {
            lower: [0, 0, 200],
            upper: [179, 30, 255],
        },
        marker: HsvBand {
            lower: [0, 0, 200],
            upper: [179, 30, 255],
        },
        obstacle: HsvBand {
            lower: [0, 0, 0],
            upper: [179, 255, 30],
        },
    }
}

fn mgr(quota: u32) -> MissionMgr {
    let params = MissionMgrParams {
        quota,
        max_running_time_s: 600.0,
        ..Default::default()
    };
    MissionMgr::with_params(params, &colors())
}

fn ground_frame() -> RgbImage {
    RgbImage::from_pixel(640, 480, Rgb(GROUND))
}

fn female(x: f64, y: f64, area_px: u32) -> FlowerCandidate {
    FlowerCandidate {
        flower_type: FlowerType::Female,
        centroid_px: Point2::new(x, y),
        area_px,
        boundary_px: Vec::new(),
    }
}

/// Step the manager with the given inputs at the given time.
fn step(
    mgr: &mut MissionMgr,
    frame: &RgbImage,
    flowers: &[FlowerCandidate],
    lane_offset_px: Option<i32>,
    polli_result: Option<bool>,
    time_s: f64,
) -> StepOutput {
    mgr.step(&TickInput {
        time_s,
        frame,
        flowers,
        lane_offset_px,
        obstacles: &[],
        polli_result,
    })
}

fn mnvr_type(out: &StepOutput) -> Option<MnvrType> {
    out.mnvr.map(|m| m.mnvr_type)
}

/// Drive a fresh manager into FollowLane.
fn started_mgr(quota: u32) -> MissionMgr {
    let mut m = mgr(quota);
    let frame = ground_frame();
    let out = step(&mut m, &frame, &[], None, None, 0.0);
    assert_eq!(m.phase_name(), "FollowLane");
    assert_eq!(mnvr_type(&out), Some(MnvrType::Forward));
    m
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[test]
fn test_start_commands_cruise_and_stamps_clock() {
    let mut m = mgr(1);
    let frame = ground_frame();

    assert!(m.persistent.mission_start_time_s.is_none());

    let out = step(&mut m, &frame, &[], None, None, 12.5);

    assert_eq!(m.phase_name(), "FollowLane");
    assert_eq!(m.persistent.mission_start_time_s, Some(12.5));
    let cmd = out.mnvr.unwrap();
    assert_eq!(cmd.mnvr_type, MnvrType::Forward);
    assert_eq!(cmd.speed_pct, Some(m.params.cruise_speed_pct));
}

#[test]
fn test_follow_lane_steers_against_offset() {
    let mut m = started_mgr(1);
    let frame = ground_frame();

    let out = step(&mut m, &frame, &[], Some(40), None, 0.1);

    let cmd = out.mnvr.unwrap();
    assert_eq!(cmd.mnvr_type, MnvrType::Steer);
    assert_eq!(cmd.offset_px, Some(40.0));
    assert_eq!(m.persistent.lane_lost_streak, 0);
}

#[test]
fn test_lane_lost_streak_triggers_one_recovery_rotate() {
    let mut m = started_mgr(1);
    let frame = ground_frame();

    // Nine consecutive no-lane cycles: counting only, no commands
    for i in 0..9 {
        let out = step(&mut m, &frame, &[], None, None, 0.1 * (i + 1) as f64);
        assert!(out.mnvr.is_none());
    }
    assert_eq!(m.persistent.lane_lost_streak, 9);

    // The tenth issues exactly one rotate and resets the streak
    let out = step(&mut m, &frame, &[], None, None, 1.0);
    assert_eq!(mnvr_type(&out), Some(MnvrType::Rotate));
    assert_eq!(m.persistent.lane_lost_streak, 0);
    assert_eq!(m.phase_name(), "FollowLane");

    // The streak restarts cleanly afterwards
    let out = step(&mut m, &frame, &[], None, None, 1.1);
    assert!(out.mnvr.is_none());
    assert_eq!(m.persistent.lane_lost_streak, 1);
}

#[test]
fn test_scenario_a_classifier_to_phase_change() {
    // A synthetic frame with one well-formed target blob centred in the
    // image, pushed through the real classifier
    let mut frame = ground_frame();
    for y in 218..263 {
        for x in 298..343 {
            frame.put_pixel(x, y, Rgb(YELLOW));
        }
    }

    let detector = FlowerDetector::with_params(flower_detector::Params::default(), &colors());
    let candidates = detector.detect(&frame);
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].area_px >= 500 && candidates[0].area_px <= 5000);

    let mut m = started_mgr(1);
    let out = step(&mut m, &frame, &candidates, Some(0), None, 0.1);

    // FollowLane -> DetectFlower on the same tick, at approach speed
    assert_eq!(m.phase_name(), "DetectFlower");
    let cmd = out.mnvr.unwrap();
    assert_eq!(cmd.mnvr_type, MnvrType::Forward);
    assert_eq!(cmd.speed_pct, Some(m.params.approach_speed_pct));
    assert!(m.persistent.last_locked_target.is_some());
}

#[test]
fn test_detect_without_target_resumes_cruise() {
    let mut m = started_mgr(1);
    let frame = ground_frame();
    let flowers = vec![female(320.0, 240.0, 2000)];

    step(&mut m, &frame, &flowers, Some(0), None, 0.1);
    assert_eq!(m.phase_name(), "DetectFlower");

    // Candidates gone: back to the lane, lock cleared by the dispatcher
    let out = step(&mut m, &frame, &[], Some(0), None, 0.2);
    assert_eq!(m.phase_name(), "FollowLane");
    let cmd = out.mnvr.unwrap();
    assert_eq!(cmd.mnvr_type, MnvrType::Forward);
    assert_eq!(cmd.speed_pct, Some(m.params.cruise_speed_pct));
    assert!(m.persistent.last_locked_target.is_none());
}

#[test]
fn test_detect_locks_best_and_approaches() {
    let mut m = started_mgr(1);
    let frame = ground_frame();
    let flowers = vec![female(500.0, 240.0, 2000), female(330.0, 240.0, 2000)];

    step(&mut m, &frame, &flowers, Some(0), None, 0.1);
    assert_eq!(m.phase_name(), "DetectFlower");

    step(&mut m, &frame, &flowers, Some(0), None, 0.2);
    assert_eq!(m.phase_name(), "ApproachFlower");

    // The more central candidate wins the lock
    let lock = m.persistent.last_locked_target.as_ref().unwrap();
    assert_eq!(lock.centroid_px.x, 330.0);
}

#[test]
fn test_approach_turns_then_drives_then_arrives() {
    let mut m = started_mgr(1);
    let frame = ground_frame();

    // Lock a target well left of centre
    let far_left = vec![female(100.0, 240.0, 2000)];
    step(&mut m, &frame, &far_left, Some(0), None, 0.1);
    step(&mut m, &frame, &far_left, Some(0), None, 0.2);
    assert_eq!(m.phase_name(), "ApproachFlower");

    let out = step(&mut m, &frame, &far_left, None, None, 0.3);
    assert_eq!(mnvr_type(&out), Some(MnvrType::TurnLeft));

    // Laterally centred now: drive forward. The fresh candidate is outside
    // the refresh gate of the old lock, so jump the lock directly
    m.persistent.last_locked_target = Some(female(320.0, 240.0, 2000));
    let centred = vec![female(320.0, 200.0, 2000)];
    let out = step(&mut m, &frame, &centred, None, None, 0.4);
    assert_eq!(mnvr_type(&out), Some(MnvrType::Forward));

    // Target rises in the frame as the rover closes in; once past the
    // arrival threshold: stop and pollinate
    let closer = vec![female(320.0, 160.0, 2000)];
    let out = step(&mut m, &frame, &closer, None, None, 0.5);
    assert_eq!(mnvr_type(&out), Some(MnvrType::Forward));

    let arrived = vec![female(320.0, 130.0, 2000)];
    let out = step(&mut m, &frame, &arrived, None, None, 0.6);
    assert_eq!(mnvr_type(&out), Some(MnvrType::Stop));
    assert_eq!(m.phase_name(), "Pollinate");
}

#[test]
fn test_approach_falls_back_when_target_vanishes() {
    let mut m = started_mgr(1);
    let frame = ground_frame();
    let flowers = vec![female(320.0, 240.0, 2000)];

    step(&mut m, &frame, &flowers, Some(0), None, 0.1);
    step(&mut m, &frame, &flowers, Some(0), None, 0.2);
    assert_eq!(m.phase_name(), "ApproachFlower");

    // No candidate near the lock for target_lost_limit + 1 cycles
    for i in 0..=m.params.target_lost_limit {
        assert_eq!(m.phase_name(), "ApproachFlower");
        step(&mut m, &frame, &[], None, None, 0.3 + 0.1 * i as f64);
    }

    assert_eq!(m.phase_name(), "DetectFlower");
}

/// Put the manager into Pollinate with a lock at the frame centre.
fn pollinating_mgr(quota: u32) -> MissionMgr {
    let mut m = started_mgr(quota);
    m.persistent.last_locked_target = Some(female(320.0, 240.0, 2000));
    m.phase = Phase::Pollinate(Pollinate::new());
    m
}

/// A frame carrying the marker signature around the frame centre.
fn marked_frame() -> RgbImage {
    let mut frame = ground_frame();
    for y in 220..260 {
        for x in 300..340 {
            frame.put_pixel(x, y, Rgb(MARKER));
        }
    }
    frame
}

#[test]
fn test_scenario_b_success_reaching_quota_finishes() {
    let mut m = pollinating_mgr(1);
    let frame = ground_frame();

    // First beat: the effector request goes out, no motion commanded
    let out = step(&mut m, &frame, &[], None, None, 1.0);
    assert!(out.polli_req.is_some());
    assert!(out.mnvr.is_none());
    assert_eq!(m.phase_name(), "Pollinate");

    // Second beat: effector ok and marker visible -> confirmed, quota
    // reached, FINISH on this same tick with motion stopped
    let marked = marked_frame();
    let out = step(&mut m, &marked, &[], None, Some(true), 1.1);

    assert_eq!(m.persistent.polli_count, 1);
    assert_eq!(m.phase_name(), "Finish");
    assert_eq!(mnvr_type(&out), Some(MnvrType::Stop));
    assert!(m.is_mission_complete());
    assert!(m.persistent.last_locked_target.is_none());
}

#[test]
fn test_success_under_quota_returns_to_lane() {
    let mut m = pollinating_mgr(2);
    let frame = ground_frame();

    step(&mut m, &frame, &[], None, None, 1.0);
    let marked = marked_frame();
    let out = step(&mut m, &marked, &[], None, Some(true), 1.1);

    assert_eq!(m.persistent.polli_count, 1);
    assert!(!m.is_mission_complete());
    assert_eq!(m.phase_name(), "ReturnLane");

    // Success under quota backs away from the flower
    let cmd = out.mnvr.unwrap();
    assert_eq!(cmd.mnvr_type, MnvrType::Backward);
    assert!(cmd.duration_s.is_some());
}

#[test]
fn test_effector_failure_retries_detection() {
    let mut m = pollinating_mgr(1);
    let frame = ground_frame();

    step(&mut m, &frame, &[], None, None, 1.0);
    let out = step(&mut m, &frame, &[], None, Some(false), 1.1);

    assert_eq!(m.persistent.polli_count, 0);
    assert_eq!(m.persistent.polli_attempts, 1);
    assert_eq!(m.phase_name(), "DetectFlower");
    assert!(out.mnvr.is_none());
}

#[test]
fn test_unverified_actuation_counts_as_failure() {
    let mut m = pollinating_mgr(1);
    let frame = ground_frame();

    step(&mut m, &frame, &[], None, None, 1.0);

    // Effector claims success but the frame carries no marker
    step(&mut m, &frame, &[], None, Some(true), 1.1);

    assert_eq!(m.persistent.polli_count, 0);
    assert_eq!(m.persistent.polli_attempts, 1);
    assert_eq!(m.phase_name(), "DetectFlower");
}

#[test]
fn test_retry_cap_abandons_flower() {
    let mut m = pollinating_mgr(1);
    let frame = ground_frame();
    m.persistent.polli_attempts = m.params.polli_retry_limit - 1;

    step(&mut m, &frame, &[], None, None, 1.0);
    let out = step(&mut m, &frame, &[], None, Some(false), 1.1);

    // The bounded retry gives up: back to the lane, counter reset
    assert_eq!(m.phase_name(), "ReturnLane");
    assert_eq!(m.persistent.polli_attempts, 0);
    assert_eq!(mnvr_type(&out), Some(MnvrType::Backward));
    assert!(m.persistent.last_locked_target.is_none());
}

#[test]
fn test_return_lane_sequence() {
    let mut m = started_mgr(2);
    m.phase = Phase::ReturnLane(ReturnLane::new());
    let frame = ground_frame();

    // Backward move still running
    let out = step(&mut m, &frame, &[], None, None, 10.0);
    assert!(out.mnvr.is_none());

    // Backward done: one timed rotation goes out
    let t_backward_done = 10.0 + m.params.backward_duration_s;
    let out = step(&mut m, &frame, &[], None, None, t_backward_done);
    assert_eq!(mnvr_type(&out), Some(MnvrType::Rotate));
    assert_eq!(m.phase_name(), "ReturnLane");

    // Rotation still running
    let out = step(&mut m, &frame, &[], None, None, 11.5);
    assert!(out.mnvr.is_none());

    // Rotation done: cruise resumes on the lane
    let t_done = 10.0 + m.params.backward_duration_s + m.params.return_rotate_duration_s;
    let out = step(&mut m, &frame, &[], None, None, t_done);
    assert_eq!(m.phase_name(), "FollowLane");
    let cmd = out.mnvr.unwrap();
    assert_eq!(cmd.mnvr_type, MnvrType::Forward);
    assert_eq!(cmd.speed_pct, Some(m.params.cruise_speed_pct));
}

#[test]
fn test_scenario_c_time_budget() {
    let mut m = mgr(1);
    m.params.max_running_time_s = 5.0;
    let frame = ground_frame();

    // Not started yet: no budget running
    assert!(!m.is_time_up(100.0));

    // Mission starts at t = 0
    step(&mut m, &frame, &[], None, None, 0.0);

    assert!(!m.is_time_up(5.0));
    assert!(m.is_time_up(6.0));

    // Independent of phase
    m.phase = Phase::Finish;
    assert!(m.is_time_up(6.0));
}

#[test]
fn test_finish_is_terminal() {
    let mut m = mgr(1);
    m.phase = Phase::Finish;
    let frame = ground_frame();

    for i in 0..3 {
        let out = step(&mut m, &frame, &[], Some(0), None, i as f64);
        assert_eq!(m.phase_name(), "Finish");
        assert_eq!(mnvr_type(&out), Some(MnvrType::Stop));
    }
}

#[test]
fn test_missing_lock_fails_safe() {
    let mut m = started_mgr(1);
    m.phase = Phase::ApproachFlower(ApproachFlower::new());
    m.persistent.last_locked_target = None;
    let frame = ground_frame();

    // The broken invariant is absorbed: one stop command and a fail-safe
    // recovery to FollowLane, never a crash
    let out = step(&mut m, &frame, &[], None, None, 0.1);
    assert_eq!(m.phase_name(), "FollowLane");
    assert_eq!(mnvr_type(&out), Some(MnvrType::Stop));
}

#[test]
fn test_tm_reflects_state() {
    let mut m = started_mgr(3);
    let frame = ground_frame();
    let flowers = vec![female(320.0, 240.0, 2000)];

    step(&mut m, &frame, &flowers, Some(15), None, 0.5);

    let tm = m.get_tm();
    assert_eq!(tm.phase, "DetectFlower");
    assert_eq!(tm.quota, 3);
    assert_eq!(tm.lane_offset_px, Some(15));
    assert_eq!(tm.num_flower_candidates, 1);
    assert_eq!(tm.target_x_px, Some(320.0));
    assert!(!tm.mission_complete);
}
