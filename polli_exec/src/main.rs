//! Main rover-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Frame acquisition
//!         - Perception processing:
//!             - Flower classification
//!             - Lane estimation
//!             - Obstacle detection
//!         - Mission state machine step
//!         - Locomotion control processing
//!         - Actuation (wheel demands, pollination effector)
//!         - Termination predicate checks
//!
//! The loop is single-threaded and tick-driven: one iteration acquires one
//! frame, runs one full perception pass, one state evaluation and at most one
//! actuation command. A cycle without a frame is skipped after a short sleep
//! with no state change.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use polli_lib::{
    arm_client::PolliEffector,
    cam_client::{DirCamClient, FrameSource},
    data_store::DataStore,
    loco_ctrl,
    mech_client::{MechDemsResponse, MechDriver, SimMechClient, WheelDems},
    mission_mgr::{MissionMgr, TickInput},
    params::PolliExecParams,
    sim_client::{SimArmClient, SimCamClient, SimParams, SimWorld},
    vision::color_table::ColorTable,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Limit on the number of consecutive cycles without a frame before the
/// mission is aborted.
const MAX_CONSEC_NO_FRAME_LIMIT: u64 = 50;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Run mode, selecting the mission parameter profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Debug,
    Competition,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Mode::Debug),
            "competition" => Ok(Mode::Competition),
            other => Err(format!(
                "unknown mode {:?}, expected \"debug\" or \"competition\"",
                other
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments
#[derive(Debug, StructOpt)]
#[structopt(name = "polli_exec", about = "Pollination rover executable")]
struct CliArgs {
    /// Run mode: "debug" or "competition"
    #[structopt(long, default_value = "debug")]
    mode: Mode,

    /// Replay frames from this directory instead of the simulated camera
    #[structopt(long, parse(from_os_str))]
    frames: Option<PathBuf>,
}

/// End-of-mission report saved into the session.
#[derive(Debug, Serialize)]
struct MissionReport {
    mission_complete: bool,
    polli_count: u32,
    quota: u32,
    elapsed_s: f64,
    final_phase: String,
    num_cycles: u128,
    end_utc: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    let args = CliArgs::from_args();

    // Initialise session
    let session = Session::new("polli_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger. Competition runs keep the log quiet.
    let log_level = match args.mode {
        Mode::Debug => LevelFilter::Trace,
        Mode::Competition => LevelFilter::Info,
    };
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Pollination Rover Executable\n");
    info!("Run mode: {:?}", args.mode);
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: PolliExecParams =
        util::params::load("polli_exec.toml").wrap_err("Could not load exec params")?;

    let color_table =
        ColorTable::load("color_table.toml").wrap_err("Could not load the colour table")?;
    let colors = *color_table.bands(exec_params.lighting);

    info!(
        "Exec parameters loaded, lighting condition {:?}",
        exec_params.lighting
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.flower_detector
        .init("flower_detector.toml", &colors)
        .wrap_err("Failed to initialise FlowerDetector")?;
    info!("FlowerDetector init complete");

    ds.lane_follower
        .init("lane_follower.toml")
        .wrap_err("Failed to initialise LaneFollower")?;
    info!("LaneFollower init complete");

    ds.obstacle_detector
        .init("obstacle_detector.toml", &colors)
        .wrap_err("Failed to initialise ObstacleDetector")?;
    info!("ObstacleDetector init complete");

    ds.loco_ctrl
        .init("loco_ctrl.toml", &session)
        .wrap_err("Failed to initialise LocoCtrl")?;
    info!("LocoCtrl init complete");

    let mission_params_file = match args.mode {
        Mode::Debug => "mission_mgr.toml",
        Mode::Competition => "mission_mgr_competition.toml",
    };
    let mut mission_mgr = MissionMgr::init(mission_params_file, &colors, &session)
        .wrap_err("Failed to initialise MissionMgr")?;
    info!("MissionMgr init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE EQUIPMENT ----

    info!("Initialising equipment clients");

    let sim_params: SimParams =
        util::params::load("sim_client.toml").wrap_err("Could not load sim params")?;

    if sim_params.frame_width_px != exec_params.cam_width_px
        || sim_params.frame_height_px != exec_params.cam_height_px
    {
        warn!(
            "Sim frame size {}x{} differs from the configured camera size {}x{}",
            sim_params.frame_width_px,
            sim_params.frame_height_px,
            exec_params.cam_width_px,
            exec_params.cam_height_px
        );
    }

    let sim_world = SimWorld::new(sim_params);

    let mut cam_client: Box<dyn FrameSource> = match args.frames {
        Some(ref dir) => {
            let c = DirCamClient::new(dir).wrap_err("Failed to initialise DirCamClient")?;
            info!("DirCamClient initialised from {:?}", dir);
            Box::new(c)
        }
        None => {
            info!("SimCamClient initialised");
            Box::new(SimCamClient::new(Rc::clone(&sim_world)))
        }
    };

    let mut mech_client: Box<dyn MechDriver> = Box::new(SimMechClient::new());
    info!("SimMechClient initialised");

    let mut arm_client: Box<dyn PolliEffector> = Box::new(SimArmClient::new(sim_world));
    info!("SimArmClient initialised");

    // External abort signal, checked once per cycle
    let abort_flag = Arc::new(AtomicBool::new(false));

    info!("Equipment initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        let time_s = session::get_elapsed_seconds();

        // ---- TERMINATION & ABORT CHECKS ----

        if mission_mgr.is_mission_complete() {
            info!(
                "Mission complete: {}/{} pollinations",
                mission_mgr.persistent.polli_count, mission_mgr.params.quota
            );
            mech_client.send_demands(&WheelDems::default()).ok();
            break;
        }

        if mission_mgr.is_time_up(time_s) {
            warn!(
                "Time budget expired with {}/{} pollinations",
                mission_mgr.persistent.polli_count, mission_mgr.params.quota
            );
            mech_client.send_demands(&WheelDems::default()).ok();
            break;
        }

        if abort_flag.load(Ordering::Relaxed) {
            warn!("External abort requested, emergency stopping");
            mech_client.emergency_stop();
            break;
        }

        // ---- FRAME ACQUISITION ----

        let frame = match cam_client.acquire() {
            Some(f) => {
                ds.num_consec_no_frame = 0;
                f
            }
            None => {
                // Transient capture failure: skip this cycle with no state
                // change
                ds.num_consec_no_frame += 1;

                if ds.num_consec_no_frame > MAX_CONSEC_NO_FRAME_LIMIT {
                    error!(
                        "No frame for {} consecutive cycles, aborting mission",
                        ds.num_consec_no_frame
                    );
                    mech_client.emergency_stop();
                    break;
                }

                debug!("No frame this cycle, skipping");
                thread::sleep(Duration::from_secs_f64(CYCLE_PERIOD_S));
                continue;
            }
        };

        // ---- PERCEPTION PROCESSING ----

        ds.flowers = ds.flower_detector.detect(&frame);
        ds.lane_offset_px = ds.lane_follower.estimate(&frame);
        ds.obstacles = ds.obstacle_detector.detect(&frame);

        if !ds.obstacles.is_empty() && ds.is_1_hz_cycle {
            debug!("{} obstacle region(s) in view", ds.obstacles.len());
        }

        // ---- MISSION PROCESSING ----

        let step_output = mission_mgr.step(&TickInput {
            time_s,
            frame: &frame,
            flowers: &ds.flowers,
            lane_offset_px: ds.lane_offset_px,
            obstacles: &ds.obstacles,
            polli_result: ds.polli_result.take(),
        });

        ds.loco_ctrl_input = loco_ctrl::InputData {
            cmd: step_output.mnvr,
            time_s,
        };

        // The effector sequence is blocking; its result feeds the next cycle
        if let Some(ref req) = step_output.polli_req {
            match arm_client.pollinate(req) {
                Ok(ok) => ds.polli_result = Some(ok),
                Err(e) => {
                    error!("Pollination effector hard fault: {}", e);
                    mech_client.emergency_stop();
                    break;
                }
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // LocoCtrl processing
        match ds.loco_ctrl.proc(&ds.loco_ctrl_input) {
            Ok((output, report)) => {
                ds.loco_ctrl_output = output;
                ds.loco_ctrl_status_rpt = report;
            }
            Err(e) => {
                // A LocoCtrl error means a malformed command reached it; warn
                // and keep the previous demands
                warn!("Error during LocoCtrl processing: {}", e)
            }
        };

        // Send demands to mechanisms
        match mech_client.send_demands(&ds.loco_ctrl_output) {
            Ok(MechDemsResponse::DemsOk) => (),
            Ok(r) => warn!("Non-nominal response from the motor driver: {:?}", r),
            Err(e) => {
                error!("Motor driver hard fault: {}", e);
                mech_client.emergency_stop();
                break;
            }
        }

        // ---- TELEMETRY & ARCHIVES ----

        if let Err(e) = mission_mgr.write() {
            warn!("Could not write mission archives: {}", e);
        }
        if let Err(e) = ds.loco_ctrl.write() {
            warn!("Could not write LocoCtrl archives: {}", e);
        }

        if ds.is_1_hz_cycle {
            let tm = mission_mgr.get_tm();
            info!(
                "[{}] {}/{} pollinated, lane {:?}, {} candidate(s)",
                tm.phase, tm.polli_count, tm.quota, tm.lane_offset_px, tm.num_flower_candidates
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    let elapsed_s = session::get_elapsed_seconds();
    let report = MissionReport {
        mission_complete: mission_mgr.is_mission_complete(),
        polli_count: mission_mgr.persistent.polli_count,
        quota: mission_mgr.params.quota,
        elapsed_s,
        final_phase: mission_mgr.phase_name().to_string(),
        num_cycles: ds.num_cycles,
        end_utc: chrono::Utc::now().to_rfc3339(),
    };

    if let Err(e) = session.save("mission_report.json", &report) {
        warn!("Could not save the mission report: {}", e);
    }

    info!(
        "End of execution: {}/{} pollinations in {:.1} s",
        report.polli_count, report.quota, report.elapsed_s
    );

    Ok(())
}
