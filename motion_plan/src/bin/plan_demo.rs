//! # Planner demo
//!
//! Runs the planning pipeline once over a demonstration field and saves the
//! report and debug geometry into the session directory. Useful for eyeball
//! checks of parameter changes without a full robot in the loop.
//!
//! Requires the software root environment variable to be set so the
//! parameter file and session directory can be found.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Report};
use log::info;
use nalgebra::{Point2, Vector2};

use motion_plan::{
    FieldBounds, MotionCommand, MotionConstraints, Obstacle, PathTargetPlanner, PlanRequest,
    PlannerParams, Pose, RobotInstant, Twist,
};
use util::logger::{logger_init, LevelFilter};
use util::session::{self, Session};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("plan_demo", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Planner demo");
    info!("Session directory: {:?}\n", session.session_root);

    // Load the planner parameters
    let params: PlannerParams =
        util::params::load("motion_plan.toml").wrap_err("Failed to load planner parameters")?;

    // Division-B sized field
    let bounds = FieldBounds {
        x_min_m: -4.5,
        x_max_m: 4.5,
        y_min_m: -3.0,
        y_max_m: 3.0,
    };

    let mut planner = PathTargetPlanner::new(params, bounds);

    // A wall of opponents between the robot and the far corner
    let obstacles: Vec<Obstacle> = vec![(-0.5, -1.0), (0.0, 0.0), (0.5, 1.0), (1.5, 2.0)]
        .into_iter()
        .map(|(x, y)| Obstacle::Circle {
            centre_m: Point2::new(x, y),
            radius_m: 0.18,
        })
        .collect();

    let now_s = session::get_elapsed_seconds();

    let request = PlanRequest {
        start: RobotInstant::new(Pose::new(Point2::new(-3.5, -2.0), 0.0), Twist::zero(), now_s),
        command: MotionCommand::PathTarget {
            goal: Pose::new(Point2::new(3.5, 2.0), 0.0),
            goal_velocity_ms: Vector2::zeros(),
        },
        constraints: MotionConstraints {
            max_speed_ms: 3.0,
            max_accel_mss: 2.5,
            max_ang_speed_rads: 6.0,
            max_ang_accel_radss: 12.0,
            max_lat_accel_mss: 2.0,
        },
        obstacles,
        prev_trajectory: None,
        now_s,
        with_debug: true,
    };

    let outcome = planner.plan(request).wrap_err("Planning call failed")?;

    info!(
        "Planned in {:?} mode: {} instants over {:.3} s ({} RRT iterations, {:.3} m path)",
        outcome.report.decision,
        outcome.trajectory.num_instants(),
        outcome.report.duration_s,
        outcome.report.rrt_iterations,
        outcome.report.path_length_m
    );

    // Save the products for offline inspection
    session.save("plan_demo/report.json", outcome.report);
    session.save("plan_demo/trajectory.json", outcome.trajectory);
    if let Some(debug) = outcome.debug {
        session.save("plan_demo/debug.json", debug);
    }

    session.exit();

    Ok(())
}
