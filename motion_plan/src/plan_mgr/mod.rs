//! # Plan manager module
//!
//! The planning orchestrator. Each control cycle the manager takes a
//! [`PlanRequest`], decides how much of the previous trajectory to keep
//! (see [`replan`]), and runs the pipeline (RRT search, shortcut smoothing,
//! Bezier curve fitting, velocity profiling, angle planning) over whatever
//! remains to be planned.
//!
//! A planning call is synchronous and single threaded. All inputs arrive by
//! value; the only cross-cycle state the manager holds is its random
//! generator and the better-check timer. The previous trajectory is owned
//! by the caller and supplied with each request.
//!
//! Planning failure (search budget exhausted, or an infeasible curve fit)
//! is reported as an empty trajectory in the outcome, never as a panic; the
//! caller is expected to command a stop and retry next cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod replan;
pub use replan::ReplanState;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::bezier::{BezierPath, CurveParams};
use crate::cmd::MotionCommand;
use crate::constraints::{ConstraintError, MotionConstraints};
use crate::profile;
use crate::rrt::{RrtParams, RrtPlanner};
use crate::smooth::{path_length_m, PathSmoother, SmoothParams};
use crate::state::{Pose, RobotInstant};
use crate::state_space::{FieldBounds, Obstacle, StateSpace, StateSpaceError};
use crate::traj::Trajectory;
use crate::angle_plan;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The planning orchestrator. One instance serves one robot, living as long
/// as the control loop does.
pub struct PathTargetPlanner {
    params: PlannerParams,
    field_bounds: FieldBounds,
    rrt: RrtPlanner,
    smoother: PathSmoother,
    rng: StdRng,

    /// Time the last better-check plan was attempted (or the last plan
    /// adopted), driving the periodic [`ReplanState::CheckBetter`] cycle.
    last_check_better_s: Option<f64>,
}

/// Parameters for the full planning pipeline, loaded from one TOML file
/// with a section per stage.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerParams {
    pub rrt: RrtParams,
    pub smooth: SmoothParams,
    pub curve: CurveParams,
    pub replan: ReplanParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplanParams {
    /// How far ahead of the robot the splice point of a partial replan is
    /// placed. Trajectories with less remaining duration than this are
    /// replanned in full.
    pub partial_replan_lead_time_s: f64,

    /// How often a fresh plan is attempted while the current one remains
    /// valid, to avoid settling permanently on a stale path.
    pub check_better_interval_s: f64,

    /// Start and goal positions closer than this are treated as coincident,
    /// short-circuiting to a single-instant trajectory.
    pub position_tolerance_m: f64,
}

/// A single planning request, built and consumed once per control cycle.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// The robot's current state
    pub start: RobotInstant,

    /// What to plan
    pub command: MotionCommand,

    /// Kinematic limits for this request
    pub constraints: MotionConstraints,

    /// Snapshot of the obstacle set for this cycle
    pub obstacles: Vec<Obstacle>,

    /// The trajectory returned by the previous cycle, if any
    pub prev_trajectory: Option<Trajectory>,

    /// The current time on the caller's clock
    pub now_s: f64,

    /// Collect debug geometry in the outcome
    pub with_debug: bool,
}

/// The product of one planning call.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The planned trajectory. Empty signals planning failure and the
    /// caller must fall back (e.g. command a stop).
    pub trajectory: Trajectory,

    /// Summary of the call, suitable for saving via the session
    pub report: PlanReport,

    /// Debug geometry, present when requested
    pub debug: Option<PlanDebug>,
}

/// A serialisable summary of one planning call.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// The replanning decision taken this cycle
    pub decision: ReplanState,

    /// Iterations used by the RRT search (zero for reused plans and direct
    /// connections)
    pub rrt_iterations: usize,

    /// Length of the smoothed waypoint path, in meters
    pub path_length_m: f64,

    /// Duration of the returned trajectory, in seconds
    pub duration_s: f64,
}

/// Geometry produced while planning, returned for external visualisation.
/// The planning core itself never draws.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDebug {
    /// Raw waypoints out of the RRT search
    pub rrt_waypoints_m: Vec<Point2<f64>>,

    /// Waypoints after shortcut smoothing
    pub smoothed_waypoints_m: Vec<Point2<f64>>,

    /// Sampled positions along the fitted curve
    pub curve_positions_m: Vec<Point2<f64>>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors which reject a planning request before any search work is done.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid motion constraints: {0}")]
    InvalidConstraints(#[from] ConstraintError),

    #[error("Could not build the state space: {0}")]
    StateSpace(#[from] StateSpaceError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathTargetPlanner {
    /// Create a planner for a field with the given bounds.
    pub fn new(params: PlannerParams, field_bounds: FieldBounds) -> Self {
        Self::with_rng(params, field_bounds, StdRng::from_entropy())
    }

    /// Create a planner with a seeded random generator, for deterministic
    /// tests and benchmarks.
    pub fn with_seed(params: PlannerParams, field_bounds: FieldBounds, seed: u64) -> Self {
        Self::with_rng(params, field_bounds, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: PlannerParams, field_bounds: FieldBounds, rng: StdRng) -> Self {
        let rrt = RrtPlanner::new(params.rrt.clone());
        let smoother = PathSmoother::new(params.smooth.clone());

        Self {
            params,
            field_bounds,
            rrt,
            smoother,
            rng,
            last_check_better_s: None,
        }
    }

    /// Run one planning cycle.
    ///
    /// Malformed constraints and obstacles are rejected here, before any
    /// search work. All later failures are soft and produce an empty
    /// trajectory in the outcome.
    pub fn plan(&mut self, request: PlanRequest) -> Result<PlanOutcome, PlanError> {
        request.constraints.validate()?;

        let PlanRequest {
            start,
            command,
            constraints,
            obstacles,
            prev_trajectory,
            now_s,
            with_debug,
        } = request;

        // Dispatch on the command kind
        let (goal, goal_velocity_ms) = match command {
            MotionCommand::PathTarget {
                goal,
                goal_velocity_ms,
            } => (goal, goal_velocity_ms),

            MotionCommand::Halt => {
                debug!("Halt commanded, dropping previous trajectory");
                let instant = RobotInstant::stationary(start.pose, now_s);
                return Ok(single_instant_outcome(instant, ReplanState::FullReplan));
            }
        };

        let space = StateSpace::new(self.field_bounds, obstacles)?;

        // With a previous trajectory the robot is assumed to be tracking it,
        // so planning continues from the trajectory's state at the current
        // time rather than from the (noisier) measured state
        let start_instant = prev_trajectory
            .as_ref()
            .filter(|t| !t.is_empty())
            .and_then(|t| t.evaluate(now_s))
            .unwrap_or(RobotInstant {
                time_s: now_s,
                ..start
            });

        // Degenerate input: already at the goal. Handled before any search.
        let goal_offset_m = (start_instant.pose.position_m - goal.position_m).norm();
        if goal_offset_m <= self.params.replan.position_tolerance_m {
            debug!("Start position is at the goal, planning a hold");
            let instant = RobotInstant::stationary(
                Pose::new(start_instant.pose.position_m, start_instant.pose.heading_rad),
                now_s,
            );
            return Ok(single_instant_outcome(instant, ReplanState::FullReplan));
        }

        let check_better_due = self
            .last_check_better_s
            .map(|t| now_s - t >= self.params.replan.check_better_interval_s)
            .unwrap_or(false);

        // The categorical replan decision, taken once before any search
        let decision = replan::decide(
            prev_trajectory.as_ref(),
            &space,
            now_s,
            self.params.replan.partial_replan_lead_time_s,
            check_better_due,
        );

        debug!("Replan decision: {:?}", decision);

        let outcome = match decision {
            ReplanState::Reuse => {
                // Consumes and hands back the caller's trajectory untouched
                let trajectory = prev_trajectory.unwrap_or_else(Trajectory::empty);
                let duration_s = trajectory.end_time_s().map(|t| t - now_s).unwrap_or(0.0);

                PlanOutcome {
                    trajectory,
                    report: PlanReport {
                        decision,
                        rrt_iterations: 0,
                        path_length_m: 0.0,
                        duration_s,
                    },
                    debug: None,
                }
            }

            ReplanState::FullReplan => {
                let outcome = self.pipeline(
                    &start_instant,
                    &goal,
                    goal_velocity_ms,
                    &constraints,
                    &space,
                    now_s,
                    with_debug,
                );
                self.last_check_better_s = Some(now_s);
                outcome
            }

            ReplanState::PartialReplan => {
                let prev = prev_trajectory.unwrap_or_else(Trajectory::empty);
                let outcome = self.partial_replan(
                    &prev,
                    &start_instant,
                    &goal,
                    goal_velocity_ms,
                    &constraints,
                    &space,
                    now_s,
                    with_debug,
                );
                self.last_check_better_s = Some(now_s);
                outcome
            }

            ReplanState::CheckBetter => {
                let prev = prev_trajectory.unwrap_or_else(Trajectory::empty);
                self.last_check_better_s = Some(now_s);

                let candidate = self.pipeline(
                    &start_instant,
                    &goal,
                    goal_velocity_ms,
                    &constraints,
                    &space,
                    now_s,
                    with_debug,
                );

                let candidate_end_s = candidate.trajectory.end_time_s();
                let prev_end_s = prev.end_time_s();

                // Adopt the fresh plan only if it is strictly quicker
                match (candidate_end_s, prev_end_s) {
                    (Some(cand), Some(old)) if cand < old => {
                        info!(
                            "Better-check adopted a fresh plan ({:.3} s quicker)",
                            old - cand
                        );
                        let mut outcome = candidate;
                        outcome.report.decision = ReplanState::CheckBetter;
                        outcome
                    }
                    _ => PlanOutcome {
                        report: PlanReport {
                            decision: ReplanState::CheckBetter,
                            rrt_iterations: candidate.report.rrt_iterations,
                            path_length_m: 0.0,
                            duration_s: prev.end_time_s().map(|t| t - now_s).unwrap_or(0.0),
                        },
                        trajectory: prev,
                        debug: None,
                    },
                }
            }
        };

        if outcome.trajectory.is_empty() {
            warn!("Planning failed, returning empty trajectory");
        }

        Ok(outcome)
    }

    /// Keep the imminent prefix of the previous trajectory and replan from
    /// the splice point onwards.
    #[allow(clippy::too_many_arguments)]
    fn partial_replan(
        &mut self,
        prev: &Trajectory,
        start_instant: &RobotInstant,
        goal: &Pose,
        goal_velocity_ms: Vector2<f64>,
        constraints: &MotionConstraints,
        space: &StateSpace,
        now_s: f64,
        with_debug: bool,
    ) -> PlanOutcome {
        let splice_s = now_s + self.params.replan.partial_replan_lead_time_s;
        let prefix = prev.section(now_s, splice_s);

        let splice_instant = match prefix.last() {
            Some(i) => *i,
            None => {
                // Nothing usable to keep, plan in full
                let mut outcome = self.pipeline(
                    start_instant,
                    goal,
                    goal_velocity_ms,
                    constraints,
                    space,
                    now_s,
                    with_debug,
                );
                outcome.report.decision = ReplanState::FullReplan;
                return outcome;
            }
        };

        let tail = self.pipeline(
            &splice_instant,
            goal,
            goal_velocity_ms,
            constraints,
            space,
            splice_instant.time_s,
            with_debug,
        );

        if tail.trajectory.is_empty() {
            // The remainder could not be replanned, fall back to a full
            // replan from the current state
            let mut outcome = self.pipeline(
                start_instant,
                goal,
                goal_velocity_ms,
                constraints,
                space,
                now_s,
                with_debug,
            );
            outcome.report.decision = ReplanState::FullReplan;
            return outcome;
        }

        // Stitch the prefix and the freshly planned tail together. The tail
        // starts at the splice instant, which the prefix already holds.
        let mut instants = prefix.instants().to_vec();
        for instant in tail.trajectory.instants() {
            if instant.time_s > splice_instant.time_s {
                instants.push(*instant);
            }
        }

        let trajectory = match Trajectory::new(instants) {
            Ok(t) => t,
            Err(e) => {
                warn!("Could not stitch partial replan: {}", e);
                Trajectory::empty()
            }
        };

        PlanOutcome {
            report: PlanReport {
                decision: ReplanState::PartialReplan,
                duration_s: trajectory.duration_s(),
                ..tail.report
            },
            trajectory,
            debug: tail.debug,
        }
    }

    /// The full planning pipeline: RRT search, shortcut smoothing, curve
    /// fit, velocity profile, angle plan.
    #[allow(clippy::too_many_arguments)]
    fn pipeline(
        &mut self,
        start_instant: &RobotInstant,
        goal: &Pose,
        goal_velocity_ms: Vector2<f64>,
        constraints: &MotionConstraints,
        space: &StateSpace,
        start_time_s: f64,
        with_debug: bool,
    ) -> PlanOutcome {
        let failure = |rrt_iterations: usize| PlanOutcome {
            trajectory: Trajectory::empty(),
            report: PlanReport {
                decision: ReplanState::FullReplan,
                rrt_iterations,
                path_length_m: 0.0,
                duration_s: 0.0,
            },
            debug: None,
        };

        // ---- SEARCH ----

        let rrt_result = match self.rrt.plan(
            &mut self.rng,
            space,
            start_instant.pose.position_m,
            goal.position_m,
        ) {
            Some(r) => r,
            None => return failure(self.params.rrt.max_iterations),
        };

        // ---- SMOOTHING ----

        let smoothed = self.smoother.smooth(space, &rrt_result.waypoints_m);

        // ---- CURVE FIT ----

        let curve = match BezierPath::fit(
            &smoothed,
            start_instant.twist.linear_ms,
            goal_velocity_ms,
            constraints.max_curv_m(),
            &self.params.curve,
        ) {
            Ok(c) => c,
            Err(e) => {
                warn!("Curve fit failed: {}", e);
                return failure(rrt_result.iterations);
            }
        };

        let samples = curve.sample(self.params.curve.samples_per_segment);

        // ---- VELOCITY PROFILE ----

        let mut instants = match profile::profile(
            &samples,
            start_instant.twist.speed_ms(),
            goal_velocity_ms.norm(),
            constraints,
            start_time_s,
        ) {
            Ok(i) => i,
            Err(e) => {
                warn!("Velocity profiling failed: {}", e);
                return failure(rrt_result.iterations);
            }
        };

        // ---- ANGLE PLAN ----

        angle_plan::plan_angles(&mut instants, start_instant, constraints);

        let trajectory = match Trajectory::new(instants) {
            Ok(t) => t,
            Err(e) => {
                warn!("Profiled instants were not monotonic: {}", e);
                return failure(rrt_result.iterations);
            }
        };

        let debug = if with_debug {
            Some(PlanDebug {
                rrt_waypoints_m: rrt_result.waypoints_m.clone(),
                smoothed_waypoints_m: smoothed.clone(),
                curve_positions_m: samples.iter().map(|s| s.position_m).collect(),
            })
        } else {
            None
        };

        PlanOutcome {
            report: PlanReport {
                decision: ReplanState::FullReplan,
                rrt_iterations: rrt_result.iterations,
                path_length_m: path_length_m(&smoothed),
                duration_s: trajectory.duration_s(),
            },
            trajectory,
            debug,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap a single instant into a complete outcome.
fn single_instant_outcome(instant: RobotInstant, decision: ReplanState) -> PlanOutcome {
    PlanOutcome {
        trajectory: Trajectory::single(instant),
        report: PlanReport {
            decision,
            rrt_iterations: 0,
            path_length_m: 0.0,
            duration_s: 0.0,
        },
        debug: None,
    }
}
