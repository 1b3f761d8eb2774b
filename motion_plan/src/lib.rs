//! # Motion planning library
//!
//! The motion-planning core of the Striker soccer robot software. Given the
//! robot's current state, a goal pose and velocity, an obstacle snapshot and
//! a set of kinematic limits, the planner produces a collision-free,
//! kinematically feasible, time-parameterised trajectory, recomputed every
//! control cycle as the world changes.
//!
//! The pipeline runs strictly downward through these modules on each call:
//! state space construction, RRT search, shortcut smoothing, Bezier curve
//! fitting, velocity profiling and angle planning, orchestrated by the plan
//! manager which also decides how much of the previous cycle's trajectory
//! to keep.
//!
//! Transport of the resulting commands to the robot, obstacle perception
//! and parameter storage live elsewhere; this crate consumes them as plain
//! data.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Robot state types - poses, twists, and timestamped instants
pub mod state;

/// Motion command types accepted by the planner entry point
pub mod cmd;

/// Kinematic limits supplied with each plan request
pub mod constraints;

/// State space module - collision/validity oracle over field and obstacles
pub mod state_space;

/// RRT module - goal-biased sampling-based path search
pub mod rrt;

/// Smoothing module - shortcut smoothing of raw search paths
pub mod smooth;

/// Bezier module - curve fitting with velocity boundary conditions
pub mod bezier;

/// Profile module - time-optimal velocity profiling along the curve
pub mod profile;

/// Angle planning module - heading profiles over planned trajectories
pub mod angle_plan;

/// Trajectory module - the time-indexed planning output
pub mod traj;

/// Plan manager module - per-cycle orchestration and replan decisions
pub mod plan_mgr;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use cmd::MotionCommand;
pub use constraints::MotionConstraints;
pub use plan_mgr::{
    PathTargetPlanner, PlanError, PlanOutcome, PlanRequest, PlannerParams, ReplanState,
};
pub use state::{Pose, RobotInstant, Twist};
pub use state_space::{FieldBounds, Obstacle, StateSpace};
pub use traj::Trajectory;
