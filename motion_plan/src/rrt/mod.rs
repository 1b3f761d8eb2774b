//! # RRT path search module
//!
//! Goal-biased Rapidly-exploring Random Tree search over the field bounds.
//! Each iteration samples a point (the goal itself with a fixed
//! probability), steers a bounded-length step from the nearest tree node
//! towards it, and keeps the new node if the stepped segment is collision
//! free. The search succeeds when a node lands within the goal tolerance
//! and the closing segment to the goal is clear.
//!
//! The tree is an arena of nodes indexed by integer id, each holding a
//! parent index; the whole arena is dropped once the waypoint path has been
//! extracted. The search is stateless across planning calls.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use log::{debug, trace, warn};
use nalgebra::Point2;
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::state_space::StateSpace;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RrtPlanner {
    params: RrtParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RrtParams {
    /// Probability of sampling the goal exactly rather than uniformly over
    /// the field bounds.
    pub goal_bias: f64,

    /// Maximum length of a single tree extension, in meters.
    pub step_size_m: f64,

    /// Radius around the goal within which a node is considered to have
    /// reached it, in meters.
    pub goal_tolerance_m: f64,

    /// Iteration budget for a single search.
    pub max_iterations: usize,

    /// Wall-clock budget for a single search, in seconds. The search fails
    /// cleanly when the budget is exhausted so a planning call never
    /// overruns its control cycle.
    pub max_duration_s: f64,
}

/// The product of a successful search.
#[derive(Debug, Clone, Serialize)]
pub struct RrtResult {
    /// Waypoints from start to goal. Every segment between neighbouring
    /// waypoints is collision-free under the search's state space.
    pub waypoints_m: Vec<Point2<f64>>,

    /// Number of iterations used by the search.
    pub iterations: usize,
}

/// A node in the search tree. Nodes live in an arena (`Vec<Node>`) and refer
/// to their parent by index; the root has no parent.
#[derive(Debug, Clone, Copy)]
struct Node {
    position_m: Point2<f64>,
    parent: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RrtPlanner {
    pub fn new(params: RrtParams) -> Self {
        Self { params }
    }

    /// Search for a collision-free waypoint path from `start` to `goal`.
    ///
    /// Returns `None` if the iteration or wall-clock budget is exhausted
    /// before the goal is reached. The random generator is supplied by the
    /// caller so searches can be made deterministic under test.
    pub fn plan<R: Rng>(
        &self,
        rng: &mut R,
        space: &StateSpace,
        start: Point2<f64>,
        goal: Point2<f64>,
    ) -> Option<RrtResult> {
        // A direct connection needs no search, and is the common case on an
        // open field.
        if space.segment_valid(&start, &goal) {
            return Some(RrtResult {
                waypoints_m: vec![start, goal],
                iterations: 0,
            });
        }

        let bounds = *space.bounds();
        let tol_sq = self.params.goal_tolerance_m * self.params.goal_tolerance_m;

        // The arena holding the tree, rooted at the start position
        let mut nodes = vec![Node {
            position_m: start,
            parent: None,
        }];

        let search_start = Instant::now();

        for iteration in 0..self.params.max_iterations {
            if search_start.elapsed().as_secs_f64() > self.params.max_duration_s {
                warn!(
                    "RRT wall-clock budget ({} s) exhausted after {} iterations",
                    self.params.max_duration_s, iteration
                );
                return None;
            }

            // Sample the goal with fixed probability, otherwise uniform over
            // the field bounds
            let sample = if rng.gen_bool(self.params.goal_bias.clamp(0.0, 1.0)) {
                goal
            } else {
                Point2::new(
                    rng.gen_range(bounds.x_min_m..=bounds.x_max_m),
                    rng.gen_range(bounds.y_min_m..=bounds.y_max_m),
                )
            };

            // Nearest node by Euclidean distance, ties broken by first found
            let (nearest_id, nearest) = nodes
                .iter()
                .enumerate()
                .min_by_key(|(_, n)| OrderedFloat((n.position_m - sample).norm_squared()))
                .map(|(i, n)| (i, *n))?;

            let offset = sample - nearest.position_m;
            let dist = offset.norm();

            // Sampled the nearest node itself, nothing to extend
            if dist <= std::f64::EPSILON {
                continue;
            }

            // Steer a bounded-length step towards the sample
            let step = offset * (self.params.step_size_m.min(dist) / dist);
            let new_position = nearest.position_m + step;

            if !space.segment_valid(&nearest.position_m, &new_position) {
                continue;
            }

            nodes.push(Node {
                position_m: new_position,
                parent: Some(nearest_id),
            });

            trace!(
                "RRT node {} at ({:.3}, {:.3})",
                nodes.len() - 1,
                new_position.x,
                new_position.y
            );

            // Within tolerance and able to close onto the exact goal?
            if (new_position - goal).norm_squared() <= tol_sq
                && space.segment_valid(&new_position, &goal)
            {
                let waypoints_m = extract_path(&nodes, nodes.len() - 1, goal);

                debug!(
                    "RRT reached goal in {} iterations with {} nodes",
                    iteration + 1,
                    nodes.len()
                );

                return Some(RrtResult {
                    waypoints_m,
                    iterations: iteration + 1,
                });
            }
        }

        warn!(
            "RRT iteration budget ({}) exhausted without reaching the goal",
            self.params.max_iterations
        );
        None
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Walk the parent chain from `last_id` back to the root and return the
/// start-to-goal waypoint sequence.
fn extract_path(nodes: &[Node], last_id: usize, goal: Point2<f64>) -> Vec<Point2<f64>> {
    let mut waypoints = Vec::new();

    let mut id = Some(last_id);
    while let Some(i) = id {
        waypoints.push(nodes[i].position_m);
        id = nodes[i].parent;
    }

    waypoints.reverse();
    waypoints.push(goal);

    waypoints
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state_space::{FieldBounds, Obstacle, StateSpace};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> RrtParams {
        RrtParams {
            goal_bias: 0.1,
            step_size_m: 0.5,
            goal_tolerance_m: 0.3,
            max_iterations: 5000,
            max_duration_s: 1.0,
        }
    }

    fn bounds() -> FieldBounds {
        FieldBounds {
            x_min_m: -5.0,
            x_max_m: 5.0,
            y_min_m: -4.0,
            y_max_m: 4.0,
        }
    }

    #[test]
    fn test_direct_connection() {
        let space = StateSpace::new(bounds(), vec![]).unwrap();
        let planner = RrtPlanner::new(params());
        let mut rng = StdRng::seed_from_u64(1);

        let result = planner
            .plan(
                &mut rng,
                &space,
                Point2::new(-4.0, 0.0),
                Point2::new(4.0, 0.0),
            )
            .unwrap();

        // An unobstructed pair connects directly without any search
        assert_eq!(result.iterations, 0);
        assert_eq!(result.waypoints_m.len(), 2);
    }

    #[test]
    fn test_plans_around_obstacle() {
        let space = StateSpace::new(
            bounds(),
            vec![Obstacle::Circle {
                centre_m: Point2::new(0.0, 0.0),
                radius_m: 1.0,
            }],
        )
        .unwrap();
        let planner = RrtPlanner::new(params());
        let mut rng = StdRng::seed_from_u64(42);

        let start = Point2::new(-4.0, 0.0);
        let goal = Point2::new(4.0, 0.0);
        let result = planner.plan(&mut rng, &space, start, goal).unwrap();

        // Path runs start to goal and every segment is collision free under
        // the same state space used to build it
        assert_eq!(result.waypoints_m[0], start);
        assert_eq!(*result.waypoints_m.last().unwrap(), goal);
        for pair in result.waypoints_m.windows(2) {
            assert!(space.segment_valid(&pair[0], &pair[1]));
        }
    }

    #[test]
    fn test_fails_cleanly_on_enclosed_goal() {
        // Box the goal in completely with four walls
        let walls = vec![
            Obstacle::Aabb {
                min_m: Point2::new(2.0, -2.0),
                max_m: Point2::new(2.2, 2.0),
            },
            Obstacle::Aabb {
                min_m: Point2::new(4.4, -2.0),
                max_m: Point2::new(4.6, 2.0),
            },
            Obstacle::Aabb {
                min_m: Point2::new(2.0, 1.8),
                max_m: Point2::new(4.6, 2.0),
            },
            Obstacle::Aabb {
                min_m: Point2::new(2.0, -2.0),
                max_m: Point2::new(4.6, -1.8),
            },
        ];
        let space = StateSpace::new(bounds(), walls).unwrap();

        let mut p = params();
        p.max_iterations = 500;
        let planner = RrtPlanner::new(p);
        let mut rng = StdRng::seed_from_u64(7);

        let result = planner.plan(
            &mut rng,
            &space,
            Point2::new(-4.0, 0.0),
            Point2::new(3.3, 0.0),
        );
        assert!(result.is_none());
    }
}
