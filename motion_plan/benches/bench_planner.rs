//! # Planner Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::{Point2, Vector2};
use motion_plan::bezier::CurveParams;
use motion_plan::plan_mgr::ReplanParams;
use motion_plan::rrt::RrtParams;
use motion_plan::smooth::SmoothParams;
use motion_plan::{
    FieldBounds, MotionCommand, MotionConstraints, Obstacle, PathTargetPlanner, PlanRequest,
    PlannerParams, Pose, RobotInstant, Twist,
};

fn planner_benchmark(c: &mut Criterion) {
    // ---- Build a planner over a division-B sized field ----

    let params = PlannerParams {
        rrt: RrtParams {
            goal_bias: 0.05,
            step_size_m: 0.25,
            goal_tolerance_m: 0.15,
            max_iterations: 10000,
            max_duration_s: 0.05,
        },
        smooth: SmoothParams { max_passes: 10 },
        curve: CurveParams {
            samples_per_segment: 40,
            max_relax_iterations: 8,
            tangent_relax_factor: 0.7,
        },
        replan: ReplanParams {
            partial_replan_lead_time_s: 0.2,
            check_better_interval_s: 1.0,
            position_tolerance_m: 1e-3,
        },
    };

    let bounds = FieldBounds {
        x_min_m: -4.5,
        x_max_m: 4.5,
        y_min_m: -3.0,
        y_max_m: 3.0,
    };

    let mut planner = PathTargetPlanner::with_seed(params, bounds, 99);

    // A scattering of robot-sized obstacles between start and goal
    let obstacles: Vec<Obstacle> = vec![
        (-1.5, 0.2),
        (-0.5, -0.8),
        (0.4, 0.9),
        (1.2, -0.3),
        (2.2, 0.5),
        (3.0, -1.0),
    ]
    .into_iter()
    .map(|(x, y)| Obstacle::Circle {
        centre_m: Point2::new(x, y),
        radius_m: 0.18,
    })
    .collect();

    let constraints = MotionConstraints {
        max_speed_ms: 3.0,
        max_accel_mss: 2.5,
        max_ang_speed_rads: 6.0,
        max_ang_accel_radss: 12.0,
        max_lat_accel_mss: 2.0,
    };

    c.bench_function("plan across obstructed field", |b| {
        b.iter(|| {
            let request = PlanRequest {
                start: RobotInstant::new(
                    Pose::new(Point2::new(-4.0, -2.5), 0.0),
                    Twist::zero(),
                    0.0,
                ),
                command: MotionCommand::PathTarget {
                    goal: Pose::new(Point2::new(4.0, 2.5), 0.0),
                    goal_velocity_ms: Vector2::zeros(),
                },
                constraints,
                obstacles: obstacles.clone(),
                prev_trajectory: None,
                now_s: 0.0,
                with_debug: false,
            };

            planner.plan(request).unwrap()
        })
    });
}

criterion_group!(benches, planner_benchmark);
criterion_main!(benches);
