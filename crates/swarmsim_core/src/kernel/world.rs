//! Per-world simulation state: arena, target pads, robots, task reward.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::sense::{sense, RobotView};
use super::{AXLE_LENGTH, ROBOT_RADIUS, SPAWN_MARGIN, WHEEL_DRAIN_DIVISOR};
use crate::buffers::WorldParams;
use crate::device::{ProgramSpec, RobotTransform};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Pad {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Pad {
    pub(crate) fn contains(&self, x: f32, y: f32) -> bool {
        let (dx, dy) = (x - self.x, y - self.y);
        dx * dx + dy * dy < self.radius * self.radius
    }
}

pub(crate) struct Robot {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
    /// Leaky-integrator activations, one per hidden neuron.
    pub hidden: Vec<f32>,
    /// Last commanded wheel speeds, normalized to [-1, 1].
    pub wheels: [f32; 2],
    pub front_led: bool,
    pub rear_led: bool,
    pub energy: f32,
    pub fitness: f32,
    pub last_pad: Option<usize>,
    /// Scratch sensor readings, reused every tick.
    pub sensors: Vec<f32>,
}

pub(crate) struct WorldState {
    rng: ChaCha8Rng,
    half_width: f32,
    half_height: f32,
    pads: [Pad; 2],
    full_charge: f32,
    clock: f32,
    robots: Vec<Robot>,
    /// Scratch pose snapshot taken before each think phase.
    views: Vec<RobotView>,
}

impl WorldState {
    pub(crate) fn new(spec: &ProgramSpec, seed: u64) -> Self {
        let mut world = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            half_width: spec.task.arena_width_min / 2.0,
            half_height: spec.task.arena_height / 2.0,
            pads: [Pad {
                x: 0.0,
                y: 0.0,
                radius: spec.task.pad_radius,
            }; 2],
            full_charge: 0.0,
            clock: 0.0,
            robots: Vec::new(),
            views: Vec::new(),
        };
        world.init_arena(spec, spec.task.target_distances[0]);
        world.place_robots(spec);
        world
    }

    pub(crate) fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Rebuilds walls and target pads for one pad-separation distance.
    pub(crate) fn init_arena(&mut self, spec: &ProgramSpec, target_distance: f32) {
        let task = &spec.task;
        let width = self
            .rng
            .gen_range(task.arena_width_min..=task.arena_width_max);
        self.half_width = width / 2.0;
        self.half_height = task.arena_height / 2.0;

        // Pads sit on the diagonal, `target_distance` apart centre to centre.
        let offset = ((target_distance / 2.0).powi(2) / 2.0).sqrt();
        self.pads = [
            Pad {
                x: -offset,
                y: offset,
                radius: task.pad_radius,
            },
            Pad {
                x: offset,
                y: -offset,
                radius: task.pad_radius,
            },
        ];
        self.full_charge = target_distance - 2.0 * task.pad_radius;
        self.clock = 0.0;
    }

    /// Scatters robots inside the walls and clears controller/task state.
    pub(crate) fn place_robots(&mut self, spec: &ProgramSpec) {
        let hidden = spec.shape.hidden;
        let sensors = spec.shape.sensors;
        let x_range = self.half_width - SPAWN_MARGIN;
        let y_range = self.half_height - SPAWN_MARGIN;

        self.robots.clear();
        for _ in 0..spec.robots_per_world {
            let x = self.rng.gen_range(-x_range..=x_range);
            let y = self.rng.gen_range(-y_range..=y_range);
            let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
            self.robots.push(Robot {
                x,
                y,
                theta,
                hidden: vec![0.0; hidden],
                wheels: [0.0; 2],
                front_led: false,
                rear_led: false,
                energy: 1.0 + self.full_charge,
                fitness: 0.0,
                last_pad: None,
                sensors: vec![0.0; sensors],
            });
        }
        self.clock = 0.0;
    }

    /// One synchronous tick: sense, think, actuate, integrate, score.
    pub(crate) fn step(&mut self, params: WorldParams<'_>, spec: &ProgramSpec) {
        let task = &spec.task;
        let v_max = 1.0 / task.seconds_per_metre;

        // Pose snapshot so sensing sees a consistent pre-tick world.
        self.views.clear();
        self.views.extend(self.robots.iter().map(|r| RobotView {
            x: r.x,
            y: r.y,
            lit: r.front_led || r.rear_led,
        }));

        let Self {
            robots,
            views,
            pads,
            half_width,
            half_height,
            ..
        } = self;

        for (i, robot) in robots.iter_mut().enumerate() {
            sense(robot, i, views, pads, *half_width, *half_height);
            think(robot, &params, spec);
        }

        let sub_dt = spec.time_step / spec.dynamics_iterations as f32;
        for _ in 0..spec.dynamics_iterations {
            for robot in robots.iter_mut() {
                let vl = robot.wheels[0] * v_max;
                let vr = robot.wheels[1] * v_max;
                let v = 0.5 * (vl + vr);
                let omega = (vr - vl) / AXLE_LENGTH;
                robot.theta = wrap_angle(robot.theta + omega * sub_dt);
                robot.x += v * robot.theta.cos() * sub_dt;
                robot.y += v * robot.theta.sin() * sub_dt;
            }
            separate_robots(robots);
            for robot in robots.iter_mut() {
                let x_limit = *half_width - ROBOT_RADIUS;
                let y_limit = *half_height - ROBOT_RADIUS;
                robot.x = robot.x.clamp(-x_limit, x_limit);
                robot.y = robot.y.clamp(-y_limit, y_limit);
            }
        }

        if self.clock >= task.reward_window_delay {
            let full_charge = self.full_charge;
            for robot in self.robots.iter_mut() {
                let pad_here = self.pads.iter().position(|p| p.contains(robot.x, robot.y));
                match pad_here {
                    Some(p) if robot.last_pad != Some(p) => {
                        robot.fitness += robot.energy;
                        robot.energy = 1.0 + full_charge;
                        robot.last_pad = Some(p);
                    }
                    _ => {
                        robot.energy -= (robot.wheels[0].abs() + robot.wheels[1].abs())
                            / WHEEL_DRAIN_DIVISOR;
                    }
                }
            }
        }

        self.clock += spec.time_step;
    }

    pub(crate) fn total_fitness(&self) -> f32 {
        self.robots.iter().map(|r| r.fitness).sum()
    }

    pub(crate) fn collect_transforms(&self, out: &mut Vec<RobotTransform>) {
        out.extend(self.robots.iter().map(|r| RobotTransform {
            x: r.x,
            y: r.y,
            sin: r.theta.sin(),
            cos: r.theta.cos(),
        }));
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Controller forward pass: leaky hidden integration, then actuators.
fn think(robot: &mut Robot, params: &WorldParams<'_>, spec: &ProgramSpec) {
    let ns = spec.shape.sensors;
    let nh = spec.shape.hidden;

    for h in 0..nh {
        let mut u = params.bias_hidden[h];
        for k in 0..ns {
            u += params.weights_hidden[h * ns + k] * robot.sensors[k];
        }
        let tau = params.timec_hidden[h];
        robot.hidden[h] = tau * robot.hidden[h] + (1.0 - tau) * sigmoid(u);
    }

    let row = ns + nh;
    let mut out = [0.0f32; 4];
    for (a, slot) in out.iter_mut().enumerate().take(spec.shape.actuators) {
        let mut u = params.bias[a];
        for k in 0..ns {
            u += params.weights[a * row + k] * robot.sensors[k];
        }
        for h in 0..nh {
            u += params.weights[a * row + ns + h] * robot.hidden[h];
        }
        *slot = sigmoid(u);
    }

    robot.wheels = [2.0 * out[0] - 1.0, 2.0 * out[1] - 1.0];
    robot.rear_led = out[2] > 0.5;
    robot.front_led = out[3] > 0.5;
}

fn wrap_angle(theta: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (theta + PI).rem_euclid(TAU) - PI
}

/// Pairwise push-out of overlapping bodies.
fn separate_robots(robots: &mut [Robot]) {
    let min_dist = 2.0 * ROBOT_RADIUS;
    for i in 0..robots.len() {
        for j in (i + 1)..robots.len() {
            let dx = robots[j].x - robots[i].x;
            let dy = robots[j].y - robots[i].y;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq >= min_dist * min_dist {
                continue;
            }
            if dist_sq <= f32::EPSILON {
                // Coincident centres: separate along x deterministically.
                robots[i].x -= ROBOT_RADIUS;
                robots[j].x += ROBOT_RADIUS;
                continue;
            }
            let dist = dist_sq.sqrt();
            let push = 0.5 * (min_dist - dist);
            let (ux, uy) = (dx / dist, dy / dist);
            robots[i].x -= ux * push;
            robots[i].y -= uy * push;
            robots[j].x += ux * push;
            robots[j].y += uy * push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use swarmsim_data::GenomeShape;

    fn spec(robots: usize) -> ProgramSpec {
        ProgramSpec {
            num_worlds: 1,
            robots_per_world: robots,
            time_step: 1.0 / 30.0,
            dynamics_iterations: 4,
            shape: GenomeShape::reference(),
            task: TaskConfig::default(),
        }
    }

    #[test]
    fn test_pads_are_target_distance_apart() {
        let spec = spec(1);
        let mut world = WorldState::new(&spec, 3);
        world.init_arena(&spec, 1.9);
        let (dx, dy) = (
            world.pads[0].x - world.pads[1].x,
            world.pads[0].y - world.pads[1].y,
        );
        assert!(((dx * dx + dy * dy).sqrt() - 1.9).abs() < 1e-5);
        assert!((world.full_charge - (1.9 - 0.54)).abs() < 1e-6);
    }

    #[test]
    fn test_robots_spawn_inside_margins() {
        let spec = spec(50);
        let mut world = WorldState::new(&spec, 9);
        world.init_arena(&spec, 1.2);
        world.place_robots(&spec);
        for robot in &world.robots {
            assert!(robot.x.abs() <= world.half_width - SPAWN_MARGIN + 1e-6);
            assert!(robot.y.abs() <= world.half_height - SPAWN_MARGIN + 1e-6);
            assert_eq!(robot.fitness, 0.0);
            assert_eq!(robot.last_pad, None);
        }
    }

    #[test]
    fn test_separation_resolves_overlap() {
        let spec = spec(2);
        let mut world = WorldState::new(&spec, 1);
        world.robots[0].x = 0.0;
        world.robots[0].y = 0.0;
        world.robots[1].x = 0.01;
        world.robots[1].y = 0.0;
        separate_robots(&mut world.robots);
        let dx = world.robots[1].x - world.robots[0].x;
        let dy = world.robots[1].y - world.robots[0].y;
        assert!((dx * dx + dy * dy).sqrt() >= 2.0 * ROBOT_RADIUS - 1e-5);
    }

    #[test]
    fn test_wrap_angle_stays_in_range() {
        use std::f32::consts::PI;
        for theta in [-10.0f32, -PI, 0.0, PI, 10.0, 100.0] {
            let wrapped = wrap_angle(theta);
            assert!((-PI..=PI).contains(&wrapped));
        }
    }
}
