use crate::error::ConfigError;
use crate::network::{Network, NodeId, RailId};
use crate::time::Time;
use log::*;
use std::fmt;

pub type TrainId = usize;

/// m/s²
pub const GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum TrainState {
    Stopped,
    Accelerating,
    Maintaining,
    Braking,
    /// Not produced by the single-track model.
    Waiting,
}

impl TrainState {
    /// Label used in result files.
    pub fn label(&self) -> &'static str {
        match self {
            TrainState::Stopped => "Stopped",
            TrainState::Accelerating => "Speed up",
            TrainState::Maintaining => "Maintain",
            TrainState::Braking => "Braking",
            TrainState::Waiting => "Waiting",
        }
    }
}

impl fmt::Display for TrainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Constant physical parameters of a train.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainPhysics {
    /// Metric tons.
    pub mass: f64,
    pub friction: f64,
    /// kN
    pub max_accel_force: f64,
    /// kN
    pub max_brake_force: f64,
}

impl TrainPhysics {
    pub fn validate(&self, train: &str) -> Result<(), ConfigError> {
        let positive = [
            ("mass", self.mass),
            ("max acceleration force", self.max_accel_force),
            ("max brake force", self.max_brake_force),
        ];
        for &(field, value) in positive.iter() {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive {
                    train: train.to_string(),
                    field,
                    value,
                });
            }
        }
        if !(self.friction >= 0.0 && self.friction.is_finite()) {
            return Err(ConfigError::NegativeFriction {
                train: train.to_string(),
                value: self.friction,
            });
        }
        Ok(())
    }
}

/// A train as described in a roster file, with nodes still given by name.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSpec {
    pub name: String,
    pub physics: TrainPhysics,
    pub departure: String,
    pub destination: String,
    pub departure_time: Time,
    pub stop_duration: Time,
}

impl TrainSpec {
    pub fn build(&self, network: &Network) -> Result<Train, ConfigError> {
        let departure = network
            .node_id(&self.departure)
            .ok_or_else(|| ConfigError::UnknownNode(self.departure.clone()))?;
        let destination = network
            .node_id(&self.destination)
            .ok_or_else(|| ConfigError::UnknownNode(self.destination.clone()))?;
        Train::new(
            &self.name,
            self.physics,
            departure,
            destination,
            self.departure_time,
            self.stop_duration,
        )
    }
}

/// Where a train is. `rail` is `None` before a path is assigned and after
/// arrival; otherwise it connects `last_node` and `next_node`, and
/// `distance_on_rail` (km from `last_node`) lies within the rail's length.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub rail: Option<RailId>,
    pub last_node: Option<NodeId>,
    pub next_node: Option<NodeId>,
    pub distance_on_rail: f64,
}

/// Per-step driving parameters, taken from the simulation config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    pub step_hours: f64,
    pub maintain_ratio: f64,
    pub braking_lookahead_km: f64,
}

/// What happened to the train's position during [`Train::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Idle,
    Moved,
    EnteredRail(RailId),
    Arrived,
}

#[derive(Debug, Clone)]
pub struct Train {
    id: TrainId,
    name: String,
    physics: TrainPhysics,
    departure: NodeId,
    destination: NodeId,
    departure_time: Time,
    stop_duration: Time,

    state: TrainState,
    speed: f64,
    current_time: Time,
    path: Vec<NodeId>,
    segment_rails: Vec<RailId>,
    path_index: usize,
    position: Position,
    distance_to_go: f64,
    departed_at: Option<Time>,
    arrived_at: Option<Time>,
    collided: bool,
}

impl Train {
    pub fn new(
        name: &str,
        physics: TrainPhysics,
        departure: NodeId,
        destination: NodeId,
        departure_time: Time,
        stop_duration: Time,
    ) -> Result<Train, ConfigError> {
        physics.validate(name)?;
        Ok(Train {
            id: 0,
            name: name.to_string(),
            physics,
            departure,
            destination,
            departure_time,
            stop_duration,
            state: TrainState::Stopped,
            speed: 0.0,
            current_time: departure_time,
            path: Vec::new(),
            segment_rails: Vec::new(),
            path_index: 0,
            position: Position::default(),
            distance_to_go: 0.0,
            departed_at: None,
            arrived_at: None,
            collided: false,
        })
    }

    pub fn id(&self) -> TrainId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TrainId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn physics(&self) -> &TrainPhysics {
        &self.physics
    }

    pub fn departure(&self) -> NodeId {
        self.departure
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn departure_time(&self) -> Time {
        self.departure_time
    }

    pub fn stop_duration(&self) -> Time {
        self.stop_duration
    }

    pub fn state(&self) -> TrainState {
        self.state
    }

    /// km/h
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn current_time(&self) -> Time {
        self.current_time
    }

    pub(crate) fn set_current_time(&mut self, time: Time) {
        self.current_time = time;
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Remaining km along the whole path.
    pub fn distance_to_go(&self) -> f64 {
        self.distance_to_go
    }

    pub fn departed_at(&self) -> Option<Time> {
        self.departed_at
    }

    pub fn arrived_at(&self) -> Option<Time> {
        self.arrived_at
    }

    pub fn has_collided(&self) -> bool {
        self.collided
    }

    pub fn has_departed(&self) -> bool {
        self.departed_at.is_some()
    }

    /// A path with at least one rail to travel.
    pub fn has_route(&self) -> bool {
        self.path.len() >= 2
    }

    /// Arrival is the end of the path reached while stopped. A train without a
    /// path never arrives.
    pub fn has_arrived(&self) -> bool {
        !self.path.is_empty()
            && self.path_index + 1 >= self.path.len()
            && self.state == TrainState::Stopped
    }

    /// Departed, not arrived, and physically on a rail.
    pub fn is_on_line(&self) -> bool {
        self.has_departed() && !self.has_arrived() && self.position.rail.is_some()
    }

    //
    // Physics
    //

    /// kN
    pub fn friction_force(&self) -> f64 {
        // tons -> kg, N -> kN
        self.physics.friction * self.physics.mass * 1000.0 * GRAVITY / 1000.0
    }

    /// Speed gain rate in km/h per hour, zero once at the speed limit or when
    /// friction eats all of the traction force.
    pub fn acceleration(&self, speed_limit: f64) -> f64 {
        let net_force = self.physics.max_accel_force - self.friction_force();
        if net_force <= 0.0 || self.speed >= speed_limit {
            return 0.0;
        }
        net_force / self.physics.mass * 3.6
    }

    /// Speed loss rate in km/h per hour.
    pub fn braking(&self) -> f64 {
        self.physics.max_brake_force / self.physics.mass * 3.6
    }

    /// km needed to stop from the current speed.
    pub fn stopping_distance(&self) -> f64 {
        self.speed * self.speed / (2.0 * self.braking() / 3.6)
    }

    //
    // Path and movement
    //

    /// Assigns the path and places the train at its start. Consecutive nodes
    /// are joined by the fastest rail between them. Returns false, leaving
    /// the train without a path, if some pair of consecutive nodes has no rail.
    pub fn set_path(&mut self, path: Vec<NodeId>, network: &Network) -> bool {
        let mut rails = Vec::with_capacity(path.len().saturating_sub(1));
        for w in path.windows(2) {
            match fastest_rail(network, w[0], w[1]) {
                Some(r) => rails.push(r),
                None => {
                    warn!(
                        "Train {}: no rail between {} and {}",
                        self.name,
                        network.node_name(w[0]),
                        network.node_name(w[1])
                    );
                    self.path.clear();
                    self.segment_rails.clear();
                    self.position = Position::default();
                    return false;
                }
            }
        }

        self.path = path;
        self.segment_rails = rails;
        self.path_index = 0;
        self.state = TrainState::Stopped;
        self.speed = 0.0;
        self.position = match (self.path.get(0), self.path.get(1)) {
            (Some(a), Some(b)) => Position {
                rail: Some(self.segment_rails[0]),
                last_node: Some(*a),
                next_node: Some(*b),
                distance_on_rail: 0.0,
            },
            (Some(a), None) => Position {
                rail: None,
                last_node: Some(*a),
                next_node: None,
                distance_on_rail: 0.0,
            },
            _ => Position::default(),
        };
        self.update_distance_to_go(network);
        true
    }

    fn update_distance_to_go(&mut self, network: &Network) {
        let travelled = self.position.distance_on_rail;
        self.distance_to_go = self
            .segment_rails
            .iter()
            .skip(self.path_index)
            .map(|r| network.rail(*r).length())
            .sum::<f64>()
            - if self.position.rail.is_some() {
                travelled
            } else {
                0.0
            };
    }

    pub(crate) fn depart(&mut self, time: Time) {
        self.state = TrainState::Accelerating;
        self.departed_at = Some(time);
    }

    pub(crate) fn mark_arrived(&mut self, time: Time) {
        self.arrived_at = Some(time);
    }

    pub(crate) fn halt_after_collision(&mut self) {
        self.state = TrainState::Stopped;
        self.speed = 0.0;
        self.collided = true;
    }

    /// Chooses the motion state for this step and updates the speed.
    ///
    /// `obstacle` is the safety-distance condition; anticipatory braking
    /// before the end of the rail is checked here from the speed at the start
    /// of the step.
    pub(crate) fn control(
        &mut self,
        network: &Network,
        obstacle: bool,
        controls: &Controls,
    ) -> TrainState {
        let rail = match self.position.rail {
            Some(r) => network.rail(r),
            None => return self.state,
        };
        let limit = rail.speed_limit();
        let remaining = rail.length() - self.position.distance_on_rail;
        let approaching_node =
            remaining < self.stopping_distance() && remaining < controls.braking_lookahead_km;

        if obstacle || approaching_node {
            self.state = TrainState::Braking;
            self.speed = (self.speed - self.braking() * controls.step_hours).max(0.0);
        } else if self.speed < limit * controls.maintain_ratio {
            self.state = TrainState::Accelerating;
            self.speed = (self.speed + self.acceleration(limit) * controls.step_hours).min(limit);
        } else {
            self.state = TrainState::Maintaining;
            self.speed = self.speed.min(limit);
        }
        trace!(
            "Train {} {} at {:.2}km/h, {:.2}km left on rail (obstacle {}, node ahead {})",
            self.name,
            self.state,
            self.speed,
            remaining,
            obstacle,
            approaching_node
        );
        self.state
    }

    /// Integrates the position over one step and hands the train over to the
    /// next rail, or finishes the trip, when the end of the rail is reached.
    pub(crate) fn advance(&mut self, network: &mut Network, step_hours: f64) -> Movement {
        let rail = match self.position.rail {
            Some(r) => r,
            None => return Movement::Idle,
        };
        if self.state == TrainState::Stopped {
            return Movement::Idle;
        }

        let length = network.rail(rail).length();
        self.position.distance_on_rail += self.speed * step_hours;
        if self.position.distance_on_rail < length {
            self.update_distance_to_go(network);
            return Movement::Moved;
        }

        network.vacate(rail, self.id);
        self.path_index += 1;
        if self.path_index + 1 >= self.path.len() {
            self.state = TrainState::Stopped;
            self.speed = 0.0;
            self.position = Position {
                rail: None,
                last_node: self.path.last().copied(),
                next_node: None,
                distance_on_rail: 0.0,
            };
            self.distance_to_go = 0.0;
            return Movement::Arrived;
        }

        let next = self.segment_rails[self.path_index];
        self.position = Position {
            rail: Some(next),
            last_node: Some(self.path[self.path_index]),
            next_node: Some(self.path[self.path_index + 1]),
            distance_on_rail: 0.0,
        };
        network.occupy(next, self.id);
        self.update_distance_to_go(network);
        Movement::EnteredRail(next)
    }

    /// Position on the current rail measured from the rail's start node, so
    /// that trains travelling in either direction can be compared. The flag is
    /// true when the train moves away from the start node.
    pub fn rail_coordinate(&self, network: &Network) -> Option<(RailId, f64, bool)> {
        let rail_id = self.position.rail?;
        let rail = network.rail(rail_id);
        let d = self.position.distance_on_rail;
        if self.position.last_node == Some(rail.start()) {
            Some((rail_id, d, true))
        } else {
            Some((rail_id, rail.length() - d, false))
        }
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, distance_on_rail: f64, speed: f64) {
        self.position.distance_on_rail = distance_on_rail;
        self.speed = speed;
    }
}

fn fastest_rail(network: &Network, from: NodeId, to: NodeId) -> Option<RailId> {
    network
        .neighbours(from)
        .filter(|(_, other)| *other == to)
        .map(|(r, _)| r)
        .fold(None, |best: Option<RailId>, r| match best {
            Some(b) if travel_hours(network, b) <= travel_hours(network, r) => Some(b),
            _ => Some(r),
        })
}

fn travel_hours(network: &Network, rail: RailId) -> f64 {
    let rail = network.rail(rail);
    rail.length() / rail.speed_limit()
}
