use crate::config::SimulationConfig;
use crate::error::{ConfigError, SimulationError};
use crate::network::{Network, RailId};
use crate::observer::{Event, Observer, ObserverId, Snapshot};
use crate::pathfinding::{Dijkstra, PathfindingStrategy};
use crate::time::Time;
use crate::train::{Movement, Train, TrainId};
use log::*;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Running,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every train arrived.
    Completed,
    /// The step ceiling was hit first.
    CeilingReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Steps taken by this call to [`Simulation::run`].
    pub steps: usize,
    pub final_time: Time,
}

/// Travel record of one train after (or during) a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSummary {
    pub train: TrainId,
    pub name: String,
    pub scheduled_departure: Time,
    pub departed_at: Option<Time>,
    pub arrived_at: Option<Time>,
    /// Minutes from the scheduled departure to arrival.
    pub travel_minutes: Option<i64>,
    pub collided: bool,
    pub reachable: bool,
}

/// Departure offset and arrival of a train, in minutes since the initial clock.
#[derive(Debug, Clone, Copy, Default)]
struct Schedule {
    departure_after: i64,
    arrived_after: Option<i64>,
}

/// Start-of-step location of a train that is on the line.
#[derive(Debug, Clone, Copy)]
struct Placement {
    rail: RailId,
    /// km from the rail's start node.
    coord: f64,
    forward: bool,
}

/// One simulation run: the network, the trains on it, and the clock.
///
/// Observers attached with [`Simulation::attach`] may borrow from the caller
/// for `'o`.
pub struct Simulation<'o> {
    network: Network,
    trains: Vec<Train>,
    schedules: Vec<Schedule>,
    pathfinder: Option<Box<dyn PathfindingStrategy>>,
    config: SimulationConfig,
    phase: Phase,
    clock: Time,
    elapsed_minutes: i64,
    steps: usize,
    collided_pairs: HashSet<(TrainId, TrainId)>,
    observers: Vec<(ObserverId, Box<dyn Observer + 'o>)>,
    next_observer: ObserverId,
}

impl<'o> Simulation<'o> {
    pub fn new(network: Network, config: SimulationConfig) -> Result<Simulation<'o>, ConfigError> {
        config.validate()?;
        Ok(Simulation {
            network,
            trains: Vec::new(),
            schedules: Vec::new(),
            pathfinder: None,
            config,
            phase: Phase::Uninitialized,
            clock: Time::default(),
            elapsed_minutes: 0,
            steps: 0,
            collided_pairs: HashSet::new(),
            observers: Vec::new(),
            next_observer: 0,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.trains.get(id)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock(&self) -> Time {
        self.clock
    }

    /// Total steps taken since initialization.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn pathfinding_strategy(&self) -> Option<&dyn PathfindingStrategy> {
        self.pathfinder.as_deref()
    }

    /// Replaces the strategy. Paths are computed once, by [`Simulation::initialize`].
    pub fn set_pathfinding_strategy(&mut self, strategy: Box<dyn PathfindingStrategy>) {
        self.pathfinder = Some(strategy);
    }

    /// Registers a train and assigns its id.
    pub fn add_train(&mut self, mut train: Train) -> Result<TrainId, SimulationError> {
        if self.phase != Phase::Uninitialized {
            return Err(SimulationError::AlreadyInitialized);
        }
        let id = self.trains.len();
        train.set_id(id);
        self.trains.push(train);
        self.schedules.push(Schedule::default());
        Ok(id)
    }

    pub fn attach<O: Observer + 'o>(&mut self, observer: O) -> ObserverId {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn detach(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(o, _)| *o != id);
        self.observers.len() != before
    }

    /// Delivers an event to every observer, in attachment order.
    pub fn notify(&mut self, event: &Event) {
        for (_, observer) in self.observers.iter_mut() {
            observer.notify(event);
        }
    }

    /// Computes every train's path, places trains on their first rail and sets
    /// the clock to the earliest scheduled departure. A simulation is
    /// initialized once.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.phase != Phase::Uninitialized {
            return Err(SimulationError::AlreadyInitialized);
        }
        let _h = hprof::enter("initialize");
        let pathfinder = self
            .pathfinder
            .get_or_insert_with(|| Box::new(Dijkstra::default()) as Box<dyn PathfindingStrategy>);
        info!(
            "Initializing {} trains on {} nodes / {} rails using {}",
            self.trains.len(),
            self.network.nodes().len(),
            self.network.rails().len(),
            pathfinder.name()
        );

        self.network.clear_occupancy();
        self.collided_pairs.clear();
        let network = &self.network;
        let paths = self
            .trains
            .iter()
            .map(|t| pathfinder.find_path(network, t.departure(), t.destination()))
            .collect::<Vec<_>>();

        for (train, path) in self.trains.iter_mut().zip(paths) {
            if path.is_empty() {
                warn!(
                    "Train {} cannot reach {} from {}; it will not depart",
                    train.name(),
                    self.network.node_name(train.destination()),
                    self.network.node_name(train.departure())
                );
            } else {
                debug!(
                    "Train {} path: {}",
                    train.name(),
                    path.iter()
                        .map(|n| self.network.node_name(*n))
                        .collect::<Vec<_>>()
                        .join(" -> ")
                );
            }
            train.set_path(path, &self.network);
            if let Some(rail) = train.position().rail {
                self.network.occupy(rail, train.id());
            }
        }

        self.clock = self
            .trains
            .iter()
            .map(|t| t.departure_time())
            .min()
            .unwrap_or_default();
        let start = self.clock;
        for (train, schedule) in self.trains.iter_mut().zip(self.schedules.iter_mut()) {
            train.set_current_time(start);
            *schedule = Schedule {
                departure_after: start.minutes_until(train.departure_time()),
                arrived_after: None,
            };
        }
        self.elapsed_minutes = 0;
        self.steps = 0;
        self.phase = Phase::Initialized;

        // Trains whose departure is their destination are done already.
        let mut events = Vec::new();
        for (train, schedule) in self.trains.iter_mut().zip(self.schedules.iter_mut()) {
            if train.has_arrived() {
                train.mark_arrived(train.departure_time());
                schedule.arrived_after = Some(schedule.departure_after);
                events.push(Event::Arrived {
                    train: train.id(),
                    name: train.name().to_string(),
                    time: train.departure_time(),
                });
            }
        }
        for event in events.iter() {
            self.notify(event);
        }
        if self.is_complete() {
            self.phase = Phase::Complete;
        }
        Ok(())
    }

    /// Advances the simulation by one step: all trains move, then collisions
    /// are checked on the updated positions, then the clock advances.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        if self.phase == Phase::Uninitialized {
            return Err(SimulationError::NotInitialized);
        }
        self.phase = Phase::Running;

        let mut events = self.update_trains();
        events.extend(self.check_collisions());
        self.resolve_interactions();

        self.clock.add_minutes(self.config.step_minutes as i64);
        self.elapsed_minutes += self.config.step_minutes as i64;
        self.steps += 1;

        for event in events.iter() {
            self.notify(event);
        }
        if !self.observers.is_empty() {
            for snapshot in self.snapshots() {
                self.notify(&Event::Snapshot(snapshot));
            }
        }

        if self.is_complete() {
            self.phase = Phase::Complete;
        }
        debug!(
            "Step {} done, clock {}, {}/{} trains arrived",
            self.steps,
            self.clock,
            self.trains.iter().filter(|t| t.has_arrived()).count(),
            self.trains.len()
        );
        Ok(())
    }

    /// Steps until every train has arrived or `max_steps` is reached.
    /// Initializes first if needed.
    pub fn run(&mut self) -> Result<RunReport, SimulationError> {
        if self.phase == Phase::Uninitialized {
            self.initialize()?;
        }
        let _h = hprof::enter("run");
        let mut steps = 0;
        while !self.is_complete() && steps < self.config.max_steps {
            self.step()?;
            steps += 1;
        }

        let outcome = if self.is_complete() {
            info!("All trains arrived after {} steps at {}", self.steps, self.clock);
            RunOutcome::Completed
        } else {
            warn!(
                "Stopped at the ceiling of {} steps with {} trains still under way",
                self.config.max_steps,
                self.trains.iter().filter(|t| !t.has_arrived()).count()
            );
            RunOutcome::CeilingReached
        };
        Ok(RunReport {
            outcome,
            steps,
            final_time: self.clock,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.trains.iter().all(|t| t.has_arrived())
    }

    pub fn summaries(&self) -> Vec<TrainSummary> {
        self.trains
            .iter()
            .zip(self.schedules.iter())
            .map(|(t, s)| TrainSummary {
                train: t.id(),
                name: t.name().to_string(),
                scheduled_departure: t.departure_time(),
                departed_at: t.departed_at(),
                arrived_at: t.arrived_at(),
                travel_minutes: s.arrived_after.map(|a| a - s.departure_after),
                collided: t.has_collided(),
                reachable: !t.path().is_empty(),
            })
            .collect()
    }

    /// Snapshots of every departed train currently on a rail.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.trains
            .iter()
            .filter(|t| t.is_on_line())
            .filter_map(|t| self.snapshot(t.id()))
            .collect()
    }

    pub fn snapshot(&self, id: TrainId) -> Option<Snapshot> {
        let train = self.trains.get(id)?;
        let pos = train.position();
        let rail_id = pos.rail?;
        let rail = self.network.rail(rail_id);
        let (_, _, forward) = train.rail_coordinate(&self.network)?;

        let other_trains = self
            .trains
            .iter()
            .filter(|o| o.id() != id && o.is_on_line())
            .filter_map(|o| o.rail_coordinate(&self.network))
            .filter(|(r, _, _)| *r == rail_id)
            .map(|(_, coord, _)| if forward { coord } else { rail.length() - coord })
            .collect();

        Some(Snapshot {
            time: train.current_time(),
            train: id,
            train_name: train.name().to_string(),
            start_node: pos
                .last_node
                .map(|n| self.network.node_name(n).to_string())
                .unwrap_or_default(),
            end_node: pos
                .next_node
                .map(|n| self.network.node_name(n).to_string())
                .unwrap_or_default(),
            distance_remaining: train.distance_to_go(),
            state: train.state(),
            rail_length: rail.length(),
            distance_on_rail: pos.distance_on_rail,
            other_trains,
        })
    }

    fn placements(&self) -> Vec<Option<Placement>> {
        self.trains
            .iter()
            .map(|t| {
                if !t.is_on_line() {
                    return None;
                }
                t.rail_coordinate(&self.network)
                    .map(|(rail, coord, forward)| Placement {
                        rail,
                        coord,
                        forward,
                    })
            })
            .collect()
    }

    /// Whether some other train on the same rail lies ahead of `train`, in its
    /// direction of travel, closer than the safety distance. Trains meeting
    /// head-on are each ahead of the other.
    fn obstacle_ahead(&self, train: TrainId, placements: &[Option<Placement>]) -> bool {
        let me = match placements[train] {
            Some(p) => p,
            None => return false,
        };
        placements
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != train)
            .filter_map(|(_, p)| *p)
            .filter(|p| p.rail == me.rail)
            .any(|p| {
                let gap = if me.forward {
                    p.coord - me.coord
                } else {
                    me.coord - p.coord
                };
                gap > 0.0 && gap < self.config.safety_distance_km
            })
    }

    fn update_trains(&mut self) -> Vec<Event> {
        let controls = self.config.controls();
        let placements = self.placements();
        let obstacles = (0..self.trains.len())
            .map(|t| self.obstacle_ahead(t, &placements))
            .collect::<Vec<_>>();

        let mut events = Vec::new();
        for (idx, train) in self.trains.iter_mut().enumerate() {
            let schedule = &mut self.schedules[idx];
            train.set_current_time(self.clock);

            if !train.has_departed()
                && train.has_route()
                && !train.has_arrived()
                && self.elapsed_minutes >= schedule.departure_after
            {
                train.depart(self.clock);
                events.push(Event::Departed {
                    train: train.id(),
                    name: train.name().to_string(),
                    time: self.clock,
                });
            }

            if !train.is_on_line() || train.has_collided() {
                continue;
            }

            train.control(&self.network, obstacles[idx], &controls);
            if train.advance(&mut self.network, controls.step_hours) == Movement::Arrived {
                let arrival = self.clock.plus_minutes(self.config.step_minutes as i64);
                train.mark_arrived(arrival);
                schedule.arrived_after =
                    Some(self.elapsed_minutes + self.config.step_minutes as i64);
                events.push(Event::Arrived {
                    train: train.id(),
                    name: train.name().to_string(),
                    time: arrival,
                });
            }
        }
        events
    }

    fn check_collisions(&mut self) -> Vec<Event> {
        let placements = self.placements();
        let mut events = Vec::new();
        for i in 0..self.trains.len() {
            let a = match placements[i] {
                Some(p) => p,
                None => continue,
            };
            for j in (i + 1)..self.trains.len() {
                let b = match placements[j] {
                    Some(p) => p,
                    None => continue,
                };
                if a.rail != b.rail
                    || (a.coord - b.coord).abs() >= self.config.collision_distance_km
                    || self.collided_pairs.contains(&(i, j))
                {
                    continue;
                }

                self.trains[i].halt_after_collision();
                self.trains[j].halt_after_collision();
                self.collided_pairs.insert((i, j));
                let names = (
                    self.trains[i].name().to_string(),
                    self.trains[j].name().to_string(),
                );
                warn!(
                    "Collision between {} and {} on rail r{} at {}",
                    names.0, names.1, a.rail, self.clock
                );
                events.push(Event::Collision {
                    first: i,
                    second: j,
                    names,
                    rail: a.rail,
                    time: self.clock,
                });
            }
        }
        events
    }

    /// One train per rail direction and no passing loops, so there is nothing
    /// to negotiate between trains beyond braking and collisions.
    fn resolve_interactions(&mut self) {}
}
