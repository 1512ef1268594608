use crate::network::RailId;
use crate::time::Time;
use crate::train::{TrainId, TrainState};
use log::*;
use std::fmt;

/// State of one en-route train at the end of a step.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Snapshot {
    pub time: Time,
    pub train: TrainId,
    pub train_name: String,
    pub start_node: String,
    pub end_node: String,
    /// km left along the whole path.
    pub distance_remaining: f64,
    pub state: TrainState,
    pub rail_length: f64,
    /// km travelled on the current rail.
    pub distance_on_rail: f64,
    /// Other trains on the same rail, in km from this train's `start_node`.
    pub other_trains: Vec<f64>,
}

/// Notification published by the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Departed {
        train: TrainId,
        name: String,
        time: Time,
    },
    Arrived {
        train: TrainId,
        name: String,
        time: Time,
    },
    Collision {
        first: TrainId,
        second: TrainId,
        names: (String, String),
        rail: RailId,
        time: Time,
    },
    Snapshot(Snapshot),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Departed { name, time, .. } => write!(f, "DEPARTED: {} at {}", name, time),
            Event::Arrived { name, time, .. } => write!(f, "ARRIVED: {} at {}", name, time),
            Event::Collision { names, .. } => write!(f, "COLLISION: {} and {}", names.0, names.1),
            Event::Snapshot(s) => write!(
                f,
                "[{}] {} {}-{} {:.2}km {}",
                s.time, s.train_name, s.start_node, s.end_node, s.distance_remaining, s.state
            ),
        }
    }
}

/// Receiver of simulation events. Any `FnMut(&Event)` closure is an observer.
pub trait Observer {
    fn notify(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> Observer for F {
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}

pub type ObserverId = usize;

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogger;

impl Observer for EventLogger {
    fn notify(&mut self, event: &Event) {
        match event {
            Event::Collision { .. } => warn!("{}", event),
            Event::Snapshot(_) => trace!("{}", event),
            _ => info!("{}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_descriptions() {
        let collision = Event::Collision {
            first: 0,
            second: 1,
            names: ("TrainAB".to_string(), "TrainBA".to_string()),
            rail: 3,
            time: Time::new(9, 15),
        };
        assert_eq!(collision.to_string(), "COLLISION: TrainAB and TrainBA");

        let arrived = Event::Arrived {
            train: 0,
            name: "TrainAB".to_string(),
            time: Time::new(9, 15),
        };
        assert_eq!(arrived.to_string(), "ARRIVED: TrainAB at 09h15");
    }

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &Event| seen.push(e.to_string());
            observer.notify(&Event::Departed {
                train: 2,
                name: "T".to_string(),
                time: Time::new(6, 0),
            });
        }
        assert_eq!(seen, vec!["DEPARTED: T at 06h00"]);
    }
}
