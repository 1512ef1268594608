use crate::error::OutputError;
use crate::observer::{Event, Observer, Snapshot};
use crate::simulation::TrainSummary;
use crate::train::TrainId;
use log::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use velcro::iter;

/// Upper bound on the cells drawn for one rail.
pub const MAX_GRAPH_CELLS: usize = 50;

/// Collects the snapshot stream of a run and writes one `.result` file per
/// train.
#[derive(Debug, Default)]
pub struct ResultWriter {
    snapshots: BTreeMap<TrainId, Vec<Snapshot>>,
}

impl ResultWriter {
    pub fn new() -> ResultWriter {
        Default::default()
    }

    pub fn snapshots(&self, train: TrainId) -> &[Snapshot] {
        self.snapshots
            .get(&train)
            .map(|s| s.as_slice())
            .unwrap_or_default()
    }

    /// `<name>_<HHhMM>.result`, after the scheduled departure.
    pub fn file_name(summary: &TrainSummary) -> String {
        format!("{}_{}.result", summary.name, summary.scheduled_departure)
    }

    pub fn render(&self, summary: &TrainSummary) -> String {
        let travel = summary
            .travel_minutes
            .map(format_duration)
            .unwrap_or_else(|| "--h--".to_string());
        let lines = iter![
            format!("Train: {}", summary.name),
            format!("Final travel time: {}", travel),
            String::new(),
            ..self.snapshots(summary.train).iter().map(snapshot_line)
        ];
        let mut text = lines.collect::<Vec<_>>().join("\n");
        text.push('\n');
        text
    }

    /// Writes every train's file into `dir`, creating it if needed.
    pub fn write_all(
        &self,
        dir: &Path,
        summaries: &[TrainSummary],
    ) -> Result<Vec<PathBuf>, OutputError> {
        let _h = hprof::enter("write results");
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| OutputError::Io { path, source }
        };
        std::fs::create_dir_all(dir).map_err(io_err(dir))?;

        let mut written = Vec::new();
        for summary in summaries {
            let path = dir.join(ResultWriter::file_name(summary));
            std::fs::write(&path, self.render(summary)).map_err(io_err(path.as_path()))?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

impl Observer for ResultWriter {
    fn notify(&mut self, event: &Event) {
        if let Event::Snapshot(s) = event {
            self.snapshots.entry(s.train).or_default().push(s.clone());
        }
    }
}

/// `HHhMM` for a span of minutes; hours are not wrapped at 24.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{:02}h{:02}", minutes / 60, minutes % 60)
}

pub fn snapshot_line(s: &Snapshot) -> String {
    format!(
        "[{}] - [{:<10}][{:<10}] - [{:.2}km] - [{:>8}] - {}",
        s.time,
        s.start_node,
        s.end_node,
        s.distance_remaining,
        s.state.label(),
        segment_graph(s)
    )
}

/// One cell per km of the current rail, between 1 and [`MAX_GRAPH_CELLS`]
/// cells: `[x]` is the train itself, `[O]` another train, `[ ]` free track.
pub fn segment_graph(s: &Snapshot) -> String {
    let cells = (s.rail_length as usize).clamp(1, MAX_GRAPH_CELLS);
    let cell = |km: f64| {
        let fraction = (km / s.rail_length).clamp(0.0, 1.0);
        ((fraction * cells as f64) as usize).min(cells - 1)
    };
    let me = cell(s.distance_on_rail);
    let others = s.other_trains.iter().map(|km| cell(*km)).collect::<Vec<_>>();

    (0..cells)
        .map(|i| {
            if i == me {
                "[x]"
            } else if others.contains(&i) {
                "[O]"
            } else {
                "[ ]"
            }
        })
        .collect()
}
