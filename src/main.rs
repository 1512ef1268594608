use log::*;
use railsim::input;
use railsim::output::format_duration;
use railsim::{
    Error, Event, EventLogger, Observer, ResultWriter, RunOutcome, Simulation, SimulationConfig,
    TrainSummary,
};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "railsim", about = "Railway network simulator.")]
struct Opt {
    /// Network file with Node and Rail lines
    #[structopt(name = "NETWORK")]
    #[structopt(parse(from_os_str))]
    network: PathBuf,

    /// Train roster, one train per line
    #[structopt(name = "TRAINS")]
    #[structopt(parse(from_os_str))]
    trains: PathBuf,

    /// Directory receiving one .result file per train
    #[structopt(short, long, default_value = ".")]
    #[structopt(parse(from_os_str))]
    output_dir: PathBuf,

    /// JSON file with simulation settings
    #[structopt(long)]
    #[structopt(parse(from_os_str))]
    config: Option<PathBuf>,

    /// Step length in minutes, overrides the config file
    #[structopt(long)]
    step_minutes: Option<u32>,

    /// Step ceiling, overrides the config file
    #[structopt(long)]
    max_steps: Option<usize>,

    /// Activate debug mode
    #[structopt(short, long)]
    verbose: bool,
}

fn main() {
    let _h1 = hprof::enter("init");

    let opt = Opt::from_args();
    let level = if opt.verbose {
        if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    } else {
        LevelFilter::Error
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("Could not install logger: {}", e);
    }
    info!("{:#?}", opt);
    drop(_h1);

    let result = run(&opt);

    hprof::end_frame();
    if opt.verbose {
        hprof::profiler().print_timing();
    }

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn settings(opt: &Opt) -> Result<SimulationConfig, Error> {
    let mut config = match &opt.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(step_minutes) = opt.step_minutes {
        config.step_minutes = step_minutes;
    }
    if let Some(max_steps) = opt.max_steps {
        config.max_steps = max_steps;
    }
    config.validate()?;
    Ok(config)
}

fn run(opt: &Opt) -> Result<(), Error> {
    let config = settings(opt)?;
    let network = input::load_network(&opt.network)?;
    let trains = input::load_trains(&opt.trains, &network)?;

    let mut writer = ResultWriter::new();
    let (report, summaries) = {
        let mut sim = Simulation::new(network, config)?;
        for train in trains {
            sim.add_train(train)?;
        }
        sim.attach(EventLogger);
        sim.attach(|e: &Event| writer.notify(e));
        let report = sim.run()?;
        (report, sim.summaries())
    };

    let written = writer.write_all(&opt.output_dir, &summaries)?;
    for path in written.iter() {
        debug!("Result file {}", path.display());
    }

    for summary in summaries.iter() {
        println!("{}", describe(summary));
    }
    match report.outcome {
        RunOutcome::Completed => println!(
            "All trains arrived after {} steps, at {}.",
            report.steps, report.final_time
        ),
        RunOutcome::CeilingReached => println!(
            "Stopped after {} steps at {} with trains still under way.",
            report.steps, report.final_time
        ),
    }
    Ok(())
}

fn describe(s: &TrainSummary) -> String {
    let trip = match (s.departed_at, s.arrived_at, s.travel_minutes) {
        _ if !s.reachable => "destination unreachable".to_string(),
        (_, Some(arrived), Some(minutes)) => format!(
            "scheduled {}, arrived {}, travel time {}",
            s.scheduled_departure,
            arrived,
            format_duration(minutes)
        ),
        (Some(departed), _, _) => format!("departed {}, did not arrive", departed),
        _ => format!("scheduled {}, did not depart", s.scheduled_departure),
    };
    if s.collided {
        format!("{}: {} (collided)", s.name, trip)
    } else {
        format!("{}: {}", s.name, trip)
    }
}
