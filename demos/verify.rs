use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use abscheck_rs::controller::{Controller, TableController};
use abscheck_rs::plant::{Integration, LinearPlant, Pendulum, Plant};
use abscheck_rs::quantizer::Quantizer;
use abscheck_rs::specification::{ControlSpecification, Goal};
use abscheck_rs::vector::Vector;
use abscheck_rs::verifier::{Verifier, VerifierConfig};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum GoalArg {
    Invariance,
    Reachability,
    ReachAndStay,
}

impl From<GoalArg> for Goal {
    fn from(goal: GoalArg) -> Self {
        match goal {
            GoalArg::Invariance => Goal::Invariance,
            GoalArg::Reachability => Goal::Reachability,
            GoalArg::ReachAndStay => Goal::ReachAndStay,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum PlantArg {
    Oscillator,
    Pendulum,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Verification goal.
    #[arg(value_enum, default_value = "invariance")]
    goal: GoalArg,

    /// Plant to verify against.
    #[clap(long, value_enum, default_value = "oscillator")]
    plant: PlantArg,

    /// State cell width on both axes; must divide both axis widths.
    #[clap(long, value_name = "FLOAT", default_value = "0.1")]
    eta: f64,

    /// Proportional gain of the feedback policy `u = -k * velocity`.
    #[clap(long, value_name = "FLOAT", default_value = "0.5")]
    gain: f64,

    /// Flood-fill successors between evolved faces (linear plants only).
    #[clap(long)]
    refined: bool,

    /// Drop computed transitions before each materialization pass.
    #[clap(long)]
    no_retain: bool,

    /// Number of partitions (default: size of the rayon pool).
    #[clap(long, value_name = "INT")]
    workers: Option<usize>,

    /// Seed for sampling the losing-neighbor domain.
    #[clap(long, value_name = "INT", default_value = "42")]
    seed: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let plant: Box<dyn Plant> = match args.plant {
        PlantArg::Oscillator => Box::new(LinearPlant::new(
            vec![vec![0.0, 1.0], vec![-1.0, -1.0]],
            vec![vec![0.0], vec![1.0]],
            Integration::default(),
        )?),
        PlantArg::Pendulum => Box::new(Pendulum::default()),
    };

    let states = Quantizer::new([-5.0, -10.0].into(), [5.0, 10.0].into(), [args.eta, args.eta].into())?;
    let inputs = Quantizer::new([-1.25].into(), [1.25].into(), [0.5].into())?;
    println!(
        "{} state cells, {} input cells",
        states.cardinality(),
        inputs.cardinality()
    );

    let spec = ControlSpecification::new(args.goal.into(), [-1.0, -1.0].into(), [1.0, 1.0].into())?;
    let (lower, upper) = (inputs.lower()[0] + 0.25, inputs.upper()[0] - 0.25);
    let policy = TableController::from_fn(&states, spec, |x| {
        Vector::from([(-args.gain * x[1]).clamp(lower, upper)])
    });

    let mut config = VerifierConfig::default()
        .with_refined_transitions(args.refined)
        .with_retained_transitions(!args.no_retain);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let mut verifier = Verifier::new(plant.as_ref(), states, inputs, config)?;

    let time_verify = std::time::Instant::now();
    let report = verifier.verify(plant.as_ref(), &policy)?;
    println!(
        "Verified {} in {:.3}s",
        policy.specification().goal(),
        time_verify.elapsed().as_secs_f64()
    );
    println!("invariance scans: {:?}", report.invariance);
    println!("reachability scans: {:?}", report.reachability);

    let stats = verifier.statistics();
    println!(
        "winning: {} of {} ({:.2}%)",
        stats.winning,
        stats.cardinality,
        stats.winning_percentage()
    );
    println!(
        "transitions: {} (completeness {:.4})",
        stats.transitions_computed, stats.completeness
    );
    println!(
        "losing: {}, losing neighbors: {}",
        verifier.losing_indices().len(),
        verifier.losing_neighbor_indices().len()
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    for _ in 0..3 {
        println!("sample near boundary: {}", verifier.vector_from_losing_neighbor_domain(&mut rng));
    }

    println!("\nTotal time: {:.3}s", time_total.elapsed().as_secs_f64());

    Ok(())
}
