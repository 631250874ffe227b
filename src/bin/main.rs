use std::io::Write;
use std::process::ExitCode;

use anstream::print;
use anstream::println;
use clap::Parser;
use hrsw::Stopwatch;
use human_duration::human_duration;
use indoc::indoc;
use owo_colors::OwoColorize;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use tracing_subscriber::EnvFilter;

use gridpath::pathfinder::run_search;
use gridpath::problem::Problem;
use gridpath::problems::grid_2d::Cell;
use gridpath::problems::grid_2d::Grid2DProblem;
use gridpath::problems::grid_2d::Grid2DSpace;
use gridpath::render::Marker;
use gridpath::render::PathOverlay;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// The grid shown when no random grid is requested.
const DEMO_GRID: &str = indoc! {"
    ........
    ...#....
    ...#....
    ...#....
    ...#....
    ........
"};

/// Finds the shortest 4-connected path between two cells of a grid.
#[derive(Parser, Debug)]
#[clap(long_version = gridpath::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Start cell as `x,y`.
    #[arg(short, long, env = "GRIDPATH_START", default_value = "0,0")]
    pub start: Cell,
    /// Goal cell as `x,y`.
    #[arg(short, long, env = "GRIDPATH_GOAL", default_value = "7,5")]
    pub goal: Cell,

    /// Search a random grid instead of the demonstration one.
    #[arg(long)]
    pub random: bool,
    /// Pick random free endpoints on the random grid.
    #[arg(long, requires = "random")]
    pub random_endpoints: bool,
    #[arg(long, default_value_t = 32usize)]
    pub width: usize,
    #[arg(long, default_value_t = 16usize)]
    pub height: usize,
    /// Probability of a cell being a wall.
    #[arg(long, default_value_t = 0.25f64)]
    pub walls: f64,
    #[arg(long, env = "GRIDPATH_SEED", default_value_t = 0u64)]
    pub seed: u64,

    /// Print search statistics.
    #[arg(long)]
    pub stats: bool,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

fn print_overlay(overlay: &PathOverlay) {
    for row in overlay.rows() {
        for (i, marker) in row.iter().enumerate() {
            if i != 0 {
                print!(" ");
            }
            match marker {
                Marker::Start => print!("{}", marker.green().bold()),
                Marker::Goal => print!("{}", marker.red().bold()),
                Marker::Path => print!("{}", marker.yellow()),
                Marker::Wall => print!("{}", marker.bright_black()),
                Marker::Open => print!("{marker}"),
            }
        }
        println!();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.color.write_global();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridpath=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let space = if args.random {
        let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
        Grid2DSpace::random(&mut rng, args.width, args.height, args.walls)
    } else {
        Grid2DSpace::try_from(DEMO_GRID)
    };
    let space = match space {
        Ok(space) => space,
        Err(e) => {
            log::error!("Can't build the grid: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut problem = Grid2DProblem::new(&space, args.start, args.goal);
    if args.random_endpoints {
        let mut rng = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(1));
        match problem.randomize(&mut rng) {
            Some(p) => problem = p,
            None => {
                log::error!("Can't find free endpoints on the random grid");
                return ExitCode::FAILURE;
            }
        }
    }
    log::info!("Searching {problem}");

    let mut stopwatch = Stopwatch::new_started();
    let (path, search) = run_search(&space, problem.start(), problem.goal());
    stopwatch.stop();
    log::info!("Search took {}", human_duration(&stopwatch.elapsed()));

    if args.stats {
        let mut err = std::io::stderr().lock();
        let report = match &search {
            Some(search) => search.write_stats(&mut err),
            None => writeln!(err, "No search ran"),
        };
        if let Err(e) = report.and_then(|_| err.flush()) {
            log::warn!("Can't write statistics: {e}");
        }
    }

    match path {
        Ok(path) => {
            println!("Path found with {} steps:", path.len().bold());
            let cells = path.into_states();
            print_overlay(&PathOverlay::new(&space, &cells));

            print!("Path coordinates: ");
            for cell in &cells {
                print!("{cell} ");
            }
            println!();
            ExitCode::SUCCESS
        }
        Err(e) if e.is_invalid_input() => {
            println!("{}", format!("{e}").red());
            ExitCode::FAILURE
        }
        Err(e) => {
            println!("{}", "No path found!".red());
            log::info!("{e}");
            ExitCode::FAILURE
        }
    }
}
