use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use gridpath::pathfinder::Grid2DAStarSearch;
use gridpath::problem::Problem;
use gridpath::problems::grid_2d::Cell;
use gridpath::problems::grid_2d::Grid2DProblem;
use gridpath::problems::grid_2d::Grid2DSpace;

const SIZES: [(usize, usize); 3] = [(32, 32), (128, 128), (512, 256)];
const WALL_PROBABILITY: f64 = 0.25;

fn astar(problem: Grid2DProblem) -> usize {
    let mut search = Grid2DAStarSearch::new(problem);
    search.find_path().map_or(0, |path| path.len())
}

fn open_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid2D open");

    for (x, y) in SIZES {
        let Ok(space) = Grid2DSpace::new_empty_with_dimensions(x, y) else {
            continue;
        };
        let (Some(start), Some(goal)) = (Cell::new(0, 0), Cell::new_from_usize(x - 1, y - 1)) else {
            continue;
        };
        let problem = Grid2DProblem::new(&space, start, goal);

        group.bench_with_input(BenchmarkId::new("A*", format!("{x}x{y}")), &problem, |b, p| {
            b.iter(|| astar(*p))
        });
    }
    group.finish();
}

fn random_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid2D random");

    for (x, y) in SIZES {
        for i in 0..3 {
            let mut rng = ChaCha8Rng::seed_from_u64(i);
            let Ok(space) = Grid2DSpace::random(&mut rng, x, y, WALL_PROBABILITY) else {
                continue;
            };
            let origin = Cell::new(0, 0).unwrap();
            let base = Grid2DProblem::new(&space, origin, origin);
            let Some(problem) = base.randomize(&mut rng) else {
                log::warn!("Skipping {x}x{y}:{i}, no free cells");
                continue;
            };

            group.bench_with_input(
                BenchmarkId::new("A*", format!("{x}x{y}:{i}")),
                &problem,
                |b, p| b.iter(|| astar(*p)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, open_grid, random_grid);
criterion_main!(benches);
