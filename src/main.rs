use std::path::PathBuf;

use sparse_spmv::{
    bench::Benchmark,
    io::{load_json, load_matrix_market, save_json, Problem},
    multiply_on, multiply_parallel, multiply_sequential,
    utils::{random_sparse_matrix, random_sparse_vector, SeedAllocator},
    ParallelConfig, Schedule, SpmvError,
};
use structopt::StructOpt;

#[macro_use]
extern crate log;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "spmv",
    about = "Benchmark sequential and parallel sparse matrix times sparse vector"
)]
struct Opt {
    /// Matrix in matrix market format. A random matrix is generated when
    /// neither this nor --problem is given.
    #[structopt(long, parse(from_os_str))]
    matrix: Option<PathBuf>,

    /// Problem (matrix and vector) saved earlier with --save
    #[structopt(long, parse(from_os_str), conflicts_with = "matrix")]
    problem: Option<PathBuf>,

    /// Write the generated problem as json
    #[structopt(long, parse(from_os_str))]
    save: Option<PathBuf>,

    #[structopt(long, default_value = "20000")]
    rows: usize,

    #[structopt(long, default_value = "20000")]
    cols: usize,

    /// Probability of an entry in the random matrix being non-zero
    #[structopt(long, default_value = "0.001")]
    density: f64,

    /// Probability of an entry in the random vector being non-zero
    #[structopt(long, default_value = "0.1")]
    vector_density: f64,

    /// First seed handed out to the random generators
    #[structopt(long, default_value = "0")]
    seed: u64,

    #[structopt(short, long, default_value = "10")]
    iterations: usize,

    #[structopt(long, default_value = "1")]
    warmup: usize,

    /// Worker threads, defaults to the number of cpus
    #[structopt(short, long)]
    threads: Option<usize>,

    /// Row schedule for the configured pool. Options are:
    /// adaptive, static, dynamic
    #[structopt(short, long, default_value = "adaptive")]
    schedule: Schedule,

    #[structopt(long, default_value = "64")]
    chunk_size: usize,
}

fn load_problem(opt: &Opt) -> Result<Problem, SpmvError> {
    let seeds = SeedAllocator::starting_at(opt.seed);

    if let Some(path) = &opt.problem {
        info!("Loading problem from {}", path.display());
        return load_json(path);
    }

    let matrix = match &opt.matrix {
        Some(path) => load_matrix_market(path)?,
        None => {
            info!(
                "Generating {}x{} matrix with density {}",
                opt.rows, opt.cols, opt.density
            );
            random_sparse_matrix(opt.rows, opt.cols, opt.density, &seeds)
        }
    };
    let cols = matrix
        .rows()
        .iter()
        .filter_map(|r| r.entries.last_index())
        .max()
        .map_or(opt.cols, |last| opt.cols.max(last + 1));
    let vector = random_sparse_vector(cols, opt.vector_density, &seeds);

    Ok(Problem { matrix, vector })
}

fn main() -> Result<(), SpmvError> {
    pretty_env_logger::init();
    let opt = Opt::from_args();

    let problem = load_problem(&opt)?;
    if let Some(path) = &opt.save {
        save_json(&problem, path)?;
        info!("Saved problem to {}", path.display());
    }
    let Problem { matrix, vector } = &problem;
    info!(
        "A: {} stored rows, {} nnz; x: {} nnz",
        matrix.len(),
        matrix.nnz(),
        vector.len()
    );

    let mut config = ParallelConfig {
        schedule: opt.schedule,
        chunk_size: opt.chunk_size,
        ..ParallelConfig::default()
    };
    if let Some(threads) = opt.threads {
        config.threads = threads;
    }
    let pool = config.build_pool()?;

    let expected = multiply_sequential(matrix, vector);
    let got = multiply_on(&pool, matrix, vector, &config);
    if got != expected {
        let mismatches = got
            .iter()
            .zip(expected.iter())
            .filter(|(g, e)| g != e)
            .count()
            + got.len().abs_diff(expected.len());
        return Err(SpmvError::ResultMismatch {
            schedule: config.schedule.to_string(),
            mismatches,
            len: expected.len(),
        });
    }
    info!("result: {} nnz", expected.len());

    let mut bench = Benchmark::new();
    bench.run("sequential", opt.warmup, opt.iterations, || {
        Ok(multiply_sequential(matrix, vector))
    });
    bench.run("parallel (global pool)", opt.warmup, opt.iterations, || {
        Ok(multiply_parallel(matrix, vector))
    });
    for schedule in [Schedule::Adaptive, Schedule::Static, Schedule::Dynamic] {
        let config = ParallelConfig {
            schedule,
            ..config.clone()
        };
        let name = format!("{} x{}", schedule, pool.current_num_threads());
        bench.run(&name, opt.warmup, opt.iterations, || {
            Ok(multiply_on(&pool, matrix, vector, &config))
        });
    }

    Ok(())
}
