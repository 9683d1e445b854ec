use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use instant::Duration;

use crossfill::backtracking_search::{find_fill, FillFailure, SearchLimits};
use crossfill::grid_config::load_grid_config;
use crossfill::render::{is_image_path, render_grid, save_image};
use crossfill::word_list::WordList;
use crossfill::Error;

/// Fill a crossword structure with words from a word list.
#[derive(Parser, Debug)]
#[command(name = "crossfill", version)]
struct Args {
    /// Structure file: one row per line, `_` for fillable cells, anything else for blocks
    structure: PathBuf,

    /// Word list file, one word per line
    words: PathBuf,

    /// Also save the filled grid here: as an image for .png, .bmp, .jpg or .jpeg, as text otherwise
    output: Option<PathBuf>,

    /// Give up after this many backtracks
    #[arg(long)]
    max_backtracks: Option<u64>,

    /// Give up after this many seconds of filling
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print fill statistics after the grid
    #[arg(long)]
    stats: bool,
}

fn run(args: &Args) -> Result<ExitCode, Error> {
    let grid_config = load_grid_config(&args.structure)?;
    let word_list = WordList::load(&args.words)?;

    let limits = SearchLimits {
        max_backtracks: args.max_backtracks,
        timeout: args.timeout_secs.map(Duration::from_secs),
    };

    let (statistics, exit_code) = match find_fill(&grid_config, &word_list, &limits) {
        Ok(result) => {
            let display_grid = render_grid(&grid_config, &word_list, &result.assignment);
            println!("{}", display_grid);

            match &args.output {
                Some(output) if is_image_path(output) => {
                    save_image(&grid_config, &word_list, &result.assignment, output)?;
                }
                Some(output) => {
                    fs::write(output, display_grid + "\n")
                        .map_err(|source| Error::Io { path: output.clone(), source })?;
                }
                None => {}
            }

            (result.statistics, ExitCode::SUCCESS)
        }
        Err(FillFailure::NoSolution { statistics }) => {
            println!("No solution.");
            (statistics, ExitCode::SUCCESS)
        }
        Err(failure @ FillFailure::LimitExceeded { .. }) => {
            println!("Gave up: {failure}");
            (failure.statistics().clone(), ExitCode::from(2))
        }
    };

    if args.stats {
        println!("{:?}", statistics);
    }

    Ok(exit_code)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(err) => {
            eprintln!("crossfill: {err}");
            ExitCode::FAILURE
        }
    }
}
