//! Tropical cyclone impact forecast.
//!
//! Computes the exposed population and displacement for every storm with a wind field in the
//! current (or previous) forecast cycle, and saves summaries, maps and histograms.
use chrono::Utc;
use clap::{crate_version, App, Arg, ArgMatches};
use pbr::ProgressBar;
use std::{error::Error, path::PathBuf};
use tcimpact::{
    config::{default_root, DEFAULT_ENGINE},
    init_logging, parse_timestamp,
    pipeline::{ImpactOptions, ImpactRunner, StepResult},
    plot::histogram::{Histogram, NUM_BINS},
    Catalog, CommandEngine, Lookup, MissingDatasetDb, Paths,
};

mod report;

fn main() {
    if let Err(e) = run() {
        println!("error: {}", e);

        let mut err = &*e;

        while let Some(cause) = err.source() {
            println!("caused by: {}", cause);
            err = cause;
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    init_logging("info");

    let matches = parse_args();

    let root = matches
        .value_of("root")
        .map(PathBuf::from)
        .or_else(default_root)
        .ok_or("Unable to find a home directory for the default root.")?;
    let paths = Paths::new(root);

    let now = match matches.value_of("now") {
        Some(ts) => parse_timestamp(ts)?,
        None => Utc::now(),
    };

    let engine = CommandEngine::new(
        matches.value_of("engine").unwrap_or(DEFAULT_ENGINE),
        matches
            .values_of("engine-arg")
            .map(|vals| vals.map(ToOwned::to_owned).collect())
            .unwrap_or_default(),
    );

    std::fs::create_dir_all(paths.root())?;
    let missing = MissingDatasetDb::open_or_create(&paths.missing_db())?;
    let catalog = Catalog::new();

    let options = ImpactOptions {
        plots: !matches.is_present("no-plots"),
        now,
    };
    let runner = ImpactRunner::new(&engine, &catalog, Some(&missing), &paths, options);

    let (cycle, hazards) = match runner.locate()? {
        (_, Lookup::Found(hazards)) => (hazards.cycle, hazards.files),
        (cycle, Lookup::NotFound(_)) => {
            println!("No TC activities at {}.", cycle);
            return Ok(());
        }
    };

    let mut results: Vec<StepResult> = vec![];
    let mut pb = ProgressBar::new(hazards.len() as u64);
    for hazard in &hazards {
        for step_result in runner.run_storm(hazard, cycle)? {
            if !matches!(step_result, StepResult::Success { .. }) {
                print!("\u{001b}[300D\u{001b}[K");
                println!("{}", step_result);
            }
            results.push(step_result);
        }
        pb.inc();
    }
    pb.finish();
    println!();

    if matches.is_present("print") {
        for step_result in &results {
            if let StepResult::Success {
                files, at_event, ..
            } = step_result
            {
                println!("{}", step_result);
                for file in files {
                    println!("  {}", file.display());
                }
                Histogram::from_values(at_event, NUM_BINS).print_chart();
            }
        }
    }

    report::print_summaries(cycle, &results)?;

    Ok(())
}

fn parse_args() -> ArgMatches<'static> {
    App::new("tcimpact")
        .author("Ryan <rnleach@users.noreply.github.com>")
        .version(crate_version!())
        .about("Forecast the impact of tropical cyclones.")
        .arg(
            Arg::with_name("now")
                .long("now")
                .takes_value(true)
                .help("Run as if it were this time (UTC). YYYY-MM-DD-HH")
                .long_help(concat!(
                    "Run as if it were this time, which selects the forecast cycle. Format is ",
                    "YYYY-MM-DD-HH, YYYY-MM-DD HH:MM or RFC 3339. Defaults to now."
                )),
        )
        .arg(
            Arg::with_name("no-plots")
                .long("no-plots")
                .takes_value(false)
                .help("Skip the map and histogram images."),
        )
        .arg(
            Arg::with_name("print")
                .short("p")
                .long("print")
                .takes_value(false)
                .help("List every file written.")
                .long_help(concat!(
                    "List every file written and draw the distribution of the impact over the ",
                    "ensemble members in the terminal."
                )),
        )
        .arg(
            Arg::with_name("engine")
                .long("engine")
                .takes_value(true)
                .help("The hazard engine program.")
                .long_help(concat!(
                    "The program that decodes forecasts and computes wind fields and impacts. ",
                    "Defaults to climada-engine on the PATH."
                )),
        )
        .arg(
            Arg::with_name("engine-arg")
                .long("engine-arg")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .allow_hyphen_values(true)
                .help("Argument passed to the engine before the operation.")
                .long_help(concat!(
                    "Argument passed to the hazard engine program before the name of the ",
                    "operation, e.g. the script when the engine is an interpreter. Repeat for ",
                    "several arguments."
                )),
        )
        .arg(
            Arg::with_name("root")
                .short("r")
                .long("root")
                .takes_value(true)
                .help("Set the root of the archive.")
                .long_help(concat!(
                    "Set the root directory of the archive. Wind fields are read from the ",
                    "tc_wind directory under it and products are written to output. Defaults to ",
                    "~/tc_impact."
                )),
        )
        .get_matches()
}
