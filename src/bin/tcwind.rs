//! Tropical cyclone wind fields.
//!
//! Computes the wind field of every named storm in the latest ensemble forecast and stores it in
//! the archive, ready for `tcimpact`.
use chrono::Utc;
use clap::{crate_version, App, Arg, ArgMatches};
use std::{error::Error, path::PathBuf};
use tcimpact::{
    config::{default_root, DEFAULT_ENGINE},
    init_logging,
    pipeline::compute_wind_fields,
    Catalog, CommandEngine, ForecastEnsemble, HazardEngine, Lookup, Paths,
};

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

    let engine = CommandEngine::new(
        matches.value_of("engine").unwrap_or(DEFAULT_ENGINE),
        matches
            .values_of("engine-arg")
            .map(|vals| vals.map(ToOwned::to_owned).collect())
            .unwrap_or_default(),
    );

    let fcast = match matches.value_of("tracks") {
        Some(path) => ForecastEnsemble::load(&PathBuf::from(path))?,
        None => engine.fetch_forecast()?,
    };

    let catalog = Catalog::new();

    match compute_wind_fields(&engine, &catalog, &fcast, &paths, Utc::now())? {
        Lookup::Found(winds) => {
            for hazard in &winds.hazards {
                println!("Success for {}.", hazard.display());
            }
            println!(
                "TC wind computation complete for {}, {} storms.",
                winds.cycle,
                winds.hazards.len()
            );
        }
        Lookup::NotFound(reason) => println!("No wind fields computed, {}.", reason),
    }

    Ok(())
}

fn parse_args() -> ArgMatches<'static> {
    App::new("tcwind")
        .author("Ryan <rnleach@users.noreply.github.com>")
        .version(crate_version!())
        .about("Compute wind fields for the storms in the latest forecast.")
        .arg(
            Arg::with_name("tracks")
                .short("t")
                .long("tracks")
                .takes_value(true)
                .help("Read the forecast tracks from a JSON file.")
                .long_help(concat!(
                    "Read the ensemble forecast tracks from a JSON file instead of asking the ",
                    "hazard engine for the latest forecast."
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
                    "Set the root directory of the archive. Wind fields are written to the ",
                    "tc_wind directory under it. Defaults to ~/tc_impact."
                )),
        )
        .get_matches()
}
