//! Tropical cyclone track overview.
//!
//! Draws the tracks of every named storm in the latest forecast on a world map, as a PNG and as an
//! interactive HTML page.
use chrono::Utc;
use clap::{crate_version, App, Arg, ArgMatches};
use metfor::{Knots, MetersPSec, Quantity};
use std::{error::Error, path::PathBuf};
use tcimpact::{
    category::Category,
    config::{default_root, DEFAULT_ENGINE},
    init_logging,
    pipeline::{prepare_tracks, render_track_overview},
    CommandEngine, ForecastCycle, ForecastEnsemble, HazardEngine, Paths, TablePrinter,
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

    let fcast = match matches.value_of("tracks") {
        Some(path) => ForecastEnsemble::load(&PathBuf::from(path))?,
        None => CommandEngine::new(
            matches.value_of("engine").unwrap_or(DEFAULT_ENGINE),
            matches
                .values_of("engine-arg")
                .map(|vals| vals.map(ToOwned::to_owned).collect())
                .unwrap_or_default(),
        )
        .fetch_forecast()?,
    };

    let overview = render_track_overview(&fcast, &paths, ForecastCycle::containing(&Utc::now()))?;

    println!(
        "Forecast time: {}",
        overview.cycle.time().format("%Y-%m-%d %H:%M UTC")
    );
    println!("Current number of active storms: {}", overview.num_storms);
    if overview.num_storms > 0 {
        print_storm_table(&prepare_tracks(&fcast))?;
    }
    println!("Success for {}.", overview.png.display());
    println!("Success for {}.", overview.html.display());

    Ok(())
}

fn print_storm_table(fcast: &ForecastEnsemble) -> Result<(), Box<dyn Error>> {
    let mut tp = TablePrinter::new()
        .with_title("Active storms".to_owned())
        .with_empty_columns(&["Storm", "ID", "Members", "Peak (m/s)", "Peak (kt)", "Category"]);

    for name in fcast.storm_names() {
        let storm = fcast.subset_by_name(name);

        let sid = storm
            .members
            .first()
            .map(|m| m.sid.clone())
            .unwrap_or_default();

        let peak = storm
            .members
            .iter()
            .flat_map(|m| m.points.iter())
            .map(|p| p.max_sustained_wind)
            .fold(std::f64::NAN, f64::max);

        let (peak_ms, peak_kt, category) = if peak.is_nan() {
            ("-".to_owned(), "-".to_owned(), "-".to_owned())
        } else {
            (
                format!("{:.1}", peak),
                format!("{:.0}", Knots::from(MetersPSec(peak)).unpack()),
                Category::from_wind_speed(peak)
                    .map(|cat| cat.name().to_owned())
                    .unwrap_or_else(|| "-".to_owned()),
            )
        };

        tp.add_row(vec![
            name.to_owned(),
            sid,
            storm.members.len().to_string(),
            peak_ms,
            peak_kt,
            category,
        ]);
    }

    tp.print()?;

    Ok(())
}

fn parse_args() -> ArgMatches<'static> {
    App::new("tctracks")
        .author("Ryan <rnleach@users.noreply.github.com>")
        .version(crate_version!())
        .about("Draw the forecast tracks of the active storms.")
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
                .help("Argument passed to the engine before the operation."),
        )
        .arg(
            Arg::with_name("root")
                .short("r")
                .long("root")
                .takes_value(true)
                .help("Set the root of the archive.")
                .long_help(concat!(
                    "Set the root directory of the archive. Maps are written to ",
                    "output/<cycle> under it. Defaults to ~/tc_impact."
                )),
        )
        .get_matches()
}
