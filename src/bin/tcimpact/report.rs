use itertools::Itertools;
use std::error::Error;
use tcimpact::{pipeline::StepResult, summary::ENSEMBLE_SIZE, ForecastCycle, TablePrinter};

/// Print a table of every summary written, grouped by storm.
pub fn print_summaries(
    cycle: ForecastCycle,
    results: &[StepResult],
) -> Result<(), Box<dyn Error>> {
    let summaries: Vec<_> = results
        .iter()
        .filter_map(|res| match res {
            StepResult::Success { summary, .. } => Some(summary),
            _ => None,
        })
        .sorted_by(|a, b| {
            a.event_name
                .cmp(&b.event_name)
                .then_with(|| a.country_iso3.cmp(&b.country_iso3))
                .then_with(|| a.impact_type.cmp(&b.impact_type))
        })
        .collect();

    if summaries.is_empty() {
        println!("No impacts forecast at {}.", cycle);
        return Ok(());
    }

    let skipped = results.len() - summaries.len();

    let mut tp = TablePrinter::new()
        .with_title(format!("Impact forecast {}", cycle))
        .with_header(format!(
            "Ensemble statistics over {} members, in people.",
            ENSEMBLE_SIZE
        ))
        .with_empty_columns(&["Storm", "Country", "Impact", "Mean", "Median", "5%", "95%"])
        .with_footer(format!(
            "{} impacts, {} countries or impact types skipped.",
            summaries.len(),
            skipped
        ));

    for summary in summaries {
        tp.add_row(vec![
            summary.event_name.clone(),
            summary.country_iso3.clone(),
            summary.impact_type.clone(),
            format!("{:.0}", summary.mean),
            format!("{:.0}", summary.median),
            format!("{:.0}", summary.perc05),
            format!("{:.0}", summary.perc95),
        ]);
    }

    tp.print()?;

    Ok(())
}
