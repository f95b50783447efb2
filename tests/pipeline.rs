use chrono::{DateTime, Duration, TimeZone, Utc};
use std::{
    cell::{Cell, RefCell},
    fs::{self, File},
    path::{Path, PathBuf},
};
use tcimpact::{
    catalog::{DataTypeInfo, DatasetFile},
    engine::WindFieldRequest,
    impf::ImpactFunction,
    locate::hazard_file_name,
    output::{read_summary_geojson, track_overview_html_name, track_overview_png_name},
    pipeline::{
        compute_wind_fields, fetch_dataset, render_track_overview, ImpactOptions, ImpactRunner,
        StepResult,
    },
    tracks::{TrackMember, TrackPoint},
    Country, DatasetInfo, DatasetQuery, DatasetSource, ExposurePoint, ForecastCycle,
    ForecastEnsemble, HazardEngine, ImpactResult, Lookup, MissingDatasetDb, Paths, Result,
    TcImpactErr,
};

/// Impact per ensemble member for a country and impact function kind.
type ImpactTable = Vec<(&'static str, &'static str, Vec<f64>)>;

struct FakeEngine {
    forecast: ForecastEnsemble,
    countries: Vec<Country>,
    impacts: ImpactTable,
    wind_requests: RefCell<Vec<WindFieldRequest>>,
}

impl FakeEngine {
    fn new(countries: &[(u16, &str)], impacts: ImpactTable) -> Self {
        FakeEngine {
            forecast: ForecastEnsemble::default(),
            countries: countries
                .iter()
                .map(|&(iso3num, iso3)| Country {
                    iso3num,
                    iso3: iso3.to_owned(),
                })
                .collect(),
            impacts,
            wind_requests: RefCell::new(vec![]),
        }
    }
}

impl HazardEngine for FakeEngine {
    fn fetch_forecast(&self) -> Result<ForecastEnsemble> {
        Ok(self.forecast.clone())
    }

    fn wind_field(&self, req: &WindFieldRequest) -> Result<()> {
        File::create(&req.output)?;
        self.wind_requests.borrow_mut().push(req.clone());
        Ok(())
    }

    fn countries(&self, _hazard: &Path) -> Result<Vec<Country>> {
        Ok(self.countries.clone())
    }

    fn impact(
        &self,
        _hazard: &Path,
        exposure: &Path,
        impf: &ImpactFunction,
    ) -> Result<ImpactResult> {
        let kind = match impf {
            ImpactFunction::Step { .. } => "step",
            ImpactFunction::Emanuel { .. } => "emanuel",
        };
        let exposure_name = exposure
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let at_event = self
            .impacts
            .iter()
            .find(|(iso3, k, _)| exposure_name.contains(iso3) && *k == kind)
            .map(|(_, _, vals)| vals.clone())
            .unwrap_or_else(|| vec![0.0; 10]);

        Ok(ImpactResult {
            frequency: vec![1.0 / 51.0; at_event.len()],
            eai_exp: vec![ExposurePoint {
                lon: -82.5,
                lat: 27.9,
                value: at_event.iter().sum::<f64>() / 51.0,
            }],
            at_event,
        })
    }
}

/// Publishes a dataset for every country code it knows, and the global centroids.
struct FakeSource {
    countries: Vec<(u16, &'static str)>,
    queries: RefCell<Vec<String>>,
    /// Number of centroid queries to answer with nothing before the centroids turn up.
    centroid_outages: Cell<u32>,
}

impl FakeSource {
    fn new(countries: &[(u16, &'static str)]) -> Self {
        FakeSource {
            countries: countries.to_vec(),
            queries: RefCell::new(vec![]),
            centroid_outages: Cell::new(0),
        }
    }

    fn num_queries(&self) -> usize {
        self.queries.borrow().len()
    }

    fn dataset(data_type: &str, name: String) -> DatasetInfo {
        DatasetInfo {
            uuid: format!("uuid-{}", name),
            data_type: DataTypeInfo {
                data_type: data_type.to_owned(),
                data_type_group: None,
            },
            files: vec![DatasetFile {
                url: format!("https://example.invalid/{}.hdf5", name),
                file_name: format!("{}.hdf5", name),
                file_format: None,
                file_size: None,
                check_sum: None,
            }],
            name,
            version: None,
            status: None,
            properties: Default::default(),
        }
    }
}

impl DatasetSource for FakeSource {
    fn find_dataset(&self, query: &DatasetQuery) -> Result<Lookup<DatasetInfo>> {
        self.queries.borrow_mut().push(query.key());

        if query.data_type == "centroids" {
            let outages = self.centroid_outages.get();
            if outages > 0 {
                self.centroid_outages.set(outages - 1);
                return Ok(Lookup::NotFound(format!("no dataset matches {}", query)));
            }
            return Ok(Lookup::Found(Self::dataset(
                "centroids",
                "earth_centroids_150asland_1800asoceans".to_owned(),
            )));
        }

        let code = query.properties.get("country_iso3num").cloned();
        let found = self
            .countries
            .iter()
            .find(|(num, _)| Some(num.to_string()) == code);

        Ok(match found {
            Some((_, iso3)) => Lookup::Found(Self::dataset(
                "litpop",
                format!("LitPop_pop_150arcsec_{}", iso3),
            )),
            None => Lookup::NotFound(format!("no dataset matches {}", query)),
        })
    }

    fn download(&self, info: &DatasetInfo, data_dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = info.local_dir(data_dir);
        fs::create_dir_all(&dir)?;
        info.files
            .iter()
            .map(|f| -> Result<PathBuf> {
                let path = dir.join(&f.file_name);
                File::create(&path)?;
                Ok(path)
            })
            .collect()
    }
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn cycle(s: &str) -> ForecastCycle {
    s.parse().unwrap()
}

fn touch_hazard(paths: &Paths, storm: &str, cycle: ForecastCycle) {
    fs::create_dir_all(paths.tc_wind_dir()).unwrap();
    File::create(paths.tc_wind_dir().join(hazard_file_name(storm, cycle))).unwrap();
}

fn member(name: &str, sid: &str, number: u32, winds: &[f64]) -> TrackMember {
    let run = utc(2024, 10, 7, 12, 0);
    TrackMember {
        name: name.to_owned(),
        sid: sid.to_owned(),
        ensemble_number: number,
        is_ensemble: true,
        run_datetime: run,
        points: winds
            .iter()
            .enumerate()
            .map(|(i, &w)| TrackPoint {
                time: run + Duration::hours(12 * i as i64),
                lon: -90.0 + 2.0 * i as f64,
                lat: 22.0 + i as f64,
                max_sustained_wind: w,
                central_pressure: Some(990.0 - 5.0 * i as f64),
            })
            .collect(),
    }
}

#[test]
fn test_impacts_for_every_country() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let now = utc(2024, 8, 25, 2, 0);
    touch_hazard(&paths, "Milton", cycle("2024-08-25_00UTC"));

    let engine = FakeEngine::new(
        &[(840, "USA"), (192, "CUB"), (574, "NFK"), (900, "ZZZ")],
        vec![
            ("USA", "step", vec![1000.0, 2000.0, 3000.0]),
            ("USA", "emanuel", vec![100.0, 200.0]),
            ("CUB", "emanuel", vec![50.0]),
            ("ZZZ", "step", vec![10.0]),
        ],
    );
    let source = FakeSource::new(&[(840, "USA"), (192, "CUB"), (900, "ZZZ")]);
    let db = MissingDatasetDb::open_or_create(&paths.missing_db()).unwrap();

    let runner = ImpactRunner::new(
        &engine,
        &source,
        Some(&db),
        &paths,
        ImpactOptions { plots: true, now },
    );

    let (current, found) = runner.locate().unwrap();
    assert_eq!(current, cycle("2024-08-25_00UTC"));
    let hazards = found.found().unwrap();
    assert_eq!(hazards.files.len(), 1);

    let results = runner.run_storm(&hazards.files[0], hazards.cycle).unwrap();
    let outcome: Vec<String> = results
        .iter()
        .map(|res| match res {
            StepResult::Success { summary, .. } => {
                format!("ok {} {}", summary.country_iso3, summary.impact_type)
            }
            StepResult::NoExposure { country, .. } => format!("no exposure {}", country),
            StepResult::ZeroImpact {
                country,
                impact_type,
                ..
            } => format!("zero {} {}", country, impact_type),
            StepResult::NoImpactFunction { country, .. } => format!("no impf {}", country),
        })
        .collect();

    assert_eq!(
        outcome,
        vec![
            "ok USA exposed_population_32.92ms",
            "ok USA displacement",
            // Nobody exposed, so displacement is not tried even though it would be non-zero.
            "zero CUB exposed_population_32.92ms",
            "no exposure NFK",
            "ok ZZZ exposed_population_32.92ms",
            "no impf ZZZ",
        ]
    );

    let out_dir = paths.output_dir().join("2024-08-25_00UTC");
    let stem = "TC_ECMWF_ens_Milton_2024-08-25_00UTC_USA_displacement";
    for name in &[
        format!("impact-summary_{}.json", stem),
        format!("impact-summary_{}.csv", stem),
        format!("impact-gdf_{}.geojson", stem),
        format!("impact-map_{}.png", stem),
        format!("impact-histogram_{}.png", stem),
    ] {
        assert!(out_dir.join(name).exists(), "missing {}", name);
    }

    let summary = read_summary_geojson(&out_dir.join(format!("impact-summary_{}.json", stem)))
        .unwrap()
        .remove(0);
    assert!((summary.mean - 300.0 / 51.0).abs() < 1.0e-9);
    assert_eq!(summary.median, 0.0);
    assert_eq!(summary.initialization_time, "2024-08-25_00UTC");

    // The country without data is remembered.
    let key = DatasetQuery::litpop_population(574).key();
    assert!(db.is_missing(&key, now).unwrap());
}

#[test]
fn test_missing_datasets_not_requested_again() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let now = utc(2024, 8, 25, 2, 0);
    touch_hazard(&paths, "Milton", cycle("2024-08-25_00UTC"));

    let engine = FakeEngine::new(&[(574, "NFK")], vec![]);
    let source = FakeSource::new(&[]);
    let db = MissingDatasetDb::open_or_create(&paths.missing_db()).unwrap();
    let options = ImpactOptions { plots: false, now };
    let runner = ImpactRunner::new(&engine, &source, Some(&db), &paths, options);

    let hazard = runner.locate().unwrap().1.found().unwrap();
    runner.run_storm(&hazard.files[0], hazard.cycle).unwrap();
    assert_eq!(source.num_queries(), 1);

    let results = runner.run_storm(&hazard.files[0], hazard.cycle).unwrap();
    assert_eq!(source.num_queries(), 1);
    assert!(matches!(results[0], StepResult::NoExposure { .. }));
}

#[test]
fn test_previous_cycle_and_no_plots() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    touch_hazard(&paths, "Kirk", cycle("2024-08-25_00UTC"));

    let engine = FakeEngine::new(&[(840, "USA")], vec![("USA", "step", vec![5.0])]);
    let source = FakeSource::new(&[(840, "USA")]);
    let options = ImpactOptions {
        plots: false,
        now: utc(2024, 8, 25, 13, 5),
    };
    let runner = ImpactRunner::new(&engine, &source, None, &paths, options);

    let (current, found) = runner.locate().unwrap();
    assert_eq!(current, cycle("2024-08-25_12UTC"));
    let hazards = found.found().unwrap();
    assert_eq!(hazards.cycle, cycle("2024-08-25_00UTC"));

    let results = runner.run_storm(&hazards.files[0], hazards.cycle).unwrap();
    match &results[0] {
        StepResult::Success {
            summary,
            files,
            at_event,
        } => {
            assert_eq!(at_event, &vec![5.0]);
            assert_eq!(summary.event_name, "Kirk");
            assert_eq!(summary.initialization_time, "2024-08-25_00UTC");
            assert_eq!(files.len(), 3);
            assert!(files.iter().all(|f| f.exists()));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_no_activity() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    touch_hazard(&paths, "Kirk", cycle("2024-08-24_00UTC"));

    let engine = FakeEngine::new(&[], vec![]);
    let source = FakeSource::new(&[]);
    let options = ImpactOptions {
        plots: true,
        now: utc(2024, 8, 25, 2, 0),
    };
    let runner = ImpactRunner::new(&engine, &source, None, &paths, options);

    let (current, found) = runner.locate().unwrap();
    assert_eq!(current.to_string(), "2024-08-25_00UTC");
    assert!(!found.is_found());
    assert!(!paths.output_dir().exists());
}

#[test]
fn test_wind_fields_for_named_storms() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());

    let fcast = ForecastEnsemble {
        run_datetime: None,
        members: vec![
            member("Milton", "14L", 1, &[44.0, 50.0]),
            member("90L", "90L", 1, &[15.0, 16.0]),
            member("Milton", "14L", 2, &[40.0, 48.0]),
        ],
    };

    let engine = FakeEngine::new(&[], vec![]);
    let source = FakeSource::new(&[]);
    let now = utc(2024, 10, 7, 14, 0);

    let winds = compute_wind_fields(&engine, &source, &fcast, &paths, now)
        .unwrap()
        .found()
        .unwrap();

    assert_eq!(winds.cycle, cycle("2024-10-07_12UTC"));
    assert_eq!(
        winds.hazards,
        vec![paths.tc_wind_dir().join("tc_wind_Milton_2024-10-07_12UTC.hdf5")]
    );
    assert!(winds.hazards[0].exists());

    let requests = engine.wind_requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].time_step_h, 0.5);
    assert_eq!(requests[0].ensemble_size, 51);
    assert_eq!(requests[0].model, "H1980");
    assert!(requests[0]
        .centroids
        .ends_with("earth_centroids_150asland_1800asoceans.hdf5"));

    let saved = ForecastEnsemble::load(&requests[0].tracks).unwrap();
    assert_eq!(saved.members.len(), 2);
    assert!(saved.members.iter().all(|m| m.name == "Milton"));
    assert!((saved.members[0].points[0].max_sustained_wind - 50.0).abs() < 1.0e-9);
}

#[test]
fn test_missing_centroids_fail_and_are_asked_for_again() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let fcast = ForecastEnsemble {
        run_datetime: None,
        members: vec![member("Milton", "14L", 1, &[44.0, 50.0])],
    };

    let engine = FakeEngine::new(&[], vec![]);
    let source = FakeSource::new(&[]);
    source.centroid_outages.set(1);
    let now = utc(2024, 10, 7, 14, 0);

    let res = compute_wind_fields(&engine, &source, &fcast, &paths, now);
    assert!(matches!(res, Err(TcImpactErr::RequiredDatasetMissing(_))));
    assert!(engine.wind_requests.borrow().is_empty());

    let later = now + Duration::days(7);
    let winds = compute_wind_fields(&engine, &source, &fcast, &paths, later).unwrap();
    assert!(winds.is_found());
    assert_eq!(source.num_queries(), 2);
    assert!(!paths.missing_db().exists());
}

#[test]
fn test_found_dataset_clears_stale_missing_entry() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let now = utc(2024, 10, 7, 14, 0);
    let query = DatasetQuery::litpop_population(840);

    let db = MissingDatasetDb::open_or_create(&paths.missing_db()).unwrap();
    db.add(&query.key(), now - Duration::days(31)).unwrap();
    assert!(db.is_missing(&query.key(), now - Duration::days(20)).unwrap());

    let source = FakeSource::new(&[(840, "USA")]);
    let exposure = fetch_dataset(&source, Some(&db), &query, &paths.data_dir(), now)
        .unwrap()
        .found()
        .unwrap();
    assert!(exposure.ends_with("LitPop_pop_150arcsec_USA.hdf5"));
    assert!(!db.is_missing(&query.key(), now - Duration::days(20)).unwrap());
}

#[test]
fn test_empty_forecast_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let engine = FakeEngine::new(&[], vec![]);
    let source = FakeSource::new(&[]);
    let now = utc(2024, 10, 7, 14, 0);

    let res =
        compute_wind_fields(&engine, &source, &ForecastEnsemble::default(), &paths, now).unwrap();
    assert!(!res.is_found());

    // Only unnamed systems.
    let invests = ForecastEnsemble {
        run_datetime: None,
        members: vec![member("90L", "90L", 1, &[15.0, 16.0])],
    };
    let res = compute_wind_fields(&engine, &source, &invests, &paths, now).unwrap();
    assert!(!res.is_found());

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(source.num_queries(), 0);
    assert!(engine.wind_requests.borrow().is_empty());
}

#[test]
fn test_track_overview() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let fallback = cycle("2024-10-08_00UTC");

    let empty = render_track_overview(&ForecastEnsemble::default(), &paths, fallback).unwrap();
    assert_eq!(empty.cycle, fallback);
    assert_eq!(empty.num_storms, 0);
    assert!(empty.png.exists());
    assert!(empty.html.exists());

    let fcast = ForecastEnsemble {
        run_datetime: None,
        members: vec![
            member("Milton", "14L", 1, &[44.0, 50.0, 60.0]),
            member("Leslie", "13L", 1, &[30.0, 33.0]),
            member("90L", "90L", 1, &[15.0, 16.0]),
        ],
    };
    let overview = render_track_overview(&fcast, &paths, fallback).unwrap();
    let c = cycle("2024-10-07_12UTC");
    assert_eq!(overview.cycle, c);
    assert_eq!(overview.num_storms, 2);
    assert_eq!(
        overview.png,
        paths.output_dir().join(c.to_string()).join(track_overview_png_name(c))
    );
    assert_eq!(
        overview.html,
        paths.output_dir().join(c.to_string()).join(track_overview_html_name(c))
    );
    assert!(overview.png.exists());
}
