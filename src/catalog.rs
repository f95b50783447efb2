//! Client for the CLIMADA data API, where exposure and centroid datasets are published.
use crate::{
    error::{Result, TcImpactErr},
    lookup::Lookup,
};
use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const DATA_API_URL: &str = "https://climada.ethz.ch/data-api/v2/";

/// Criteria selecting a single dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetQuery {
    pub data_type: String,
    pub properties: BTreeMap<String, String>,
}

impl DatasetQuery {
    pub fn new(data_type: &str) -> Self {
        DatasetQuery {
            data_type: data_type.to_owned(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property<V: Display>(mut self, key: &str, value: V) -> Self {
        self.properties.insert(key.to_owned(), value.to_string());
        self
    }

    /// LitPop population counts for one country.
    pub fn litpop_population(iso3num: u16) -> Self {
        DatasetQuery::new("litpop")
            .with_property("country_iso3num", iso3num)
            .with_property("exponents", "(0,1)")
            .with_property("fin_mode", "pop")
            .with_property("version", "v2")
    }

    /// The global centroids the wind fields are computed on.
    pub fn global_centroids() -> Self {
        DatasetQuery::new("centroids")
            .with_property("res_arcsec_land", 150)
            .with_property("res_arcsec_ocean", 1800)
            .with_property("extent", "(-180, 180, -90, 90)")
    }

    /// A stable text form of the query, used as a cache key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    fn url_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("data_type".to_owned(), self.data_type.clone()),
            ("status".to_owned(), "active".to_owned()),
        ];
        params.extend(
            self.properties
                .iter()
                .map(|(k, v)| (format!("properties.{}", k), v.clone())),
        );
        params
    }
}

impl Display for DatasetQuery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.data_type)?;
        for (k, v) in &self.properties {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataTypeInfo {
    pub data_type: String,
    #[serde(default)]
    pub data_type_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetFile {
    pub url: String,
    pub file_name: String,
    #[serde(default)]
    pub file_format: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub check_sum: Option<String>,
}

/// A dataset as listed by the data API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetInfo {
    pub uuid: String,
    pub data_type: DataTypeInfo,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub files: Vec<DatasetFile>,
}

impl DatasetInfo {
    /// Directory the files of this dataset are stored in.
    pub fn local_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.data_type.data_type).join(&self.name)
    }
}

/// Reduce the datasets matching `query` to exactly one.
pub fn select_single(
    query: &DatasetQuery,
    mut matches: Vec<DatasetInfo>,
) -> Result<Lookup<DatasetInfo>> {
    match matches.len() {
        0 => Ok(Lookup::NotFound(format!("no dataset matches {}", query))),
        1 => Ok(Lookup::Found(matches.remove(0))),
        count => Err(TcImpactErr::AmbiguousDataset {
            query: query.to_string(),
            count,
        }),
    }
}

/// An existing, non-empty file of the expected size, when the size is known.
fn file_is_complete(path: &Path, expected_size: Option<u64>) -> bool {
    match fs::metadata(path) {
        Ok(md) => md.is_file() && md.len() > 0 && expected_size.map_or(true, |s| md.len() == s),
        Err(_) => false,
    }
}

fn save_response(mut response: Response, path: &Path) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let received = response.copy_to(&mut writer)?;
    writer.flush()?;
    Ok(received)
}

/// Where exposure and centroid datasets come from.
pub trait DatasetSource {
    fn find_dataset(&self, query: &DatasetQuery) -> Result<Lookup<DatasetInfo>>;

    /// Make every file of `info` available under `data_dir`, returning their local paths.
    fn download(&self, info: &DatasetInfo, data_dir: &Path) -> Result<Vec<PathBuf>>;
}

pub struct Catalog {
    client: Client,
    base_url: String,
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_base_url(DATA_API_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let mut base_url = base_url.to_owned();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Catalog {
            client: Client::new(),
            base_url,
        }
    }

    fn checked_get(&self, url: &str, params: &[(String, String)]) -> Result<Response> {
        let response = self.client.get(url).query(params).send()?;

        match response.status() {
            StatusCode::OK => Ok(response),
            code => Err(TcImpactErr::HttpStatus {
                url: url.to_owned(),
                status: code.as_u16(),
            }),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetSource for Catalog {
    fn find_dataset(&self, query: &DatasetQuery) -> Result<Lookup<DatasetInfo>> {
        let url = format!("{}dataset/", self.base_url);
        debug!("querying {} for {}", url, query);

        let matches: Vec<DatasetInfo> = self.checked_get(&url, &query.url_params())?.json()?;
        select_single(query, matches)
    }

    fn download(&self, info: &DatasetInfo, data_dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = info.local_dir(data_dir);
        fs::create_dir_all(&dir)?;

        let mut paths = Vec::with_capacity(info.files.len());
        for file in &info.files {
            let path = dir.join(&file.file_name);

            if file_is_complete(&path, file.file_size) {
                debug!("already have {}", path.display());
            } else {
                info!("downloading {}", file.url);
                let response = self.checked_get(&file.url, &[])?;

                // Only a complete transfer gets the real name.
                let part = dir.join(format!("{}.part", file.file_name));
                let received = match save_response(response, &part) {
                    Ok(received) => received,
                    Err(err) => {
                        let _ = fs::remove_file(&part);
                        return Err(err);
                    }
                };

                if received == 0 || file.file_size.map_or(false, |size| size != received) {
                    fs::remove_file(&part)?;
                    return Err(TcImpactErr::IncompleteDownload { path, received });
                }
                fs::rename(&part, &path)?;
            }

            paths.push(path);
        }

        Ok(paths)
    }
}
