use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::aoi::Polygon;
use crate::domain::ProductType;
use crate::error::FetchError;

pub const DEFAULT_SEARCH_URL: &str = "https://apihub.copernicus.eu/apihub/search";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://apihub.copernicus.eu/apihub";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub destination: String,
    #[serde(default)]
    pub search_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub cloud_threshold: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Exact product titles to constrain the search to.
    #[serde(default)]
    pub products: Vec<String>,
    /// Extra `key:value` equality filters, applied in listed order.
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    /// Area-of-interest ring as `[lon, lat]` pairs.
    #[serde(default)]
    pub aoi: Vec<[f64; 2]>,
    #[serde(default)]
    pub overwrite: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FilterEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub destination: Utf8PathBuf,
    pub search_url: String,
    pub download_url: String,
    pub product_type: Option<ProductType>,
    pub cloud_threshold: f64,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub products: Vec<String>,
    pub filters: Vec<(String, String)>,
    pub aoi: Polygon,
    pub overwrite: bool,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FetchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("s2-archiver.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(FetchError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FetchError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FetchError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, FetchError> {
        let product_type = config
            .product_type
            .as_deref()
            .map(str::parse::<ProductType>)
            .transpose()?;

        let aoi = Polygon::new(
            config
                .aoi
                .iter()
                .map(|&[lon, lat]| (lon, lat))
                .collect(),
        )?;

        Ok(ResolvedConfig {
            destination: Utf8PathBuf::from(config.destination),
            search_url: config
                .search_url
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            download_url: config
                .download_url
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string()),
            product_type,
            cloud_threshold: config.cloud_threshold.unwrap_or(0.0),
            limit: config.limit,
            offset: config.offset,
            products: config.products,
            filters: config
                .filters
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
            aoi,
            overwrite: config.overwrite.unwrap_or(false),
        })
    }
}
