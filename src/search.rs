use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{info, warn};

use crate::aoi::AreaOfInterest;
use crate::credentials::UserCredentials;
use crate::domain::{ProductDescriptor, ProductLevel, ProductType};
use crate::error::FetchError;
use crate::parser::FeedParser;
use crate::query::SearchQuery;

/// Rings with this many points or more are sent as their bounding box.
const WKT_BOUNDS_POINTS: usize = 200;

#[derive(Debug, Clone)]
pub struct CatalogResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

pub trait CatalogClient: Send + Sync {
    fn get(&self, url: &str) -> Result<CatalogResponse, FetchError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    credentials: Option<UserCredentials>,
}

impl CatalogHttpClient {
    pub fn new(credentials: Option<UserCredentials>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("s2-archiver/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::CatalogHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| FetchError::CatalogHttp(err.to_string()))?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

impl CatalogClient for CatalogHttpClient {
    fn get(&self, url: &str) -> Result<CatalogResponse, FetchError> {
        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request
            .send()
            .map_err(|err| FetchError::CatalogHttp(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| FetchError::CatalogHttp(err.to_string()))?;
        Ok(CatalogResponse {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
            body,
        })
    }
}

/// One search against the catalog endpoint: composes the query, issues a
/// single GET and parses the feed into descriptors.
pub struct CatalogSearch {
    endpoint: String,
    query: SearchQuery,
    cloud_threshold: f64,
}

impl CatalogSearch {
    pub fn new(endpoint: impl Into<String>, product_type: Option<ProductType>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: SearchQuery::new(product_type),
            cloud_threshold: 0.0,
        }
    }

    pub fn query_mut(&mut self) -> &mut SearchQuery {
        &mut self.query
    }

    /// Cloud-cover acceptance threshold in percent; zero disables it.
    pub fn cloud_threshold(&mut self, threshold: f64) {
        self.cloud_threshold = threshold;
    }

    /// Runs the search. A 401 means bad credentials and any other non-200
    /// status means a rejected request; both come back as an empty batch,
    /// not an error. The footprint clause is appended here, last, when an
    /// area of interest with points is supplied.
    pub fn execute(
        &mut self,
        client: &dyn CatalogClient,
        aoi: Option<&dyn AreaOfInterest>,
    ) -> Result<Vec<ProductDescriptor>, FetchError> {
        if let Some(aoi) = aoi {
            if aoi.num_points() > 0 {
                let wkt = if aoi.num_points() < WKT_BOUNDS_POINTS {
                    aoi.to_wkt()
                } else {
                    aoi.to_wkt_bounds()
                };
                self.query.filter_mut().add_footprint(&wkt);
            }
        }

        let url = self.query.to_url(&self.endpoint);
        info!("{url}");
        let response = client.get(&url)?;

        let products = match response.status {
            200 => {
                let level = ProductLevel::from_product_type(self.query.filter().product_type());
                FeedParser::new(level, self.cloud_threshold).parse(&response.body)
            }
            401 => {
                warn!("the supplied credentials are invalid");
                Vec::new()
            }
            status => {
                warn!(
                    "the search request was not successful: {status} {}",
                    response.reason
                );
                Vec::new()
            }
        };
        info!("query returned {} products", products.len());
        Ok(products)
    }
}
