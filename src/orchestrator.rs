use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{info, warn};

use crate::archive::Archive;
use crate::domain::{BatchStatus, ProductDescriptor};
use crate::error::FetchError;
use crate::transfer::{self, RemoteSource};

/// Per-product downloader. Resolving a product's remote layout (single
/// file, granule tree, ...) belongs to the implementation; the runner only
/// hands it the descriptor and the archive root.
pub trait ProductDownloader: Send + Sync {
    fn download(
        &self,
        product: &ProductDescriptor,
        destination: &Utf8Path,
    ) -> Result<Option<Utf8PathBuf>, FetchError>;
}

/// Downloads each product as one packaged file via the OData endpoint.
pub struct SingleFileDownloader<S: RemoteSource> {
    source: S,
    base_url: String,
    overwrite: bool,
}

impl<S: RemoteSource> SingleFileDownloader<S> {
    pub fn new(source: S, base_url: impl Into<String>, overwrite: bool) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            overwrite,
        }
    }

    fn product_url(&self, product: &ProductDescriptor) -> String {
        format!(
            "{}/odata/v1/Products('{}')/$value",
            self.base_url.trim_end_matches('/'),
            product.id
        )
    }
}

impl<S: RemoteSource> ProductDownloader for SingleFileDownloader<S> {
    fn download(
        &self,
        product: &ProductDescriptor,
        destination: &Utf8Path,
    ) -> Result<Option<Utf8PathBuf>, FetchError> {
        let target = destination.join(format!("{}.zip", product.name));
        transfer::download(&self.source, &self.product_url(product), &target, self.overwrite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Downloaded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub name: String,
    pub outcome: ItemOutcome,
    pub path: Option<String>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub status: BatchStatus,
}

/// Drives the batch strictly in order, one product at a time. A skipped
/// product degrades the batch to `EmptyProduct`, a failed transfer to
/// `DownloadError`; either way the remaining products are still attempted.
pub struct BatchRunner {
    archive: Archive,
}

impl BatchRunner {
    pub fn new(archive: Archive) -> Self {
        Self { archive }
    }

    pub fn run(
        &self,
        downloader: &dyn ProductDownloader,
        products: &[ProductDescriptor],
    ) -> BatchReport {
        let mut status = BatchStatus::Ok;
        let mut items = Vec::new();
        let total = products.len();

        for (index, product) in products.iter().enumerate() {
            // per-product log context, closed on scope exit even on failure
            let span = tracing::info_span!("product", current = index + 1, total);
            let _scope = span.enter();

            let start = Instant::now();
            let result = self
                .archive
                .ensure_root()
                .and_then(|()| downloader.download(product, self.archive.root()));
            let elapsed = start.elapsed();

            let (outcome, path) = match result {
                Ok(Some(path)) => {
                    if let Err(err) = self.archive.write_record(product, &path) {
                        warn!("could not record {product}: {err}");
                    }
                    info!("product download completed in {}", format_time(elapsed));
                    (ItemOutcome::Downloaded, Some(path.to_string()))
                }
                Ok(None) => {
                    warn!("product download aborted");
                    status = status.escalate(BatchStatus::EmptyProduct);
                    (ItemOutcome::Skipped, None)
                }
                Err(err) => {
                    warn!("product download failed: {err}");
                    status = status.escalate(BatchStatus::DownloadError);
                    (ItemOutcome::Failed, None)
                }
            };

            items.push(BatchItem {
                name: product.name.clone(),
                outcome,
                path,
                elapsed_secs: elapsed.as_secs_f64(),
            });
        }

        BatchReport { items, status }
    }
}

pub fn format_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::ProductLevel;

    enum Script {
        Deliver,
        Skip,
        Fail,
    }

    struct ScriptedDownloader {
        script: Vec<Script>,
        attempted: Mutex<Vec<String>>,
    }

    impl ScriptedDownloader {
        fn new(script: Vec<Script>) -> Self {
            Self {
                script,
                attempted: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProductDownloader for ScriptedDownloader {
        fn download(
            &self,
            product: &ProductDescriptor,
            destination: &Utf8Path,
        ) -> Result<Option<Utf8PathBuf>, FetchError> {
            let mut attempted = self.attempted.lock().unwrap();
            let step = &self.script[attempted.len()];
            attempted.push(product.name.clone());
            match step {
                Script::Deliver => {
                    let path = destination.join(format!("{}.zip", product.name));
                    std::fs::write(path.as_std_path(), b"payload").unwrap();
                    Ok(Some(path))
                }
                Script::Skip => Ok(None),
                Script::Fail => Err(FetchError::Timeout("https://remote/p".to_string())),
            }
        }
    }

    fn products(count: usize) -> Vec<ProductDescriptor> {
        (0..count)
            .map(|idx| ProductDescriptor {
                level: ProductLevel::L1C,
                name: format!("S2A_MSIL1C_2024010{idx}"),
                id: format!("id-{idx}"),
                clouds_percentage: Some(1.0),
            })
            .collect()
    }

    fn runner(dir: &tempfile::TempDir) -> BatchRunner {
        let root = Utf8PathBuf::from_path_buf(dir.path().join("archive")).unwrap();
        BatchRunner::new(Archive::new(root))
    }

    #[test]
    fn skip_in_the_middle_still_attempts_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            ScriptedDownloader::new(vec![Script::Deliver, Script::Skip, Script::Deliver]);

        let report = runner(&dir).run(&downloader, &products(3));

        assert_eq!(downloader.attempted.lock().unwrap().len(), 3);
        assert_eq!(report.status, BatchStatus::EmptyProduct);
        assert_eq!(report.items[1].outcome, ItemOutcome::Skipped);
        assert_eq!(report.items[2].outcome, ItemOutcome::Downloaded);
    }

    #[test]
    fn transfer_error_degrades_to_download_error_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            ScriptedDownloader::new(vec![Script::Fail, Script::Deliver]);

        let report = runner(&dir).run(&downloader, &products(2));

        assert_eq!(downloader.attempted.lock().unwrap().len(), 2);
        assert_eq!(report.status, BatchStatus::DownloadError);
        assert_eq!(report.items[0].outcome, ItemOutcome::Failed);
    }

    #[test]
    fn status_is_never_downgraded() {
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            ScriptedDownloader::new(vec![Script::Fail, Script::Skip, Script::Deliver]);

        let report = runner(&dir).run(&downloader, &products(3));
        assert_eq!(report.status, BatchStatus::DownloadError);
    }

    #[test]
    fn clean_batch_reports_ok_and_records_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ScriptedDownloader::new(vec![Script::Deliver, Script::Deliver]);
        let runner = runner(&dir);

        let report = runner.run(&downloader, &products(2));

        assert_eq!(report.status, BatchStatus::Ok);
        assert!(report.items.iter().all(|item| item.path.is_some()));
        assert_eq!(runner.archive.list_records().unwrap().len(), 2);
    }

    #[test]
    fn empty_batch_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ScriptedDownloader::new(vec![]);
        let report = runner(&dir).run(&downloader, &[]);
        assert_eq!(report.status, BatchStatus::Ok);
        assert!(report.items.is_empty());
    }

    #[test]
    fn elapsed_time_is_formatted_as_clock() {
        assert_eq!(format_time(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(format_time(Duration::from_secs(0)), "00:00:00");
    }
}
