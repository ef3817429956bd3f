use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{ProductDescriptor, ProductLevel};
use crate::error::FetchError;

/// Local archive layout. One file per product under the root, plus a JSON
/// record per product under `metadata/`.
#[derive(Debug, Clone)]
pub struct Archive {
    root: Utf8PathBuf,
}

impl Archive {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), FetchError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))
    }

    pub fn product_path(&self, product: &ProductDescriptor) -> Utf8PathBuf {
        self.root.join(format!("{}.zip", product.name))
    }

    pub fn metadata_path(&self, product: &ProductDescriptor) -> Utf8PathBuf {
        self.root
            .join("metadata")
            .join(format!("{}.json", product.name))
    }

    pub fn write_record(
        &self,
        product: &ProductDescriptor,
        resolved_path: &Utf8Path,
    ) -> Result<(), FetchError> {
        let record = ProductRecord {
            name: product.name.clone(),
            id: product.id.clone(),
            level: product.level,
            clouds_percentage: product.clouds_percentage,
            downloaded_at: Utc::now().to_rfc3339(),
            resolved_path: resolved_path.to_string(),
        };
        let path = self.metadata_path(product);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        }
        let content = serde_json::to_vec_pretty(&record)
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn list_records(&self) -> Result<Vec<ProductRecord>, FetchError> {
        let metadata_root = self.root.join("metadata");
        if !metadata_root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        let entries = fs::read_dir(metadata_root.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| FetchError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                let content = fs::read_to_string(&path)
                    .map_err(|err| FetchError::Filesystem(err.to_string()))?;
                let record: ProductRecord = serde_json::from_str(&content)
                    .map_err(|err| FetchError::Filesystem(err.to_string()))?;
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub id: String,
    pub level: ProductLevel,
    pub clouds_percentage: Option<f64>,
    pub downloaded_at: String,
    pub resolved_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductDescriptor {
        ProductDescriptor {
            level: ProductLevel::L1C,
            name: "S2A_MSIL1C_20240101T101031".to_string(),
            id: "abc-123".to_string(),
            clouds_percentage: Some(12.5),
        }
    }

    #[test]
    fn layout_paths() {
        let archive = Archive::new(Utf8PathBuf::from("/data/s2"));
        let product = product();
        assert_eq!(
            archive.product_path(&product).as_str(),
            "/data/s2/S2A_MSIL1C_20240101T101031.zip"
        );
        assert_eq!(
            archive.metadata_path(&product).as_str(),
            "/data/s2/metadata/S2A_MSIL1C_20240101T101031.json"
        );
    }

    #[test]
    fn record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let archive = Archive::new(root);
        let product = product();

        archive
            .write_record(&product, &archive.product_path(&product))
            .unwrap();
        let records = archive.list_records().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, product.name);
        assert_eq!(records[0].id, product.id);
        assert_eq!(records[0].clouds_percentage, Some(12.5));
    }
}
