use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Catalog product type constraint, spelled the way the catalog expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ProductType {
    #[serde(rename = "S2MSI1C")]
    #[value(name = "S2MSI1C")]
    S2Msi1c,
    #[serde(rename = "S2MSI2A")]
    #[value(name = "S2MSI2A")]
    S2Msi2a,
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductType::S2Msi1c => write!(f, "S2MSI1C"),
            ProductType::S2Msi2a => write!(f, "S2MSI2A"),
        }
    }
}

impl FromStr for ProductType {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "S2MSI1C" => Ok(ProductType::S2Msi1c),
            "S2MSI2A" | "S2MSI2AP" => Ok(ProductType::S2Msi2a),
            _ => Err(FetchError::InvalidProductType(value.to_string())),
        }
    }
}

/// Processing level of a parsed descriptor. Selected by the caller from the
/// product-type constraint in effect, never inferred from response content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductLevel {
    L1C,
    L2A,
}

impl ProductLevel {
    pub fn from_product_type(product_type: Option<ProductType>) -> Self {
        match product_type {
            None | Some(ProductType::S2Msi1c) => ProductLevel::L1C,
            Some(ProductType::S2Msi2a) => ProductLevel::L2A,
        }
    }
}

/// One catalog item as extracted from the search feed. Fields are filled
/// while the enclosing entry is being parsed and left alone afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDescriptor {
    pub level: ProductLevel,
    pub name: String,
    pub id: String,
    pub clouds_percentage: Option<f64>,
}

impl ProductDescriptor {
    pub fn new(level: ProductLevel) -> Self {
        Self {
            level,
            name: String::new(),
            id: String::new(),
            clouds_percentage: None,
        }
    }
}

impl fmt::Display for ProductDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Batch outcome, ordered by severity. Escalation keeps the worst value
/// seen and never downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Ok,
    EmptyProduct,
    DownloadError,
}

impl BatchStatus {
    pub fn escalate(self, other: BatchStatus) -> BatchStatus {
        self.max(other)
    }

    pub fn exit_code(self) -> u8 {
        match self {
            BatchStatus::Ok => 0,
            BatchStatus::EmptyProduct => 2,
            BatchStatus::DownloadError => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_product_type_valid() {
        let ty: ProductType = "s2msi1c".parse().unwrap();
        assert_eq!(ty, ProductType::S2Msi1c);
        assert_eq!(ty.to_string(), "S2MSI1C");
    }

    #[test]
    fn parse_product_type_invalid() {
        let err = "S3OLCI".parse::<ProductType>().unwrap_err();
        assert_matches!(err, FetchError::InvalidProductType(_));
    }

    #[test]
    fn level_from_type_constraint() {
        assert_eq!(ProductLevel::from_product_type(None), ProductLevel::L1C);
        assert_eq!(
            ProductLevel::from_product_type(Some(ProductType::S2Msi1c)),
            ProductLevel::L1C
        );
        assert_eq!(
            ProductLevel::from_product_type(Some(ProductType::S2Msi2a)),
            ProductLevel::L2A
        );
    }

    #[test]
    fn status_escalates_and_never_downgrades() {
        let status = BatchStatus::Ok
            .escalate(BatchStatus::DownloadError)
            .escalate(BatchStatus::EmptyProduct);
        assert_eq!(status, BatchStatus::DownloadError);
        assert_eq!(BatchStatus::Ok.escalate(BatchStatus::Ok), BatchStatus::Ok);
    }
}
