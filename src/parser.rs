use tracing::{info, warn};

use crate::domain::{ProductDescriptor, ProductLevel};

const ENTRY_OPEN: &str = "<entry>";
const ENTRY_CLOSE: &str = "</entry>";
const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";
const CLOUDS_OPEN: &str = "<double name=\"cloudcoverpercentage\">";
const CLOUDS_CLOSE: &str = "</double>";
const ID_OPEN: &str = "<id>";
const ID_CLOSE: &str = "</id>";

/// Line-oriented tokenizer for the catalog's search feed. Entries are
/// delimited by `<entry>`/`</entry>` markers; field lines in between carry
/// the title, the cloud-cover percentage and the catalog id. Lines with no
/// recognized marker are ignored, as is a close marker with no open entry.
#[derive(Debug, Clone)]
pub struct FeedParser {
    level: ProductLevel,
    cloud_threshold: f64,
}

impl FeedParser {
    /// `level` selects the descriptor variant for every entry in this feed;
    /// a `cloud_threshold` of zero disables the cloud-cover filter.
    pub fn new(level: ProductLevel, cloud_threshold: f64) -> Self {
        Self {
            level,
            cloud_threshold,
        }
    }

    pub fn parse(&self, body: &str) -> Vec<ProductDescriptor> {
        let mut accepted = Vec::new();
        let mut current: Option<ProductDescriptor> = None;

        for line in body.lines() {
            if line.contains(ENTRY_OPEN) {
                current = Some(ProductDescriptor::new(self.level));
            } else if line.contains(ENTRY_CLOSE) {
                if let Some(product) = current.take() {
                    self.accept(product, &mut accepted);
                }
            } else if line.contains(TITLE_OPEN) {
                if let Some(product) = current.as_mut() {
                    product.name = extract(line, TITLE_OPEN, TITLE_CLOSE);
                }
            } else if line.contains(CLOUDS_OPEN) {
                let raw = extract(line, CLOUDS_OPEN, CLOUDS_CLOSE);
                match raw.parse::<f64>() {
                    Ok(clouds) => {
                        if let Some(product) = current.as_mut() {
                            product.clouds_percentage = Some(clouds);
                        }
                    }
                    Err(_) => warn!("unparseable cloud cover value: {raw}"),
                }
            } else if line.contains(ID_OPEN) {
                if let Some(product) = current.as_mut() {
                    product.id = extract(line, ID_OPEN, ID_CLOSE);
                }
            }
        }

        accepted
    }

    fn accept(&self, product: ProductDescriptor, accepted: &mut Vec<ProductDescriptor>) {
        if self.cloud_threshold != 0.0 {
            if let Some(clouds) = product.clouds_percentage {
                if clouds > self.cloud_threshold {
                    info!("{product} skipped [clouds: {clouds}]");
                    return;
                }
            }
        }
        accepted.push(product);
    }
}

fn extract(line: &str, open: &str, close: &str) -> String {
    let start = line.find(open).map(|idx| idx + open.len()).unwrap_or(0);
    let end = line[start..]
        .find(close)
        .map(|idx| start + idx)
        .unwrap_or(line.len());
    line[start..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, id: &str, clouds: &str) -> String {
        format!(
            "<entry>\n\
             <title>{name}</title>\n\
             <id>{id}</id>\n\
             <double name=\"cloudcoverpercentage\">{clouds}</double>\n\
             </entry>\n"
        )
    }

    #[test]
    fn parses_fields_between_markers() {
        let body = entry("S2A_MSIL1C_20240101T101031", "abc-123", "12.5");
        let products = FeedParser::new(ProductLevel::L1C, 0.0).parse(&body);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "S2A_MSIL1C_20240101T101031");
        assert_eq!(products[0].id, "abc-123");
        assert_eq!(products[0].clouds_percentage, Some(12.5));
        assert_eq!(products[0].level, ProductLevel::L1C);
    }

    #[test]
    fn cloud_threshold_discards_cloudy_entries() {
        let body = format!("{}{}", entry("clear", "a", "10"), entry("cloudy", "b", "90"));
        let products = FeedParser::new(ProductLevel::L1C, 50.0).parse(&body);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "clear");
    }

    #[test]
    fn zero_threshold_accepts_everything() {
        let body = format!("{}{}", entry("clear", "a", "10"), entry("cloudy", "b", "90"));
        let products = FeedParser::new(ProductLevel::L2A, 0.0).parse(&body);
        assert_eq!(products.len(), 2);
    }

    #[test]
    fn close_without_open_is_a_no_op() {
        let body = "</entry>\n<title>stray</title>\n";
        let products = FeedParser::new(ProductLevel::L1C, 0.0).parse(body);
        assert!(products.is_empty());
    }

    #[test]
    fn unrecognized_lines_are_ignored() {
        let body = format!(
            "<?xml version=\"1.0\"?>\n<feed>\n{}</feed>\n",
            entry("S2B_MSIL2A_20240202T101029", "def-456", "3.2")
        );
        let products = FeedParser::new(ProductLevel::L2A, 0.0).parse(&body);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].level, ProductLevel::L2A);
    }

    #[test]
    fn malformed_cloud_value_leaves_entry_accepted() {
        let body = entry("S2A_MSIL1C_20240101T101031", "abc", "n/a");
        let products = FeedParser::new(ProductLevel::L1C, 50.0).parse(&body);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].clouds_percentage, None);
    }
}
