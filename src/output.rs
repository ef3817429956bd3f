use std::io::{self, Write};

use serde::Serialize;

use crate::archive::ProductRecord;
use crate::domain::ProductDescriptor;
use crate::orchestrator::BatchReport;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_search(products: &[ProductDescriptor]) -> io::Result<()> {
        Self::print_json(&products)
    }

    pub fn print_batch(report: &BatchReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_records(records: &[ProductRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
