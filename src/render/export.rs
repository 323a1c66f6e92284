use crate::domain::model::Work;
use crate::utils::error::{EtlError, Result};

pub const WORKS_CSV_HEADER: [&str; 8] = [
    "title",
    "year",
    "venue",
    "citations",
    "doi",
    "url",
    "oa_status",
    "type",
];

/// Flat spreadsheet export of the works table.
pub fn works_csv(works: &[Work]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(WORKS_CSV_HEADER)?;

    for work in works {
        let year = work.year.map(|y| y.to_string()).unwrap_or_default();
        let citations = work.citations.to_string();
        writer.write_record([
            work.title.as_str(),
            year.as_str(),
            work.venue.as_str(),
            citations.as_str(),
            work.doi.as_deref().unwrap_or(""),
            work.url.as_str(),
            work.oa_status.as_str(),
            work.work_type.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("Failed to flush CSV writer: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}
