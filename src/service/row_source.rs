// service/row_source.rs
use std::collections::HashMap;
use std::path::Path;

use crate::service::error::ServiceError;

/// One data row keyed by lower-cased, trimmed header.
pub type Row = HashMap<String, String>;

pub type Rows<'a> = Box<dyn Iterator<Item = Result<Row, ServiceError>> + Send + 'a>;

/// A finite table of rows. Every call to `rows` starts again from the first
/// data row.
pub trait RowSource: Send + Sync {
    fn rows(&self) -> Result<Rows<'_>, ServiceError>;
}

pub fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Delimited text upload held in memory.
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    data: Vec<u8>,
}

impl CsvRowSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl RowSource for CsvRowSource {
    fn rows(&self) -> Result<Rows<'_>, ServiceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(self.data.as_slice());

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

        let rows = reader.into_records().map(move |record| {
            let record = record?;
            Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect())
        });

        Ok(Box::new(rows))
    }
}

/// Picks a row source for an uploaded file by extension.
pub fn row_source_for_upload(file_name: &str, data: Vec<u8>) -> Result<Box<dyn RowSource>, ServiceError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("csv") => Ok(Box::new(CsvRowSource::new(data))),
        Some(other) => Err(ServiceError::Validation(format!(
            "Unsupported bank file type .{}, upload a .csv export",
            other
        ))),
        None => Err(ServiceError::Validation(
            "Bank file must have a .csv extension".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}Beneficiary Email ID , AMOUNT,Status\n\
                          asha@example.com,\"1,234.50\",SUCCESS\n\
                          ravi@example.com,980,Failed\n";

    #[test]
    fn test_headers_are_case_insensitive_and_trimmed() {
        let source = CsvRowSource::new(SAMPLE.as_bytes().to_vec());
        let rows: Vec<Row> = source.rows().unwrap().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["beneficiary email id"], "asha@example.com");
        assert_eq!(rows[0]["amount"], "1,234.50");
        assert_eq!(rows[1]["status"], "Failed");
    }

    #[test]
    fn test_rows_can_be_read_again() {
        let source = CsvRowSource::new(SAMPLE.as_bytes().to_vec());
        assert_eq!(source.rows().unwrap().count(), 2);
        assert_eq!(source.rows().unwrap().count(), 2);
    }

    #[test]
    fn test_short_rows_only_carry_present_columns() {
        let source = CsvRowSource::new(b"email,amount,status\nasha@example.com,100\n".to_vec());
        let rows: Vec<Row> = source.rows().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].get("amount").map(String::as_str), Some("100"));
        assert!(rows[0].get("status").is_none());
    }

    #[test]
    fn test_upload_extension_must_be_csv() {
        assert!(row_source_for_upload("bank-response.CSV", Vec::new()).is_ok());

        let err = row_source_for_upload("bank-response.xlsx", Vec::new()).err().unwrap();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = row_source_for_upload("bank-response", Vec::new()).err().unwrap();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
