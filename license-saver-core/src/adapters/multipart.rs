//! Multipart CSV encoder
//!
//! The delete-user endpoint takes a CSV file upload. These helpers build the
//! one-row CSV and wrap it as a single-part `multipart/form-data` form.

use reqwest::blocking::multipart::{Form, Part};

use crate::domain::result::{Error, Result};

/// Form field name of the uploaded file
pub const FILE_FIELD: &str = "file";
/// Synthetic filename of the uploaded file
pub const FILE_NAME: &str = "data.csv";

const CSV_MIME: &str = "text/csv";

/// Multipart form together with its `Content-Type` header value
pub struct MultipartBody {
    pub form: Form,
    pub content_type: String,
}

/// CSV with an `email` header and one row per address
pub fn email_csv(emails: &[&str]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(["email"])
        .map_err(|e| Error::encoding(format!("Failed to write CSV header: {}", e)))?;
    for email in emails {
        writer
            .write_record([email])
            .map_err(|e| Error::encoding(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::encoding(format!("Failed to flush CSV writer: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::encoding(format!("CSV is not UTF-8: {}", e)))
}

/// Wrap a CSV document as a `file` form field named `data.csv`
pub fn csv_file_part(csv: &str) -> Result<MultipartBody> {
    let part = Part::text(csv.to_string())
        .file_name(FILE_NAME)
        .mime_str(CSV_MIME)
        .map_err(|e| Error::encoding(format!("Invalid CSV part: {}", e)))?;

    let form = Form::new().part(FILE_FIELD, part);
    let content_type = format!("multipart/form-data; boundary={}", form.boundary());

    Ok(MultipartBody { form, content_type })
}
