//! Multipart upload extraction
//!
//! Drains the whole multipart stream into memory before anything is decoded.
//! Declared content types are ignored: a part is a file if and only if it
//! carries a filename (even an empty one).

use axum::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::normalizer;

/// Plain form fields by name; the last value sent for a name wins
pub type FormFields = BTreeMap<String, String>;

/// One uploaded file, exactly as received
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub field_name: String,
    pub filename: String,
    pub raw_bytes: Bytes,
}

impl UploadedPart {
    /// Whether the part should be tabulated (literal, case-sensitive suffix)
    pub fn is_csv(&self) -> bool {
        self.filename.ends_with(".csv")
    }
}

/// Fully buffered contents of a multipart request
#[derive(Debug, Default)]
pub struct Upload {
    pub parts: Vec<UploadedPart>,
    pub form: FormFields,
}

/// Read every field of a multipart request
pub async fn extract_upload(mut multipart: Multipart) -> Result<Upload, MultipartError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_owned);
        let raw_bytes = field.bytes().await?;

        match filename {
            Some(filename) => {
                debug!(
                    field_name = %field_name,
                    filename = %filename,
                    bytes = raw_bytes.len(),
                    "Received file part"
                );
                upload.parts.push(UploadedPart {
                    field_name,
                    filename,
                    raw_bytes,
                });
            }
            None => {
                // Form values go through the same decoder as files
                let value = normalizer::decode(&raw_bytes).text;
                if upload.form.insert(field_name.clone(), value).is_some() {
                    debug!(field_name = %field_name, "Duplicate form field, keeping last value");
                }
            }
        }
    }

    info!(
        files = upload.parts.len(),
        form_fields = upload.form.len(),
        "Multipart request buffered"
    );
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "XUPLOADBOUNDARYX";

    async fn multipart_from(body: Vec<u8>) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn text_part(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        )
        .into_bytes()
    }

    fn file_part(name: &str, filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, name, filename, content_type
        )
        .into_bytes();
        part.extend_from_slice(content);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn finish(mut body: Vec<u8>) -> Vec<u8> {
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    #[tokio::test]
    async fn test_files_and_fields_are_separated() {
        let mut body = text_part("platform", "GTT");
        body.extend(file_part("chamberRecipeFile", "chamber.csv", "text/csv", b"a,b\n"));
        body.extend(text_part("chamber", "3"));

        let upload = extract_upload(multipart_from(finish(body)).await).await.unwrap();

        assert_eq!(upload.parts.len(), 1);
        assert_eq!(upload.parts[0].field_name, "chamberRecipeFile");
        assert_eq!(upload.parts[0].filename, "chamber.csv");
        assert_eq!(upload.parts[0].raw_bytes.as_ref(), b"a,b\n");
        assert_eq!(upload.form.get("platform").map(String::as_str), Some("GTT"));
        assert_eq!(upload.form.get("chamber").map(String::as_str), Some("3"));
    }

    #[tokio::test]
    async fn test_content_type_is_not_trusted() {
        let body = file_part("log", "process.csv", "image/png", b"x,y\n");

        let upload = extract_upload(multipart_from(finish(body)).await).await.unwrap();

        assert_eq!(upload.parts.len(), 1);
        assert!(upload.parts[0].is_csv());
    }

    #[tokio::test]
    async fn test_empty_filename_is_still_a_file_part() {
        let body = file_part("parameterFile", "", "application/octet-stream", b"");

        let upload = extract_upload(multipart_from(finish(body)).await).await.unwrap();

        assert_eq!(upload.parts.len(), 1);
        assert_eq!(upload.parts[0].filename, "");
        assert!(upload.parts[0].raw_bytes.is_empty());
        assert!(upload.form.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_form_field_last_value_wins() {
        let mut body = text_part("cip", "CIP5");
        body.extend(text_part("cip", "CIP7"));

        let upload = extract_upload(multipart_from(finish(body)).await).await.unwrap();

        assert_eq!(upload.form.len(), 1);
        assert_eq!(upload.form["cip"], "CIP7");
    }

    #[test]
    fn test_csv_suffix_is_case_sensitive() {
        let part = |filename: &str| UploadedPart {
            field_name: "f".to_string(),
            filename: filename.to_string(),
            raw_bytes: Bytes::new(),
        };
        assert!(part("recipe.csv").is_csv());
        assert!(!part("recipe.CSV").is_csv());
        assert!(!part("recipe.csv.txt").is_csv());
    }
}
