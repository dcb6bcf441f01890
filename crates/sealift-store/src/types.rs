//! S3 wire payloads, client direction: requests we serialize, responses we
//! parse.

use chrono::{DateTime, Utc};
use sealift_common::types::CompletedPart;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename = "InitiateMultipartUploadResult")]
pub struct InitiateMultipartUploadResult {
    #[serde(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "UploadId")]
    pub upload_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
pub struct CompleteMultipartUpload {
    #[serde(rename = "Part")]
    pub parts: Vec<CompletePartXml>,
}

#[derive(Debug, Serialize)]
pub struct CompletePartXml {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

impl From<CompletedPart> for CompletePartXml {
    fn from(part: CompletedPart) -> Self {
        Self {
            part_number: part.part_number,
            etag: part.etag,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "CompleteMultipartUploadResult")]
pub struct CompleteMultipartUploadResult {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "ListBucketResult")]
pub struct ListBucketResult {
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "Contents", default)]
    pub contents: Vec<ObjectEntryXml>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectEntryXml {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Size")]
    pub size: i64,
    #[serde(rename = "LastModified")]
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Error")]
pub struct ErrorResponse {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "CORSConfiguration")]
pub struct CorsConfiguration {
    #[serde(rename = "CORSRule")]
    pub rules: Vec<CorsRule>,
}

#[derive(Debug, Serialize)]
pub struct CorsRule {
    #[serde(rename = "AllowedHeader")]
    pub allowed_headers: Vec<String>,
    #[serde(rename = "AllowedMethod")]
    pub allowed_methods: Vec<String>,
    #[serde(rename = "AllowedOrigin")]
    pub allowed_origins: Vec<String>,
    #[serde(rename = "ExposeHeader")]
    pub expose_headers: Vec<String>,
}

impl CorsConfiguration {
    /// The permissive rule set the upload flow needs: browsers PUT chunks
    /// straight to presigned URLs and must be able to read the ETag header.
    pub fn permissive() -> Self {
        Self {
            rules: vec![CorsRule {
                allowed_headers: vec!["*".to_string()],
                allowed_methods: vec![
                    "PUT".to_string(),
                    "POST".to_string(),
                    "GET".to_string(),
                ],
                allowed_origins: vec!["*".to_string()],
                expose_headers: vec!["ETag".to_string()],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use quick_xml::{de::from_str as xml_from_str, se::to_string as xml_to_string};

    use super::{
        CompleteMultipartUpload, CompletePartXml, ErrorResponse, InitiateMultipartUploadResult,
        ListBucketResult,
    };

    #[test]
    fn parses_initiate_result() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult>
  <Bucket>media</Bucket>
  <Key>ab12cd34/video.mp4</Key>
  <UploadId>upload-123</UploadId>
</InitiateMultipartUploadResult>"#;
        let parsed: InitiateMultipartUploadResult = xml_from_str(xml).unwrap();
        assert_eq!(parsed.upload_id, "upload-123");
        assert_eq!(parsed.key, "ab12cd34/video.mp4");
    }

    #[test]
    fn serializes_complete_manifest_in_part_order() {
        let manifest = CompleteMultipartUpload {
            parts: vec![
                CompletePartXml {
                    part_number: 1,
                    etag: "\"etag-a\"".to_string(),
                },
                CompletePartXml {
                    part_number: 2,
                    etag: "\"etag-b\"".to_string(),
                },
            ],
        };
        let xml = xml_to_string(&manifest).unwrap();
        let first = xml.find("etag-a").unwrap();
        let second = xml.find("etag-b").unwrap();
        assert!(first < second);
        assert!(xml.contains("<PartNumber>1</PartNumber>"));
    }

    #[test]
    fn parses_list_and_error_payloads() {
        let xml = r#"<ListBucketResult>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>ab12cd34/a.pdf</Key>
    <Size>1024</Size>
    <LastModified>2024-05-01T12:00:00.000Z</LastModified>
    <ETag>"abc"</ETag>
  </Contents>
</ListBucketResult>"#;
        let listing: ListBucketResult = xml_from_str(xml).unwrap();
        assert_eq!(listing.contents.len(), 1);
        assert_eq!(listing.contents[0].size, 1024);

        let err: ErrorResponse =
            xml_from_str("<Error><Code>NoSuchUpload</Code><Message>gone</Message></Error>")
                .unwrap();
        assert_eq!(err.code, "NoSuchUpload");
    }
}
