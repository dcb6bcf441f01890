//! AWS signature v4 request signing and query presigning.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::StoreConfig;

type HmacSha256 = Hmac<Sha256>;

pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const AWS_URI_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b']');

pub fn signing_key(secret_key: &str, date: &str, region: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let region_key = hmac_sha256(&date_key, region.as_bytes());
    let service_key = hmac_sha256(&region_key, b"s3");
    hmac_sha256(&service_key, b"aws4_request")
}

pub fn canonical_request(
    method: &str,
    uri: &str,
    query_string: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{uri}\n{query_string}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    )
}

pub fn string_to_sign(canonical_request: &str, date_time: &str, scope: &str) -> String {
    let canonical_hash = sha256_hex(canonical_request.as_bytes());
    format!("AWS4-HMAC-SHA256\n{date_time}\n{scope}\n{canonical_hash}")
}

pub fn signature(signing_key: &[u8], string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key, string_to_sign.as_bytes()))
}

pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let starts_with_slash = path.starts_with('/');
    let ends_with_slash = path.ends_with('/');
    let encoded_segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(percent_encode)
        .collect::<Vec<_>>();

    let mut out = String::new();
    if starts_with_slash {
        out.push('/');
    }
    out.push_str(&encoded_segments.join("/"));
    if ends_with_slash && !out.ends_with('/') {
        out.push('/');
    }
    if out.is_empty() { "/".to_string() } else { out }
}

/// Accepts the query in wire form; pairs are decoded first so values that are
/// already percent-encoded do not get encoded twice.
pub fn canonical_query_string(query_string: &str) -> String {
    let mut params = url::form_urlencoded::parse(query_string.as_bytes())
        .map(|(name, value)| (percent_encode(&name), percent_encode(&value)))
        .collect::<Vec<_>>();

    params.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    params
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// The Host header value the store will see, including any non-default port.
pub fn host_header_value(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

/// Signing timestamps for one request, derived from a single instant so the
/// credential scope and the x-amz-date header always agree.
pub struct SigningTime {
    pub amz_date: String,
    pub short_date: String,
}

impl SigningTime {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            amz_date: now.format("%Y%m%dT%H%M%SZ").to_string(),
            short_date: now.format("%Y%m%d").to_string(),
        }
    }
}

/// Appends sigv4 presign query parameters to `url`, producing a URL that
/// authorizes exactly one `method` request until `expires_secs` elapses.
/// Only the host header is signed; the payload stays unsigned so the caller
/// can stream arbitrary bytes.
pub fn presign_url(
    config: &StoreConfig,
    method: &str,
    url: &mut Url,
    expires_secs: u64,
    now: DateTime<Utc>,
) -> Option<()> {
    let time = SigningTime::at(now);
    let host = host_header_value(url)?;
    let scope = format!("{}/{}/s3/aws4_request", time.short_date, config.region);
    let credential = format!("{}/{scope}", config.access_key);

    url.query_pairs_mut()
        .append_pair("X-Amz-Algorithm", "AWS4-HMAC-SHA256")
        .append_pair("X-Amz-Credential", &credential)
        .append_pair("X-Amz-Date", &time.amz_date)
        .append_pair("X-Amz-Expires", &expires_secs.to_string())
        .append_pair("X-Amz-SignedHeaders", "host");

    let canonical_query = url.query().map(canonical_query_string).unwrap_or_default();
    let canonical_headers = format!("host:{host}\n");
    let request = canonical_request(
        method,
        &canonical_uri(url.path()),
        &canonical_query,
        &canonical_headers,
        "host",
        UNSIGNED_PAYLOAD,
    );

    let to_sign = string_to_sign(&request, &time.amz_date, &scope);
    let key = signing_key(&config.secret_key, &time.short_date, &config.region);
    let computed = signature(&key, &to_sign);

    url.query_pairs_mut()
        .append_pair("X-Amz-Signature", &computed);
    Some(())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, AWS_URI_ENCODE_SET).to_string()
}
