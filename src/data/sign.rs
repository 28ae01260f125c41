use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// AWS Signature Version 4 for read-only S3 requests
// ---------------------------------------------------------------------------
//
// Only what GETs need: empty payload, three signed headers
// (host, x-amz-content-sha256, x-amz-date).

/// SHA-256 of the empty string; the payload hash of every request we send.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// HMAC-SHA256 (RFC 2104). The pack's crypto stack is sha2 + hex, so the
/// two-pass construction is spelled out here instead of pulling a MAC crate.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;

    let mut key_block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        key_block[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    inner.update(key_block.map(|b| b ^ 0x36));
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(key_block.map(|b| b ^ 0x5c));
    outer.update(inner_digest);

    let mut mac = [0u8; 32];
    mac.copy_from_slice(&outer.finalize());
    mac
}

/// AWS-style URI encoding: unreserved characters pass through, everything
/// else becomes uppercase percent escapes. Paths keep their `/` separators,
/// query keys and values do not.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Credential material plus the fixed request scope.
pub struct SigningParams<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Headers to attach to the outgoing request.
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: &'static str,
}

/// Sign a GET with an empty body. `path` must start with `/` and be the
/// raw (un-encoded) object path; `query` is the raw key/value list.
pub fn sign_get_request(
    params: &SigningParams<'_>,
    host: &str,
    path: &str,
    query: &[(String, String)],
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let datestamp = now.format("%Y%m%d").to_string();

    let canonical_request = canonical_request(host, path, query, &amz_date);
    let scope = format!(
        "{datestamp}/{}/{}/aws4_request",
        params.region, params.service
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        params.secret_access_key,
        &datestamp,
        params.region,
        params.service,
    );
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
        params.access_key_id,
        signed_header_names(),
    );

    SignedHeaders {
        authorization,
        amz_date,
        content_sha256: EMPTY_PAYLOAD_SHA256,
    }
}

fn signed_header_names() -> &'static str {
    // Alphabetical, matching the canonical header block below.
    "host;x-amz-content-sha256;x-amz-date"
}

fn canonical_request(
    host: &str,
    path: &str,
    query: &[(String, String)],
    amz_date: &str,
) -> String {
    // Canonical headers end with their own newline, hence the blank line
    // before the signed-header names.
    format!(
        "GET\n{uri}\n{query}\n\
         host:{host}\n\
         x-amz-content-sha256:{EMPTY_PAYLOAD_SHA256}\n\
         x-amz-date:{amz_date}\n\
         \n\
         {signed}\n\
         {EMPTY_PAYLOAD_SHA256}",
        uri = uri_encode(path, false),
        query = canonical_query(query),
        signed = signed_header_names(),
    )
}

fn canonical_query(query: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn derive_signing_key(secret: &str, datestamp: &str, region: &str, service: &str) -> [u8; 32] {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), datestamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}
