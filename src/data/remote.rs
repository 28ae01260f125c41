use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use thiserror::Error;

use super::decode::{decode_table, DataFormat};
use super::model::Table;
use super::sign::{sign_get_request, SigningParams};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A dataset fetch failure. Never retried; the caller aborts the render
/// cycle and surfaces the message.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding {key}: {message}")]
    Decode { key: String, message: String },
}

// ---------------------------------------------------------------------------
// ObjectStore – the seam between datasets and where they live
// ---------------------------------------------------------------------------

/// Read-only access to a bucket-like namespace of byte objects.
pub trait ObjectStore {
    /// All keys starting with `prefix`, in listing order.
    fn list(&self, prefix: &str) -> Result<Vec<String>, FetchError>;

    /// The object's bytes.
    fn get(&self, key: &str) -> Result<Vec<u8>, FetchError>;

    /// Human-readable origin, shown in the top bar.
    fn describe(&self) -> String;
}

/// Pick the physical source for a dataset key: prefer the first part file
/// under the key (skipping `_SUCCESS`-style sentinels, i.e. any key with an
/// underscore-prefixed segment), fall back to the key itself.
///
/// When several part files match, the first in listing order wins; upstream
/// writes a single part per dataset, so the ambiguity is a don't-care.
pub fn resolve_key(
    store: &dyn ObjectStore,
    key: &str,
    format: DataFormat,
) -> Result<String, FetchError> {
    let listed = store.list(key)?;
    let candidate = listed
        .into_iter()
        .find(|k| k.ends_with(format.extension()) && !k.contains("/_"));
    Ok(candidate.unwrap_or_else(|| key.to_string()))
}

/// Fetch and decode one dataset.
pub fn read_dataset(
    store: &dyn ObjectStore,
    key: &str,
    format: DataFormat,
) -> Result<Table, FetchError> {
    let target = resolve_key(store, key, format)?;
    if target != key {
        log::info!("dataset {key} resolved to part file {target}");
    }
    let payload = store.get(&target)?;
    decode_table(&payload, format).map_err(|err| FetchError::Decode {
        key: target,
        message: format!("{err:#}"),
    })
}

// ---------------------------------------------------------------------------
// S3Store – blocking HTTP against S3 or an S3-compatible endpoint
// ---------------------------------------------------------------------------

/// Access key pair for request signing.
#[derive(Debug, Clone)]
pub struct AccessKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Where and how to reach the bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (e.g. MinIO). Switches to path-style addressing.
    pub endpoint: Option<String>,
    /// Unsigned (public-bucket) requests when absent.
    pub credentials: Option<AccessKeys>,
}

pub struct S3Store {
    settings: S3Settings,
    client: reqwest::blocking::Client,
}

impl S3Store {
    pub fn new(settings: S3Settings) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { settings, client })
    }

    fn fetch(&self, url: &str, host: &str, path: &str, query: &[(String, String)]) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url);

        if let Some(keys) = &self.settings.credentials {
            let params = SigningParams {
                access_key_id: &keys.access_key_id,
                secret_access_key: &keys.secret_access_key,
                region: &self.settings.region,
                service: "s3",
            };
            let signed = sign_get_request(&params, host, path, query, Utc::now());
            request = request
                .header("authorization", signed.authorization)
                .header("x-amz-date", signed.amz_date)
                .header("x-amz-content-sha256", signed.content_sha256);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

impl ObjectStore for S3Store {
    fn list(&self, prefix: &str) -> Result<Vec<String>, FetchError> {
        let (url, host, path) = list_url(&self.settings, prefix);
        let query = vec![
            ("list-type".to_string(), "2".to_string()),
            ("prefix".to_string(), prefix.to_string()),
        ];
        let body = self.fetch(&url, &host, &path, &query)?;
        Ok(extract_keys(&String::from_utf8_lossy(&body)))
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        let (url, host, path) = object_url(&self.settings, key);
        self.fetch(&url, &host, &path, &[])
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.settings.bucket)
    }
}

/// URL, Host header and signing path for a GET-object request. The URL
/// carries the percent-encoded key; the signing path stays raw, because
/// the canonical request encodes it itself and must do so exactly once.
fn object_url(settings: &S3Settings, key: &str) -> (String, String, String) {
    let encoded = super::sign::uri_encode(key, false);
    match &settings.endpoint {
        Some(endpoint) => {
            let base = endpoint.trim_end_matches('/');
            let host = strip_scheme(base).to_string();
            (
                format!("{base}/{}/{encoded}", settings.bucket),
                host,
                format!("/{}/{key}", settings.bucket),
            )
        }
        None => {
            let host = format!("{}.s3.{}.amazonaws.com", settings.bucket, settings.region);
            (format!("https://{host}/{encoded}"), host, format!("/{key}"))
        }
    }
}

/// URL, Host header and signing path for a ListObjectsV2 request. The query
/// string is assembled by hand so the sent bytes match the signed ones.
fn list_url(settings: &S3Settings, prefix: &str) -> (String, String, String) {
    let query = format!(
        "list-type=2&prefix={}",
        super::sign::uri_encode(prefix, true)
    );
    match &settings.endpoint {
        Some(endpoint) => {
            let base = endpoint.trim_end_matches('/');
            let host = strip_scheme(base).to_string();
            let path = format!("/{}", settings.bucket);
            (format!("{base}{path}?{query}"), host, path)
        }
        None => {
            let host = format!("{}.s3.{}.amazonaws.com", settings.bucket, settings.region);
            (format!("https://{host}/?{query}"), host, "/".to_string())
        }
    }
}

fn strip_scheme(url: &str) -> &str {
    url.trim_start_matches("https://").trim_start_matches("http://")
}

/// `<Key>` elements of a ListObjectsV2 response, in document order.
fn extract_keys(xml: &str) -> Vec<String> {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    let re = KEY_RE.get_or_init(|| Regex::new(r"<Key>([^<]*)</Key>").expect("static pattern"));
    re.captures_iter(xml)
        .map(|cap| unescape_xml(&cap[1]))
        .collect()
}

/// The five standard XML entities; `&amp;` last so escapes unescape once.
fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// DirStore – the same layout on a local disk snapshot
// ---------------------------------------------------------------------------

/// A bucket mirrored to a local directory (demo snapshots, tests).
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn walk(&self, dir: &Path, keys: &mut Vec<String>) -> Result<(), FetchError> {
        let entries = std::fs::read_dir(dir).map_err(|source| FetchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| FetchError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, keys)?;
            } else if let Ok(rel) = path.strip_prefix(&self.root) {
                // Bucket keys always use forward slashes.
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for DirStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, FetchError> {
        let mut keys = Vec::new();
        if self.root.is_dir() {
            self.walk(&self.root.clone(), &mut keys)?;
        }
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(key);
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeStore {
        objects: Vec<(String, Vec<u8>)>,
    }

    impl FakeStore {
        fn new(keys: &[&str]) -> Self {
            Self {
                objects: keys.iter().map(|k| (k.to_string(), Vec::new())).collect(),
            }
        }
    }

    impl ObjectStore for FakeStore {
        fn list(&self, prefix: &str) -> Result<Vec<String>, FetchError> {
            Ok(self
                .objects
                .iter()
                .map(|(k, _)| k.clone())
                .filter(|k| k.starts_with(prefix))
                .collect())
        }

        fn get(&self, key: &str) -> Result<Vec<u8>, FetchError> {
            self.objects
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| FetchError::HttpStatus {
                    status: 404,
                    url: key.to_string(),
                })
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    #[test]
    fn resolution_prefers_part_file_over_sentinel() {
        let store = FakeStore::new(&[
            "modeling/scores.csv/_SUCCESS",
            "modeling/scores.csv/part-00000.csv",
        ]);
        let key = resolve_key(&store, "modeling/scores.csv", DataFormat::Csv).unwrap();
        assert_eq!(key, "modeling/scores.csv/part-00000.csv");
    }

    #[test]
    fn resolution_falls_back_to_flat_key() {
        let store = FakeStore::new(&[]);
        let key = resolve_key(&store, "modeling/scores.csv", DataFormat::Csv).unwrap();
        assert_eq!(key, "modeling/scores.csv");
    }

    #[test]
    fn resolution_ignores_other_extensions() {
        let store = FakeStore::new(&["cleaned/spine.parquet/part-00000.parquet"]);
        let key = resolve_key(&store, "cleaned/spine.parquet", DataFormat::Csv).unwrap();
        assert_eq!(key, "cleaned/spine.parquet");
    }

    #[test]
    fn resolution_takes_first_part_in_listing_order() {
        let store = FakeStore::new(&[
            "k.csv/part-00000.csv",
            "k.csv/part-00001.csv",
            "k.csv/_committed_123",
        ]);
        let key = resolve_key(&store, "k.csv", DataFormat::Csv).unwrap();
        assert_eq!(key, "k.csv/part-00000.csv");
    }

    #[test]
    fn flat_key_matches_itself_in_listing() {
        // S3 returns the flat file itself when listing it as a prefix.
        let store = FakeStore::new(&["modeling/metadata.csv"]);
        let key = resolve_key(&store, "modeling/metadata.csv", DataFormat::Csv).unwrap();
        assert_eq!(key, "modeling/metadata.csv");
    }

    #[test]
    fn listing_keys_come_out_in_document_order_and_unescaped() {
        let xml = r#"<?xml version="1.0"?>
            <ListBucketResult>
              <Contents><Key>a/part-00000.csv</Key></Contents>
              <Contents><Key>a/b&amp;c.csv</Key></Contents>
            </ListBucketResult>"#;
        let keys = extract_keys(xml);
        assert_eq!(keys, vec!["a/part-00000.csv", "a/b&c.csv"]);
    }

    #[test]
    fn virtual_hosted_and_path_style_urls() {
        let mut settings = S3Settings {
            bucket: "startup-momentum-pipeline".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            credentials: None,
        };

        let (url, host, path) = object_url(&settings, "modeling/features.parquet");
        assert_eq!(
            url,
            "https://startup-momentum-pipeline.s3.us-east-1.amazonaws.com/modeling/features.parquet"
        );
        assert_eq!(host, "startup-momentum-pipeline.s3.us-east-1.amazonaws.com");
        assert_eq!(path, "/modeling/features.parquet");

        settings.endpoint = Some("http://localhost:9000".to_string());
        let (url, host, path) = object_url(&settings, "modeling/features.parquet");
        assert_eq!(
            url,
            "http://localhost:9000/startup-momentum-pipeline/modeling/features.parquet"
        );
        assert_eq!(host, "localhost:9000");
        assert_eq!(path, "/startup-momentum-pipeline/modeling/features.parquet");

        let (url, _, path) = list_url(&settings, "modeling/scores.csv");
        assert_eq!(
            url,
            "http://localhost:9000/startup-momentum-pipeline?list-type=2&prefix=modeling%2Fscores.csv"
        );
        assert_eq!(path, "/startup-momentum-pipeline");
    }

    #[test]
    fn reserved_key_characters_encode_in_the_url_but_not_the_signing_path() {
        let settings = S3Settings {
            bucket: "startup-momentum-pipeline".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            credentials: None,
        };
        let key = "cleaned/date=2026-01-19/part 00000.parquet";
        let (url, _, path) = object_url(&settings, key);
        assert_eq!(
            url,
            "https://startup-momentum-pipeline.s3.us-east-1.amazonaws.com\
             /cleaned/date%3D2026-01-19/part%2000000.parquet"
        );
        // Signing encodes the path itself; handing it a pre-encoded one
        // would double-encode the canonical URI.
        assert_eq!(path, "/cleaned/date=2026-01-19/part 00000.parquet");
    }

    #[test]
    fn dir_store_lists_and_reads_like_a_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let part_dir = dir.path().join("modeling/hiring.csv");
        std::fs::create_dir_all(&part_dir).unwrap();
        std::fs::write(part_dir.join("_SUCCESS"), b"").unwrap();
        std::fs::write(
            part_dir.join("part-00000.csv"),
            b"company_id,hiring_score,hiring_rank\nc1,70.0,1\n",
        )
        .unwrap();

        let store = DirStore::new(dir.path());
        let keys = store.list("modeling/hiring.csv").unwrap();
        assert_eq!(
            keys,
            vec![
                "modeling/hiring.csv/_SUCCESS",
                "modeling/hiring.csv/part-00000.csv"
            ]
        );

        let table = read_dataset(&store, "modeling/hiring.csv", DataFormat::Csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].f64_at("hiring_score"), Some(70.0));

        let missing = store.get("modeling/absent.csv");
        assert!(matches!(missing, Err(FetchError::Io { .. })));
    }
}
