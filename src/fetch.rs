//! Single-shot HTTP access to the published fuel-price data.
//!
//! Files live in the `Doreapp/prix-carburants` repository and are served through the
//! raw-content host; [`DataFetcher::get_file`] composes `base_url + ref + "/" + path`.
//!
//! ### Notes
//! - One GET per call: no retry, no cache, no timeout.
//! - Only a 2xx status counts as success. Any other status fails with
//!   [`FetchError::Status`], which keeps the status code and raw body.
//!
//! Typical usage:
//! ```no_run
//! # use carburants::fetch::DataFetcher;
//! let fetcher = DataFetcher::default();
//! let points = fetcher.get_sale_points("data/20220526.json", "data")?;
//! println!("{} sale points", points.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::FetchError;
use crate::models::{Metrics, SalePoints};
use chrono::NaiveDate;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/Doreapp/prix-carburants/";
pub const DEFAULT_DATA_PATH: &str = "data/20220526.json";
pub const DEFAULT_DATA_REF: &str = "data";
pub const DEFAULT_REF: &str = "main";

/// Successful response: status and body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DataFetcher {
    pub base_url: String,
    http: HttpClient,
}

impl Default for DataFetcher {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

// Keep path separators and the usual file-name characters readable.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn enc_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_encoding::utf8_percent_encode(s.trim(), PATH_SAFE).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Repository path of the sale-points snapshot published for `date`.
pub fn data_path_for(date: NaiveDate) -> String {
    format!("data/{}.json", date.format("%Y%m%d"))
}

impl DataFetcher {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(None) // single-shot semantics: no request timeout
            .redirect(Policy::limited(5))
            .user_agent(concat!("carburants/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url, http }
    }

    /// Issue one GET request.
    pub fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        log::debug!("GET to {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        let text = resp.text().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(RawResponse {
            url: url.to_string(),
            status: status.as_u16(),
            text,
        })
    }

    /// GET and decode the body as JSON.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let resp = self.get(url)?;
        serde_json::from_str(&resp.text).map_err(|source| FetchError::Parse {
            url: resp.url,
            source,
        })
    }

    /// URL of a repository file at a branch or commit.
    pub fn file_url(&self, path: &str, git_ref: &str) -> String {
        format!("{}{}/{}", self.base_url, enc_path(git_ref), enc_path(path))
    }

    /// Fetch a single repository file, raw.
    pub fn get_file(&self, path: &str, git_ref: &str) -> Result<RawResponse, FetchError> {
        self.get(&self.file_url(path, git_ref))
    }

    /// Fetch and decode a JSON repository file.
    pub fn get_file_json<T: DeserializeOwned>(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<T, FetchError> {
        self.get_json(&self.file_url(path, git_ref))
    }

    /// The reference sale-points snapshot.
    pub fn get_data(&self) -> Result<SalePoints, FetchError> {
        self.get_sale_points(DEFAULT_DATA_PATH, DEFAULT_DATA_REF)
    }

    /// The sale-points snapshot published for `date`.
    pub fn get_data_for(&self, date: NaiveDate) -> Result<SalePoints, FetchError> {
        self.get_sale_points(&data_path_for(date), DEFAULT_DATA_REF)
    }

    pub fn get_sale_points(&self, path: &str, git_ref: &str) -> Result<SalePoints, FetchError> {
        self.get_file_json(path, git_ref)
    }

    pub fn get_metrics(&self, path: &str, git_ref: &str) -> Result<Metrics, FetchError> {
        self.get_file_json(path, git_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_repository_urls() {
        let f = DataFetcher::default();
        assert_eq!(
            f.file_url("data/20220526.json", "data"),
            "https://raw.githubusercontent.com/Doreapp/prix-carburants/data/data/20220526.json"
        );
        assert_eq!(
            f.file_url("/assets/my file.json", "main"),
            "https://raw.githubusercontent.com/Doreapp/prix-carburants/main/assets/my%20file.json"
        );
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let f = DataFetcher::with_base_url("http://127.0.0.1:9");
        assert_eq!(f.file_url("a.json", "main"), "http://127.0.0.1:9/main/a.json");
    }

    #[test]
    fn dated_paths() {
        let d = NaiveDate::from_ymd_opt(2022, 5, 26).unwrap();
        assert_eq!(data_path_for(d), "data/20220526.json");
    }
}
