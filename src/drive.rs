use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::config::ClientSettings;
use crate::domain::DRIVE_DOWNLOAD_URL;
use crate::error::FetchError;
use crate::http::build_client;
use crate::store::Store;

/// Interstitial pages are followed at most this many times per download.
pub const MAX_CONFIRM_HOPS: usize = 3;

static DOWNLOAD_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"id="download-form"[^>]*action="([^"]+)""#).expect("download form pattern")
});
static HIDDEN_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input type="hidden" name="([^"]+)" value="([^"]*)""#)
        .expect("hidden input pattern")
});
static CONFIRM_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(/uc\?export=download[^"]*confirm=[^"]+)""#).expect("confirm href pattern")
});
static ERROR_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p class="uc-error-subcaption">([^<]*)</p>"#).expect("error caption pattern")
});

/// Large-file download by Drive file id. Implementations skip the transfer
/// when `destination` already exists and return the size of the file that
/// ends up there.
pub trait DriveClient: Send + Sync {
    fn download(&self, file_id: &str, destination: &Utf8Path) -> Result<u64, FetchError>;
}

impl<T: DriveClient + ?Sized> DriveClient for &T {
    fn download(&self, file_id: &str, destination: &Utf8Path) -> Result<u64, FetchError> {
        (**self).download(file_id, destination)
    }
}

#[derive(Clone)]
pub struct GoogleDriveClient {
    client: Client,
    base_url: Url,
}

impl GoogleDriveClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, FetchError> {
        Self::with_base_url(settings, DRIVE_DOWNLOAD_URL)
    }

    /// `base_url` is the `uc` endpoint; relative confirmation links resolve
    /// against it.
    pub fn with_base_url(settings: &ClientSettings, base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|err| FetchError::DriveHttp(err.to_string()))?;
        Ok(Self {
            client: build_client(settings, FetchError::DriveHttp)?,
            base_url,
        })
    }

    pub fn download_url(&self, file_id: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("id", file_id)
            .append_pair("export", "download");
        url
    }

    fn send(&self, url: Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::DriveHttp(err.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .ok()
            .and_then(|body| error_caption(&body))
            .unwrap_or_else(|| "Google Drive request failed".to_string());
        Err(FetchError::DriveStatus { status, message })
    }

    /// Follows virus-scan interstitials until Drive answers with the file.
    fn open_file_response(&self, file_id: &str) -> Result<Response, FetchError> {
        let mut url = self.download_url(file_id);
        for _ in 0..=MAX_CONFIRM_HOPS {
            let response = self.send(url)?;
            if !is_interstitial(&response) {
                return Ok(response);
            }
            let page = response
                .text()
                .map_err(|err| FetchError::DriveHttp(err.to_string()))?;
            url = resolve_confirm_url(&self.base_url, file_id, &page)?;
            debug!(file_id, %url, "following Google Drive confirmation page");
        }
        Err(FetchError::DriveConfirm {
            file_id: file_id.to_string(),
            reason: format!("still on a confirmation page after {MAX_CONFIRM_HOPS} redirects"),
        })
    }
}

impl DriveClient for GoogleDriveClient {
    fn download(&self, file_id: &str, destination: &Utf8Path) -> Result<u64, FetchError> {
        if destination.as_std_path().exists() {
            info!("File {destination} already exists. Skipping download.");
            return existing_len(destination.as_std_path());
        }

        let mut response = self.open_file_response(file_id)?;
        Store::ensure_parent(destination)?;
        let mut temp = Store::temp_file_for(destination)?;
        let bytes = std::io::copy(&mut response, &mut temp)
            .map_err(|err| FetchError::DriveHttp(format!("read body of {file_id}: {err}")))?;
        temp.persist(destination.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("persist {destination}: {err}")))?;
        info!(file_id, bytes, "Google Drive download finished");
        Ok(bytes)
    }
}

fn is_interstitial(response: &Response) -> bool {
    if response.headers().contains_key(CONTENT_DISPOSITION) {
        return false;
    }
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("text/html"))
        .unwrap_or(false)
}

fn existing_len(path: &Path) -> Result<u64, FetchError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|err| FetchError::Filesystem(format!("stat {}: {err}", path.display())))
}

/// Extracts the real download link from a Drive interstitial page. Relative
/// links resolve against `base`.
pub fn resolve_confirm_url(base: &Url, file_id: &str, page: &str) -> Result<Url, FetchError> {
    if let Some(action) = DOWNLOAD_FORM.captures(page).and_then(|caps| caps.get(1)) {
        let params = HIDDEN_INPUT
            .captures_iter(page)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), unescape_html(caps.get(2)?.as_str()))))
            .collect::<Vec<_>>();
        let mut url = base
            .join(&unescape_html(action.as_str()))
            .map_err(|err| FetchError::DriveHttp(err.to_string()))?;
        url.query_pairs_mut().clear().extend_pairs(&params);
        return Ok(url);
    }

    if let Some(href) = CONFIRM_HREF.captures(page).and_then(|caps| caps.get(1)) {
        return base
            .join(&unescape_html(href.as_str()))
            .map_err(|err| FetchError::DriveHttp(err.to_string()));
    }

    Err(FetchError::DriveConfirm {
        file_id: file_id.to_string(),
        reason: error_caption(page).unwrap_or_else(|| "no confirmation link on page".to_string()),
    })
}

fn error_caption(page: &str) -> Option<String> {
    ERROR_CAPTION
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|caption| unescape_html(caption.as_str().trim()))
        .filter(|caption| !caption.is_empty())
}

fn unescape_html(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
