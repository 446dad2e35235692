use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::domain::{Dataset, MANIFEST, ManifestEntry, TransportKind};
use crate::drive::DriveClient;
use crate::error::FetchError;
use crate::http::HttpClient;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchAction {
    /// The destination already existed; nothing was transferred.
    Skipped,
    Downloaded,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub dataset: Dataset,
    pub source: String,
    pub transport: TransportKind,
    pub action: FetchAction,
    pub path: String,
    pub bytes: Option<u64>,
    pub fetched_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub items: Vec<FetchItemResult>,
}

impl FetchResult {
    pub fn downloaded(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.action == FetchAction::Downloaded)
            .count()
    }
}

/// Fetches manifest entries into a [`Store`], skipping any destination that
/// already exists.
#[derive(Clone)]
pub struct Fetcher<H: HttpClient, D: DriveClient> {
    store: Store,
    http: H,
    drive: D,
}

impl<H: HttpClient, D: DriveClient> Fetcher<H, D> {
    pub fn new(store: Store, http: H, drive: D) -> Self {
        Self { store, http, drive }
    }

    /// Fetches one dataset to `destination`, or to its default path under the
    /// data directory.
    pub fn fetch(
        &self,
        dataset: Dataset,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchItemResult, FetchError> {
        let path = match destination {
            Some(path) => path.to_path_buf(),
            None => self.store.default_path(dataset),
        };
        self.fetch_entry(dataset.entry(), path)
    }

    pub fn fetch_train_claims(
        &self,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchItemResult, FetchError> {
        self.fetch(Dataset::TrainClaims, destination)
    }

    pub fn fetch_dev_claims(
        &self,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchItemResult, FetchError> {
        self.fetch(Dataset::DevClaims, destination)
    }

    pub fn fetch_test_claims(
        &self,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchItemResult, FetchError> {
        self.fetch(Dataset::TestClaims, destination)
    }

    pub fn fetch_dev_baseline(
        &self,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchItemResult, FetchError> {
        self.fetch(Dataset::DevBaseline, destination)
    }

    pub fn fetch_evidence(
        &self,
        destination: Option<&Utf8Path>,
    ) -> Result<FetchItemResult, FetchError> {
        self.fetch(Dataset::Evidence, destination)
    }

    /// Fetches every manifest entry, in manifest order, into `folder` (the
    /// data directory when `None`). Stops at the first failure; files already
    /// written stay on disk.
    pub fn fetch_all(&self, folder: Option<&Utf8Path>) -> Result<FetchResult, FetchError> {
        let folder = match folder {
            Some(folder) => {
                Store::ensure_dir(folder)?;
                folder.to_path_buf()
            }
            None => {
                self.store.ensure_data_dir()?;
                self.store.data_dir().to_path_buf()
            }
        };

        let mut items = Vec::with_capacity(MANIFEST.len());
        for entry in &MANIFEST {
            items.push(self.fetch_entry(entry, folder.join(entry.file_name))?);
        }
        Ok(FetchResult { items })
    }

    fn fetch_entry(
        &self,
        entry: &ManifestEntry,
        path: Utf8PathBuf,
    ) -> Result<FetchItemResult, FetchError> {
        let source = entry.source_url();

        if self.store.exists(&path) {
            info!("File {path} already exists. Skipping download.");
            return Ok(FetchItemResult {
                dataset: entry.dataset,
                source,
                transport: entry.transport,
                action: FetchAction::Skipped,
                path: path.to_string(),
                bytes: None,
                fetched_at: None,
            });
        }

        Store::ensure_parent(&path)?;
        info!("Downloading {} from {source} to {path}.", entry.dataset);
        let start = Instant::now();
        let bytes = match entry.transport {
            TransportKind::DirectHttp => {
                let body = self.http.get(entry.remote_source)?;
                Store::write_bytes_atomic(&path, &body)?;
                body.len() as u64
            }
            TransportKind::CloudDriveId => self.drive.download(entry.remote_source, &path)?,
        };
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes, "Downloaded {path}."
        );

        Ok(FetchItemResult {
            dataset: entry.dataset,
            source,
            transport: entry.transport,
            action: FetchAction::Downloaded,
            path: path.to_string(),
            bytes: Some(bytes),
            fetched_at: Some(iso_timestamp()),
        })
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
