use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

macro_rules! claims_base {
    () => {
        "https://raw.githubusercontent.com/drcarenhan/COMP90042_2024/main/data/"
    };
}

macro_rules! claims_url {
    ($file:literal) => {
        concat!(claims_base!(), $file)
    };
}

pub const CLAIMS_BASE_URL: &str = claims_base!();

pub const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc";

pub const EVIDENCE_DRIVE_ID: &str = "1JlUzRufknsHzKzvrEjgw8D3n_IRpjzo6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    /// Labelled training claims with evidence ids.
    TrainClaims,
    /// Labelled development claims.
    DevClaims,
    /// Unlabelled test claims.
    TestClaims,
    /// Baseline predictions for the development set.
    DevBaseline,
    /// Evidence passages searched by the fact checker.
    Evidence,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::TrainClaims => "train-claims",
            Dataset::DevClaims => "dev-claims",
            Dataset::TestClaims => "test-claims",
            Dataset::DevBaseline => "dev-baseline",
            Dataset::Evidence => "evidence",
        }
    }

    pub fn entry(&self) -> &'static ManifestEntry {
        match self {
            Dataset::TrainClaims => &MANIFEST[0],
            Dataset::DevClaims => &MANIFEST[1],
            Dataset::TestClaims => &MANIFEST[2],
            Dataset::DevBaseline => &MANIFEST[3],
            Dataset::Evidence => &MANIFEST[4],
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        MANIFEST
            .iter()
            .map(|entry| entry.dataset)
            .find(|dataset| dataset.as_str() == normalized)
            .ok_or_else(|| FetchError::UnknownDataset(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    DirectHttp,
    CloudDriveId,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::DirectHttp => "http",
            TransportKind::CloudDriveId => "gdrive",
        };
        f.pad(name)
    }
}

/// One downloadable file. `remote_source` is a URL for
/// [`TransportKind::DirectHttp`] and a Drive file id for
/// [`TransportKind::CloudDriveId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub dataset: Dataset,
    pub remote_source: &'static str,
    pub transport: TransportKind,
    pub file_name: &'static str,
}

impl ManifestEntry {
    /// Human-facing location of the source, used in logs and results.
    pub fn source_url(&self) -> String {
        match self.transport {
            TransportKind::DirectHttp => self.remote_source.to_string(),
            TransportKind::CloudDriveId => {
                format!("{DRIVE_DOWNLOAD_URL}?id={}", self.remote_source)
            }
        }
    }
}

/// Fetch order for `fetch_all`.
pub static MANIFEST: [ManifestEntry; 5] = [
    ManifestEntry {
        dataset: Dataset::TrainClaims,
        remote_source: claims_url!("train-claims.json"),
        transport: TransportKind::DirectHttp,
        file_name: "train-claims.json",
    },
    ManifestEntry {
        dataset: Dataset::DevClaims,
        remote_source: claims_url!("dev-claims.json"),
        transport: TransportKind::DirectHttp,
        file_name: "dev-claims.json",
    },
    ManifestEntry {
        dataset: Dataset::TestClaims,
        remote_source: claims_url!("test-claims-unlabelled.json"),
        transport: TransportKind::DirectHttp,
        file_name: "test-claims-unlabelled.json",
    },
    ManifestEntry {
        dataset: Dataset::DevBaseline,
        remote_source: claims_url!("dev-claims-baseline.json"),
        transport: TransportKind::DirectHttp,
        file_name: "dev-claims-baseline.json",
    },
    ManifestEntry {
        dataset: Dataset::Evidence,
        remote_source: EVIDENCE_DRIVE_ID,
        transport: TransportKind::CloudDriveId,
        file_name: "evidence.json",
    },
];
