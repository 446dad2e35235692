mod common;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use reqwest::Url;

use climate_fact_data::config::ClientSettings;
use climate_fact_data::domain::DRIVE_DOWNLOAD_URL;
use climate_fact_data::drive::{
    DriveClient, GoogleDriveClient, MAX_CONFIRM_HOPS, resolve_confirm_url,
};
use climate_fact_data::error::FetchError;

use common::{Reply, ScriptedServer};

const VIRUS_SCAN_PAGE: &str = r#"<!DOCTYPE html><html><body>
<p class="uc-warning-subcaption">Google Drive can't scan this file for viruses.</p>
<form id="download-form" action="https://drive.usercontent.google.com/download" method="get">
<input type="submit" id="uc-download-link" value="Download anyway"/>
<input type="hidden" name="id" value="1JlUzRufknsHzKzvrEjgw8D3n_IRpjzo6">
<input type="hidden" name="export" value="download">
<input type="hidden" name="confirm" value="t">
<input type="hidden" name="uuid" value="4f1c-9a">
</form></body></html>"#;

const LEGACY_PAGE: &str = r#"<html><body>
<a id="uc-download-link" href="/uc?export=download&amp;confirm=AbCd&amp;id=abc">Download anyway</a>
</body></html>"#;

const QUOTA_PAGE: &str = r#"<html><body>
<p class="uc-error-caption">Sorry, you can't view or download this file at this time.</p>
<p class="uc-error-subcaption">Too many users have viewed or downloaded this file recently.</p>
</body></html>"#;

fn drive_base() -> Url {
    Url::parse(DRIVE_DOWNLOAD_URL).unwrap()
}

fn form_page(action: &str) -> String {
    format!(
        r#"<html><body><form id="download-form" action="{action}" method="get">
<input type="hidden" name="id" value="abc">
<input type="hidden" name="export" value="download">
<input type="hidden" name="confirm" value="t">
</form></body></html>"#
    )
}

fn destination(temp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("evidence.json")).unwrap()
}

#[test]
fn resolve_form_action_with_hidden_inputs() {
    let url = resolve_confirm_url(
        &drive_base(),
        "1JlUzRufknsHzKzvrEjgw8D3n_IRpjzo6",
        VIRUS_SCAN_PAGE,
    )
    .unwrap();
    assert_eq!(url.host_str(), Some("drive.usercontent.google.com"));
    assert_eq!(url.path(), "/download");
    let pairs = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();
    assert!(pairs.contains(&("confirm".to_string(), "t".to_string())));
    assert!(pairs.contains(&(
        "id".to_string(),
        "1JlUzRufknsHzKzvrEjgw8D3n_IRpjzo6".to_string()
    )));
    assert!(pairs.contains(&("uuid".to_string(), "4f1c-9a".to_string())));
}

#[test]
fn resolve_legacy_confirm_link() {
    let url = resolve_confirm_url(&drive_base(), "abc", LEGACY_PAGE).unwrap();
    assert_eq!(
        url.as_str(),
        "https://drive.google.com/uc?export=download&confirm=AbCd&id=abc"
    );
}

#[test]
fn quota_page_reports_caption() {
    let err = resolve_confirm_url(&drive_base(), "abc", QUOTA_PAGE).unwrap_err();
    assert_matches!(
        err,
        FetchError::DriveConfirm { file_id, reason }
            if file_id == "abc" && reason.starts_with("Too many users")
    );
}

#[test]
fn existing_destination_skips_network() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("evidence.json")).unwrap();
    std::fs::write(path.as_std_path(), b"{}").unwrap();

    let client = GoogleDriveClient::new(&ClientSettings::default()).unwrap();
    let bytes = client.download("not-a-real-id", &path).unwrap();

    assert_eq!(bytes, 2);
    assert_eq!(std::fs::read(path.as_std_path()).unwrap(), b"{}");
}

#[test]
fn follows_confirmation_form_and_writes_file() {
    let server = ScriptedServer::bind();
    let base = server.base_url();
    let body = br#"{"evidence-0": "passage"}"#.to_vec();
    let handle = server.serve(vec![
        Reply::new("200 OK", "text/html; charset=utf-8", form_page(&format!("{base}/download"))),
        Reply::new("200 OK", "application/json", body.clone())
            .header("Content-Disposition", "attachment; filename=\"evidence.json\""),
    ]);

    let temp = tempfile::tempdir().unwrap();
    let path = destination(&temp);
    let client =
        GoogleDriveClient::with_base_url(&ClientSettings::default(), &format!("{base}/uc")).unwrap();
    let bytes = client.download("abc", &path).unwrap();

    assert_eq!(bytes, body.len() as u64);
    assert_eq!(std::fs::read(path.as_std_path()).unwrap(), body);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);

    let requests = handle.join().unwrap();
    assert_eq!(requests[0], "GET /uc?id=abc&export=download HTTP/1.1");
    assert!(requests[1].starts_with("GET /download?"));
    assert!(requests[1].contains("confirm=t"));
}

#[test]
fn error_status_becomes_drive_status() {
    let server = ScriptedServer::bind();
    let base = server.base_url();
    let handle = server.serve(vec![Reply::new(
        "403 Forbidden",
        "text/html",
        r#"<p class="uc-error-subcaption">You need access</p>"#,
    )]);

    let temp = tempfile::tempdir().unwrap();
    let path = destination(&temp);
    let client =
        GoogleDriveClient::with_base_url(&ClientSettings::default(), &format!("{base}/uc")).unwrap();
    let err = client.download("abc", &path).unwrap_err();

    assert_matches!(
        err,
        FetchError::DriveStatus { status: 403, message } if message == "You need access"
    );
    assert!(!path.as_std_path().exists());
    assert_eq!(handle.join().unwrap().len(), 1);
}

#[test]
fn endless_confirmation_pages_give_up() {
    let server = ScriptedServer::bind();
    let base = server.base_url();
    let page = form_page(&format!("{base}/download"));
    let replies = (0..=MAX_CONFIRM_HOPS)
        .map(|_| Reply::new("200 OK", "text/html", page.clone()))
        .collect::<Vec<_>>();
    let handle = server.serve(replies);

    let temp = tempfile::tempdir().unwrap();
    let path = destination(&temp);
    let client =
        GoogleDriveClient::with_base_url(&ClientSettings::default(), &format!("{base}/uc")).unwrap();
    let err = client.download("abc", &path).unwrap_err();

    assert_matches!(err, FetchError::DriveConfirm { file_id, .. } if file_id == "abc");
    assert!(!path.as_std_path().exists());
    assert_eq!(handle.join().unwrap().len(), MAX_CONFIRM_HOPS + 1);
}
