use std::io::Read;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::ClientSettings;
use crate::error::FetchError;

/// Whole-body GET used for the claim files.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).get(url)
    }
}

#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(settings, FetchError::Http)?,
        })
    }

    fn handle_status(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        let mut response = Self::handle_status(url, response)?;
        let mut body = Vec::new();
        response
            .read_to_end(&mut body)
            .map_err(|err| FetchError::Http(format!("read body of {url}: {err}")))?;
        Ok(body)
    }
}

/// Blocking client with the configured user agent and timeout. `wrap`
/// picks the error variant for builder failures.
pub(crate) fn build_client(
    settings: &ClientSettings,
    wrap: fn(String) -> FetchError,
) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&settings.user_agent).map_err(|err| wrap(err.to_string()))?,
    );
    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|err| wrap(err.to_string()))
}
