//! Access to the remote HTTP service.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::{form_urlencoded, Url};

use std::time::Duration;

use crate::error::Error;

/// Query or form parameters of a request.
pub type Params = [(String, String)];

/// A successful answer from the remote service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// The remote service, addressed by paths relative to a fixed host.
///
/// Implementations make a single attempt per call. A non-success status is returned as
/// [`Error::Remote`] and transport failures as [`Error::Transport`].
#[async_trait]
pub trait Remote: Send + Sync {
    async fn get(&self, path: &str, query: &Params) -> Result<Response, Error>;

    async fn post(&self, path: &str, form: &Params) -> Result<Response, Error>;
}

/// A [`Remote`] over HTTP.
pub struct HttpRemote {
    client: reqwest::Client,
    base: Url,
}

impl HttpRemote {
    /// Returns an `HttpRemote` sending requests to `base`. Requests never time out unless
    /// `timeout` is given.
    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpRemote {
            client: builder.build()?,
            base,
        })
    }

    /// Returns the URL of `path` with `query` appended.
    fn url(&self, path: &str, query: &Params) -> Result<Url, Error> {
        let mut url = self.base.join(path)?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn get(&self, path: &str, query: &Params) -> Result<Response, Error> {
        let url = self.url(path, query)?;
        let response = self.client.get(url).send().await?;

        into_response(response).await
    }

    async fn post(&self, path: &str, form: &Params) -> Result<Response, Error> {
        let url = self.url(path, &[])?;
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();

        let response = self.client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        into_response(response).await
    }
}

/// Reads the body of a successful response, or returns [`Error::Remote`] for any other status.
async fn into_response(response: reqwest::Response) -> Result<Response, Error> {
    let status = response.status();

    if !status.is_success() {
        return Err(Error::Remote {
            status: status.as_u16(),
        });
    }

    Ok(Response {
        status: status.as_u16(),
        body: response.text().await?,
    })
}
