//! Successful API responses and cursor pagination.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::Credentials;
use crate::clients::dispatcher::{Dispatcher, EnvelopeShape};
use crate::clients::errors::{ApiError, ApiErrorKind};
use crate::clients::http_request::RequestEnvelope;
use crate::clients::http_response::HttpResponse;

/// A successful (2xx) API response.
///
/// The response keeps the envelope that produced it and the dispatcher that
/// sent it, so the same call can be repeated or paged through.
///
/// # Example
///
/// ```rust,ignore
/// let mut page = client.helix().get("streams", json!({"first": 100}), options).await?;
/// let mut streams = page.data_as::<Vec<Stream>>()?;
///
/// while page.has_pagination() {
///     page = page.after().await?;
///     streams.extend(page.data_as::<Vec<Stream>>()?);
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    http: HttpResponse,
    cursor: Option<String>,
    shape: EnvelopeShape,
    envelope: RequestEnvelope,
    dispatcher: Dispatcher,
}

impl Response {
    pub(crate) fn new(http: HttpResponse, envelope: RequestEnvelope, dispatcher: Dispatcher) -> Self {
        let shape = dispatcher.config().envelope_shape;
        let cursor = shape.cursor(&http.body);
        Self {
            http,
            cursor,
            shape,
            envelope,
            dispatcher,
        }
    }

    /// Returns the full decoded JSON payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.http.body
    }

    /// Returns the result data: `data` under Helix, the whole payload under Kraken.
    #[must_use]
    pub fn data(&self) -> &Value {
        match self.shape {
            EnvelopeShape::DataWithPagination => {
                self.http.body.get("data").unwrap_or(&self.http.body)
            }
            EnvelopeShape::Flat => &self.http.body,
        }
    }

    /// Deserializes [`data`](Self::data) into `T`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the data does not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.data())
    }

    /// Returns a top-level field of the payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.http.body.get(key)
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.http.code
    }

    /// Returns the underlying HTTP response.
    #[must_use]
    pub const fn http_response(&self) -> &HttpResponse {
        &self.http
    }

    /// Returns `true` if the payload carried a pagination cursor.
    #[must_use]
    pub const fn has_pagination(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns the pagination cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Returns the envelope that produced this response.
    #[must_use]
    pub const fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    /// Returns the credentials that produced this response.
    ///
    /// After a 401-triggered refresh these are the refreshed credentials.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.envelope.credentials.as_ref()
    }

    /// Fetches the next page by setting `after` to the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ApiErrorKind::NoPaginationCursor`] without sending anything
    /// when the response has no cursor, or the error of the new call.
    pub async fn after(&mut self) -> Result<Self, ApiError> {
        self.page("after").await
    }

    /// Fetches the previous page by setting `before` to the cursor.
    ///
    /// # Errors
    ///
    /// Same as [`after`](Self::after).
    pub async fn before(&mut self) -> Result<Self, ApiError> {
        self.page("before").await
    }

    /// Sends the stored envelope again, unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error of the new call.
    pub async fn repeat(&self) -> Result<Self, ApiError> {
        self.dispatcher.send(self.envelope.clone()).await
    }

    async fn page(&mut self, direction: &str) -> Result<Self, ApiError> {
        let Some(cursor) = self.cursor.clone() else {
            return Err(ApiError::new(
                ApiErrorKind::NoPaginationCursor,
                self.envelope.clone(),
                Some(self.http.clone()),
                self.dispatcher.clone(),
            ));
        };

        self.envelope.set_query(direction, cursor);
        self.dispatcher.send(self.envelope.clone()).await
    }
}

// Verify Response is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Response>();
};
