use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, multipart};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    ai::ImageInput,
    dto::listings::{GenerateListingResponse, UpdateListingRequest, UpdateListingStatusRequest},
    models::{ArtisanSummary, Listing, ListingStatus},
    response::{ApiResponse, Meta},
    routes::params::ListingQuery,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("response carried no data")]
    MissingData,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// One page of search results together with its pagination meta.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub meta: Meta,
}

/// The slice of the marketplace API the client controllers depend on.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn search_listings(&self, query: &ListingQuery) -> Result<ListingPage, ClientError>;

    async fn artisan(&self, id: Uuid) -> Result<ArtisanSummary, ClientError>;

    async fn generate_listing(
        &self,
        transcription: &str,
        images: &[ImageInput],
    ) -> Result<GenerateListingResponse, ClientError>;

    async fn update_listing(
        &self,
        id: Uuid,
        edits: &UpdateListingRequest,
    ) -> Result<Listing, ClientError>;

    async fn update_listing_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Listing, ClientError>;
}

#[derive(Clone)]
pub struct MarketplaceClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for MarketplaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl MarketplaceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attaches a bearer token to every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = self.authorized(request).send().await?;
        decode_envelope(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(request.json(body))
            .await?
            .data
            .ok_or(ClientError::MissingData)
    }
}

async fn decode_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiResponse<T>, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Pulls the message out of an error envelope, falling back to the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl MarketplaceApi for MarketplaceClient {
    async fn search_listings(&self, query: &ListingQuery) -> Result<ListingPage, ClientError> {
        #[derive(serde::Deserialize)]
        struct Items {
            items: Vec<Listing>,
        }

        let envelope: ApiResponse<Items> =
            self.send(self.http.get(self.url("/listings")).query(query)).await?;
        let items = envelope.data.ok_or(ClientError::MissingData)?.items;
        Ok(ListingPage {
            items,
            meta: envelope.meta.unwrap_or_else(Meta::empty),
        })
    }

    async fn artisan(&self, id: Uuid) -> Result<ArtisanSummary, ClientError> {
        self.send(self.http.get(self.url(&format!("/artisans/{id}"))))
            .await?
            .data
            .ok_or(ClientError::MissingData)
    }

    async fn generate_listing(
        &self,
        transcription: &str,
        images: &[ImageInput],
    ) -> Result<GenerateListingResponse, ClientError> {
        let mut form = multipart::Form::new().text("transcription", transcription.to_string());
        for image in images {
            let part = multipart::Part::bytes(image.bytes.clone())
                .file_name(image.filename.clone())
                .mime_str(&image.content_type)?;
            form = form.part("images", part);
        }

        tracing::debug!(images = images.len(), "uploading listing draft");
        self.send(self.http.post(self.url("/listings/generate")).multipart(form))
            .await?
            .data
            .ok_or(ClientError::MissingData)
    }

    async fn update_listing(
        &self,
        id: Uuid,
        edits: &UpdateListingRequest,
    ) -> Result<Listing, ClientError> {
        self.send_json(self.http.put(self.url(&format!("/listings/{id}"))), edits)
            .await
    }

    async fn update_listing_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Listing, ClientError> {
        let body = UpdateListingStatusRequest {
            status: status.as_str().to_string(),
        };
        self.send_json(self.http.patch(self.url(&format!("/listings/{id}/status"))), &body)
            .await
    }
}
