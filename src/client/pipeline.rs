use std::{fmt, sync::Arc};

use thiserror::Error;
use uuid::Uuid;

use crate::{
    ai::{GeneratedListing, ImageInput},
    client::api::{ClientError, MarketplaceApi},
    dto::listings::UpdateListingRequest,
    models::{Listing, ListingStatus},
    services::listing_service::image_problem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    CapturingVoice,
    ImagesAttached,
    Generated,
    Editing,
    Published,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::CapturingVoice => "capturing voice",
            PipelineState::ImagesAttached => "images attached",
            PipelineState::Generated => "generated",
            PipelineState::Editing => "editing",
            PipelineState::Published => "published",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: PipelineState,
        action: &'static str,
    },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ClientError),
}

/// Drives one listing from a spoken description to a published product.
///
/// Steps must be called in order: [`record_transcript`](Self::record_transcript),
/// [`attach_images`](Self::attach_images), [`generate`](Self::generate), any
/// number of [`edit`](Self::edit) calls, then [`publish`](Self::publish).
/// A failed network step leaves the state untouched.
pub struct ListingPipeline {
    api: Arc<dyn MarketplaceApi>,
    state: PipelineState,
    transcript: Option<String>,
    images: Vec<ImageInput>,
    listing_id: Option<Uuid>,
    draft: Option<GeneratedListing>,
    edits: UpdateListingRequest,
    published: Option<Listing>,
}

impl ListingPipeline {
    pub fn new(api: Arc<dyn MarketplaceApi>) -> Self {
        Self {
            api,
            state: PipelineState::CapturingVoice,
            transcript: None,
            images: Vec::new(),
            listing_id: None,
            draft: None,
            edits: UpdateListingRequest::default(),
            published: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn images(&self) -> &[ImageInput] {
        &self.images
    }

    pub fn listing_id(&self) -> Option<Uuid> {
        self.listing_id
    }

    /// The generator's output, as returned by the server.
    pub fn draft(&self) -> Option<&GeneratedListing> {
        self.draft.as_ref()
    }

    /// The structured fields that [`publish`](Self::publish) will send.
    pub fn edits(&self) -> &UpdateListingRequest {
        &self.edits
    }

    pub fn published(&self) -> Option<&Listing> {
        self.published.as_ref()
    }

    fn expect_state(
        &self,
        allowed: &[PipelineState],
        action: &'static str,
    ) -> Result<(), PipelineError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    /// Stores the final speech-recognition transcript. May be repeated until
    /// images are attached.
    pub fn record_transcript(
        &mut self,
        transcript: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.expect_state(&[PipelineState::CapturingVoice], "record a transcript")?;
        let transcript = transcript.into();
        if transcript.trim().is_empty() {
            return Err(PipelineError::Validation("Transcript is empty".into()));
        }
        self.transcript = Some(transcript);
        Ok(())
    }

    pub fn attach_images(&mut self, images: Vec<ImageInput>) -> Result<(), PipelineError> {
        self.expect_state(&[PipelineState::CapturingVoice], "attach images")?;
        if self.transcript.is_none() {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                action: "attach images before a transcript",
            });
        }
        if let Some(problem) = image_problem(&images) {
            return Err(PipelineError::Validation(problem));
        }
        self.images = images;
        self.state = PipelineState::ImagesAttached;
        Ok(())
    }

    /// Uploads transcript and images and stores the generated draft.
    pub async fn generate(&mut self) -> Result<&GeneratedListing, PipelineError> {
        self.expect_state(&[PipelineState::ImagesAttached], "generate")?;
        let transcript = self.transcript.as_deref().unwrap_or_default();

        let response = self.api.generate_listing(transcript, &self.images).await?;
        tracing::info!(
            listing_id = %response.listing_id,
            fallback_used = response.draft.fallback_used,
            "listing draft generated"
        );

        self.edits = edits_from_listing(&response.listing);
        self.listing_id = Some(response.listing_id);
        self.state = PipelineState::Generated;
        Ok(self.draft.insert(response.draft))
    }

    /// Applies local edits to the draft. Nothing is sent until publish.
    pub fn edit(
        &mut self,
        apply: impl FnOnce(&mut UpdateListingRequest),
    ) -> Result<(), PipelineError> {
        self.expect_state(&[PipelineState::Generated, PipelineState::Editing], "edit")?;
        apply(&mut self.edits);
        self.state = PipelineState::Editing;
        Ok(())
    }

    /// Saves the edits and marks the listing active.
    pub async fn publish(&mut self) -> Result<&Listing, PipelineError> {
        self.expect_state(&[PipelineState::Generated, PipelineState::Editing], "publish")?;
        validate_edits(&self.edits)?;
        let Some(listing_id) = self.listing_id else {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                action: "publish without a generated listing",
            });
        };

        self.api.update_listing(listing_id, &self.edits).await?;
        let listing = self
            .api
            .update_listing_status(listing_id, ListingStatus::Active)
            .await?;

        tracing::info!(%listing_id, "listing published");
        self.state = PipelineState::Published;
        Ok(self.published.insert(listing))
    }
}

fn edits_from_listing(listing: &Listing) -> UpdateListingRequest {
    UpdateListingRequest {
        title: Some(listing.title.clone()),
        description: Some(listing.description.clone()),
        price: Some(listing.price),
        original_price: Some(listing.original_price),
        category: Some(listing.category.clone()),
        tags: Some(listing.tags.clone()),
        features: Some(listing.features.clone()),
        specifications: Some(listing.specifications.clone()),
        story: Some(listing.story.clone()),
        in_stock: Some(listing.in_stock),
        stock_count: Some(listing.stock_count),
        shipping_info: Some(listing.shipping_info.clone()),
    }
}

fn validate_edits(edits: &UpdateListingRequest) -> Result<(), PipelineError> {
    if edits.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(PipelineError::Validation("Title is required".into()));
    }
    if edits.price.is_none_or(|p| p <= 0) {
        return Err(PipelineError::Validation("Price must be greater than zero".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_requires_title_and_price() {
        let mut edits = UpdateListingRequest {
            title: Some("Terracotta Planter".into()),
            price: Some(59_900),
            ..Default::default()
        };
        assert!(validate_edits(&edits).is_ok());

        edits.price = Some(0);
        assert!(matches!(validate_edits(&edits), Err(PipelineError::Validation(_))));

        edits.price = Some(59_900);
        edits.title = Some("   ".into());
        assert!(validate_edits(&edits).is_err());
    }

    #[test]
    fn transition_errors_name_the_state() {
        let err = PipelineError::InvalidTransition {
            from: PipelineState::Published,
            action: "edit",
        };
        assert_eq!(err.to_string(), "cannot edit while published");
    }
}
