//! Client-side building blocks for marketplace frontends: a typed HTTP client,
//! the search/filter controller, and the voice-to-listing pipeline. None of
//! these depend on a UI toolkit; a frontend drives them and renders their state.

pub mod api;
pub mod debounce;
pub mod pipeline;
pub mod search;

pub use api::{ClientError, ListingPage, MarketplaceApi, MarketplaceClient};
pub use debounce::Debouncer;
pub use pipeline::{ListingPipeline, PipelineError, PipelineState};
pub use search::{Filters, ListingCard, PageControls, SearchController};
