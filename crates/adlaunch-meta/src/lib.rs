//! Meta Graph API surface for the ad-launch pipeline
//!
//! Everything that talks to the platform lives here: the `GraphApi` trait and
//! its reqwest client, the two video upload protocols, the readiness gate,
//! and the creative-spec builder. The rest of the system only consumes the
//! traits, so nothing outside this crate touches the wire formats.

pub mod client;
pub mod creative;
pub mod error;
pub mod readiness;
pub mod retry;
pub mod types;
pub mod upload;

pub use client::{
    CreateAdParams, GraphApi, GraphApiFactory, GraphClient, GraphClientFactory, GraphSettings,
};
pub use creative::{
    build_creative, classify_assets, ActorIdentity, ClassifiedAssets, Creative, CreativeError,
    CreativeSpec, UploadedAsset, UploadedMedia,
};
pub use error::GraphError;
pub use readiness::{wait_for_videos, ReadinessReport};
pub use retry::{retry_with_policy, RetryPolicy};
pub use upload::{AssetUploader, HttpMediaFetcher, MediaFetcher, ProcessedAsset};
