//! OpenAPI documentation, served as JSON at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use adlaunch_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ad Launch API",
        version = "0.1.0",
        description = "Launches batches of ad drafts to the Meta Marketing API: uploads the draft assets, waits for video processing, builds the creative, and creates the ads. Endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::launch_ads::launch_ads,
        handlers::health::health,
    ),
    components(
        schemas(
            handlers::launch_ads::LaunchAdsRequest,
            handlers::launch_ads::LaunchAdsResponse,
            models::AdDraft,
            models::AdDraftAsset,
            models::AssetKind,
            models::SiteLink,
            models::DraftStatus,
            models::AdDeliveryStatus,
            models::AssetResult,
            models::DraftResult,
            models::LaunchTotals,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "ads", description = "Ad draft launch operations"),
        (name = "health", description = "Service health check")
    )
)]
pub struct ApiDoc;
