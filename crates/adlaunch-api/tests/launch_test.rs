//! Launch endpoint integration tests.
//!
//! Run with: `cargo test -p adlaunch-api --test launch_test`
//! Everything runs against in-memory fakes; timeout scenarios use the paused
//! tokio clock so no test waits on real time.

mod helpers;

use chrono::{Duration as ChronoDuration, Utc};
use helpers::{
    image_draft_body, seeded_brand, setup_test_app, setup_test_app_with_media, ErrSpec,
};

use adlaunch_core::models::DraftStatus;

fn video_draft_body(brand_id: &str) -> serde_json::Value {
    serde_json::json!({
        "brandId": brand_id,
        "adAccountId": "123456",
        "fbPageId": "page-1",
        "drafts": [
            {
                "id": "draft-1",
                "adName": "Story Clip",
                "campaignId": "c-1",
                "adSetId": "as-1",
                "primaryText": "Watch this",
                "destinationUrl": "https://example.com",
                "assets": [
                    {
                        "name": "clip_9x16.mp4",
                        "type": "video",
                        "sourceUrl": "https://cdn.test.invalid/concepts/story/clip_9x16.mp4",
                        "aspectRatios": ["9:16"]
                    }
                ]
            }
        ]
    })
}

#[tokio::test]
async fn test_missing_brand_id_is_rejected() {
    let app = setup_test_app();

    let mut body = image_draft_body("brand-1");
    body.as_object_mut().unwrap().remove("brandId");

    let response = app.server.post("/api/v0/ads/launch").json(&body).await;
    assert_eq!(response.status_code(), 400);

    let error: serde_json::Value = response.json();
    assert_eq!(error["code"], "INVALID_INPUT");
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("Missing required field: brandId"));

    // Nothing reached the platform
    assert_eq!(app.graph.call_count(), 0);
}

#[tokio::test]
async fn test_empty_draft_list_is_rejected() {
    let app = setup_test_app();

    let mut body = image_draft_body("brand-1");
    body["drafts"] = serde_json::json!([]);

    let response = app.server.post("/api/v0/ads/launch").json(&body).await;
    assert_eq!(response.status_code(), 400);

    let error: serde_json::Value = response.json();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("At least one draft is required"));
}

#[tokio::test]
async fn test_unknown_brand_returns_404() {
    let app = setup_test_app();

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("no-such-brand"))
        .await;
    assert_eq!(response.status_code(), 404);

    let error: serde_json::Value = response.json();
    assert_eq!(error["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_expired_token_returns_401_before_any_upload() {
    let app = setup_test_app();

    let mut brand = seeded_brand("brand-1");
    brand.expires_at = Some(Utc::now() - ChronoDuration::hours(1));
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), brand);

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 401);

    let error: serde_json::Value = response.json();
    assert_eq!(error["code"], "TOKEN_EXPIRED");
    assert_eq!(app.graph.call_count(), 0);
}

#[tokio::test]
async fn test_incomplete_credential_record_returns_500() {
    let app = setup_test_app();

    let mut brand = seeded_brand("brand-1");
    brand.token_iv = None;
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), brand);

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 500);

    let error: serde_json::Value = response.json();
    assert_eq!(error["code"], "CREDENTIAL_ERROR");
    // Decryption internals must not leak
    assert_eq!(error["error"], "Failed to access brand credentials");
}

#[tokio::test]
async fn test_corrupt_auth_tag_returns_500() {
    use base64::{engine::general_purpose, Engine as _};

    let app = setup_test_app();

    let mut brand = seeded_brand("brand-1");
    brand.token_auth_tag = Some(general_purpose::STANDARD.encode([0u8; 16]));
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), brand);

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 500);

    let error: serde_json::Value = response.json();
    assert_eq!(error["code"], "CREDENTIAL_ERROR");
}

#[tokio::test]
async fn test_image_draft_publishes() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["summary"]["total"], 1);
    assert_eq!(body["summary"]["successful"], 1);
    assert_eq!(body["results"][0]["status"], "PUBLISHED");
    assert_eq!(body["results"][0]["adId"], "ad-1");
    assert_eq!(
        body["results"][0]["assets"][0]["metaHash"],
        "hash-hero_1x1.png"
    );
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("1 published, 0 uploaded, 0 failed"));

    assert_eq!(
        app.draft_store.final_status("draft-1"),
        Some((DraftStatus::Published, None))
    );
    assert_eq!(app.notifier.summaries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_video_draft_publishes_when_ready() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    app.graph.queue_video("vid-1", "ready");
    app.draft_store.thumbnails.lock().unwrap().insert(
        ("draft-1".to_string(), "clip_9x16.mp4".to_string()),
        "https://cdn.test.invalid/concepts/story/clip_9x16_thumb.jpg".to_string(),
    );

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&video_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["results"][0]["status"], "PUBLISHED");
    assert_eq!(body["results"][0]["assets"][0]["metaVideoId"], "vid-1");
    // Stored thumbnail was fetched and uploaded alongside the video
    assert_eq!(
        body["results"][0]["assets"][0]["thumbnailHash"],
        "hash-clip_9x16_thumb.jpg"
    );

    let created = app.graph.created_ads.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].status, "PAUSED");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_video_timeout_marks_draft_error() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    // Never leaves processing; the readiness budget has to expire
    app.graph.queue_video("vid-1", "processing");

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&video_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["results"][0]["status"], "ERROR");
    let reason = body["results"][0]["adError"].as_str().unwrap();
    assert!(reason.contains("still processing at timeout"));
    assert!(reason.contains("vid-1"));

    // The ad was never attempted
    let calls = app.graph.calls.lock().unwrap();
    assert!(!calls.iter().any(|c| c == "create_ad"));
    drop(calls);

    let (status, error) = app.draft_store.final_status("draft-1").unwrap();
    assert_eq!(status, DraftStatus::Error);
    assert!(error.unwrap().contains("vid-1"));
}

#[tokio::test]
async fn test_non_image_thumbnail_bytes_are_skipped() {
    // Stored thumbnail URL resolves but the bytes are not an image; the
    // video publishes without a poster frame instead of failing
    let app = setup_test_app_with_media(bytes::Bytes::from_static(b"<html>error page</html>"));
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    app.graph.queue_video("vid-1", "ready");
    app.draft_store.thumbnails.lock().unwrap().insert(
        ("draft-1".to_string(), "clip_9x16.mp4".to_string()),
        "https://cdn.test.invalid/concepts/story/clip_9x16_thumb.jpg".to_string(),
    );

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&video_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["results"][0]["status"], "PUBLISHED");
    assert!(body["results"][0]["assets"][0]["thumbnailHash"].is_null());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_readiness_errors_stay_scoped_to_their_draft() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    // Draft 1's video fails processing; draft 2's never finishes
    app.graph.queue_video("vid-1", "error");
    app.graph.queue_video("vid-2", "processing");

    let draft = |n: u32| {
        serde_json::json!({
            "id": format!("draft-{}", n),
            "adName": format!("Clip {}", n),
            "campaignId": "c-1",
            "adSetId": format!("as-{}", n),
            "destinationUrl": "https://example.com",
            "assets": [
                {
                    "name": format!("clip_{}_9x16.mp4", n),
                    "type": "video",
                    "sourceUrl": format!("https://cdn.test.invalid/concepts/x/clip_{}_9x16.mp4", n),
                    "aspectRatios": ["9:16"]
                }
            ]
        })
    };
    let body = serde_json::json!({
        "brandId": "brand-1",
        "adAccountId": "123456",
        "fbPageId": "page-1",
        "drafts": [draft(1), draft(2)]
    });

    let response = app.server.post("/api/v0/ads/launch").json(&body).await;
    assert_eq!(response.status_code(), 200);

    let parsed: serde_json::Value = response.json();
    assert_eq!(parsed["results"][0]["status"], "ERROR");
    assert_eq!(parsed["results"][1]["status"], "ERROR");

    // Each draft's error names its own video and nobody else's
    let first = parsed["results"][0]["adError"].as_str().unwrap();
    assert!(first.contains("vid-1"));
    assert!(!first.contains("vid-2"));

    let second = parsed["results"][1]["adError"].as_str().unwrap();
    assert!(second.contains("vid-2"));
    assert!(!second.contains("vid-1"));
}

#[tokio::test]
async fn test_video_processing_failure_names_the_video() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    app.graph.queue_video("vid-1", "error");

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&video_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["results"][0]["status"], "ERROR");
    let reason = body["results"][0]["adError"].as_str().unwrap();
    assert!(reason.contains("videos failed processing"));
    assert!(reason.contains("vid-1"));
}

#[tokio::test]
async fn test_transient_ad_set_failure_keeps_uploaded_assets() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    app.graph.ad_set_failures.lock().unwrap().insert(
        "as-1".to_string(),
        ErrSpec::http(404, "object does not exist"),
    );

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    // Uploads succeeded, so the draft stays retryable instead of failing
    assert_eq!(body["results"][0]["status"], "UPLOADED");
    assert!(body["results"][0]["adError"]
        .as_str()
        .unwrap()
        .contains("ad-set validation failed"));
    assert_eq!(
        app.draft_store.final_status("draft-1").unwrap().0,
        DraftStatus::Uploaded
    );
}

#[tokio::test]
async fn test_oauth_failure_is_terminal_error() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    app.graph
        .create_ad_failures
        .lock()
        .unwrap()
        .insert("as-1".to_string(), ErrSpec::oauth("Session has expired"));

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    // Configuration problems are terminal even with assets uploaded
    assert_eq!(body["results"][0]["status"], "ERROR");
    assert_eq!(
        app.draft_store.final_status("draft-1").unwrap().0,
        DraftStatus::Error
    );
}

#[tokio::test]
async fn test_batch_drafts_are_independent() {
    let app = setup_test_app();
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), seeded_brand("brand-1"));
    app.graph.create_ad_failures.lock().unwrap().insert(
        "as-2".to_string(),
        ErrSpec::http(503, "service unavailable"),
    );

    let draft = |n: u32| {
        serde_json::json!({
            "id": format!("draft-{}", n),
            "adName": format!("Ad {}", n),
            "campaignId": "c-1",
            "adSetId": format!("as-{}", n),
            "destinationUrl": "https://example.com",
            "assets": [
                {
                    "name": format!("img_{}_1x1.png", n),
                    "type": "image",
                    "sourceUrl": format!("https://cdn.test.invalid/concepts/x/img_{}_1x1.png", n)
                }
            ]
        })
    };
    let body = serde_json::json!({
        "brandId": "brand-1",
        "adAccountId": "123456",
        "fbPageId": "page-1",
        "drafts": [draft(1), draft(2), draft(3)]
    });

    let response = app.server.post("/api/v0/ads/launch").json(&body).await;
    assert_eq!(response.status_code(), 200);

    let parsed: serde_json::Value = response.json();
    assert_eq!(parsed["summary"]["total"], 3);
    assert_eq!(parsed["summary"]["successful"], 2);
    assert_eq!(parsed["summary"]["uploaded"], 1);
    assert_eq!(parsed["summary"]["failed"], 0);

    assert_eq!(parsed["results"][0]["status"], "PUBLISHED");
    assert_eq!(parsed["results"][1]["status"], "UPLOADED");
    assert_eq!(parsed["results"][2]["status"], "PUBLISHED");

    assert_eq!(
        app.draft_store.final_status("draft-2").unwrap().0,
        DraftStatus::Uploaded
    );
}

#[tokio::test]
async fn test_page_actor_brand_creates_and_caches_instagram_account() {
    let app = setup_test_app();
    let mut brand = seeded_brand("brand-1");
    brand.use_page_actor = true;
    app.brand_store
        .brands
        .lock()
        .unwrap()
        .insert("brand-1".to_string(), brand);

    let response = app
        .server
        .post("/api/v0/ads/launch")
        .json(&image_draft_body("brand-1"))
        .await;
    assert_eq!(response.status_code(), 200);

    // No existing accounts, so one was created and the mapping written back
    let calls = app.graph.calls.lock().unwrap();
    assert!(calls.iter().any(|c| c == "list_page_backed_accounts"));
    assert!(calls.iter().any(|c| c == "create_page_backed_account"));
    drop(calls);
    assert_eq!(
        app.brand_store.pbia_writes.lock().unwrap().as_slice(),
        &[(
            "brand-1".to_string(),
            "page-1".to_string(),
            "pbia-page-1".to_string()
        )]
    );

    // The creative posts through the page-backed account
    let created = app.graph.created_ads.lock().unwrap();
    assert_eq!(
        created[0].creative["object_story_spec"]["instagram_user_id"],
        "pbia-page-1"
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app();
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = setup_test_app();
    let response = app.server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), 200);

    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/api/v0/ads/launch"]["post"].is_object());
    assert!(doc["paths"]["/health"]["get"].is_object());
    assert!(doc["components"]["schemas"]["LaunchAdsRequest"].is_object());
}
