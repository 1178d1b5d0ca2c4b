//! API Routes

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::analytics_mapper;
use crate::config::AttributeKey;
use crate::direction_resolver::{self, DirectionInput};
use crate::event_router::{self, BodyDetectionEvent, DetectionEvent, LineCrossingEvent};
use crate::models::WebhookResponse;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook).put(webhook))
        .route("/test", get(super::service_info))
        .route("/healthz", get(super::health_check))
        .with_state(state)
}

/// Handle an incoming camera webhook.
///
/// The pipeline is dump -> route -> publish -> persist image. Parsing
/// failures degrade to `analytics_found: false`; only unexpected service
/// errors (image persistence) surface as an error response, and those
/// carry a short generic message.
async fn webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> crate::Result<Json<WebhookResponse>> {
    let text = String::from_utf8_lossy(&body);
    tracing::info!(bytes = body.len(), "Webhook received");

    state.webhook_log.record(&text).await;

    let event = event_router::route(&body, &text, &state.processor);
    let analytics_found = event.is_some();

    match event {
        Some(DetectionEvent::BodyDetection(body_event)) => {
            process_body_detection(&state, body_event).await?;
        }
        Some(DetectionEvent::LineCrossing(crossing)) => {
            process_line_crossing(&state, *crossing).await?;
        }
        None => {
            tracing::warn!("No analytics found in webhook");
        }
    }

    Ok(Json(WebhookResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        analytics_found,
    }))
}

async fn process_body_detection(state: &AppState, event: BodyDetectionEvent) -> crate::Result<()> {
    let attrs = analytics_mapper::map_body(&event.analytics, &state.processor.items);
    state.store.publish(&attrs).await;

    let Some(image) = event.image else {
        tracing::warn!("No background image found in webhook");
        return Ok(());
    };

    let display_timestamp = event
        .snap_time
        .as_deref()
        .map(analytics_mapper::format_snap_time)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

    state
        .images
        .save_detection_image(&image, &display_timestamp)
        .await?;
    Ok(())
}

async fn process_line_crossing(state: &AppState, event: LineCrossingEvent) -> crate::Result<()> {
    let LineCrossingEvent { fields, image } = event;
    let input = DirectionInput {
        explicit_direction: fields.explicit_direction.as_deref(),
        region_id: &fields.region_id,
        detection_target: &fields.detection_target,
        track: fields.track,
        target_x: fields.target_rect.x.parse().ok(),
        target_y: fields.target_rect.y.parse().ok(),
    };
    let direction = direction_resolver::resolve(&input, &state.processor);
    tracing::info!(
        channel = %fields.channel_name,
        region_id = %fields.region_id,
        object_type = %fields.object_type,
        direction = %direction,
        "Line crossing resolved"
    );

    let attrs = analytics_mapper::map_line_crossing(
        &fields.channel_name,
        &fields.object_type,
        &fields.region_id,
        &fields.date_time,
        &direction,
        &state.processor.items,
    );
    state.store.publish(&attrs).await;

    let Some(image) = image else {
        tracing::debug!("Line-crossing webhook carried no image");
        return Ok(());
    };

    let timestamp = if fields.date_time.is_empty() {
        chrono::Utc::now().to_rfc3339()
    } else {
        fields.date_time.clone()
    };
    let filename = state
        .images
        .save_line_crossing_image(&image, &timestamp)
        .await?;
    let name = state.processor.items.name(AttributeKey::CrossingImage);
    state.store.put_attribute(&name, &filename).await;
    Ok(())
}
