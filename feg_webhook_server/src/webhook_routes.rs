//! The payment provider webhook.
//!
//! The body is taken as raw bytes, because the signature covers the exact bytes that were sent. It is only parsed
//! once the signature has been verified.
use actix_web::{web, HttpRequest, HttpResponse};
use feg_order_engine::{
    checkout::{SecretResolver, WebhookVerifier, SIGNATURE_HEADER},
    traits::{InventoryManagement, OrderReconciliation},
    ReconcileOutcome,
    ReconciliationApi,
};
use log::*;

use crate::{data_objects::WebhookAck, errors::ServerError, helpers::require_json_content_type, route};

//----------------------------------------------   Stripe  ----------------------------------------------------
route!(stripe_webhook => Post "/stripe" impl OrderReconciliation, InventoryManagement, SecretResolver);
/// Route handler for checkout webhooks.
///
/// * 400 if the body is not declared as JSON, or the signature header is missing, malformed or does not match.
/// * 500 if the signing secret is not configured, or the order could not be stored. The provider will retry.
/// * 200 `{"received": true}` otherwise, including for replays and event types we don't handle.
pub async fn stripe_webhook<B, I, R>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, I>>,
    verifier: web::Data<WebhookVerifier<R>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderReconciliation,
    I: InventoryManagement,
    R: SecretResolver,
{
    trace!("💳️ Received webhook request: {}", req.uri());
    require_json_content_type(&req)?;
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = verifier.verify(body.as_ref(), signature).await.map_err(|e| {
        warn!("💳️ Rejected webhook delivery. {e}");
        ServerError::from(e)
    })?;
    let event_type = event.event_type().to_string();
    match api.reconcile(event).await? {
        ReconcileOutcome::OrderCreated(details) => {
            info!(
                "💳️ Order {} created for session {} with {} items",
                details.order.order_number,
                details.order.session_id,
                details.items.len()
            );
        },
        ReconcileOutcome::AlreadyProcessed(order) => {
            info!("💳️ Session {} was already processed as order {}", order.session_id, order.order_number);
        },
        ReconcileOutcome::SessionExpired { updated } => debug!("💳️ {event_type} handled. Session updated: {updated}"),
        ReconcileOutcome::PaymentFailed { updated } => debug!("💳️ {event_type} handled. Session updated: {updated}"),
        ReconcileOutcome::Ignored { event_type } => trace!("💳️ Ignored {event_type} event"),
    }
    Ok(HttpResponse::Ok().json(WebhookAck::received()))
}
