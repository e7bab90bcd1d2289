use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use feg_mailer::MailApi;
use feg_order_engine::{
    checkout::{EnvSecretSource, SecretChain, StoreSecretSource, WebhookVerifier},
    events::{notification_hooks, EventHandlers, EventProducers},
    OrderQueryApi,
    ReconciliationApi,
    SqliteDatabase,
};
use futures::future::{ok, Either};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::email::EmailNotifier,
    routes::{health, OrderByNumberRoute, OrderForSessionRoute},
    webhook_routes::StripeWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mailer = MailApi::new(config.mailer.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("📧️ Notifications will be sent with the {} mail provider", mailer.provider());
    let notifier = EmailNotifier::new(mailer, &config.notifications);
    let handlers = EventHandlers::new(config.notifications.buffer_size, notification_hooks(notifier));
    let producers = handlers.producers();
    let tasks = handlers.start_handlers();
    debug!("📬️ {} event handlers started", tasks.len());
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The webhook signing secret is looked up in the `secrets` table first, then in the environment.
pub fn webhook_verifier(config: &ServerConfig, db: SqliteDatabase) -> WebhookVerifier<SecretChain> {
    let chain = SecretChain::new().with_source(StoreSecretSource::new(db)).with_source(EnvSecretSource);
    WebhookVerifier::new(chain)
        .with_secret_name(config.webhook.secret_name.as_str())
        .with_tolerance(config.webhook.tolerance)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let reconciliation_api = ReconciliationApi::new(db.clone(), db.clone(), producers.clone());
        let query_api = OrderQueryApi::new(db.clone());
        let verifier = webhook_verifier(&config, db.clone());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("feg::access_log"))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(verifier));
        let api_scope = web::scope("/api")
            .service(OrderForSessionRoute::<SqliteDatabase>::new())
            .service(OrderByNumberRoute::<SqliteDatabase>::new());
        let whitelist = config.webhook.whitelist.clone();
        let webhook_scope = web::scope("/webhooks")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded);
                let allowed = match (peer_ip, &whitelist) {
                    (_, None) => true,
                    (Some(ip), Some(whitelist)) => {
                        trace!("💳️ Webhook call from {ip}");
                        whitelist.contains(&ip)
                    },
                    (None, Some(_)) => {
                        warn!("💳️ No IP address found in webhook request, denying access.");
                        false
                    },
                };
                if allowed {
                    Either::Left(srv.call(req))
                } else {
                    warn!("💳️ Webhook call from {peer_ip:?} is not on the whitelist. Denying access.");
                    Either::Right(ok(req.error_response(ServerError::ForbiddenPeer)))
                }
            })
            .service(StripeWebhookRoute::<SqliteDatabase, SqliteDatabase, SecretChain>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_addr)?
    .run();
    Ok(srv)
}
