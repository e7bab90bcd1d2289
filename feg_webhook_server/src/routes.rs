//! Request handler definitions
//!
//! Define each route and its handler here. Webhook handlers live in [`crate::webhook_routes`].
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers must never block the current thread. Every
//! database or network call is expressed as a future and awaited.
use actix_web::{get, web, HttpResponse, Responder};
use feg_order_engine::{
    db_types::{OrderNumber, SessionId},
    traits::OrderManagement,
    OrderQueryApi,
};
use log::*;

use crate::errors::ServerError;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_for_session => Get "/orders/session/{session_id}" impl OrderManagement);
/// Returns the order recorded for a checkout session, along with its items.
///
/// The storefront calls this from its checkout success page. A 404 means the webhook has not been processed (yet).
pub async fn order_for_session<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let session_id = SessionId::from(path.into_inner());
    trace!("💻️ GET order for session {session_id}");
    let details = api.order_for_session(&session_id).await?.ok_or_else(|| {
        debug!("💻️ No order for session {session_id} (yet)");
        ServerError::NoRecordFound(format!("No order exists for checkout session {session_id}"))
    })?;
    Ok(HttpResponse::Ok().json(details))
}

route!(order_by_number => Get "/orders/{order_number}" impl OrderManagement);
pub async fn order_by_number<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = OrderNumber::from(path.into_inner());
    trace!("💻️ GET order {number}");
    let details = api
        .order_by_number(&number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} does not exist")))?;
    Ok(HttpResponse::Ok().json(details))
}
