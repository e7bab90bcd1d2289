use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::task::JoinHandle;

use crate::{
    events::{EventHandler, EventProducer, Handler, OrderCreatedEvent, PaymentFailedEvent},
    traits::NotificationDispatcher,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub payment_failed_producer: Vec<EventProducer<PaymentFailedEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_payment_failed: Option<EventHandler<PaymentFailedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_failed = hooks.on_payment_failed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_payment_failed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_failed {
            result.payment_failed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per configured handler. Each task ends once all of its producers have been dropped and the
    /// outstanding hooks have run.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(2);
        if let Some(handler) = self.on_order_created {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_payment_failed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_payment_failed: Option<Handler<PaymentFailedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_payment_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_failed = Some(Arc::new(f));
        self
    }
}

/// Hooks that hand order events to a [`NotificationDispatcher`].
///
/// A new order produces a customer confirmation and an admin alert. The two are sent concurrently and independently:
/// a failure in one is logged and does not affect the other. A failed payment produces an admin alert.
pub fn notification_hooks<D>(dispatcher: D) -> EventHooks
where D: NotificationDispatcher + Send + Sync + 'static {
    let dispatcher = Arc::new(dispatcher);
    let mut hooks = EventHooks::default();
    let d = Arc::clone(&dispatcher);
    hooks.on_order_created(move |ev| {
        let d = Arc::clone(&d);
        Box::pin(async move { send_order_notifications(d.as_ref(), &ev).await }) as HookFuture
    });
    hooks.on_payment_failed(move |ev| {
        let d = Arc::clone(&dispatcher);
        Box::pin(async move {
            let intent = &ev.payment.payment_intent;
            match d.send_payment_failure_alert(&ev.payment).await {
                Ok(()) => info!("📬️ Payment failure alert for {intent} sent"),
                Err(e) => error!("📬️ Could not send the payment failure alert for {intent}. {e}"),
            }
        }) as HookFuture
    });
    hooks
}

async fn send_order_notifications<D: NotificationDispatcher>(dispatcher: &D, ev: &OrderCreatedEvent) {
    let number = &ev.order.order_number;
    let confirmation = dispatcher.send_customer_confirmation(&ev.order, &ev.items, &ev.customer.email);
    let alert = dispatcher.send_admin_alert(&ev.order, &ev.items, &ev.customer);
    let (confirmation, alert) = futures_util::join!(confirmation, alert);
    match confirmation {
        Ok(()) => info!("📬️ Order confirmation for {number} sent"),
        Err(e) => error!("📬️ Could not send the order confirmation for {number}. {e}"),
    }
    match alert {
        Ok(()) => info!("📬️ Admin alert for order {number} sent"),
        Err(e) => error!("📬️ Could not send the admin alert for order {number}. {e}"),
    }
}
