mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{notification_hooks, EventHandlers, EventHooks, EventProducers};
