use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrderExpiredEvent, OrderPlacedEvent, PaymentSettledEvent};

/// The publishing ends of the subscribed hooks. Cheap to clone; hand one to each API.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_placed_producer: Vec<EventProducer<OrderPlacedEvent>>,
    pub payment_settled_producer: Vec<EventProducer<PaymentSettledEvent>>,
    pub order_expired_producer: Vec<EventProducer<OrderExpiredEvent>>,
}

impl EventProducers {
    pub async fn publish_order_placed(&self, event: OrderPlacedEvent) {
        for emitter in &self.order_placed_producer {
            trace!("📬️ Notifying order placed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_payment_settled(&self, event: PaymentSettledEvent) {
        for emitter in &self.payment_settled_producer {
            trace!("📬️ Notifying payment settled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_expired(&self, event: OrderExpiredEvent) {
        for emitter in &self.order_expired_producer {
            trace!("📬️ Notifying order expired hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_placed: Option<EventHandler<OrderPlacedEvent>>,
    pub on_payment_settled: Option<EventHandler<PaymentSettledEvent>>,
    pub on_order_expired: Option<EventHandler<OrderExpiredEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_placed = hooks.on_order_placed.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_settled = hooks.on_payment_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_order_expired = hooks.on_order_expired.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_placed, on_payment_settled, on_order_expired }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_placed {
            result.order_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_settled {
            result.payment_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_expired {
            result.order_expired_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_placed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_settled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_expired {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_placed: Option<Handler<OrderPlacedEvent>>,
    pub on_payment_settled: Option<Handler<PaymentSettledEvent>>,
    pub on_order_expired: Option<Handler<OrderExpiredEvent>>,
}

impl EventHooks {
    pub fn on_order_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPlacedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_placed = Some(Arc::new(f));
        self
    }

    pub fn on_payment_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_settled = Some(Arc::new(f));
        self
    }

    pub fn on_order_expired<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderExpiredEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_expired = Some(Arc::new(f));
        self
    }
}
