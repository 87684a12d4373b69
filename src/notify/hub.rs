//! # Notification Hub
//!
//! Maps an order id to at most one live [`Subscription`] and pushes status
//! events to it.
//!
//! ## Policy
//!
//! - One subscriber per order. A second `subscribe` replaces the first, which
//!   completes with [`Completion::Replaced`].
//! - `subscribe` always pushes an `init` event with the stored status first,
//!   so a subscriber never waits for the next transition to learn where the
//!   order is. If that status is already terminal the subscription completes
//!   right after.
//! - Until `init` is out, the subscriber is pending: publishes are held back
//!   and afterwards only those newer than the `init` status are sent. Once
//!   live, a publish that is not newer than the last reported status is
//!   skipped, so every subscriber sees the lifecycle in order.
//! - Pushes never block and never fail the caller. A subscriber that is gone
//!   or not keeping up is completed with [`Completion::Failed`] and removed.
//!
//! Every registration carries a sequence number. Removal only happens if the
//! entry still has the sequence number the failing push saw, so a stale
//! failure cannot evict a newer subscriber.

use super::event::{OrderEvent, StatusChange, READY_MESSAGE};
use crate::clients::OrderClient;
use crate::model::{Order, OrderId, Status};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// How a subscription ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The order reached a terminal status.
    Finished,
    /// A push failed; the reason is the delivery error.
    Failed(String),
    /// Another subscriber took this order's slot.
    Replaced,
    /// The subscription was removed with [`NotificationHub::unsubscribe`].
    Unsubscribed,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotificationError {
    #[error("subscriber is gone")]
    SubscriberGone,
    #[error("subscriber is not keeping up")]
    SubscriberLagging,
}

impl<T> From<mpsc::error::TrySendError<T>> for NotificationError {
    fn from(e: mpsc::error::TrySendError<T>) -> Self {
        match e {
            mpsc::error::TrySendError::Full(_) => NotificationError::SubscriberLagging,
            mpsc::error::TrySendError::Closed(_) => NotificationError::SubscriberGone,
        }
    }
}

/// Client side of a subscription.
#[derive(Debug)]
pub struct Subscription {
    order_id: OrderId,
    events: mpsc::Receiver<OrderEvent>,
    done: oneshot::Receiver<Completion>,
}

impl Subscription {
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Next event, or `None` once the hub has closed the subscription.
    pub async fn recv(&mut self) -> Option<OrderEvent> {
        self.events.recv().await
    }

    /// Waits for the subscription to end and reports how.
    pub async fn completion(self) -> Completion {
        self.done
            .await
            .unwrap_or_else(|_| Completion::Failed("notification hub shut down".into()))
    }

    /// Drains every remaining event, then returns them with the completion.
    pub async fn collect(mut self) -> (Vec<OrderEvent>, Completion) {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let completion = self.completion().await;
        (events, completion)
    }
}

struct Subscriber {
    seq: u64,
    events: mpsc::Sender<OrderEvent>,
    done: oneshot::Sender<Completion>,
    /// Publishes held back until `init` has been sent; `None` once live.
    pending: Option<Vec<(Status, Vec<OrderEvent>)>>,
    /// Last status this subscriber was told about.
    last: Option<Status>,
}

struct HubInner {
    subscribers: DashMap<OrderId, Subscriber>,
    orders: OrderClient,
    buffer: usize,
    next_seq: AtomicU64,
}

/// Registry of live subscriptions. Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    /// `buffer` is how many undelivered events a subscriber may fall behind by.
    pub fn new(orders: OrderClient, buffer: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: DashMap::new(),
                orders,
                buffer: buffer.max(1),
                next_seq: AtomicU64::new(1),
            }),
        }
    }

    /// Starts observing `order_id`, replacing any earlier subscriber.
    pub async fn subscribe(&self, order_id: &str) -> Subscription {
        let (events_tx, events_rx) = mpsc::channel(self.inner.buffer);
        let (done_tx, done_rx) = oneshot::channel();
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst);

        let previous = self.inner.subscribers.insert(
            order_id.to_string(),
            Subscriber {
                seq,
                events: events_tx,
                done: done_tx,
                pending: Some(Vec::new()),
                last: None,
            },
        );
        if let Some(previous) = previous {
            info!(%order_id, "Subscriber replaced");
            let _ = previous.done.send(Completion::Replaced);
        }
        debug!(%order_id, seq, "Subscribed");

        // Registered before reading, so a transition racing with us is buffered, not missed.
        let current = match self.inner.orders.find_by_id(order_id).await {
            Ok(Some(order)) => Some(order.status),
            Ok(None) => {
                debug!(%order_id, "Subscribed before order exists");
                None
            }
            Err(e) => {
                warn!(%order_id, error = %e, "Could not load order for init event");
                None
            }
        };
        self.go_live(order_id, seq, current);

        Subscription {
            order_id: order_id.to_string(),
            events: events_rx,
            done: done_rx,
        }
    }

    /// Pushes the order's current status to its subscriber, if any.
    ///
    /// Also sends the ready notification on `READY` and completes the
    /// subscription on a terminal status.
    pub fn publish(&self, order: &Order) {
        let mut events = vec![OrderEvent::Status(StatusChange {
            status: order.status,
            order_id: order.id.clone(),
            timestamp: Utc::now(),
        })];
        if order.status == Status::Ready {
            events.push(OrderEvent::Notification(READY_MESSAGE.to_string()));
        }
        self.deliver(&order.id, order.status, events);
    }

    /// Removes the subscriber for `order_id`. Returns whether there was one.
    pub fn unsubscribe(&self, order_id: &str) -> bool {
        match self.inner.subscribers.remove(order_id) {
            Some((_, subscriber)) => {
                let _ = subscriber.done.send(Completion::Unsubscribed);
                debug!(%order_id, "Unsubscribed");
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn is_subscribed(&self, order_id: &str) -> bool {
        self.inner.subscribers.contains_key(order_id)
    }

    /// Sends `init` and whatever was published while the subscriber was pending.
    fn go_live(&self, order_id: &str, seq: u64, current: Option<Status>) {
        // The map guard must be released before `close` touches the same shard.
        let (sent, last) = {
            let Some(mut subscriber) = self.inner.subscribers.get_mut(order_id) else {
                return;
            };
            if subscriber.seq != seq {
                return;
            }
            let buffered = subscriber.pending.take().unwrap_or_default();
            let mut outgoing: Vec<OrderEvent> = current.map(OrderEvent::Init).into_iter().collect();
            let mut last = current;
            for (status, events) in buffered {
                if last.map_or(true, |last| is_newer(status, last)) {
                    last = Some(status);
                    outgoing.extend(events);
                }
            }
            subscriber.last = last;
            (send_all(&subscriber.events, &outgoing), last)
        };
        self.settle(order_id, seq, sent, last.is_some_and(Status::is_terminal));
    }

    fn deliver(&self, order_id: &str, status: Status, events: Vec<OrderEvent>) {
        let (seq, sent) = {
            let Some(mut subscriber) = self.inner.subscribers.get_mut(order_id) else {
                return;
            };
            if let Some(pending) = subscriber.pending.as_mut() {
                pending.push((status, events));
                return;
            }
            if subscriber.last.is_some_and(|last| !is_newer(status, last)) {
                debug!(%order_id, %status, "Stale status not pushed");
                return;
            }
            subscriber.last = Some(status);
            (subscriber.seq, send_all(&subscriber.events, &events))
        };
        self.settle(order_id, seq, sent, status.is_terminal());
    }

    fn settle(&self, order_id: &str, seq: u64, sent: Result<(), NotificationError>, finish: bool) {
        match sent {
            Err(e) => {
                warn!(%order_id, error = %e, "Notification delivery failed; dropping subscriber");
                self.close(order_id, seq, Completion::Failed(e.to_string()));
            }
            Ok(()) if finish => {
                debug!(%order_id, "Subscription finished");
                self.close(order_id, seq, Completion::Finished);
            }
            Ok(()) => {}
        }
    }

    fn close(&self, order_id: &str, seq: u64, completion: Completion) {
        if let Some((_, subscriber)) = self
            .inner
            .subscribers
            .remove_if(order_id, |_, s| s.seq == seq)
        {
            let _ = subscriber.done.send(completion);
        }
    }
}

fn send_all(events: &mpsc::Sender<OrderEvent>, batch: &[OrderEvent]) -> Result<(), NotificationError> {
    batch
        .iter()
        .try_for_each(|event| events.try_send(event.clone()).map_err(Into::into))
}

/// Position in the lifecycle; `CANCELLED` sorts after everything.
fn stage(status: Status) -> u8 {
    match status {
        Status::Received => 0,
        Status::Preparing => 1,
        Status::Ready => 2,
        Status::OutForDelivery => 3,
        Status::Delivered => 4,
        Status::Cancelled => 5,
    }
}

/// Whether reporting `status` after `last` moves the subscriber forward.
fn is_newer(status: Status, last: Status) -> bool {
    !last.is_terminal() && stage(status) > stage(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use crate::framework::{ResourceClient, ResourceRequest};
    use crate::model::{OrderCreate, OrderLine};

    fn order(status: Status) -> Order {
        let mut order = Order::new(
            "ORD1-7".into(),
            OrderCreate {
                customer_name: "Asha".into(),
                customer_phone: None,
                lines: vec![OrderLine {
                    menu_item_id: 1,
                    name: "Margherita Pizza".into(),
                    quantity: 1,
                    unit_price: 7.99,
                }],
                total: 7.99,
            },
        );
        order.status = status;
        order
    }

    fn hub_with(stored: Option<Order>, buffer: usize) -> (NotificationHub, MockClient<Order>) {
        let mock = MockClient::<Order>::new();
        mock.expect_get().return_ok(stored);
        (NotificationHub::new(OrderClient::new(mock.client()), buffer), mock)
    }

    #[tokio::test]
    async fn test_subscribe_pushes_current_status_first() {
        let (hub, mock) = hub_with(Some(order(Status::Preparing)), 8);
        let mut sub = hub.subscribe("ORD1-7").await;

        assert_eq!(sub.recv().await, Some(OrderEvent::Init(Status::Preparing)));
        assert!(hub.is_subscribed("ORD1-7"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_subscribe_to_delivered_order_completes() {
        let (hub, _mock) = hub_with(Some(order(Status::Delivered)), 8);
        let sub = hub.subscribe("ORD1-7").await;

        let (events, completion) = sub.collect().await;
        assert_eq!(events, vec![OrderEvent::Init(Status::Delivered)]);
        assert_eq!(completion, Completion::Finished);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_ready_adds_notification_and_delivered_closes() {
        let (hub, _mock) = hub_with(None, 8);
        let sub = hub.subscribe("ORD1-7").await;

        hub.publish(&order(Status::Ready));
        hub.publish(&order(Status::Delivered));
        // Nobody is listening any more; this must be a no-op.
        hub.publish(&order(Status::Delivered));

        let (events, completion) = sub.collect().await;
        let names: Vec<_> = events.iter().map(OrderEvent::name).collect();
        assert_eq!(names, vec!["status", "notification", "status"]);
        assert_eq!(events[2].status(), Some(Status::Delivered));
        assert_eq!(completion, Completion::Finished);
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_previous() {
        let mock = MockClient::<Order>::new();
        mock.expect_get().return_ok(None);
        mock.expect_get().return_ok(None);
        let hub = NotificationHub::new(OrderClient::new(mock.client()), 8);

        let first = hub.subscribe("ORD1-7").await;
        let mut second = hub.subscribe("ORD1-7").await;
        assert_eq!(first.completion().await, Completion::Replaced);

        hub.publish(&order(Status::Preparing));
        assert_eq!(second.recv().await.and_then(|e| e.status()), Some(Status::Preparing));
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_gone_subscriber_is_removed_without_error() {
        let (hub, _mock) = hub_with(None, 8);
        let sub = hub.subscribe("ORD1-7").await;
        drop(sub);

        hub.publish(&order(Status::Preparing));
        assert!(!hub.is_subscribed("ORD1-7"));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_fails() {
        let (hub, _mock) = hub_with(None, 1);
        let sub = hub.subscribe("ORD1-7").await;

        hub.publish(&order(Status::Preparing));
        hub.publish(&order(Status::Ready));

        let (events, completion) = sub.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(completion, Completion::Failed("subscriber is not keeping up".into()));
    }

    #[tokio::test]
    async fn test_publishes_during_subscribe_follow_init() {
        let (tx, mut rx) = mpsc::channel(4);
        let hub = NotificationHub::new(OrderClient::new(ResourceClient::new(tx)), 8);

        let subscribing = tokio::spawn({
            let hub = hub.clone();
            async move { hub.subscribe("ORD1-7").await }
        });
        let Some(ResourceRequest::Get { respond_to, .. }) = rx.recv().await else {
            panic!("expected a get for the init status");
        };
        // The store read is in flight; the worker moves on meanwhile.
        hub.publish(&order(Status::Preparing));
        hub.publish(&order(Status::Delivered));
        respond_to.send(Ok(Some(order(Status::Ready)))).unwrap();

        let (events, completion) = subscribing.await.unwrap().collect().await;
        assert_eq!(
            events.iter().map(|e| (e.name(), e.status())).collect::<Vec<_>>(),
            vec![("init", Some(Status::Ready)), ("status", Some(Status::Delivered))]
        );
        assert_eq!(completion, Completion::Finished);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_init_is_first_when_racing_a_transition() {
        let (actor, orders) = crate::order_store::new(8);
        tokio::spawn(actor.run(()));
        let hub = NotificationHub::new(orders.clone(), 8);

        for _ in 0..20 {
            let created = orders
                .create_order(OrderCreate {
                    customer_name: "Asha".into(),
                    customer_phone: None,
                    lines: vec![OrderLine {
                        menu_item_id: 1,
                        name: "Margherita Pizza".into(),
                        quantity: 1,
                        unit_price: 7.99,
                    }],
                    total: 7.99,
                })
                .await
                .unwrap();
            let id = created.id.clone();

            let (mut sub, ()) = tokio::join!(hub.subscribe(&id), async {
                let moved = orders.advance(&id, Status::Received, Status::Preparing).await.unwrap();
                hub.publish(&moved);
            });

            let mut seen = Vec::new();
            while let Ok(event) = sub.events.try_recv() {
                seen.push(event);
            }
            assert!(matches!(seen.first(), Some(OrderEvent::Init(_))), "{seen:?}");
            let statuses: Vec<_> = seen.iter().filter_map(OrderEvent::status).collect();
            assert!(statuses.windows(2).all(|w| stage(w[0]) < stage(w[1])), "{statuses:?}");
            assert_eq!(statuses.last(), Some(&Status::Preparing));
            hub.unsubscribe(&id);
        }
    }

    #[tokio::test]
    async fn test_stale_status_is_not_pushed() {
        let (hub, _mock) = hub_with(Some(order(Status::Ready)), 8);
        let mut sub = hub.subscribe("ORD1-7").await;
        assert_eq!(sub.recv().await, Some(OrderEvent::Init(Status::Ready)));

        hub.publish(&order(Status::Preparing));
        hub.publish(&order(Status::Ready));
        hub.publish(&order(Status::OutForDelivery));
        assert_eq!(sub.recv().await.and_then(|e| e.status()), Some(Status::OutForDelivery));
        assert!(sub.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let (hub, _mock) = hub_with(None, 8);
        let sub = hub.subscribe("ORD1-7").await;
        assert!(hub.unsubscribe("ORD1-7"));
        assert!(!hub.unsubscribe("ORD1-7"));
        assert_eq!(sub.completion().await, Completion::Unsubscribed);
    }
}
