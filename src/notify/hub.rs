use crate::shared::StateEvent;
use crossbeam_channel as cbc;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};

/// Callback interface for state change consumers. Each subscription gets
/// its own delivery thread, so a slow `on_event` delays only that
/// subscription.
pub trait UnitObserver: Send + Sync {
    fn on_event(&self, event: &StateEvent);
}

/// Handle returned by [`NotificationHub::subscribe`], used to cancel the
/// subscription later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToken(u64);

struct Subscription {
    token: u64,
    event_tx: cbc::Sender<StateEvent>,
    worker: JoinHandle<()>,
}

/**
 * Fans unit state changes out to subscribed observers.
 *
 * Unit workers hand their events to the hub over one shared channel. A
 * fan-out thread forwards each event to every live subscription in
 * registration order, and a delivery thread per subscription runs the
 * observer callback. Events from one unit reach each observer in the
 * order the unit emitted them.
 *
 * # Fields
 * - `subscriptions`:  Live subscriptions, shared with the fan-out thread.
 * - `next_token`:     Source of unique subscription tokens.
 * - `emit_tx`:        Cloned out to every unit worker.
 * - `emit_rx`:        Drained by the fan-out thread.
 * - `terminate_tx`:   Shutdown signal for the fan-out thread.
 * - `terminate_rx`:   Receiving end handed to the fan-out thread.
 * - `fanout`:         Join handle of the fan-out thread while running.
 */
pub struct NotificationHub {
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
    next_token: AtomicU64,
    emit_tx: cbc::Sender<StateEvent>,
    emit_rx: cbc::Receiver<StateEvent>,
    terminate_tx: cbc::Sender<()>,
    terminate_rx: cbc::Receiver<()>,
    fanout: Option<JoinHandle<()>>,
}

impl NotificationHub {
    pub(crate) fn new() -> NotificationHub {
        let (emit_tx, emit_rx) = cbc::unbounded::<StateEvent>();
        let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();
        NotificationHub {
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            next_token: AtomicU64::new(0),
            emit_tx,
            emit_rx,
            terminate_tx,
            terminate_rx,
            fanout: None,
        }
    }

    /// A sender unit workers publish their state changes on.
    pub(crate) fn emitter(&self) -> cbc::Sender<StateEvent> {
        self.emit_tx.clone()
    }

    /// Registers an observer. Everything emitted from here on is delivered
    /// to it; events already in flight may or may not be.
    pub fn subscribe(&self, observer: Arc<dyn UnitObserver>) -> SubscriptionToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (event_tx, event_rx) = cbc::unbounded::<StateEvent>();

        // Delivery thread, one per subscription
        let delivery_thread = Builder::new().name(format!("observer_{}", token));
        let worker = delivery_thread
            .spawn(move || {
                while let Ok(event) = event_rx.recv() {
                    observer.on_event(&event);
                }
            })
            .unwrap();

        self.subscriptions.lock().push(Subscription {
            token,
            event_tx,
            worker,
        });
        debug!("hub: observer {} subscribed", token);
        SubscriptionToken(token)
    }

    /// Cancels a subscription. Events already forwarded to its delivery
    /// thread are still run; nothing emitted afterwards is.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        let mut subscriptions = self.subscriptions.lock();
        let before = subscriptions.len();
        // Dropping the entry closes the delivery channel; the delivery
        // thread drains what it already holds and exits on its own.
        subscriptions.retain(|s| s.token != token.0);
        if subscriptions.len() == before {
            warn!("hub: unsubscribe with unknown token {}", token.0);
        } else {
            debug!("hub: observer {} unsubscribed", token.0);
        }
    }

    pub(crate) fn start(&mut self) {
        if self.fanout.is_some() {
            return;
        }
        let emit_rx = self.emit_rx.clone();
        let terminate_rx = self.terminate_rx.clone();
        let subscriptions = Arc::clone(&self.subscriptions);

        // Thread forwarding emitted events to every subscription
        let fanout_thread = Builder::new().name("notify_hub".into());
        self.fanout = Some(
            fanout_thread
                .spawn(move || Self::fanout_loop(emit_rx, terminate_rx, subscriptions))
                .unwrap(),
        );
    }

    /// Stops the fan-out thread, then joins every delivery thread once its
    /// channel is drained. Runs after the unit workers have stopped, so no
    /// further events can arrive.
    pub(crate) fn stop(&mut self) {
        if let Some(handle) = self.fanout.take() {
            let _ = self.terminate_tx.send(());
            if handle.join().is_err() {
                warn!("hub: fan-out thread panicked");
            }
        }

        let drained = std::mem::take(&mut *self.subscriptions.lock());
        let mut workers = Vec::with_capacity(drained.len());
        for subscription in drained {
            let Subscription {
                event_tx, worker, ..
            } = subscription;
            // The delivery thread exits once its channel closes
            drop(event_tx);
            workers.push(worker);
        }
        for worker in workers {
            if worker.join().is_err() {
                warn!("hub: an observer delivery thread panicked");
            }
        }
    }

    fn fanout_loop(
        emit_rx: cbc::Receiver<StateEvent>,
        terminate_rx: cbc::Receiver<()>,
        subscriptions: Arc<Mutex<Vec<Subscription>>>,
    ) {
        loop {
            cbc::select! {
                recv(emit_rx) -> event => {
                    match event {
                        Ok(event) => Self::deliver(&subscriptions, event),
                        Err(_) => break,
                    }
                }
                recv(terminate_rx) -> _ => {
                    // Forward what was emitted before the stop signal
                    for event in emit_rx.try_iter() {
                        Self::deliver(&subscriptions, event);
                    }
                    break;
                }
            }
        }
    }

    fn deliver(subscriptions: &Mutex<Vec<Subscription>>, event: StateEvent) {
        // Snapshot the senders so subscribe and unsubscribe never wait
        // behind a delivery pass
        let targets: Vec<cbc::Sender<StateEvent>> = subscriptions
            .lock()
            .iter()
            .map(|s| s.event_tx.clone())
            .collect();
        for target in targets {
            let _ = target.send(event);
        }
    }
}

#[cfg(test)]
impl NotificationHub {
    pub fn test_new_started() -> NotificationHub {
        let mut hub = NotificationHub::new();
        hub.start();
        hub
    }

    pub fn test_stop(&mut self) {
        self.stop();
    }

    pub fn test_subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }
}
