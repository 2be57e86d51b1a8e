//! # Bus listener feeding the subscriber set.
//!
//! ```text
//! Bus.subscribe() ──► listener task ──► SubscriberSet::emit(event)
//!                          │
//!                 stop(): cancel ──► drain buffered events ──► SubscriberSet::shutdown()
//! ```
//!
//! The listener is spawned before generation 0 starts, so it observes every
//! event the coordinator publishes. Lagged events are skipped.

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::Bus;
use crate::subscribers::SubscriberSet;

pub(crate) struct Listener {
    stop: CancellationToken,
    join: JoinHandle<()>,
}

impl Listener {
    /// Subscribes to `bus` and forwards events to `subs` until stopped.
    pub(crate) fn spawn(bus: &Bus, subs: SubscriberSet) -> Self {
        let mut rx = bus.subscribe();
        let stop = CancellationToken::new();
        let token = stop.clone();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit(ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => subs.emit(ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            subs.shutdown().await;
        });

        Self { stop, join }
    }

    /// Delivers what is already on the bus, then stops every subscriber worker.
    pub(crate) async fn stop(self) {
        self.stop.cancel();
        let _ = self.join.await;
    }
}
