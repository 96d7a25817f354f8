//! Backend reachability tracking.
//!
//! `ConnectionMonitor` publishes a tri-state status on a watch channel. A
//! check can be run on demand (on start, or when the user asks to retry), and
//! `spawn_polling` starts a fixed-interval poller owned by a `ProbeTask`.
//! Dropping the `ProbeTask` stops polling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::backend::ChatBackend;

/// Shortest polling interval; shorter ones are raised to this
pub const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(5);

/// Reachability of the orchestration backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Checking,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Runs health checks and broadcasts the result
#[derive(Clone)]
pub struct ConnectionMonitor {
    backend: Arc<dyn ChatBackend>,
    status: Arc<watch::Sender<ConnectionStatus>>,
}

impl ConnectionMonitor {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Checking);
        Self {
            backend,
            status: Arc::new(status),
        }
    }

    /// Last published status
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Manual check: report `Checking` while the probe is in flight
    pub async fn check_now(&self) -> ConnectionStatus {
        self.publish(ConnectionStatus::Checking);
        self.probe().await
    }

    /// Start polling at a fixed interval. The first probe runs immediately.
    pub fn spawn_polling(&self, interval: Duration) -> ProbeTask {
        if interval < MIN_PROBE_INTERVAL {
            warn!(
                "Polling interval {:?} too short, using {:?}",
                interval, MIN_PROBE_INTERVAL
            );
        }
        let interval = interval.max(MIN_PROBE_INTERVAL);
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.probe().await;
            }
        });
        debug!("Connection polling started every {:?}", interval);
        ProbeTask {
            handle: Some(handle),
        }
    }

    async fn probe(&self) -> ConnectionStatus {
        let status = if self.backend.health_check().await {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        self.publish(status);
        status
    }

    fn publish(&self, status: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            match status {
                ConnectionStatus::Connected => info!("Backend connected"),
                ConnectionStatus::Disconnected => warn!("Backend unreachable"),
                ConnectionStatus::Checking => debug!("Checking backend connection"),
            }
            *current = status;
            true
        });
    }
}

/// Handle to a running poller. Polling stops on `stop` or drop.
#[derive(Debug)]
pub struct ProbeTask {
    handle: Option<JoinHandle<()>>,
}

impl ProbeTask {
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Connection polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProbeTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    async fn wait_for(rx: &mut watch::Receiver<ConnectionStatus>, wanted: ConnectionStatus) {
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| *s == wanted))
            .await
            .expect("status did not change in time")
            .expect("monitor dropped");
    }

    #[tokio::test]
    async fn test_check_now() {
        let backend = MockBackend::new();
        let monitor = ConnectionMonitor::new(Arc::new(backend.clone()));
        assert_eq!(monitor.status(), ConnectionStatus::Checking);

        assert_eq!(monitor.check_now().await, ConnectionStatus::Connected);

        backend.go_offline();
        assert_eq!(monitor.check_now().await, ConnectionStatus::Disconnected);
        assert!(!monitor.status().is_connected());
    }

    #[tokio::test]
    async fn test_polling_tracks_backend() {
        let backend = MockBackend::new();
        let monitor = ConnectionMonitor::new(Arc::new(backend.clone()));
        let mut rx = monitor.subscribe();

        let task = monitor.spawn_polling(Duration::from_millis(10));
        assert!(task.is_running());
        wait_for(&mut rx, ConnectionStatus::Connected).await;

        backend.go_offline();
        wait_for(&mut rx, ConnectionStatus::Disconnected).await;

        backend.go_online();
        wait_for(&mut rx, ConnectionStatus::Connected).await;
    }

    #[tokio::test]
    async fn test_dropping_task_stops_polling() {
        let backend = MockBackend::new();
        let monitor = ConnectionMonitor::new(Arc::new(backend.clone()));

        let task = monitor.spawn_polling(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(task);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let calls = backend.call_count();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.call_count(), calls);
        assert!(calls > 0);
    }

    #[tokio::test]
    async fn test_zero_interval_keeps_polling() {
        let backend = MockBackend::new().set_available(false);
        let monitor = ConnectionMonitor::new(Arc::new(backend.clone()));
        let mut rx = monitor.subscribe();

        let task = monitor.spawn_polling(Duration::ZERO);
        wait_for(&mut rx, ConnectionStatus::Disconnected).await;

        backend.go_online();
        wait_for(&mut rx, ConnectionStatus::Connected).await;
        assert!(task.is_running());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let monitor = ConnectionMonitor::new(Arc::new(MockBackend::new()));
        let mut task = monitor.spawn_polling(Duration::from_millis(50));
        task.stop();
        task.stop();
        assert!(!task.is_running());
    }
}
