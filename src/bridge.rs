//! The bridge: poll loop, push pump and host writes.

use std::sync::{Arc, Mutex as SyncMutex};
use std::time::Instant;

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures::future::Either;
use log::{debug, error, info, warn};
use serde_json::{Value, json};

use crate::client::CloudClient;
use crate::config::BridgeConfig;
use crate::errors::Error;
use crate::identity::AccessoryIdentity;
use crate::push::{PushHandler, PushMessage, parse_payload};
use crate::registry::{ReconcileReport, Registry};
use crate::runtime::{self, JoinHandle, Mutex, ShutdownToken};
use crate::snapshot::DeviceList;
use crate::surface::{Characteristic, CharacteristicValue, ControlSurface};
use crate::throttle::UpdateThrottle;

type Result<T> = std::result::Result<T, Error>;

struct Inner<C, S> {
    client: C,
    surface: S,
    config: BridgeConfig,
    registry: Mutex<Registry>,
    push_tx: UnboundedSender<PushMessage>,
    push_rx: SyncMutex<Option<UnboundedReceiver<PushMessage>>>,
    last_error: SyncMutex<Option<String>>,
    /// Accessories left applying by cycles dropped before `finish`.
    abandoned: SyncMutex<Vec<String>>,
}

/// Applies opened by one cycle, handed back to the registry if the cycle is
/// dropped before they are finished.
struct OpenCycle<'a> {
    abandoned: &'a SyncMutex<Vec<String>>,
    applying: Vec<String>,
    finished: bool,
}

impl Drop for OpenCycle<'_> {
    fn drop(&mut self) {
        if self.finished || self.applying.is_empty() {
            return;
        }
        warn!("poll cycle dropped with {} open applies", self.applying.len());
        if let Ok(mut abandoned) = self.abandoned.lock() {
            abandoned.append(&mut self.applying);
        }
    }
}

/// Keeps a host's accessories in sync with a Sengled account.
///
/// Cloning is cheap and every clone drives the same registry.
pub struct Bridge<C, S> {
    inner: Arc<Inner<C, S>>,
}

impl<C, S> Clone for Bridge<C, S> {
    fn clone(&self) -> Self {
        Bridge {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, S> Bridge<C, S>
where
    C: CloudClient,
    S: ControlSurface + 'static,
{
    pub fn new(client: C, surface: S, config: BridgeConfig) -> Self {
        let throttle = UpdateThrottle::new(config.throttle_window, config.skew_tolerance);
        let (push_tx, push_rx) = unbounded();
        Bridge {
            inner: Arc::new(Inner {
                client,
                surface,
                config,
                registry: Mutex::new(Registry::new(throttle)),
                push_tx,
                push_rx: SyncMutex::new(Some(push_rx)),
                last_error: SyncMutex::new(None),
                abandoned: SyncMutex::new(Vec::new()),
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.inner.client
    }

    pub fn surface(&self) -> &S {
        &self.inner.surface
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Identities of every registered accessory, sorted by identifier.
    pub async fn accessories(&self) -> Vec<AccessoryIdentity> {
        let registry = self.inner.registry.lock().await;
        registry
            .ids()
            .iter()
            .filter_map(|id| registry.get(id))
            .map(|accessory| accessory.identity().clone())
            .collect()
    }

    /// Hand back an accessory the host restored from its cache.
    pub async fn restore_accessory(&self, identity: AccessoryIdentity) -> bool {
        let mut registry = self.inner.registry.lock().await;
        registry.restore(identity, &self.inner.config, &self.inner.surface)
    }

    /// Run one poll cycle.
    ///
    /// A failed or timed out fetch leaves the registry as it was. Subscribe
    /// and unsubscribe calls share the fetch timeout; one that fails or times
    /// out is logged and retried by a later cycle.
    pub async fn refresh_devices(&self) -> Result<ReconcileReport> {
        let list = match self.fetch().await {
            Ok(list) => list,
            Err(e) => {
                error!("device refresh failed: {e}");
                self.set_last_error(Some(e.to_string()));
                return Err(e);
            }
        };
        debug!("fetched {} devices at {}", list.devices().len(), list.ts);

        let (plan, mut cycle) = {
            let mut registry = self.inner.registry.lock().await;
            registry.abandon(&self.take_abandoned());
            let mut plan = registry.reconcile(&list, &self.inner.config, &self.inner.surface);
            let cycle = OpenCycle {
                abandoned: &self.inner.abandoned,
                applying: std::mem::take(&mut plan.applying),
                finished: false,
            };
            (plan, cycle)
        };
        let timeout = self.inner.config.fetch_timeout;

        for topic in &plan.unsubscribe {
            let unsubscribe = self.inner.client.unsubscribe(topic);
            match runtime::timeout(timeout, unsubscribe).await {
                Ok(Ok(())) => debug!("unsubscribed from {topic}"),
                Ok(Err(e)) => error!("failed to unsubscribe from {topic}: {e}"),
                Err(_) => error!("{}", Error::timeout(&format!("unsubscribe from {topic}"))),
            }
        }

        let mut subscribed = Vec::new();
        for (device_id, topic) in &plan.subscribe {
            let subscribe = self
                .inner
                .client
                .subscribe(topic, self.push_handler(device_id));
            match runtime::timeout(timeout, subscribe).await {
                Ok(Ok(())) => {
                    debug!("subscribed to {topic}");
                    subscribed.push(device_id.clone());
                }
                Ok(Err(e)) => error!("{}", Error::subscribe(topic, e)),
                Err(_) => error!("{}", Error::timeout(&format!("subscribe to {topic}"))),
            }
        }

        {
            let mut registry = self.inner.registry.lock().await;
            registry.finish(&cycle.applying, &subscribed, plan.timestamp);
            cycle.finished = true;
        }
        self.set_last_error(None);
        Ok(plan.report)
    }

    /// Apply one push payload to the accessory of `device_id`.
    pub async fn handle_push(&self, device_id: &str, payload: &str) -> Result<()> {
        let fields = parse_payload(device_id, payload)?;

        let mut registry = self.inner.registry.lock().await;
        let accessory = registry
            .get_mut(device_id)
            .ok_or_else(|| Error::AccessoryNotFound(device_id.to_string()))?;
        let uuid = accessory.uuid();
        for (characteristic, value) in accessory.apply_push(&fields) {
            debug!("{device_id}: {characteristic} <- {value:?} (push)");
            self.inner
                .surface
                .update_characteristic(uuid, characteristic, value);
        }
        Ok(())
    }

    /// Handle a host write to a characteristic.
    ///
    /// Nothing is reported back to the host here; the next poll or push
    /// carries the device's actual state.
    pub async fn write(
        &self,
        device_id: &str,
        characteristic: Characteristic,
        value: Option<CharacteristicValue>,
    ) -> Result<()> {
        let command = {
            let mut registry = self.inner.registry.lock().await;
            let accessory = registry
                .get_mut(device_id)
                .ok_or_else(|| Error::AccessoryNotFound(device_id.to_string()))?;
            accessory.prepare_write(characteristic, value.as_ref(), Instant::now())?
        };
        let Some(command) = command else {
            return Ok(());
        };

        debug!("sending {command:?}");
        self.inner
            .client
            .send_command(&command)
            .await
            .map_err(|e| {
                let err = Error::command_rejected(device_id, e);
                error!("{err}");
                err
            })
    }

    /// Poll and process pushes until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: ShutdownToken) {
        let receiver = self.inner.push_rx.lock().ok().and_then(|mut rx| rx.take());
        let Some(receiver) = receiver else {
            warn!("bridge is already running");
            return;
        };
        info!(
            "bridge started, refreshing every {:?}",
            self.inner.config.refresh_interval
        );

        let (_, receiver) = futures::join!(
            self.poll_loop(&shutdown),
            self.push_pump(receiver, &shutdown)
        );

        if let Ok(mut slot) = self.inner.push_rx.lock() {
            *slot = Some(receiver);
        }
        info!("bridge stopped");
    }

    /// Run the bridge as a background task.
    pub fn spawn(&self, shutdown: ShutdownToken) -> JoinHandle<()> {
        let bridge = self.clone();
        runtime::spawn(async move { bridge.run(shutdown).await })
    }

    /// Registry dump for troubleshooting.
    pub async fn diagnostics(&self) -> Value {
        let registry = self.inner.registry.lock().await;
        let accessories: Vec<Value> = registry
            .ids()
            .iter()
            .filter_map(|id| registry.get(id))
            .map(|accessory| accessory.diagnostics())
            .collect();
        let last_error = self.inner.last_error.lock().ok().and_then(|e| e.clone());

        json!({
            "config": self.inner.config,
            "accessoryCount": accessories.len(),
            "accessories": accessories,
            "lastError": last_error,
        })
    }

    async fn fetch(&self) -> Result<DeviceList> {
        let fetch = self.inner.client.fetch_all_devices();
        match runtime::timeout(self.inner.config.fetch_timeout, fetch).await {
            Ok(Ok(list)) => Ok(list),
            Ok(Err(e)) => Err(Error::Fetch(e)),
            Err(_) => Err(Error::timeout("device list fetch")),
        }
    }

    fn push_handler(&self, device_id: &str) -> PushHandler {
        let tx = self.inner.push_tx.clone();
        let device_id = device_id.to_string();
        Box::new(move |payload: &str| {
            let message = PushMessage {
                device_id: device_id.clone(),
                payload: payload.to_string(),
            };
            if tx.unbounded_send(message).is_err() {
                debug!("bridge gone, dropping push for {device_id}");
            }
        })
    }

    async fn poll_loop(&self, shutdown: &ShutdownToken) {
        while !shutdown.is_cancelled() {
            let refresh = self.refresh_devices();
            let stop = shutdown.cancelled();
            futures::pin_mut!(refresh);
            futures::pin_mut!(stop);

            match futures::future::select(refresh, stop).await {
                Either::Left((Ok(report), _)) => debug!("cycle done: {report:?}"),
                Either::Left((Err(_), _)) => {}
                Either::Right(_) => {
                    info!("shutdown requested during a poll cycle");
                    break;
                }
            }
            if shutdown.sleep(self.inner.config.refresh_interval).await {
                break;
            }
        }
    }

    async fn push_pump(
        &self,
        mut receiver: UnboundedReceiver<PushMessage>,
        shutdown: &ShutdownToken,
    ) -> UnboundedReceiver<PushMessage> {
        loop {
            let next = receiver.next();
            let stop = shutdown.cancelled();
            futures::pin_mut!(next);
            futures::pin_mut!(stop);

            let message = match futures::future::select(next, stop).await {
                Either::Left((Some(message), _)) => message,
                Either::Left((None, _)) | Either::Right(_) => break,
            };
            if let Err(e) = self.handle_push(&message.device_id, &message.payload).await {
                match &e {
                    Error::AccessoryNotFound(_) => debug!("dropping push: {e}"),
                    _ => error!("dropping push for {}: {e}", message.device_id),
                }
            }
        }
        receiver
    }

    fn take_abandoned(&self) -> Vec<String> {
        self.inner
            .abandoned
            .lock()
            .map(|mut abandoned| std::mem::take(&mut *abandoned))
            .unwrap_or_default()
    }

    fn set_last_error(&self, error: Option<String>) {
        if let Ok(mut last) = self.inner.last_error.lock() {
            *last = error;
        }
    }
}
