//! Application state: configuration plus the shared queue and registry.

use anyhow::Context;
use keyprobe_core::{AppConfig, DestinationId, DiscoveryQueue, NotifyConfig};
use keyprobe_notify::{DeliveryRegistry, Dispatcher, EmbedStyle, LogTarget, WebhookTarget};
use keyprobe_scanner::{
    HttpProber, Prober, RateLimitedProber, ScanDriver, ScanSettings, ScanState,
};
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

/// Destination id of the log target.
pub const LOG_DESTINATION: &str = "log";

/// State shared between the scanner and the notifier.
///
/// The scanner writes into `queue`; the dispatcher drains it and delivers
/// to whatever is in `registry` at the time.
pub struct AppState {
    /// Validated configuration
    pub config: AppConfig,

    /// Queue between the scan workers and the dispatcher
    pub queue: DiscoveryQueue,

    /// Destinations receiving notifications
    pub registry: DeliveryRegistry,
}

impl AppState {
    /// Validate `config` and register the configured delivery targets.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or a webhook client
    /// cannot be created.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let registry = DeliveryRegistry::new();
        register_targets(&registry, &config.notify, config.probe.timeout())?;
        if registry.is_empty() {
            tracing::warn!("No delivery targets configured, notifications will be discarded");
        }

        Ok(Self {
            config,
            queue: DiscoveryQueue::new(),
            registry,
        })
    }

    /// Scan driver probing the configured endpoint with the configured delay.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn scan_driver(&self) -> anyhow::Result<ScanDriver> {
        let prober = HttpProber::new(&self.config.probe).context("creating probe client")?;
        tracing::info!(
            endpoint = prober.endpoint(),
            delay_ms = self.config.scanning.request_delay_ms,
            "Probing with rate limit"
        );
        let prober = RateLimitedProber::new(prober, self.config.scanning.request_delay());
        self.scan_driver_with(Arc::new(prober))
    }

    /// Scan driver using an arbitrary prober.
    ///
    /// # Errors
    /// Returns error if the scanning settings are invalid.
    pub fn scan_driver_with(&self, prober: Arc<dyn Prober>) -> anyhow::Result<ScanDriver> {
        let scanning = &self.config.scanning;
        let settings = ScanSettings::from_config(scanning)?;
        let interval = NonZeroU64::new(scanning.progress_interval)
            .context("scanning.progress_interval must be greater than zero")?;

        let state = ScanState::new(self.queue.clone(), interval);
        Ok(ScanDriver::new(prober, state, settings))
    }

    /// Dispatcher draining the shared queue into the registry.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.queue.clone(),
            Arc::new(self.registry.clone()),
            self.config.notify.dispatch_period(),
        )
    }
}

fn register_targets(
    registry: &DeliveryRegistry,
    notify: &NotifyConfig,
    timeout: Duration,
) -> anyhow::Result<()> {
    if notify.log_target {
        registry.register(DestinationId::new(LOG_DESTINATION)?, Arc::new(LogTarget));
    }

    let style = EmbedStyle::from_config(notify);
    for webhook in &notify.webhooks {
        let destination = DestinationId::new(&webhook.destination)?;
        let target = WebhookTarget::new(webhook.url.as_str(), style.clone(), timeout)
            .with_context(|| format!("creating webhook client for '{destination}'"))?;
        registry.register(destination, Arc::new(target));
    }
    Ok(())
}
