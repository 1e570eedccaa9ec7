use async_trait::async_trait;
use lta_client::LtaClient;
use prometheus::Registry;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::drain::drain_requested;
use crate::metrics::WorkerMetrics;
use crate::outcome::{Outcome, QuarantineTarget};

/// One stage's work: claim the next eligible item, process it, and report
/// what happened. Everything else — polling cadence, drain handling,
/// quarantine patching, status heartbeats — lives in [`Worker`].
#[async_trait]
pub trait StageHandler: Send + Sync {
    /// Component type used for the drain semaphore filename and metrics
    /// prefix, e.g. `"verifier"`.
    fn component_type(&self) -> &'static str;

    /// Extra config keys this stage requires beyond `COMMON_CONFIG_KEYS`.
    fn expected_config(&self) -> &'static [&'static str] {
        &[]
    }

    async fn do_work_claim(&self, client: &LtaClient, config: &WorkerConfig) -> anyhow::Result<Outcome>;

    /// Extra counters merged into the component's status heartbeat.
    fn status_fields(&self) -> Value {
        json!({})
    }
}

/// Outcome of one claim attempt, collapsed to what the drain loop needs to
/// decide whether to claim again.
enum CycleResult {
    Successful,
    Quarantined,
    NothingClaimed,
}

/// Drives a [`StageHandler`] through the poll/claim/process/patch loop,
/// the Rust-native equivalent of `Component.run`'s `work_loop` in the
/// original.
pub struct Worker<S: StageHandler> {
    config: WorkerConfig,
    client: LtaClient,
    stage: S,
    metrics: WorkerMetrics,
    successes: u64,
    failures: u64,
}

impl<S: StageHandler> Worker<S> {
    pub fn new(config: WorkerConfig, client: LtaClient, stage: S, registry: &Registry) -> Self {
        let metrics = WorkerMetrics::new(stage.component_type(), registry);
        Self {
            config,
            client,
            stage,
            metrics,
            successes: 0,
            failures: 0,
        }
    }

    /// Run work cycles until a drain is requested, `RUN_ONCE_AND_DIE` fires
    /// after one cycle, or `RUN_UNTIL_NO_WORK` finds nothing left to claim.
    pub async fn run_forever(&mut self) -> anyhow::Result<()> {
        loop {
            if drain_requested(self.stage.component_type()) {
                info!(component = self.stage.component_type(), "drain requested, exiting");
                return Ok(());
            }

            self.metrics.load.set(1);
            let found_work = self.drain_available_work().await;
            self.metrics.load.set(0);

            if self.config.run_once_and_die() {
                return found_work.map(|_| ());
            }

            match found_work {
                Ok(false) if self.config.run_until_no_work() => {
                    info!(component = self.stage.component_type(), "no work remaining, exiting");
                    return Ok(());
                }
                _ => {}
            }

            tokio::time::sleep(self.config.work_sleep_duration()).await;
        }
    }

    /// Claim and process work repeatedly, with no sleep in between, until a
    /// cycle finds nothing left to claim. A successful cycle claims again
    /// immediately; `NothingClaimed` ends the drain so the outer loop can
    /// sleep, and a quarantine ends it early the same way rather than
    /// racing straight into the next claim. Returns `Ok(true)` if any item
    /// was claimed during this drain.
    async fn drain_available_work(&mut self) -> anyhow::Result<bool> {
        let mut claimed_any = false;
        loop {
            match self.run_once().await? {
                CycleResult::Successful => {
                    claimed_any = true;
                    if self.config.run_once_and_die() {
                        return Ok(true);
                    }
                }
                CycleResult::Quarantined => return Ok(true),
                CycleResult::NothingClaimed => return Ok(claimed_any),
            }
        }
    }

    /// Run a single work cycle: one claim attempt, processed to completion.
    async fn run_once(&mut self) -> anyhow::Result<CycleResult> {
        let outcome = self.stage.do_work_claim(&self.client, &self.config).await;

        let result = match outcome {
            Ok(Outcome::Successful) => {
                self.metrics.work_successful.inc();
                self.successes += 1;
                Ok(CycleResult::Successful)
            }
            Ok(Outcome::NothingClaimed) => Ok(CycleResult::NothingClaimed),
            Ok(Outcome::QuarantineNow { target, cause, trace }) => {
                self.metrics.work_quarantined.inc();
                if let Err(e) = self.quarantine(target, &cause, &trace).await {
                    warn!(error = %e, "failed to apply quarantine patch");
                }
                Ok(CycleResult::Quarantined)
            }
            Err(e) => {
                self.metrics.work_failed.inc();
                self.failures += 1;
                error!(error = %e, component = self.stage.component_type(), "work cycle failed");
                Err(e)
            }
        };

        if let Err(e) = self.heartbeat().await {
            warn!(error = %e, "failed to publish status heartbeat");
        }

        result
    }

    async fn quarantine(&self, target: QuarantineTarget, cause: &str, trace: &str) -> anyhow::Result<()> {
        let claimant = self.config.component_name();
        let (uuid, original_status) = match target {
            QuarantineTarget::Bundle { uuid, original_status } => (uuid, original_status),
            QuarantineTarget::TransferRequest { uuid, original_status } => (uuid, original_status),
        };
        let patch = lta_common::quarantine::quarantine_patch(original_status, claimant, cause, trace);
        let patch = patch.as_object().cloned().unwrap_or_default();

        match target {
            QuarantineTarget::Bundle { .. } => {
                self.client.patch_bundle(uuid, &patch).await?;
            }
            QuarantineTarget::TransferRequest { .. } => {
                self.client.patch_transfer_request(uuid, &patch).await?;
            }
        }
        Ok(())
    }

    async fn heartbeat(&self) -> anyhow::Result<()> {
        let mut fields = self.stage.status_fields();
        if let Some(map) = fields.as_object_mut() {
            map.insert("successes".to_string(), json!(self.successes));
            map.insert("failures".to_string(), json!(self.failures));
        }
        self.client
            .patch_status(self.config.component_name(), &fields)
            .await?;
        Ok(())
    }
}
