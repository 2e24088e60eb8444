use {
    crate::{
        config::{ConfigProbe, ConfigSubmit},
        latency::{LatencyMeasurement, probe_regions},
        metrics::bam as metrics,
        payload::{PayloadEncoding, PayloadError},
        registry::{Region, RegionRegistry, RegistryError},
        router::{RouteTarget, RouterError, SubmissionResult, SubmissionRouter, SubmitTransaction},
        rpc::RpcSubmitter,
        selection::{SelectError, select},
    },
    std::{collections::HashMap, sync::Arc},
    thiserror::Error,
    tracing::info,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// One line of the region listing, in selection order.
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub region: Region,
    pub measurement: LatencyMeasurement,
    pub tx_url: String,
    pub fastest: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Force this region to the front of the fallback chain
    pub region: Option<String>,

    /// Skip latency probing entirely; only honored together with `region`
    pub skip_probe: bool,

    /// Interpretation of the input buffer
    pub encoding: PayloadEncoding,

    /// Cap on fallback attempts, defaults to the full chain length
    pub max_attempts: Option<usize>,
}

/// Composition root: Registry -> Prober -> Selector -> Router behind one
/// submit operation. Every call owns its own measurement set and order, the
/// registry is the only shared state.
pub struct BamSmartClient<S = RpcSubmitter> {
    registry: Arc<RegionRegistry>,
    probe: ConfigProbe,
    router: SubmissionRouter<S>,
}

impl BamSmartClient<RpcSubmitter> {
    pub fn new(
        registry: Arc<RegionRegistry>,
        probe: ConfigProbe,
        submit: &ConfigSubmit,
    ) -> anyhow::Result<Self> {
        let submitter =
            RpcSubmitter::new(submit.encoding, submit.submit_options(), submit.attempt_timeout)?;
        Ok(Self::with_submitter(registry, probe, submitter))
    }
}

impl<S: SubmitTransaction + Sync> BamSmartClient<S> {
    pub fn with_submitter(registry: Arc<RegionRegistry>, probe: ConfigProbe, submitter: S) -> Self {
        Self {
            registry,
            probe,
            router: SubmissionRouter::new(submitter),
        }
    }

    /// Fresh probe over the whole catalog, never cached.
    pub async fn list_regions(&self) -> Result<Vec<RegionReport>, ClientError> {
        let regions: Vec<Region> = self.registry.regions().cloned().collect();
        let mut measurements = probe_regions(&regions, self.probe).await;
        let order = select(&self.registry.codes(), &measurements, None)?;

        let mut reports = Vec::with_capacity(order.len());
        for (ordinal, code) in order.iter().enumerate() {
            let region = self.registry.lookup(code)?.clone();
            let measurement = measurements.remove(code).expect("probed region");
            let fastest = ordinal == 0 && measurement.is_reachable();
            if fastest {
                metrics::incr_fastest_region(code);
            }
            reports.push(RegionReport {
                tx_url: self.registry.tx_endpoint_for(&region).to_owned(),
                region,
                measurement,
                fastest,
            });
        }
        Ok(reports)
    }

    pub async fn send_transaction(
        &self,
        data: &[u8],
        options: &SendOptions,
    ) -> Result<SubmissionResult, ClientError> {
        // An unknown override is a setup defect, caught before any probing
        if let Some(code) = &options.region {
            self.registry.lookup(code)?;
        }
        let raw = options.encoding.resolve(data)?;

        let measurements = if options.skip_probe && options.region.is_some() {
            // Forced region fast path: zero probing, the rest of the catalog
            // stays usable for fallback in code order
            HashMap::new()
        } else {
            let regions: Vec<Region> = self.registry.regions().cloned().collect();
            probe_regions(&regions, self.probe).await
        };

        let order = select(
            &self.registry.codes(),
            &measurements,
            options.region.as_deref(),
        )?;
        if options.region.is_none() {
            if let Some(first) = order.codes().first() {
                if measurements
                    .get(first)
                    .is_some_and(LatencyMeasurement::is_reachable)
                {
                    metrics::incr_fastest_region(first);
                }
            }
        }

        let mut targets = Vec::with_capacity(order.len());
        for code in order.iter() {
            let region = self.registry.lookup(code)?;
            targets.push(RouteTarget {
                code: code.to_owned(),
                endpoint: self.registry.tx_endpoint_for(region).to_owned(),
            });
        }

        let result = self
            .router
            .submit(&raw, &targets, options.max_attempts)
            .await?;
        info!(
            region = result.region,
            attempts = result.attempts.len(),
            "transaction submitted"
        );
        Ok(result)
    }
}
