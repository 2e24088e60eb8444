use {
    crate::{
        payload::WireEncoding,
        registry::{Region, RegionRegistry, RegistryError},
        rpc::SubmitOptions,
    },
    anyhow::Context,
    serde::Deserialize,
    std::{path::Path, time::Duration},
    tokio::fs,
};

pub async fn load_config<T>(path: impl AsRef<Path>) -> anyhow::Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let contents = fs::read(path)
        .await
        .with_context(|| "failed to read config")?;
    serde_yaml::from_slice(&contents).map_err(Into::into)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigBamRouter {
    #[serde(default)]
    pub tracing: ConfigTracing,

    /// Region catalog
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,

    /// Catch-all submission endpoint for regions without their own
    #[serde(default = "default_fallback_tx_url")]
    pub fallback_tx_url: String,

    /// Latency probe options
    #[serde(default)]
    pub probe: ConfigProbe,

    /// Submission options
    #[serde(default)]
    pub submit: ConfigSubmit,
}

impl Default for ConfigBamRouter {
    fn default() -> Self {
        Self {
            tracing: ConfigTracing::default(),
            regions: default_regions(),
            fallback_tx_url: default_fallback_tx_url(),
            probe: ConfigProbe::default(),
            submit: ConfigSubmit::default(),
        }
    }
}

impl ConfigBamRouter {
    /// Validates the catalog (duplicate codes are a configuration defect).
    pub fn build_registry(&self) -> Result<RegionRegistry, RegistryError> {
        RegionRegistry::new(self.regions.clone(), self.fallback_tx_url.clone())
    }
}

/// Testnet catalog from the BAM docs. `slc` does not expose a submission
/// endpoint yet and resolves to the catch-all URL.
fn default_regions() -> Vec<Region> {
    vec![
        Region {
            code: "ny".to_owned(),
            label: "New York".to_owned(),
            bam_url: "http://ny.testnet.bam.jito.wtf".to_owned(),
            tx_url: Some("https://ny.testnet.block-engine.jito.wtf/api/v1/transactions".to_owned()),
        },
        Region {
            code: "dallas".to_owned(),
            label: "Dallas".to_owned(),
            bam_url: "http://dallas.testnet.bam.jito.wtf".to_owned(),
            tx_url: Some(
                "https://dallas.testnet.block-engine.jito.wtf/api/v1/transactions".to_owned(),
            ),
        },
        Region {
            code: "slc".to_owned(),
            label: "Salt Lake City".to_owned(),
            bam_url: "http://slc.testnet.bam.jito.wtf".to_owned(),
            tx_url: None,
        },
    ]
}

fn default_fallback_tx_url() -> String {
    "https://testnet.block-engine.jito.wtf/api/v1/transactions".to_owned()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigTracing {
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigProbe {
    /// TCP handshake samples per region
    #[serde(default = "ConfigProbe::default_samples")]
    pub samples: usize,

    /// Per-sample connect timeout
    #[serde(default = "ConfigProbe::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ConfigProbe {
    fn default() -> Self {
        Self {
            samples: Self::default_samples(),
            timeout: Self::default_timeout(),
        }
    }
}

impl ConfigProbe {
    const fn default_samples() -> usize {
        3
    }

    const fn default_timeout() -> Duration {
        Duration::from_millis(750)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSubmit {
    /// Per-attempt submission timeout
    #[serde(
        default = "ConfigSubmit::default_attempt_timeout",
        with = "humantime_serde"
    )]
    pub attempt_timeout: Duration,

    /// Wire encoding of the transaction inside the JSON-RPC param
    #[serde(default)]
    pub encoding: WireEncoding,

    #[serde(default)]
    pub skip_preflight: bool,

    #[serde(default = "ConfigSubmit::default_preflight_commitment")]
    pub preflight_commitment: Option<String>,
}

impl Default for ConfigSubmit {
    fn default() -> Self {
        Self {
            attempt_timeout: Self::default_attempt_timeout(),
            encoding: WireEncoding::default(),
            skip_preflight: false,
            preflight_commitment: Self::default_preflight_commitment(),
        }
    }
}

impl ConfigSubmit {
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            skip_preflight: self.skip_preflight,
            preflight_commitment: self.preflight_commitment.clone(),
        }
    }

    const fn default_attempt_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_preflight_commitment() -> Option<String> {
        Some("confirmed".to_owned())
    }
}
