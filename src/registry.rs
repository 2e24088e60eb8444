use {
    serde::Deserialize,
    std::collections::BTreeMap,
    thiserror::Error,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate region code: {0}")]
    DuplicateRegion(String),

    #[error("unknown region code: {0}")]
    UnknownRegion(String),
}

///
/// One candidate network location: a BAM scheduler endpoint used as the
/// latency probe target, plus an optional transaction submission endpoint.
///
/// Regions without their own submission endpoint resolve to the catalog-wide
/// fallback URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    /// Short unique code, e.g. "ny", "dallas", "slc"
    pub code: String,

    /// Human readable label
    pub label: String,

    /// Scheduler URL, probe target
    pub bam_url: String,

    /// Client transaction submission URL
    #[serde(default)]
    pub tx_url: Option<String>,
}

/// Immutable catalog of known regions, keyed by code. Built once at startup
/// and shared for the process lifetime.
#[derive(Debug)]
pub struct RegionRegistry {
    regions: BTreeMap<String, Region>,
    fallback_tx_url: String,
}

impl RegionRegistry {
    pub fn new(
        regions: Vec<Region>,
        fallback_tx_url: String,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for region in regions {
            if map.contains_key(&region.code) {
                return Err(RegistryError::DuplicateRegion(region.code));
            }
            map.insert(region.code.clone(), region);
        }
        Ok(Self {
            regions: map,
            fallback_tx_url,
        })
    }

    /// Regions in ascending code order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn codes(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn lookup(&self, code: &str) -> Result<&Region, RegistryError> {
        self.regions
            .get(code)
            .ok_or_else(|| RegistryError::UnknownRegion(code.to_owned()))
    }

    pub fn tx_endpoint_for<'a>(&'a self, region: &'a Region) -> &'a str {
        region.tx_url.as_deref().unwrap_or(&self.fallback_tx_url)
    }
}
