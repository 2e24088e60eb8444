use {
    crate::{config::ConfigProbe, metrics::bam as metrics, registry::Region, util::ms_since_epoch},
    futures::future::join_all,
    reqwest::Url,
    std::{
        collections::{BTreeMap, HashMap},
        time::Duration,
    },
    tokio::{
        net::TcpStream,
        time::{Instant, timeout},
    },
    tracing::debug,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Average round-trip over the successful samples
    Reachable { avg: Duration },
    /// Every sample timed out or failed to connect
    Unreachable,
}

/// Result of one probing pass for one region. Superseded by the next pass,
/// never updated in place.
#[derive(Debug, Clone)]
pub struct LatencyMeasurement {
    pub code: String,
    pub outcome: ProbeOutcome,
    pub samples: Vec<Option<Duration>>,
    pub measured_at_ms: u64,
}

impl LatencyMeasurement {
    pub const fn latency(&self) -> Option<Duration> {
        match self.outcome {
            ProbeOutcome::Reachable { avg } => Some(avg),
            ProbeOutcome::Unreachable => None,
        }
    }

    pub const fn is_reachable(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Reachable { .. })
    }
}

fn probe_target(url: &str) -> Option<(String, u16)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_owned();
    let port = parsed.port_or_known_default().unwrap_or(80);
    Some((host, port))
}

/// One TCP handshake, no application data. Elapsed wall-clock from connect
/// start to handshake completion; `None` on timeout, refusal or DNS failure.
async fn tcp_ping_once(host: &str, port: u16, limit: Duration) -> Option<Duration> {
    let started = Instant::now();
    match timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Some(started.elapsed())
        }
        Ok(Err(_)) | Err(_) => None,
    }
}

async fn tcp_ping(code: String, url: String, config: ConfigProbe) -> LatencyMeasurement {
    let target = probe_target(&url);
    let mut samples = Vec::with_capacity(config.samples);
    if let Some((host, port)) = target {
        for _ in 0..config.samples {
            samples.push(tcp_ping_once(&host, port, config.timeout).await);
        }
    } else {
        debug!(code, url, "unparsable probe url");
        samples.resize(config.samples, None);
    }

    let reachable: Vec<Duration> = samples.iter().flatten().copied().collect();
    let outcome = match reachable.len() {
        0 => ProbeOutcome::Unreachable,
        count => ProbeOutcome::Reachable {
            avg: reachable.iter().sum::<Duration>() / count as u32,
        },
    };
    metrics::observe_probe(&code, match outcome {
        ProbeOutcome::Reachable { avg } => Some(avg),
        ProbeOutcome::Unreachable => None,
    });

    LatencyMeasurement {
        code,
        outcome,
        samples,
        measured_at_ms: ms_since_epoch(),
    }
}

/// Measures every region concurrently; a region that cannot be reached gets a
/// failure marker instead of aborting the pass. Duplicate codes are measured
/// once. Returns a fresh measurement set on every call.
pub async fn probe_regions(
    regions: &[Region],
    config: ConfigProbe,
) -> HashMap<String, LatencyMeasurement> {
    let targets: BTreeMap<&str, &str> = regions
        .iter()
        .map(|region| (region.code.as_str(), region.bam_url.as_str()))
        .collect();

    let started = Instant::now();
    let probes = targets
        .into_iter()
        .map(|(code, url)| tcp_ping(code.to_owned(), url.to_owned(), config));
    let measurements = join_all(probes).await;
    debug!(
        regions = measurements.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "latency probe pass finished"
    );

    measurements
        .into_iter()
        .map(|measurement| (measurement.code.clone(), measurement))
        .collect()
}
