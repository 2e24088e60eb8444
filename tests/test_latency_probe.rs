
use {
    bam_router::{config::ConfigProbe, latency::probe_regions, registry::Region},
    std::time::{Duration, Instant},
};

fn region(code: &str, bam_url: &str) -> Region {
    Region {
        code: code.to_owned(),
        label: code.to_uppercase(),
        bam_url: bam_url.to_owned(),
        tx_url: None,
    }
}

const fn probe_config() -> ConfigProbe {
    ConfigProbe {
        samples: 1,
        timeout: Duration::from_millis(250),
    }
}

#[tokio::test]
async fn unreachable_region_never_aborts_the_pass() {
    let (url_a, _keep_a) = testkit::silent_listener().await;
    let (url_b, _keep_b) = testkit::silent_listener().await;
    let url_c = testkit::refused_endpoint();

    let regions = vec![
        region("ams", &url_a),
        region("nyc", &url_b),
        region("tyo", &url_c),
    ];

    let started = Instant::now();
    let measurements = probe_regions(&regions, probe_config()).await;

    // Probes run concurrently: the pass is bounded by one region's budget,
    // not the sum over regions
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(measurements.len(), 3);
    assert!(measurements["ams"].is_reachable());
    assert!(measurements["nyc"].is_reachable());
    assert!(!measurements["tyo"].is_reachable());
    assert!(measurements["ams"].latency().unwrap() < Duration::from_millis(250));
}

#[tokio::test]
async fn empty_region_set_yields_empty_map() {
    let measurements = probe_regions(&[], probe_config()).await;
    assert!(measurements.is_empty());
}

#[tokio::test]
async fn duplicate_codes_are_measured_once() {
    let (url, _keep) = testkit::silent_listener().await;
    let regions = vec![region("ams", &url), region("ams", &url)];

    let measurements = probe_regions(&regions, probe_config()).await;
    assert_eq!(measurements.len(), 1);
    assert!(measurements["ams"].is_reachable());
}

#[tokio::test]
async fn repeated_passes_produce_independent_measurements() {
    let (url, _keep) = testkit::silent_listener().await;
    let regions = vec![region("ams", &url)];

    let first = probe_regions(&regions, probe_config()).await;
    let second = probe_regions(&regions, probe_config()).await;

    // No caching across calls; each pass carries its own timestamp
    assert!(second["ams"].measured_at_ms >= first["ams"].measured_at_ms);
    assert!(first["ams"].is_reachable());
    assert!(second["ams"].is_reachable());
}

#[tokio::test]
async fn unparsable_probe_url_is_a_failure_marker() {
    let regions = vec![region("bad", "not a url")];
    let measurements = probe_regions(&regions, probe_config()).await;
    assert!(!measurements["bad"].is_reachable());
    assert_eq!(measurements["bad"].samples.len(), 1);
}
