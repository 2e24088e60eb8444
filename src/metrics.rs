use {
    prometheus::{Registry, TextEncoder},
    tracing::error,
};

lazy_static::lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
}

macro_rules! register {
    ($collector:ident) => {
        REGISTRY
            .register(Box::new($collector.clone()))
            .expect("collector can't be registered")
    };
}

pub fn collect_to_text() -> String {
    TextEncoder::new()
        .encode_to_string(&REGISTRY.gather())
        .unwrap_or_else(|error| {
            error!("could not encode custom metrics: {}", error);
            String::new()
        })
}

pub mod bam {
    use {
        super::REGISTRY,
        prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts},
        std::{sync::Once, time::Duration},
    };

    lazy_static::lazy_static! {
        static ref PROBE_RESULT_TOTAL: IntCounterVec = IntCounterVec::new(
            Opts::new("probe_result_total", "Latency probe passes by region and outcome"),
            &["region", "outcome"]
        ).unwrap();

        static ref PROBE_LATENCY: HistogramVec = HistogramVec::new(
            HistogramOpts::new("probe_latency_seconds", "Measured TCP handshake latency by region")
                .buckets(vec![0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000]),
            &["region"]
        ).unwrap();

        static ref SUBMIT_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
            Opts::new("submit_attempts_total", "Submission attempts by region and outcome"),
            &["region", "outcome"]
        ).unwrap();

        static ref FASTEST_REGION_TOTAL: IntCounterVec = IntCounterVec::new(
            Opts::new("fastest_region_total", "Times a region won the latency selection"),
            &["region"]
        ).unwrap();
    }

    pub fn init() {
        static REGISTER: Once = Once::new();
        REGISTER.call_once(|| {
            register!(PROBE_RESULT_TOTAL);
            register!(PROBE_LATENCY);
            register!(SUBMIT_ATTEMPTS_TOTAL);
            register!(FASTEST_REGION_TOTAL);
        });
    }

    pub fn observe_probe(region: &str, latency: Option<Duration>) {
        match latency {
            Some(latency) => {
                PROBE_RESULT_TOTAL
                    .with_label_values(&[region, "reachable"])
                    .inc();
                PROBE_LATENCY
                    .with_label_values(&[region])
                    .observe(latency.as_secs_f64());
            }
            None => {
                PROBE_RESULT_TOTAL
                    .with_label_values(&[region, "unreachable"])
                    .inc();
            }
        }
    }

    pub fn incr_submit_attempt(region: &str, outcome: &str) {
        SUBMIT_ATTEMPTS_TOTAL
            .with_label_values(&[region, outcome])
            .inc();
    }

    pub fn incr_fastest_region(region: &str) {
        FASTEST_REGION_TOTAL.with_label_values(&[region]).inc();
    }
}
