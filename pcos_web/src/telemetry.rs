use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;

pub struct Metrics {
    request_counter: Counter<u64>,
    prediction_counter: Counter<u64>,
    prediction_duration: Histogram<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("pcos_web");
        global::set_meter_provider(provider);

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        let prediction_counter = meter
            .u64_counter("predictions_total")
            .with_description("Completed analyses by outcome")
            .build();

        let boundaries = bucket_boundaries(&[(10, 100, 10), (100, 500, 50), (500, 3000, 500)]);

        let prediction_duration = meter
            .u64_histogram("prediction_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of preprocessing plus inference in milliseconds")
            .build();

        Ok(Metrics {
            request_counter,
            prediction_counter,
            prediction_duration,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_prediction(&self, outcome: &str, duration_ms: u64) {
        let attributes = vec![KeyValue::new("outcome", outcome.to_string())];
        self.prediction_counter.add(1, &attributes);
        self.prediction_duration.record(duration_ms, &attributes);
    }
}

/// Expands `(start, end, step)` segments into sorted, deduplicated bucket
/// boundaries. Segment ends are always included.
fn bucket_boundaries(segments: &[(u64, u64, u64)]) -> Vec<f64> {
    let mut boundaries: Vec<u64> = segments
        .iter()
        .flat_map(|&(start, end, step)| {
            (start..end)
                .step_by(step.max(1) as usize)
                .chain(std::iter::once(end))
        })
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();
    boundaries.into_iter().map(|x| x as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        let get = bucket_boundaries(&[(2, 22, 10), (22, 26, 2), (26, 46, 20), (46, 146, 100)]);
        let expected = vec![2.0, 12.0, 22.0, 24.0, 26.0, 46.0, 146.0];

        assert_eq!(get, expected);
    }

    #[test]
    fn test_bucket_boundaries_include_uneven_end() {
        let get = bucket_boundaries(&[(0, 25, 10)]);

        assert_eq!(get, vec![0.0, 10.0, 20.0, 25.0]);
    }
}
