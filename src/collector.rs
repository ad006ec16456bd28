use crate::config::Config;
use crate::device::{fetch_or_default, DeviceReader, HttpDeviceReader};
use crate::error::Result;
use crate::metrics::{MeterDescriptors, MetricDescriptor, Tariff};
use crate::models::Reading;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::Registry;
use std::sync::Arc;
use tracing::info;

/// Prometheus collector that reads the meter on every scrape.
///
/// Holds no reading between scrapes. A failed fetch still yields all six
/// samples, zero-valued, so the scrape itself never fails.
pub struct MeterCollector {
    reader: Box<dyn DeviceReader>,
    descriptors: Arc<MeterDescriptors>,
}

impl MeterCollector {
    pub fn new(reader: Box<dyn DeviceReader>, descriptors: Arc<MeterDescriptors>) -> Self {
        Self {
            reader,
            descriptors,
        }
    }
}

impl Collector for MeterCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descriptors
            .all()
            .into_iter()
            .map(MetricDescriptor::desc)
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let reading = fetch_or_default(self.reader.as_ref());
        observations(&self.descriptors, &reading)
    }
}

/// Map one reading onto the four metric families.
pub fn observations(descriptors: &MeterDescriptors, reading: &Reading) -> Vec<MetricFamily> {
    vec![
        family(&descriptors.gas, vec![sample(&descriptors.gas, reading.gas, &[])]),
        family(
            &descriptors.consumption,
            vec![
                sample(
                    &descriptors.consumption,
                    reading.p1,
                    &[Tariff::Low.as_label()],
                ),
                sample(
                    &descriptors.consumption,
                    reading.p2,
                    &[Tariff::High.as_label()],
                ),
            ],
        ),
        family(
            &descriptors.production,
            vec![
                sample(
                    &descriptors.production,
                    reading.n1,
                    &[Tariff::Low.as_label()],
                ),
                sample(
                    &descriptors.production,
                    reading.n2,
                    &[Tariff::High.as_label()],
                ),
            ],
        ),
        family(
            &descriptors.power,
            vec![sample(&descriptors.power, reading.power as f64, &[])],
        ),
    ]
}

fn family(descriptor: &MetricDescriptor, metrics: Vec<Metric>) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(descriptor.name().to_string());
    family.set_help(descriptor.help().to_string());
    family.set_field_type(descriptor.kind());
    for metric in metrics {
        family.mut_metric().push(metric);
    }
    family
}

fn sample(descriptor: &MetricDescriptor, value: f64, label_values: &[&str]) -> Metric {
    let mut metric = Metric::default();

    for (name, value) in descriptor.label_names().iter().zip(label_values) {
        let mut pair = LabelPair::default();
        pair.set_name(name.clone());
        pair.set_value(value.to_string());
        metric.mut_label().push(pair);
    }

    match descriptor.kind() {
        MetricType::COUNTER => {
            let mut counter = Counter::default();
            counter.set_value(value);
            metric.set_counter(counter);
        }
        _ => {
            let mut gauge = Gauge::default();
            gauge.set_value(value);
            metric.set_gauge(gauge);
        }
    }

    metric
}

/// Build the registry served on `/metrics`.
///
/// Creates the blocking HTTP client, so call it outside the async runtime
/// (e.g. from `spawn_blocking`).
pub fn build_registry(config: &Config) -> Result<Registry> {
    let descriptors = Arc::new(MeterDescriptors::new(
        config.metrics.namespace.as_deref(),
    )?);
    let reader = HttpDeviceReader::new(&config.device)?;
    info!(url = %reader.url(), "Device reader created");

    let registry = Registry::new();
    registry.register(Box::new(MeterCollector::new(Box::new(reader), descriptors)))?;

    Ok(registry)
}
