//! Static descriptors for the metric families exported per scrape.

use prometheus::core::Desc;
use prometheus::proto::MetricType;
use std::collections::HashMap;

pub const GAS_CONSUMPTION: &str = "gas_consumption_total";
pub const KWH_CONSUMPTION: &str = "kwh_consumption_total";
pub const KWH_PRODUCTION: &str = "kwh_production_total";
pub const POWER_CURRENT: &str = "pwr_current";

pub const TARIFF_LABEL: &str = "tariff";

/// Pricing period of the two independent energy counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tariff {
    Low,
    High,
}

impl Tariff {
    pub fn as_label(self) -> &'static str {
        match self {
            Tariff::Low => "low",
            Tariff::High => "high",
        }
    }
}

/// Name, help, label names and value kind of one metric family.
#[derive(Debug)]
pub struct MetricDescriptor {
    desc: Desc,
    kind: MetricType,
}

impl MetricDescriptor {
    fn new(
        namespace: Option<&str>,
        name: &str,
        help: &str,
        labels: &[&str],
        kind: MetricType,
    ) -> prometheus::Result<Self> {
        let fq_name = match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => format!("{}_{}", ns, name),
            None => name.to_string(),
        };

        let desc = Desc::new(
            fq_name,
            help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;

        Ok(Self { desc, kind })
    }

    pub fn name(&self) -> &str {
        &self.desc.fq_name
    }

    pub fn help(&self) -> &str {
        &self.desc.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.desc.variable_labels
    }

    pub fn kind(&self) -> MetricType {
        self.kind
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }
}

/// The four descriptors shared by every scrape.
///
/// Built once at start-up and handed to the collector behind an `Arc`; never
/// mutated afterwards.
#[derive(Debug)]
pub struct MeterDescriptors {
    pub gas: MetricDescriptor,
    pub consumption: MetricDescriptor,
    pub production: MetricDescriptor,
    pub power: MetricDescriptor,
}

impl MeterDescriptors {
    pub fn new(namespace: Option<&str>) -> prometheus::Result<Self> {
        Ok(Self {
            gas: MetricDescriptor::new(
                namespace,
                GAS_CONSUMPTION,
                "gas consumption.",
                &[],
                MetricType::COUNTER,
            )?,
            consumption: MetricDescriptor::new(
                namespace,
                KWH_CONSUMPTION,
                "Kwh power consumption.",
                &[TARIFF_LABEL],
                MetricType::COUNTER,
            )?,
            production: MetricDescriptor::new(
                namespace,
                KWH_PRODUCTION,
                "Kwh power production.",
                &[TARIFF_LABEL],
                MetricType::COUNTER,
            )?,
            power: MetricDescriptor::new(
                namespace,
                POWER_CURRENT,
                "Current watt consumption",
                &[],
                MetricType::GAUGE,
            )?,
        })
    }

    pub fn all(&self) -> [&MetricDescriptor; 4] {
        [&self.gas, &self.consumption, &self.production, &self.power]
    }
}
