use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One snapshot of the meter as returned by the device's JSON endpoint.
///
/// Keys the device leaves out or sends as `null` decode to zero, and unknown
/// keys are ignored.
/// `Reading::default()` is the "no data this scrape" value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
    /// Device clock at measurement, unix seconds
    #[serde(rename = "tm", deserialize_with = "null_as_default")]
    pub timestamp: u64,
    /// Net counter as shown in the device UI, roughly p1 + p2 - n1 - n2
    #[serde(rename = "net", deserialize_with = "null_as_default")]
    pub net_counter: f64,
    /// Actual power in watts, negative while exporting
    #[serde(rename = "pwr", deserialize_with = "null_as_default")]
    pub power: i64,
    #[serde(rename = "ts0", deserialize_with = "null_as_default")]
    pub s0_timestamp: u64,
    /// S0 input counter (kWh)
    #[serde(rename = "cs0", deserialize_with = "null_as_default")]
    pub s0_counter: f64,
    #[serde(rename = "ps0", deserialize_with = "null_as_default")]
    pub s0_power: u64,
    /// Consumption, low tariff (kWh)
    #[serde(deserialize_with = "null_as_default")]
    pub p1: f64,
    /// Consumption, high tariff (kWh)
    #[serde(deserialize_with = "null_as_default")]
    pub p2: f64,
    /// Production, low tariff (kWh)
    #[serde(deserialize_with = "null_as_default")]
    pub n1: f64,
    /// Production, high tariff (kWh)
    #[serde(deserialize_with = "null_as_default")]
    pub n2: f64,
    /// Gas meter counter (m3)
    #[serde(deserialize_with = "null_as_default")]
    pub gas: f64,
    /// Last gas meter sample, `YYMMDDHHmm`
    #[serde(rename = "gts", deserialize_with = "null_as_default")]
    pub gas_timestamp: u64,
}

/// `null` decodes like a missing key instead of failing the whole reading.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Reading {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Measurement time reported by the device, `None` when unset.
    pub fn measured_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp == 0 {
            return None;
        }
        DateTime::from_timestamp(i64::try_from(self.timestamp).ok()?, 0)
    }

    /// Decodes the gas meter's `YYMMDDHHmm` timestamp.
    ///
    /// The gas meter reports local wall-clock time without a zone, so the
    /// result is naive. Years are taken as 20YY.
    pub fn gas_measured_at(&self) -> Option<NaiveDateTime> {
        let v = self.gas_timestamp;
        if v == 0 || v >= 10_000_000_000 {
            return None;
        }

        let minute = (v % 100) as u32;
        let hour = (v / 100 % 100) as u32;
        let day = (v / 10_000 % 100) as u32;
        let month = (v / 1_000_000 % 100) as u32;
        let year = 2000 + (v / 100_000_000) as i32;

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use pretty_assertions::assert_eq;

    const DEVICE_SAMPLE: &str = r#"{"tm":1575316361,"net": 1133.932,"pwr": 431,"ts0":1535271600,"cs0": 0.000,"ps0": 0,"p1": 4590.448,"p2": 4315.399,"n1": 2320.876,"n2": 5451.039,"gas": 2878.709,"gts":1912022000}"#;

    #[test]
    fn test_decode_full_device_object() {
        let reading: Reading = serde_json::from_str(DEVICE_SAMPLE).unwrap();

        assert_eq!(
            reading,
            Reading {
                timestamp: 1575316361,
                net_counter: 1133.932,
                power: 431,
                s0_timestamp: 1535271600,
                s0_counter: 0.0,
                s0_power: 0,
                p1: 4590.448,
                p2: 4315.399,
                n1: 2320.876,
                n2: 5451.039,
                gas: 2878.709,
                gas_timestamp: 1912022000,
            }
        );
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let reading: Reading =
            serde_json::from_str(r#"{"pwr": -120, "firmware": "1.4", "p1": 12}"#).unwrap();

        assert_eq!(reading.power, -120);
        assert_eq!(reading.p1, 12.0);
        assert_eq!(reading.gas, 0.0);
        assert_eq!(reading.timestamp, 0);
        assert!(!reading.is_empty());
    }

    #[test]
    fn test_null_fields_decode_to_zero() {
        let reading: Reading = serde_json::from_str(
            r#"{"gas": null, "p1": 4590.448, "pwr": 431, "tm": null, "gts": null}"#,
        )
        .unwrap();

        assert_eq!(reading.gas, 0.0);
        assert_eq!(reading.p1, 4590.448);
        assert_eq!(reading.power, 431);
        assert_eq!(reading.timestamp, 0);
        assert_eq!(reading.gas_timestamp, 0);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Reading::default().is_empty());
        assert_eq!(Reading::default().measured_at(), None);
        assert_eq!(Reading::default().gas_measured_at(), None);
    }

    #[test]
    fn test_measured_at() {
        let reading = Reading {
            timestamp: 1575316361,
            ..Default::default()
        };

        assert_eq!(
            reading.measured_at().unwrap().to_rfc3339(),
            "2019-12-02T19:52:41+00:00"
        );
    }

    #[test]
    fn test_gas_measured_at() {
        let reading = Reading {
            gas_timestamp: 1912022000,
            ..Default::default()
        };

        let ts = reading.gas_measured_at().unwrap();
        assert_eq!(ts.year(), 2019);
        assert_eq!(ts.month(), 12);
        assert_eq!(ts.day(), 2);
        assert_eq!(ts.hour(), 20);
        assert_eq!(ts.minute(), 0);
    }

    #[test]
    fn test_gas_measured_at_rejects_invalid_calendar_values() {
        // month 13
        let reading = Reading {
            gas_timestamp: 1913022000,
            ..Default::default()
        };
        assert_eq!(reading.gas_measured_at(), None);

        // too many digits for YYMMDDHHmm
        let reading = Reading {
            gas_timestamp: 19120220001,
            ..Default::default()
        };
        assert_eq!(reading.gas_measured_at(), None);
    }
}
