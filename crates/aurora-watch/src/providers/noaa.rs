use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{get_json, number_field, AuroraSource, ProviderError};
use crate::domain::{AuroraSignal, KpForecastEntry};

pub const NOAA_SWPC_BASE_URL: &str = "https://services.swpc.noaa.gov";
/// Three-hour slots kept from the forecast product (36 hours).
pub const FORECAST_PERIODS: usize = 12;

const PROVIDER: &str = "noaa-swpc";
const OBSERVED_KP_PATH: &str = "/products/noaa-planetary-k-index.json";
const FORECAST_KP_PATH: &str = "/products/noaa-planetary-k-index-forecast.json";

/// NOAA Space Weather Prediction Center planetary K-index products.
#[derive(Debug, Clone)]
pub struct NoaaSwpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl NoaaSwpcClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AuroraSource for NoaaSwpcClient {
    async fn fetch_current(&self) -> Result<AuroraSignal, ProviderError> {
        let observed = get_json(
            PROVIDER,
            self.http.get(format!("{}{}", self.base_url, OBSERVED_KP_PATH)),
        )
        .await?;
        let forecast = get_json(
            PROVIDER,
            self.http.get(format!("{}{}", self.base_url, FORECAST_KP_PATH)),
        )
        .await?;

        aurora_signal_from_products(&observed, &forecast)
    }
}

pub(crate) fn aurora_signal_from_products(
    observed: &Value,
    forecast: &Value,
) -> Result<AuroraSignal, ProviderError> {
    let kp_index = kp_rows(observed)?
        .last()
        .map(|entry| entry.kp)
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER,
            detail: "observed K-index product has no readings".to_string(),
        })?;

    let mut forecast = kp_rows(forecast)?;
    forecast.truncate(FORECAST_PERIODS);

    Ok(AuroraSignal {
        kp_index,
        forecast,
        updated_at: Some(Utc::now()),
    })
}

/// Reads `(time_tag, kp)` pairs from either the legacy table layout (header row followed by
/// string arrays) or the keyed-object layout. Rows without a numeric Kp are skipped, which also
/// drops the header row.
fn kp_rows(product: &Value) -> Result<Vec<KpForecastEntry>, ProviderError> {
    let rows = product.as_array().ok_or_else(|| ProviderError::Malformed {
        provider: PROVIDER,
        detail: "expected a JSON array".to_string(),
    })?;

    Ok(rows.iter().filter_map(kp_row).collect())
}

fn kp_row(row: &Value) -> Option<KpForecastEntry> {
    let (time, kp) = match row {
        Value::Array(cells) => (cells.first()?, cells.get(1)?),
        Value::Object(fields) => (
            fields.get("time_tag")?,
            fields.get("Kp").or_else(|| fields.get("kp"))?,
        ),
        _ => return None,
    };

    Some(KpForecastEntry {
        time: time.as_str()?.to_string(),
        kp: number_field(kp)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observed_table() -> Value {
        json!([
            ["time_tag", "Kp", "a_running", "station_count"],
            ["2026-02-01 00:00:00.000", "2.33", "9", "8"],
            ["2026-02-01 03:00:00.000", "4.67", "39", "8"]
        ])
    }

    fn forecast_table(rows: usize) -> Value {
        let mut table = vec![json!(["time_tag", "kp", "observed", "noaa_scale"])];
        for slot in 0..rows {
            table.push(json!([
                format!("2026-02-01 {:02}:00:00", (slot * 3) % 24),
                format!("{:.2}", 3.0 + slot as f64 / 3.0),
                "predicted",
                null
            ]));
        }
        Value::Array(table)
    }

    #[test]
    fn current_kp_comes_from_last_observed_row() {
        let signal =
            aurora_signal_from_products(&observed_table(), &forecast_table(3)).expect("parses");
        assert_eq!(signal.kp_index, 4.67);
        assert_eq!(signal.forecast.len(), 3);
        assert_eq!(signal.forecast[0].kp, 3.0);
        assert!(signal.updated_at.is_some());
    }

    #[test]
    fn forecast_is_capped_at_twelve_periods() {
        let signal =
            aurora_signal_from_products(&observed_table(), &forecast_table(24)).expect("parses");
        assert_eq!(signal.forecast.len(), FORECAST_PERIODS);
    }

    #[test]
    fn keyed_object_layout_is_supported() {
        let observed = json!([
            { "time_tag": "2026-02-01T00:00:00", "Kp": 1.67, "a_running": 6 },
            { "time_tag": "2026-02-01T03:00:00", "Kp": 3.0, "a_running": 15 }
        ]);
        let forecast = json!([{ "time_tag": "2026-02-01T06:00:00", "kp": "5.00" }]);
        let signal = aurora_signal_from_products(&observed, &forecast).expect("parses");
        assert_eq!(signal.kp_index, 3.0);
        assert_eq!(signal.forecast[0].time, "2026-02-01T06:00:00");
        assert_eq!(signal.forecast[0].kp, 5.0);
    }

    #[test]
    fn empty_observed_product_is_malformed() {
        let observed = json!([["time_tag", "Kp", "a_running", "station_count"]]);
        let err = aurora_signal_from_products(&observed, &forecast_table(1))
            .expect_err("no readings");
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[test]
    fn non_array_payload_is_malformed() {
        let err = aurora_signal_from_products(&json!({ "error": "maintenance" }), &json!([]))
            .expect_err("not a table");
        assert!(err.to_string().contains("expected a JSON array"));
    }
}
