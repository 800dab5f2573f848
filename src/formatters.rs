use serde_json::Value;

use crate::models::{AggregationResult, DailySeries, SummaryStatistics};

/// Formats summary statistics as a NASA POWER insight card
pub fn format_insight_card(stats: &SummaryStatistics) -> String {
    let mut output = String::from("NASA POWER Data Summary:\n\n");

    if stats.is_empty() {
        output.push_str("No usable data for this location and period.\n");
        return output;
    }

    if let Some(ghi) = stats.get("ghi") {
        output.push_str(&format!(
            "Solar Irradiance (GHI): {:.2} kWh/m\u{00b2}/day\n  Avg. daily energy from the sun.\n",
            ghi.avg
        ));
    }
    if let Some(wind) = stats.get("wind") {
        output.push_str(&format!(
            "Wind Speed (10m): {:.2} m/s\n  Avg. wind speed 10m above ground.\n",
            wind.avg
        ));
    }
    if let Some(wind) = stats.get("wind50m") {
        output.push_str(&format!("Wind Speed (50m): {:.2} m/s\n", wind.avg));
        if let (Some(min), Some(max)) = (wind.min, wind.max) {
            output.push_str(&format!("  Daily min: {min:.2} / max: {max:.2} m/s\n"));
        }
    }
    if let Some(temp) = stats.get("temp") {
        output.push_str(&format!("Air Temperature: {:.1}\u{00b0}C\n", temp.avg));
        match (temp.min, temp.max) {
            (Some(min), Some(max)) => output.push_str(&format!(
                "  Avg. with min: {min:.1}\u{00b0} / max: {max:.1}\u{00b0}\n"
            )),
            (Some(min), None) => output.push_str(&format!("  Min: {min:.1}\u{00b0}\n")),
            (None, Some(max)) => output.push_str(&format!("  Max: {max:.1}\u{00b0}\n")),
            (None, None) => {}
        }
    }
    if let Some(precip) = stats.get("precip") {
        output.push_str(&format!(
            "Precipitation: {:.1} mm/day\n  Avg. daily rainfall equivalent.\n",
            precip.avg
        ));
    }
    output
}

/// Builds the payload handed back to the model for a `get_power_data` call
pub fn tool_response(
    result: &AggregationResult,
    location: Option<&str>,
) -> Result<Value, serde_json::Error> {
    let mut payload = serde_json::to_value(&result.stats)?;
    let location = location.map_or_else(
        || format!("{:.2}, {:.2}", result.meta.lat, result.meta.lon),
        ToString::to_string,
    );
    if let Value::Object(map) = &mut payload {
        map.insert("location".to_string(), Value::String(location));
    }
    Ok(payload)
}

/// Human-readable label for a POWER parameter code
pub fn metric_label(code: &str) -> &str {
    match code {
        "T2M" => "Avg Temp (\u{00b0}C)",
        "T2M_MAX" => "Max Temp (\u{00b0}C)",
        "T2M_MIN" => "Min Temp (\u{00b0}C)",
        "WS10M" => "Wind Speed @10m (m/s)",
        "WS50M" => "Wind Speed @50m (m/s)",
        "WS50M_MAX" => "Max Wind @50m (m/s)",
        "WS50M_MIN" => "Min Wind @50m (m/s)",
        "ALLSKY_SFC_SW_DWN" => "Solar Irradiance (kWh/m\u{00b2}/day)",
        "PRECTOTCORR" => "Precipitation (mm/day)",
        other => other,
    }
}

/// Describes one metric on one day
pub fn format_metric_value(code: &str, date: &str, value: Option<f64>) -> String {
    let value = value.map_or_else(|| "n/a".to_string(), |v| v.to_string());
    format!("{}\nDate: {date}\nValue: {value}", metric_label(code))
}

/// Describes every metric recorded for `date`
pub fn format_day_summary(daily: &DailySeries, date: &str) -> String {
    let mut output = format!("NASA Data ({date})");
    for (code, series) in daily {
        if let Some(value) = series.get(date) {
            output.push_str(&format!("\n  {}: {value}", metric_label(code)));
        }
    }
    output
}
