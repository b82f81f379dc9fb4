use tracing::debug;

use crate::error::AdvisoryError;
use crate::models::advisory::{CityAdvisoryResult, DailyAdvisory, DatedAdvisories, WeatherStatus};
use crate::models::forecast::{CityForecastBundle, ForecastRecord};

use super::advice::compose_advice;
use super::timezone::local_date_time;

const KELVIN_OFFSET: f64 = 273.15;

/// Kelvin to whole degrees Celsius, halves rounded up
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    (kelvin - KELVIN_OFFSET + 0.5).floor() as i64
}

fn build_advisory(record: &ForecastRecord, time: String) -> DailyAdvisory {
    let temperature = kelvin_to_celsius(record.main.temp);
    let weather = record
        .weather
        .iter()
        .map(|c| WeatherStatus {
            status: c.main.clone(),
            description: c.description.clone(),
        })
        .collect();

    DailyAdvisory {
        time,
        temperature,
        weather,
        advice: compose_advice(&record.weather, temperature, record.wind.speed),
    }
}

/// Group a forecast bundle into per-day advisories.
///
/// Records are walked in order. A new group starts whenever the local date
/// differs from the previous record's date. If the provider revisits an
/// earlier date, the new group replaces the earlier one under that key and
/// the earlier slots are lost. Providers return sorted timestamps so this
/// does not happen in practice; the behavior is kept for compatibility with
/// existing clients of the advisory output.
pub fn aggregate(bundle: &CityForecastBundle) -> Result<CityAdvisoryResult, AdvisoryError> {
    let first = bundle.list.first().ok_or(AdvisoryError::EmptyForecast)?;
    let offset = bundle.city.timezone;

    let mut data = DatedAdvisories::new();
    let (mut current_date, _) = local_date_time(first.dt, offset);
    let mut group: Vec<DailyAdvisory> = Vec::new();

    for record in &bundle.list {
        let (date, time) = local_date_time(record.dt, offset);
        let advisory = build_advisory(record, time);

        if date != current_date {
            if data.get(&date).is_some() {
                debug!("Forecast revisits {} out of order, replacing earlier group", date);
            }
            group = Vec::new();
            current_date = date.clone();
        }

        group.push(advisory);
        data.upsert(&date, group.clone());
    }

    Ok(CityAdvisoryResult::success(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forecast::{CityMeta, Condition, MainReadings, Wind};

    // 2024-03-10 00:00:00 UTC
    const DAY_START: i64 = 1710028800;
    const HOUR: i64 = 3600;

    fn record(dt: i64, kelvin: f64, wind: f64, category: &str) -> ForecastRecord {
        ForecastRecord {
            dt,
            main: MainReadings { temp: kelvin },
            weather: vec![Condition {
                main: category.to_string(),
                description: category.to_lowercase(),
            }],
            wind: Wind { speed: wind },
            dt_txt: String::new(),
        }
    }

    fn bundle(records: Vec<ForecastRecord>, offset: i32) -> CityForecastBundle {
        CityForecastBundle::new(
            records,
            CityMeta {
                timezone: offset,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_kelvin_conversion() {
        assert_eq!(kelvin_to_celsius(300.15), 27);
        assert_eq!(kelvin_to_celsius(273.65), 1);
        assert_eq!(kelvin_to_celsius(273.15), 0);
        assert_eq!(kelvin_to_celsius(270.0), -3);
    }

    #[test]
    fn test_empty_bundle_is_rejected() {
        assert_eq!(aggregate(&bundle(vec![], 0)), Err(AdvisoryError::EmptyForecast));
    }

    #[test]
    fn test_groups_by_day() {
        let b = bundle(
            vec![
                record(DAY_START + 15 * HOUR, 290.0, 2.0, "Clouds"),
                record(DAY_START + 18 * HOUR, 291.0, 2.0, "Clouds"),
                record(DAY_START + 24 * HOUR, 288.0, 2.0, "Rain"),
            ],
            0,
        );
        let result = aggregate(&b).unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.message, "success");
        let dates: Vec<&str> = result.data.dates().collect();
        assert_eq!(dates, vec!["2024-03-10", "2024-03-11"]);
        assert_eq!(result.data.get("2024-03-10").unwrap().len(), 2);
        assert_eq!(result.data.get("2024-03-11").unwrap().len(), 1);
        assert_eq!(result.data.get("2024-03-11").unwrap()[0].advice, "Carry umbrella. ");
    }

    #[test]
    fn test_every_record_is_kept_in_order() {
        let records: Vec<ForecastRecord> = (0..16)
            .map(|i| record(DAY_START + i * 3 * HOUR, 280.0 + i as f64, 1.0, "Clear"))
            .collect();
        let result = aggregate(&bundle(records, 0)).unwrap();

        let flattened: Vec<i64> = result
            .data
            .iter()
            .flat_map(|(_, slots)| slots.iter().map(|s| s.temperature))
            .collect();
        let expected: Vec<i64> = (0..16).map(|i| kelvin_to_celsius(280.0 + i as f64)).collect();
        assert_eq!(flattened, expected);
        assert_eq!(result.data.len(), 2);
    }

    #[test]
    fn test_offset_shifts_day_boundary() {
        // 22:00 UTC is already the next day at +03:00
        let b = bundle(
            vec![
                record(DAY_START + 19 * HOUR, 290.0, 1.0, "Clear"),
                record(DAY_START + 22 * HOUR, 290.0, 1.0, "Clear"),
            ],
            3 * 3600,
        );
        let result = aggregate(&b).unwrap();
        let dates: Vec<&str> = result.data.dates().collect();
        assert_eq!(dates, vec!["2024-03-10", "2024-03-11"]);
        assert_eq!(result.data.get("2024-03-10").unwrap()[0].time, "22:00:00");
        assert_eq!(result.data.get("2024-03-11").unwrap()[0].time, "01:00:00");
    }

    #[test]
    fn test_revisited_date_replaces_earlier_group() {
        let b = bundle(
            vec![
                record(DAY_START + 3 * HOUR, 290.0, 1.0, "Clear"),
                record(DAY_START + 6 * HOUR, 291.0, 1.0, "Clear"),
                record(DAY_START + 27 * HOUR, 292.0, 1.0, "Clear"),
                record(DAY_START + 9 * HOUR, 293.0, 1.0, "Clear"),
            ],
            0,
        );
        let result = aggregate(&b).unwrap();

        let dates: Vec<&str> = result.data.dates().collect();
        assert_eq!(dates, vec!["2024-03-10", "2024-03-11"]);
        let first_day = result.data.get("2024-03-10").unwrap();
        assert_eq!(first_day.len(), 1);
        assert_eq!(first_day[0].time, "09:00:00");
    }

    #[test]
    fn test_threshold_advice_per_record() {
        let b = bundle(vec![record(DAY_START, 314.15, 11.0, "Clear")], 0);
        let result = aggregate(&b).unwrap();
        let slot = &result.data.get("2024-03-10").unwrap()[0];
        assert_eq!(slot.temperature, 41);
        assert_eq!(slot.advice, "Use sunscreen lotion. It's too windy, watch out! ");
        assert_eq!(slot.weather[0].status, "Clear");
    }

    #[test]
    fn test_is_deterministic() {
        let b = bundle(
            vec![
                record(DAY_START, 300.15, 3.0, "Rain"),
                record(DAY_START + 30 * HOUR, 260.0, 15.0, "Snow"),
            ],
            -7200,
        );
        assert_eq!(aggregate(&b).unwrap(), aggregate(&b).unwrap());
    }
}
