use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Condition as shown to the user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherStatus {
    pub status: String,
    pub description: String,
}

/// Advisory for one 3-hour slot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyAdvisory {
    pub time: String,
    /// Rounded degrees Celsius
    pub temperature: i64,
    pub weather: Vec<WeatherStatus>,
    pub advice: String,
}

/// Date -> advisories, kept in first-seen order of the dates.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedAdvisories {
    entries: Vec<(String, Vec<DailyAdvisory>)>,
}

impl DatedAdvisories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `advisories` to `date`. An existing binding is replaced in place,
    /// keeping the key's original position.
    pub fn upsert(&mut self, date: &str, advisories: Vec<DailyAdvisory>) {
        match self.entries.iter_mut().find(|(d, _)| d == date) {
            Some((_, slot)) => *slot = advisories,
            None => self.entries.push((date.to_string(), advisories)),
        }
    }

    pub fn get(&self, date: &str) -> Option<&[DailyAdvisory]> {
        self.entries
            .iter()
            .find(|(d, _)| d == date)
            .map(|(_, v)| v.as_slice())
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(d, _)| d.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DailyAdvisory])> {
        self.entries.iter().map(|(d, v)| (d.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for DatedAdvisories {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (date, advisories) in &self.entries {
            map.serialize_entry(date, advisories)?;
        }
        map.end()
    }
}

pub const SUCCESS_MESSAGE: &str = "success";
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable.";

/// Final artifact handed to the caller
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityAdvisoryResult {
    pub message: String,
    pub status: u16,
    pub data: DatedAdvisories,
}

impl CityAdvisoryResult {
    pub fn success(data: DatedAdvisories) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            status: 200,
            data,
        }
    }

    /// Result carrying no forecast data
    pub fn empty(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            data: DatedAdvisories::new(),
        }
    }

    pub fn unavailable() -> Self {
        Self::empty(SERVICE_UNAVAILABLE, 503)
    }

    /// Status an HTTP front end should answer with
    pub fn http_status(&self) -> u16 {
        match self.status {
            200 => 200,
            404 => 404,
            _ => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisory(time: &str) -> DailyAdvisory {
        DailyAdvisory {
            time: time.to_string(),
            temperature: 20,
            weather: vec![],
            advice: "No advice as of now!!".to_string(),
        }
    }

    #[test]
    fn test_upsert_keeps_first_seen_position() {
        let mut data = DatedAdvisories::new();
        data.upsert("2024-01-02", vec![advisory("00:00:00")]);
        data.upsert("2024-01-01", vec![advisory("03:00:00")]);
        data.upsert("2024-01-02", vec![advisory("06:00:00")]);

        let dates: Vec<&str> = data.dates().collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-01"]);
        assert_eq!(data.get("2024-01-02").unwrap()[0].time, "06:00:00");
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let mut data = DatedAdvisories::new();
        data.upsert("2024-01-03", vec![advisory("00:00:00")]);
        data.upsert("2024-01-01", vec![]);
        let json = serde_json::to_string(&CityAdvisoryResult::success(data)).unwrap();
        let first = json.find("2024-01-03").unwrap();
        let second = json.find("2024-01-01").unwrap();
        assert!(first < second, "dates out of order: {}", json);
        assert!(json.starts_with(r#"{"message":"success","status":200,"data":{"#));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(CityAdvisoryResult::empty("ok", 200).http_status(), 200);
        assert_eq!(CityAdvisoryResult::empty("city not found", 404).http_status(), 404);
        assert_eq!(CityAdvisoryResult::empty("Invalid API key", 401).http_status(), 503);
        assert_eq!(CityAdvisoryResult::unavailable().http_status(), 503);
    }
}
