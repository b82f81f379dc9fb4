use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a value that might be a string or a number as a String.
/// OpenWeatherMap sends `cod` as "200" on success but as 401 on auth failures,
/// and `message` as 0 on success but as text on errors.
fn deserialize_string_or_num<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Int(i64),
        Num(f64),
        Str(String),
        Null,
    }
    match StringOrNum::deserialize(deserializer)? {
        StringOrNum::Int(n) => Ok(n.to_string()),
        StringOrNum::Num(n) => Ok(n.to_string()),
        StringOrNum::Str(s) => Ok(s),
        StringOrNum::Null => Ok(String::new()),
    }
}

/// One weather condition as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Category, e.g. "Rain", "Clouds"
    pub main: String,
    /// Free text, e.g. "light rain"
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MainReadings {
    /// Temperature in Kelvin
    pub temp: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Wind {
    /// Wind speed in m/s
    #[serde(default)]
    pub speed: f64,
}

/// A single 3-hour forecast slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastRecord {
    /// Epoch seconds (UTC)
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    /// Provider formatted "YYYY-MM-DD HH:MM:SS", in UTC
    #[serde(default)]
    pub dt_txt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CityMeta {
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One complete forecast response, either freshly fetched or cached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityForecastBundle {
    #[serde(default, deserialize_with = "deserialize_string_or_num")]
    pub cod: String,
    #[serde(default)]
    pub cnt: usize,
    #[serde(default, deserialize_with = "deserialize_string_or_num")]
    pub message: String,
    #[serde(default)]
    pub list: Vec<ForecastRecord>,
    #[serde(default)]
    pub city: CityMeta,
}

pub const SUCCESS_CODE: &str = "200";

impl CityForecastBundle {
    /// Successful bundle around `records`; test fixtures build on this
    #[cfg(test)]
    pub fn new(records: Vec<ForecastRecord>, city: CityMeta) -> Self {
        Self {
            cod: SUCCESS_CODE.to_string(),
            cnt: records.len(),
            message: "0".to_string(),
            list: records,
            city,
        }
    }

    /// Successful provider response with at least one slot
    pub fn is_usable(&self) -> bool {
        self.cod == SUCCESS_CODE && !self.list.is_empty()
    }

    /// Copy of this bundle carrying a different record list, `cnt` kept in sync
    pub fn with_records(&self, records: Vec<ForecastRecord>) -> Self {
        Self {
            cod: self.cod.clone(),
            cnt: records.len(),
            message: self.message.clone(),
            list: records,
            city: self.city.clone(),
        }
    }
}
