/// OpenWeatherMap API endpoints
pub const OPENWEATHER_API: &str = "https://api.openweathermap.org/data/2.5";

// 5 day / 3 hour forecast
pub const FORECAST: &str = "/forecast";

// Query parameters
pub const PARAM_QUERY: &str = "q";
pub const PARAM_COUNT: &str = "cnt";
pub const PARAM_APP_ID: &str = "appid";
