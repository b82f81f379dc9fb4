use crate::models::forecast::Condition;

pub const SUNSCREEN_ADVICE: &str = "Use sunscreen lotion.";
pub const WIND_ADVICE: &str = "It's too windy, watch out!";
pub const NO_ADVICE: &str = "No advice as of now!!";

/// Degrees Celsius above which sunscreen is advised
pub const HOT_THRESHOLD_C: i64 = 40;
/// Wind speed (m/s) above which a wind warning is given
pub const WINDY_THRESHOLD_MS: f64 = 10.0;

const HEAVY_RAIN: &str = "Heavy rain expected, avoid travel if possible.";

/// Phrases keyed by exact provider description; checked before the category
const DESCRIPTION_PHRASES: &[(&str, &str)] = &[
    ("heavy intensity rain", HEAVY_RAIN),
    ("very heavy rain", HEAVY_RAIN),
    ("extreme rain", HEAVY_RAIN),
    ("heavy intensity shower rain", HEAVY_RAIN),
];

const CATEGORY_PHRASES: &[(&str, &str)] = &[
    ("thunderstorm", "Don't step out! A Storm is brewing!"),
    ("drizzle", "Light showers expected, carry a raincoat."),
    ("rain", "Carry umbrella."),
    ("snow", "Wear warm clothes and watch for icy roads."),
    ("mist", "Low visibility, drive carefully."),
    ("fog", "Low visibility, drive carefully."),
    ("haze", "Low visibility, drive carefully."),
    ("smoke", "Low visibility, drive carefully."),
    ("dust", "Poor air quality, wear a mask outdoors."),
    ("sand", "Poor air quality, wear a mask outdoors."),
    ("ash", "Poor air quality, wear a mask outdoors."),
    ("squall", "Severe winds, seek shelter!"),
    ("tornado", "Severe winds, seek shelter!"),
];

/// Condition-specific phrase, if the condition is one we have advice for
pub fn condition_phrase(condition: &Condition) -> Option<&'static str> {
    let description = condition.description.trim().to_lowercase();
    let category = condition.main.trim().to_lowercase();

    DESCRIPTION_PHRASES
        .iter()
        .find(|(key, _)| *key == description)
        .or_else(|| CATEGORY_PHRASES.iter().find(|(key, _)| *key == category))
        .map(|(_, phrase)| *phrase)
}

/// Build the advice text for one forecast slot.
///
/// Fragments are emitted in order: one per recognised condition, then heat,
/// then wind. Each fragment carries a trailing space.
pub fn compose_advice(conditions: &[Condition], temp_c: i64, wind_speed: f64) -> String {
    let mut advice = String::new();

    for condition in conditions {
        if let Some(phrase) = condition_phrase(condition) {
            advice.push_str(phrase);
            advice.push(' ');
        }
    }

    if temp_c > HOT_THRESHOLD_C {
        advice.push_str(SUNSCREEN_ADVICE);
        advice.push(' ');
    }

    if wind_speed > WINDY_THRESHOLD_MS {
        advice.push_str(WIND_ADVICE);
        advice.push(' ');
    }

    if advice.is_empty() {
        NO_ADVICE.to_string()
    } else {
        advice
    }
}
