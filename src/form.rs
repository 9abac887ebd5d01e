use crate::model::FEATURE_COUNT;
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};

/// Raw form fields as posted by the browser.
///
/// Numeric fields are optional: an empty `<input>` posts an empty string,
/// which deserializes to `None`. A genuine zero measurement is therefore
/// distinguishable from "not entered" and is accepted.
#[derive(Debug, Default, Deserialize)]
pub struct PredictionForm {
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub polymer_grade: String,

    #[serde(default)]
    pub user_name: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub input_a: Option<i64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub input_b: Option<f64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub input_c: Option<f64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub input_d: Option<f64>,
}

/// A validated submission, ready for inference and record building.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub polymer_grade: String,
    pub user_name: String,
    pub input_a: i64,
    pub input_b: f64,
    pub input_c: f64,
    pub input_d: f64,
}

impl Submission {
    /// Feature vector in the fixed order the model was fit on.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.input_a as f64,
            self.input_b,
            self.input_c,
            self.input_d,
        ]
    }
}

impl PredictionForm {
    /// Validate the raw fields into a `Submission`.
    ///
    /// Rules:
    /// - `polymer_grade` and `user_name` are trimmed and must be non-empty
    /// - all four numeric inputs must be present
    /// - `date` must parse as `%Y-%m-%d` when given, defaulting to today
    /// - `time` must parse as `%H:%M:%S` or `%H:%M` when given, defaulting
    ///   to 00:00:00
    ///
    /// The returned error is a user-facing message; validation has no side
    /// effects.
    pub fn validate(&self) -> Result<Submission, String> {
        let polymer_grade = self.polymer_grade.trim();
        let user_name = self.user_name.trim();

        if polymer_grade.is_empty() || user_name.is_empty() {
            return Err("Please fill in both Polymer Grade and User Name.".to_string());
        }

        let (input_a, input_b, input_c, input_d) =
            match (self.input_a, self.input_b, self.input_c, self.input_d) {
                (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                _ => {
                    return Err(
                        "Please fill in all four input parameters A, B, C, D.".to_string()
                    );
                }
            };

        let date = parse_date(self.date.trim())?;
        let time = parse_time(self.time.trim())?;

        Ok(Submission {
            date,
            time,
            polymer_grade: polymer_grade.to_string(),
            user_name: user_name.to_string(),
            input_a,
            input_b,
            input_c,
            input_d,
        })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    if value.is_empty() {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Date '{}' is not in YYYY-MM-DD format.", value))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    if value.is_empty() {
        return Ok(NaiveTime::MIN);
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| format!("Time '{}' is not in HH:MM format.", value))
}

/// Deserialize an optional numeric form field, treating an empty or
/// whitespace-only string as absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}
