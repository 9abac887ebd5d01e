use crate::form::Submission;
use chrono::{DateTime, Local};

/// Canonical column order of the persisted table.
pub const HEADER: [&str; 10] = [
    "Date",
    "Time",
    "User_Name",
    "Polymer_Grade",
    "A_LC",
    "B_MFR_S205",
    "C_MFR_S206",
    "D_MFR_S402C",
    "Predicted_NNI",
    "Logged_At",
];

/// One persisted row: inputs, metadata, and the prediction output.
///
/// Append-only; never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub date: String,
    pub time: String,
    pub user_name: String,
    pub polymer_grade: String,
    pub input_a: i64,
    pub input_b: f64,
    pub input_c: f64,
    pub input_d: f64,
    pub predicted_nni: f64,
    pub logged_at: String,
}

impl PredictionRecord {
    /// Build a record from a validated submission, the model output, and the
    /// wall-clock timestamp of the request. Pure mapping, no side effects.
    pub fn build(
        submission: &Submission,
        prediction: f64,
        logged_at: DateTime<Local>,
    ) -> Self {
        PredictionRecord {
            date: submission.date.format("%Y-%m-%d").to_string(),
            time: submission.time.format("%H:%M:%S").to_string(),
            user_name: submission.user_name.clone(),
            polymer_grade: submission.polymer_grade.clone(),
            input_a: submission.input_a,
            input_b: submission.input_b,
            input_c: submission.input_c,
            input_d: submission.input_d,
            predicted_nni: prediction,
            logged_at: logged_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Render the record as one table row in `HEADER` order.
    ///
    /// A_LC is an integer; the melt-flow inputs and the prediction are
    /// written with two decimals, matching the table's existing rows.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.time.clone(),
            self.user_name.clone(),
            self.polymer_grade.clone(),
            self.input_a.to_string(),
            format!("{:.2}", self.input_b),
            format!("{:.2}", self.input_c),
            format!("{:.2}", self.input_d),
            format!("{:.2}", self.predicted_nni),
            self.logged_at.clone(),
        ]
    }
}
