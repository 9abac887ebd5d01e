use crate::record::PredictionRecord;
use crate::saving::{CsvStore, GitSync};
use crate::sheet::SheetClient;

/// Fan-out of one validated record to every configured persistence sink.
///
/// Each sink is append-only with read-modify-write semantics: read the full
/// table, concatenate the record, write the full table back. The recorder is
/// held behind an async mutex in the application state, so concurrent
/// submissions serialize and cannot drop each other's rows.
pub struct Recorder {
    sheet: Option<SheetClient>,
    csv: Option<CsvStore>,
    git: Option<GitSync>,
}

impl Recorder {
    pub fn new(sheet: Option<SheetClient>, csv: Option<CsvStore>, git: Option<GitSync>) -> Self {
        Recorder { sheet, csv, git }
    }

    /// Append the record to every configured sink.
    ///
    /// A sink failure is collected as a user-facing warning string rather
    /// than aborting: the prediction result is already in hand and is still
    /// shown to the user.
    pub async fn append(&self, record: &PredictionRecord) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(sheet) = &self.sheet {
            let mut table = sheet.read_table().await;
            table.append_record(record);
            if let Err(e) = sheet.write_table(&table).await {
                log::error!("worksheet write failed: {}", e);
                warnings.push(format!("Could not write to the worksheet: {}", e));
            }
        }

        if let Some(csv) = &self.csv {
            match csv.read_table() {
                Ok(mut table) => {
                    table.append_record(record);
                    match csv.write_table(&table) {
                        Ok(()) => {
                            if let Some(git) = &self.git {
                                let message =
                                    format!("Add prediction record {}", record.logged_at);
                                if let Err(e) = git.sync(csv.path(), &message).await {
                                    log::error!("git sync failed: {}", e);
                                    warnings.push(format!(
                                        "Saved locally, but pushing to the remote failed: {}",
                                        e
                                    ));
                                }
                            }
                        }
                        Err(e) => {
                            log::error!("csv write failed: {}", e);
                            warnings.push(format!("Could not write the CSV file: {}", e));
                        }
                    }
                }
                Err(e) => {
                    log::error!("csv read failed: {}", e);
                    warnings.push(format!("Could not read the CSV file: {}", e));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Submission;
    use chrono::{Local, NaiveDate, NaiveTime};

    fn record() -> PredictionRecord {
        let submission = Submission {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            polymer_grade: "HD7000F".to_string(),
            user_name: "u".to_string(),
            input_a: 120,
            input_b: 7.5,
            input_c: 0.35,
            input_d: 2.0,
        };
        PredictionRecord::build(&submission, 41.2, Local::now())
    }

    #[tokio::test]
    async fn csv_only_recorder_appends_without_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("predictions.csv"));
        let recorder = Recorder::new(None, Some(store), None);

        let warnings = recorder.append(&record()).await;
        assert!(warnings.is_empty());

        let table = CsvStore::new(dir.path().join("predictions.csv"))
            .read_table()
            .unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[tokio::test]
    async fn sequential_appends_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        let recorder = Recorder::new(None, Some(CsvStore::new(&path)), None);

        for _ in 0..3 {
            let warnings = recorder.append(&record()).await;
            assert!(warnings.is_empty());
        }

        let table = CsvStore::new(&path).read_table().unwrap();
        assert_eq!(table.row_count(), 3);
    }

    #[tokio::test]
    async fn git_failure_is_a_warning_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        // No git repository in the temp dir, so the sync step must fail
        let recorder = Recorder::new(
            None,
            Some(CsvStore::new(&path)),
            Some(GitSync::new("https://invalid.example/repo.git", "main")),
        );

        let warnings = recorder.append(&record()).await;
        assert_eq!(warnings.len(), 1);

        // The row was still persisted locally
        let table = CsvStore::new(&path).read_table().unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
