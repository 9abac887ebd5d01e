use crate::BoxError;
use crate::table::SheetTable;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Local CSV persistence for the prediction table.
///
/// The whole file is rewritten on every append (the backends expose no
/// partial write), via a sibling temp file and rename so a crashed write
/// never leaves a truncated table behind.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full table. A missing file is an empty table.
    pub fn read_table(&self) -> Result<SheetTable, BoxError> {
        if !self.path.exists() {
            return Ok(SheetTable::empty());
        }
        let content = fs::read_to_string(&self.path)?;
        SheetTable::from_csv(&content).map_err(|e| e.to_string().into())
    }

    /// Write the full table, replacing the file contents.
    pub fn write_table(&self, table: &SheetTable) -> Result<(), BoxError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, table.to_csv())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Commit-and-push of the CSV file to a configured git remote.
///
/// The remote URL carries the access credential, as supplied in the
/// configuration. Every step is surfaced to the caller; none aborts the
/// submission that triggered it.
pub struct GitSync {
    remote: String,
    branch: String,
}

impl GitSync {
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        GitSync {
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Stage, commit, and push the file after a successful CSV write.
    pub async fn sync(&self, file: &Path, message: &str) -> Result<(), BoxError> {
        let repo_dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = file
            .file_name()
            .ok_or("csv path has no file name")?
            .to_string_lossy()
            .to_string();

        run_git(repo_dir, &["add", &file_name]).await?;
        run_git(repo_dir, &["commit", "-m", message]).await?;
        run_git(
            repo_dir,
            &["push", &self.remote, &format!("HEAD:{}", self.branch)],
        )
        .await?;

        Ok(())
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<(), BoxError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args[0], stderr.trim()).into());
    }

    Ok(())
}
