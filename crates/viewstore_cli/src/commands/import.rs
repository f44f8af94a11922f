//! Import command implementation.

use std::path::{Path, PathBuf};
use tracing::debug;
use viewstore_core::{CoreResult, Datastore};

/// Imports each file in turn, returning one message per file.
///
/// Stops at the first failure; files already imported stay merged.
pub async fn execute(store: &Datastore, paths: &[PathBuf]) -> CoreResult<Vec<String>> {
    let mut messages = Vec::with_capacity(paths.len());
    for path in paths {
        let stats = store.import_file(path).await?;
        debug!(
            path = %path.display(),
            total = stats.total(),
            "store size after import"
        );
        messages.push(success_message(path));
    }
    Ok(messages)
}

fn success_message(path: &Path) -> String {
    format!("{} imported successfully.", path.display())
}

/// Runs the import command.
pub async fn run(store: &Datastore, paths: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    for message in execute(store, paths).await? {
        println!("{message}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use viewstore_core::{Query, Schema};

    #[tokio::test]
    async fn imports_files_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.psv");
        let second = dir.path().join("second.psv");
        std::fs::write(
            &first,
            "STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME\r\nstb1|alien|fox|2014-04-01|1.00|1:57\r\n",
        )
        .unwrap();
        std::fs::write(
            &second,
            "STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME\r\nstb1|alien|fox|2014-04-01|2.00|1:57\r\n",
        )
        .unwrap();

        let store = Datastore::new(dir.path().join("datastore.psv"), Schema::media_views());
        let messages = execute(&store, &[first.clone(), second]).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], format!("{} imported successfully.", first.display()));

        let rows = store.query(&Query::new().select(["REV"])).await.unwrap();
        assert_eq!(rows, vec!["2.00"]);
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let dir = tempdir().unwrap();
        let store = Datastore::new(dir.path().join("datastore.psv"), Schema::media_views());
        let err = execute(&store, &[dir.path().join("nope.psv")]).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
