//! Dropdata command implementation.

use viewstore_core::{CoreResult, Datastore};

/// Deletes the store and returns the message to print.
pub async fn execute(store: &Datastore) -> CoreResult<&'static str> {
    if store.drop_all().await? {
        Ok("Data deleted.")
    } else {
        Ok("No data to delete.")
    }
}

/// Runs the dropdata command.
pub async fn run(store: &Datastore) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", execute(store).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use viewstore_core::{Record, Schema};

    #[tokio::test]
    async fn reports_whether_data_existed() {
        let dir = tempdir().unwrap();
        let store = Datastore::new(dir.path().join("datastore.psv"), Schema::media_views());
        assert_eq!(execute(&store).await.unwrap(), "No data to delete.");

        let record: Record = [("STB", "stb1"), ("TITLE", "alien"), ("DATE", "2014-04-01")]
            .into_iter()
            .collect();
        store.insert(vec![record]).await.unwrap();
        assert_eq!(execute(&store).await.unwrap(), "Data deleted.");
        assert!(!store.path().exists());
    }
}
