use crate::gateway::memory::BackendData;
use std::path::Path;
use tokio::fs;
use tracing::error;

pub const DEFAULT_DATA_PATH: &str = "data/checkins.json";

pub async fn load_data(path: &Path) -> BackendData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                BackendData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BackendData::default(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            BackendData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &BackendData) -> std::io::Result<()> {
    let payload = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("checkin_{label}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty_data() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_data() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{not json").await.unwrap();
        assert!(load_data(&path).await.is_empty());
        let _ = fs::remove_file(&path).await;
    }
}
