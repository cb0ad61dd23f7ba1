use crate::domain::contract::parse_snapshot_json;
use crate::domain::radar::{RadarData, RadarKey};
use anyhow::Context;
use std::path::{Path, PathBuf};

pub fn snapshot_file_name(key: &RadarKey) -> String {
    format!("{}-{}.json", key.month, key.nation)
}

/// Read every `*.json` snapshot in `dir`, in file-name order.
///
/// One invalid file fails the whole load.
pub async fn load_snapshot_dir(dir: &Path) -> anyhow::Result<Vec<RadarData>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read snapshot dir {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to list snapshot dir {}", dir.display()))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let data = parse_snapshot_json(&text)
            .with_context(|| format!("invalid snapshot file {}", path.display()))?;
        out.push(data);
    }

    Ok(out)
}

pub async fn write_snapshot(dir: &Path, data: &RadarData) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(snapshot_file_name(&data.key()));
    let body = serde_json::to_vec_pretty(data).context("snapshot serialize failed")?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}
