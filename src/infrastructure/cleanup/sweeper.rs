use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Background sweep of aged job directories. In-flight jobs finish well
/// inside the age threshold, so anything older is abandoned state.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub roots: Vec<PathBuf>,
    pub max_age: Duration,
    pub interval: Duration,
}

pub fn spawn_sweeper(config: SweeperConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for root in &config.roots {
                if let Err(e) = sweep_root(root, config.max_age).await {
                    tracing::warn!(root = %root.display(), error = %e, "Cleanup sweep failed");
                }
            }
        }
    })
}

async fn sweep_root(root: &PathBuf, max_age: Duration) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        // Roots are created lazily on first job; nothing to sweep yet.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let mut removed = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(_) => continue,
        };
        let modified = match metadata.modified() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let age = modified.elapsed().unwrap_or_default();
        if age <= max_age {
            continue;
        }

        let path = entry.path();
        let result = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove aged entry")
            }
        }
    }

    if removed > 0 {
        tracing::info!(root = %root.display(), removed, "Removed aged job state");
    }
    Ok(())
}
