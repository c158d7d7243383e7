//! Files the browser saves into its download directory

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::errors::{Error, Result};

/// Suffixes browsers give files still being written
pub const PARTIAL_SUFFIXES: &[&str] = &["crdownload", "part", "tmp", "download"];

const POLL: Duration = Duration::from_millis(100);

fn is_partial(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PARTIAL_SUFFIXES.contains(&e))
}

/// Finished files in `dir` with their sizes
///
/// Firefox creates an empty file under the final name next to the `.part`
/// file it writes into, so a file with a partial sibling is not finished.
pub async fn finished_files(dir: &Path) -> Result<Vec<(PathBuf, u64)>> {
    let mut names = HashSet::new();
    let mut files = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let path = entry.path();
        names.insert(path.clone());
        files.push((path, metadata.len()));
    }

    files.retain(|(path, _)| {
        !is_partial(path)
            && !PARTIAL_SUFFIXES.iter().any(|suffix| {
                let mut sibling = path.clone().into_os_string();
                sibling.push(format!(".{}", suffix));
                names.contains(&PathBuf::from(sibling))
            })
    });
    files.sort();
    Ok(files)
}

/// First finished file in `dir` not in `seen`
///
/// A file counts once its size is the same on two polls in a row.
pub async fn wait_for_new_file(
    dir: &Path,
    seen: &HashSet<PathBuf>,
    timeout: Duration,
) -> Result<PathBuf> {
    let deadline = Instant::now() + timeout;
    let mut sizes: HashMap<PathBuf, u64> = HashMap::new();

    loop {
        for (path, size) in finished_files(dir).await? {
            if seen.contains(&path) {
                continue;
            }
            if sizes.get(&path) == Some(&size) {
                info!("Download finished: {}", path.display());
                return Ok(path);
            }
            debug!("{} is {} bytes", path.display(), size);
            sizes.insert(path, size);
        }

        if Instant::now() >= deadline {
            return Err(Error::Timeout(format!(
                "no download finished in {} within {:?}",
                dir.display(),
                timeout
            )));
        }
        tokio::time::sleep(POLL).await;
    }
}

#[cfg(test)]
#[path = "downloads_test.rs"]
mod downloads_test;
