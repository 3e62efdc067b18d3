use super::{safe_relative, ChartBundle};
use crate::error::{ScenarioError, ScenarioResult};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

const CHART_DIR: &str = "chart";

pub(super) async fn download_chart(
    http: &reqwest::Client,
    url: &Url,
    prefix: &str,
    scenario_id: &str,
) -> ScenarioResult<ChartBundle> {
    let failed = |err: &dyn std::fmt::Display| {
        ScenarioError::ResolutionFailed(scenario_id.to_owned(), format!("{url}: {err}"))
    };

    info!("📥 Downloading chart archive: {url}");
    let body = http
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| failed(&err))?
        .bytes()
        .await
        .map_err(|err| failed(&err))?;

    let workdir = ChartBundle::workdir()?;
    let dest = workdir.path().join(CHART_DIR);
    let extracted = {
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || extract_chart(&body[..], &prefix, &dest))
            .await
            .map_err(|err| failed(&err))?
            .map_err(|err| failed(&err))?
    };

    if extracted == 0 {
        return Err(ScenarioError::ChartNotFound {
            scenario: scenario_id.to_owned(),
            detail: format!("no entries under '{prefix}' in {url}"),
        });
    }
    info!("✅ Extracted {extracted} chart entries");

    Ok(ChartBundle::new(workdir, CHART_DIR))
}

/// Extracts the entries of a gzipped tarball found under `prefix` into
/// `dest`, re-rooted so that `<prefix>/Chart.yaml` lands at
/// `<dest>/Chart.yaml`. Returns how many entries were extracted.
pub fn extract_chart<R: Read>(archive: R, prefix: &str, dest: &Path) -> io::Result<usize> {
    let mut archive = tar::Archive::new(GzDecoder::new(archive));
    fs::create_dir_all(dest)?;

    let mut extracted = 0;
    // Directory modes wait until everything is written, a read-only
    // directory would refuse its own contents.
    let mut directories = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let Ok(relative) = path.strip_prefix(prefix) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let Some(relative) = safe_relative(relative) else {
            warn!("Ignoring archive entry outside the chart: {}", path.display());
            continue;
        };

        let target = dest.join(&relative);
        let mode = entry.header().mode()?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            fs::create_dir_all(&target)?;
            directories.push((target, mode));
        } else if entry_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&target)?;
            io::copy(&mut entry, &mut file)?;
            set_mode(&target, mode)?;
            debug!("📄 Extracted: {}", relative.display());
        } else {
            debug!("Skipping {:?} entry {}", entry_type, path.display());
            continue;
        }
        extracted += 1;
    }

    // Deepest first
    for (directory, mode) in directories.iter().rev() {
        set_mode(directory, *mode)?;
    }

    Ok(extracted)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
