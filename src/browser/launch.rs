//! Chrome/Chromium discovery and launch

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::config::FetchConfig;
use crate::utils::DESKTOP_USER_AGENT;

#[cfg(target_os = "linux")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/homebrew/bin/chromium",
];

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const INSTALL_LOCATIONS: &[&str] = &[];

/// Binary names looked up on `PATH`
const PATH_NAMES: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// Flags for every launch: hide automation markers, keep the process lean,
/// and let frame capture read cross-origin embeds from the same process
const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process,TranslateUI",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--no-zygote",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-background-networking",
    "--disable-breakpad",
    "--mute-audio",
    "--hide-scrollbars",
];

/// Find a Chrome/Chromium executable
///
/// Tried in order: `configured`, `CHROMIUM_PATH`, the platform's usual
/// install locations, then `PATH`.
///
/// # Errors
///
/// When none of the candidates exists.
pub fn find_browser_executable(configured: Option<&Path>) -> Result<PathBuf> {
    let from_env = std::env::var_os("CHROMIUM_PATH").map(PathBuf::from);
    let explicit = [("configured path", configured.map(Path::to_path_buf)), ("CHROMIUM_PATH", from_env)];

    for (source, candidate) in explicit {
        let Some(path) = candidate else { continue };
        if path.exists() {
            info!("Using browser from {}: {}", source, path.display());
            return Ok(path);
        }
        warn!("Browser from {} does not exist: {}", source, path.display());
    }

    if let Some(path) = INSTALL_LOCATIONS.iter().map(PathBuf::from).find(|p| p.exists()) {
        info!("Found installed browser: {}", path.display());
        return Ok(path);
    }

    if let Some(path) = search_path() {
        info!("Found browser on PATH: {}", path.display());
        return Ok(path);
    }

    Err(anyhow!("no Chrome/Chromium executable found"))
}

fn search_path() -> Option<PathBuf> {
    let dirs = std::env::var_os("PATH")?;
    std::env::split_paths(&dirs)
        .flat_map(|dir| PATH_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Download Chromium into the user cache directory and return its executable
///
/// # Errors
///
/// When the cache directory cannot be created or the download fails.
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("article-fetch")
        .join("chromium");
    info!("Downloading Chromium into {}", cache_dir.display());

    tokio::fs::create_dir_all(&cache_dir)
        .await
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Invalid browser download options")?;
    let installed = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Chromium download failed")?;

    debug!("Chromium installed under {}", installed.folder_path.display());
    Ok(installed.executable_path)
}

/// Launch the shared browser process
///
/// Returns the browser, the task pumping its CDP connection and the
/// throwaway profile directory, which the caller removes after exit.
///
/// # Errors
///
/// When no executable is available or Chrome fails to start.
pub async fn launch_browser(config: &FetchConfig) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let executable = match find_browser_executable(config.chrome_executable()) {
        Ok(path) => path,
        Err(e) => {
            warn!("{e}; falling back to a managed download");
            download_managed_browser().await?
        }
    };

    let profile = std::env::temp_dir().join(format!("article_fetch_chrome_{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&profile)
        .await
        .with_context(|| format!("Failed to create profile {}", profile.display()))?;

    let mut builder = BrowserConfigBuilder::default()
        .chrome_executable(executable)
        .user_data_dir(&profile)
        .request_timeout(config.navigation_timeout())
        .window_size(1280, 1024)
        .arg(format!("--user-agent={DESKTOP_USER_AGENT}"))
        .args(LAUNCH_ARGS.iter().copied());

    builder = if config.headless() {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };
    if let Some(proxy) = config.egress_proxy() {
        info!("Routing browser traffic through egress proxy");
        builder = builder.arg(format!("--proxy-server={proxy}"));
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow!("Invalid browser configuration: {e}"))?;

    info!("Starting Chrome with profile {}", profile.display());
    let (browser, mut events) = Browser::launch(browser_config)
        .await
        .context("Chrome failed to start")?;

    let pump = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let Err(e) = event else { continue };
            let message = e.to_string();
            // CDP messages chromiumoxide has no type for
            if message.contains("did not match any variant of untagged enum Message")
                || message.contains("Failed to deserialize WS response")
            {
                trace!("Ignoring untyped CDP message: {}", message);
            } else {
                error!("CDP connection error: {:?}", e);
            }
        }
        debug!("CDP connection closed");
    });

    Ok((browser, pump, profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_executable_wins_when_present() {
        let current = std::env::current_exe().expect("current exe");
        let found = find_browser_executable(Some(&current)).expect("configured path");
        assert_eq!(found, current);
    }
}
