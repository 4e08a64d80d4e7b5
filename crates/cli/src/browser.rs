//! Chromium executable discovery and launch settings.

use std::path::{Path, PathBuf};

use kotopdf::BrowserSettings;
use tracing::debug;

use crate::cli::BrowserArgs;

impl BrowserArgs {
	/// Launch settings, discovering an executable when none was given.
	pub fn settings(&self) -> BrowserSettings {
		let executable = self.chrome.clone().or_else(|| {
			let found = find_chromium_executable();
			match &found {
				Some(path) => debug!(target = "kotopdf", path = %path.display(), "found browser executable"),
				None => debug!(target = "kotopdf", "no browser on known paths, deferring to launcher detection"),
			}
			found
		});

		BrowserSettings {
			headless: self.headless,
			executable,
			user_data_dir: self.user_data_dir.clone(),
			profile_directory: self.profile_directory.clone(),
			no_sandbox: self.no_sandbox,
		}
	}
}

pub fn find_chromium_executable() -> Option<PathBuf> {
	let candidates = if cfg!(target_os = "macos") {
		macos_candidates()
	} else if cfg!(target_os = "windows") {
		windows_candidates()
	} else {
		linux_candidates()
	};

	candidates.into_iter().find_map(|candidate| resolve(&candidate))
}

fn resolve(candidate: &str) -> Option<PathBuf> {
	let is_path = candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':');
	if is_path {
		let path = Path::new(candidate);
		return path.exists().then(|| path.to_path_buf());
	}
	which::which(candidate).ok()
}

fn macos_candidates() -> Vec<String> {
	[
		"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
		"/Applications/Chromium.app/Contents/MacOS/Chromium",
		"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
		"/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}

fn linux_candidates() -> Vec<String> {
	[
		"google-chrome-stable",
		"google-chrome",
		"chromium",
		"chromium-browser",
		"brave-browser",
		"microsoft-edge",
		"/usr/bin/google-chrome-stable",
		"/usr/bin/chromium",
		"/usr/bin/chromium-browser",
		"/snap/bin/chromium",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}

fn windows_candidates() -> Vec<String> {
	let mut roots: Vec<PathBuf> = ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
		.into_iter()
		.filter_map(|key| std::env::var(key).ok())
		.map(PathBuf::from)
		.collect();
	if roots.is_empty() {
		roots.push(PathBuf::from(r"C:\Program Files"));
		roots.push(PathBuf::from(r"C:\Program Files (x86)"));
	}

	let suffixes: &[&[&str]] = &[
		&["Google", "Chrome", "Application", "chrome.exe"],
		&["Chromium", "Application", "chrome.exe"],
		&["Microsoft", "Edge", "Application", "msedge.exe"],
		&["BraveSoftware", "Brave-Browser", "Application", "brave.exe"],
	];

	let mut candidates: Vec<String> = roots
		.iter()
		.flat_map(|root| suffixes.iter().map(move |suffix| suffix.iter().fold(root.clone(), |path, part| path.join(part))))
		.map(|path| path.to_string_lossy().to_string())
		.collect();
	candidates.extend(["chrome.exe", "msedge.exe", "chromium.exe"].map(str::to_string));
	candidates
}
