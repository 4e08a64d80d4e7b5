//! Page-ready detection for single-page-application chapter navigation.
//!
//! The reader's transport-level load says nothing about whether the in-app router has
//! reached the requested chapter, so readiness is decided in two bounded phases:
//!
//! 1. **Address match**: the main-frame address equals the target, either already
//!    (checked before any event) or on a navigation event.
//! 2. **Content marker**: the content root element exists in the DOM.
//!
//! After both phases a fixed settle delay lets fonts, images and reflow finish.

use std::time::Duration;

use futures::StreamExt;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::engine::{NavigationStream, PageDriver};
use crate::error::{BookError, Result};

/// Bounds for one readiness wait.
#[derive(Debug, Clone, Copy)]
pub struct ReadyWait {
	/// Used for both the transport load and the address-match race.
	pub navigation: Duration,
	pub content_marker: Duration,
	pub poll_interval: Duration,
	pub settle: Duration,
}

/// Navigates `page` to `target` and returns once the chapter content is rendered.
pub async fn navigate_and_wait<P>(page: &P, target: &str, selector: &str, wait: ReadyWait) -> Result<()>
where
	P: PageDriver + ?Sized,
{
	let navigations = begin_navigation(page, target, wait.navigation).await?;
	wait_until_ready(page, navigations, target, selector, wait).await
}

/// Subscribes to navigations, then navigates. Transport failures are logged, not returned.
///
/// The returned stream already holds any router events fired during the load.
pub async fn begin_navigation<P>(page: &P, target: &str, load_timeout: Duration) -> Result<NavigationStream>
where
	P: PageDriver + ?Sized,
{
	let navigations = page.frame_navigations().await?;

	info!(target = "kotopdf.ready", url = %target, "navigating");
	match page.goto(target, load_timeout).await {
		Ok(()) => {}
		Err(BookError::NavigationTimeout { waited_ms, .. }) => {
			warn!(target = "kotopdf.ready", url = %target, waited_ms, "load did not settle, continuing");
		}
		Err(err) => {
			warn!(target = "kotopdf.ready", url = %target, error = %err, "navigation reported an error, continuing");
		}
	}

	Ok(navigations)
}

/// Runs the address-match and content-marker phases, then the settle delay.
pub async fn wait_until_ready<P>(page: &P, navigations: NavigationStream, target: &str, selector: &str, wait: ReadyWait) -> Result<()>
where
	P: PageDriver + ?Sized,
{
	wait_for_address(page, navigations, target, wait.navigation).await?;
	wait_for_marker(page, selector, wait.content_marker, wait.poll_interval).await?;

	debug!(target = "kotopdf.ready", settle_ms = wait.settle.as_millis() as u64, "settling");
	sleep(wait.settle).await;
	Ok(())
}

/// Resolves once the main-frame address equals `target`.
///
/// An address that already matches resolves immediately without consuming any event.
pub async fn wait_for_address<P>(page: &P, mut navigations: NavigationStream, target: &str, limit: Duration) -> Result<()>
where
	P: PageDriver + ?Sized,
{
	if page.current_url().await?.as_deref() == Some(target) {
		debug!(target = "kotopdf.ready", url = %target, "address already matches");
		return Ok(());
	}

	let watch = async {
		while let Some(url) = navigations.next().await {
			if url == target {
				return true;
			}
			debug!(target = "kotopdf.ready", %url, "frame navigated");
		}
		false
	};

	let matched = match timeout(limit, watch).await {
		Ok(true) => true,
		// Event source closed; the address may still have been reached without an event.
		Ok(false) => page.current_url().await?.as_deref() == Some(target),
		Err(_) => false,
	};

	if !matched {
		return Err(BookError::AddressMatchTimeout {
			url: target.to_string(),
			waited_ms: limit.as_millis() as u64,
		});
	}

	debug!(target = "kotopdf.ready", url = %target, "address matched");
	Ok(())
}

/// Polls for `selector` until it exists or `limit` elapses.
pub async fn wait_for_marker<P>(page: &P, selector: &str, limit: Duration, poll_interval: Duration) -> Result<()>
where
	P: PageDriver + ?Sized,
{
	let script = selector_exists_script(selector);
	let deadline = Instant::now() + limit;

	loop {
		let present = match page.evaluate(&script).await {
			Ok(value) => value.as_bool().unwrap_or(false),
			Err(err) => {
				debug!(target = "kotopdf.ready", %selector, error = %err, "marker probe failed");
				false
			}
		};

		if present {
			debug!(target = "kotopdf.ready", %selector, "content marker present");
			return Ok(());
		}

		if Instant::now() + poll_interval > deadline {
			return Err(BookError::ContentMarkerTimeout {
				selector: selector.to_string(),
				waited_ms: limit.as_millis() as u64,
			});
		}
		sleep(poll_interval).await;
	}
}

pub(crate) fn selector_exists_script(selector: &str) -> String {
	// JSON string literals are valid JS string literals.
	let quoted = serde_json::Value::String(selector.to_string()).to_string();
	format!("document.querySelector({quoted}) !== null")
}
