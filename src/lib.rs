//! Privileged-access token broker for the HMRC OAuth API.
//!
//! The broker presents a TOTP-derived client credential to the token endpoint, caches the issued
//! token behind single-flight initialization, and keeps it valid with a background refresher.
//!
//! # Layout
//!
//! - [`otp`] derives the one-time password from the rotating shared secret.
//! - [`policy`] retries token endpoint calls per HTTP status class.
//! - [`refresh`] schedules and audits background refresh cycles.
//! - [`broker`] ties the collaborators in [`service`] together and owns the cached token.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod broker;
pub mod config;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod obs;
pub mod otp;
pub mod policy;
pub mod refresh;
pub mod service;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};

	/// Sleeps for `delay` unless `cancel` fires first; returns `false` when cancelled.
	pub(crate) async fn sleep_or_cancelled(cancel: &CancellationToken, delay: StdDuration) -> bool {
		if cancel.is_cancelled() {
			return false;
		}
		if delay.is_zero() {
			return true;
		}

		tokio::select! {
			_ = cancel.cancelled() => false,
			_ = tokio::time::sleep(delay) => true,
		}
	}
}

pub use broker::HmrcAuthTokenBroker;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
