//! HTTP client construction for E-utilities requests.
//!
//! Timeouts, user-agent, and compression are fixed here so the search and
//! fetch calls share one policy.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

use super::TransportError;

/// Builds the client used for every E-utilities call.
///
/// `request_timeout` is the whole-request bound; page fetches additionally wrap
/// each attempt in their own timer.
///
/// # Errors
///
/// Returns [`TransportError::Client`] when client construction fails.
pub(crate) fn build_eutils_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, TransportError> {
    match try_build_client(connect_timeout, request_timeout, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; env proxies still apply on the fallback path.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(connect_timeout, request_timeout, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(TransportError::Client {
                    reason: "construction panicked while initializing networking".to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(TransportError::Client {
                    reason: error.to_string(),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(TransportError::Client {
            reason: error.to_string(),
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    connect_timeout: Duration,
    request_timeout: Duration,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(connect_timeout, request_timeout);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(connect_timeout: Duration, request_timeout: Duration) -> ClientBuilder {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .user_agent(user_agent::default_eutils_user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https") {
        if let Ok(resolved) = Proxy::https(&proxy) {
            builder = builder.proxy(resolved);
        }
    }
    if let Some(proxy) = env_proxy_for_scheme("http") {
        if let Ok(resolved) = Proxy::http(&proxy) {
            builder = builder.proxy(resolved);
        }
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
