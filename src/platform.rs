//! Capabilities that the host provides to the tile map: network access, time
//! and memory.

use crate::config::MapProvider;
use anyhow::Context;
use log::debug;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest::Client;
use std::time::Instant;
use tokio::runtime::{Builder, Runtime};

/// Response to an HTTP request.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body of the response.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Checks whether the request was successful.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Host capabilities used by the fetch worker.
///
/// All calls happen on the worker thread, and may block it.
pub trait Platform: Send + Sync + 'static {
    /// Requests the given URL, blocking until the response is received or the
    /// request fails.
    fn get(&self, url: &str) -> anyhow::Result<HttpResponse>;

    /// Returns a monotonic timestamp, in milliseconds.
    fn now_millis(&self) -> u64;

    /// Allocates zeroed storage for the mosaic.
    fn allocate(&self, size: usize) -> Vec<u8> {
        vec![0; size]
    }
}

/// [`Platform`] running on top of the operating system, fetching tiles with
/// `reqwest`.
pub struct NativePlatform {
    /// Runtime driving the network client.
    runtime: Runtime,
    /// Network client.
    client: Client,
    /// Referer HTTP header to attach to each request.
    referer: Option<String>,
    /// User-agent HTTP header to attach to each request.
    user_agent: Option<String>,
    /// Origin of [`Platform::now_millis()`].
    start: Instant,
}

impl NativePlatform {
    /// Creates a platform fetching tiles from the given provider.
    pub fn new(map_provider: &MapProvider) -> anyhow::Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create the Tokio runtime")?;
        let client = Client::builder()
            .timeout(map_provider.timeout())
            .build()
            .context("Failed to create the HTTP client")?;
        Ok(Self {
            runtime,
            client,
            referer: map_provider.referer.clone(),
            user_agent: map_provider.user_agent.clone(),
            start: Instant::now(),
        })
    }

    /// Sends a GET request and collects the response.
    async fn get_async(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        if let Some(referer) = &self.referer {
            request = request.header(REFERER, referer);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read the response body from {url}"))?;
        debug!("GET {url} = {status}, {} bytes", body.len());

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl Platform for NativePlatform {
    fn get(&self, url: &str) -> anyhow::Result<HttpResponse> {
        self.runtime.block_on(self.get_async(url))
    }

    fn now_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
