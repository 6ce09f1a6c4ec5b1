//! Garment photo acquisition on a tokio runtime owned by the fetcher.
//! Remote URLs go through the image proxy first with one direct retry;
//! local paths and `file://` URLs are read from disk. Decoding and color
//! extraction run on the blocking pool, results are drained once per frame.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use bevy::prelude::*;
use mq_utils::{GarmentCategory, GarmentSlot};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::color::dominant_color;
use crate::wardrobe::Garment;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to start fetch runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid proxy endpoint {endpoint:?}: {reason}")]
    Proxy { endpoint: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode garment image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("fetch task failed: {0}")]
    Join(#[from] JoinError),
}

pub struct FetchRequest {
    pub slot: GarmentSlot,
    pub seq: u64,
    pub category: GarmentCategory,
    pub url: String,
}

#[derive(Debug)]
pub struct FetchResult {
    pub slot: GarmentSlot,
    pub seq: u64,
    pub url: String,
    pub outcome: Result<Garment, FetchError>,
}

#[derive(Resource)]
pub struct GarmentFetcher {
    runtime: Runtime,
    client: Client,
    proxy: Option<String>,
    result_tx: UnboundedSender<FetchResult>,
    result_rx: Mutex<UnboundedReceiver<FetchResult>>,
    in_flight: HashMap<GarmentSlot, JoinHandle<()>>,
}

impl GarmentFetcher {
    pub fn new(proxy: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("garment-fetch")
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        let (result_tx, result_rx) = unbounded_channel();
        Ok(Self {
            runtime,
            client,
            proxy: proxy.filter(|endpoint| !endpoint.trim().is_empty()),
            result_tx,
            result_rx: Mutex::new(result_rx),
            in_flight: HashMap::new(),
        })
    }

    /// Start fetching a garment. A request still running for the same slot
    /// is aborted.
    pub fn request(&mut self, request: FetchRequest) {
        self.cancel(request.slot);
        let slot = request.slot;
        let client = self.client.clone();
        let proxy = self.proxy.clone();
        let result_tx = self.result_tx.clone();
        debug!("fetching {slot} garment {} (request {})", request.url, request.seq);
        let handle = self.runtime.spawn(async move {
            let FetchRequest {
                slot,
                seq,
                category,
                url,
            } = request;
            let outcome = fetch_garment(&client, proxy.as_deref(), &url, category).await;
            let _ = result_tx.send(FetchResult {
                slot,
                seq,
                url,
                outcome,
            });
        });
        self.in_flight.insert(slot, handle);
    }

    pub fn cancel(&mut self, slot: GarmentSlot) {
        if let Some(previous) = self.in_flight.remove(&slot) {
            if !previous.is_finished() {
                debug!("aborting in-flight {slot} fetch");
            }
            previous.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for slot in GarmentSlot::ALL {
            self.cancel(slot);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.values().filter(|h| !h.is_finished()).count()
    }

    /// Completed fetches since the last call.
    pub fn drain(&mut self) -> Vec<FetchResult> {
        let mut results = Vec::new();
        if let Ok(mut rx) = self.result_rx.lock() {
            while let Ok(result) = rx.try_recv() {
                results.push(result);
            }
        }
        self.in_flight.retain(|_, handle| !handle.is_finished());
        results
    }
}

/// A local file behind `raw`, if it is a path or a `file://` URL.
pub fn local_path(raw: &str) -> Option<PathBuf> {
    if let Some(path) = raw.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if raw.contains("://") || raw.starts_with("data:") {
        return None;
    }
    Some(PathBuf::from(raw))
}

/// `{proxy}?url={url}`, with the garment URL percent-encoded.
pub fn proxied_url(endpoint: &str, url: &str) -> Result<Url, FetchError> {
    Url::parse_with_params(endpoint, &[("url", url)]).map_err(|err| FetchError::Proxy {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })
}

pub fn decode_garment(category: GarmentCategory, bytes: &[u8]) -> Result<Garment, FetchError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let color = dominant_color(&rgba);
    let (width, height) = rgba.dimensions();
    Ok(Garment {
        category,
        rgba: rgba.into_raw(),
        width,
        height,
        color,
    })
}

async fn fetch_garment(
    client: &Client,
    proxy: Option<&str>,
    url: &str,
    category: GarmentCategory,
) -> Result<Garment, FetchError> {
    let bytes = match local_path(url) {
        Some(path) => read_local(path).await?,
        None => download(client, proxy, url).await?,
    };
    tokio::task::spawn_blocking(move || decode_garment(category, &bytes)).await?
}

async fn read_local(path: PathBuf) -> Result<Vec<u8>, FetchError> {
    tokio::task::spawn_blocking(move || {
        std::fs::read(&path).map_err(|source| FetchError::Read { path, source })
    })
    .await?
}

async fn download(
    client: &Client,
    proxy: Option<&str>,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    if let Some(endpoint) = proxy {
        let attempt = match proxied_url(endpoint, url) {
            Ok(via_proxy) => get_bytes(client, via_proxy).await,
            Err(err) => Err(err),
        };
        match attempt {
            Ok(bytes) => return Ok(bytes),
            Err(err) => warn!("proxy fetch failed ({err}), retrying {url} directly"),
        }
    }
    let direct = Url::parse(url).map_err(|err| FetchError::Proxy {
        endpoint: url.to_string(),
        reason: err.to_string(),
    })?;
    let bytes = get_bytes(client, direct).await?;
    info!("fetched {url} directly ({} bytes)", bytes.len());
    Ok(bytes)
}

async fn get_bytes(client: &Client, url: Url) -> Result<Vec<u8>, FetchError> {
    let display = url.to_string();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Http {
            url: display.clone(),
            source,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: display,
            status,
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|source| FetchError::Http {
            url: display,
            source,
        })?;
    Ok(bytes.to_vec())
}
