//! Batch fetches and date-range search over a photo library.
//!
//! A [`PhotoLibrary`] answers each image request with a stream of
//! [`ImageDelivery`] values. A request usually yields a quick degraded
//! placeholder first and the full-quality image later, and may yield an
//! error instead. The batch pipeline:
//!
//! 1. Requests every asset concurrently and collects each stream (bounded by
//!    a per-request timeout)
//! 2. Keeps one image per request id, preferring the full-quality delivery
//! 3. Downscales anything larger than the configured target size
//! 4. Tags each image with the asset's location and creation date
//!
//! Per-asset failures do not abort the batch; if some images survive, the
//! result is a partial success carrying the last error message.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures_util::future::{join_all, BoxFuture};
use futures_util::stream::{BoxStream, StreamExt};
use thiserror::Error;

use crate::config::LibraryConfig;
use crate::decode::{resize_to_fit, DecodedImage, FilterType};
use crate::metadata::{Coordinate, ImageWithMetadata, Metadata};

/// Errors from library-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("photo library access was not granted")]
    AccessDenied,

    #[error("no images were selected")]
    Cancelled,
}

/// What the user has allowed the app to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    Limited,
}

impl AuthorizationStatus {
    pub fn can_access_photos(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Limited
        )
    }
}

/// One entry in the library.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub location: Option<Coordinate>,
}

impl Asset {
    fn metadata(&self) -> Metadata {
        Metadata::new(self.location, self.creation_date)
    }
}

/// One answer to an image request.
#[derive(Debug, Clone)]
pub struct ImageDelivery {
    pub request_id: u64,
    /// A low-quality placeholder that a later delivery will replace.
    pub degraded: bool,
    pub result: Result<DecodedImage, String>,
}

/// Outcome of a batch pick.
#[derive(Debug, Clone, PartialEq)]
pub enum PickerResult {
    /// Fetching has started.
    Processing,
    Selection(Vec<ImageWithMetadata>),
    /// Some images failed; the rest are delivered with the last error.
    PartialSuccess(Vec<ImageWithMetadata>, String),
    Cancelled,
}

/// Access to the device photo library.
pub trait PhotoLibrary: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompt the user for access and resolve with their answer.
    fn request_authorization(&self) -> BoxFuture<'_, AuthorizationStatus>;

    /// Look up assets by id. Unknown ids are skipped.
    fn fetch_assets(&self, ids: &[String]) -> Vec<Asset>;

    /// Every asset in the library.
    fn all_assets(&self) -> Vec<Asset>;

    /// Request an image for `asset` sized for `target_width` x `target_height`.
    fn request_image(
        &self,
        asset: &Asset,
        target_width: u32,
        target_height: u32,
    ) -> BoxStream<'static, ImageDelivery>;
}

/// What one asset's request produced.
struct AssetFetch {
    metadata: Metadata,
    images: Vec<(u64, bool, DecodedImage)>,
    error: Option<String>,
}

/// Fetch, deduplicate and downscale `assets`.
///
/// Reports [`PickerResult::Processing`] through `on_result` before any work
/// starts, then returns the final result.
pub async fn process<L>(
    library: &L,
    assets: Vec<Asset>,
    config: &LibraryConfig,
    on_result: &mut dyn FnMut(&PickerResult),
) -> PickerResult
where
    L: PhotoLibrary + ?Sized,
{
    on_result(&PickerResult::Processing);

    if assets.is_empty() {
        log::info!("no assets to fetch");
        return PickerResult::Cancelled;
    }

    log::debug!("fetching {} assets", assets.len());
    let fetches = join_all(assets.iter().map(|asset| fetch_asset(library, asset, config))).await;

    let mut last_error = None;
    let mut order: Vec<u64> = Vec::new();
    let mut best: HashMap<u64, (bool, DecodedImage, Metadata)> = HashMap::new();

    for fetch in fetches {
        if let Some(error) = fetch.error {
            last_error = Some(error);
        }
        for (request_id, degraded, image) in fetch.images {
            let keep = match best.get(&request_id) {
                None => {
                    order.push(request_id);
                    true
                }
                // Full quality replaces a placeholder, never the other way
                Some((held_degraded, _, _)) => *held_degraded && !degraded,
            };
            if keep {
                best.insert(request_id, (degraded, image, fetch.metadata));
            }
        }
    }

    let images: Vec<ImageWithMetadata> = order
        .into_iter()
        .filter_map(|request_id| best.remove(&request_id))
        .map(|(_, image, metadata)| {
            ImageWithMetadata::new(downscale(image, config), metadata)
        })
        .collect();

    match last_error {
        // Each asset yields an image or an error; kept for exhaustiveness
        None if images.is_empty() => PickerResult::Cancelled,
        None => PickerResult::Selection(images),
        Some(error) => {
            log::warn!(
                "library fetch kept {} of {} images: {}",
                images.len(),
                assets.len(),
                error
            );
            PickerResult::PartialSuccess(images, error)
        }
    }
}

/// Fetch the assets with `ids`, limited to the configured selection size.
///
/// Reports [`PickerResult::Processing`] and then the final result through
/// `on_result`, and also returns the final result.
pub async fn pick<L>(
    library: &L,
    ids: &[String],
    config: &LibraryConfig,
    on_result: &mut dyn FnMut(&PickerResult),
) -> PickerResult
where
    L: PhotoLibrary + ?Sized,
{
    if !ensure_access(library).await {
        log::warn!("library pick without photo access");
        let result = PickerResult::Cancelled;
        on_result(&result);
        return result;
    }

    let ids = &ids[..ids.len().min(config.selection_limit)];
    let assets = library.fetch_assets(ids);
    let result = process(library, assets, config, on_result).await;
    on_result(&result);
    result
}

/// Fetch every asset created between `from` and `to`, inclusive.
///
/// Assets without a creation date never match. Partial failures still
/// return the images that were fetched.
pub async fn search<L>(
    library: &L,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    config: &LibraryConfig,
) -> Result<Vec<ImageWithMetadata>, LibraryError>
where
    L: PhotoLibrary + ?Sized,
{
    if !ensure_access(library).await {
        return Err(LibraryError::AccessDenied);
    }

    let assets: Vec<Asset> = library
        .all_assets()
        .into_iter()
        .filter(|asset| {
            asset
                .creation_date
                .is_some_and(|date| from <= date && date <= to)
        })
        .collect();
    log::debug!("{} assets between {} and {}", assets.len(), from, to);

    match process(library, assets, config, &mut |_| {}).await {
        PickerResult::Selection(images) | PickerResult::PartialSuccess(images, _) => Ok(images),
        PickerResult::Processing | PickerResult::Cancelled => Err(LibraryError::Cancelled),
    }
}

/// Check authorization, asking once if the user has not decided yet.
async fn ensure_access<L>(library: &L) -> bool
where
    L: PhotoLibrary + ?Sized,
{
    let mut status = library.authorization_status();
    if status == AuthorizationStatus::NotDetermined {
        status = library.request_authorization().await;
        log::info!("photo library authorization: {:?}", status);
    }
    status.can_access_photos()
}

async fn fetch_asset<L>(library: &L, asset: &Asset, config: &LibraryConfig) -> AssetFetch
where
    L: PhotoLibrary + ?Sized,
{
    let mut fetch = AssetFetch {
        metadata: asset.metadata(),
        images: Vec::new(),
        error: None,
    };
    let mut deliveries =
        library.request_image(asset, config.target_width, config.target_height);

    let collect = async {
        while let Some(delivery) = deliveries.next().await {
            match delivery.result {
                Ok(image) => fetch.images.push((delivery.request_id, delivery.degraded, image)),
                Err(error) => fetch.error = Some(error),
            }
        }
    };

    let timed_out = match config.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, collect).await.is_err(),
        None => {
            collect.await;
            false
        }
    };

    if timed_out {
        log::warn!("request for asset {} timed out", asset.id);
        if fetch.images.is_empty() {
            fetch.error = Some("request timed out".to_string());
        }
    } else if fetch.images.is_empty() && fetch.error.is_none() {
        fetch.error = Some(format!("no image delivered for asset {}", asset.id));
    }
    fetch
}

fn downscale(image: DecodedImage, config: &LibraryConfig) -> DecodedImage {
    match resize_to_fit(
        &image,
        config.target_width,
        config.target_height,
        FilterType::Bilinear,
    ) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("downscale failed ({}); keeping full size", err);
            image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures_util::future::FutureExt;
    use futures_util::stream;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeLibrary {
        status: Mutex<Option<AuthorizationStatus>>,
        grant: Option<AuthorizationStatus>,
        assets: Vec<Asset>,
        deliveries: HashMap<String, Vec<ImageDelivery>>,
        stalls: HashSet<String>,
    }

    impl FakeLibrary {
        fn authorized() -> Self {
            Self {
                status: Mutex::new(Some(AuthorizationStatus::Authorized)),
                ..Self::default()
            }
        }

        fn with_asset(mut self, asset: Asset, deliveries: Vec<ImageDelivery>) -> Self {
            self.deliveries.insert(asset.id.clone(), deliveries);
            self.assets.push(asset);
            self
        }
    }

    impl PhotoLibrary for FakeLibrary {
        fn authorization_status(&self) -> AuthorizationStatus {
            self.status
                .lock()
                .unwrap()
                .unwrap_or(AuthorizationStatus::NotDetermined)
        }

        fn request_authorization(&self) -> BoxFuture<'_, AuthorizationStatus> {
            let granted = self.grant.unwrap_or(AuthorizationStatus::Denied);
            *self.status.lock().unwrap() = Some(granted);
            futures_util::future::ready(granted).boxed()
        }

        fn fetch_assets(&self, ids: &[String]) -> Vec<Asset> {
            ids.iter()
                .filter_map(|id| self.assets.iter().find(|a| &a.id == id).cloned())
                .collect()
        }

        fn all_assets(&self) -> Vec<Asset> {
            self.assets.clone()
        }

        fn request_image(&self, asset: &Asset, _: u32, _: u32) -> BoxStream<'static, ImageDelivery> {
            let deliveries = self.deliveries.get(&asset.id).cloned().unwrap_or_default();
            let ready = stream::iter(deliveries);
            if self.stalls.contains(&asset.id) {
                ready.chain(stream::pending()).boxed()
            } else {
                ready.boxed()
            }
        }
    }

    fn asset(id: &str, day: u32) -> Asset {
        Asset {
            id: id.to_string(),
            creation_date: Some(Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()),
            location: Some(Coordinate::new(day as f64, -(day as f64))),
        }
    }

    fn ok(request_id: u64, degraded: bool, width: u32) -> ImageDelivery {
        ImageDelivery {
            request_id,
            degraded,
            result: Ok(DecodedImage::filled(width, 10, [1, 1, 1])),
        }
    }

    fn failed(request_id: u64, message: &str) -> ImageDelivery {
        ImageDelivery {
            request_id,
            degraded: false,
            result: Err(message.to_string()),
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> LibraryConfig {
        LibraryConfig::default()
    }

    #[tokio::test]
    async fn test_pick_reports_processing_then_selection() {
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![ok(1, false, 20)])
            .with_asset(asset("b", 2), vec![ok(2, false, 30)]);

        let mut seen = Vec::new();
        let result = pick(&library, &ids(&["a", "b"]), &config(), &mut |r| seen.push(r.clone())).await;

        assert_eq!(seen.first(), Some(&PickerResult::Processing));
        assert_eq!(seen.last(), Some(&result));
        let PickerResult::Selection(images) = result else {
            panic!("expected selection, got {result:?}");
        };
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image().width, 20);
        assert_eq!(images[0].metadata().location, Some(Coordinate::new(1.0, -1.0)));
        assert_eq!(images[1].image().width, 30);
    }

    #[tokio::test]
    async fn test_degraded_then_full_keeps_full() {
        // 3 assets, 2 of them deliver a placeholder before the real image
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![ok(1, true, 5), ok(1, false, 50)])
            .with_asset(asset("b", 2), vec![ok(2, false, 60)])
            .with_asset(asset("c", 3), vec![ok(3, true, 7), ok(3, false, 70)]);

        let result = pick(&library, &ids(&["a", "b", "c"]), &config(), &mut |_| {}).await;
        let PickerResult::Selection(images) = result else {
            panic!("expected selection");
        };
        let widths: Vec<u32> = images.iter().map(|i| i.image().width).collect();
        assert_eq!(widths, vec![50, 60, 70]);
    }

    #[tokio::test]
    async fn test_placeholder_does_not_replace_full_image() {
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![ok(1, false, 50), ok(1, true, 5)]);

        let result = pick(&library, &ids(&["a"]), &config(), &mut |_| {}).await;
        let PickerResult::Selection(images) = result else {
            panic!("expected selection");
        };
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image().width, 50);
    }

    #[tokio::test]
    async fn test_partial_success_keeps_last_error() {
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![ok(1, false, 20)])
            .with_asset(asset("b", 2), vec![failed(2, "first failure")])
            .with_asset(asset("c", 3), vec![failed(3, "second failure")]);

        let result = pick(&library, &ids(&["a", "b", "c"]), &config(), &mut |_| {}).await;
        let PickerResult::PartialSuccess(images, error) = result else {
            panic!("expected partial success");
        };
        assert_eq!(images.len(), 1);
        assert_eq!(error, "second failure");
    }

    #[tokio::test]
    async fn test_all_failed_is_partial_success() {
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![failed(1, "network unavailable")])
            .with_asset(asset("b", 2), vec![failed(2, "network unavailable")]);

        let result = pick(&library, &ids(&["a", "b"]), &config(), &mut |_| {}).await;
        assert_eq!(
            result,
            PickerResult::PartialSuccess(vec![], "network unavailable".to_string())
        );
    }

    #[tokio::test]
    async fn test_two_of_three_with_limit_three() {
        let config = LibraryConfig {
            selection_limit: 3,
            ..LibraryConfig::default()
        };
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![ok(1, false, 20)])
            .with_asset(asset("b", 2), vec![failed(2, "network unavailable")])
            .with_asset(asset("c", 3), vec![ok(3, false, 30)]);

        let mut seen = Vec::new();
        let result = pick(&library, &ids(&["a", "b", "c"]), &config, &mut |r| {
            seen.push(r.clone())
        })
        .await;

        let PickerResult::PartialSuccess(images, error) = &result else {
            panic!("expected partial success, got {result:?}");
        };
        assert_eq!(error, "network unavailable");
        let widths: Vec<u32> = images.iter().map(|i| i.image().width).collect();
        assert_eq!(widths, vec![20, 30]);
        assert_eq!(seen, vec![PickerResult::Processing, result.clone()]);
    }

    #[tokio::test]
    async fn test_empty_selection_is_cancelled() {
        let library = FakeLibrary::authorized();
        let mut seen = Vec::new();
        let result = pick(&library, &[], &config(), &mut |r| seen.push(r.clone())).await;
        assert_eq!(result, PickerResult::Cancelled);
        assert_eq!(seen, vec![PickerResult::Processing, PickerResult::Cancelled]);
    }

    #[tokio::test]
    async fn test_selection_limit_truncates() {
        let mut library = FakeLibrary::authorized();
        let mut names = Vec::new();
        for day in 1..=8 {
            let name = format!("asset-{day}");
            library = library.with_asset(asset(&name, day), vec![ok(day as u64, false, 10)]);
            names.push(name);
        }

        let result = pick(&library, &names, &config(), &mut |_| {}).await;
        let PickerResult::Selection(images) = result else {
            panic!("expected selection");
        };
        assert_eq!(images.len(), 5);
    }

    #[tokio::test]
    async fn test_large_images_are_downscaled() {
        let config = LibraryConfig {
            target_width: 100,
            target_height: 100,
            ..LibraryConfig::default()
        };
        let big = ImageDelivery {
            request_id: 1,
            degraded: false,
            result: Ok(DecodedImage::filled(400, 200, [9, 9, 9])),
        };
        let library = FakeLibrary::authorized().with_asset(asset("a", 1), vec![big]);

        let result = pick(&library, &ids(&["a"]), &config, &mut |_| {}).await;
        let PickerResult::Selection(images) = result else {
            panic!("expected selection");
        };
        assert_eq!((images[0].image().width, images[0].image().height), (100, 50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_request_keeps_best_so_far() {
        let mut library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![ok(1, true, 5)])
            .with_asset(asset("b", 2), vec![]);
        library.stalls.insert("a".to_string());
        library.stalls.insert("b".to_string());

        let config = LibraryConfig {
            request_timeout_ms: Some(50),
            ..LibraryConfig::default()
        };
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            pick(&library, &ids(&["a", "b"]), &config, &mut |_| {}),
        )
        .await
        .unwrap();

        let PickerResult::PartialSuccess(images, error) = result else {
            panic!("expected partial success, got {result:?}");
        };
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image().width, 5);
        assert_eq!(error, "request timed out");
    }

    #[tokio::test]
    async fn test_pick_requests_authorization_once() {
        let library = FakeLibrary {
            status: Mutex::new(None),
            grant: Some(AuthorizationStatus::Limited),
            ..FakeLibrary::default()
        }
        .with_asset(asset("a", 1), vec![ok(1, false, 10)]);

        let result = pick(&library, &ids(&["a"]), &config(), &mut |_| {}).await;
        assert!(matches!(result, PickerResult::Selection(_)));
        assert_eq!(library.authorization_status(), AuthorizationStatus::Limited);
    }

    #[tokio::test]
    async fn test_search_filters_by_inclusive_range() {
        let undated = Asset {
            id: "undated".to_string(),
            creation_date: None,
            location: None,
        };
        let library = FakeLibrary::authorized()
            .with_asset(asset("d1", 1), vec![ok(1, false, 11)])
            .with_asset(asset("d5", 5), vec![ok(5, false, 15)])
            .with_asset(asset("d9", 9), vec![ok(9, false, 19)])
            .with_asset(undated, vec![ok(99, false, 99)]);

        let from = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap();
        let images = search(&library, from, to, &config()).await.unwrap();

        let widths: Vec<u32> = images.iter().map(|i| i.image().width).collect();
        assert_eq!(widths, vec![11, 15]);
    }

    #[tokio::test]
    async fn test_search_denied() {
        let library = FakeLibrary {
            status: Mutex::new(Some(AuthorizationStatus::Denied)),
            ..FakeLibrary::default()
        };
        let now = Utc::now();
        assert_eq!(
            search(&library, now, now, &config()).await,
            Err(LibraryError::AccessDenied)
        );
    }

    #[tokio::test]
    async fn test_search_without_matches_is_cancelled() {
        let library = FakeLibrary::authorized().with_asset(asset("a", 1), vec![ok(1, false, 10)]);
        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(
            search(&library, from, to, &config()).await,
            Err(LibraryError::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_search_with_only_failures_is_empty() {
        let library = FakeLibrary::authorized()
            .with_asset(asset("a", 1), vec![failed(1, "network unavailable")]);
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        assert_eq!(search(&library, from, to, &config()).await, Ok(vec![]));
    }

    #[test]
    fn test_access_levels() {
        assert!(AuthorizationStatus::Authorized.can_access_photos());
        assert!(AuthorizationStatus::Limited.can_access_photos());
        assert!(!AuthorizationStatus::Denied.can_access_photos());
        assert!(!AuthorizationStatus::Restricted.can_access_photos());
        assert!(!AuthorizationStatus::NotDetermined.can_access_photos());
    }
}
