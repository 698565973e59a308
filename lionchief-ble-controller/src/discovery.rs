//! Finding trains in the advertisement stream
//!
//! A scan is sampled once per pass. The first pass that shows at least one
//! device advertising [`SERVICE_UUID`](crate::SERVICE_UUID) ends the scan and
//! all of that pass's trains are returned, in the order they were seen.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::transport::{DeviceHandle, Transport, TransportError};
use crate::SERVICE_UUID;

/// How long to keep sampling when no train is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Give up after this many samples
    Bounded { max_passes: u32 },
    /// Sample until a train shows up or the scan is cancelled
    Unbounded,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("scan failed: {0}")]
    Scan(#[source] TransportError),
    #[error("scan cancelled")]
    Cancelled,
}

/// Scan until the policy is satisfied.
///
/// An empty result means the bounded scan ran out of passes.
pub async fn discover<T: Transport>(
    transport: &T,
    interval: Duration,
    policy: RetryPolicy,
) -> Result<Vec<DeviceHandle>, DiscoveryError> {
    discover_until(transport, interval, policy, std::future::pending()).await
}

/// Like [`discover`], returning only the first train
pub async fn discover_one<T: Transport>(
    transport: &T,
    interval: Duration,
    policy: RetryPolicy,
) -> Result<Option<DeviceHandle>, DiscoveryError> {
    Ok(discover(transport, interval, policy).await?.into_iter().next())
}

/// [`discover`] that stops with [`DiscoveryError::Cancelled`] once `cancel`
/// completes. The scan is stopped on every way out.
pub async fn discover_until<T, C>(
    transport: &T,
    interval: Duration,
    policy: RetryPolicy,
    cancel: C,
) -> Result<Vec<DeviceHandle>, DiscoveryError>
where
    T: Transport,
    C: Future<Output = ()>,
{
    transport.start_scan().await.map_err(DiscoveryError::Scan)?;
    log::debug!("scan started ({policy:?})");

    let result = scan_passes(transport, interval, policy, cancel).await;

    if let Err(e) = transport.stop_scan().await {
        log::warn!("failed to stop scan: {e}");
    }

    result
}

async fn scan_passes<T, C>(
    transport: &T,
    interval: Duration,
    policy: RetryPolicy,
    cancel: C,
) -> Result<Vec<DeviceHandle>, DiscoveryError>
where
    T: Transport,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let mut passes = 0u32;

    loop {
        if let RetryPolicy::Bounded { max_passes } = policy {
            if passes >= max_passes {
                log::warn!("no train found after {passes} scan passes");
                return Ok(Vec::new());
            }
        }

        let sample = tokio::select! {
            _ = &mut cancel => return Err(DiscoveryError::Cancelled),
            sample = transport.advertisements() => sample.map_err(DiscoveryError::Scan)?,
        };
        passes += 1;

        let mut seen = HashSet::new();
        let trains: Vec<DeviceHandle> = sample
            .into_iter()
            .filter(|adv| adv.advertises(&SERVICE_UUID))
            .filter(|adv| seen.insert(adv.address.clone()))
            .map(DeviceHandle::from)
            .collect();

        if !trains.is_empty() {
            for train in &trains {
                log::info!("train discovered: {train}");
            }
            return Ok(trains);
        }

        match policy {
            // out of passes, no point waiting
            RetryPolicy::Bounded { max_passes } if passes >= max_passes => continue,
            RetryPolicy::Bounded { .. } => {
                log::warn!("no train found, retrying in {interval:?}");
            }
            RetryPolicy::Unbounded => {
                log::info!("no train found, scanning again in {interval:?}");
            }
        }

        tokio::select! {
            _ = &mut cancel => return Err(DiscoveryError::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{advert, train, MockTransport};

    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn finds_train_on_third_pass() {
        let transport = MockTransport::new();
        transport.push_pass(vec![]);
        transport.push_pass(vec![advert("11:11:11:11:11:11", vec![])]);
        transport.push_pass(vec![train("AA:AA:AA:AA:AA:01"), train("AA:AA:AA:AA:AA:02")]);
        transport.push_pass(vec![train("AA:AA:AA:AA:AA:03")]);

        let start = tokio::time::Instant::now();
        let found = discover(&transport, INTERVAL, RetryPolicy::Unbounded).await.unwrap();

        let addresses: Vec<_> = found.iter().map(|d| d.address.as_str()).collect();
        assert_eq!(addresses, ["AA:AA:AA:AA:AA:01", "AA:AA:AA:AA:AA:02"]);
        assert_eq!(transport.samples(), 3);
        assert_eq!(start.elapsed(), INTERVAL * 2);
        assert_eq!(transport.scans_started(), 1);
        assert_eq!(transport.scans_stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_scan_gives_up() {
        let transport = MockTransport::new();
        transport.push_pass(vec![advert("11:11:11:11:11:11", vec![])]);

        let start = tokio::time::Instant::now();
        let found = discover(&transport, INTERVAL, RetryPolicy::Bounded { max_passes: 4 })
            .await
            .unwrap();

        assert!(found.is_empty());
        assert_eq!(transport.samples(), 4);
        assert_eq!(start.elapsed(), INTERVAL * 3);
        assert_eq!(transport.scans_stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_bounded_pass_does_not_wait() {
        let transport = MockTransport::new();

        let start = tokio::time::Instant::now();
        let found = discover_one(&transport, INTERVAL, RetryPolicy::Bounded { max_passes: 1 })
            .await
            .unwrap();

        assert_eq!(found, None);
        assert_eq!(transport.samples(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_passes_never_samples() {
        let transport = MockTransport::new();
        transport.push_pass(vec![train("AA:AA:AA:AA:AA:01")]);

        let found = discover(&transport, INTERVAL, RetryPolicy::Bounded { max_passes: 0 })
            .await
            .unwrap();

        assert!(found.is_empty());
        assert_eq!(transport.samples(), 0);
        assert_eq!(transport.scans_stopped(), transport.scans_started());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_in_a_pass_collapse() {
        let transport = MockTransport::new();
        transport.push_pass(vec![
            train("AA:AA:AA:AA:AA:01"),
            advert("11:11:11:11:11:11", vec![]),
            train("AA:AA:AA:AA:AA:02"),
            train("AA:AA:AA:AA:AA:01"),
        ]);

        let found = discover(&transport, INTERVAL, RetryPolicy::Unbounded).await.unwrap();
        let addresses: Vec<_> = found.iter().map(|d| d.address.as_str()).collect();
        assert_eq!(addresses, ["AA:AA:AA:AA:AA:01", "AA:AA:AA:AA:AA:02"]);
    }

    #[tokio::test(start_paused = true)]
    async fn other_services_are_ignored() {
        let other = uuid::Uuid::from_u128(0xe20a39f4_73f5_4bc4_a12f_17d1ad07a962);
        let transport = MockTransport::new();
        transport.push_pass(vec![advert("22:22:22:22:22:22", vec![other])]);

        let found = discover(&transport, INTERVAL, RetryPolicy::Bounded { max_passes: 1 })
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn discover_one_keeps_manufacturer_data() {
        let mut adv = train("AA:AA:AA:AA:AA:01");
        adv.manufacturer_data.insert(0x0499, vec![1, 2, 3]);
        let transport = MockTransport::new();
        transport.push_pass(vec![adv, train("AA:AA:AA:AA:AA:02")]);

        let found = discover_one(&transport, INTERVAL, RetryPolicy::Unbounded)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.address, "AA:AA:AA:AA:AA:01");
        assert_eq!(found.manufacturer_data.get(&0x0499), Some(&vec![1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn start_failure_is_a_scan_error() {
        let transport = MockTransport::new();
        transport.fail_start_scan();

        let result = discover(&transport, INTERVAL, RetryPolicy::Unbounded).await;
        assert!(matches!(result, Err(DiscoveryError::Scan(_))));
        assert_eq!(transport.samples(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sample_failure_stops_scan() {
        let transport = MockTransport::new();
        transport.push_pass(vec![]);
        transport.push_failed_pass();

        let result = discover(&transport, INTERVAL, RetryPolicy::Unbounded).await;
        assert!(matches!(result, Err(DiscoveryError::Scan(TransportError::LinkLost))));
        assert_eq!(transport.samples(), 2);
        assert_eq!(transport.scans_stopped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait() {
        let transport = MockTransport::new();

        let cancel = tokio::time::sleep(Duration::from_secs(12));
        let result = discover_until(&transport, INTERVAL, RetryPolicy::Unbounded, cancel).await;

        assert!(matches!(result, Err(DiscoveryError::Cancelled)));
        // samples at 0s, 5s and 10s, cancelled while waiting for 15s
        assert_eq!(transport.samples(), 3);
        assert_eq!(transport.scans_stopped(), 1);
    }
}
