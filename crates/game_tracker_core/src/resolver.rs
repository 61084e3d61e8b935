//! crates/game_tracker_core/src/resolver.rs
//!
//! Regional price lookup against the storefront catalog.
//!
//! A lookup never fails from the caller's point of view: network errors, parse
//! errors, a missing id and `success: false` all collapse into
//! [`ResolvedPrice::Unavailable`], and the caller keeps the aggregator's USD price.

use crate::domain::{AppPricing, ResolvedPrice};
use crate::ports::StorefrontService;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves storefront app ids into regional prices.
#[derive(Clone)]
pub struct PriceResolver {
    storefront: Arc<dyn StorefrontService>,
}

impl PriceResolver {
    pub fn new(storefront: Arc<dyn StorefrontService>) -> Self {
        Self { storefront }
    }

    /// Looks up the regional price for `app_id`. Issues exactly one request, no retries.
    pub async fn resolve(&self, app_id: &str) -> ResolvedPrice {
        match self.storefront.app_pricing(app_id).await {
            Ok(Some(pricing)) => price_from_pricing(&pricing),
            Ok(None) => {
                debug!(app_id, "No regional data for app");
                ResolvedPrice::Unavailable
            }
            Err(e) => {
                warn!(app_id, "Regional price lookup failed: {}", e);
                ResolvedPrice::Unavailable
            }
        }
    }
}

/// Free titles resolve to zero; otherwise the final price is converted from
/// minor to major units. A payload with neither is unavailable.
pub fn price_from_pricing(pricing: &AppPricing) -> ResolvedPrice {
    if pricing.is_free {
        return ResolvedPrice::Regional(0.0);
    }
    match pricing.final_minor {
        Some(minor) if minor >= 0 => ResolvedPrice::Regional(minor as f64 / 100.0),
        _ => ResolvedPrice::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStorefront, StorefrontReply};
    use std::sync::atomic::Ordering;

    fn resolver(storefront: FakeStorefront) -> PriceResolver {
        PriceResolver::new(Arc::new(storefront))
    }

    #[tokio::test]
    async fn free_title_resolves_to_exactly_zero() {
        let storefront = FakeStorefront::default().with(
            "10",
            StorefrontReply::Pricing(AppPricing { is_free: true, final_minor: Some(1999) }),
        );
        assert_eq!(resolver(storefront).resolve("10").await, ResolvedPrice::Regional(0.0));
    }

    #[tokio::test]
    async fn final_price_is_converted_to_major_units() {
        let storefront = FakeStorefront::default().with(
            "620",
            StorefrontReply::Pricing(AppPricing { is_free: false, final_minor: Some(3699) }),
        );
        assert_eq!(resolver(storefront).resolve("620").await, ResolvedPrice::Regional(36.99));
    }

    #[tokio::test]
    async fn missing_data_and_failures_are_unavailable() {
        let storefront = Arc::new(
            FakeStorefront::default()
                .with("1", StorefrontReply::NoData)
                .with("2", StorefrontReply::Fail)
                .with("3", StorefrontReply::Pricing(AppPricing::default())),
        );
        let resolver = PriceResolver::new(storefront.clone());

        assert_eq!(resolver.resolve("1").await, ResolvedPrice::Unavailable);
        assert_eq!(resolver.resolve("2").await, ResolvedPrice::Unavailable);
        // A failed lookup is not retried.
        assert_eq!(storefront.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.resolve("3").await, ResolvedPrice::Unavailable);
        // Ids the fake has never heard of behave like a missing key.
        assert_eq!(resolver.resolve("not-an-id").await, ResolvedPrice::Unavailable);
    }

    #[test]
    fn unavailable_is_distinct_from_free() {
        assert_eq!(ResolvedPrice::Regional(0.0).amount(), Some(0.0));
        assert_eq!(ResolvedPrice::Unavailable.amount(), None);
        assert_eq!(
            price_from_pricing(&AppPricing { is_free: false, final_minor: Some(-5) }),
            ResolvedPrice::Unavailable
        );
    }
}
