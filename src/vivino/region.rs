//! Ship-to region negotiation run once before a crawl.

use crate::vivino::driver::PageDriver;
use crate::vivino::models::{CrawlStatus, RegionSelector};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons the session could not be moved to the requested region.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("ship-to region change to {0} was not accepted")]
    ChangeRejected(RegionSelector),

    #[error("ship-to region change to {0} could not be confirmed after reload")]
    ChangeUnconfirmed(RegionSelector),

    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

impl RegionError {
    /// Terminal crawl status this failure maps to.
    pub fn status(&self) -> CrawlStatus {
        match self {
            RegionError::ChangeRejected(_) => CrawlStatus::ShipToError,
            RegionError::ChangeUnconfirmed(_) => CrawlStatus::ShipToConfirmError,
            RegionError::Driver(_) => CrawlStatus::Exception,
        }
    }
}

/// Makes sure the session ships to `selector` before any page is crawled.
///
/// A session already in the right region is left untouched. Otherwise one
/// change request is made, followed by one reload to confirm it. There is no
/// retry.
pub async fn ensure_region(
    driver: &mut impl PageDriver,
    selector: &RegionSelector,
) -> Result<(), RegionError> {
    if driver.is_active_region(selector).await? {
        debug!("Session already ships to {}", selector);
        return Ok(());
    }

    if !driver.request_region_change(selector).await? {
        warn!("Ship-to region was not changed to {}", selector);
        return Err(RegionError::ChangeRejected(selector.clone()));
    }

    driver.reload().await?;

    if !driver.is_active_region(selector).await? {
        warn!("Ship-to change to {} can not be confirmed", selector);
        return Err(RegionError::ChangeUnconfirmed(selector.clone()));
    }

    info!("Ship-to region set to {}", selector);
    Ok(())
}
