#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

use dashboard_coalesced::CoalescionServiceConfig;
use dashboard_config::Settings;

mod paged;
mod profile;
mod sequence;
mod transport;

#[cfg(test)]
mod test_fixtures;

pub use paged::{CollectionId, FilterSet, PagedResourceFetcher};
pub use profile::ProfileMedia;
pub use sequence::{SequenceGuard, SequenceToken};
pub use transport::{
    EntitlementPolicy, Method, Status, Transport, TransportRequest, TransportResponse,
};

/// Coalescer tuning shared by every service in this crate
pub fn coalescion_config(settings: &Settings) -> CoalescionServiceConfig {
    CoalescionServiceConfig {
        grace_window: settings.coalescer.grace_window(),
        max_concurrent: settings.coalescer.max_concurrent(),
    }
}
