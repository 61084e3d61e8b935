pub mod accounts;
pub mod domain;
pub mod feed;
pub mod library;
pub mod normalizer;
pub mod offers;
pub mod ports;
pub mod presenter;
pub mod resolver;
pub mod title;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use accounts::{AccountService, ProfileUpdate, Registration};
pub use domain::{
    DealRecord, DealsQuery, GameDetail, LibraryEntry, LibraryStatus, Listing, RawRecord,
    ResolvedPrice, SearchRecord, StoreOffer,
};
pub use feed::ListingFeed;
pub use library::{LibraryService, SaveOutcome, SaveRequest};
pub use normalizer::ListingNormalizer;
pub use ports::{DatabaseService, DealsService, PortError, PortResult, StorefrontService};
pub use resolver::PriceResolver;
