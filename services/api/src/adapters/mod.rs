pub mod cheapshark;
pub mod db;
pub mod steam;

pub use cheapshark::CheapSharkAdapter;
pub use db::DbAdapter;
pub use steam::SteamStoreAdapter;
