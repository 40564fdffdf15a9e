//! Core business logic abstractions

pub mod config;
pub mod conversion;
pub mod currency;
pub mod format;
pub mod log;
pub mod price;
pub mod refresh;

// Re-export main types for cleaner imports
pub use conversion::{Converter, Event, Notice};
pub use currency::Currency;
pub use price::{PriceMap, PriceProvider};
pub use refresh::{RefreshOutcome, refresh_prices};
