pub mod config;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod orders;

pub use delivery::{Clock, DeliveryTimeError, DeliveryWindow, FixedClock, SystemClock};
pub use domain::drink::DrinkType;
pub use errors::{ApplicationError, InterfaceError};
pub use orders::{OrderStore, PendingOrder};
