//! Reference field operations: [`Sma`] and [`ZScore`].

mod sma;
mod zscore;

pub use sma::Sma;
pub use zscore::ZScore;
