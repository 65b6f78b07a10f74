use barbot_traits::RelayId;
use thiserror::Error;

/// Recipe or configuration problems detected before any relay is touched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown cocktail {0:?}")]
    UnknownCocktail(String),
    #[error("recipe {recipe:?} has no ingredients")]
    EmptyRecipe { recipe: String },
    #[error("ingredient {ingredient:?} uses motor {motor}, but only motors 1..={available} exist")]
    UnknownMotor {
        ingredient: String,
        motor: u32,
        available: usize,
    },
    #[error("ingredient {ingredient:?} has quantity {quantity} mL; it must be a finite value > 0")]
    NonPositiveQuantity { ingredient: String, quantity: f64 },
    #[error("ingredient {ingredient:?} needs a {seconds:.0} s pour; the limit is {limit_s} s")]
    PourTooLong {
        ingredient: String,
        seconds: f64,
        limit_s: u64,
    },
    #[error("motor {motor} is used more than once in recipe {recipe:?}")]
    DuplicateMotor { recipe: String, motor: u32 },
    #[error("flow rate must be a finite value > 0 mL/s, got {0}")]
    InvalidFlowRate(f64),
    #[error("motor map is empty")]
    NoMotors,
    #[error("relay {0} is mapped to more than one motor")]
    DuplicateRelay(RelayId),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispenseError {
    #[error("invalid recipe: {0}")]
    Validation(#[from] ValidationError),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing relay driver")]
    MissingDriver,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
