#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("node {id} has a non-finite or negative size")]
    NonFiniteSize { id: String },
    #[error("edge {v} -> {w} has a non-finite or negative weight")]
    InvalidWeight { v: String, w: String },
    #[error("graph option {name} must be finite and non-negative (got {value})")]
    InvalidSeparation { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
