use crate::unit::UnitId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UnitStoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitStoreError {
    #[error("Unit not found: {0}")]
    NotFound(UnitId),
}
