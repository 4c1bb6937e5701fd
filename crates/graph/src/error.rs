use docctx_units::UnitId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unit not registered in graph: {0}")]
    UnknownUnit(UnitId),
}
