use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("peer transport port does not match the association peer port")]
    ErrPortMismatch,
    #[error("association must not have a port of 0")]
    ErrPortZero,
    #[error("association requires at least one inbound and one outbound stream")]
    ErrZeroStreams,
    #[error("peer address is outside the association scope")]
    ErrAddrOutOfScope,
    #[error("no transport registered for address")]
    ErrTransportNotFound,
    #[error("too many associations")]
    ErrTooManyAssociations,
    #[error("no association for handle")]
    ErrAssociationNotFound,
    #[error("association is marked dead")]
    ErrAssociationDead,
    #[error("chunk dispatch failed: {0}")]
    ErrDispatch(String),

    #[error("{0}")]
    Other(String),
}
