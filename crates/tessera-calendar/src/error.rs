//! Calendar service errors
use tessera_core::TesseraError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("CALENDAR/empty batch")]
    EmptyBatch,

    #[error("CALENDAR/aggregation tree too deep")]
    TreeTooDeep,

    #[error("CALENDAR/round {time} is not after latest round {latest}")]
    RoundOutOfOrder { time: u64, latest: u64 },

    #[error("CALENDAR/round {time} is not after publication {published}")]
    RoundAlreadyPublished { time: u64, published: u64 },

    #[error("CALENDAR/no round at {0}")]
    UnknownRound(u64),

    #[error("CALENDAR/no rounds at or before {0}")]
    NothingToPublish(u64),

    #[error("CALENDAR/publication time {publication_time} precedes round {aggregation_time}")]
    PublicationBeforeRound {
        aggregation_time: u64,
        publication_time: u64,
    },

    #[error("CALENDAR/state lock poisoned")]
    Poisoned,

    #[error("CALENDAR/{0}")]
    Core(#[from] TesseraError),
}
