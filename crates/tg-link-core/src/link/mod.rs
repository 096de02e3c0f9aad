mod client;
mod outcome;

pub use client::{
    ClientError, LinkBackend, LinkRequest, SecureLinkClient, DEFAULT_TIMEOUT, LINK_PATH,
    SECRET_HEADER,
};
pub use outcome::{
    classify_status, LinkOutcome, OutcomeClass, OutcomeTag, DEFAULT_SERVER_ERROR,
    DEFAULT_SUCCESS_MESSAGE,
};
