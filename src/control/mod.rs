mod service;

pub use service::{ControlService, PerfumeChange, PowerChange, PERFUME_AMOUNT_RANGE};
pub(crate) use service::require_hash;
