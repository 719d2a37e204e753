//! People and the registry that owns them.

pub mod person;
pub mod registry;

pub use person::{
    Action, Anomalies, AnomalyKind, INCIDENT_ONLY_ID, IncidentEntry, PersonRecord, RawEvent,
    RosterAttributes, Session, UNKNOWN_ID,
};
pub use registry::Registry;
