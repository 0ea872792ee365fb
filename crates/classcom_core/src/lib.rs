pub mod domain;
pub mod ports;
pub mod query;
pub mod records;

pub use domain::{
    normalize_roll_number, Entity, Message, MessageKind, Meta, Presentation, PresentationStatus,
    Stored, Student, Subject,
};
pub use ports::{Document, DocumentStore, PortError, PortResult};
pub use query::{Filter, IndexSpec, Sort, SortDirection};
