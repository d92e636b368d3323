pub mod constraints;
pub mod domain;
pub mod ports;

pub use constraints::FieldViolation;
pub use domain::{Card, NewCard, NewUser, ObjectId, ProfileUpdate, User, UserCredentials};
pub use ports::{DatabaseService, PortError, PortResult};
