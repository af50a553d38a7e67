pub mod gateway;
pub mod postgres;

pub use gateway::{DatabaseError, Gateway, Row, SqlParam};
pub use postgres::PgGateway;
