//! H2 driver.
//!
//! Only the dialect lives here. Connections go through
//! [`PgConnectionFactory`](crate::drivers::PgConnectionFactory) against an H2
//! server started with `-pg`.

mod dialect;

pub use dialect::H2Dialect;
