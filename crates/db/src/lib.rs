pub mod connection;
pub mod query;

pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use query::{is_select_statement, is_single_statement, SqlGateway, SqlQueryGateway};
