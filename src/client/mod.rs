//! Clients for the source database and the search engine.
//!
//! [`PostgresClient`] reads the source table, [`ElasticsearchClient`] indexes
//! documents through the [`DocumentIndex`] trait, and [`Auth`] carries the
//! search engine credentials.

mod auth;
mod elasticsearch;
mod postgres;

pub use auth::Auth;
pub use elasticsearch::{DocumentIndex, ElasticsearchClient, IndexResponse};
pub use postgres::{PostgresClient, quote_identifier, select_all_sql};
