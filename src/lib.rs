//! NFT gateway library: asset NFT class issuance, minting and data updates
//! over a Cosmos SDK ledger, exposed as a small HTTP API.

pub mod config;
pub mod http;
pub mod ledger;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use ledger::LedgerHandle;
pub use lifecycle::Shutdown;
