pub mod application;
pub mod client;
pub mod config;
pub mod contract;
pub mod deployment;
pub mod fixtures;
pub mod network;
pub mod notify;
pub mod poller;
pub mod price;
pub mod router;
pub mod rpc;
pub mod session;
pub mod state;
pub mod ui;
pub mod wallet;

pub mod test_helpers;
