//! A2A adapter: JSON-RPC over HTTP with a Server-Sent Events reply stream.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod sse;

pub use error::A2aError;
pub use gateway::{A2aAgentGateway, AccessCredentials, agent_card_url};
