//! HTTP-level integration tests against a local mockito server.

mod facade;
mod mock_server;
mod transport;
