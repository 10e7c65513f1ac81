//! Source backends. Go is the only target: the emitted handlers build on
//! gorilla/mux and the JSON:API runtime packages of the configured module.

pub mod golang;
