//! apicontract-runner: async execution of contract scenarios
//!
//! Sends requests through a [`Transport`] (reqwest by default), drives each
//! scenario to an outcome and runs whole suites concurrently. Also ships the
//! built-in `mercado` suite and the fixture data generator it uses.

pub mod datagen;
pub mod mercado;
pub mod runner;
pub mod transport;

pub use datagen::{Faker, FieldKind};
pub use runner::{ScenarioRunner, SuiteRunner};
pub use transport::{HttpTransport, Transport, TransportError};
