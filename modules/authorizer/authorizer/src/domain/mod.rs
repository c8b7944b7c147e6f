//! Domain layer for the authorizer.

pub mod key_set;
pub mod local_client;
pub mod policy;
pub mod region;
pub mod service;
pub mod session;
pub mod token_verifier;

pub use key_set::KeySetCache;
pub use local_client::AuthorizerLocalClient;
pub use policy::PolicySynthesizer;
pub use region::RegionTable;
pub use service::{Collaborators, Service};
pub use token_verifier::TokenVerifier;
