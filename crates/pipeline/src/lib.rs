pub mod resolver;
pub mod service;

pub use resolver::{resolve_services, ResolutionResult, ResolverOptions};
pub use service::{BuilderConfig, BuilderInvocation, Service, RESERVED_PREFIX};
