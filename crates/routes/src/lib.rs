pub mod guard;
pub mod route;
pub mod synthesize;

pub use route::{Route, RouteMatch, RoutePhase, RouteTable};
pub use synthesize::synthesize;
