pub mod cli;

pub const NAME: &str = "switchyard";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
