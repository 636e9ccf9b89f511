pub mod builder;

pub use builder::{build, build_user_prompt};
