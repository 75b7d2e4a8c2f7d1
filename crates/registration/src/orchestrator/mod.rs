pub mod flow;
pub mod signup_engine;

pub use flow::{FlowOutcome, SignupFlow, UNAUTHORIZED_TEXT, USAGE_TEXT};
pub use signup_engine::SignupAutomator;
