pub mod html;
pub mod matcher;

pub use html::extract_confirmation_link;
pub use matcher::MessageMatcher;
