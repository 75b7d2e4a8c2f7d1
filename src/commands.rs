pub mod bot;
pub mod inbox;
pub mod signup;
