mod composer;

pub use composer::{compose_impact_message, DEFAULT_IMPACT_MESSAGE};
