/// Controls how click events propagate and trigger default behaviors.
pub mod click_behavior;

/// Support for deferred rendering of overlay parts.
pub mod deferrable;
