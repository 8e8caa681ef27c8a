//! Dispatcher configuration

/// What to do when no provider is registered for a tensor's device
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FallbackPolicy {
    /// Return the primary input (forward) or an empty list (backward)
    /// without running any kernel. A warning is logged.
    #[default]
    Passthrough,
    /// Fail with [`crate::error::Error::UnsupportedDevice`]
    Error,
}

/// Runtime settings for a [`super::Dispatcher`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchConfig {
    fallback: FallbackPolicy,
}

impl DispatchConfig {
    /// Default configuration: silent passthrough on unmatched devices
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unmatched-device policy
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Unmatched-device policy
    #[inline]
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }
}
