//! Configuration for segment execution.

use std::time::Duration;

use segrun_crypto::rsa::DEFAULT_BITS;

/// Configuration shared by every session an executor runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Node id given to new sessions until `init` changes it.
    pub node_id: String,

    /// Upper bound on a single transport call.
    pub transmit_timeout: Duration,

    /// Modulus size for `rsa_keygen`.
    pub rsa_bits: usize,

    /// Seed for new sessions' RNGs (None = OS entropy).
    pub seed: Option<u64>,

    /// Emit per-command start/end events.
    pub trace_commands: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_id: "0".to_string(),
            transmit_timeout: Duration::from_secs(5),
            rsa_bits: DEFAULT_BITS,
            seed: None,
            trace_commands: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for reproducible runs: fixed seed, short
    /// timeout, small RSA keys, command tracing on.
    #[must_use]
    pub fn deterministic(seed: u64) -> Self {
        Self {
            transmit_timeout: Duration::from_millis(500),
            rsa_bits: 1024,
            seed: Some(seed),
            trace_commands: true,
            ..Self::default()
        }
    }

    /// Builder method to set the node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = node_id.into();
        self
    }

    /// Builder method to set the transmit timeout.
    #[must_use]
    pub fn with_transmit_timeout(mut self, timeout: Duration) -> Self {
        self.transmit_timeout = timeout;
        self
    }

    /// Builder method to set the RSA modulus size.
    #[must_use]
    pub fn with_rsa_bits(mut self, bits: usize) -> Self {
        self.rsa_bits = bits;
        self
    }

    /// Builder method to set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method to enable/disable per-command events.
    #[must_use]
    pub fn with_trace_commands(mut self, trace: bool) -> Self {
        self.trace_commands = trace;
        self
    }
}
