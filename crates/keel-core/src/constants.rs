//! Protocol constants and network selection.

/// Network type: Mainnet or Testnet.
///
/// Selects the active checkpoint table and per-network chain parameters.
/// Passed explicitly into any operation whose answer depends on the network
/// rather than read from process-global state.
///
/// # Examples
///
/// ```
/// use keel_core::constants::NetworkType;
/// let net = NetworkType::default();
/// assert_eq!(net, NetworkType::Mainnet);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetworkType {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network. Carries no hardened checkpoints.
    Testnet,
}

impl NetworkType {
    /// Subdirectory name appended to the base data directory path.
    pub fn data_dir_suffix(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}
