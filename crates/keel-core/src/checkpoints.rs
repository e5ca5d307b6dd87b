//! Hard-coded checkpoint tables: (height, block hash) pairs asserted to be
//! part of the canonical chain.
//!
//! What makes a good checkpoint block?
//! + Is surrounded by blocks with reasonable timestamps
//!   (no blocks before with a timestamp after, none after with
//!    timestamp before)
//! + Contains no strange transactions
//!
//! The tables are compiled into the binary and immutable for the process
//! lifetime. Heights are strictly increasing and unique; both invariants
//! are pinned by tests below. Checkpoint *policy* (what gets accepted or
//! rejected against these tables) lives in keel-consensus.

use std::sync::LazyLock;

use crate::constants::NetworkType;
use crate::types::Hash256;

/// Sync-checkpoint span: how many blocks behind the best tip the
/// automatically selected reorg boundary sits.
pub const CHECKPOINT_SPAN: u64 = 5000;

/// Mainnet checkpoint data as hex literals, decoded once on first access.
const MAINNET_CHECKPOINT_HEX: &[(u64, &str)] = &[
    (0, "0000d9badf5d39afaa47451111a931672baaa3ce9bbbfb9165f414b9e6e69d61"),
    (1, "5eb206c544981db73e4d90c8d346f2be9a15ac51e6074eb432855b6497d26d74"),
    (2, "3a82bae794ef2c92369671112a3ac9cd8f22e0f1473b5b8fd8b4e4ac206b2694"),
    (3, "ebb84fa178eb8e46ca7b89efb3430b6ff56f0d19b51ef625e518912b941d6722"),
    (5, "612f7520718080a2d571138613b30535e6fb16b6b7fa43b1ede8ecd7e356a9e1"),
    (16, "33896e574a763ce525404378d6ddd1ee8aa45c8c20adb8ab657bf842d1bff805"),
    (25, "843e73753c99b0580343ea4c145a3f921664d3dc9ae2ca3f35fb5892027a914c"),
    (29, "d7bae3b07190b09f8dac77b16074b2623baf18e66549712df01cd0a4c1eec7b9"),
    (32, "ac93b8b08a07458aff6038dcc26aba4c6eec50eadc65edd217cb9872d2c5d48c"),
    (56, "056e3109775c6e176556de5c4a70529928c91260394e44d40b39cabda18e150d"),
    (95, "6c2bae321038a2abad5b6b6025375de3636b4293f479322cb848c9cb18c8c1b9"),
    (126, "95786cf07d9e9010c52aeebfb8e8985b434ca8cbea87df0a3c400937539be077"),
    (199, "b5f52495ae7a73c7c4b9efc156b92b305c65d7022952afc7ed0f62b885136e22"),
    (549, "1082b9f6ca3177077fbd5b814da50736ddcc5675fe7d0103deac57d1764f07e5"),
    (943, "6f6b67f3e91cf3a61598aec1eccb2769a6e374e6b8d492c4e09f12e41f7757aa"),
    (1353, "674fab53e704dbfce2bdb632f6750ed95b49e7d435cb6e140392e9fd292d901d"),
    (1987, "182f18b30b15deecbda1b5010be2cad52bca1542d13a1627f7a7bed495ad1005"),
    (2427, "26d0f0f2cb3432490012022c1d06f0c0b969b4be1d4f31d563e9dd935e6b49f4"),
    (3172, "ca4693e83fe29cb9cd0b39055ab0b3fc5e219925e27691c18c952cc9400d4f95"),
    (3767, "32894ac8ff07b945cbdb26b8f4110822d3b394e606adde0d4e0a481075c7a7e0"),
];

static MAINNET_CHECKPOINTS: LazyLock<Vec<(u64, Hash256)>> =
    LazyLock::new(|| decode_table(MAINNET_CHECKPOINT_HEX));

// Testnet has no checkpoints.
static TESTNET_CHECKPOINTS: LazyLock<Vec<(u64, Hash256)>> = LazyLock::new(Vec::new);

/// Decode a hex checkpoint table into (height, hash) pairs.
///
/// Hardcoded data — any decode failure is a build-time data-entry mistake,
/// so this panics rather than propagating an error.
fn decode_table(entries: &[(u64, &str)]) -> Vec<(u64, Hash256)> {
    entries
        .iter()
        .map(|&(height, hex_str)| {
            let bytes = hex::decode(hex_str).expect("hardcoded checkpoint hex is valid");
            let bytes: [u8; 32] = bytes
                .try_into()
                .expect("hardcoded checkpoint hash is 32 bytes");
            (height, Hash256(bytes))
        })
        .collect()
}

/// The active checkpoint table for the given network.
///
/// Entries are ordered by strictly increasing height. The testnet table is
/// empty, meaning no hardened checkpoints are enforced there.
pub fn checkpoint_table(network: NetworkType) -> &'static [(u64, Hash256)] {
    match network {
        NetworkType::Mainnet => MAINNET_CHECKPOINTS.as_slice(),
        NetworkType::Testnet => TESTNET_CHECKPOINTS.as_slice(),
    }
}
