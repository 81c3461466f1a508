use crate::{errors::CustomError, models::network_config::NetworkConfig};

/// Get network configuration based on chain ID
pub fn get_network_config(chain_id: u64) -> Result<NetworkConfig, CustomError> {
    match chain_id {
        43113 => Ok(NetworkConfig {
            chain_id: 43113,
            name: "Avalanche Fuji Testnet".to_string(),
            symbol: "AVAX".to_string(),
            block_explorer: "https://testnet.snowtrace.io".to_string(),
        }),
        43114 => Ok(NetworkConfig {
            chain_id: 43114,
            name: "Avalanche C-Chain".to_string(),
            symbol: "AVAX".to_string(),
            block_explorer: "https://snowtrace.io".to_string(),
        }),
        11155111 => Ok(NetworkConfig {
            chain_id: 11155111,
            name: "Sepolia Testnet".to_string(),
            symbol: "ETH".to_string(),
            block_explorer: "https://sepolia.etherscan.io".to_string(),
        }),
        // local hardhat / anvil
        31337 => Ok(NetworkConfig {
            chain_id: 31337,
            name: "Local Devnet".to_string(),
            symbol: "ETH".to_string(),
            block_explorer: "http://localhost".to_string(),
        }),
        _ => Err(CustomError::ConfigInvalid(format!(
            "Unsupported chain: {}",
            chain_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuji_is_default_network() {
        let network = get_network_config(43113).unwrap();
        assert_eq!(network.symbol, "AVAX");
    }

    #[test]
    fn test_unknown_chain() {
        assert!(matches!(
            get_network_config(999),
            Err(CustomError::ConfigInvalid(_))
        ));
    }
}
