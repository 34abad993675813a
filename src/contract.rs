use crate::{
    rpc::RpcError,
    wallet::WalletProvider,
};
use sha3::{
    Digest,
    Keccak256,
};
use std::{
    fmt,
    str::FromStr,
};
use thiserror::Error;

pub const PRICE_ORACLE_FN: &str = "priceOracle()";
pub const LATEST_ETH_USDT_PRICE_FN: &str = "getLatestETHUSDTPrice()";

/// Functions of the lending platform that this client calls.
pub const PLATFORM_INTERFACE: ContractInterface = ContractInterface {
    name: "MicroLendingPlatform",
    functions: &[PRICE_ORACLE_FN],
};

pub const PRICE_ORACLE_INTERFACE: ContractInterface = ContractInterface {
    name: "PriceOracle",
    functions: &[LATEST_ETH_USDT_PRICE_FN],
};

const WORD: usize = 32;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("{interface} has no function {function}")]
    UnknownFunction {
        interface: &'static str,
        function: &'static str,
    },
    #[error("{0}")]
    Call(#[from] RpcError),
    #[error("cannot decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// `0x1234...abcd`
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| ContractError::InvalidAddress(s.to_string()))?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ContractError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractInterface {
    pub name: &'static str,
    pub functions: &'static [&'static str],
}

impl ContractInterface {
    /// Calldata for a function without arguments.
    pub fn encode_call(&self, function: &'static str) -> Result<Vec<u8>, ContractError> {
        if !self.functions.contains(&function) {
            return Err(ContractError::UnknownFunction {
                interface: self.name,
                function,
            });
        }
        Ok(selector(function).to_vec())
    }
}

/// An `eth_call` request as the wallet relays it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub from: Option<Address>,
    pub data: Vec<u8>,
}

impl CallRequest {
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).map(|s| [s[0], s[1], s[2], s[3]])
    }
}

fn first_word<'a>(data: &'a [u8], what: &'static str) -> Result<&'a [u8], ContractError> {
    data.get(..WORD).ok_or_else(|| ContractError::Decode {
        what,
        reason: format!("expected at least {WORD} bytes, got {}", data.len()),
    })
}

pub fn decode_address(data: &[u8]) -> Result<Address, ContractError> {
    let word = first_word(data, "address")?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode {
            what: "address",
            reason: "high bytes are not zero".to_string(),
        });
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address(bytes))
}

pub fn decode_u128(data: &[u8]) -> Result<u128, ContractError> {
    let word = first_word(data, "uint256")?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode {
            what: "uint256",
            reason: "value does not fit in 128 bits".to_string(),
        });
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(bytes))
}

pub fn encode_address_word(address: &Address) -> Vec<u8> {
    let mut word = vec![0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn encode_u128_word(value: u128) -> Vec<u8> {
    let mut word = vec![0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Handle on the lending platform, signed by the connected account.
#[derive(Clone, Debug)]
pub struct PlatformContract<W> {
    wallet: W,
    address: Address,
    sender: Address,
}

impl<W: WalletProvider> PlatformContract<W> {
    pub fn new(wallet: W, address: Address, sender: Address) -> Self {
        Self {
            wallet,
            address,
            sender,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn with_sender(&self, sender: Address) -> Self {
        Self {
            wallet: self.wallet.clone(),
            address: self.address,
            sender,
        }
    }

    pub async fn price_oracle(&self) -> Result<Address, ContractError> {
        let data = PLATFORM_INTERFACE.encode_call(PRICE_ORACLE_FN)?;
        let out = self
            .wallet
            .call(CallRequest {
                to: self.address,
                from: Some(self.sender),
                data,
            })
            .await?;
        decode_address(&out)
    }
}

/// Read-only handle on the oracle the platform points at.
#[derive(Clone, Debug)]
pub struct PriceOracle<W> {
    wallet: W,
    address: Address,
}

impl<W: WalletProvider> PriceOracle<W> {
    pub fn new(wallet: W, address: Address) -> Self {
        Self { wallet, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// ETH/USDT scaled by 10^8.
    pub async fn latest_eth_usdt_price(&self) -> Result<u128, ContractError> {
        let data = PRICE_ORACLE_INTERFACE.encode_call(LATEST_ETH_USDT_PRICE_FN)?;
        let out = self
            .wallet
            .call(CallRequest {
                to: self.address,
                from: None,
                data,
            })
            .await?;
        decode_u128(&out)
    }
}
