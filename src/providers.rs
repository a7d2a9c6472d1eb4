// Built-in provider catalog
// Turns (provider, test) pairs into ready-to-run endpoint descriptors.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::bench::endpoint::{AuthScheme, Authorizer, EndpointDescriptor};
use crate::error::Result;

/// Default wallet probed by balance and history tests
pub const DEFAULT_WALLET: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
/// Default token (WETH) probed by price tests
pub const DEFAULT_TOKEN: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

const CODEX_TOKEN_PRICE_QUERY: &str = "query TokenPrice($address: String!, $networkId: Int!) { \
getTokenPrices(inputs: [{ address: $address, networkId: $networkId }]) { address priceUsd timestamp } }";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// REST wallet/token API
    Moralis,
    /// REST blockchain-indexing API
    GoldRush,
    /// GraphQL pricing API
    Codex,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Moralis, Provider::GoldRush, Provider::Codex];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Moralis => "moralis",
            Provider::GoldRush => "goldrush",
            Provider::Codex => "codex",
        }
    }

    /// Environment variable holding this provider's credential
    pub fn credential_env(&self) -> &'static str {
        match self {
            Provider::Moralis => "MORALIS_API_KEY",
            Provider::GoldRush => "GOLDRUSH_API_KEY",
            Provider::Codex => "CODEX_API_KEY",
        }
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        match self {
            Provider::Moralis => AuthScheme::Header("X-API-Key".to_string()),
            Provider::GoldRush => AuthScheme::Bearer,
            Provider::Codex => AuthScheme::Raw,
        }
    }

    pub fn supports(&self, test: TestId) -> bool {
        match self {
            Provider::Moralis | Provider::GoldRush => true,
            Provider::Codex => test == TestId::TokenPrice,
        }
    }

    /// Base URL, or the mock server's route for this provider when `root` is set
    fn base_url(&self, root: Option<&str>) -> String {
        match (self, root) {
            (Provider::Moralis, None) => "https://deep-index.moralis.io/api/v2.2".to_string(),
            (Provider::GoldRush, None) => "https://api.covalenthq.com/v1".to_string(),
            (Provider::Codex, None) => "https://graph.codex.io/graphql".to_string(),
            (Provider::Codex, Some(root)) => format!("{}/graphql", root.trim_end_matches('/')),
            (provider, Some(root)) => format!("{}/{}", root.trim_end_matches('/'), provider.name()),
        }
    }

    /// Build the descriptor for `test`, or `None` if this provider lacks it
    pub fn endpoint(
        &self,
        test: TestId,
        addresses: &TestAddresses,
        credential: &str,
        root: Option<&str>,
    ) -> Result<Option<EndpointDescriptor>> {
        if !self.supports(test) {
            return Ok(None);
        }

        let auth = Authorizer::new(self.auth_scheme(), credential)?;
        let base = self.base_url(root);
        let wallet = &addresses.wallet;
        let token = &addresses.token;

        let endpoint = match (self, test) {
            (Provider::Moralis, TestId::NativeBalance) => EndpointDescriptor::rest(
                &format!("{}/{}/balance", base, wallet),
                [("chain", "eth")],
                auth,
            )?,
            (Provider::Moralis, TestId::TokenBalances) => EndpointDescriptor::rest(
                &format!("{}/{}/erc20", base, wallet),
                [("chain", "eth")],
                auth,
            )?,
            (Provider::Moralis, TestId::TokenPrice) => EndpointDescriptor::rest(
                &format!("{}/erc20/{}/price", base, token),
                [("chain", "eth")],
                auth,
            )?,
            (Provider::Moralis, TestId::WalletTransactions) => EndpointDescriptor::rest(
                &format!("{}/{}", base, wallet),
                [("chain", "eth"), ("limit", "25")],
                auth,
            )?,
            (Provider::GoldRush, TestId::NativeBalance) => EndpointDescriptor::rest(
                &format!("{}/eth-mainnet/address/{}/balances_native/", base, wallet),
                Vec::<(String, String)>::new(),
                auth,
            )?,
            (Provider::GoldRush, TestId::TokenBalances) => EndpointDescriptor::rest(
                &format!("{}/eth-mainnet/address/{}/balances_v2/", base, wallet),
                [("no-spam", "true")],
                auth,
            )?,
            (Provider::GoldRush, TestId::TokenPrice) => EndpointDescriptor::rest(
                &format!(
                    "{}/pricing/historical_by_addresses_v2/eth-mainnet/USD/{}/",
                    base, token
                ),
                Vec::<(String, String)>::new(),
                auth,
            )?,
            (Provider::GoldRush, TestId::WalletTransactions) => EndpointDescriptor::rest(
                &format!("{}/eth-mainnet/address/{}/transactions_v3/", base, wallet),
                Vec::<(String, String)>::new(),
                auth,
            )?,
            (Provider::Codex, _) => EndpointDescriptor::graphql(
                &base,
                CODEX_TOKEN_PRICE_QUERY,
                Some(serde_json::json!({ "address": token, "networkId": 1 })),
                auth,
            )?,
        };

        Ok(Some(endpoint))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "moralis" => Ok(Provider::Moralis),
            "goldrush" | "covalent" => Ok(Provider::GoldRush),
            "codex" => Ok(Provider::Codex),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Logical test shared across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestId {
    NativeBalance,
    TokenBalances,
    TokenPrice,
    WalletTransactions,
}

impl TestId {
    pub const ALL: [TestId; 4] = [
        TestId::NativeBalance,
        TestId::TokenBalances,
        TestId::TokenPrice,
        TestId::WalletTransactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestId::NativeBalance => "native_balance",
            TestId::TokenBalances => "token_balances",
            TestId::TokenPrice => "token_price",
            TestId::WalletTransactions => "wallet_transactions",
        }
    }
}

impl std::fmt::Display for TestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        TestId::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("Unknown test: {}", s))
    }
}

/// On-chain addresses the endpoints are built for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAddresses {
    pub wallet: String,
    pub token: String,
}

impl Default for TestAddresses {
    fn default() -> Self {
        Self {
            wallet: DEFAULT_WALLET.to_string(),
            token: DEFAULT_TOKEN.to_string(),
        }
    }
}

impl TestAddresses {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("wallet".to_string(), self.wallet.clone()),
            ("token".to_string(), self.token.clone()),
        ])
    }
}

/// One (provider, test) pair ready to run
#[derive(Debug, Clone)]
pub struct PlannedTest {
    pub provider: Provider,
    pub test: TestId,
    pub endpoint: EndpointDescriptor,
}

/// Build descriptors for every supported (provider, test) pair.
///
/// Ordered test-major so the same test runs back to back across providers.
/// Providers missing from `credentials` are skipped.
pub fn build_plan(
    providers: &[Provider],
    tests: &[TestId],
    addresses: &TestAddresses,
    credentials: &HashMap<Provider, String>,
    root: Option<&str>,
) -> Result<Vec<PlannedTest>> {
    let mut plan = Vec::new();
    for &test in tests {
        for &provider in providers {
            let Some(credential) = credentials.get(&provider) else {
                continue;
            };
            if let Some(endpoint) = provider.endpoint(test, addresses, credential, root)? {
                plan.push(PlannedTest {
                    provider,
                    test,
                    endpoint,
                });
            }
        }
    }
    Ok(plan)
}
