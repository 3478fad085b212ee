use std::collections::HashSet;

use serde::Deserialize;

const ACCOUNT_API_BASE: &str = "https://mainnet-api.algonode.cloud/v2/accounts";

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    assets: Vec<AccountAsset>,
}

#[derive(Debug, Deserialize)]
struct AccountAsset {
    #[serde(rename = "asset-id")]
    asset_id: u64,
}

/// Fetch the asset identifiers held by an account. The caller treats a
/// failure as an empty set (highlight degrades to a clear), so the error is
/// only ever logged.
pub async fn fetch_account_assets(address: &str) -> Result<HashSet<u64>, String> {
    let url = format!("{ACCOUNT_API_BASE}/{address}");
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let account: AccountResponse = resp.json().await.map_err(|e| format!("parse error: {e}"))?;
    Ok(account.assets.into_iter().map(|a| a.asset_id).collect())
}
