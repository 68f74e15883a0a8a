//! Paginated delegator-reward reports from the indexer API.

use crate::client::HttpClient;
use crate::RpcError;
use serde::Deserialize;

/// One delegator's gross reward share for a cycle.
#[derive(Clone, Debug, Deserialize)]
pub struct DelegatorShare {
    /// Delegator address
    pub address: String,
    /// Gross share in mutez, before operator fee
    pub amount: u64,
}

/// One page of the per-cycle reward report.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RewardsPage {
    /// Shares on this page
    #[serde(default)]
    pub delegators: Vec<DelegatorShare>,
    /// Whether another page follows
    #[serde(default)]
    pub has_more: bool,
}

/// Client for one indexer endpoint.
#[derive(Clone, Debug)]
pub struct IndexerClient {
    http: HttpClient,
}

impl IndexerClient {
    /// Bind to an indexer base URL.
    ///
    /// # Errors
    ///
    /// `Http` when the underlying client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    /// One page of `delegate`'s reward report for `cycle`.
    pub async fn rewards_page(
        &self,
        delegate: &str,
        cycle: i32,
        page: usize,
    ) -> Result<RewardsPage, RpcError> {
        self.http
            .get(
                &format!("/delegates/{}/rewards/{}", delegate, cycle),
                &[("page", page.to_string())],
            )
            .await
    }

    /// The full reward report for `cycle`, walking every page.
    pub async fn rewards_report(
        &self,
        delegate: &str,
        cycle: i32,
    ) -> Result<Vec<DelegatorShare>, RpcError> {
        let mut shares = Vec::new();
        let mut page = 0;
        loop {
            let result = self.rewards_page(delegate, cycle, page).await?;
            shares.extend(result.delegators);
            if !result.has_more {
                return Ok(shares);
            }
            page += 1;
        }
    }
}
