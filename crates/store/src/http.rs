//! Client for the finance storage REST service.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use acqledger_core::{
    Budget, BudgetExpenseClass, ExpenseClass, Fund, GroupFundFiscalYear, Transaction,
    TransactionType,
};
use acqledger_shared::config::StorageConfig;
use acqledger_shared::types::{
    BudgetExpenseClassId, BudgetId, ExpenseClassId, FiscalYearId, FundId, TransactionId,
};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::query::Query;
use crate::storage::{FinanceStorage, StoreResult, by_fiscal_year};

/// Header carrying the tenant value.
pub const TENANT_HEADER: &str = "X-Okapi-Tenant";

/// Upper bound on records requested per collection read.
const READ_LIMIT: &str = "2147483647";

/// Storage backed by the finance storage REST service.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    base_url: Url,
    tenant: Option<String>,
    http: reqwest::Client,
}

impl HttpStorage {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &StorageConfig) -> StoreResult<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| StoreError::Unavailable(format!("invalid base_url: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()?;
        Ok(Self {
            base_url,
            tenant: config.tenant.clone(),
            http,
        })
    }

    fn url(&self, collection: Collection, id: Option<&str>) -> StoreResult<Url> {
        let path = match id {
            Some(id) => format!("{}/{id}", collection.path()),
            None => collection.path().to_string(),
        };
        self.base_url
            .join(&path)
            .map_err(|err| StoreError::Unavailable(format!("invalid url: {err}")))
    }

    fn with_tenant(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.tenant {
            Some(tenant) => request.header(TENANT_HEADER, tenant),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        id: &str,
    ) -> StoreResult<T> {
        let url = self.url(collection, Some(id))?;
        let response = self.with_tenant(self.http.get(url)).send().await?;
        let response = check(response, collection, id).await?;
        Ok(response.json::<T>().await?)
    }

    async fn search<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<T>> {
        let url = self.url(collection, None)?;
        let mut params = vec![("limit", READ_LIMIT.to_string())];
        if !query.is_empty() {
            params.push(("query", query.to_string()));
        }
        debug!(%collection, %query, "Querying storage");

        let response = self
            .with_tenant(self.http.get(url).query(&params))
            .send()
            .await?;
        let response = check(response, collection, "").await?;
        let mut page: Value = response.json().await?;
        let records = page
            .get_mut(collection.key())
            .map(Value::take)
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(records)?)
    }

    async fn post<T: Serialize + DeserializeOwned + Send + Sync>(
        &self,
        collection: Collection,
        record: &T,
    ) -> StoreResult<T> {
        let url = self.url(collection, None)?;
        let response = self
            .with_tenant(self.http.post(url).json(record))
            .send()
            .await?;
        let response = check(response, collection, "").await?;
        Ok(response.json::<T>().await?)
    }

    async fn put<T: Serialize + Sync>(
        &self,
        collection: Collection,
        id: &str,
        record: &T,
    ) -> StoreResult<()> {
        let url = self.url(collection, Some(id))?;
        let response = self
            .with_tenant(self.http.put(url).json(record))
            .send()
            .await?;
        check(response, collection, id).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let url = self.url(collection, Some(id))?;
        let response = self.with_tenant(self.http.delete(url)).send().await?;
        check(response, collection, id).await?;
        Ok(())
    }
}

/// Maps non-success statuses onto storage errors.
async fn check(response: Response, collection: Collection, id: &str) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::NOT_FOUND => Err(StoreError::not_found(collection, id)),
        StatusCode::CONFLICT => Err(StoreError::version_conflict(collection, id)),
        _ => {
            let url = response.url().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable body".to_string());
            Err(StoreError::Status {
                status: status.as_u16(),
                url,
                body,
            })
        }
    }
}

/// `(fromFundId==a or toFundId==a ...)` is outside the conjunctive grammar.
/// A single fund is read with one query per side; several funds fall back to
/// the fiscal year query and are filtered client-side.
fn fund_queries(
    fund_ids: &[FundId],
    fiscal_year_id: FiscalYearId,
    types: &[TransactionType],
) -> Vec<Query> {
    let base = match types {
        [single] => by_fiscal_year(fiscal_year_id).where_eq("transactionType", single),
        _ => by_fiscal_year(fiscal_year_id),
    };
    match fund_ids {
        [fund] => vec![
            Query::new().where_eq("fromFundId", fund).and(base.clone()),
            Query::new().where_eq("toFundId", fund).and(base),
        ],
        _ => vec![base],
    }
}

fn references_any(tx: &Transaction, fund_ids: &[FundId]) -> bool {
    fund_ids.iter().any(|fund| tx.touches(*fund))
}

#[async_trait]
impl FinanceStorage for HttpStorage {
    async fn get_transaction(&self, id: TransactionId) -> StoreResult<Transaction> {
        self.fetch(Collection::Transactions, &id.to_string()).await
    }

    async fn get_transactions_by_funds(
        &self,
        fund_ids: &[FundId],
        fiscal_year_id: FiscalYearId,
        types: &[TransactionType],
    ) -> StoreResult<Vec<Transaction>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = BTreeMap::new();
        for query in fund_queries(fund_ids, fiscal_year_id, types) {
            let page: Vec<Transaction> = self.search(Collection::Transactions, &query).await?;
            found.extend(page.into_iter().map(|tx| (tx.id, tx)));
        }
        Ok(found
            .into_values()
            .filter(|tx| types.is_empty() || types.contains(&tx.transaction_type))
            .filter(|tx| references_any(tx, fund_ids))
            .collect())
    }

    async fn query_transactions(&self, query: &Query) -> StoreResult<Vec<Transaction>> {
        self.search(Collection::Transactions, query).await
    }

    async fn create_transaction(&self, tx: &Transaction) -> StoreResult<Transaction> {
        self.post(Collection::Transactions, tx).await
    }

    async fn update_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.put(Collection::Transactions, &tx.id.to_string(), tx).await
    }

    async fn get_budget(&self, id: BudgetId) -> StoreResult<Budget> {
        self.fetch(Collection::Budgets, &id.to_string()).await
    }

    async fn query_budgets(&self, query: &Query) -> StoreResult<Vec<Budget>> {
        self.search(Collection::Budgets, query).await
    }

    async fn update_budget(&self, budget: &Budget) -> StoreResult<Budget> {
        let id = budget.id.to_string();
        self.put(Collection::Budgets, &id, budget).await?;
        self.fetch(Collection::Budgets, &id).await
    }

    async fn delete_budget(&self, id: BudgetId) -> StoreResult<()> {
        self.delete(Collection::Budgets, &id.to_string()).await
    }

    async fn get_fund(&self, id: FundId) -> StoreResult<Fund> {
        self.fetch(Collection::Funds, &id.to_string()).await
    }

    async fn query_group_fund_fiscal_years(
        &self,
        query: &Query,
    ) -> StoreResult<Vec<GroupFundFiscalYear>> {
        self.search(Collection::GroupFundFiscalYears, query).await
    }

    async fn get_expense_classes(&self, ids: &[ExpenseClassId]) -> StoreResult<Vec<ExpenseClass>> {
        let query = match ids {
            [] => return Ok(Vec::new()),
            [id] => Query::new().where_eq("id", id),
            _ => Query::new(),
        };
        let found: Vec<ExpenseClass> = self.search(Collection::ExpenseClasses, &query).await?;
        Ok(found.into_iter().filter(|c| ids.contains(&c.id)).collect())
    }

    async fn query_budget_expense_classes(
        &self,
        query: &Query,
    ) -> StoreResult<Vec<BudgetExpenseClass>> {
        self.search(Collection::BudgetExpenseClasses, query).await
    }

    async fn delete_budget_expense_class(&self, id: BudgetExpenseClassId) -> StoreResult<()> {
        self.delete(Collection::BudgetExpenseClasses, &id.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> StorageConfig {
        StorageConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            tenant: Some("diku".to_string()),
        }
    }

    #[test]
    fn test_urls_join_collection_paths() {
        let storage = HttpStorage::from_config(&config("http://localhost:9130/okapi")).unwrap();
        let url = storage.url(Collection::Budgets, Some("b-1")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9130/okapi/finance-storage/budgets/b-1"
        );
        let url = storage.url(Collection::GroupFundFiscalYears, None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9130/okapi/finance-storage/group-fund-fiscal-years"
        );
    }

    #[test]
    fn test_single_fund_reads_use_one_query_per_side() {
        let fund = FundId::new();
        let fy = FiscalYearId::new();
        let queries = fund_queries(&[fund], fy, &[TransactionType::Allocation]);

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].value_of("fromFundId"), Some(fund.to_string().as_str()));
        assert_eq!(queries[1].value_of("toFundId"), Some(fund.to_string().as_str()));
        for query in &queries {
            assert_eq!(query.value_of("fiscalYearId"), Some(fy.to_string().as_str()));
            assert_eq!(query.value_of("transactionType"), Some("ALLOCATION"));
        }
    }

    #[test]
    fn test_several_funds_read_the_fiscal_year() {
        let fy = FiscalYearId::new();
        let queries = fund_queries(&[FundId::new(), FundId::new()], fy, &[]);

        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].clauses().len(), 1);
        assert_eq!(queries[0].value_of("fiscalYearId"), Some(fy.to_string().as_str()));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpStorage::from_config(&config("not a url")),
            Err(StoreError::Unavailable(_))
        ));
    }
}
