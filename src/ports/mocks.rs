//! In-memory port implementations
//!
//! Stand-ins for the hosted backend, the staging API, the chain and the
//! NAV feed, so services can be exercised without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ethers::types::U256;
use serde_json::Value;
use tokio::sync::mpsc;

use super::backend::{BackendError, BackendPort, EntityKind, UploadedFile};
use super::balances::{BalanceError, BalancePort};
use super::price_feed::{FeedError, NavUpdate, PriceFeedPort};
use super::staging::{StageSwapRequest, StagedQuote, StagedSwap, StagingError, StagingPort, TransactionPlan};
use crate::domain::TokenInfo;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Backend fake that keeps entities in memory and records calls
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    user: Arc<Mutex<Option<Value>>>,
    entities: Arc<Mutex<HashMap<EntityKind, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<BackendError>>>,
    call_failures: Arc<Mutex<HashMap<String, BackendError>>>,
    next_id: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the logged-in user
    pub fn with_user(self, user: Value) -> Self {
        *lock(&self.user) = Some(user);
        self
    }

    /// Builder method to seed entity records
    pub fn with_records(self, entity: EntityKind, records: Vec<Value>) -> Self {
        lock(&self.entities).entry(entity).or_default().extend(records);
        self
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: BackendError) {
        *lock(&self.failure) = Some(error);
    }

    /// Make only calls named `call` (e.g. "auth.updateMe") fail with `error`
    pub fn fail_call(&self, call: &str, error: BackendError) {
        lock(&self.call_failures).insert(call.to_string(), error);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn records(&self, entity: EntityKind) -> Vec<Value> {
        lock(&self.entities).get(&entity).cloned().unwrap_or_default()
    }

    fn record_call(&self, call: String) -> Result<(), BackendError> {
        let targeted = lock(&self.call_failures).get(&call).cloned();
        lock(&self.calls).push(call);
        match targeted.or_else(|| lock(&self.failure).clone()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn matches_query(record: &Value, query: &Value) -> bool {
    match query.as_object() {
        Some(query) => query.iter().all(|(key, expected)| record.get(key) == Some(expected)),
        None => true,
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn apply_sort(records: &mut [Value], sort: Option<&str>) {
    let Some(sort) = sort else { return };
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };
    records.sort_by(|a, b| {
        let ordering = compare_field(a, b, field);
        if descending { ordering.reverse() } else { ordering }
    });
}

#[async_trait]
impl BackendPort for InMemoryBackend {
    async fn me(&self) -> Result<Value, BackendError> {
        self.record_call("auth.me".into())?;
        lock(&self.user).clone().ok_or(BackendError::NotAuthenticated)
    }

    async fn update_me(&self, patch: Value) -> Result<Value, BackendError> {
        self.record_call("auth.updateMe".into())?;
        let mut user = lock(&self.user);
        let current = user.as_mut().ok_or(BackendError::NotAuthenticated)?;
        merge(current, &patch);
        Ok(current.clone())
    }

    fn login_url(&self, return_to: Option<&str>) -> String {
        match return_to {
            Some(url) => format!("memory://login?from_url={}", url),
            None => "memory://login".to_string(),
        }
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.record_call("auth.logout".into())?;
        *lock(&self.user) = None;
        Ok(())
    }

    async fn list(&self, entity: EntityKind, sort: Option<&str>) -> Result<Vec<Value>, BackendError> {
        self.record_call(format!("{}.list", entity))?;
        let mut records = self.records(entity);
        apply_sort(&mut records, sort);
        Ok(records)
    }

    async fn filter(
        &self,
        entity: EntityKind,
        query: Value,
        sort: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, BackendError> {
        self.record_call(format!("{}.filter", entity))?;
        let mut records: Vec<Value> = self
            .records(entity)
            .into_iter()
            .filter(|r| matches_query(r, &query))
            .collect();
        apply_sort(&mut records, sort);
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn create(&self, entity: EntityKind, record: Value) -> Result<Value, BackendError> {
        self.record_call(format!("{}.create", entity))?;
        let mut object = match record {
            Value::Object(map) => map,
            other => return Err(BackendError::Decode(format!("expected an object, got {}", other))),
        };
        if !object.contains_key("id") {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            object.insert("id".into(), Value::String(format!("{}-{}", entity.as_str().to_lowercase(), n)));
        }
        object
            .entry("created_date")
            .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));

        let created = Value::Object(object);
        lock(&self.entities).entry(entity).or_default().push(created.clone());
        Ok(created)
    }

    async fn update(&self, entity: EntityKind, id: &str, patch: Value) -> Result<Value, BackendError> {
        self.record_call(format!("{}.update", entity))?;
        let mut entities = lock(&self.entities);
        let record = entities
            .get_mut(&entity)
            .and_then(|records| records.iter_mut().find(|r| r.get("id").and_then(Value::as_str) == Some(id)))
            .ok_or_else(|| BackendError::NotFound { entity, id: id.to_string() })?;
        merge(record, &patch);
        Ok(record.clone())
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile, BackendError> {
        self.record_call(format!("Core.UploadFile({}, {} bytes)", file_name, bytes.len()))?;
        Ok(UploadedFile {
            file_url: format!("memory://uploads/{}", file_name),
        })
    }
}

/// Balance fake keyed by token identifier; missing tokens fail
#[derive(Debug, Default, Clone)]
pub struct StaticBalances {
    balances: HashMap<String, U256>,
}

impl StaticBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, identifier: &str, units: U256) -> Self {
        self.balances.insert(identifier.to_string(), units);
        self
    }
}

#[async_trait]
impl BalancePort for StaticBalances {
    async fn balance_of(&self, token: &TokenInfo, _wallet: &str) -> Result<U256, BalanceError> {
        self.balances
            .get(&token.identifier)
            .copied()
            .ok_or_else(|| BalanceError::Rpc(format!("no balance for {}", token.identifier)))
    }
}

/// Staging fake that echoes the request into a plan and records it
#[derive(Debug, Clone)]
pub struct EchoStaging {
    contract_address: String,
    requests: Arc<Mutex<Vec<StageSwapRequest>>>,
    failure: Option<StagingError>,
}

impl EchoStaging {
    pub fn new(contract_address: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            requests: Arc::default(),
            failure: None,
        }
    }

    pub fn failing(error: StagingError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(String::new())
        }
    }

    pub fn get_requests(&self) -> Vec<StageSwapRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl StagingPort for EchoStaging {
    async fn stage_swap(&self, request: StageSwapRequest) -> Result<StagedSwap, StagingError> {
        lock(&self.requests).push(request.clone());
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(StagedSwap {
            transaction: TransactionPlan {
                contract_address: self.contract_address.clone(),
                method: "swap".to_string(),
                args: vec![
                    Value::String(request.from_token.clone()),
                    Value::String(request.to_token.clone()),
                    Value::String(request.amount.clone()),
                ],
            },
            quote: StagedQuote {
                amount_in: request.amount.clone(),
                amount_out: request.amount,
            },
        })
    }
}

/// Feed fake that replays a fixed list of updates for the requested SPVs
#[derive(Debug, Default, Clone)]
pub struct ScriptedFeed {
    updates: Vec<NavUpdate>,
}

impl ScriptedFeed {
    pub fn new(updates: Vec<NavUpdate>) -> Self {
        Self { updates }
    }
}

#[async_trait]
impl PriceFeedPort for ScriptedFeed {
    async fn subscribe(&self, spv_ids: Vec<String>) -> Result<mpsc::Receiver<NavUpdate>, FeedError> {
        if spv_ids.is_empty() {
            return Err(FeedError::Subscription("no SPVs requested".into()));
        }
        let (tx, rx) = mpsc::channel(self.updates.len().max(1));
        for update in self.updates.iter().filter(|u| spv_ids.contains(&u.spv_id)) {
            if tx.send(update.clone()).await.is_err() {
                break;
            }
        }
        Ok(rx)
    }
}
