//! Test doubles and common utilities for the contract tests
//!
//! These doubles verify registry/reconciler/engine behavior without real
//! cluster or provider I/O: a channel-backed change sink, a stateful
//! in-memory DNS provider with call counters and failure switches, and a
//! controlled membership feed.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use nodedns_core::error::{Error, Result};
use nodedns_core::member::{AddressKind, RawAddress, RawMember, ReadyState};
use nodedns_core::projection::Projection;
use nodedns_core::traits::{
    ChangeSink, DnsProvider, MemberEvent, MembershipFeed, NewRecord, ProjectionChange,
    ProviderRecord, RecordPage,
};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// A change sink that records every delivered projection on a channel.
///
/// Sends are unbounded, so delivery never blocks; once a registry operation
/// returns, all of its notifications can be drained with
/// [`drain`](RecordingSink::drain).
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Projection>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Projection>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl ChangeSink for RecordingSink {
    async fn notify(&self, change: ProjectionChange) {
        let _ = self.tx.send(change.projection);
    }
}

/// Drains all currently queued projections from a recording sink receiver.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Projection>) -> Vec<Projection> {
    let mut got = Vec::new();
    while let Ok(projection) = rx.try_recv() {
        got.push(projection);
    }
    got
}

/// A change sink that never accepts delivery (for deadline tests).
pub struct BlockingSink;

#[async_trait]
impl ChangeSink for BlockingSink {
    async fn notify(&self, _change: ProjectionChange) {
        std::future::pending::<()>().await;
    }
}

/// A stateful in-memory DNS provider with call counters and failure
/// switches.
pub struct MockDnsProvider {
    records: std::sync::Mutex<Vec<MockRecord>>,
    next_id: AtomicU64,
    page_size: usize,
    /// Artificial latency before every call (for cancellation tests)
    delay: Option<Duration>,

    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,

    pub fail_creates: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_lists: AtomicBool,
    /// Violate the pagination contract by never marking a last page
    pub never_last_page: AtomicBool,
}

#[derive(Debug, Clone)]
struct MockRecord {
    id: u64,
    kind: String,
    name: String,
    data: String,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: std::sync::Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            page_size,
            delay: None,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_creates: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            never_last_page: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Pre-populate one record, returning its id.
    pub fn seed(&self, kind: &str, name: &str, data: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(MockRecord {
            id,
            kind: kind.to_string(),
            name: name.to_string(),
            data: data.to_string(),
        });
        id
    }

    /// Sorted address data of all records under `name`.
    pub fn addresses_for(&self, name: &str) -> Vec<String> {
        let mut addrs: Vec<String> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name)
            .map(|r| r.data.clone())
            .collect();
        addrs.sort();
        addrs
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _zone: &str, page: u32) -> Result<RecordPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(Error::http("induced list failure"));
        }

        let records = self.records.lock().unwrap();
        let pages = records.chunks(self.page_size).count().max(1);
        let chunk: Vec<ProviderRecord> = records
            .chunks(self.page_size)
            .nth(page as usize)
            .unwrap_or(&[])
            .iter()
            .map(|r| ProviderRecord {
                id: r.id,
                kind: r.kind.clone(),
                name: r.name.clone(),
                data: r.data.clone(),
            })
            .collect();

        let is_last_page =
            !self.never_last_page.load(Ordering::SeqCst) && page as usize + 1 >= pages;
        Ok(RecordPage {
            records: chunk,
            is_last_page,
        })
    }

    async fn create_record(&self, _zone: &str, new: &NewRecord) -> Result<u64> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Error::http("induced create failure"));
        }
        Ok(self.seed(new.kind.as_str(), &new.name, &new.data))
    }

    async fn delete_record(&self, _zone: &str, id: u64) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::http("induced delete failure"));
        }
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(Error::http(format!("no record with id {id}")));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A controlled membership feed that yields events sent by the test.
pub struct ControlledFeed {
    rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<MemberEvent>>>,
}

impl ControlledFeed {
    pub fn new() -> (Self, mpsc::UnboundedSender<MemberEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = Self {
            rx: std::sync::Mutex::new(Some(rx)),
        };
        (feed, tx)
    }
}

impl MembershipFeed for ControlledFeed {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = MemberEvent> + Send + 'static>> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

/// A ready, schedulable member with the given internal/external addresses.
pub fn raw_member(name: &str, internal: &[&str], external: &[&str]) -> RawMember {
    RawMember {
        name: name.to_string(),
        unschedulable: false,
        ready: ReadyState::True,
        addresses: internal
            .iter()
            .map(|a| RawAddress::new(AddressKind::Internal, *a))
            .chain(
                external
                    .iter()
                    .map(|a| RawAddress::new(AddressKind::External, *a)),
            )
            .collect(),
    }
}

/// Collects the kind and rendered addresses of each projection, in order.
pub fn summarize(projections: &[Projection]) -> Vec<(&'static str, Vec<String>)> {
    projections
        .iter()
        .map(|p| {
            (
                p.kind.as_str(),
                p.addresses.iter().map(|ip| ip.to_string()).collect(),
            )
        })
        .collect()
}
