use freight_broker::accounts::AccountService;
use freight_broker::brokerage::{BrokerageService, TextDocumentRenderer};
use freight_broker::store::InMemoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const LETTERHEAD: &str = "EverFlown Logistics";

pub(crate) type Brokerage = BrokerageService<InMemoryStore, TextDocumentRenderer>;
pub(crate) type Accounts = AccountService<InMemoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services sharing one store handle.
pub(crate) struct Services {
    pub(crate) brokerage: Arc<Brokerage>,
    pub(crate) accounts: Arc<Accounts>,
}

impl Services {
    pub(crate) fn over(store: Arc<InMemoryStore>) -> Self {
        let renderer = Arc::new(TextDocumentRenderer::new(LETTERHEAD));
        Self {
            brokerage: Arc::new(BrokerageService::new(store.clone(), renderer)),
            accounts: Arc::new(AccountService::new(store)),
        }
    }
}
