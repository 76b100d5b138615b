use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::{Transport, TransportRequest, TransportResponse};

type Responder = Box<dyn Fn(&TransportRequest) -> (Duration, TransportResponse) + Send + Sync>;

/// Scripted transport that records every call it receives
pub struct FakeTransport {
    responder: Responder,
    calls: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&TransportRequest) -> (Duration, TransportResponse) + Send + Sync + 'static,
    ) -> Self {
        FakeTransport {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `response` after `delay`
    pub fn fixed(delay: Duration, response: TransportResponse) -> Self {
        Self::new(move |_| (delay, response.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn call(&self, request: TransportRequest) -> TransportResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, response) = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);

        tokio::time::sleep(delay).await;
        response
    }
}
