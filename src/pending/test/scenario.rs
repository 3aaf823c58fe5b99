use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::message::{Headers, Message, SoapVersion};
use crate::pending::{CallConfig, PendingCall};
use crate::reader::{EnvelopeReader, MessageReader};
use crate::transport::{Exchange, TransportError};
use crate::Error;

/// What happened to a `MockExchange`, shared with the test.
#[derive(Default)]
pub struct Tracker {
    pub events: RefCell<Vec<&'static str>>,
    pub reads: Cell<usize>,
    pub decodes: Cell<usize>,
}

impl Tracker {
    pub fn count(&self, event: &str) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }
}

pub struct MockExchange {
    pub finished: Option<bool>,
    pub open: bool,
    pub body: Vec<u8>,
    pub error: Option<TransportError>,
    bound: bool,
    tracker: Rc<Tracker>,
}

impl MockExchange {
    /// Complete the exchange, notifying completion like a transport would.
    pub fn complete(&mut self) {
        self.finished = Some(true);
        if self.bound {
            self.tracker.events.borrow_mut().push("notify");
        }
    }
}

impl Exchange for MockExchange {
    fn is_finished(&self) -> Option<bool> {
        self.finished
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_all(&mut self) -> Vec<u8> {
        self.tracker.reads.set(self.tracker.reads.get() + 1);
        std::mem::take(&mut self.body)
    }

    fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    fn unbind_completion(&mut self) {
        self.bound = false;
        self.tracker.events.borrow_mut().push("unbind");
    }

    fn abort(&mut self) {
        self.tracker.events.borrow_mut().push("abort");
        self.open = false;
        if self.finished != Some(true) {
            self.complete();
        }
    }
}

/// Envelope reader counting how often it is asked to decode.
pub struct CountingReader(Rc<Tracker>);

impl MessageReader for CountingReader {
    fn decode(&self, input: &[u8], version: SoapVersion) -> Result<(Message, Headers), Error> {
        self.0.decodes.set(self.0.decodes.get() + 1);
        EnvelopeReader::new().decode(input, version)
    }
}

pub struct Scenario {
    pub call: PendingCall<MockExchange>,
    pub tracker: Rc<Tracker>,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder {
            finished: Some(true),
            open: true,
            body: Vec::new(),
            error: None,
            config: CallConfig::default(),
        }
    }
}

pub struct ScenarioBuilder {
    finished: Option<bool>,
    open: bool,
    body: Vec<u8>,
    error: Option<TransportError>,
    config: CallConfig,
}

impl ScenarioBuilder {
    /// Exchange that is still in flight.
    pub fn in_flight(mut self) -> Self {
        self.finished = Some(false);
        self
    }

    /// Exchange that cannot tell whether it finished.
    pub fn unknown_completion(mut self) -> Self {
        self.finished = None;
        self
    }

    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    pub fn error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn version(mut self, version: SoapVersion) -> Self {
        self.config = CallConfig::new(version).trace_response(self.config.is_tracing());
        self
    }

    pub fn trace(mut self) -> Self {
        self.config = self.config.trace_response(true);
        self
    }

    pub fn build(self) -> Scenario {
        let tracker = Rc::new(Tracker::default());

        let exchange = MockExchange {
            finished: self.finished,
            open: self.open,
            body: self.body,
            error: self.error,
            bound: true,
            tracker: tracker.clone(),
        };

        let call = PendingCall::with_reader(
            exchange,
            b"<request/>".to_vec(),
            self.config,
            CountingReader(tracker.clone()),
        );

        Scenario { call, tracker }
    }
}

pub const SOAP11_OK: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:n="urn:demo">
  <soap:Header>
    <n:SessionId>abc-123</n:SessionId>
  </soap:Header>
  <soap:Body>
    <n:getEmployeeCountryResponse>
      <n:employeeCountry>France</n:employeeCountry>
      <n:since>2010</n:since>
    </n:getEmployeeCountryResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const SOAP11_FAULT: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <SessionId>abc-123</SessionId>
  </soap:Header>
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Server</faultcode>
      <faultstring>Employee not found</faultstring>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;

pub const SOAP12_FAULT: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Body>
    <env:Fault>
      <env:Code><env:Value>env:Receiver</env:Value></env:Code>
      <env:Reason><env:Text xml:lang="en">Database down</env:Text></env:Reason>
    </env:Fault>
  </env:Body>
</env:Envelope>"#;
