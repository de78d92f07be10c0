use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("supportchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("supportchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("supportchat.client.request_duration_seconds");
pub(crate) static CLIENT_RESPONSES_BLOCKED: Counter =
    Counter::new("supportchat.client.responses_blocked");

pub(crate) static SESSION_STARTS: Counter = Counter::new("supportchat.session.starts");
pub(crate) static SESSION_START_ERRORS: Counter = Counter::new("supportchat.session.start_errors");

pub(crate) static EXCHANGES: Counter = Counter::new("supportchat.exchange.dispatched");
pub(crate) static EXCHANGE_ERRORS: Counter = Counter::new("supportchat.exchange.errors");
pub(crate) static EXCHANGES_REJECTED: Counter = Counter::new("supportchat.exchange.rejected");
pub(crate) static EXCHANGE_DURATION: Moments =
    Moments::new("supportchat.exchange.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&CLIENT_RESPONSES_BLOCKED);

    collector.register_counter(&SESSION_STARTS);
    collector.register_counter(&SESSION_START_ERRORS);

    collector.register_counter(&EXCHANGES);
    collector.register_counter(&EXCHANGE_ERRORS);
    collector.register_counter(&EXCHANGES_REJECTED);
    collector.register_moments(&EXCHANGE_DURATION);
}
