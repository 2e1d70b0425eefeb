//! The OTP component: one event stream, one countdown, one owner.
//!
//! Every state change goes through [`OtpComponent::apply`]. Stream events and
//! timer ticks are produced by [`OtpComponent::next_dispatch`], which only
//! listens to the handles the component currently owns. Each dispatch carries
//! the request or countdown run that produced it, and `apply` drops dispatches
//! whose source has since been replaced or released.

use crate::countdown::Countdown;
use crate::error::Error;
use crate::otp::{request_url, OtpLength, OtpPayload, OTP_EVENT};
use crate::state::{Failure, OtpState};
use crate::view::OtpView;
use log::*;
use sse::message::DEFAULT_EVENT_TYPE;
use sse::{Connection, Connector, Message, StreamEvent};
use url::Url;

/// A unit of work for the component, produced by one of its handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// An event from the stream opened by `generate` call number `request`.
    Stream { request: u64, event: StreamEvent },
    /// A tick from countdown run number `run`.
    Tick { run: u64 },
}

pub struct OtpComponent<C> {
    connector: C,
    endpoint: Url,
    state: OtpState,
    countdown: Countdown,
    stream: Option<Connection>,
    /// Incremented by every `generate`; identifies the stream in `stream`.
    request: u64,
}

impl<C: Connector> OtpComponent<C> {
    pub fn new(connector: C, endpoint: Url) -> Self {
        Self {
            connector,
            endpoint,
            state: OtpState::default(),
            countdown: Countdown::new(),
            stream: None,
            request: 0,
        }
    }

    pub fn with_length(mut self, length: OtpLength) -> Self {
        self.select_length(length);
        self
    }

    /// Takes effect on the next `generate`.
    pub fn select_length(&mut self, length: OtpLength) {
        self.state.selected_length = length;
    }

    /// Starts a new request: releases the previous stream and timer, resets
    /// the displayed state and opens `<endpoint>?digits=<n>`.
    pub fn generate(&mut self) {
        self.cleanup();
        self.countdown.reset();
        self.state.begin();
        self.request += 1;

        let url = request_url(&self.endpoint, self.state.selected_length);
        info!(
            "Requesting {}-digit OTP from {}",
            self.state.selected_length, url
        );

        match self.connector.connect(&url) {
            Ok(connection) => self.stream = Some(connection),
            Err(e) => {
                let err = Error::from(e);
                warn!("Failed to open OTP stream: {err}");
                self.handle_failure(Failure::Disconnected);
            }
        }
    }

    /// Waits for the next stream event or countdown tick. Returns `None` when
    /// the component owns neither, since nothing can happen until the next
    /// `generate`.
    pub async fn next_dispatch(&mut self) -> Option<Dispatch> {
        if self.stream.is_none() && !self.countdown.is_running() {
            return None;
        }

        let request = self.request;
        let run = self.countdown.run();

        let dispatch = tokio::select! {
            event = next_stream_event(&mut self.stream) => Dispatch::Stream { request, event },
            _ = self.countdown.tick() => Dispatch::Tick { run },
        };

        Some(dispatch)
    }

    /// Applies a single dispatch to the component state.
    pub fn apply(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Stream { request, .. } if !self.is_current_stream(request) => {
                debug!("Ignoring event from released stream #{request}");
            }
            Dispatch::Stream {
                event: StreamEvent::Message(message),
                ..
            } => self.handle_message(message),
            Dispatch::Stream {
                event: StreamEvent::Failed(reason),
                ..
            } => {
                warn!("OTP stream failed: {reason}");
                self.handle_failure(Failure::Disconnected);
            }
            Dispatch::Tick { run } if run != self.countdown.run() => {
                debug!("Ignoring tick from replaced countdown #{run}");
            }
            Dispatch::Tick { .. } => self.countdown.decrement(),
        }
    }

    /// Waits for and applies one dispatch. Returns `false` when idle.
    pub async fn run_once(&mut self) -> bool {
        match self.next_dispatch().await {
            Some(dispatch) => {
                self.apply(dispatch);
                true
            }
            None => false,
        }
    }

    /// Closes the stream and stops the countdown. Idempotent.
    pub fn teardown(&mut self) {
        self.cleanup();
    }

    pub fn state(&self) -> &OtpState {
        &self.state
    }

    pub fn time_left(&self) -> u64 {
        self.countdown.remaining()
    }

    pub fn has_open_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn has_active_timer(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn view(&self) -> OtpView {
        OtpView {
            otp: self.state.otp.clone(),
            digits: self.state.selected_length.digits(),
            time_left: self.countdown.remaining(),
            color: self.countdown.color(),
            loading: self.state.loading,
            generated: self.state.generated,
            error: self.state.error.clone(),
            success_message: self.state.success_message.clone(),
        }
    }

    fn is_current_stream(&self, request: u64) -> bool {
        self.stream.is_some() && request == self.request
    }

    fn handle_message(&mut self, message: Message) {
        if message.is(DEFAULT_EVENT_TYPE) {
            debug!("Ignoring unnamed event");
            return;
        }
        if !message.is(OTP_EVENT) {
            debug!("Ignoring '{}' event", message.event_type);
            return;
        }

        match OtpPayload::decode(&message.data) {
            Ok(payload) => {
                info!("Received OTP, valid for {}s", payload.valid_for_seconds);
                self.state.accept(payload.otp);
                self.countdown.start(payload.valid_for_seconds);
            }
            Err(e) => {
                warn!("Discarding OTP event: {e}");
                self.handle_failure(Failure::MalformedPayload);
            }
        }
    }

    fn handle_failure(&mut self, failure: Failure) {
        self.state.fail(failure);
        self.cleanup();
    }
}

impl<C> OtpComponent<C> {
    fn cleanup(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
        self.countdown.cancel();
    }
}

impl<C> Drop for OtpComponent<C> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

async fn next_stream_event(stream: &mut Option<Connection>) -> StreamEvent {
    match stream {
        Some(connection) => connection.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::{DEFAULT_VALID_FOR_SECONDS, PLACEHOLDER_OTP};
    use crate::state::SUCCESS_MESSAGE;
    use sse::error::{connect_error, ErrorKind};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::{self, UnboundedSender};
    use tokio::time::Duration;

    /// Hands out channel-backed connections and keeps the sending side so
    /// tests can push events and observe whether a connection was released.
    #[derive(Clone, Default)]
    struct TestConnector {
        opened: Arc<Mutex<Vec<(Url, UnboundedSender<StreamEvent>)>>>,
        refuse: bool,
    }

    impl TestConnector {
        fn refusing() -> Self {
            Self {
                refuse: true,
                ..Self::default()
            }
        }

        fn urls(&self) -> Vec<Url> {
            self.opened
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        fn sender(&self, index: usize) -> UnboundedSender<StreamEvent> {
            self.opened.lock().unwrap()[index].1.clone()
        }

        fn latest(&self) -> UnboundedSender<StreamEvent> {
            let opened = self.opened.lock().unwrap();
            opened.last().unwrap().1.clone()
        }

        /// Sends on the most recently opened connection.
        fn push(&self, event: StreamEvent) {
            self.latest().send(event).unwrap();
        }

        fn open_connections(&self) -> usize {
            self.opened
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, sender)| !sender.is_closed())
                .count()
        }
    }

    impl Connector for TestConnector {
        fn connect(&self, url: &Url) -> Result<Connection, sse::error::Error> {
            if self.refuse {
                return Err(connect_error(ErrorKind::Connect, "connection refused"));
            }

            let (tx, rx) = mpsc::unbounded_channel();
            self.opened.lock().unwrap().push((url.clone(), tx));
            Ok(Connection::new(url.clone(), rx, None))
        }
    }

    fn endpoint() -> Url {
        Url::parse("http://localhost:8080/api/otp/generate")
            .unwrap()
    }

    fn component(connector: &TestConnector) -> OtpComponent<TestConnector> {
        OtpComponent::new(connector.clone(), endpoint())
    }

    fn otp_event(data: &str) -> StreamEvent {
        StreamEvent::Message(Message::new(OTP_EVENT, data))
    }

    #[tokio::test]
    async fn requests_the_selected_digit_count() {
        let connector = TestConnector::default();
        let mut component = component(&connector);

        component.select_length(OtpLength::Three);
        component.generate();
        component.select_length(OtpLength::Six);
        component.generate();

        let urls = connector.urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].query(), Some("digits=3"));
        assert_eq!(urls[1].query(), Some("digits=6"));
    }

    #[tokio::test]
    async fn generate_enters_loading_with_placeholder() {
        let connector = TestConnector::default();
        let mut component = component(&connector).with_length(OtpLength::Three);

        component.generate();

        let state = component.state();
        assert!(state.loading);
        assert!(!state.generated);
        assert_eq!(state.otp, PLACEHOLDER_OTP);
        assert!(component.has_open_stream());
        assert!(!component.has_active_timer());
    }

    #[tokio::test]
    async fn valid_event_shows_the_code_and_starts_the_countdown() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        connector.push(otp_event(r#"{"otp":"904112","validForSeconds":45}"#));
        assert!(component.run_once().await);

        let state = component.state();
        assert_eq!(state.otp, "904112");
        assert!(!state.loading);
        assert!(state.generated);
        assert_eq!(state.error, None);
        assert_eq!(state.success_message.as_deref(), Some(SUCCESS_MESSAGE));
        assert_eq!(component.time_left(), 45);
        assert!(component.has_active_timer());
    }

    #[tokio::test]
    async fn missing_validity_counts_down_from_the_default() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        connector.push(otp_event(r#"{"otp":"123"}"#));
        component.run_once().await;

        assert_eq!(component.time_left(), DEFAULT_VALID_FOR_SECONDS);
    }

    #[tokio::test]
    async fn later_codes_replace_the_first_without_touching_the_message() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        let sender = connector.latest();
        sender.send(otp_event(r#"{"otp":"111111"}"#)).unwrap();
        component.run_once().await;
        let first_message = component.state().success_message.clone();

        sender
            .send(otp_event(r#"{"otp":"222222","validForSeconds":20}"#))
            .unwrap();
        component.run_once().await;

        assert_eq!(component.state().otp, "222222");
        assert_eq!(component.state().success_message, first_message);
        assert_eq!(component.time_left(), 20);
    }

    #[tokio::test]
    async fn other_event_names_are_ignored() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        connector.push(StreamEvent::Message(Message::new("heartbeat", "{}")));
        component.run_once().await;
        let unnamed = StreamEvent::Message(Message::new(DEFAULT_EVENT_TYPE, "{}"));
        connector.push(unnamed);
        component.run_once().await;

        assert!(component.state().loading);
        assert_eq!(component.state().error, None);
        assert!(component.has_open_stream());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_reaches_zero_and_stays_there() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        connector.push(otp_event(r#"{"otp":"482","validForSeconds":2}"#));
        component.run_once().await;
        assert_eq!(component.time_left(), 2);

        let tick = component.next_dispatch().await.unwrap();
        assert!(matches!(tick, Dispatch::Tick { .. }));
        component.apply(tick);
        assert_eq!(component.time_left(), 1);

        for _ in 0..3 {
            component.run_once().await;
            assert_eq!(component.time_left(), 0);
        }

        connector.push(otp_event(r#"{"otp":"913","validForSeconds":30}"#));
        component.run_once().await;
        assert_eq!(component.time_left(), 30);
        assert_eq!(component.state().otp, "913");
    }

    #[tokio::test]
    async fn generating_twice_keeps_one_stream_and_one_timer() {
        let connector = TestConnector::default();
        let mut component = component(&connector);

        component.generate();
        connector.push(otp_event(r#"{"otp":"1"}"#));
        component.run_once().await;
        assert!(component.has_active_timer());

        component.generate();
        assert!(!component.has_active_timer());
        assert!(connector.sender(0).is_closed());
        assert_eq!(connector.open_connections(), 1);

        connector.push(otp_event(r#"{"otp":"2"}"#));
        component.run_once().await;

        assert_eq!(connector.open_connections(), 1);
        assert!(component.has_active_timer());
        assert_eq!(component.state().otp, "2");
        assert_eq!(
            component.state().success_message.as_deref(),
            Some(SUCCESS_MESSAGE)
        );
    }

    #[tokio::test]
    async fn malformed_payload_ends_the_request() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        connector.push(otp_event("not json"));
        component.run_once().await;

        let state = component.state();
        assert_eq!(state.otp, PLACEHOLDER_OTP);
        assert!(!state.loading);
        assert_eq!(
            state.error.as_deref(),
            Some(Failure::MalformedPayload.message())
        );
        assert!(connector.latest().is_closed());
        assert!(!component.has_open_stream());
        assert!(!component.has_active_timer());
    }

    #[tokio::test]
    async fn stream_failure_resets_to_placeholder() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        let sender = connector.latest();
        sender.send(otp_event(r#"{"otp":"777777"}"#)).unwrap();
        component.run_once().await;
        sender
            .send(StreamEvent::Failed("connection reset".to_string()))
            .unwrap();
        component.run_once().await;

        let state = component.state();
        assert_eq!(state.otp, PLACEHOLDER_OTP);
        assert_eq!(state.error.as_deref(), Some("Backend disconnected."));
        assert_eq!(state.success_message, None);
        assert!(!state.loading);
        assert!(sender.is_closed());
        assert!(!component.has_active_timer());
        assert_eq!(component.next_dispatch().await, None);
    }

    #[tokio::test]
    async fn server_closing_the_stream_is_a_disconnect() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();

        connector.opened.lock().unwrap().clear();
        component.run_once().await;

        assert_eq!(
            component.state().error.as_deref(),
            Some(Failure::Disconnected.message())
        );
        assert!(!component.has_open_stream());
    }

    #[tokio::test]
    async fn refused_connection_fails_immediately() {
        let mut component = OtpComponent::new(TestConnector::refusing(), endpoint());

        component.generate();

        let state = component.state();
        assert!(!state.loading);
        assert_eq!(
            state.error.as_deref(),
            Some(Failure::Disconnected.message())
        );
        assert!(!component.has_open_stream());
    }

    #[tokio::test]
    async fn new_request_clears_a_previous_error() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event("{"));
        component.run_once().await;
        assert!(component.state().error.is_some());

        component.generate();

        assert_eq!(component.state().error, None);
        assert!(component.state().loading);
        assert!(component.has_open_stream());
    }

    #[tokio::test]
    async fn idle_component_has_nothing_to_dispatch() {
        let connector = TestConnector::default();
        let mut component = component(&connector);

        assert_eq!(component.next_dispatch().await, None);
        assert!(!component.run_once().await);

        component.apply(Dispatch::Tick { run: 0 });
        component.apply(Dispatch::Stream {
            request: 0,
            event: otp_event(r#"{"otp":"1"}"#),
        });
        assert_eq!(component.state().otp, PLACEHOLDER_OTP);
        assert_eq!(component.time_left(), 0);
    }

    #[tokio::test]
    async fn event_from_a_replaced_stream_is_ignored() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event(r#"{"otp":"999999"}"#));
        let stale = component.next_dispatch().await.unwrap();

        component.select_length(OtpLength::Three);
        component.generate();
        assert!(connector.sender(0).is_closed());

        component.apply(stale);

        let state = component.state();
        assert_eq!(state.otp, PLACEHOLDER_OTP);
        assert!(state.loading);
        assert!(!state.generated);
        assert_eq!(state.success_message, None);
        assert!(component.has_open_stream());
        assert!(!component.has_active_timer());
    }

    #[tokio::test]
    async fn event_from_a_failed_stream_is_ignored() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event(r#"{"otp":"123456"}"#));
        let stale = component.next_dispatch().await.unwrap();

        connector.push(otp_event("not json"));
        component.run_once().await;
        component.apply(stale);

        assert_eq!(component.state().otp, PLACEHOLDER_OTP);
        assert!(component.state().error.is_some());
        assert!(!component.has_active_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_from_a_restarted_countdown_is_ignored() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event(r#"{"otp":"1","validForSeconds":10}"#));
        component.run_once().await;
        let stale = component.next_dispatch().await.unwrap();
        assert!(matches!(stale, Dispatch::Tick { .. }));

        connector.push(otp_event(r#"{"otp":"2","validForSeconds":20}"#));
        component.run_once().await;
        component.apply(stale);

        assert_eq!(component.state().otp, "2");
        assert_eq!(component.time_left(), 20);
    }

    #[tokio::test]
    async fn teardown_releases_everything_and_is_idempotent() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event(r#"{"otp":"1"}"#));
        component.run_once().await;

        component.teardown();
        component.teardown();

        assert!(!component.has_open_stream());
        assert!(!component.has_active_timer());
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_the_countdown_from_ticking() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event(r#"{"otp":"1","validForSeconds":5}"#));
        component.run_once().await;

        component.teardown();
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(component.next_dispatch().await, None);
        assert_eq!(component.time_left(), 5);
    }

    #[tokio::test]
    async fn dropping_the_component_releases_stream_and_timer() {
        let connector = TestConnector::default();
        let mut component = component(&connector);
        component.generate();
        connector.push(otp_event(r#"{"otp":"1"}"#));
        component.run_once().await;
        assert!(component.has_open_stream());
        assert!(component.has_active_timer());

        // Drop runs the same cleanup as teardown, which the test above
        // shows stops the timer.
        drop(component);

        assert_eq!(connector.open_connections(), 0);
        assert!(connector.sender(0).is_closed());
    }

    #[tokio::test]
    async fn view_reflects_state_and_countdown() {
        let connector = TestConnector::default();
        let mut component = component(&connector).with_length(OtpLength::Three);
        component.generate();
        connector.push(otp_event(r#"{"otp":"482","validForSeconds":15}"#));
        component.run_once().await;

        let view = component.view();
        assert_eq!(view.otp, "482");
        assert_eq!(view.digits, 3);
        assert_eq!(view.time_left, 15);
        assert_eq!(view.color, crate::countdown::CountdownColor::Yellow);
        assert!(view.generated);
        assert!(!view.loading);
    }
}
