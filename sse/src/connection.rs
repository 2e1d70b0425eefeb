use crate::error::{connect_error, Error, ErrorKind};
use crate::message::{Message, StreamEvent};
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// Opens event-stream connections.
///
/// Implementations must return a `Connection` whose channel yields every event
/// of the stream in order and ends with at most one `StreamEvent::Failed`.
pub trait Connector {
    fn connect(&self, url: &Url) -> Result<Connection, Error>;
}

/// An open event stream. Owning the value is owning the connection: closing or
/// dropping it stops the reader and discards anything still queued.
pub struct Connection {
    url: Url,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    /// Wraps a channel fed by `reader`. Connectors that push events from
    /// elsewhere (tests, in-process sources) pass `None`.
    pub fn new(
        url: Url,
        events: mpsc::UnboundedReceiver<StreamEvent>,
        reader: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            url,
            events,
            reader,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Waits for the next event. A channel that closed without reporting a
    /// failure is treated as a disconnect.
    pub async fn recv(&mut self) -> StreamEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => StreamEvent::Failed("event stream closed".to_string()),
        }
    }

    /// Stops the reader task and closes the channel. Idempotent.
    pub fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            debug!("Closed SSE connection to {}", self.url);
        }
        self.events.close();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Production connector backed by `eventsource-client`, with reconnects
/// disabled so the first transport error ends the stream.
#[derive(Debug, Default, Clone)]
pub struct EventSourceConnector;

impl EventSourceConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for EventSourceConnector {
    fn connect(&self, url: &Url) -> Result<Connection, Error> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(connect_error(
                ErrorKind::InvalidUrl,
                &format!("unsupported scheme: {}", url.scheme()),
            ));
        }

        let client = es::ClientBuilder::for_url(url.as_str())?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let (tx, rx) = mpsc::unbounded_channel();
        let label = url.to_string();

        info!("Opening SSE connection to {}", label);

        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                let event = match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => StreamEvent::Message(Message {
                        event_type: event.event_type,
                        data: event.data,
                    }),
                    Some(Ok(_)) => {
                        // Comments (keep-alive)
                        continue;
                    }
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {}", label, e);
                        StreamEvent::Failed(e.to_string())
                    }
                    None => {
                        debug!("SSE stream ended for {}", label);
                        StreamEvent::Failed("event stream ended".to_string())
                    }
                };

                let terminal = event.is_terminal();
                if tx.send(event).is_err() {
                    debug!("SSE receiver dropped for {}", label);
                    break;
                }
                if terminal {
                    break;
                }
            }
        });

        Ok(Connection::new(url.clone(), rx, Some(handle)))
    }
}
