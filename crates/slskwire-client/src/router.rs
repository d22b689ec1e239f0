use serde::Serialize;
use slskwire_mux::{ConnectionMux, HandlerList, HandlerResult, MuxError};
use slskwire_transport::{Transport, TransportEvent, TransportState};
use tracing::{debug, warn};

use crate::error::{ClientError, DecodeError, Result};
use crate::message::{
    ClientMessageType, Envelope, SearchRequest, ServerMessageType, TrackDownloadRequest,
};
use crate::records::{decode_payload, SearchResponse, ServerError, TrackDownloadInfo, TrackInfo};

/// The four recognized client events, closed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEventKind {
    SearchResponse,
    TrackInfo,
    TrackDownloadResponse,
    ServerError,
}

impl ClientEventKind {
    /// Every recognized event, in registry order.
    pub const ALL: [ClientEventKind; 4] = [
        ClientEventKind::SearchResponse,
        ClientEventKind::TrackInfo,
        ClientEventKind::TrackDownloadResponse,
        ClientEventKind::ServerError,
    ];

    /// The registry name of this event.
    pub fn name(self) -> &'static str {
        match self {
            ClientEventKind::SearchResponse => "search_response",
            ClientEventKind::TrackInfo => "track_info",
            ClientEventKind::TrackDownloadResponse => "track_download_response",
            ClientEventKind::ServerError => "server_error",
        }
    }

    /// Look up an event by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A decoded server message, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    SearchResponse(SearchResponse),
    TrackInfo(TrackInfo),
    TrackDownloadResponse(TrackDownloadInfo),
    ServerError(ServerError),
}

impl ClientEvent {
    /// The event kind this message dispatches under.
    pub fn kind(&self) -> ClientEventKind {
        match self {
            ClientEvent::SearchResponse(_) => ClientEventKind::SearchResponse,
            ClientEvent::TrackInfo(_) => ClientEventKind::TrackInfo,
            ClientEvent::TrackDownloadResponse(_) => ClientEventKind::TrackDownloadResponse,
            ClientEvent::ServerError(_) => ClientEventKind::ServerError,
        }
    }
}

/// Decode one inbound message text into a typed client event.
///
/// Returns `Ok(None)` for a well-formed envelope whose `msg_type` is not a
/// recognized server discriminator — such messages are ignored without
/// error.
pub fn decode_server_message(text: &str) -> std::result::Result<Option<ClientEvent>, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::Envelope)?;

    let Some(msg_type) = ServerMessageType::from_wire(envelope.msg_type) else {
        debug!(msg_type = envelope.msg_type, "ignoring unrecognized message type");
        return Ok(None);
    };

    let event = match msg_type {
        ServerMessageType::TrackInfo => {
            ClientEvent::TrackInfo(decode_payload("TrackInfo", envelope.data)?)
        }
        ServerMessageType::SearchResponse => {
            ClientEvent::SearchResponse(decode_payload("SearchResponse", envelope.data)?)
        }
        ServerMessageType::TrackDownloadResponse => {
            ClientEvent::TrackDownloadResponse(decode_payload("TrackDownloadInfo", envelope.data)?)
        }
        ServerMessageType::Error => {
            ClientEvent::ServerError(decode_payload("ServerError", envelope.data)?)
        }
    };

    Ok(Some(event))
}

fn slot(kind: ClientEventKind) -> usize {
    match kind {
        ClientEventKind::SearchResponse => 0,
        ClientEventKind::TrackInfo => 1,
        ClientEventKind::TrackDownloadResponse => 2,
        ClientEventKind::ServerError => 3,
    }
}

/// Typed request/response client over one multiplexed connection.
///
/// Outbound requests are tagged with their discriminator and serialized
/// into the wire envelope. Each inbound `message` event is decoded and
/// fanned out to the matching subscriber list; a message that fails to
/// decode is logged and dropped at this single boundary, so one corrupt
/// message can never take down the dispatch loop. Server-declared errors
/// arrive through [`on_error`](SlskClient::on_error); transport-level
/// errors stay on the multiplexer's own `errored` event — the two
/// channels are distinct.
pub struct SlskClient<T> {
    mux: ConnectionMux<T>,
    subscribers: [HandlerList<ClientEvent>; 4],
}

impl<T: Transport> SlskClient<T> {
    /// Wrap a transport. The connection is not opened until [`connect`].
    ///
    /// [`connect`]: SlskClient::connect
    pub fn new(transport: T) -> Self {
        Self {
            mux: ConnectionMux::new(transport),
            subscribers: ClientEventKind::ALL.map(|kind| HandlerList::new(kind.name())),
        }
    }

    /// Open the connection.
    pub fn connect(&mut self) -> Result<()> {
        self.mux.connect().map_err(ClientError::Mux)
    }

    /// Request connection closure.
    pub fn close(&mut self) -> Result<()> {
        self.mux.close().map_err(ClientError::Mux)
    }

    /// Send a search request for `query`.
    ///
    /// No ticket is generated client-side; the server assigns one and
    /// embeds it in the responses.
    pub fn send_search_request(&mut self, query: &str) -> Result<()> {
        self.send_request(
            ClientMessageType::SearchRequest,
            &SearchRequest {
                query: query.to_string(),
            },
        )
    }

    /// Ask the gateway to download `filename` from `username`, correlated
    /// by the search `ticket` that produced it.
    pub fn send_track_download_request(
        &mut self,
        ticket: u32,
        username: &str,
        filename: &str,
    ) -> Result<()> {
        self.send_request(
            ClientMessageType::TrackDownloadRequest,
            &TrackDownloadRequest {
                ticket,
                username: username.to_string(),
                filename: filename.to_string(),
            },
        )
    }

    fn send_request<D: Serialize>(&mut self, msg_type: ClientMessageType, data: &D) -> Result<()> {
        let envelope = Envelope {
            msg_type: msg_type.wire_value(),
            data: serde_json::to_value(data).map_err(MuxError::Encode)?,
        };
        self.mux.send(&envelope).map_err(ClientError::Mux)
    }

    /// Register `handler` for every future event of `kind`.
    pub fn on(
        &mut self,
        kind: ClientEventKind,
        handler: impl FnMut(&ClientEvent) -> HandlerResult + 'static,
    ) {
        self.subscribers[slot(kind)].push(handler);
    }

    /// Register by event name. Fails with [`ClientError::UnknownEvent`]
    /// for a name outside the fixed registry, without mutating any list.
    pub fn on_named(
        &mut self,
        name: &str,
        handler: impl FnMut(&ClientEvent) -> HandlerResult + 'static,
    ) -> Result<()> {
        let kind = ClientEventKind::from_name(name)
            .ok_or_else(|| ClientError::UnknownEvent(name.to_string()))?;
        self.on(kind, handler);
        Ok(())
    }

    /// Subscribe to search responses.
    pub fn on_search_response(
        &mut self,
        mut handler: impl FnMut(&SearchResponse) -> HandlerResult + 'static,
    ) {
        self.on(ClientEventKind::SearchResponse, move |event| match event {
            ClientEvent::SearchResponse(response) => handler(response),
            _ => Ok(()),
        });
    }

    /// Subscribe to single-track announcements.
    pub fn on_track_info(
        &mut self,
        mut handler: impl FnMut(&TrackInfo) -> HandlerResult + 'static,
    ) {
        self.on(ClientEventKind::TrackInfo, move |event| match event {
            ClientEvent::TrackInfo(track) => handler(track),
            _ => Ok(()),
        });
    }

    /// Subscribe to download status updates.
    pub fn on_track_download_response(
        &mut self,
        mut handler: impl FnMut(&TrackDownloadInfo) -> HandlerResult + 'static,
    ) {
        self.on(ClientEventKind::TrackDownloadResponse, move |event| {
            match event {
                ClientEvent::TrackDownloadResponse(info) => handler(info),
                _ => Ok(()),
            }
        });
    }

    /// Subscribe to server-declared errors. The `fatal` flag is forwarded
    /// as-is; closing in response to it is the subscriber's policy.
    pub fn on_error(&mut self, mut handler: impl FnMut(&ServerError) -> HandlerResult + 'static) {
        self.on(ClientEventKind::ServerError, move |event| match event {
            ClientEvent::ServerError(error) => handler(error),
            _ => Ok(()),
        });
    }

    /// Pull one connection event, decode and dispatch if it is a message,
    /// and return it. Returns `None` once the connection has ended.
    pub fn poll(&mut self) -> Option<TransportEvent> {
        let event = self.mux.poll()?;
        if let TransportEvent::Message(text) = &event {
            self.handle_message(text);
        }
        Some(event)
    }

    /// Drive [`poll`](SlskClient::poll) until the connection ends.
    pub fn run(&mut self) {
        while self.poll().is_some() {}
    }

    /// Current transport state.
    pub fn state(&self) -> TransportState {
        self.mux.state()
    }

    /// Number of subscribers registered for `kind`.
    pub fn handler_count(&self, kind: ClientEventKind) -> usize {
        self.subscribers[slot(kind)].len()
    }

    /// Borrow the underlying multiplexer, e.g. to register handlers for
    /// connection lifecycle events.
    pub fn mux(&self) -> &ConnectionMux<T> {
        &self.mux
    }

    /// Mutably borrow the underlying multiplexer.
    pub fn mux_mut(&mut self) -> &mut ConnectionMux<T> {
        &mut self.mux
    }

    /// Decode one inbound message and fan it out. This is the isolation
    /// boundary of the dispatch loop: a decode failure is logged and the
    /// message dropped without notifying any subscriber.
    fn handle_message(&mut self, text: &str) {
        match decode_server_message(text) {
            Ok(Some(event)) => self.subscribers[slot(event.kind())].dispatch(&event),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "dropping undecodable inbound message");
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SlskClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlskClient")
            .field("mux", &self.mux)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use serde_json::json;
    use slskwire_mux::EventKind;

    use super::*;

    #[derive(Default)]
    struct MockTransport {
        open: bool,
        inbound: VecDeque<TransportEvent>,
        writes: Vec<String>,
    }

    impl MockTransport {
        fn with_messages(messages: Vec<serde_json::Value>) -> Self {
            Self {
                open: true,
                inbound: messages
                    .into_iter()
                    .map(|value| TransportEvent::Message(value.to_string()))
                    .collect(),
                writes: Vec::new(),
            }
        }
    }

    impl Transport for MockTransport {
        fn open(&mut self) -> slskwire_transport::Result<()> {
            self.open = true;
            Ok(())
        }

        fn state(&self) -> TransportState {
            if self.open {
                TransportState::Open
            } else {
                TransportState::Disconnected
            }
        }

        fn write(&mut self, text: &str) -> slskwire_transport::Result<()> {
            self.writes.push(text.to_string());
            Ok(())
        }

        fn close(&mut self) -> slskwire_transport::Result<()> {
            self.open = false;
            Ok(())
        }

        fn next_event(&mut self) -> Option<TransportEvent> {
            self.inbound.pop_front()
        }
    }

    fn track_value() -> serde_json::Value {
        json!({
            "Id": "t1",
            "ticket": 7,
            "username": "peer",
            "filename": "song.flac",
            "fullpath": "@music\\song.flac",
            "extension": "flac",
            "filesize": 31457280,
            "attributes": {"4": 44100, "5": 16},
            "bitrate": null,
            "sample_rate": 44100,
            "bit_depth": 16,
            "duration": null
        })
    }

    #[test]
    fn search_request_produces_expected_envelope() {
        let mut client = SlskClient::new(MockTransport::default());
        client.connect().unwrap();
        client.send_search_request("foo").unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&client.mux().get_ref().writes[0]).unwrap();
        assert_eq!(written, json!({"msg_type": 1, "data": {"query": "foo"}}));
    }

    #[test]
    fn download_request_produces_expected_envelope() {
        let mut client = SlskClient::new(MockTransport::default());
        client.connect().unwrap();
        client
            .send_track_download_request(7, "peer", "song.flac")
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&client.mux().get_ref().writes[0]).unwrap();
        assert_eq!(
            written,
            json!({
                "msg_type": 2,
                "data": {"ticket": 7, "username": "peer", "filename": "song.flac"}
            })
        );
    }

    #[test]
    fn send_before_connect_fails_without_writing() {
        let mut client = SlskClient::new(MockTransport::default());

        let err = client.send_search_request("foo").unwrap_err();
        assert!(matches!(err, ClientError::Mux(MuxError::NotConnected)));
        assert!(client.mux().get_ref().writes.is_empty());
    }

    #[test]
    fn send_after_close_fails() {
        let mut client = SlskClient::new(MockTransport::default());
        client.connect().unwrap();
        client.close().unwrap();

        let err = client.send_search_request("foo").unwrap_err();
        assert!(matches!(err, ClientError::Mux(MuxError::NotConnected)));
    }

    #[test]
    fn search_response_fans_out_with_nested_tracks() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let mut client = SlskClient::new(MockTransport::with_messages(vec![json!({
            "msg_type": 2,
            "data": {
                "Id": "x",
                "query": "foo",
                "ticket": 7,
                "total_results": 2,
                "current_results": 1,
                "resultset": [track_value()]
            }
        })]));

        {
            let received = Rc::clone(&received);
            client.on_search_response(move |response| {
                received.borrow_mut().push(response.clone());
                Ok(())
            });
        }

        client.run();

        let received = received.borrow();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id, "x");
        assert_eq!(received[0].query, "foo");
        assert_eq!(received[0].ticket, 7);
        assert_eq!(received[0].total_results, 2);
        assert_eq!(received[0].current_results, 1);
        assert_eq!(received[0].resultset[0].sample_rate, Some(44100));
        assert_eq!(received[0].resultset[0].bit_depth, Some(16));
        assert_eq!(received[0].resultset[0].filesize, 31457280);
    }

    #[test]
    fn track_info_dispatches_to_its_own_list_only() {
        let tracks = Rc::new(RefCell::new(0));
        let mut client = SlskClient::new(MockTransport::with_messages(vec![json!({
            "msg_type": 1,
            "data": track_value()
        })]));

        {
            let tracks = Rc::clone(&tracks);
            client.on_track_info(move |track| {
                assert_eq!(track.username, "peer");
                *tracks.borrow_mut() += 1;
                Ok(())
            });
        }
        client.on_search_response(|_| panic!("search handler must not fire"));
        client.on_error(|_| panic!("error handler must not fire"));

        client.run();
        assert_eq!(*tracks.borrow(), 1);
    }

    #[test]
    fn download_response_dispatches() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut client = SlskClient::new(MockTransport::with_messages(vec![json!({
            "msg_type": 3,
            "data": {"ticket": 7, "username": "peer", "filename": "song.flac", "status": "pending"}
        })]));

        {
            let seen = Rc::clone(&seen);
            client.on_track_download_response(move |info| {
                seen.borrow_mut().push(info.status.clone());
                Ok(())
            });
        }

        client.run();
        assert_eq!(*seen.borrow(), vec!["pending".to_string()]);
    }

    #[test]
    fn fatal_server_error_is_advisory_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut client = SlskClient::new(MockTransport::with_messages(vec![json!({
            "msg_type": 4,
            "data": {"code": 13, "msg": "session expired", "fatal": true}
        })]));

        {
            let seen = Rc::clone(&seen);
            client.on_error(move |error| {
                seen.borrow_mut().push((error.code, error.fatal));
                Ok(())
            });
        }

        client.run();
        assert_eq!(*seen.borrow(), vec![(13, true)]);
        // The client itself takes no action on `fatal`.
        assert!(client.state().is_open());
    }

    #[test]
    fn unrecognized_msg_type_is_silently_ignored() {
        let mut client = SlskClient::new(MockTransport::with_messages(vec![
            json!({"msg_type": 99, "data": {}}),
            json!({"msg_type": 0, "data": {}}),
        ]));

        for kind in ClientEventKind::ALL {
            client.on(kind, |_| panic!("no subscriber may fire"));
        }

        client.run();
    }

    #[test]
    fn malformed_message_does_not_poison_the_loop() {
        let seen = Rc::new(RefCell::new(0));
        let mut transport = MockTransport::with_messages(vec![json!({
            "msg_type": 4,
            "data": {"code": 1, "msg": "ok", "fatal": false}
        })]);
        transport
            .inbound
            .push_front(TransportEvent::Message("{not json".to_string()));
        // Well-formed envelope, undecodable payload.
        transport.inbound.push_front(TransportEvent::Message(
            json!({"msg_type": 4, "data": {"code": "nope"}}).to_string(),
        ));

        let mut client = SlskClient::new(transport);
        {
            let seen = Rc::clone(&seen);
            client.on_error(move |_| {
                *seen.borrow_mut() += 1;
                Ok(())
            });
        }

        client.run();
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn two_handlers_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut client = SlskClient::new(MockTransport::with_messages(vec![json!({
            "msg_type": 1,
            "data": track_value()
        })]));

        for tag in ["first", "second"] {
            let order = Rc::clone(&order);
            client.on_track_info(move |_| {
                order.borrow_mut().push(tag);
                Ok(())
            });
        }

        client.run();
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn on_named_rejects_unknown_event() {
        let mut client = SlskClient::new(MockTransport::default());

        let err = client.on_named("slskError", |_| Ok(())).unwrap_err();
        assert!(matches!(err, ClientError::UnknownEvent(name) if name == "slskError"));
        for kind in ClientEventKind::ALL {
            assert_eq!(client.handler_count(kind), 0);
        }
    }

    #[test]
    fn on_named_accepts_registry_names() {
        let mut client = SlskClient::new(MockTransport::default());

        for kind in ClientEventKind::ALL {
            client.on_named(kind.name(), |_| Ok(())).unwrap();
            assert_eq!(client.handler_count(kind), 1);
        }
    }

    #[test]
    fn lifecycle_events_remain_observable_on_the_mux() {
        let opened = Rc::new(RefCell::new(false));
        let mut transport = MockTransport::with_messages(Vec::new());
        transport.inbound.push_back(TransportEvent::Opened);
        transport.inbound.push_back(TransportEvent::Closed);

        let mut client = SlskClient::new(transport);
        {
            let opened = Rc::clone(&opened);
            client.mux_mut().on(EventKind::Opened, move |_| {
                *opened.borrow_mut() = true;
                Ok(())
            });
        }

        client.run();
        assert!(*opened.borrow());
    }

    #[test]
    fn decode_server_message_reports_reserved_type_as_unrecognized() {
        let text = json!({"msg_type": 0, "data": {"TRACK_INFO": 1}}).to_string();
        assert!(matches!(decode_server_message(&text), Ok(None)));
    }

    #[test]
    fn decode_server_message_propagates_envelope_errors() {
        let err = decode_server_message("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Envelope(_)));

        let err = decode_server_message(r#"{"data": {}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Envelope(_)));
    }
}
