//! Single-use MQTT session: connect, publish one retained message, close.
//!
//! ```text
//! Disconnected → Connecting → Connected → Publishing → Closed
//! ```
//!
//! Every wait on the broker is bounded by its own timeout. A session that
//! fails to connect goes straight to `Closed`.

use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::RelayError;

/// Capacity of the request channel between client and event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Publishing,
    Closed,
}

/// Deadlines for each blocking step of a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    pub connect: Duration,
    pub publish: Duration,
    pub disconnect: Duration,
}

pub struct MqttSession {
    client_id: String,
    client: AsyncClient,
    eventloop: EventLoop,
    state: SessionState,
    timeouts: SessionTimeouts,
}

impl MqttSession {
    /// Create a session. Nothing touches the network until `connect`.
    pub fn new(client_id: String, options: MqttOptions, timeouts: SessionTimeouts) -> Self {
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        Self {
            client_id,
            client,
            eventloop,
            state: SessionState::Disconnected,
            timeouts,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            client_id = %self.client_id,
            from = ?self.state,
            to = ?next,
            "mqtt_session_state"
        );
        self.state = next;
    }

    /// Open the connection and wait for a successful CONNACK.
    pub async fn connect(&mut self) -> Result<(), RelayError> {
        if self.state != SessionState::Disconnected {
            return Err(RelayError::UpstreamConnection(format!(
                "cannot connect a session in {:?} state",
                self.state
            )));
        }

        self.transition(SessionState::Connecting);

        let deadline = self.timeouts.connect;
        let outcome = timeout(deadline, wait_for_connack(&mut self.eventloop)).await;

        match outcome {
            Ok(Ok(())) => {
                self.transition(SessionState::Connected);
                info!(client_id = %self.client_id, "mqtt_connected");
                Ok(())
            }
            Ok(Err(reason)) => {
                self.transition(SessionState::Closed);
                Err(RelayError::UpstreamConnection(reason))
            }
            Err(_) => {
                self.transition(SessionState::Closed);
                Err(RelayError::UpstreamConnection(format!(
                    "no CONNACK within {}ms",
                    deadline.as_millis()
                )))
            }
        }
    }

    /// Publish `payload` to `topic` with QoS 1 and the retain flag, and wait
    /// for the broker's PUBACK.
    pub async fn publish_retained(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), RelayError> {
        if self.state != SessionState::Connected {
            return Err(RelayError::UpstreamPublish(format!(
                "cannot publish from {:?} state",
                self.state
            )));
        }

        self.transition(SessionState::Publishing);

        let deadline = self.timeouts.publish;
        let outcome = timeout(
            deadline,
            publish_and_wait_for_puback(&self.client, &mut self.eventloop, topic, payload),
        )
        .await;

        match outcome {
            Ok(Ok(pkid)) => {
                info!(client_id = %self.client_id, topic = topic, pkid = pkid, "mqtt_puback_received");
                self.transition(SessionState::Connected);
                Ok(())
            }
            Ok(Err(PublishFailure::ConnectionLost(reason))) => {
                // Polling again would reconnect and replay the in-flight
                // publish, so the session ends here.
                warn!(client_id = %self.client_id, error = %reason, "mqtt_connection_lost");
                self.transition(SessionState::Closed);
                Err(RelayError::UpstreamPublish(reason))
            }
            Ok(Err(PublishFailure::Rejected(reason))) => Err(RelayError::UpstreamPublish(reason)),
            Err(_) => Err(RelayError::UpstreamPublish(format!(
                "no PUBACK within {}ms",
                deadline.as_millis()
            ))),
        }
    }

    /// Tear the session down. Failures are logged and swallowed.
    ///
    /// Only a live link gets a DISCONNECT; the drain stops at the first
    /// connection error so the event loop never reconnects.
    pub async fn close(&mut self) {
        let open = matches!(
            self.state,
            SessionState::Connected | SessionState::Publishing
        );

        if open {
            match self.client.disconnect().await {
                Ok(()) => {
                    let deadline = self.timeouts.disconnect;
                    if timeout(deadline, drain_until_disconnect(&mut self.eventloop))
                        .await
                        .is_err()
                    {
                        warn!(
                            client_id = %self.client_id,
                            timeout_ms = deadline.as_millis() as u64,
                            "mqtt_disconnect_timeout"
                        );
                    }
                }
                Err(e) => {
                    warn!(client_id = %self.client_id, error = %e, "mqtt_disconnect_request_failed");
                }
            }
        }

        if self.state != SessionState::Closed {
            self.transition(SessionState::Closed);
        }
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(format!("broker refused connection: {:?}", ack.code))
                };
            }
            Ok(_) => continue,
            Err(e) => return Err(e.to_string()),
        }
    }
}

enum PublishFailure {
    /// The event loop reported a connection error; the link is gone.
    ConnectionLost(String),
    /// The request never reached the event loop.
    Rejected(String),
}

/// Returns the packet id of the acknowledged publish.
async fn publish_and_wait_for_puback(
    client: &AsyncClient,
    eventloop: &mut EventLoop,
    topic: &str,
    payload: Vec<u8>,
) -> Result<u16, PublishFailure> {
    if let Err(e) = client.publish(topic, QoS::AtLeastOnce, true, payload).await {
        return Err(PublishFailure::Rejected(e.to_string()));
    }

    let mut sent_pkid = None;
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => sent_pkid = Some(pkid),
            Ok(Event::Incoming(Packet::PubAck(ack))) if Some(ack.pkid) == sent_pkid => {
                return Ok(ack.pkid);
            }
            Ok(_) => continue,
            Err(e) => return Err(PublishFailure::ConnectionLost(e.to_string())),
        }
    }
}

async fn drain_until_disconnect(eventloop: &mut EventLoop) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => return,
            Ok(_) => continue,
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    use crate::firmware::test_broker::{self, Script, CONNECT, DISCONNECT};

    const TOPIC: &str = "jamur/firmware/new_available";

    fn timeouts(connect_ms: u64) -> SessionTimeouts {
        SessionTimeouts {
            connect: Duration::from_millis(connect_ms),
            publish: Duration::from_millis(200),
            disconnect: Duration::from_millis(200),
        }
    }

    fn session_for(port: u16, connect_ms: u64) -> MqttSession {
        let options = MqttOptions::new("session-test", "127.0.0.1", port);
        MqttSession::new("session-test".to_string(), options, timeouts(connect_ms))
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = session_for(1883, 100);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Grab a free port, then release it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut session = session_for(port, 2_000);
        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, RelayError::UpstreamConnection(_)));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_connect_times_out_on_silent_broker() {
        // Accepts TCP but never answers CONNECT.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut session = session_for(port, 150);
        let err = session.connect().await.unwrap_err();

        assert!(err.to_string().contains("no CONNACK within 150ms"));
        assert_eq!(session.state(), SessionState::Closed);
        drop(listener);
    }

    #[tokio::test]
    async fn test_publish_requires_connection() {
        let mut session = session_for(1883, 100);
        let err = session
            .publish_retained("jamur/firmware/new_available", b"{}".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::UpstreamPublish(_)));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_close_without_connect() {
        let mut session = session_for(1883, 100);
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.connect().await.unwrap_err();
        assert!(err.to_string().contains("Closed"));
    }

    #[tokio::test]
    async fn test_retained_qos1_publish_over_the_wire() {
        let (port, broker) = test_broker::spawn(Script::AckPublish).await;
        let payload = br#"{"version":"v24.3","release_notes":"Pump fix","url":"https://cdn/fw.bin"}"#.to_vec();

        let mut session = session_for(port, 2_000);
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        session.publish_retained(TOPIC, payload.clone()).await.unwrap();
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);

        let log = broker.await.unwrap();
        assert_eq!(log.connect.header, CONNECT);

        let publish = log.publish.expect("broker saw no PUBLISH");
        // PUBLISH, QoS 1, retain, not dup.
        assert_eq!(publish.header, 0x33);
        assert_eq!(publish.topic, TOPIC);
        assert_eq!(publish.payload, payload);
        assert_ne!(publish.pkid, 0);

        assert_eq!(log.after_publish, Some(DISCONNECT));
        assert!(!log.reconnected);
    }

    #[tokio::test]
    async fn test_lost_connection_during_publish_is_not_replayed() {
        let (port, broker) = test_broker::spawn(Script::DropAfterPublish).await;

        let mut session = session_for(port, 2_000);
        session.connect().await.unwrap();

        let err = session
            .publish_retained(TOPIC, b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::UpstreamPublish(_)));
        assert_eq!(session.state(), SessionState::Closed);

        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);

        let log = broker.await.unwrap();
        assert_eq!(log.publish.map(|p| p.header), Some(0x33));
        assert!(!log.reconnected, "session reconnected and replayed the publish");
    }
}
