//! Minimal MQTT 3.1.1 peer for driving sessions over a real socket.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const CONNECT: u8 = 0x10;
pub const DISCONNECT: u8 = 0xe0;

/// CONNACK, no session present, accepted.
const CONNACK_ACCEPTED: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

/// How long the broker keeps listening for a second connection.
const RECONNECT_WINDOW: Duration = Duration::from_millis(500);

/// One control packet: first header byte and variable header + payload.
pub struct RawPacket {
    pub header: u8,
    pub body: Vec<u8>,
}

pub struct SeenPublish {
    pub header: u8,
    pub topic: String,
    pub pkid: u16,
    pub payload: Vec<u8>,
}

/// What the broker does once the PUBLISH has arrived.
#[derive(Clone, Copy)]
pub enum Script {
    AckPublish,
    DropAfterPublish,
}

pub struct BrokerLog {
    pub connect: RawPacket,
    pub publish: Option<SeenPublish>,
    /// Header of the packet following the PUBACK, if any.
    pub after_publish: Option<u8>,
    /// Whether the client opened a second connection afterwards.
    pub reconnected: bool,
}

impl RawPacket {
    /// Decode a QoS 1 PUBLISH.
    pub fn publish(&self) -> SeenPublish {
        let body = &self.body;
        let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
        let topic = String::from_utf8(body[2..2 + topic_len].to_vec()).unwrap();
        let pkid = u16::from_be_bytes([body[2 + topic_len], body[3 + topic_len]]);

        SeenPublish {
            header: self.header,
            topic,
            pkid,
            payload: body[4 + topic_len..].to_vec(),
        }
    }

    pub fn contains(&self, needle: &[u8]) -> bool {
        self.body.windows(needle.len()).any(|w| w == needle)
    }
}

pub async fn read_packet(stream: &mut TcpStream) -> Option<RawPacket> {
    let header = stream.read_u8().await.ok()?;

    let mut remaining = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await.ok()?;
        remaining |= ((byte & 0x7f) as usize) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    let mut body = vec![0u8; remaining];
    stream.read_exact(&mut body).await.ok()?;

    Some(RawPacket { header, body })
}

/// Start a one-shot broker on a free local port.
pub async fn spawn(script: Script) -> (u16, JoinHandle<BrokerLog>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let connect = read_packet(&mut stream).await.unwrap();
        stream.write_all(&CONNACK_ACCEPTED).await.unwrap();

        let publish = read_packet(&mut stream).await.map(|p| p.publish());

        let after_publish = match script {
            Script::AckPublish => {
                if let Some(p) = &publish {
                    let [hi, lo] = p.pkid.to_be_bytes();
                    stream.write_all(&[0x40, 0x02, hi, lo]).await.unwrap();
                }
                read_packet(&mut stream).await.map(|p| p.header)
            }
            Script::DropAfterPublish => {
                drop(stream);
                None
            }
        };

        let reconnected = timeout(RECONNECT_WINDOW, listener.accept()).await.is_ok();

        BrokerLog {
            connect,
            publish,
            after_publish,
            reconnected,
        }
    });

    (port, handle)
}
