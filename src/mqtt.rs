//! MQTT publish sink.
//!
//! Publications happen in scoped batches: connect, publish every message in
//! the batch, disconnect. The connection is released on every exit path,
//! including failures, trading connection reuse for failure isolation — a
//! dropped broker never wedges the scan loop.

use rumqttc::{Client, Event, MqttOptions, Outgoing, QoS};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Client identifier presented to the broker.
const CLIENT_ID: &str = "govee-bridge";

/// Broker port used when the configured address omits one.
const DEFAULT_PORT: u16 = 1883;

/// Capacity of the rumqttc request channel. Must exceed the largest batch
/// (three discovery messages plus one state message plus the disconnect),
/// since the channel is only drained after all requests are queued.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Errors returned by the publish sink.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("invalid broker address: {0}")]
    InvalidBroker(String),
    #[error("MQTT client error: {0}")]
    Client(String),
    #[error("MQTT connection error: {0}")]
    Connection(String),
}

/// Delivery guarantee for one message, decoupled from the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosLevel {
    /// Fire-and-forget (QoS 0)
    AtMostOnce,
    /// Acknowledged delivery (QoS 1)
    AtLeastOnce,
    /// Assured single delivery (QoS 2)
    ExactlyOnce,
}

impl From<QosLevel> for QoS {
    fn from(qos: QosLevel) -> Self {
        match qos {
            QosLevel::AtMostOnce => QoS::AtMostOnce,
            QosLevel::AtLeastOnce => QoS::AtLeastOnce,
            QosLevel::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

/// One message to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
    pub qos: QosLevel,
    pub retain: bool,
}

impl MqttMessage {
    /// A retained message, used for discovery metadata that the automation
    /// platform must see again after a restart.
    pub fn retained(topic: String, payload: String) -> Self {
        Self {
            topic,
            payload,
            qos: QosLevel::AtMostOnce,
            retain: true,
        }
    }

    /// A best-effort, non-retained message, used for state updates.
    pub fn state(topic: String, payload: String) -> Self {
        Self {
            topic,
            payload,
            qos: QosLevel::AtMostOnce,
            retain: false,
        }
    }
}

/// Publish sink abstraction to enable deterministic unit tests without a broker.
pub trait Publisher: Send + Sync {
    /// Publish one batch of messages over a single scoped connection.
    ///
    /// Either the whole batch is handed to the broker connection or an error
    /// is returned; callers decide what a partial failure means for them.
    fn publish_batch(
        &self,
        messages: Vec<MqttMessage>,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;
}

/// Publisher backed by a real MQTT broker connection.
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    host: String,
    port: u16,
}

impl MqttPublisher {
    /// Create a publisher from a broker address of the form `host` or
    /// `host:port`.
    pub fn from_broker(broker: &str) -> Result<Self, PublishError> {
        let broker = broker.trim();
        if broker.is_empty() {
            return Err(PublishError::InvalidBroker("empty address".into()));
        }

        match broker.split_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| PublishError::InvalidBroker(broker.to_string()))?;
                Ok(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self {
                host: broker.to_string(),
                port: DEFAULT_PORT,
            }),
        }
    }
}

impl Publisher for MqttPublisher {
    fn publish_batch(
        &self,
        messages: Vec<MqttMessage>,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        let host = self.host.clone();
        let port = self.port;
        Box::pin(async move {
            tokio::task::spawn_blocking(move || publish_blocking(&host, port, &messages))
                .await
                .map_err(|e| PublishError::Connection(e.to_string()))?
        })
    }
}

/// Run one connect/publish/disconnect batch on the blocking thread pool.
///
/// The synchronous client queues requests first; the connection iterator
/// then drives the network until the disconnect goes out or the connection
/// fails. Dropping the client and connection on return closes the socket on
/// all paths.
fn publish_blocking(host: &str, port: u16, messages: &[MqttMessage]) -> Result<(), PublishError> {
    // batch plus disconnect must fit the request channel, or the queueing
    // loop below blocks before anything drives the network
    debug_assert!(
        messages.len() + 1 < REQUEST_CHANNEL_CAPACITY,
        "batch of {} messages exceeds the request channel capacity",
        messages.len()
    );

    let mut options = MqttOptions::new(CLIENT_ID, host, port);
    options.set_keep_alive(Duration::from_secs(5));

    let (client, mut connection) = Client::new(options, REQUEST_CHANNEL_CAPACITY);

    for message in messages {
        client
            .publish(
                message.topic.as_str(),
                message.qos.into(),
                message.retain,
                message.payload.as_bytes(),
            )
            .map_err(|e| PublishError::Client(e.to_string()))?;
    }
    client
        .disconnect()
        .map_err(|e| PublishError::Client(e.to_string()))?;

    for notification in connection.iter() {
        match notification {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(e) => return Err(PublishError::Connection(e.to_string())),
        }
    }

    Ok(())
}
