//! A single broker session: connect, declare topology, publish, fetch and
//! acknowledge messages, purge queues.

use lapin::options::{
    BasicAckOptions, BasicGetOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions, QueuePurgeOptions,
};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::error::Result;
use crate::topology;

/// Delivery mode for a published message, matching AMQP's own
/// `delivery_mode` property: `1` for non-persistent, `2` for persistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Survives a broker restart; used for model, scenario and result
    /// messages.
    Persistent,
    /// Lost on a broker restart; used for telemetry.
    Ephemeral,
}

impl DeliveryMode {
    fn as_u8(self) -> u8 {
        match self {
            DeliveryMode::Persistent => 2,
            DeliveryMode::Ephemeral => 1,
        }
    }
}

/// A delivery fetched via [`BrokerClient::get_one`], carrying enough state
/// to ack or nack it later.
pub struct Delivery {
    /// The deserialized message body.
    pub body: Vec<u8>,
    /// Headers attached to the message (used for the retry-count header).
    pub headers: FieldTable,
    delivery_tag: lapin::acker::Acker,
}

impl Delivery {
    /// Acknowledges the message, removing it from the queue.
    pub async fn ack(&self) -> Result<()> {
        self.delivery_tag.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    /// Negatively acknowledges the message.
    ///
    /// `requeue = true` returns it to the front of the queue; `false`
    /// routes it to the queue's dead-letter target (if configured) or
    /// discards it.
    pub async fn nack(&self, requeue: bool) -> Result<()> {
        self.delivery_tag.nack(BasicNackOptions { requeue, multiple: false }).await?;
        Ok(())
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Reads an integer header, if present.
    pub fn header_i64(&self, key: &str) -> Option<i64> {
        self.headers.inner().get(key).and_then(|v| match v {
            AMQPValue::LongLongInt(n) => Some(*n),
            AMQPValue::LongInt(n) => Some(*n as i64),
            AMQPValue::ShortInt(n) => Some(*n as i64),
            _ => None,
        })
    }
}

/// A connected broker session wrapping one [`lapin::Channel`].
///
/// Not `Clone`: callers that need concurrent access pool sessions via
/// [`crate::BrokerPool`] instead of sharing one `BrokerClient`.
pub struct BrokerClient {
    connection: Connection,
    channel: Channel,
}

impl BrokerClient {
    /// Opens a connection and a channel against `config`, with the
    /// connection's heartbeat interval taken from the config.
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        let props = ConnectionProperties::default()
            .with_connection_name("simmesh".into())
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);

        let connection = Connection::connect(&config.amqp_uri(), props).await?;
        let channel = connection.create_channel().await?;
        debug!(host = %config.host, port = config.port, "connected to broker");
        Ok(Self { connection, channel })
    }

    /// Declares the fixed queue topology on this session's channel.
    pub async fn declare_topology(&self) -> Result<()> {
        topology::declare_topology(&self.channel).await
    }

    /// Sets the prefetch count (QoS) for this channel's consumers.
    pub async fn set_prefetch(&self, count: u16) -> Result<()> {
        self.channel.basic_qos(count, BasicQosOptions::default()).await?;
        Ok(())
    }

    /// Publishes `payload` (serialized as JSON) to `queue` via the default
    /// exchange, using `queue` as the routing key.
    pub async fn publish<T: Serialize>(&self, queue: &str, payload: &T, mode: DeliveryMode) -> Result<()> {
        self.publish_with_headers(queue, payload, mode, FieldTable::default()).await
    }

    /// As [`Self::publish`], with extra headers attached (used for the
    /// retry-count header on republished scenarios).
    pub async fn publish_with_headers<T: Serialize>(
        &self,
        queue: &str,
        payload: &T,
        mode: DeliveryMode,
        headers: FieldTable,
    ) -> Result<()> {
        let body = serde_json::to_vec(payload)?;
        let properties = BasicProperties::default()
            .with_content_type(ShortString::from("application/json"))
            .with_delivery_mode(mode.as_u8())
            .with_headers(headers);

        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await?
            .await?;
        Ok(())
    }

    /// Fetches at most one message from `queue` without subscribing,
    /// returning `None` if the queue is empty.
    pub async fn get_one(&self, queue: &str) -> Result<Option<Delivery>> {
        let get = self.channel.basic_get(queue, BasicGetOptions { no_ack: false }).await?;
        Ok(get.map(|message| {
            let delivery = message.delivery;
            Delivery {
                body: delivery.data,
                headers: delivery.properties.headers().clone().unwrap_or_default(),
                delivery_tag: delivery.acker,
            }
        }))
    }

    /// Returns the number of ready messages on `queue` via a passive
    /// queue declaration.
    pub async fn queue_depth(&self, queue: &str) -> Result<u32> {
        let declared = self
            .channel
            .queue_declare(
                queue,
                lapin::options::QueueDeclareOptions { passive: true, ..Default::default() },
                FieldTable::default(),
            )
            .await?;
        Ok(declared.message_count())
    }

    /// Purges all messages from `queue`.
    pub async fn purge(&self, queue: &str) -> Result<()> {
        self.channel.queue_purge(queue, QueuePurgeOptions::default()).await?;
        Ok(())
    }

    /// Purges `cola_modelo` and `cola_escenarios`, then publishes the new
    /// model. Callers publish scenarios afterwards — the producer's
    /// model-replacement semantics: stale scenarios from a superseded
    /// model must never be processed against the new one.
    pub async fn purge_and_republish<M: Serialize>(&self, model: &M) -> Result<()> {
        self.purge(topology::MODELO).await?;
        self.purge(topology::ESCENARIOS).await?;
        self.publish(topology::MODELO, model, DeliveryMode::Persistent).await?;
        info!("republished model, scenario queue cleared");
        Ok(())
    }

    /// Closes the channel and connection.
    pub async fn disconnect(self) -> Result<()> {
        self.channel.close(200, "bye").await?;
        self.connection.close(200, "bye").await?;
        Ok(())
    }

    /// Whether the underlying connection reports itself connected.
    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }
}
