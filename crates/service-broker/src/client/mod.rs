//! # Client Message Broker
//!
//! The calling side of a broker channel. Serializes typed arguments, tags each
//! request with a fresh correlation id and, when a return type is given,
//! waits for the result envelope carrying that id.
//!
//! ## Flow
//!
//! 1. `call()` generates a UUID v4 id and, if a result is expected, parks a
//!    oneshot sender under it in the pending map
//! 2. The request envelope is sent on the channel
//! 3. The listener task receives result envelopes and completes the matching
//!    pending entry
//! 4. `call()` awaits the receiver, optionally bounded by a timeout
//!
//! Results may arrive in any order; only the id matters.

use dashmap::DashMap;
use serde_json::Value;
use shared_bus::{ChannelSink, ChannelSubscription, MessageBus};
use shared_types::{Envelope, RequestEnvelope, ResultEnvelope, TypeDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::ports::Serializer;

/// One positional argument with the descriptor it is serialized as.
#[derive(Debug, Clone, PartialEq)]
pub struct FnArg {
    pub value: Value,
    pub ty: TypeDescriptor,
}

impl FnArg {
    pub fn new(value: impl Into<Value>, ty: TypeDescriptor) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }

    /// An argument passed through unchanged.
    pub fn primitive(value: impl Into<Value>) -> Self {
        Self::new(value, TypeDescriptor::PRIMITIVE)
    }
}

/// A call waiting for its result envelope.
struct PendingCall {
    method: String,
    return_type: TypeDescriptor,
    reply: oneshot::Sender<Result<Value, ClientError>>,
}

type PendingCalls = DashMap<String, PendingCall>;

/// Sends requests on a channel and correlates the results.
pub struct ClientMessageBroker {
    channel: Arc<str>,
    sink: ChannelSink,
    serializer: Arc<dyn Serializer>,
    pending: Arc<PendingCalls>,
    listener: JoinHandle<()>,
}

impl ClientMessageBroker {
    /// Bind to `channel` on `bus` and start listening for results.
    ///
    /// The channel is initialized on this bus end with the host-loop flag set.
    ///
    /// # Errors
    ///
    /// `NoRuntime` outside a tokio runtime, `Transport` if the bus refuses the
    /// channel.
    pub fn new(
        bus: &dyn MessageBus,
        serializer: Arc<dyn Serializer>,
        channel: &str,
    ) -> Result<Self, ClientError> {
        let runtime =
            Handle::try_current().map_err(|_| ClientError::NoRuntime(channel.to_string()))?;

        bus.init_channel(channel, true)?;
        let sink = bus.to(channel)?;
        let inbound = bus.from(channel)?;

        let pending = Arc::new(PendingCalls::new());
        let listener = runtime.spawn(listen(inbound, serializer.clone(), pending.clone()));

        Ok(Self {
            channel: Arc::from(channel),
            sink,
            serializer,
            pending,
            listener,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Calls still waiting for a result.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Call `method` and, if `return_type` is given, wait for its result.
    ///
    /// Returns `Ok(None)` as soon as the request is sent when no result is
    /// expected. A request the far side drops (unknown method, bad arguments,
    /// failed handler) never completes; use `call_with_timeout` to bound it.
    /// Dropping the returned future forgets the call.
    pub async fn call(
        &self,
        method: &str,
        args: Vec<FnArg>,
        return_type: Option<TypeDescriptor>,
    ) -> Result<Option<Value>, ClientError> {
        let Some((id, response)) = self.send_request(method, args, return_type)? else {
            return Ok(None);
        };
        let _forget = ForgetOnDrop::new(&self.pending, &id);
        await_result(id, response).await.map(Some)
    }

    /// Like `call`, but gives up after `timeout`.
    ///
    /// An expired call is removed from the pending map; a result arriving
    /// later is dropped as unknown.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        args: Vec<FnArg>,
        return_type: Option<TypeDescriptor>,
        timeout: Duration,
    ) -> Result<Option<Value>, ClientError> {
        let Some((id, response)) = self.send_request(method, args, return_type)? else {
            return Ok(None);
        };

        let _forget = ForgetOnDrop::new(&self.pending, &id);
        match tokio::time::timeout(timeout, await_result(id.clone(), response)).await {
            Ok(result) => result.map(Some),
            Err(_) => {
                warn!(channel = %self.channel, method, id = %id, "Call timed out");
                Err(ClientError::Timeout {
                    id,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Serialize and send one request.
    ///
    /// Registers the pending entry before sending so a fast reply cannot be
    /// missed.
    fn send_request(
        &self,
        method: &str,
        args: Vec<FnArg>,
        return_type: Option<TypeDescriptor>,
    ) -> Result<Option<(String, oneshot::Receiver<Result<Value, ClientError>>)>, ClientError> {
        let wire_args = args
            .into_iter()
            .enumerate()
            .map(|(index, arg)| {
                self.serializer
                    .serialize(arg.value, &arg.ty)
                    .map_err(|source| ClientError::Argument { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = Uuid::new_v4().to_string();
        let raw = Envelope::from(RequestEnvelope::new(method, wire_args, id.clone())).encode()?;

        let response = return_type.map(|return_type| {
            let (reply, response) = oneshot::channel();
            self.pending.insert(
                id.clone(),
                PendingCall {
                    method: method.to_string(),
                    return_type,
                    reply,
                },
            );
            response
        });

        let receivers = self.sink.send(raw);
        debug!(channel = %self.channel, method, id = %id, receivers, "Request sent");

        Ok(response.map(|response| (id, response)))
    }
}

impl Drop for ClientMessageBroker {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Removes a call from the pending map when its caller stops waiting.
struct ForgetOnDrop<'a> {
    pending: &'a PendingCalls,
    id: String,
}

impl<'a> ForgetOnDrop<'a> {
    fn new(pending: &'a PendingCalls, id: &str) -> Self {
        Self {
            pending,
            id: id.to_string(),
        }
    }
}

impl Drop for ForgetOnDrop<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

async fn await_result(
    id: String,
    response: oneshot::Receiver<Result<Value, ClientError>>,
) -> Result<Value, ClientError> {
    response.await.map_err(|_| ClientError::Disconnected(id))?
}

/// Complete pending calls from result envelopes until the channel closes.
async fn listen(
    mut inbound: ChannelSubscription,
    serializer: Arc<dyn Serializer>,
    pending: Arc<PendingCalls>,
) {
    while let Some(raw) = inbound.recv().await {
        let ResultEnvelope { value, id } = match Envelope::decode(raw) {
            Ok(Envelope::Result(result)) => result,
            Ok(Envelope::Request(request)) => {
                debug!(channel = inbound.channel(), id = %request.id, "Ignoring request on client side");
                continue;
            }
            Err(e) => {
                warn!(channel = inbound.channel(), error = %e, "Dropping malformed envelope");
                continue;
            }
        };

        let Some((_, call)) = pending.remove(&id) else {
            warn!(channel = inbound.channel(), id = %id, "Result for unknown or expired id");
            continue;
        };

        let outcome = serializer
            .deserialize(value, &call.return_type)
            .map_err(|source| ClientError::Result {
                id: id.clone(),
                source,
            });

        if call.reply.send(outcome).is_err() {
            debug!(channel = inbound.channel(), method = %call.method, id = %id, "Caller gone, result dropped");
        }
    }

    // Dropping the senders wakes every waiting caller with `Disconnected`.
    pending.clear();
    debug!(channel = inbound.channel(), "Channel closed, client listener stopped");
}
