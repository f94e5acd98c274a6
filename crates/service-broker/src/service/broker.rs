//! # Service Message Broker
//!
//! Owns the method registry for one channel and turns inbound requests into
//! handler calls and resolved values into result envelopes.
//!
//! ## Execution Model
//!
//! ```text
//!   ServiceMessageBroker (handle)          BrokerActor (one tokio task)
//!  ┌────────────────────────┐  commands   ┌──────────────────────────────┐
//!  │ register_method()      │ ──────────▶ │ registry: MethodRegistry     │
//!  │ registered_methods()   │             │                              │
//!  └────────────────────────┘   inbound   │ dispatch() ── handler.invoke │
//!                     from(channel) ────▶ │        │                     │
//!                                         │        ▼ Invocation::Pending │
//!                                         │ in_flight: FuturesUnordered  │
//!                       to(channel) ◀──── │ complete() ── ResultEnvelope │
//!                                         └──────────────────────────────┘
//! ```
//!
//! The registry is touched only from the actor task, so it needs no lock.
//! Dispatch never waits on a handler's asynchronous value: it is parked in
//! `in_flight` and the loop moves on to the next inbound envelope. Resolved
//! values are answered before further inbound envelopes are taken. Results of
//! distinct requests may therefore be sent in any order; the `id` is the only
//! correlation.

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;
use shared_bus::{ChannelSink, ChannelSubscription, Delivery};
use shared_types::{Envelope, RequestEnvelope, ResultEnvelope, TypeDescriptor};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{
    Arguments, Invocation, MethodRegistration, MethodRegistry, MethodSignature, PendingValue,
};
use crate::error::HandlerError;
use crate::ports::{DispatchEvent, DispatchObserver, MethodHandler, Serializer};

/// Requests from a broker handle to its actor.
pub(crate) enum BrokerCommand {
    Register(MethodRegistration),
    ListMethods(oneshot::Sender<Vec<String>>),
}

/// Handle to a broker bound to one channel.
///
/// Created by `ServiceMessageBrokerFactory`. The broker keeps serving its
/// channel after every handle is dropped; it stops when the channel closes.
#[derive(Debug, Clone)]
pub struct ServiceMessageBroker {
    channel: Arc<str>,
    commands: mpsc::UnboundedSender<BrokerCommand>,
}

impl ServiceMessageBroker {
    pub(crate) fn new(channel: Arc<str>, commands: mpsc::UnboundedSender<BrokerCommand>) -> Self {
        Self { channel, commands }
    }

    /// The channel this broker serves.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Register `handler` under `name`.
    ///
    /// Requests for `name` must carry exactly `signature.len()` arguments; each
    /// is deserialized with the descriptor at its position. If `return_type` is
    /// `Some` and the handler yields an asynchronous value, the resolved value
    /// is serialized with it and sent back under the request's id. With
    /// `None`, results are discarded.
    ///
    /// A later registration under the same name replaces this one. Takes
    /// effect before any envelope delivered after this call is dispatched.
    pub fn register_method(
        &self,
        name: impl Into<String>,
        signature: impl Into<MethodSignature>,
        handler: impl MethodHandler,
        return_type: Option<TypeDescriptor>,
    ) {
        let name = name.into();
        if name.is_empty() {
            warn!(channel = %self.channel, "Ignoring registration with empty method name");
            return;
        }

        let registration = MethodRegistration::new(name, signature, handler, return_type);
        if self
            .commands
            .send(BrokerCommand::Register(registration))
            .is_err()
        {
            warn!(channel = %self.channel, "Broker stopped, registration discarded");
        }
    }

    /// Names currently registered, sorted.
    ///
    /// Empty if the broker has stopped.
    pub async fn registered_methods(&self) -> Vec<String> {
        let (reply, response) = oneshot::channel();
        if self.commands.send(BrokerCommand::ListMethods(reply)).is_err() {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }

    /// Whether the broker is still serving its channel.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// A resolved (or rejected) asynchronous handler value.
///
/// Carries only what is needed to answer the originating request.
struct Completion {
    method: String,
    id: String,
    return_type: Option<TypeDescriptor>,
    outcome: Result<Value, HandlerError>,
}

/// The single task that owns a broker's registry.
pub(crate) struct BrokerActor {
    channel: Arc<str>,
    registry: MethodRegistry,
    serializer: Arc<dyn Serializer>,
    observer: Arc<dyn DispatchObserver>,
    sink: ChannelSink,
    inbound: ChannelSubscription,
    commands: mpsc::UnboundedReceiver<BrokerCommand>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl BrokerActor {
    pub(crate) fn new(
        channel: Arc<str>,
        serializer: Arc<dyn Serializer>,
        observer: Arc<dyn DispatchObserver>,
        sink: ChannelSink,
        inbound: ChannelSubscription,
        commands: mpsc::UnboundedReceiver<BrokerCommand>,
    ) -> Self {
        Self {
            channel,
            registry: MethodRegistry::new(),
            serializer,
            observer,
            sink,
            inbound,
            commands,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Serve the channel until it closes.
    pub(crate) async fn run(mut self) {
        info!(channel = %self.channel, "Broker started");
        let mut commands_open = true;

        loop {
            tokio::select! {
                // Registrations made before a send must be visible to its dispatch.
                biased;

                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => commands_open = false,
                },

                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(completion);
                }

                delivery = self.inbound.next_delivery() => match delivery {
                    Some(Delivery::Envelope(raw)) => self.dispatch(raw),
                    Some(Delivery::Lagged(count)) => {
                        warn!(channel = %self.channel, lost = count, "Inbound queue overflowed, requests lost");
                        self.emit(DispatchEvent::Lost { count });
                    }
                    None => break,
                },
            }
        }

        info!(
            channel = %self.channel,
            abandoned = self.in_flight.len(),
            "Channel closed, broker stopped"
        );
    }

    fn handle_command(&mut self, command: BrokerCommand) {
        match command {
            BrokerCommand::Register(registration) => {
                let name = registration.name().to_string();
                if self.registry.register(registration).is_some() {
                    debug!(channel = %self.channel, method = %name, "Method registration replaced");
                } else {
                    debug!(channel = %self.channel, method = %name, "Method registered");
                }
            }
            BrokerCommand::ListMethods(reply) => {
                let _ = reply.send(self.registry.names());
            }
        }
    }

    fn emit(&self, event: DispatchEvent) {
        self.observer.observe(&self.channel, &event);
    }

    /// Handle one inbound envelope.
    fn dispatch(&mut self, raw: Value) {
        let request = match Envelope::decode(raw) {
            Ok(Envelope::Request(request)) => request,
            Ok(other @ Envelope::Result(_)) => {
                debug!(channel = %self.channel, kind = %other.kind(), "Ignoring non-request envelope");
                self.emit(DispatchEvent::Ignored {
                    kind: other.kind(),
                    id: other.id().to_string(),
                });
                return;
            }
            Err(e) => {
                warn!(channel = %self.channel, error = %e, "Dropping malformed envelope");
                self.emit(DispatchEvent::Malformed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let RequestEnvelope { method, args, id } = request;

        // Not every request on a shared channel is addressed to this broker.
        let Some(registration) = self.registry.get(&method) else {
            debug!(channel = %self.channel, method = %method, id = %id, "No such method, dropping request");
            self.emit(DispatchEvent::UnknownMethod { method, id });
            return;
        };

        let expected = registration.signature().len();
        if args.len() != expected {
            warn!(
                channel = %self.channel,
                method = %method,
                id = %id,
                expected,
                received = args.len(),
                "Argument count mismatch, dropping request"
            );
            let received = args.len();
            self.emit(DispatchEvent::ArityMismatch {
                method,
                id,
                expected,
                received,
            });
            return;
        }

        let decoded = decode_arguments(self.serializer.as_ref(), registration.signature(), args);
        let arguments = match decoded {
            Ok(arguments) => arguments,
            Err((index, reason)) => {
                warn!(
                    channel = %self.channel,
                    method = %method,
                    id = %id,
                    index,
                    error = %reason,
                    "Argument decode failed, dropping request"
                );
                self.emit(DispatchEvent::DecodeFailed {
                    method,
                    id,
                    index,
                    reason,
                });
                return;
            }
        };

        let return_type = registration.return_type().cloned();
        let invoked = invoke(registration.handler(), arguments);
        self.emit(DispatchEvent::Dispatched {
            method: method.clone(),
            id: id.clone(),
        });

        match invoked {
            Ok(Invocation::Absent) => {
                debug!(channel = %self.channel, method = %method, id = %id, "Handler returned no value");
            }
            Ok(Invocation::Pending(pending)) => {
                self.in_flight
                    .push(continuation(method, id, return_type, pending));
            }
            Err(e) => {
                warn!(channel = %self.channel, method = %method, id = %id, error = %e, "Handler failed");
                self.emit(DispatchEvent::HandlerFailed {
                    method,
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Handle a resolved continuation.
    fn complete(&mut self, completion: Completion) {
        let Completion {
            method,
            id,
            return_type,
            outcome,
        } = completion;

        let value = match outcome {
            Ok(value) => value,
            Err(e) => {
                warn!(channel = %self.channel, method = %method, id = %id, error = %e, "Asynchronous result rejected");
                self.emit(DispatchEvent::HandlerFailed {
                    method,
                    id,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let Some(return_type) = return_type else {
            debug!(channel = %self.channel, method = %method, id = %id, "Discarding result of fire-and-forget method");
            return;
        };

        let encoded = self
            .serializer
            .serialize(value, &return_type)
            .map_err(|e| e.to_string())
            .and_then(|wire| {
                Envelope::from(ResultEnvelope::new(wire, id.clone()))
                    .encode()
                    .map_err(|e| e.to_string())
            });

        match encoded {
            Ok(raw) => {
                let receivers = self.sink.send(raw);
                debug!(channel = %self.channel, method = %method, id = %id, receivers, "Result sent");
                self.emit(DispatchEvent::Responded { method, id });
            }
            Err(reason) => {
                warn!(channel = %self.channel, method = %method, id = %id, error = %reason, "Result serialization failed");
                self.emit(DispatchEvent::ResponseFailed { method, id, reason });
            }
        }
    }
}

/// Deserialize each wire argument with the descriptor at its position.
///
/// Callers have already checked that the counts match.
fn decode_arguments(
    serializer: &dyn Serializer,
    signature: &MethodSignature,
    args: Vec<Value>,
) -> Result<Arguments, (usize, String)> {
    signature
        .params()
        .zip(args)
        .enumerate()
        .map(|(index, (ty, wire))| {
            serializer
                .deserialize(wire, ty)
                .map_err(|e| (index, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Arguments::new)
}

/// Invoke a handler, turning a panic into a handler failure.
fn invoke(handler: &dyn MethodHandler, arguments: Arguments) -> Result<Invocation, HandlerError> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(arguments)))
        .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))))
}

/// Wrap a pending value so that it resolves to everything needed to answer it.
fn continuation(
    method: String,
    id: String,
    return_type: Option<TypeDescriptor>,
    pending: PendingValue,
) -> BoxFuture<'static, Completion> {
    AssertUnwindSafe(pending)
        .catch_unwind()
        .map(move |caught| Completion {
            method,
            id,
            return_type,
            outcome: caught.unwrap_or_else(|payload| {
                Err(HandlerError::Panicked(panic_message(payload.as_ref())))
            }),
        })
        .boxed()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
