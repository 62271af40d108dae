/*
[INPUT]:  Raw WebSocket text frames / outbound namespace events
[OUTPUT]: Decoded Engine.IO + Socket.IO packets, encoded control frames
[POS]:    WebSocket layer - Socket.IO v5 (Engine.IO v4) framing
[UPDATE]: When the stream transport protocol version changes
*/

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::http::{Pi42Error, Result};

/// Default Socket.IO namespace
pub const ROOT_NAMESPACE: &str = "/";

const ENGINE_IO_PATH: &str = "socket.io/";
const ENGINE_IO_QUERY: &str = "EIO=4&transport=websocket";
// Record separator, only seen when a server batches packets into one frame
const RECORD_SEPARATOR: char = '\x1e';

/// Engine.IO transport packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake carrying sid / ping settings
    Open(Value),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Noop,
}

/// Socket.IO packet carried inside an Engine.IO message
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event { namespace: String, event: String, data: Value },
    Ack { namespace: String },
    ConnectError { namespace: String, message: String },
}

/// Turn an `http(s)://host/path` stream base into its Engine.IO websocket URL
pub fn engine_io_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Pi42Error::Config(format!(
                "unsupported stream URL scheme: {other}"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| Pi42Error::Config(format!("cannot use {scheme} for {base}")))?;

    let path = format!("{}/{}", url.path().trim_end_matches('/'), ENGINE_IO_PATH);
    url.set_path(&path);
    url.set_query(Some(ENGINE_IO_QUERY));
    Ok(url)
}

/// Decode one websocket text frame (possibly several batched packets)
pub fn decode_frame(frame: &str) -> Result<Vec<EnginePacket>> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|packet| !packet.is_empty())
        .map(decode_packet)
        .collect()
}

fn decode_packet(packet: &str) -> Result<EnginePacket> {
    let mut chars = packet.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Pi42Error::Protocol("empty packet".to_string()))?;
    let rest = chars.as_str();

    match kind {
        '0' => Ok(EnginePacket::Open(parse_optional_json(rest)?.unwrap_or(Value::Null))),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => decode_socket_packet(rest).map(EnginePacket::Message),
        '6' => Ok(EnginePacket::Noop),
        other => Err(Pi42Error::Protocol(format!(
            "unknown engine packet type {other:?}"
        ))),
    }
}

fn decode_socket_packet(packet: &str) -> Result<SocketPacket> {
    let mut chars = packet.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Pi42Error::Protocol("empty socket packet".to_string()))?;
    let mut rest = chars.as_str();

    // Binary packets carry an attachment count: "51-..."
    if matches!(kind, '5' | '6') {
        rest = rest
            .split_once('-')
            .map(|(_, tail)| tail)
            .ok_or_else(|| Pi42Error::Protocol("binary packet without attachments".into()))?;
    }

    let (namespace, rest) = split_namespace(rest);
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match kind {
        '0' => Ok(SocketPacket::Connect {
            namespace,
            data: parse_optional_json(rest)?,
        }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' | '5' => {
            let args: Vec<Value> = serde_json::from_str(rest)?;
            let mut args = args.into_iter();
            let event = match args.next() {
                Some(Value::String(event)) => event,
                _ => return Err(Pi42Error::Protocol("event without a name".to_string())),
            };
            Ok(SocketPacket::Event {
                namespace,
                event,
                data: args.next().unwrap_or(Value::Null),
            })
        }
        '3' | '6' => Ok(SocketPacket::Ack { namespace }),
        '4' => {
            let message = match parse_optional_json(rest)? {
                Some(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_string(),
                Some(Value::String(message)) => message,
                _ => "connection refused".to_string(),
            };
            Ok(SocketPacket::ConnectError { namespace, message })
        }
        other => Err(Pi42Error::Protocol(format!(
            "unknown socket packet type {other:?}"
        ))),
    }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (ROOT_NAMESPACE.to_string(), rest);
    }
    match rest.split_once(',') {
        Some((namespace, tail)) => (namespace.to_string(), tail),
        None => (rest.to_string(), ""),
    }
}

fn parse_optional_json(rest: &str) -> Result<Option<Value>> {
    if rest.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(rest)?))
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == ROOT_NAMESPACE {
        String::new()
    } else {
        format!("{namespace},")
    }
}

/// `40` / `40/ns,`
pub fn encode_connect(namespace: &str) -> String {
    format!("40{}", namespace_prefix(namespace))
}

/// `41` / `41/ns,`
pub fn encode_disconnect(namespace: &str) -> String {
    format!("41{}", namespace_prefix(namespace))
}

/// `42/ns,["event",data]`
pub fn encode_event(namespace: &str, event: &str, data: &Value) -> Result<String> {
    let args = serde_json::to_string(&(event, data))?;
    Ok(format!("42{}{}", namespace_prefix(namespace), args))
}

/// Reply to a server ping
pub fn encode_pong() -> String {
    "3".to_string()
}

/// Longest silence tolerated after an open handshake: `pingInterval + pingTimeout`.
///
/// `None` when the server advertises neither value.
pub fn heartbeat_window(handshake: &Value) -> Option<Duration> {
    let millis = |field: &str| handshake.get(field).and_then(Value::as_u64);
    match (millis("pingInterval"), millis("pingTimeout")) {
        (None, None) => None,
        (interval, timeout) => Some(Duration::from_millis(
            interval.unwrap_or(0).saturating_add(timeout.unwrap_or(0)),
        )),
    }
}
