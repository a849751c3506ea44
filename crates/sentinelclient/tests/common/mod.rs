//! In-memory cluster used by the integration tests
//!
//! Nodes are addressed by `host:port` strings and scripted per test. The fake
//! records every dial, request and close so tests can assert on the exact
//! traffic the client generated.

#![allow(dead_code)]

use async_trait::async_trait;
use redis::Value;
use sentinelclient::{Connection, Connector, Result, SentinelError, Timeouts};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Node {
    /// Refuses connections
    Down,
    /// Accepts connections but never answers in time
    Hanging,
    /// Sentinel that knows one master (`None`: unknown master name)
    Sentinel(Option<(String, String)>),
    /// Sentinel that answers with a malformed address reply
    Garbled,
    /// Data node reporting the given role
    Data(String),
}

#[derive(Default)]
struct State {
    nodes: HashMap<String, Node>,
    dials: Vec<String>,
    requests: Vec<(String, Vec<String>)>,
    closed: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    request_delay: Arc<Mutex<Duration>>,
}

pub fn bulk(s: &str) -> Value {
    Value::BulkString(s.as_bytes().to_vec())
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, addr: &str, node: Node) -> &Self {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(addr.to_string(), node);
        self
    }

    pub fn sentinel(&self, addr: &str, master: &str) -> &Self {
        let (host, port) = master.rsplit_once(':').unwrap();
        self.set(
            addr,
            Node::Sentinel(Some((host.to_string(), port.to_string()))),
        )
    }

    pub fn data(&self, addr: &str, role: &str) -> &Self {
        self.set(addr, Node::Data(role.to_string()))
    }

    pub fn down(&self, addr: &str) -> &Self {
        self.set(addr, Node::Down)
    }

    /// Make every request sleep, widening the window for overlap
    pub fn with_request_delay(&self, delay: Duration) -> &Self {
        *self.request_delay.lock().unwrap() = delay;
        self
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            cluster: self.clone(),
        }
    }

    pub fn dials(&self) -> Vec<String> {
        self.state.lock().unwrap().dials.clone()
    }

    /// Addresses that received a request, in order
    pub fn requested(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    pub fn requests_to(&self, addr: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(a, _)| a == addr)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn closed(&self) -> Vec<String> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn node(&self, addr: &str) -> Option<Node> {
        self.state.lock().unwrap().nodes.get(addr).cloned()
    }

    fn answer(&self, addr: &str, args: &[&str]) -> Result<Value> {
        let node = self.node(addr).ok_or_else(|| {
            SentinelError::Io(std::io::ErrorKind::ConnectionReset.into())
        })?;

        match (node, args) {
            (Node::Down, _) => Err(SentinelError::Io(
                std::io::ErrorKind::ConnectionReset.into(),
            )),
            (Node::Hanging, _) => Err(SentinelError::Timeout {
                op: "reply",
                after: Duration::from_millis(100),
            }),
            (Node::Sentinel(master), ["SENTINEL", "get-master-addr-by-name", _]) => {
                Ok(match master {
                    Some((host, port)) => Value::Array(vec![bulk(&host), bulk(&port)]),
                    None => Value::Nil,
                })
            }
            (Node::Sentinel(_), ["ROLE"]) => Ok(Value::Array(vec![
                bulk("sentinel"),
                Value::Array(vec![]),
            ])),
            (Node::Garbled, ["SENTINEL", ..]) => Ok(Value::Array(vec![bulk("10.0.0.66")])),
            (Node::Data(role), ["ROLE"]) => Ok(Value::Array(vec![bulk(&role), Value::Int(0)])),
            (Node::Data(_), ["PING"]) => Ok(Value::SimpleString("PONG".into())),
            (_, other) => Err(SentinelError::UnexpectedReply(format!(
                "unknown command {:?}",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct FakeConnector {
    cluster: FakeCluster,
}

#[async_trait]
impl Connector for FakeConnector {
    type Conn = FakeConn;

    async fn connect(&self, addr: &str, timeouts: &Timeouts) -> Result<FakeConn> {
        assert!(!timeouts.connect.is_zero());
        self.cluster
            .state
            .lock()
            .unwrap()
            .dials
            .push(addr.to_string());

        match self.cluster.node(addr) {
            None | Some(Node::Down) => Err(SentinelError::Io(
                std::io::ErrorKind::ConnectionRefused.into(),
            )),
            Some(_) => Ok(FakeConn {
                addr: addr.to_string(),
                cluster: self.cluster.clone(),
            }),
        }
    }
}

pub struct FakeConn {
    addr: String,
    cluster: FakeCluster,
}

impl std::fmt::Debug for FakeConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeConn").field("addr", &self.addr).finish()
    }
}

impl FakeConn {
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Connection for FakeConn {
    async fn request(&mut self, args: &[&str]) -> Result<Value> {
        let now = self.cluster.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.cluster.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.cluster.request_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.cluster.state.lock().unwrap().requests.push((
            self.addr.clone(),
            args.iter().map(|s| s.to_string()).collect(),
        ));
        let reply = self.cluster.answer(&self.addr, args);

        self.cluster.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        if let Ok(mut state) = self.cluster.state.lock() {
            state.closed.push(self.addr.clone());
        }
    }
}

pub fn timeouts() -> Timeouts {
    Timeouts::uniform(Duration::from_millis(100))
}

pub fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}
