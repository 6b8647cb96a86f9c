//! # Local Node
//!
//! In-process stand-in for a consensus node. `start` loads the genesis,
//! initializes the application, binds the P2P and RPC listeners and spawns
//! three tasks:
//!
//! - P2P accept loop: handshake with inbound peers
//! - Dialer: connect to every persistent peer, with retries
//! - RPC loop: answer each connection with one JSON status line
//!
//! Every task selects on a `watch` shutdown channel. Per-peer connection
//! tasks live in a `JoinSet` owned by the running node; `stop` and drop
//! abort them along with the listener tasks.
//!
//! ## Handshake
//!
//! Both sides write one JSON line `{"node_id","chain_id"}` and read the
//! other's. A peer on another chain, or with a node id other than the one
//! dialed, is disconnected.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::app::Application;
use crate::config::{parse_listen_address, NodeConfig, P2pConfig, PeerAddress};
use crate::errors::{BootstrapError, BootstrapResult};
use crate::genesis::GenesisProvider;
use crate::keys::{FilePrivValidator, NodeKey};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const DIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Consensus engine as seen by the bootstrapper.
#[async_trait]
pub trait ConsensusNode: Send + Sync {
    async fn start(&mut self) -> BootstrapResult<()>;

    async fn stop(&mut self) -> BootstrapResult<()>;

    /// Realized `{node_id}@{ip}:{port}`, once started.
    fn p2p_address(&self) -> Option<PeerAddress>;

    fn rpc_address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    fn node_id(&self) -> String;

    /// Node ids of currently connected peers.
    fn peers(&self) -> Vec<String>;
}

/// Answer of the RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub chain_id: String,
    pub moniker: String,
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Handshake {
    node_id: String,
    chain_id: String,
}

/// Connected peers by node id.
type PeerTable = Arc<RwLock<BTreeMap<String, SocketAddr>>>;

/// Handshake-and-hold tasks, one per peer connection.
type ConnectionSet = Arc<Mutex<JoinSet<()>>>;

#[derive(Clone)]
struct NetContext {
    ours: Handshake,
    moniker: String,
    p2p: P2pConfig,
    peers: PeerTable,
    connections: ConnectionSet,
}

struct RunningState {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    connections: ConnectionSet,
    p2p: SocketAddr,
    rpc: SocketAddr,
}

impl RunningState {
    fn halt(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

impl Drop for RunningState {
    fn drop(&mut self) {
        self.halt();
        for task in &self.tasks {
            task.abort();
        }
        self.connections.lock().abort_all();
    }
}

pub struct LocalNode {
    config: NodeConfig,
    priv_validator: FilePrivValidator,
    node_key: NodeKey,
    app: Arc<dyn Application>,
    provider: GenesisProvider,
    peers: PeerTable,
    initialized: bool,
    running: Option<RunningState>,
}

impl LocalNode {
    pub fn new(
        config: NodeConfig,
        priv_validator: FilePrivValidator,
        node_key: NodeKey,
        app: Arc<dyn Application>,
        provider: GenesisProvider,
    ) -> Self {
        Self {
            config,
            priv_validator,
            node_key,
            app,
            provider,
            peers: Arc::new(RwLock::new(BTreeMap::new())),
            initialized: false,
            running: None,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn app(&self) -> &Arc<dyn Application> {
        &self.app
    }

    async fn bind(service: &'static str, address: &str) -> BootstrapResult<TcpListener> {
        let addr = parse_listen_address(address)?;
        TcpListener::bind(addr)
            .await
            .map_err(|source| BootstrapError::Bind {
                service,
                address: address.to_string(),
                source,
            })
    }

    fn local_addr(service: &'static str, listener: &TcpListener) -> BootstrapResult<SocketAddr> {
        listener.local_addr().map_err(|source| BootstrapError::Bind {
            service,
            address: "local".to_string(),
            source,
        })
    }
}

#[async_trait]
impl ConsensusNode for LocalNode {
    async fn start(&mut self) -> BootstrapResult<()> {
        if self.running.is_some() {
            return Err(BootstrapError::AlreadyStarted);
        }

        let persistent_peers = self
            .config
            .p2p
            .persistent_peers
            .iter()
            .map(|entry| PeerAddress::parse(entry))
            .collect::<BootstrapResult<Vec<_>>>()?;

        let genesis = (self.provider)()?;
        if !self.initialized {
            let in_set = genesis
                .consensus
                .validators
                .iter()
                .any(|v| v.address == self.priv_validator.address());
            if !in_set {
                warn!(
                    moniker = %self.config.moniker,
                    address = %self.priv_validator.address(),
                    "Priv validator is not in the genesis validator set"
                );
            }
            self.app.init_chain(&genesis)?;
            self.initialized = true;
        }

        let p2p_listener = Self::bind("p2p", &self.config.p2p.listen_address).await?;
        let rpc_listener = Self::bind("rpc", &self.config.rpc.listen_address).await?;
        let p2p = Self::local_addr("p2p", &p2p_listener)?;
        let rpc = Self::local_addr("rpc", &rpc_listener)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let connections: ConnectionSet = Arc::new(Mutex::new(JoinSet::new()));
        let ctx = NetContext {
            ours: Handshake {
                node_id: self.node_key.id(),
                chain_id: genesis.chain_id.clone(),
            },
            moniker: self.config.moniker.clone(),
            p2p: self.config.p2p.clone(),
            peers: Arc::clone(&self.peers),
            connections: Arc::clone(&connections),
        };

        let tasks = vec![
            tokio::spawn(accept_peers(p2p_listener, ctx.clone(), shutdown_rx.clone())),
            tokio::spawn(dial_peers(persistent_peers, ctx.clone(), shutdown_rx.clone())),
            tokio::spawn(serve_rpc(rpc_listener, ctx, shutdown_rx)),
        ];

        info!(
            moniker = %self.config.moniker,
            node_id = %self.node_key.id(),
            p2p = %p2p,
            rpc = %rpc,
            "Node started"
        );

        self.running = Some(RunningState {
            shutdown_tx,
            tasks,
            connections,
            p2p,
            rpc,
        });
        Ok(())
    }

    async fn stop(&mut self) -> BootstrapResult<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        running.halt();
        for task in running.tasks.drain(..) {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(moniker = %self.config.moniker, error = %e, "Node task failed");
                }
            }
        }
        // listeners are gone, so nothing can add a connection from here on
        let mut connections = std::mem::take(&mut *running.connections.lock());
        connections.shutdown().await;
        self.peers.write().clear();

        info!(moniker = %self.config.moniker, "Node stopped");
        Ok(())
    }

    fn p2p_address(&self) -> Option<PeerAddress> {
        self.running.as_ref().map(|r| PeerAddress {
            node_id: self.node_key.id(),
            address: r.p2p,
        })
    }

    fn rpc_address(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.rpc)
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn node_id(&self) -> String {
        self.node_key.id()
    }

    fn peers(&self) -> Vec<String> {
        self.peers.read().keys().cloned().collect()
    }
}

// =============================================================================
// P2P
// =============================================================================

type PeerLines = Lines<BufReader<OwnedReadHalf>>;

async fn handshake(
    stream: TcpStream,
    ours: &Handshake,
) -> BootstrapResult<(Handshake, PeerLines, OwnedWriteHalf)> {
    let remote = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let reject = |reason: String| BootstrapError::Peer {
        address: remote.clone(),
        reason,
    };

    let (read, mut write) = stream.into_split();
    let mut line = serde_json::to_vec(ours).map_err(|e| reject(e.to_string()))?;
    line.push(b'\n');
    write
        .write_all(&line)
        .await
        .map_err(|e| reject(e.to_string()))?;

    let mut lines = BufReader::new(read).lines();
    let theirs = tokio::time::timeout(HANDSHAKE_TIMEOUT, lines.next_line())
        .await
        .map_err(|_| reject("handshake timed out".to_string()))?
        .map_err(|e| reject(e.to_string()))?
        .ok_or_else(|| reject("closed during handshake".to_string()))?;
    let theirs: Handshake = serde_json::from_str(&theirs).map_err(|e| reject(e.to_string()))?;

    if theirs.chain_id != ours.chain_id {
        return Err(reject(format!("peer is on chain {:?}", theirs.chain_id)));
    }
    if theirs.node_id == ours.node_id {
        return Err(reject("connected to self".to_string()));
    }
    Ok((theirs, lines, write))
}

/// Keep a handshaken connection until EOF or shutdown, then forget the peer.
async fn hold_peer(
    node_id: String,
    mut lines: PeerLines,
    _write: OwnedWriteHalf,
    peers: PeerTable,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.next_line() => match line {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            },
        }
    }
    peers.write().remove(&node_id);
    debug!(peer = %node_id, "Peer disconnected");
}

fn has_peer_on_ip(peers: &PeerTable, ip: IpAddr) -> bool {
    peers.read().values().any(|addr| addr.ip() == ip)
}

async fn accept_peers(listener: TcpListener, ctx: NetContext, mut shutdown: watch::Receiver<bool>) {
    loop {
        let (stream, remote) = tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(moniker = %ctx.moniker, error = %e, "P2P accept failed");
                    continue;
                }
            },
        };

        if !ctx.p2p.allow_duplicate_ip && has_peer_on_ip(&ctx.peers, remote.ip()) {
            debug!(moniker = %ctx.moniker, remote = %remote, "Rejected duplicate IP");
            continue;
        }

        let task_ctx = ctx.clone();
        let shutdown = shutdown.clone();
        ctx.connections.lock().spawn(async move {
            let ctx = task_ctx;
            match handshake(stream, &ctx.ours).await {
                Ok((theirs, lines, write)) => {
                    ctx.peers.write().insert(theirs.node_id.clone(), remote);
                    info!(moniker = %ctx.moniker, peer = %theirs.node_id, "Inbound peer connected");
                    hold_peer(theirs.node_id, lines, write, ctx.peers, shutdown).await;
                }
                Err(e) => debug!(moniker = %ctx.moniker, error = %e, "Inbound handshake failed"),
            }
        });
    }
    debug!(moniker = %ctx.moniker, "P2P listener stopped");
}

/// Loopback, private, link-local and unspecified addresses are not routable.
fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified())
        }
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
    }
}

async fn dial(peer: &PeerAddress, ctx: &NetContext) -> BootstrapResult<(PeerLines, OwnedWriteHalf)> {
    let mut last_error = None;
    for attempt in 1..=ctx.p2p.dial_attempts.max(1) {
        match tokio::time::timeout(ctx.p2p.dial_timeout, TcpStream::connect(peer.address)).await {
            Ok(Ok(stream)) => {
                let (theirs, lines, write) = handshake(stream, &ctx.ours).await?;
                if theirs.node_id != peer.node_id {
                    return Err(BootstrapError::Peer {
                        address: peer.to_string(),
                        reason: format!("answered as node {}", theirs.node_id),
                    });
                }
                return Ok((lines, write));
            }
            Ok(Err(e)) => last_error = Some(e.to_string()),
            Err(_) => last_error = Some("dial timed out".to_string()),
        }
        debug!(peer = %peer, attempt, "Dial failed, retrying");
        tokio::time::sleep(DIAL_BACKOFF * attempt).await;
    }
    Err(BootstrapError::Peer {
        address: peer.to_string(),
        reason: last_error.unwrap_or_else(|| "no dial attempts".to_string()),
    })
}

async fn dial_peers(peers: Vec<PeerAddress>, ctx: NetContext, shutdown: watch::Receiver<bool>) {
    for peer in peers {
        if ctx.p2p.addr_book_strict && !is_routable(peer.address.ip()) {
            warn!(moniker = %ctx.moniker, peer = %peer, "Skipping non-routable peer");
            continue;
        }

        let task_ctx = ctx.clone();
        let mut shutdown = shutdown.clone();
        ctx.connections.lock().spawn(async move {
            let ctx = task_ctx;
            let dialed = tokio::select! {
                _ = shutdown.changed() => return,
                dialed = dial(&peer, &ctx) => dialed,
            };
            match dialed {
                Ok((lines, write)) => {
                    ctx.peers.write().insert(peer.node_id.clone(), peer.address);
                    info!(moniker = %ctx.moniker, peer = %peer, "Outbound peer connected");
                    hold_peer(peer.node_id, lines, write, ctx.peers, shutdown).await;
                }
                Err(e) => warn!(moniker = %ctx.moniker, error = %e, "Persistent peer unreachable"),
            }
        });
    }
}

// =============================================================================
// RPC
// =============================================================================

async fn serve_rpc(listener: TcpListener, ctx: NetContext, mut shutdown: watch::Receiver<bool>) {
    loop {
        let mut stream = tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(moniker = %ctx.moniker, error = %e, "RPC accept failed");
                    continue;
                }
            },
        };

        let status = NodeStatus {
            node_id: ctx.ours.node_id.clone(),
            chain_id: ctx.ours.chain_id.clone(),
            moniker: ctx.moniker.clone(),
            peers: ctx.peers.read().keys().cloned().collect(),
        };
        let mut line = match serde_json::to_vec(&status) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode status");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(e) = stream.write_all(&line).await {
            debug!(error = %e, "RPC client went away");
        }
    }
    debug!(moniker = %ctx.moniker, "RPC listener stopped");
}
