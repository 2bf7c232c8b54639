//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! This module provides a bridge between the synchronous TUI (ratatui) thread
//! and the asynchronous Tokio runtime that handles lookups and wallet calls.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use alloy::primitives::{Address, Bytes};
use tokio::runtime::Runtime;

use crate::domain::contract::PreparedCall;
use crate::domain::form::FormKey;
use crate::domain::network::Network;
use crate::infrastructure::lookup::{InterfaceSource, LookupError};
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::infrastructure::wallet::{WalletConnector, WalletError};

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Fetch an interface description
    LookupInterface {
        request_id: u64,
        network: Network,
        address: String,
        refresh: bool,
    },
    /// Request account access and keep the signer under `session_id`
    ConnectWallet { session_id: u64 },
    /// Forget a signer (address or interface list changed)
    DropSession { session_id: u64 },
    /// Run a read entry
    Query {
        session_id: u64,
        form: FormKey,
        call: PreparedCall,
    },
    /// Submit a write entry and wait for its receipt
    Submit {
        session_id: u64,
        form: FormKey,
        call: PreparedCall,
        network: Network,
    },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    InterfaceLoaded {
        request_id: u64,
        network: String,
        address: String,
        abi_json: String,
        from_cache: bool,
    },
    LookupFailed {
        request_id: u64,
        address: String,
        error: LookupError,
    },
    WalletConnected {
        session_id: u64,
        account: Address,
        chain_id: u64,
        label: String,
    },
    WalletFailed {
        session_id: u64,
        error: WalletError,
    },
    QueryReturned {
        form: FormKey,
        data: Bytes,
    },
    QueryFailed {
        form: FormKey,
        error: WalletError,
    },
    /// The signer accepted the transaction
    TxSubmitted {
        form: FormKey,
        hash: String,
        signature: String,
        to: Address,
        /// Network the call was sent on
        network: Network,
    },
    /// Submission failed; nothing was sent
    TxFailed {
        form: FormKey,
        error: WalletError,
    },
    TxConfirmed {
        form: FormKey,
        hash: String,
        block_number: Option<u64>,
    },
    /// Reverted receipt or receipt wait timed out
    TxConfirmationFailed {
        form: FormKey,
        hash: String,
        error: WalletError,
    },
    /// Error occurred
    Error { message: String },
}

/// The async collaborators the worker drives
#[derive(Clone)]
pub struct RuntimeServices {
    pub source: Arc<dyn InterfaceSource>,
    pub connector: Arc<dyn WalletConnector>,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(services: RuntimeServices) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = Runtime::new()?;
        thread::Builder::new()
            .name("callpad-runtime".to_string())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) = run_async_worker(services, cmd_rx, evt_tx.clone()).await {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<RuntimeEvent> {
        self.evt_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
