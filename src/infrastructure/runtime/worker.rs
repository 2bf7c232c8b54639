//! Async worker - runs in Tokio runtime and handles lookups and wallet calls

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, RuntimeServices};
use crate::infrastructure::wallet::{WalletError, WalletSigner};

/// Signers by session id. `None` marks a connection still in progress.
type Sessions = Arc<Mutex<HashMap<u64, Option<Arc<dyn WalletSigner>>>>>;

/// Run the async worker loop
pub async fn run_async_worker(
    services: RuntimeServices,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let sessions: Sessions = Arc::new(Mutex::new(HashMap::new()));

    loop {
        // Process commands (non-blocking)
        loop {
            let cmd = match cmd_rx.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            };
            match cmd {
                RuntimeCommand::Shutdown => return Ok(()),

                RuntimeCommand::LookupInterface {
                    request_id,
                    network,
                    address,
                    refresh,
                } => {
                    let source = Arc::clone(&services.source);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let event = match source.fetch(&network, &address, refresh).await {
                            Ok(fetched) => RuntimeEvent::InterfaceLoaded {
                                request_id,
                                network: network.name.clone(),
                                address,
                                abi_json: fetched.abi_json,
                                from_cache: fetched.from_cache,
                            },
                            Err(error) => {
                                tracing::warn!(%address, network = %network.name, %error, "lookup failed");
                                RuntimeEvent::LookupFailed {
                                    request_id,
                                    address,
                                    error,
                                }
                            }
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::ConnectWallet { session_id } => {
                    lock(&sessions).insert(session_id, None);
                    let connector = Arc::clone(&services.connector);
                    let sessions = Arc::clone(&sessions);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let event = match connector.connect().await {
                            Ok(signer) => {
                                let event = RuntimeEvent::WalletConnected {
                                    session_id,
                                    account: signer.account(),
                                    chain_id: signer.chain_id(),
                                    label: signer.label(),
                                };
                                let mut sessions = lock(&sessions);
                                match sessions.get_mut(&session_id) {
                                    Some(slot) => {
                                        *slot = Some(signer);
                                        event
                                    }
                                    // Dropped while connecting
                                    None => {
                                        tracing::debug!(session_id, "discarding stale wallet session");
                                        return;
                                    }
                                }
                            }
                            Err(error) => {
                                lock(&sessions).remove(&session_id);
                                tracing::warn!(session_id, %error, "wallet connect failed");
                                RuntimeEvent::WalletFailed { session_id, error }
                            }
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::DropSession { session_id } => {
                    if lock(&sessions).remove(&session_id).is_some() {
                        tracing::debug!(session_id, "wallet session dropped");
                    }
                }

                RuntimeCommand::Query {
                    session_id,
                    form,
                    call,
                } => {
                    let signer = session(&sessions, session_id);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let result = match signer {
                            Some(signer) => signer.query(&call).await,
                            None => Err(WalletError::SessionClosed),
                        };
                        let event = match result {
                            Ok(data) => RuntimeEvent::QueryReturned { form, data },
                            Err(error) => {
                                tracing::warn!(signature = %call.signature, %error, "query failed");
                                RuntimeEvent::QueryFailed { form, error }
                            }
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::Submit {
                    session_id,
                    form,
                    call,
                    network,
                } => {
                    let signer = session(&sessions, session_id);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let Some(signer) = signer else {
                            let _ = evt_tx.send(RuntimeEvent::TxFailed {
                                form,
                                error: WalletError::SessionClosed,
                            });
                            return;
                        };
                        let hash = match signer.submit(&call).await {
                            Ok(hash) => hash,
                            Err(error) => {
                                tracing::warn!(signature = %call.signature, %error, "submit failed");
                                let _ = evt_tx.send(RuntimeEvent::TxFailed { form, error });
                                return;
                            }
                        };
                        let hash_text = format!("{hash:#x}");
                        tracing::info!(signature = %call.signature, hash = %hash_text, "transaction submitted");
                        let _ = evt_tx.send(RuntimeEvent::TxSubmitted {
                            form,
                            hash: hash_text.clone(),
                            signature: call.signature.clone(),
                            to: call.to,
                            network,
                        });

                        let event = match signer.wait_confirmed(hash).await {
                            Ok(block_number) => RuntimeEvent::TxConfirmed {
                                form,
                                hash: hash_text,
                                block_number,
                            },
                            Err(error) => {
                                tracing::warn!(hash = %hash_text, %error, "confirmation failed");
                                RuntimeEvent::TxConfirmationFailed {
                                    form,
                                    hash: hash_text,
                                    error,
                                }
                            }
                        };
                        let _ = evt_tx.send(event);
                    });
                }
            }
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn lock(
    sessions: &Sessions,
) -> std::sync::MutexGuard<'_, HashMap<u64, Option<Arc<dyn WalletSigner>>>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn session(sessions: &Sessions, session_id: u64) -> Option<Arc<dyn WalletSigner>> {
    lock(sessions).get(&session_id).cloned().flatten()
}
