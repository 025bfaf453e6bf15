//! Worker thread that owns the async runtime and the session controller.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};
use session_core::{SessionController, WalletGateway};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Commands are handled one at a time in arrival order. The worker stops when the
/// command sender is dropped or the event receiver goes away.
pub fn launch(
    gateway: Arc<dyn WalletGateway>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let controller = SessionController::new(gateway);
            tracing::debug!("backend worker ready");

            while let Ok(cmd) = cmd_rx.recv() {
                let event = match cmd {
                    BackendCommand::Run(intent) => {
                        let intent_name = intent.name();
                        let outcome = controller.dispatch(intent).await;
                        UiEvent::from_outcome(intent_name, outcome, controller.snapshot())
                    }
                    BackendCommand::Status => UiEvent::Status(controller.snapshot()),
                };

                if ui_tx.send(event).is_err() {
                    tracing::debug!("event receiver dropped; stopping backend worker");
                    break;
                }
            }

            tracing::debug!("backend worker stopped");
        });
    })
}
