use super::*;
use crate::{
    error::FailureKind,
    gateway::{GatewayError, GatewayResult},
    intent::{IntentOutcome, SessionIntent},
    state::SessionPhase,
    validation::ValidationError,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared::{
    domain::AccountIndex,
    protocol::{
        AccountInfo, CreateWalletResponse, ImportWalletResponse, SignTransactionResponse,
        WalletInfo,
    },
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::{oneshot, Mutex as AsyncMutex};

const GENERATED_MNEMONIC: &str =
    "abandon ability able about above absent absorb abstract absurd abuse access accident";

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn words(count: usize) -> String {
    (1..=count)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct FakeState {
    wallets: BTreeMap<String, Vec<AccountInfo>>,
    current: Option<String>,
    last_mnemonic: Option<String>,
}

struct Gate {
    command: &'static str,
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// In-memory backend that behaves like the real command backend, with failure injection.
#[derive(Default)]
struct FakeBackend {
    state: AsyncMutex<FakeState>,
    calls: AsyncMutex<Vec<&'static str>>,
    failures: AsyncMutex<HashMap<&'static str, GatewayError>>,
    declines: AsyncMutex<HashSet<&'static str>>,
    blank_phrase: AtomicBool,
    gate: AsyncMutex<Option<Gate>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn with_wallet(self: Arc<Self>, name: &str, count: usize, selected: Option<usize>) -> Arc<Self> {
        let accounts = (0..count)
            .map(|i| account_info(name, i, selected == Some(i)))
            .collect();
        self.state
            .lock()
            .await
            .wallets
            .insert(name.to_string(), accounts);
        self
    }

    async fn set_accounts(&self, name: &str, accounts: Vec<AccountInfo>) {
        self.state
            .lock()
            .await
            .wallets
            .insert(name.to_string(), accounts);
    }

    async fn fail(&self, command: &'static str, reason: &str) {
        self.failures
            .lock()
            .await
            .insert(command, GatewayError::Rejected(reason.to_string()));
    }

    async fn decline(&self, command: &'static str) {
        self.declines.lock().await.insert(command);
    }

    fn withhold_recovery_phrase(&self) {
        self.blank_phrase.store(true, Ordering::SeqCst);
    }

    async fn gate(&self, command: &'static str) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().await = Some(Gate {
            command,
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    async fn last_mnemonic(&self) -> Option<String> {
        self.state.lock().await.last_mnemonic.clone()
    }

    async fn enter(&self, command: &'static str) -> GatewayResult<()> {
        self.calls.lock().await.push(command);

        let gate = {
            let mut gate = self.gate.lock().await;
            if gate.as_ref().map(|g| g.command) == Some(command) {
                gate.take()
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.await;
        }

        if let Some(err) = self.failures.lock().await.get(command) {
            return Err(err.clone());
        }
        Ok(())
    }

    async fn declined(&self, command: &'static str) -> bool {
        self.declines.lock().await.contains(command)
    }

    async fn current_accounts(&self) -> GatewayResult<(String, Vec<AccountInfo>)> {
        let state = self.state.lock().await;
        let name = state
            .current
            .clone()
            .ok_or_else(|| GatewayError::Rejected("No wallet loaded".to_string()))?;
        let accounts = state.wallets.get(&name).cloned().unwrap_or_default();
        Ok((name, accounts))
    }
}

fn account_info(wallet: &str, index: usize, is_selected: bool) -> AccountInfo {
    AccountInfo {
        address: format!("{wallet}-addr{index}"),
        public_key: format!("04{wallet}{index}"),
        is_selected,
        created_at: created_at(),
        index: None,
    }
}

#[async_trait]
impl WalletGateway for FakeBackend {
    async fn list_wallets(&self) -> GatewayResult<Vec<String>> {
        self.enter("list_wallets").await?;
        Ok(self.state.lock().await.wallets.keys().cloned().collect())
    }

    async fn create_wallet(&self, wallet_name: &str) -> GatewayResult<CreateWalletResponse> {
        self.enter("create_wallet").await?;
        if self.declined("create_wallet").await {
            return Ok(CreateWalletResponse {
                success: false,
                mnemonic: String::new(),
                address: String::new(),
                public_key: String::new(),
                message: "wallet name already taken".to_string(),
            });
        }

        let first = account_info(wallet_name, 0, true);
        let mut state = self.state.lock().await;
        state
            .wallets
            .insert(wallet_name.to_string(), vec![first.clone()]);
        state.current = Some(wallet_name.to_string());
        Ok(CreateWalletResponse {
            success: true,
            mnemonic: if self.blank_phrase.load(Ordering::SeqCst) {
                String::new()
            } else {
                GENERATED_MNEMONIC.to_string()
            },
            address: first.address,
            public_key: first.public_key,
            message: "Wallet created successfully".to_string(),
        })
    }

    async fn import_wallet(
        &self,
        wallet_name: &str,
        mnemonic: &str,
    ) -> GatewayResult<ImportWalletResponse> {
        self.enter("import_wallet").await?;
        let first = account_info(wallet_name, 0, true);
        let mut state = self.state.lock().await;
        state.last_mnemonic = Some(mnemonic.to_string());
        state
            .wallets
            .insert(wallet_name.to_string(), vec![first.clone()]);
        state.current = Some(wallet_name.to_string());
        Ok(ImportWalletResponse {
            success: true,
            address: first.address,
            public_key: first.public_key,
            total_accounts: 1,
            message: "Wallet imported successfully".to_string(),
        })
    }

    async fn load_wallet(&self, wallet_name: &str) -> GatewayResult<bool> {
        self.enter("load_wallet").await?;
        let mut state = self.state.lock().await;
        if !state.wallets.contains_key(wallet_name) {
            return Ok(false);
        }
        state.current = Some(wallet_name.to_string());
        Ok(true)
    }

    async fn list_accounts(&self) -> GatewayResult<Vec<AccountInfo>> {
        self.enter("list_accounts").await?;
        Ok(self.current_accounts().await?.1)
    }

    async fn get_wallet_info(&self) -> GatewayResult<Option<WalletInfo>> {
        self.enter("get_wallet_info").await?;
        if self.declined("get_wallet_info").await {
            return Ok(None);
        }
        let (_, accounts) = self.current_accounts().await?;
        Ok(Some(WalletInfo {
            total_accounts: accounts.len(),
            selected_account: accounts
                .iter()
                .find(|a| a.is_selected)
                .map(|a| a.address.clone()),
            created_at: created_at(),
            last_modified: created_at(),
        }))
    }

    async fn get_selected_account(&self) -> GatewayResult<Option<AccountInfo>> {
        self.enter("get_selected_account").await?;
        let (_, accounts) = self.current_accounts().await?;
        Ok(accounts.into_iter().find(|a| a.is_selected))
    }

    async fn select_account(&self, index: usize) -> GatewayResult<()> {
        self.enter("select_account").await?;
        let (name, _) = self.current_accounts().await?;
        let mut state = self.state.lock().await;
        let accounts = state.wallets.entry(name).or_default();
        if index >= accounts.len() {
            return Err(GatewayError::Rejected(
                "Account index out of bounds".to_string(),
            ));
        }
        for (i, account) in accounts.iter_mut().enumerate() {
            account.is_selected = i == index;
        }
        Ok(())
    }

    async fn add_account(&self, mnemonic: &str) -> GatewayResult<AccountInfo> {
        self.enter("add_account").await?;
        let (name, accounts) = self.current_accounts().await?;
        let mut state = self.state.lock().await;
        state.last_mnemonic = Some(mnemonic.to_string());
        let next = account_info(&name, accounts.len(), false);
        state.wallets.entry(name).or_default().push(next.clone());
        Ok(next)
    }

    async fn create_account(&self) -> GatewayResult<AccountInfo> {
        self.enter("create_account").await?;
        let (name, accounts) = self.current_accounts().await?;
        let next = account_info(&name, accounts.len(), false);
        self.state
            .lock()
            .await
            .wallets
            .entry(name)
            .or_default()
            .push(next.clone());
        Ok(next)
    }

    async fn sign_transaction(&self, data: &str) -> GatewayResult<SignTransactionResponse> {
        self.enter("sign_transaction").await?;
        if self.declined("sign_transaction").await {
            return Ok(SignTransactionResponse {
                success: false,
                signature: String::new(),
                message: "signing key locked".to_string(),
            });
        }
        let (_, accounts) = self.current_accounts().await?;
        if !accounts.iter().any(|a| a.is_selected) {
            return Err(GatewayError::Rejected("No account selected".to_string()));
        }
        Ok(SignTransactionResponse {
            success: true,
            signature: format!("sig-{data}"),
            message: "Transaction signed successfully".to_string(),
        })
    }
}

fn controller_for(backend: &Arc<FakeBackend>) -> SessionController {
    SessionController::new(backend.clone())
}

fn message_text(controller: &SessionController) -> String {
    controller
        .snapshot()
        .last_message
        .map(|m| m.text)
        .unwrap_or_default()
}

async fn opened(backend: &Arc<FakeBackend>, name: &str) -> SessionController {
    let controller = controller_for(backend);
    controller.open_wallet(name).await.expect("open wallet");
    controller
}

#[tokio::test]
async fn create_wallet_rejects_blank_names_without_gateway_call() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);

    for name in ["", "   ", "\t\n"] {
        let err = controller.create_wallet(name).await.expect_err("blank name");
        assert_eq!(err, SessionError::Validation(ValidationError::EmptyWalletName));
        assert!(!controller.is_busy());
    }

    assert!(backend.calls().await.is_empty());
    assert_eq!(message_text(&controller), "Please enter a wallet name");
}

#[tokio::test]
async fn create_wallet_hands_back_mnemonic_once_and_lists_the_new_wallet() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);

    let created = controller.create_wallet("alpha").await.expect("create");
    assert_eq!(created.mnemonic.as_str(), GENERATED_MNEMONIC);
    assert!(created.wallet_list_error.is_none());
    assert_eq!(backend.calls().await, vec!["create_wallet", "list_wallets"]);

    let snapshot = controller.snapshot();
    assert!(snapshot.wallets.contains(&"alpha".to_string()));
    assert!(!snapshot.busy);
    assert!(snapshot.mnemonic_input.is_none());
    let message = snapshot.last_message.clone().expect("message");
    assert!(!message.is_error());
    assert!(!message.text.contains("abandon"));
    assert!(!format!("{snapshot:?}").contains("abandon"));
    assert!(!format!("{created:?}").contains("abandon"));

    let listed = controller.refresh_wallet_list().await.expect("refresh");
    assert_eq!(listed, vec!["alpha".to_string()]);
}

#[tokio::test]
async fn create_wallet_surfaces_logical_failure_from_backend() {
    let backend = FakeBackend::new();
    backend.decline("create_wallet").await;
    let controller = controller_for(&backend);

    let err = controller.create_wallet("alpha").await.expect_err("declined");
    assert_eq!(err.kind(), FailureKind::Declined);
    assert_eq!(
        err.to_string(),
        "Failed to create wallet: wallet name already taken"
    );
    assert_eq!(backend.calls().await, vec!["create_wallet"]);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn create_wallet_without_recovery_phrase_is_declined() {
    let backend = FakeBackend::new();
    backend.withhold_recovery_phrase();
    let controller = controller_for(&backend);

    let err = controller.create_wallet("alpha").await.expect_err("no phrase");
    assert_eq!(err.kind(), FailureKind::Declined);
    assert_eq!(
        err.to_string(),
        "Failed to create wallet: backend returned an empty recovery phrase"
    );
    assert_eq!(backend.calls().await, vec!["create_wallet"]);

    let snapshot = controller.snapshot();
    assert!(snapshot.wallets.is_empty());
    assert!(!snapshot.busy);
    let message = snapshot.last_message.expect("message");
    assert!(message.is_error());
    assert!(!message.text.contains("Write down"));
}

#[tokio::test]
async fn create_wallet_reports_list_refresh_failure_without_failing() {
    let backend = FakeBackend::new();
    backend.fail("list_wallets", "index unreadable").await;
    let controller = controller_for(&backend);

    let created = controller.create_wallet("alpha").await.expect("create");
    assert!(created.wallet_list_error.is_some());
    let message = controller.snapshot().last_message.expect("message");
    assert!(message.is_error());
    assert!(message.text.contains("Error loading wallets: index unreadable"));
}

#[tokio::test]
async fn created_wallet_closes_another_open_wallet_view() {
    let backend = FakeBackend::new().with_wallet("alpha", 2, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    controller.create_wallet("beta").await.expect("create");

    let snapshot = controller.snapshot();
    assert!(snapshot.open_wallet.is_none());
    assert!(snapshot.accounts.is_empty());
    assert!(snapshot.summary.is_none());
}

#[tokio::test]
async fn import_wallet_skips_word_count_and_clears_draft_on_success() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);

    let imported = controller
        .import_wallet("alpha", "  three word phrase ")
        .await
        .expect("import");
    assert_eq!(imported.total_accounts, 1);
    assert_eq!(backend.last_mnemonic().await.as_deref(), Some("three word phrase"));
    assert_eq!(backend.calls().await, vec!["import_wallet", "list_wallets"]);

    let snapshot = controller.snapshot();
    assert!(snapshot.mnemonic_input.is_none());
    assert_eq!(snapshot.wallets, vec!["alpha".to_string()]);
}

#[tokio::test]
async fn import_wallet_keeps_draft_when_backend_rejects() {
    let backend = FakeBackend::new();
    backend.fail("import_wallet", "invalid checksum").await;
    let controller = controller_for(&backend);

    let err = controller
        .import_wallet("alpha", "bad phrase")
        .await
        .expect_err("rejected");
    assert_eq!(err.to_string(), "Error importing wallet: invalid checksum");

    let draft = controller.snapshot().mnemonic_input.expect("draft kept");
    assert_eq!(draft.expose(), "bad phrase");
}

#[tokio::test]
async fn import_wallet_requires_both_fields() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);

    let err = controller.import_wallet("alpha", "  ").await.expect_err("missing");
    assert_eq!(err, ValidationError::MissingImportFields.into());
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn open_wallet_with_no_accounts_populates_empty_view() {
    let backend = FakeBackend::new().with_wallet("alpha", 0, None).await;
    let controller = controller_for(&backend);

    let opened = controller.open_wallet("alpha").await.expect("open");
    assert!(opened.refresh.is_complete());
    assert_eq!(
        backend.calls().await,
        vec!["load_wallet", "list_accounts", "get_wallet_info"]
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.open_wallet.as_deref(), Some("alpha"));
    assert!(snapshot.accounts.is_empty());
    assert_eq!(snapshot.summary.expect("summary").total_accounts, 0);
    assert_eq!(snapshot.phase, SessionPhase::WalletOpen { selected: None });
    assert!(!snapshot.busy);
}

#[tokio::test]
async fn open_wallet_aborts_when_backend_cannot_load() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);

    let err = controller.open_wallet("ghost").await.expect_err("unknown wallet");
    assert_eq!(err.kind(), FailureKind::Declined);
    assert_eq!(err.to_string(), "Failed to load wallet");
    assert_eq!(backend.calls().await, vec!["load_wallet"]);

    let snapshot = controller.snapshot();
    assert!(snapshot.open_wallet.is_none());
    assert_eq!(snapshot.phase, SessionPhase::NoWallet);
}

#[tokio::test]
async fn open_wallet_rejection_is_reported_verbatim() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    backend.fail("load_wallet", "wallet file corrupted").await;
    let controller = controller_for(&backend);

    let err = controller.open_wallet("alpha").await.expect_err("rejected");
    assert_eq!(err.to_string(), "Error loading wallet: wallet file corrupted");
    assert!(controller.snapshot().open_wallet.is_none());
}

#[tokio::test]
async fn account_list_failure_keeps_wallet_open_and_still_loads_info() {
    let backend = FakeBackend::new().with_wallet("alpha", 2, Some(1)).await;
    backend.fail("list_accounts", "storage busy").await;
    let controller = controller_for(&backend);

    let opened = controller.open_wallet("alpha").await.expect("wallet open");
    assert!(opened.refresh.accounts.is_err());
    assert_eq!(opened.refresh.summary, Ok(2));
    assert_eq!(
        backend.calls().await,
        vec!["load_wallet", "list_accounts", "get_wallet_info"]
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.open_wallet.as_deref(), Some("alpha"));
    let message = snapshot.last_message.expect("message");
    assert!(message.is_error());
    assert!(message.text.contains("Error loading accounts: storage busy"));
}

#[tokio::test]
async fn wallet_info_failure_is_reported_separately() {
    let backend = FakeBackend::new().with_wallet("alpha", 3, Some(2)).await;
    backend.fail("get_wallet_info", "summary unavailable").await;
    let controller = controller_for(&backend);

    let opened = controller.open_wallet("alpha").await.expect("wallet open");
    assert_eq!(opened.refresh.accounts, Ok(3));
    assert!(opened.refresh.summary.is_err());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.accounts.len(), 3);
    let summary = snapshot.summary.expect("summary derived from accounts");
    assert_eq!(summary.total_accounts, 3);
    assert_eq!(summary.selected_account.as_deref(), Some("alpha-addr2"));
    assert!(snapshot
        .last_message
        .expect("message")
        .text
        .contains("Error loading wallet info: summary unavailable"));
}

#[tokio::test]
async fn absent_wallet_info_counts_as_a_failed_step() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    backend.decline("get_wallet_info").await;
    let controller = controller_for(&backend);

    let opened = controller.open_wallet("alpha").await.expect("wallet open");
    let err = opened.refresh.summary.expect_err("no info");
    assert_eq!(err.kind(), FailureKind::Declined);
}

#[tokio::test]
async fn inconsistent_account_list_is_refused_and_prior_view_kept() {
    let backend = FakeBackend::new().with_wallet("alpha", 2, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    backend
        .set_accounts(
            "alpha",
            vec![account_info("alpha", 0, true), account_info("alpha", 1, true)],
        )
        .await;
    let report = controller.refresh_wallet_view().await.expect("refresh ran");
    let err = report.accounts.expect_err("two selected");
    assert_eq!(
        err.to_string(),
        "Failed to load accounts: backend reported 2 selected accounts"
    );

    let snapshot = controller.snapshot();
    assert_eq!(
        snapshot.accounts.iter().filter(|a| a.is_selected).count(),
        1
    );
    assert_eq!(
        snapshot.summary.expect("summary").selected_account.as_deref(),
        Some("alpha-addr0")
    );
}

#[tokio::test]
async fn gapped_derivation_indices_keep_the_prior_view() {
    let backend = FakeBackend::new().with_wallet("alpha", 2, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    let indexed = |position: usize, index: u32| AccountInfo {
        index: Some(AccountIndex(index)),
        ..account_info("alpha", position, position == 0)
    };
    backend
        .set_accounts("alpha", vec![indexed(0, 0), indexed(1, 2)])
        .await;
    let report = controller.refresh_wallet_view().await.expect("refresh ran");
    let err = report.accounts.expect_err("gap");
    assert!(err.to_string().contains("skipped derivation index 1"));

    let snapshot = controller.snapshot();
    let indices: Vec<AccountIndex> = snapshot.accounts.iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![AccountIndex(0), AccountIndex(1)]);
}

#[tokio::test]
async fn close_wallet_clears_everything_from_any_state() {
    let backend = FakeBackend::new().with_wallet("alpha", 2, Some(0)).await;
    let controller = controller_for(&backend);

    controller.close_wallet().expect("close with nothing open");
    assert!(controller.snapshot().open_wallet.is_none());

    controller.open_wallet("alpha").await.expect("open");
    backend.fail("add_account", "derivation failed").await;
    let _ = controller.add_account_from_mnemonic(&words(12)).await;
    assert!(controller.snapshot().mnemonic_input.is_some());

    controller.close_wallet().expect("close");
    let snapshot = controller.snapshot();
    assert!(snapshot.open_wallet.is_none());
    assert!(snapshot.accounts.is_empty());
    assert!(snapshot.summary.is_none());
    assert!(snapshot.mnemonic_input.is_none());
    assert_eq!(snapshot.phase, SessionPhase::NoWallet);
    assert_eq!(
        backend.calls().await,
        vec!["load_wallet", "list_accounts", "get_wallet_info", "add_account"]
    );
}

#[tokio::test]
async fn select_account_moves_the_single_selection_flag() {
    let backend = FakeBackend::new().with_wallet("alpha", 3, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    let report = controller.select_account(2).await.expect("select");
    assert!(report.is_complete());
    assert_eq!(
        backend.calls().await[3..].to_vec(),
        vec!["select_account", "list_accounts", "get_wallet_info"]
    );

    let snapshot = controller.snapshot();
    assert!(!snapshot.accounts[0].is_selected);
    assert!(snapshot.accounts[2].is_selected);
    assert_eq!(
        snapshot.summary.expect("summary").selected_account.as_deref(),
        Some("alpha-addr2")
    );
    assert_eq!(
        snapshot.phase,
        SessionPhase::WalletOpen {
            selected: Some(AccountIndex(2))
        }
    );
}

#[tokio::test]
async fn repeated_selection_never_flags_two_accounts() {
    let backend = FakeBackend::new().with_wallet("alpha", 4, None).await;
    let controller = opened(&backend, "alpha").await;

    for index in [3, 0, 0, 2, 1, 3] {
        controller.select_account(index).await.expect("select");
        let snapshot = controller.snapshot();
        let flagged: Vec<_> = snapshot.accounts.iter().filter(|a| a.is_selected).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].index, AccountIndex(index as u32));
    }
}

#[tokio::test]
async fn out_of_range_selection_never_reaches_gateway() {
    let backend = FakeBackend::new().with_wallet("alpha", 3, Some(0)).await;
    let controller = opened(&backend, "alpha").await;
    let calls_before = backend.calls().await.len();

    for index in [3, 4, usize::MAX] {
        let err = controller.select_account(index).await.expect_err("out of range");
        assert_eq!(
            err,
            ValidationError::AccountIndexOutOfRange { index, len: 3 }.into()
        );
        assert!(!controller.is_busy());
    }

    assert_eq!(backend.calls().await.len(), calls_before);
}

#[tokio::test]
async fn wallet_bound_operations_fail_fast_without_open_wallet() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);
    let no_wallet: SessionError = ValidationError::NoWalletOpen.into();

    assert_eq!(controller.select_account(0).await.expect_err("select"), no_wallet);
    assert_eq!(
        controller
            .add_account_from_mnemonic(&words(12))
            .await
            .expect_err("add"),
        no_wallet
    );
    assert_eq!(controller.create_next_account().await.expect_err("create"), no_wallet);
    assert_eq!(controller.sign_transaction("deadbeef").await.expect_err("sign"), no_wallet);
    assert_eq!(controller.refresh_wallet_view().await.expect_err("refresh"), no_wallet);
    assert_eq!(controller.selected_account().await.expect_err("selected"), no_wallet);

    assert!(backend.calls().await.is_empty());
    assert_eq!(message_text(&controller), "No wallet is open");
}

#[tokio::test]
async fn select_rejection_leaves_prior_selection() {
    let backend = FakeBackend::new().with_wallet("alpha", 3, Some(1)).await;
    let controller = opened(&backend, "alpha").await;
    backend.fail("select_account", "keystore locked").await;

    let err = controller.select_account(2).await.expect_err("rejected");
    assert_eq!(err.to_string(), "Error selecting account: keystore locked");

    let snapshot = controller.snapshot();
    assert!(snapshot.accounts[1].is_selected);
    assert!(!snapshot.accounts[2].is_selected);
    assert!(!snapshot.busy);
}

#[tokio::test]
async fn thirteen_word_mnemonic_is_refused_before_the_gateway() {
    let backend = FakeBackend::new();
    let controller = controller_for(&backend);

    let err = controller
        .add_account_from_mnemonic(&words(13))
        .await
        .expect_err("13 words");
    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(
        message_text(&controller),
        "Invalid mnemonic word count: 13. Must be 12, 15, 18, 21, or 24 words."
    );
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn mnemonic_reaches_gateway_only_for_accepted_word_counts() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    for count in [0, 1, 11, 12, 13, 15, 16, 18, 21, 23, 24, 25] {
        let before = backend.calls().await.len();
        let result = controller.add_account_from_mnemonic(&words(count)).await;
        let reached = backend.calls().await[before..].contains(&"add_account");
        let accepted = [12, 15, 18, 21, 24].contains(&count);
        assert_eq!(reached, accepted, "word count {count}");
        if !accepted {
            let err = result.expect_err("rejected count");
            if count > 0 {
                assert!(err.to_string().contains(&count.to_string()));
            }
        }
    }
}

#[tokio::test]
async fn added_account_refreshes_view_and_clears_draft() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;
    let phrase = format!("  {}  ", words(24));

    let report = controller
        .add_account_from_mnemonic(&phrase)
        .await
        .expect("add");
    assert_eq!(report.accounts, Ok(2));
    assert_eq!(backend.last_mnemonic().await, Some(words(24)));

    let snapshot = controller.snapshot();
    assert!(snapshot.mnemonic_input.is_none());
    assert_eq!(snapshot.summary.expect("summary").total_accounts, 2);
    assert_eq!(
        message_text(&controller),
        "Account alpha-addr1 added successfully"
    );
}

#[tokio::test]
async fn failed_account_add_preserves_draft_for_correction() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;
    backend.fail("add_account", "unknown word 'word3'").await;

    let err = controller
        .add_account_from_mnemonic(&words(12))
        .await
        .expect_err("rejected");
    assert_eq!(err.to_string(), "Error adding account: unknown word 'word3'");

    let snapshot = controller.snapshot();
    assert_eq!(
        snapshot.mnemonic_input.expect("draft").expose(),
        words(12)
    );
    assert_eq!(snapshot.accounts.len(), 1);
}

#[tokio::test]
async fn created_account_takes_next_derivation_index() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    controller.create_next_account().await.expect("create account");

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.accounts.len(), 2);
    assert_eq!(snapshot.accounts[1].index, AccountIndex(1));
    assert_eq!(snapshot.accounts[1].derivation_path(), "m/44'/55555'/0'/0/1");
    assert!(!snapshot.accounts[1].is_selected);
    assert_eq!(
        message_text(&controller),
        "Account alpha-addr1 created successfully"
    );
}

#[tokio::test]
async fn signature_is_stored_then_cleared_by_a_failed_signing() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    let signature = controller.sign_transaction(" 0xdeadbeef ").await.expect("sign");
    assert_eq!(signature, "sig-0xdeadbeef");
    assert_eq!(controller.snapshot().signature.as_deref(), Some("sig-0xdeadbeef"));

    backend.fail("sign_transaction", "Odd number of digits").await;
    let err = controller.sign_transaction("abc").await.expect_err("bad hex");
    assert_eq!(err.to_string(), "Error signing transaction: Odd number of digits");
    assert!(controller.snapshot().signature.is_none());
}

#[tokio::test]
async fn declined_signing_clears_stale_signature() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;
    controller.sign_transaction("00").await.expect("sign");

    backend.decline("sign_transaction").await;
    let err = controller.sign_transaction("01").await.expect_err("declined");
    assert_eq!(err.to_string(), "Failed to sign transaction: signing key locked");
    assert!(controller.snapshot().signature.is_none());
}

#[tokio::test]
async fn blank_transaction_data_is_a_validation_error() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;
    let calls_before = backend.calls().await.len();

    let err = controller.sign_transaction("   ").await.expect_err("blank");
    assert_eq!(err, ValidationError::EmptyTransactionData.into());
    assert_eq!(backend.calls().await.len(), calls_before);
}

#[tokio::test]
async fn wallet_list_failure_keeps_prior_list() {
    let backend = FakeBackend::new().with_wallet("alpha", 0, None).await;
    let controller = controller_for(&backend);
    controller.refresh_wallet_list().await.expect("first load");

    backend.fail("list_wallets", "permission denied").await;
    let err = controller.refresh_wallet_list().await.expect_err("rejected");
    assert_eq!(err.kind(), FailureKind::Rejected);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.wallets, vec!["alpha".to_string()]);
    assert_eq!(
        snapshot.last_message.expect("message").text,
        "Error loading wallets: permission denied"
    );
}

#[tokio::test]
async fn intents_arriving_while_busy_are_rejected() {
    let backend = FakeBackend::new().with_wallet("alpha", 0, None).await;
    let controller = Arc::new(controller_for(&backend));
    let (entered, release) = backend.gate("list_wallets").await;

    let in_flight = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.refresh_wallet_list().await })
    };
    entered.await.expect("gateway entered");

    assert!(controller.is_busy());
    assert!(controller.snapshot().busy);
    assert_eq!(
        controller.create_wallet("beta").await.expect_err("busy"),
        SessionError::Busy
    );
    assert_eq!(controller.close_wallet().expect_err("busy"), SessionError::Busy);
    assert_eq!(backend.calls().await, vec!["list_wallets"]);

    release.send(()).expect("release gateway");
    let wallets = in_flight.await.expect("join").expect("refresh");
    assert_eq!(wallets, vec!["alpha".to_string()]);
    assert!(!controller.is_busy());
    assert_eq!(message_text(&controller), "Wallets loaded successfully");
}

#[tokio::test]
async fn selected_account_resolves_against_cached_list() {
    let backend = FakeBackend::new().with_wallet("alpha", 3, Some(1)).await;
    let controller = opened(&backend, "alpha").await;

    let selected = controller
        .selected_account()
        .await
        .expect("query")
        .expect("an account is selected");
    assert_eq!(selected.index, AccountIndex(1));
    assert_eq!(selected.address, "alpha-addr1");
    assert_eq!(message_text(&controller), "Selected account: alpha-addr1");
}

#[tokio::test]
async fn dispatch_routes_intents_to_operations() {
    let backend = FakeBackend::new().with_wallet("alpha", 3, Some(0)).await;
    let controller = controller_for(&backend);

    match controller
        .dispatch(SessionIntent::OpenWallet {
            name: "alpha".to_string(),
        })
        .await
    {
        IntentOutcome::WalletOpened(opened) => assert_eq!(opened.name.as_str(), "alpha"),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let outcome = controller
        .dispatch(SessionIntent::SelectAccount { index: 9 })
        .await;
    assert!(outcome.error().expect("failed").is_validation());

    match controller.dispatch(SessionIntent::CloseWallet).await {
        IntentOutcome::WalletClosed => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(controller.snapshot().open_wallet.is_none());
}

#[test]
fn intent_debug_output_redacts_mnemonics() {
    let intent = SessionIntent::ImportWallet {
        name: "alpha".to_string(),
        mnemonic: Zeroizing::new(GENERATED_MNEMONIC.to_string()),
    };
    let rendered = format!("{intent:?}");
    assert!(rendered.contains("alpha"));
    assert!(!rendered.contains("abandon"));
    assert_eq!(intent.name(), "import_wallet");
}

#[tokio::test]
async fn dispatched_mnemonic_reaches_the_gateway_intact() {
    let backend = FakeBackend::new().with_wallet("alpha", 1, Some(0)).await;
    let controller = opened(&backend, "alpha").await;

    let outcome = controller
        .dispatch(SessionIntent::AddAccountFromMnemonic {
            mnemonic: Zeroizing::new(words(12)),
        })
        .await;
    assert!(matches!(outcome, IntentOutcome::AccountAdded(_)));
    assert_eq!(backend.last_mnemonic().await, Some(words(12)));

    let outcome = controller
        .dispatch(SessionIntent::ImportWallet {
            name: "beta".to_string(),
            mnemonic: Zeroizing::new(GENERATED_MNEMONIC.to_string()),
        })
        .await;
    assert!(matches!(outcome, IntentOutcome::WalletImported(_)));
    assert_eq!(
        backend.last_mnemonic().await.as_deref(),
        Some(GENERATED_MNEMONIC)
    );
}
