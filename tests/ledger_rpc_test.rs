//! JSON-RPC ledger client tests against a mocked node.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use evidence_vault::ledger::{
    Bytecode, EvidenceHash, JsonRpcLedger, LedgerClient, LedgerError, VaultReference,
};
use evidence_vault::workflow::VaultSession;

const VAULT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const SENDER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const TX: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

async fn rpc(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })),
        )
        .mount(server)
        .await;
}

async fn rpc_error(server: &MockServer, rpc_method: &str, code: i64, message: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        })))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> JsonRpcLedger {
    JsonRpcLedger::new(server.uri(), Duration::from_secs(2))
        .unwrap()
        .with_confirmation(Duration::from_millis(400), Duration::from_millis(20))
}

fn vault() -> VaultReference {
    VaultReference::parse(VAULT).unwrap()
}

fn timestamp_word(seconds: u64) -> String {
    format!("0x{}{:016x}", "00".repeat(24), seconds)
}

#[tokio::test]
async fn test_is_connected() {
    let server = MockServer::start().await;
    rpc(&server, "web3_clientVersion", json!("HardhatNetwork/2.22.0")).await;
    assert!(client(&server).is_connected().await);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_offline() {
    let ledger = JsonRpcLedger::new("http://127.0.0.1:1".to_string(), Duration::from_millis(500))
        .unwrap();
    assert!(!ledger.is_connected().await);
}

#[tokio::test]
async fn test_sender_defaults_to_first_account() {
    let server = MockServer::start().await;
    rpc(&server, "eth_accounts", json!([SENDER, "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"])).await;
    assert_eq!(client(&server).sender_account().await.unwrap(), SENDER);
}

#[tokio::test]
async fn test_no_accounts() {
    let server = MockServer::start().await;
    rpc(&server, "eth_accounts", json!([])).await;
    assert!(matches!(
        client(&server).sender_account().await,
        Err(LedgerError::NoAccounts)
    ));
}

#[tokio::test]
async fn test_has_code() {
    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x")).await;
    assert!(!client(&server).has_code(&vault()).await.unwrap());

    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x6080604052")).await;
    assert!(client(&server).has_code(&vault()).await.unwrap());
}

#[tokio::test]
async fn test_anchor_confirmed() {
    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x6080604052")).await;
    rpc(&server, "eth_accounts", json!([SENDER])).await;
    rpc(&server, "eth_sendTransaction", json!(TX)).await;
    rpc(
        &server,
        "eth_getTransactionReceipt",
        json!({ "transactionHash": TX, "blockNumber": "0x2", "status": "0x1" }),
    )
    .await;

    let tx_id = client(&server)
        .anchor(&vault(), &EvidenceHash::new("deadbeef"))
        .await
        .unwrap();
    assert_eq!(tx_id.as_str(), TX);
}

#[tokio::test]
async fn test_anchor_reverted() {
    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x6080604052")).await;
    rpc(&server, "eth_accounts", json!([SENDER])).await;
    rpc(&server, "eth_sendTransaction", json!(TX)).await;
    rpc(
        &server,
        "eth_getTransactionReceipt",
        json!({ "transactionHash": TX, "blockNumber": "0x2", "status": "0x0" }),
    )
    .await;

    let result = client(&server)
        .anchor(&vault(), &EvidenceHash::new("deadbeef"))
        .await;
    assert!(matches!(result, Err(LedgerError::Reverted { ref tx_id }) if tx_id == TX));
}

#[tokio::test]
async fn test_anchor_without_code_is_not_submitted() {
    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x")).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_sendTransaction" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": TX })))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server)
        .anchor(&vault(), &EvidenceHash::new("deadbeef"))
        .await;
    assert!(matches!(result, Err(LedgerError::NoContractCode(_))));
}

#[tokio::test]
async fn test_anchor_confirmation_timeout() {
    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x6080604052")).await;
    rpc(&server, "eth_accounts", json!([SENDER])).await;
    rpc(&server, "eth_sendTransaction", json!(TX)).await;
    rpc(&server, "eth_getTransactionReceipt", Value::Null).await;

    let result = client(&server)
        .anchor(&vault(), &EvidenceHash::new("deadbeef"))
        .await;
    match result {
        Err(LedgerError::ConfirmationTimeout { tx_id, waited }) => {
            assert_eq!(tx_id, TX);
            assert_eq!(waited, Duration::from_millis(400));
        }
        other => panic!("expected a confirmation timeout, got {:?}", other),
    }
}

/// A node that holds `eth_sendTransaction` open for `delay`, the way an
/// automining node answers only after mining.
async fn slow_submission(server: &MockServer, delay: Duration) {
    rpc(server, "web3_clientVersion", json!("HardhatNetwork/2.22.0")).await;
    rpc(server, "eth_getCode", json!("0x6080604052")).await;
    rpc(server, "eth_accounts", json!([SENDER])).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_sendTransaction" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": TX }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
    rpc(
        server,
        "eth_getTransactionReceipt",
        json!({ "transactionHash": TX, "blockNumber": "0x2", "status": "0x1" }),
    )
    .await;
}

#[tokio::test]
async fn test_unanswered_submission_is_outcome_unknown() {
    let server = MockServer::start().await;
    slow_submission(&server, Duration::from_secs(3)).await;

    let ledger = JsonRpcLedger::new(server.uri(), Duration::from_millis(200))
        .unwrap()
        .with_confirmation(Duration::from_millis(600), Duration::from_millis(20));

    let result = ledger.anchor(&vault(), &EvidenceHash::new("deadbeef")).await;
    assert!(matches!(
        result,
        Err(LedgerError::SubmissionTimeout { waited }) if waited == Duration::from_millis(600)
    ));

    let mut session = VaultSession::new(Some(vault()), 16);
    let err = session
        .submit_anchor(&ledger, &EvidenceHash::new("deadbeef"))
        .await
        .unwrap_err();
    assert!(err.is_outcome_unknown(), "{:?}", err);
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_slow_submission_within_confirmation_budget() {
    let server = MockServer::start().await;
    slow_submission(&server, Duration::from_millis(500)).await;

    let ledger = JsonRpcLedger::new(server.uri(), Duration::from_millis(200))
        .unwrap()
        .with_confirmation(Duration::from_secs(3), Duration::from_millis(20));

    let tx_id = ledger
        .anchor(&vault(), &EvidenceHash::new("deadbeef"))
        .await
        .unwrap();
    assert_eq!(tx_id.as_str(), TX);
}

#[tokio::test]
async fn test_send_rejected_by_node() {
    let server = MockServer::start().await;
    rpc(&server, "eth_getCode", json!("0x6080604052")).await;
    rpc(&server, "eth_accounts", json!([SENDER])).await;
    rpc_error(&server, "eth_sendTransaction", -32000, "sender doesn't have enough funds").await;

    let result = client(&server)
        .anchor(&vault(), &EvidenceHash::new("deadbeef"))
        .await;
    assert!(matches!(result, Err(LedgerError::Rpc { code: -32000, .. })));
}

#[tokio::test]
async fn test_verify_decodes_timestamp() {
    let server = MockServer::start().await;
    rpc(&server, "eth_call", json!(timestamp_word(1_717_000_000))).await;

    let result = client(&server)
        .verify(&vault(), &EvidenceHash::new("deadbeef"))
        .await
        .unwrap();
    assert!(result.found);
    assert_eq!(result.anchored_at.unwrap().timestamp(), 1_717_000_000);
}

#[tokio::test]
async fn test_verify_zero_is_not_found() {
    let server = MockServer::start().await;
    rpc(&server, "eth_call", json!(timestamp_word(0))).await;

    let result = client(&server)
        .verify(&vault(), &EvidenceHash::new("never-anchored"))
        .await
        .unwrap();
    assert!(!result.found);
    assert!(result.anchored_at.is_none());
}

#[tokio::test]
async fn test_verify_empty_return_means_no_contract() {
    let server = MockServer::start().await;
    rpc(&server, "eth_call", json!("0x")).await;

    let result = client(&server)
        .verify(&vault(), &EvidenceHash::new("deadbeef"))
        .await;
    assert!(matches!(result, Err(LedgerError::NoContractCode(_))));
}

#[tokio::test]
async fn test_deploy_returns_contract_address() {
    let server = MockServer::start().await;
    rpc(&server, "eth_sendTransaction", json!(TX)).await;
    rpc(
        &server,
        "eth_getTransactionReceipt",
        json!({
            "transactionHash": TX,
            "blockNumber": "0x1",
            "status": "0x1",
            "contractAddress": VAULT
        }),
    )
    .await;

    let ledger = client(&server).with_sender(Some(SENDER.to_string()));
    let deployment = ledger
        .deploy_vault(&Bytecode::from_hex("0x6080604052").unwrap())
        .await
        .unwrap();
    assert_eq!(deployment.vault.as_str(), VAULT);
    assert_eq!(deployment.tx_id.as_str(), TX);
}

#[tokio::test]
async fn test_deploy_without_contract_address() {
    let server = MockServer::start().await;
    rpc(&server, "eth_sendTransaction", json!(TX)).await;
    rpc(
        &server,
        "eth_getTransactionReceipt",
        json!({ "transactionHash": TX, "blockNumber": "0x1", "status": "0x1" }),
    )
    .await;

    let ledger = client(&server).with_sender(Some(SENDER.to_string()));
    let result = ledger
        .deploy_vault(&Bytecode::from_hex("0x6080604052").unwrap())
        .await;
    assert!(matches!(result, Err(LedgerError::MissingContractAddress { .. })));
}
