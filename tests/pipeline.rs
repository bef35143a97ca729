//! End-to-end ledger operations against the in-process mock ledger.

use std::sync::Arc;
use std::time::Duration;

use nft_gateway::ledger::messages::{NftMetadata, UpdateDataRequest};
use nft_gateway::ledger::types::{IdentityConfig, KeyDerivationError, SetupError};
use nft_gateway::ledger::{
    build_class_id, BroadcastError, IssueClassRequest, LedgerError, LedgerHandle, MintRequest,
};
use nft_gateway::lifecycle::Shutdown;

mod common;
use common::MockLedger;

fn issue(symbol: &str) -> IssueClassRequest {
    IssueClassRequest {
        symbol: symbol.into(),
        name: "Artworks".into(),
        description: "demo collection".into(),
    }
}

fn mint(symbol: &str, id: &str) -> MintRequest {
    MintRequest {
        class_symbol: symbol.into(),
        nft_id: id.into(),
        name: "Piece One".into(),
        description: "first".into(),
    }
}

fn update(class_id: &str, id: &str, name: &str) -> UpdateDataRequest {
    UpdateDataRequest {
        class_id: class_id.into(),
        nft_id: id.into(),
        name: name.into(),
        description: "revised".into(),
    }
}

fn broadcast_error(err: LedgerError) -> BroadcastError {
    match err {
        LedgerError::Broadcast(e) => e,
        other => panic!("expected broadcast error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_issue_mint_update_confirmed() {
    let mock = MockLedger::new();
    mock.set_inclusion_polls(2);
    let ledger = common::handle(mock.clone());

    let issued = ledger.issue_class(&issue("ART")).await.unwrap();
    assert_eq!(issued.class_id, build_class_id("ART", ledger.address()));
    assert!(issued.outcome.height.is_some());
    assert!(mock.has_class(&issued.class_id));

    let minted = ledger.mint(&mint("ART", "1")).await.unwrap();
    assert_eq!(minted.class_id, issued.class_id);
    assert!(minted.outcome.height > issued.outcome.height);

    let data = mock.nft_data(&issued.class_id, "1").unwrap();
    let metadata: NftMetadata = serde_json::from_slice(&data).unwrap();
    assert_eq!(metadata, NftMetadata::new("Piece One", "first"));

    let updated = ledger
        .update_data(&update(&issued.class_id, "1", "Piece One v2"))
        .await
        .unwrap();
    assert!(updated.outcome.height.is_some());

    let data = mock.nft_data(&issued.class_id, "1").unwrap();
    let metadata: NftMetadata = serde_json::from_slice(&data).unwrap();
    assert_eq!(metadata.name, "Piece One v2");
    assert_eq!(metadata.description, "revised");
}

#[tokio::test]
async fn test_mint_into_unissued_class_fails_on_chain() {
    let mock = MockLedger::new();
    let ledger = common::handle(mock.clone());

    let err = broadcast_error(ledger.mint(&mint("NOPE", "1")).await.unwrap_err());
    match err {
        BroadcastError::Execution { txhash, code, log, .. } => {
            assert!(!txhash.is_empty());
            assert_ne!(code, 0);
            assert!(log.contains("not found"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(mock.nft_count(), 0);
}

#[tokio::test]
async fn test_strict_simulation_rejects_before_submission() {
    let mock = MockLedger::new();
    mock.set_strict_simulation(true);
    let ledger = common::handle(mock.clone());

    let err = broadcast_error(ledger.mint(&mint("NOPE", "1")).await.unwrap_err());
    assert!(matches!(err, BroadcastError::Simulation(_)));
    assert_eq!(err.txhash(), None);
    assert_eq!(mock.broadcasts(), 0);
}

#[tokio::test]
async fn test_duplicate_class_is_execution_error() {
    let mock = MockLedger::new();
    let ledger = common::handle(mock.clone());

    ledger.issue_class(&issue("ART")).await.unwrap();
    let err = broadcast_error(ledger.issue_class(&issue("art")).await.unwrap_err());
    assert!(matches!(err, BroadcastError::Execution { .. }));
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let mock = MockLedger::new();
    let ledger = common::handle(mock.clone());

    let class_id = ledger.issue_class(&issue("ART")).await.unwrap().class_id;
    ledger.mint(&mint("ART", "1")).await.unwrap();

    let request = update(&class_id, "1", "Final");
    ledger.update_data(&request).await.unwrap();
    let first = mock.nft_data(&class_id, "1").unwrap();

    ledger.update_data(&request).await.unwrap();
    let second = mock.nft_data(&class_id, "1").unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_update_missing_nft_fails_on_chain() {
    let mock = MockLedger::new();
    let ledger = common::handle(mock.clone());

    let class_id = ledger.issue_class(&issue("ART")).await.unwrap().class_id;
    let err = broadcast_error(ledger.update_data(&update(&class_id, "404", "x")).await.unwrap_err());
    assert!(matches!(err, BroadcastError::Execution { .. }));
}

#[tokio::test]
async fn test_concurrent_mints_use_distinct_sequences() {
    let mock = MockLedger::new();
    let ledger = Arc::new(common::handle(mock.clone()));
    ledger.issue_class(&issue("ART")).await.unwrap();

    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.mint(&mint("ART", &i.to_string())).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(mock.nft_count(), 5);
    assert_eq!(mock.broadcasts(), 6);
}

#[tokio::test]
async fn test_confirmation_deadline_yields_unknown() {
    let mock = MockLedger::new();
    mock.set_never_include(true);
    let ledger = common::handle(mock.clone());

    let err = broadcast_error(ledger.issue_class(&issue("ART")).await.unwrap_err());
    match &err {
        BroadcastError::Unknown { txhash, reason } => {
            assert!(!txhash.is_empty());
            assert!(reason.contains("not included"));
        }
        other => panic!("unexpected {:?}", other),
    }
    // Submitted and applied, but its fate was never observed.
    assert_eq!(mock.broadcasts(), 1);
}

#[tokio::test]
async fn test_shutdown_cancels_confirmation() {
    let mock = MockLedger::new();
    mock.set_never_include(true);
    let shutdown = Shutdown::new();
    let ledger = common::handle(mock).with_cancellation(shutdown.subscribe());

    let task = tokio::spawn(async move { ledger.issue_class(&issue("ART")).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.trigger();

    let err = broadcast_error(
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err(),
    );
    match err {
        BroadcastError::Unknown { reason, .. } => assert!(reason.contains("cancelled")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_without_await_returns_after_acceptance() {
    let mock = MockLedger::new();
    mock.set_never_include(true);
    let mut ledger_config = common::ledger_config();
    ledger_config.await_tx = false;
    let ledger = LedgerHandle::from_rpc(mock, &ledger_config, &mut common::identity_config()).unwrap();

    let receipt = ledger.issue_class(&issue("ART")).await.unwrap();
    assert_eq!(receipt.outcome.height, None);
    assert!(!receipt.outcome.txhash.is_empty());
}

#[test]
fn test_malformed_seed_fails_setup() {
    let mut identity = IdentityConfig {
        mnemonic: Some("this is not a valid seed phrase at all".into()),
        ..IdentityConfig::default()
    };
    let err = LedgerHandle::from_rpc(MockLedger::new(), &common::ledger_config(), &mut identity).unwrap_err();
    assert!(matches!(
        err,
        SetupError::KeyDerivation(KeyDerivationError::Mnemonic(_))
    ));
}
