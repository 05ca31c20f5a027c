//! End-to-end signing, encoding and combining scenarios.

#![allow(clippy::indexing_slicing, clippy::unwrap_used)]

use std::io::Write;

use alloy_primitives::{address, Address, Bytes, TxKind, U256};
use klay_keys::{
    AccountKey, KeyError, Keyring, MultipleKeyring, PrivateKey, RoleBasedKeyring, SignatureData,
    SingleKeyring, WeightedMultiSigOptions,
};
use klay_tx::config::load_config;
use klay_tx::klaytn::{AccountUpdateFields, KlaytnTx, SenderPaid};
use klay_tx::{
    combine, combine_signed_raw_transactions, sign_as_fee_payer_with_context, sign_with_context,
    AccessListTransaction, DecodeError, DynamicFeeTransaction, FeeDelegatedTransaction, FeeRatio,
    LegacyTransaction, SignOptions, SignatureVerifier, StaticChainContext, Transaction, TxError,
    TxType, TypedTransaction, TypedTxDecoder,
};
use serde_json::json;

// ============================================================================
// Fixture
// ============================================================================

const SENDER_KEY: &str = "0xf8cc7c3813ad23817466b1802ee805ee417001fcce9376ab8728c92dd8ea0a6b";
const FEE_PAYER_KEY: &str = "0xb9d5558443585bca6f225b935950e3f6e69f9da8a5809a83f51c3365dff53936";
const SENDER: Address = address!("90b3e9a3770481345a7f17f22f16d020bccfd33e");
const FEE_PAYER: Address = address!("33f524631e573329a550296f595c820d6c65213f");

const FIXTURE_RAW: &str = "0x0af8d90319843b9ac9ff9475c3098be5e4b63fbac05838daaee378dd48098d839896809490b3e9a3770481345a7f17f22f16d020bccfd33e14f845f84326a0fee9ac41e3e9840549d2d27e4bee763e539c4caaeefcd2b2a139fde131042c25a007237d7a7b9cd622bd53e4c6073d9ae6089898f6fce8484eaf3e835e59d1c9049433f524631e573329a550296f595c820d6c65213ff845f84325a0aac7918a35ae8500e851c5902e156a173c7aacde21ad81fabe58e7f4e2ce4871a027a129c39c0e0ada879c461c2104738fd893bcecd6f03919c8a1e040b45bb422";

fn single(hex: &str) -> Keyring {
    SingleKeyring::from_private_key(PrivateKey::from_hex(hex).unwrap()).into()
}

fn key(byte: u8) -> PrivateKey {
    PrivateKey::from_bytes(&[byte; 32]).unwrap()
}

fn fixture_unsigned() -> Transaction {
    Transaction::from_fields(&json!({
        "type": "FEE_DELEGATED_VALUE_TRANSFER_WITH_RATIO",
        "from": "0x90B3E9A3770481345A7F17f22f16D020Bccfd33e",
        "to": "0x75c3098Be5E4B63FBAc05838DaAEE378dD48098d",
        "nonce": "0x3",
        "gas": "0x3b9ac9ff",
        "gasPrice": "0x19",
        "value": "0x989680",
        "feeRatio": 20,
        "chainId": "0x1",
    }))
    .unwrap()
}

fn fixture_sender_signed() -> Transaction {
    let mut tx = fixture_unsigned();
    tx.sign(&single(SENDER_KEY), &SignOptions::default())
        .unwrap();
    tx
}

// ============================================================================
// Fee-delegated value transfer with ratio
// ============================================================================

#[test]
fn test_fixture_raw_transaction() {
    let mut tx = fixture_sender_signed();
    tx.sign_as_fee_payer(&single(FEE_PAYER_KEY), &SignOptions::default())
        .unwrap();

    assert_eq!(tx.fee_payer(), Some(FEE_PAYER));
    assert_eq!(tx.raw_transaction().unwrap(), FIXTURE_RAW);
}

#[test]
fn test_fixture_decode() {
    let tx = Transaction::decode_hex(FIXTURE_RAW).unwrap();

    assert_eq!(tx.tx_type(), TxType::FeeDelegatedValueTransferWithRatio);
    assert_eq!(tx.sender(), Some(SENDER));
    assert_eq!(tx.nonce(), Some(3));
    assert_eq!(tx.gas(), 0x3b9a_c9ff);
    assert_eq!(tx.gas_price(), Some(0x19));
    assert_eq!(tx.value(), U256::from(0x0098_9680u64));
    assert_eq!(tx.chain_id(), Some(1));
    assert_eq!(tx.fee_ratio(), Some(FeeRatio::new(20).unwrap()));
    assert_eq!(tx.fee_payer(), Some(FEE_PAYER));
    assert_eq!(tx.fee_payer_signatures().len(), 1);
    assert!(!tx.fee_payer_signatures()[0].is_placeholder());
    assert_eq!(tx.raw_transaction().unwrap(), FIXTURE_RAW);

    let verifier = SignatureVerifier::new(1);
    assert!(verifier.verify_sender(&tx, &AccountKey::Legacy).unwrap().satisfied);
    assert!(verifier.verify_fee_payer(&tx, &AccountKey::Legacy).unwrap().satisfied);
}

#[test]
fn test_sender_only_decode_reports_placeholder() {
    let raw = fixture_sender_signed().raw_transaction().unwrap();
    // Empty fee payer followed by a single placeholder signature.
    assert!(raw.ends_with("80c4c3018080"));

    let decoded = Transaction::decode_hex(&raw).unwrap();
    assert_eq!(decoded.fee_payer(), None);
    assert!(decoded.fee_payer_signatures().is_empty());
    let wire = decoded
        .fee_delegated()
        .unwrap()
        .fee_payer_signatures()
        .wire_entries();
    assert_eq!(wire, vec![SignatureData::PLACEHOLDER]);
    assert_eq!(wire[0].v, 0x01);
}

#[test]
fn test_sender_tx_hash_is_stable_across_fee_payer_rounds() {
    let sender_signed = fixture_sender_signed();
    let full = Transaction::decode_hex(FIXTURE_RAW).unwrap();

    assert_eq!(
        sender_signed.sender_tx_hash().unwrap(),
        full.sender_tx_hash().unwrap()
    );
    assert_ne!(
        sender_signed.transaction_hash().unwrap(),
        full.transaction_hash().unwrap()
    );
}

#[test]
fn test_preimage_ignores_signatures() {
    let unsigned = fixture_unsigned();
    let full = Transaction::decode_hex(FIXTURE_RAW).unwrap();

    assert_eq!(
        unsigned.rlp_encoding_for_signature().unwrap(),
        full.rlp_encoding_for_signature().unwrap()
    );
    // Naming the fee payer is what binds the fee-payer preimage.
    let mut named = unsigned.clone();
    named
        .fee_delegated_mut()
        .unwrap()
        .set_fee_payer(Some(FEE_PAYER));
    assert_eq!(
        named.rlp_encoding_for_fee_payer_signature().unwrap(),
        full.rlp_encoding_for_fee_payer_signature().unwrap()
    );
}

#[test]
fn test_combine_independent_sender_and_fee_payer_copies() {
    let sender_raw = fixture_sender_signed().raw_transaction().unwrap();

    let mut payer_copy = fixture_unsigned();
    payer_copy
        .sign_as_fee_payer(&single(FEE_PAYER_KEY), &SignOptions::default())
        .unwrap();
    let payer_raw = payer_copy.raw_transaction().unwrap();

    assert_eq!(
        combine_signed_raw_transactions(&[&sender_raw, &payer_raw]).unwrap(),
        FIXTURE_RAW
    );
    assert_eq!(
        combine_signed_raw_transactions(&[&payer_raw, &sender_raw]).unwrap(),
        FIXTURE_RAW
    );
}

#[test]
fn test_combine_rejects_other_transaction() {
    let mut other = fixture_unsigned();
    other.set_nonce(4);
    let err = combine(&[fixture_sender_signed(), other]).unwrap_err();
    assert_eq!(err, TxError::TransactionMismatch);
}

#[test]
fn test_combine_rejects_copies_signed_for_other_chains() {
    let signed_for = |chain_id: u64| {
        let mut tx = Transaction::from_fields(&json!({
            "type": "TxTypeValueTransfer",
            "from": SENDER,
            "to": "0x75c3098be5e4b63fbac05838daaee378dd48098d",
            "nonce": 0,
            "gas": 21000,
            "gasPrice": 25,
            "value": 1,
            "chainId": chain_id,
        }))
        .unwrap();
        tx.sign(&single(SENDER_KEY), &SignOptions::default())
            .unwrap();
        tx.raw_transaction().unwrap()
    };
    let testnet = signed_for(1001);
    let mainnet = signed_for(8217);

    assert_eq!(
        combine_signed_raw_transactions(&[&testnet, &mainnet]).unwrap_err(),
        TxError::TransactionMismatch
    );
    assert_eq!(
        combine_signed_raw_transactions(&[&mainnet, &testnet]).unwrap_err(),
        TxError::TransactionMismatch
    );
    assert_eq!(
        combine_signed_raw_transactions(&[&testnet, &testnet]).unwrap(),
        testnet
    );
}

// ============================================================================
// Multi-authority accounts
// ============================================================================

#[test]
fn test_non_legacy_account_cannot_use_ethereum_types() {
    let sender = single(SENDER_KEY);
    let unsigned: Transaction = DynamicFeeTransaction {
        from: Some(SENDER),
        chain_id: Some(1001),
        nonce: Some(0),
        max_priority_fee_per_gas: Some(1),
        max_fee_per_gas: Some(50),
        gas: 21_000,
        to: Some(FEE_PAYER),
        ..DynamicFeeTransaction::default()
    }
    .into();
    let public = AccountKey::Public(PrivateKey::from_hex(SENDER_KEY).unwrap().public_key());

    for on_chain in [AccountKey::Fail, public.clone()] {
        let mut tx = unsigned.clone();
        let err = tx
            .sign(&sender, &SignOptions::with_account_key(&on_chain))
            .unwrap_err();
        assert!(matches!(err, TxError::Key(KeyError::NoKeyForRole { .. })));
    }

    let mut signed = unsigned;
    signed.sign(&sender, &SignOptions::default()).unwrap();
    let verifier = SignatureVerifier::new(1001);
    assert!(verifier.verify_sender(&signed, &AccountKey::Legacy).unwrap().satisfied);
    assert!(!verifier.verify_sender(&signed, &public).unwrap().satisfied);
    assert!(!verifier.verify_sender(&signed, &AccountKey::Fail).unwrap().satisfied);
}

#[test]
fn test_two_of_three_multisig_via_raw_rounds() {
    let address = Address::repeat_byte(0x42);
    let keyring: Keyring = MultipleKeyring::new(address, vec![key(1), key(2), key(3)]).into();
    let account_key = match &keyring {
        Keyring::Multiple(multiple) => multiple
            .to_account_key(&WeightedMultiSigOptions {
                threshold: 2,
                weights: vec![1, 1, 1],
            })
            .unwrap(),
        _ => unreachable!(),
    };
    let unsigned = Transaction::from_fields(&json!({
        "type": "TxTypeSmartContractExecution",
        "from": address.to_string(),
        "to": "0x75c3098be5e4b63fbac05838daaee378dd48098d",
        "input": "0xa9059cbb",
        "gas": 100000,
        "gasPrice": 25000000000u64,
        "nonce": 0,
        "chainId": 1001,
    }))
    .unwrap();
    let verifier = SignatureVerifier::new(1001);

    let partial: Vec<String> = [0usize, 2]
        .into_iter()
        .map(|index| {
            let mut tx = unsigned.clone();
            tx.sign(
                &keyring,
                &SignOptions {
                    index: Some(index),
                    account_key: Some(&account_key),
                    ..SignOptions::default()
                },
            )
            .unwrap();
            tx.raw_transaction().unwrap()
        })
        .collect();

    let one = Transaction::decode_hex(&partial[0]).unwrap();
    assert!(!verifier.verify_sender(&one, &account_key).unwrap().satisfied);

    let merged = combine_signed_raw_transactions(&partial).unwrap();
    let merged = Transaction::decode_hex(&merged).unwrap();
    let report = verifier.verify_sender(&merged, &account_key).unwrap();
    assert_eq!(report.weight, 2);
    assert!(report.satisfied);
    assert_eq!(
        merged.recover_public_keys().unwrap().len(),
        merged.signatures().len()
    );
}

#[test]
fn test_role_based_account_update() {
    let address = Address::repeat_byte(0x24);
    let keyring: Keyring = RoleBasedKeyring::new(
        address,
        vec![key(1)],
        vec![key(2), key(3)],
        vec![key(4)],
    )
    .into();
    let on_chain = keyring.to_account_key().unwrap();

    let new_key = AccountKey::Public(key(9).public_key());
    let mut tx: Transaction = KlaytnTx::new(
        address,
        300_000,
        AccountUpdateFields {
            account_key: new_key.clone(),
        },
        SenderPaid,
    )
    .with_nonce(1)
    .with_gas_price(25_000_000_000)
    .with_chain_id(1001)
    .into();
    tx.sign(&keyring, &SignOptions::with_account_key(&on_chain))
        .unwrap();
    assert_eq!(tx.signatures().len(), 2);

    let decoded = Transaction::decode_hex(&tx.raw_transaction().unwrap()).unwrap();
    let Transaction::AccountUpdate(inner) = &decoded else {
        panic!("decoded as {}", decoded.tx_type());
    };
    assert_eq!(inner.payload.account_key, new_key);
    assert!(SignatureVerifier::new(1001)
        .verify_sender(&decoded, &on_chain)
        .unwrap()
        .satisfied);
}

// ============================================================================
// Decoder
// ============================================================================

#[test]
fn test_native_decoder_rejects_ethereum_types() {
    let raw = DynamicFeeTransaction {
        chain_id: Some(1001),
        nonce: Some(0),
        max_priority_fee_per_gas: Some(1),
        max_fee_per_gas: Some(2),
        gas: 21_000,
        ..DynamicFeeTransaction::default()
    }
    .rlp_encoding()
    .unwrap();

    assert_eq!(
        TypedTxDecoder::native().decode(&raw).unwrap_err(),
        DecodeError::DisallowedType(0x7802)
    );
    assert!(TypedTxDecoder::default().decode(&raw).is_ok());
    assert!(TypedTxDecoder::native().decode_hex(FIXTURE_RAW).is_ok());
}

// ============================================================================
// Cross-checks against the Ethereum reference encoders
// ============================================================================

#[test]
fn test_legacy_preimage_matches_reference() {
    use alloy_consensus::{SignableTransaction, TxLegacy};

    let ours = LegacyTransaction {
        nonce: Some(7),
        gas_price: Some(20_000_000_000),
        gas: 21_000,
        to: Some(Address::repeat_byte(0x35)),
        value: U256::from(1_000_000_000_000_000_000u128),
        input: Bytes::from_static(&[0xde, 0xad]),
        chain_id: Some(1),
        ..LegacyTransaction::default()
    };
    let reference = TxLegacy {
        chain_id: Some(1),
        nonce: 7,
        gas_price: 20_000_000_000,
        gas_limit: 21_000,
        to: TxKind::Call(Address::repeat_byte(0x35)),
        value: U256::from(1_000_000_000_000_000_000u128),
        input: Bytes::from_static(&[0xde, 0xad]),
    };

    assert_eq!(
        ours.rlp_encoding_for_signature().unwrap(),
        reference.encoded_for_signing()
    );
}

#[test]
fn test_dynamic_fee_preimage_matches_reference() {
    use alloy_consensus::{SignableTransaction, TxEip1559};

    let ours = DynamicFeeTransaction {
        chain_id: Some(1001),
        nonce: Some(2),
        max_priority_fee_per_gas: Some(25_000_000_000),
        max_fee_per_gas: Some(75_000_000_000),
        gas: 50_000,
        to: Some(Address::repeat_byte(0x51)),
        value: U256::from(3u64),
        input: Bytes::from_static(&[0x01]),
        ..DynamicFeeTransaction::default()
    };
    let reference = TxEip1559 {
        chain_id: 1001,
        nonce: 2,
        gas_limit: 50_000,
        max_fee_per_gas: 75_000_000_000,
        max_priority_fee_per_gas: 25_000_000_000,
        to: TxKind::Call(Address::repeat_byte(0x51)),
        value: U256::from(3u64),
        access_list: Default::default(),
        input: Bytes::from_static(&[0x01]),
    };

    assert_eq!(
        ours.rlp_encoding_for_signature().unwrap(),
        reference.encoded_for_signing()
    );
}

#[test]
fn test_access_list_preimage_matches_reference() {
    use alloy_consensus::{SignableTransaction, TxEip2930};

    let ours = AccessListTransaction {
        chain_id: Some(1001),
        nonce: Some(0),
        gas_price: Some(25_000_000_000),
        gas: 30_000,
        to: None,
        value: U256::ZERO,
        input: Bytes::from_static(&[0x60, 0x80]),
        ..AccessListTransaction::default()
    };
    let reference = TxEip2930 {
        chain_id: 1001,
        nonce: 0,
        gas_price: 25_000_000_000,
        gas_limit: 30_000,
        to: TxKind::Create,
        value: U256::ZERO,
        access_list: alloy_eips::eip2930::AccessList::default(),
        input: Bytes::from_static(&[0x60, 0x80]),
    };

    assert_eq!(
        ours.rlp_encoding_for_signature().unwrap(),
        reference.encoded_for_signing()
    );
}

// ============================================================================
// Offline chain context
// ============================================================================

#[tokio::test]
async fn test_sign_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
chain:
  chain_id: 1
fees:
  gas_price: 25
accounts:
  - address: "{SENDER}"
    nonce: 3
    account_key: "0x01c0"
  - address: "{FEE_PAYER}"
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let ctx = StaticChainContext::from_config(&config).unwrap();

    let tx = Transaction::from_fields(&json!({
        "type": "FEE_DELEGATED_VALUE_TRANSFER_WITH_RATIO",
        "from": SENDER.to_string(),
        "to": "0x75c3098be5e4b63fbac05838daaee378dd48098d",
        "gas": "0x3b9ac9ff",
        "value": "0x989680",
        "feeRatio": "20",
    }))
    .unwrap();

    let signed = sign_with_context(&tx, &single(SENDER_KEY), &ctx, None)
        .await
        .unwrap();
    let signed = sign_as_fee_payer_with_context(&signed, &single(FEE_PAYER_KEY), &ctx, None)
        .await
        .unwrap();
    assert_eq!(signed.raw_transaction().unwrap(), FIXTURE_RAW);
}
