use std::collections::BTreeMap;
use storefront_backend::gateway::signature::{sign_params, verify_params};
use storefront_backend::gateway::types::{PARAM_SECURE_HASH, PARAM_SECURE_HASH_TYPE};

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn digest_is_stable_across_insertion_orders() {
    let mut first = BTreeMap::new();
    first.insert("a".to_string(), "1".to_string());
    first.insert("b".to_string(), "2".to_string());

    let mut second = BTreeMap::new();
    second.insert("b".to_string(), "2".to_string());
    second.insert("a".to_string(), "1".to_string());

    assert_eq!(sign_params(&first, "secret"), sign_params(&second, "secret"));
}

#[test]
fn full_callback_parameter_set_round_trips() {
    let callback = params(&[
        ("vnp_Amount", "15000000"),
        ("vnp_BankCode", "NCB"),
        ("vnp_CardType", "ATM"),
        ("vnp_OrderInfo", "Order #42"),
        ("vnp_PayDate", "20260115103000"),
        ("vnp_ResponseCode", "00"),
        ("vnp_TmnCode", "TESTTMN1"),
        ("vnp_TransactionNo", "14400996"),
        ("vnp_TxnRef", "ORDER_42_1000"),
    ]);
    let digest = sign_params(&callback, "production-grade-secret");

    let mut inbound = callback.clone();
    inbound.insert(PARAM_SECURE_HASH.to_string(), digest.clone());
    inbound.insert(PARAM_SECURE_HASH_TYPE.to_string(), "HMACSHA256".to_string());

    assert!(verify_params(&inbound, &digest, "production-grade-secret"));
}

#[test]
fn mutating_any_value_invalidates_the_signature() {
    let original = params(&[
        ("vnp_Amount", "15000000"),
        ("vnp_ResponseCode", "00"),
        ("vnp_TxnRef", "ORDER_42_1000"),
    ]);
    let digest = sign_params(&original, "secret");

    for (key, value) in &original {
        let mut tampered = original.clone();
        let mut flipped = value.clone();
        flipped.push('x');
        tampered.insert(key.clone(), flipped);
        assert!(
            !verify_params(&tampered, &digest, "secret"),
            "tampering with {} should invalidate the signature",
            key
        );
    }
}

#[test]
fn claimed_success_code_without_valid_signature_is_rejected() {
    let inbound = params(&[
        ("vnp_ResponseCode", "00"),
        ("vnp_TxnRef", "ORDER_42_1000"),
        (PARAM_SECURE_HASH, "deadbeef"),
    ]);
    assert!(!verify_params(&inbound, "deadbeef", "secret"));
}
