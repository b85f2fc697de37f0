use gichain_chain::{
    LedgerConfig, LedgerError, ProvenanceService, RecordSubmission, VerificationResult,
    VerifyMode,
};
use gichain_core::{Argon2Config, Block, Hash, GENESIS_INDEX, GENESIS_SENTINEL};
use gichain_storage::{BlockStore, RecordStore, Storage};

const RAW_PASSWORD: &str = "tulsi-&-turmeric-42";

fn service() -> ProvenanceService<BlockStore> {
    let config = LedgerConfig {
        argon2: Argon2Config::minimal(),
        verify_mode: VerifyMode::FailFast,
    };
    ProvenanceService::new(BlockStore::open_temporary().unwrap(), &config).unwrap()
}

fn submission(product_id: i64) -> RecordSubmission {
    serde_json::from_value(serde_json::json!({
        "GITagID": "GI-KERALA-COIR",
        "GICreationDate": "2007-06-12",
        "ProductID": product_id,
        "ProductName": format!("Alleppey Coir #{product_id}"),
        "AddressOfOrigin": "Alappuzha, Kerala",
        "OwnershipID": format!("OWN-{product_id}"),
        "OwnershipStartDate": "2024-02-01",
        "OwnershipEndDate": "2024-08-01",
        "TransactionID": format!("TX-{product_id}"),
        "TransactionDate": "2024-02-03",
        "UserID": "U-100",
        "UserName": "Thomas",
        "EmailID": "thomas@example.in",
        "Password": RAW_PASSWORD,
        "RegistrationDate": "2023-12-01"
    }))
    .unwrap()
}

/// Overwrite the record in `slot`, the way an attacker with database access
/// would.
fn overwrite_slot(service: &ProvenanceService<BlockStore>, slot: u64, block: &Block) {
    service
        .ledger()
        .store()
        .storage()
        .inner()
        .insert(
            Storage::block_index_key(slot),
            bincode::serialize(block).unwrap(),
        )
        .unwrap();
}

fn overwrite(service: &ProvenanceService<BlockStore>, block: &Block) {
    overwrite_slot(service, block.sequence_index, block);
}

fn violations(result: &VerificationResult) -> Vec<(u64, &'static str)> {
    result
        .violations()
        .iter()
        .map(|v| (v.index, v.kind.name()))
        .collect()
}

#[test]
fn three_products_then_tampered_hash() {
    let service = service();
    let blocks: Vec<Block> = [101, 102, 103]
        .into_iter()
        .map(|id| service.submit_record(&submission(id)).unwrap())
        .collect();

    assert_eq!(service.get_record_by_product_id(102).unwrap(), blocks[1]);
    assert!(service.verify_integrity(None).unwrap().is_valid());

    let mut altered = blocks[1].clone();
    altered.hash = Hash::from_bytes([0x5A; 32]);
    overwrite(&service, &altered);

    let full = service
        .verify_integrity_with(None, VerifyMode::FullScan)
        .unwrap();
    assert_eq!(
        violations(&full),
        vec![(2, "HashMismatch"), (3, "LinkBroken")]
    );

    let fail_fast = service.verify_integrity(None).unwrap();
    assert_eq!(violations(&fail_fast), vec![(2, "HashMismatch")]);
}

#[test]
fn genesis_block() {
    let service = service();
    let block = service.submit_record(&submission(1)).unwrap();

    assert_eq!(block.sequence_index, GENESIS_INDEX);
    assert_eq!(block.prev_hash, None);
    assert_eq!(block.prev_hash_hex(), GENESIS_SENTINEL);
    assert_eq!(
        service.verify_integrity(None).unwrap(),
        VerificationResult::Valid { blocks_checked: 1 }
    );
}

#[test]
fn chain_linkage_over_many_blocks() {
    let service = service();
    for id in 1..=25 {
        service.submit_record(&submission(id)).unwrap();
    }

    let blocks = service.get_all_records().unwrap();
    assert_eq!(blocks.len(), 25);
    for pair in blocks.windows(2) {
        assert_eq!(pair[1].prev_hash, Some(pair[0].hash));
        assert_eq!(pair[1].sequence_index, pair[0].sequence_index + 1);
    }
    for block in &blocks {
        assert_eq!(block.hash.to_hex().len(), 64);
        assert!(block.has_valid_hash());
    }
    assert_eq!(
        service.verify_integrity(None).unwrap(),
        VerificationResult::Valid { blocks_checked: 25 }
    );
}

#[test]
fn every_content_field_is_tamper_evident() {
    let tampers: [(&str, fn(&mut Block)); 16] = [
        ("tag id", |b: &mut Block| b.content.gi_tag.tag_id.push('X')),
        ("creation date", |b: &mut Block| {
            b.content.gi_tag.creation_date = b.content.gi_tag.creation_date.succ_opt().unwrap()
        }),
        ("product id", |b: &mut Block| b.content.product.product_id += 1),
        ("product name", |b: &mut Block| b.content.product.name.push('X')),
        ("origin", |b: &mut Block| b.content.product.origin_address.clear()),
        ("ownership id", |b: &mut Block| b.content.ownership.ownership_id.push('X')),
        ("start date", |b: &mut Block| {
            b.content.ownership.start_date = b.content.ownership.start_date.pred_opt().unwrap()
        }),
        ("end date", |b: &mut Block| b.content.ownership.end_date = None),
        ("transaction id", |b: &mut Block| {
            b.content.transaction.transaction_id.push('X')
        }),
        ("transaction date", |b: &mut Block| {
            b.content.transaction.date = b.content.transaction.date.succ_opt().unwrap()
        }),
        ("user id", |b: &mut Block| b.content.user.user_id.push('X')),
        ("user name", |b: &mut Block| b.content.user.name = "Eve".into()),
        ("user email", |b: &mut Block| b.content.user.email = "eve@example.com".into()),
        ("password hash", |b: &mut Block| {
            b.content.user.password_hash =
                serde_json::from_str("\"$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$AAAAAAAAAAA\"")
                    .unwrap()
        }),
        ("registration date", |b: &mut Block| {
            b.content.user.registration_date =
                b.content.user.registration_date.succ_opt().unwrap()
        }),
        ("prev hash", |b: &mut Block| b.prev_hash = Some(Hash::ZERO)),
    ];

    for (name, tamper) in tampers {
        let service = service();
        let blocks: Vec<Block> = (1..=4)
            .map(|id| service.submit_record(&submission(id)).unwrap())
            .collect();

        let mut altered = blocks[1].clone();
        tamper(&mut altered);
        overwrite(&service, &altered);

        let fail_fast = service.verify_integrity(None).unwrap();
        assert_eq!(
            violations(&fail_fast),
            vec![(2, "HashMismatch")],
            "tampering {name}"
        );

        let full = service
            .verify_integrity_with(None, VerifyMode::FullScan)
            .unwrap();
        assert!(
            violations(&full).contains(&(2, "HashMismatch")),
            "tampering {name}"
        );
    }
}

#[test]
fn rewritten_sequence_index_is_reported_where_stored() {
    let service = service();
    let blocks: Vec<Block> = (1..=5)
        .map(|id| service.submit_record(&submission(id)).unwrap())
        .collect();

    let mut moved = blocks[2].clone();
    moved.sequence_index = 9;
    overwrite_slot(&service, 3, &moved);

    let full = service
        .verify_integrity_with(None, VerifyMode::FullScan)
        .unwrap();
    assert_eq!(violations(&full), vec![(3, "SequenceGap")]);
}

#[test]
fn lowered_tip_index_cannot_hide_earlier_tampering() {
    let service = service();
    let blocks: Vec<Block> = (1..=5)
        .map(|id| service.submit_record(&submission(id)).unwrap())
        .collect();

    let mut forged = blocks[2].clone();
    forged.content.product.name = "FORGED".into();
    overwrite(&service, &forged);
    let mut tip = blocks[4].clone();
    tip.sequence_index = 2;
    overwrite_slot(&service, 5, &tip);

    let full = service
        .verify_integrity_with(None, VerifyMode::FullScan)
        .unwrap();
    assert_eq!(
        violations(&full),
        vec![(3, "HashMismatch"), (5, "SequenceGap")]
    );
    assert_eq!(full.blocks_checked(), 5);

    // The ledger refuses to extend a tip whose index disagrees with its slot.
    assert!(matches!(
        service.submit_record(&submission(6)),
        Err(LedgerError::Storage(_))
    ));
}

#[test]
fn raw_password_never_persisted() {
    let service = service();
    let block = service.submit_record(&submission(9)).unwrap();

    let json = serde_json::to_string(&block).unwrap();
    assert!(!json.contains(RAW_PASSWORD));

    let store = service.ledger().store();
    for entry in store.storage().inner().iter() {
        let (_, value) = entry.unwrap();
        assert!(!value
            .windows(RAW_PASSWORD.len())
            .any(|w| w == RAW_PASSWORD.as_bytes()));
    }
    assert!(block
        .content
        .user
        .password_hash
        .verify(RAW_PASSWORD)
        .unwrap());
}

#[test]
fn failed_submission_leaves_ledger_untouched() {
    let service = service();
    service.submit_record(&submission(1)).unwrap();

    let mut bad = submission(2);
    bad.ownership_end_date = Some("2023-01-01".into());
    assert!(matches!(
        service.submit_record(&bad),
        Err(LedgerError::Validation(_))
    ));

    assert_eq!(service.ledger().store().len().unwrap(), 1);
    let next = service.submit_record(&submission(3)).unwrap();
    assert_eq!(next.sequence_index, 2);
    assert!(service.verify_integrity(None).unwrap().is_valid());
}

#[test]
fn reopened_ledger_continues_chain() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig {
        argon2: Argon2Config::minimal(),
        verify_mode: VerifyMode::FullScan,
    };

    let first = {
        let service = ProvenanceService::new(BlockStore::open(dir.path()).unwrap(), &config).unwrap();
        let block = service.submit_record(&submission(1)).unwrap();
        service.ledger().store().flush().unwrap();
        block
    };

    let service = ProvenanceService::new(BlockStore::open(dir.path()).unwrap(), &config).unwrap();
    let second = service.submit_record(&submission(2)).unwrap();
    assert_eq!(second.prev_hash, Some(first.hash));
    assert!(service.verify_integrity(None).unwrap().is_valid());
}
