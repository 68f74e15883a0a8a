//! Accuser scenarios: duplicate (baker, level) and (endorser, level) pairs
//! across recent blocks raise high-severity alerts; clean chains stay quiet.

use crate::mock_chain::{block, MockChain};
use serde_json::json;
use shared_types::{Alert, AlertSeverity, AlertSink, BlockSnapshot};
use std::sync::{Arc, Mutex};
use tzb_engine::Accuser;

#[derive(Default)]
struct CollectingSink(Mutex<Vec<Alert>>);

impl AlertSink for CollectingSink {
    fn alert(&self, alert: Alert) {
        self.0.lock().unwrap().push(alert);
    }
}

fn block_with_endorsements(
    hash: &str,
    level: i32,
    endorsements: &[(&str, &str, i32)],
) -> BlockSnapshot {
    let pass0: Vec<serde_json::Value> = endorsements
        .iter()
        .map(|(op_hash, delegate, endorsed_level)| {
            json!({
                "hash": op_hash,
                "branch": "Bbranch",
                "contents": [{
                    "kind": "endorsement",
                    "level": endorsed_level,
                    "metadata": { "delegate": delegate }
                }]
            })
        })
        .collect();
    serde_json::from_value(json!({
        "protocol": "PsBabyM1eUXZseaJdmXFApDSBqj8YBfwELoxZHHW77EMcAbbwAS",
        "chain_id": "NetXdQprcVkpaWU",
        "hash": hash,
        "header": {
            "level": level,
            "predecessor": "Bprev",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        },
        "metadata": { "baker": "tz1Baker" },
        "operations": [pass0, [], [], []]
    }))
    .expect("valid test block")
}

#[tokio::test]
async fn test_double_bake_detected_across_predecessors() {
    let chain = Arc::new(MockChain::new());
    let sink = Arc::new(CollectingSink::default());
    let accuser = Accuser::new(chain.clone(), sink.clone());

    // two distinct blocks at level 50 signed by the same baker
    let head = block("Bhead", 50, Some("tz1DoubleBaker"));
    chain.set_head(head.clone());
    chain.put_block(
        &format!("{}~1", head.hash),
        block("Bother", 50, Some("tz1DoubleBaker")),
    );

    accuser.tick(&head).await.unwrap();

    let alerts = sink.0.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert!(alerts[0].message.contains("Double baking"));
    assert!(alerts[0].message.contains("tz1DoubleBaker"));
}

#[tokio::test]
async fn test_double_endorse_detected_within_block() {
    let chain = Arc::new(MockChain::new());
    let sink = Arc::new(CollectingSink::default());
    let accuser = Accuser::new(chain.clone(), sink.clone());

    let head = block_with_endorsements(
        "Bhead",
        50,
        &[("opA", "tz1Endorser", 42), ("opB", "tz1Endorser", 42)],
    );
    chain.set_head(head.clone());

    accuser.tick(&head).await.unwrap();

    let alerts = sink.0.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains("Double endorsing"));
    assert!(alerts[0].message.contains("level 42"));
}

#[tokio::test]
async fn test_clean_chain_raises_nothing() {
    let chain = Arc::new(MockChain::new());
    let sink = Arc::new(CollectingSink::default());
    let accuser = Accuser::new(chain.clone(), sink.clone());

    let head = block_with_endorsements("Bhead", 50, &[("opA", "tz1Endorser", 42)]);
    chain.set_head(head.clone());
    chain.put_block("Bhead~1", block("Bprev", 49, Some("tz1Baker")));

    accuser.tick(&head).await.unwrap();
    // a second tick over the same blocks must not re-scan or re-alert
    accuser.tick(&head).await.unwrap();

    assert!(sink.0.lock().unwrap().is_empty());
}
