//! Discovery scenario tests.
//!
//! Exercise the full inquiry → name resolution → selection flow against
//! the scripted modem. Every degraded path - nothing discovered, no
//! service match, resolution timeout - must end in `NoneFound`, never in
//! an error: the caller falls back to "connection failed" UI.

use std::time::Duration;

use gridlink_core::{Discovery, DiscoveryOutcome, Key, LinkError, PeerRecord};
use gridlink_harness::Scenario;

const SERVICE: &str = "2048Server";

type DiscoveryRun = Result<(DiscoveryOutcome, Vec<PeerRecord>), LinkError>;

fn drive(ep: &mut gridlink_core::Endpoint<
    gridlink_harness::SimPort,
    gridlink_harness::SimEnv,
    gridlink_harness::SimPanel,
>) -> DiscoveryRun {
    let mut discovery = Discovery::new();
    let outcome = discovery.run(ep, SERVICE)?;
    Ok((outcome, discovery.peers().to_vec()))
}

#[test]
fn full_discovery_finds_a_verified_peer() {
    let result = Scenario::new("full discovery")
        .reply(
            "AT+BTINQ",
            Duration::from_millis(200),
            &["+BTINQ: AABBCCDDEEFF,201F040", "+BTINQ: COMPLETE"],
        )
        .reply(
            "AT+BTSDP=AABBCCDDEEFF",
            Duration::from_millis(500),
            &["+BTSDP: 1 \"2048Server\" RFCOMM", "+BTSDP: COMPLETE"],
        )
        .key_at(Duration::from_secs(2), Key::Center)
        .oracle(Box::new(|world| {
            let tx = world.tx_lines();
            if !tx.iter().any(|line| line == "AT+BTINQ=6") {
                return Err(format!("inquiry never issued: {tx:?}"));
            }
            if !tx.iter().any(|line| line == "AT+BTSDP=AABBCCDDEEFF") {
                return Err(format!("service query never issued: {tx:?}"));
            }
            Ok(())
        }))
        .run(drive)
        .unwrap()
        .unwrap();

    let (outcome, peers) = result;
    assert_eq!(peers.len(), 1);
    assert!(peers[0].verified);
    match outcome {
        DiscoveryOutcome::Found(peer) => assert_eq!(peer.addr.as_bytes(), b"AABBCCDDEEFF"),
        DiscoveryOutcome::NoneFound => panic!("expected a verified peer"),
    }
}

#[test]
fn empty_inquiry_degrades_to_none_found() {
    let result = Scenario::new("empty inquiry")
        .reply("AT+BTINQ", Duration::from_millis(100), &["+BTINQ: COMPLETE"])
        .key_at(Duration::from_secs(1), Key::Center)
        .oracle(Box::new(|_world| Ok(())))
        .run(drive)
        .unwrap()
        .unwrap();

    let (outcome, peers) = result;
    assert!(peers.is_empty());
    assert_eq!(outcome, DiscoveryOutcome::NoneFound);
}

#[test]
fn unmatched_service_name_is_not_selectable() {
    let result = Scenario::new("wrong service")
        .reply(
            "AT+BTINQ",
            Duration::from_millis(100),
            &["+BTINQ: AABBCCDDEEFF,201F040", "+BTINQ: COMPLETE"],
        )
        .reply(
            "AT+BTSDP=AABBCCDDEEFF",
            Duration::from_millis(100),
            &["+BTSDP: 1 \"OBEX Push\" RFCOMM", "+BTSDP: COMPLETE"],
        )
        .key_at(Duration::from_secs(1), Key::Center)
        .oracle(Box::new(|_world| Ok(())))
        .run(drive)
        .unwrap()
        .unwrap();

    let (outcome, peers) = result;
    assert_eq!(peers.len(), 1);
    assert!(!peers[0].verified);
    assert_eq!(peers[0].service.as_deref(), Some("OBEX Push"));
    assert_eq!(outcome, DiscoveryOutcome::NoneFound);
}

#[test]
fn inquiry_window_elapses_without_completion_marker() {
    // The module never says COMPLETE; the 6.5 s deadline ends the
    // collection and whatever arrived is kept. Resolution then times out
    // (nothing answers the service query) and selection still works.
    let result = Scenario::new("inquiry deadline")
        .reply(
            "AT+BTINQ",
            Duration::from_millis(100),
            &["+BTINQ: AABBCCDDEEFF,201F040"],
        )
        .key_at(Duration::from_secs(120), Key::Center)
        .oracle(Box::new(|world| {
            if world.elapsed() < Duration::from_millis(6_500) {
                return Err("inquiry deadline was not honored".to_owned());
            }
            Ok(())
        }))
        .run(drive)
        .unwrap()
        .unwrap();

    let (outcome, peers) = result;
    assert_eq!(peers.len(), 1);
    // Discovered but never verified: not selectable.
    assert_eq!(outcome, DiscoveryOutcome::NoneFound);
}

#[test]
fn selection_cursor_wraps_and_settles() {
    let result = Scenario::new("cursor wrap")
        .reply(
            "AT+BTINQ",
            Duration::from_millis(100),
            &["+BTINQ: AABBCCDDEEFF,201F040", "+BTINQ: COMPLETE"],
        )
        .reply(
            "AT+BTSDP=AABBCCDDEEFF",
            Duration::from_millis(100),
            &["+BTSDP: 1 \"2048Server\" RFCOMM", "+BTSDP: COMPLETE"],
        )
        // Down five times walks the cursor all the way around the
        // five-slot table, back onto the verified peer.
        .key_at(Duration::from_millis(1_000), Key::Down)
        .key_at(Duration::from_millis(1_010), Key::Down)
        .key_at(Duration::from_millis(1_020), Key::Down)
        .key_at(Duration::from_millis(1_030), Key::Down)
        .key_at(Duration::from_millis(1_040), Key::Down)
        .key_at(Duration::from_millis(1_050), Key::Center)
        .oracle(Box::new(|world| {
            let renders = world.peer_renders();
            if renders.last() != Some(&(1, 0)) {
                return Err(format!("cursor did not wrap home: {renders:?}"));
            }
            Ok(())
        }))
        .run(drive)
        .unwrap()
        .unwrap();

    let (outcome, _) = result;
    assert!(matches!(outcome, DiscoveryOutcome::Found(_)));
}
