use super::*;
use crate::chunk::{CT_HEARTBEAT, CT_PAYLOAD_DATA};

use assert_matches::assert_matches;
use bytes::Bytes;
use std::net::SocketAddr;
use std::str::FromStr;

fn addr(s: &str) -> TransportAddr {
    TransportAddr::new(SocketAddr::from_str(s).unwrap())
}

fn small_socket_config() -> SocketConfig {
    SocketConfig::default()
        .with_max_num_outbound_streams(16)
        .with_max_num_inbound_streams(16)
}

fn create_association(initial_tsn: u32) -> Association {
    Association::new(
        Arc::new(EndpointConfig::default()),
        Arc::new(small_socket_config()),
        Scope::Loopback,
        5000,
        0x0102_0304,
        initial_tsn,
    )
    .expect("valid construction parameters")
}

fn data_chunk(source: TransportAddr, tsn: u32) -> InboundChunk {
    InboundChunk {
        chunk_type: CT_PAYLOAD_DATA,
        source,
        tsn: Some(tsn),
        user_data: Bytes::from_static(b"ABC"),
    }
}

#[test]
fn test_new_rejects_bad_parameters() {
    let result = Association::new(
        Arc::new(EndpointConfig::default()),
        Arc::new(small_socket_config()),
        Scope::Loopback,
        0,
        1,
        1,
    );
    assert_eq!(Err(Error::ErrPortZero), result.map(|_| ()));

    let result = Association::new(
        Arc::new(EndpointConfig::default()),
        Arc::new(SocketConfig::default().with_max_num_outbound_streams(0)),
        Scope::Loopback,
        5000,
        1,
        1,
    );
    assert_eq!(Err(Error::ErrZeroStreams), result.map(|_| ()));
}

#[test]
fn test_new_failure_releases_config_references() {
    let endpoint_config = Arc::new(EndpointConfig::default());
    let socket_config = Arc::new(SocketConfig::default().with_max_num_inbound_streams(0));

    let result = Association::new(
        endpoint_config.clone(),
        socket_config.clone(),
        Scope::Loopback,
        5000,
        1,
        1,
    );
    assert!(result.is_err());
    assert_eq!(1, Arc::strong_count(&endpoint_config));
    assert_eq!(1, Arc::strong_count(&socket_config));
}

#[test]
fn test_tsn_monotonicity() {
    let mut a = create_association(1000);

    for i in 0..5u32 {
        assert_eq!(1000 + i, a.next_tsn());
    }
    assert_eq!(5, a.unack_data());
    assert_eq!(1005, a.next_tsn_block(10));
    assert_eq!(1015, a.next_tsn());
    assert_eq!(16, a.unack_data());
}

#[test]
fn test_tsn_wraps_silently() {
    let mut a = create_association(u32::MAX);

    assert_eq!(u32::MAX, a.next_tsn());
    assert_eq!(0, a.next_tsn());
    assert_eq!(u32::MAX.wrapping_sub(1), a.ctsn_ack_point());
}

#[test]
fn test_ssn_independence() {
    let mut a = create_association(1);

    assert_eq!(0, a.next_ssn(2));
    assert_eq!(1, a.next_ssn(2));
    assert_eq!(2, a.next_ssn(2));
    assert_eq!(0, a.next_ssn(7), "stream 7 unaffected by stream 2");
    assert_eq!(1, a.next_ssn(7));
}

#[test]
fn test_pmtu_is_minimum_over_transports() -> Result<()> {
    let now = Instant::now();

    let mut a = create_association(1);
    a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    a.add_peer(addr("10.0.0.2:36412"), 9000, now)?;
    a.add_peer(addr("10.0.0.3:36412"), 1200, now)?;
    assert_eq!(1200, a.pathmtu());

    // insertion order does not matter
    let mut b = create_association(1);
    b.add_peer(addr("10.0.0.3:36412"), 1200, now)?;
    b.add_peer(addr("10.0.0.2:36412"), 9000, now)?;
    b.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    assert_eq!(1200, b.pathmtu());

    Ok(())
}

#[test]
fn test_first_transport_becomes_every_path_role() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let idx = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    assert_eq!(Some(idx), a.primary_path());
    assert_eq!(Some(idx), a.active_path());
    assert_eq!(Some(idx), a.retran_path());

    // a second transport does not displace the established roles
    a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;
    assert_eq!(Some(idx), a.primary_path());
    assert_eq!(Some(idx), a.active_path());

    Ok(())
}

#[test]
fn test_add_peer_is_idempotent() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let first = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let second = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    assert_eq!(first, second, "same transport both times");
    assert_eq!(1, a.transports().len(), "no duplicate registered");

    Ok(())
}

#[test]
fn test_add_peer_rejects_port_mismatch() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    assert_eq!(
        Err(Error::ErrPortMismatch),
        a.add_peer(addr("10.0.0.2:9999"), 1500, now)
    );
    assert_eq!(36412, a.peer_port());

    Ok(())
}

#[test]
fn test_add_peer_rejects_out_of_scope_address() {
    let mut a = Association::new(
        Arc::new(EndpointConfig::default()),
        Arc::new(small_socket_config()),
        Scope::Global,
        5000,
        1,
        1,
    )
    .unwrap();

    assert_matches!(
        a.add_peer(addr("10.0.0.1:36412"), 1500, Instant::now()),
        Err(Error::ErrAddrOutOfScope)
    );
}

#[test]
fn test_error_threshold_capped_at_association_limit() -> Result<()> {
    let mut a = Association::new(
        Arc::new(EndpointConfig::default()),
        Arc::new(
            small_socket_config()
                .with_max_retrans_association(8)
                .with_max_retrans_path(5),
        ),
        Scope::Loopback,
        5000,
        1,
        1,
    )
    .unwrap();
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    assert_eq!(5, a.overall_error_threshold());
    a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;
    assert_eq!(8, a.overall_error_threshold(), "sum capped at 8");

    for _ in 0..7 {
        assert!(!a.record_transport_error(t0)?);
    }
    assert!(a.record_transport_error(t0)?, "eighth error trips the cap");

    a.clear_transport_error(t0)?;
    assert_eq!(0, a.overall_error_count());

    Ok(())
}

#[test]
fn test_refcount_roundtrip() {
    let mut a = create_association(1);
    assert_eq!(1, a.refs());

    for _ in 0..3 {
        a.retain();
    }
    for _ in 0..3 {
        assert!(!a.release(), "balanced releases never destroy");
    }
    assert_eq!(1, a.refs());
    assert!(!a.is_dead());

    // external holders outlive teardown; destruction happens on the last
    // release, exactly once
    a.retain();
    a.retain();
    a.teardown();
    assert!(a.is_dead());
    assert!(a.poll_endpoint_event().is_none(), "still referenced");

    assert!(!a.release());
    assert!(a.release(), "last reference destroys");
    let drained = a.poll_endpoint_event().expect("drained event");
    assert!(drained.is_drained());
    assert!(a.poll_endpoint_event().is_none(), "destroyed exactly once");
}

#[test]
fn test_teardown_is_idempotent() {
    let mut a = create_association(1);
    a.teardown();
    a.teardown();
    a.teardown();

    assert!(a.is_dead());
    let drained = a.poll_endpoint_event().expect("drained event");
    assert!(drained.is_drained());
    assert!(a.poll_endpoint_event().is_none());

    assert_eq!(
        Err(Error::ErrAssociationDead),
        a.add_peer(addr("10.0.0.1:36412"), 1500, Instant::now())
    );
}

#[test]
fn test_teardown_releases_owned_state() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    a.add_local_addr(addr("192.168.0.1:5000"));
    a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    a.push_inbound(data_chunk(addr("10.0.0.1:36412"), 1));
    a.start_timer(Timer::Heartbeat, now);
    assert_eq!(2, a.refs(), "armed timer holds a reference");

    a.teardown();
    assert!(a.transports().is_empty());
    assert!(a.bind_addrs().is_empty());
    assert_eq!(0, a.inbound_len());
    assert_eq!(None, a.primary_path());
    assert_eq!(0, a.refs(), "timer and lifecycle references both gone");

    Ok(())
}

#[test]
fn test_timer_reference_discipline() {
    let mut a = create_association(1);
    let now = Instant::now();

    a.start_timer(Timer::T3Rtx, now);
    assert_eq!(2, a.refs());
    // re-arming is not a second reference
    a.start_timer(Timer::T3Rtx, now);
    assert_eq!(2, a.refs());

    a.stop_timer(Timer::T3Rtx);
    assert_eq!(1, a.refs());
    // stopping a timer that is no longer pending releases nothing
    a.stop_timer(Timer::T3Rtx);
    assert_eq!(1, a.refs());

    a.start_timer(Timer::T3Rtx, now);
    let fired = a.handle_timeout(now + Duration::from_secs(10));
    assert_eq!(1, fired.len());
    assert_eq!(Timer::T3Rtx, fired[0].timer);
    assert_eq!(1, fired[0].n_retrans);
    assert_eq!(1, a.refs(), "expiry released the arming reference");

    assert!(a.handle_timeout(now + Duration::from_secs(10)).is_empty());

    // autoclose is disabled by default: arming it is a no-op
    a.start_timer(Timer::Autoclose, now);
    assert_eq!(1, a.refs());
    assert_eq!(None, a.next_timeout());
}

#[test]
fn test_path_failover_prefers_most_recently_heard() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;
    let t2 = a.add_peer(addr("10.0.0.3:36412"), 1500, now)?;

    // primary heard most recently, then t1, then t2
    a.transport_mut(t0).unwrap().last_time_heard = now + Duration::from_secs(2);
    a.transport_mut(t1).unwrap().last_time_heard = now + Duration::from_secs(1);
    a.transport_mut(t2).unwrap().last_time_heard = now;

    a.control_transport(t0, TransportCmd::Down, 7)?;

    assert_eq!(Some(t1), a.active_path(), "most recent survivor wins");
    assert_eq!(Some(t2), a.retran_path());
    assert_eq!(Some(t0), a.primary_path(), "primary is sticky");

    let event = a.poll_address_event().expect("exactly one notification");
    assert_eq!(addr("10.0.0.1:36412"), event.addr);
    assert_eq!(PeerAddressState::Unreachable, event.state);
    assert_eq!(7, event.error);
    assert!(a.poll_address_event().is_none());

    Ok(())
}

#[test]
fn test_active_primary_outranks_recency() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;

    // the secondary has been heard from more recently
    a.transport_mut(t1).unwrap().last_time_heard = now + Duration::from_secs(5);

    a.control_transport(t1, TransportCmd::Up, 0)?;

    assert_eq!(Some(t0), a.active_path(), "active primary keeps the slot");
    assert_eq!(Some(t1), a.retran_path(), "recency winner demoted to retran");

    Ok(())
}

#[test]
fn test_all_paths_down_falls_back_to_primary() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;

    a.control_transport(t0, TransportCmd::Down, 0)?;
    a.control_transport(t1, TransportCmd::Down, 0)?;

    assert_eq!(Some(t0), a.active_path(), "always send somewhere");
    assert_eq!(Some(t0), a.retran_path());

    Ok(())
}

#[test]
fn test_shutdown_transport_round_robin() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;
    let t2 = a.add_peer(addr("10.0.0.3:36412"), 1500, now)?;

    // first send goes out the active path
    assert_eq!(Some(t0), a.choose_shutdown_transport());
    // retransmissions walk the list
    assert_eq!(Some(t1), a.choose_shutdown_transport());
    assert_eq!(Some(t2), a.choose_shutdown_transport());
    assert_eq!(Some(t0), a.choose_shutdown_transport());

    // an unreachable path is skipped while any reachable one remains
    a.control_transport(t1, TransportCmd::Down, 0)?;
    assert_eq!(Some(t2), a.choose_shutdown_transport());

    Ok(())
}

#[test]
fn test_shutdown_transport_never_refuses() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;
    a.control_transport(t0, TransportCmd::Down, 0)?;
    a.control_transport(t1, TransportCmd::Down, 0)?;

    for _ in 0..5 {
        assert!(
            a.choose_shutdown_transport().is_some(),
            "graceful degradation, not failure"
        );
    }

    Ok(())
}

#[test]
fn test_lookup_tsn_searches_active_path_first() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1500, now)?;

    a.transport_mut(t0).unwrap().push_inflight(11, 100, now);
    a.transport_mut(t1).unwrap().push_inflight(10, 100, now);

    assert_eq!(Some(t0), a.lookup_tsn(11));
    assert_eq!(Some(t1), a.lookup_tsn(10));
    assert_eq!(None, a.lookup_tsn(99));

    Ok(())
}

#[test]
fn test_update_before_established_keeps_send_state() {
    let mut a = create_association(100);
    a.next_tsn();
    a.next_tsn();
    a.next_ssn(0);

    a.update(&HandshakeInfo {
        peer_vtag: 0xdead_beef,
        initial_tsn: 7777,
        peer_initial_tsn: 500,
        peer_rwnd: 128 * 1024,
        sack_needed: true,
        peer_ecn_capable: true,
    });

    assert_eq!(0xdead_beef, a.peer_vtag());
    assert_eq!(128 * 1024, a.peer_rwnd());
    assert_eq!(102, a.next_tsn(), "in-flight numbering survives");
    assert_eq!(101, a.ctsn_ack_point(), "ack point re-derived");
    assert_eq!(1, a.next_ssn(0), "stream sequences survive");
    assert_eq!(499, a.peer_cumulative_tsn());
}

#[test]
fn test_update_on_established_is_a_restart() {
    let mut a = create_association(100);
    a.next_tsn();
    a.next_ssn(0);
    a.next_ssn(0);
    a.set_state(AssociationState::Established);

    a.update(&HandshakeInfo {
        peer_vtag: 0x5555_0000,
        initial_tsn: 9000,
        peer_initial_tsn: 42,
        peer_rwnd: 64 * 1024,
        sack_needed: false,
        peer_ecn_capable: false,
    });

    assert_eq!(9000, a.next_tsn(), "sending re-seeded from the handshake");
    assert_eq!(8999, a.ctsn_ack_point());
    assert_eq!(0, a.next_ssn(0), "every stream starts over");
    assert_eq!(41, a.peer_cumulative_tsn());
}

struct RecordingDispatcher {
    seen: Vec<(AssociationState, crate::chunk::ChunkType)>,
    fail_on: Option<usize>,
    teardown_on: Option<usize>,
}

impl RecordingDispatcher {
    fn new() -> Self {
        RecordingDispatcher {
            seen: Vec::new(),
            fail_on: None,
            teardown_on: None,
        }
    }
}

impl ChunkDispatcher for RecordingDispatcher {
    fn dispatch(
        &mut self,
        _now: Instant,
        state: AssociationState,
        assoc: &mut Association,
        chunk: &InboundChunk,
    ) -> Result<()> {
        let n = self.seen.len();
        self.seen.push((state, chunk.chunk_type));
        if Some(n) == self.teardown_on {
            assoc.teardown();
        }
        if Some(n) == self.fail_on {
            return Err(Error::ErrDispatch("induced failure".to_owned()));
        }
        Ok(())
    }
}

#[test]
fn test_handle_inbound_updates_liveness_and_dispatches() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();
    let later = now + Duration::from_secs(3);

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    a.push_inbound(data_chunk(addr("10.0.0.1:36412"), 1));
    a.push_inbound(InboundChunk {
        chunk_type: CT_HEARTBEAT,
        source: addr("10.0.0.1:36412"),
        tsn: None,
        user_data: Bytes::new(),
    });

    let mut dispatcher = RecordingDispatcher::new();
    a.handle_inbound(later, &mut dispatcher)?;

    assert_eq!(2, dispatcher.seen.len());
    assert_eq!(
        (AssociationState::Closed, CT_PAYLOAD_DATA),
        dispatcher.seen[0]
    );
    assert_eq!(Some(t0), a.last_data_from());
    assert_eq!(
        later,
        a.transport(t0).unwrap().last_time_heard(),
        "data refreshed the source path"
    );
    assert_eq!(1, a.stats_mut().get_num_datas());

    Ok(())
}

#[test]
fn test_handle_inbound_halts_on_dispatch_error() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();
    let source = addr("10.0.0.1:36412");

    a.add_peer(source, 1500, now)?;
    for tsn in 1..=3 {
        a.push_inbound(data_chunk(source, tsn));
    }

    let mut dispatcher = RecordingDispatcher::new();
    dispatcher.fail_on = Some(1);

    let result = a.handle_inbound(now, &mut dispatcher);
    assert!(result.is_err());
    assert_eq!(2, dispatcher.seen.len(), "halted after the failure");
    assert_eq!(1, a.inbound_len(), "third chunk left queued");
    assert_eq!(
        Some(Error::ErrDispatch("induced failure".to_owned())),
        a.take_sock_error()
    );
    assert_eq!(None, a.take_sock_error(), "error surfaced once");

    Ok(())
}

#[test]
fn test_handle_inbound_stops_when_state_machine_frees() -> Result<()> {
    let mut a = create_association(1);
    let now = Instant::now();
    let source = addr("10.0.0.1:36412");

    a.add_peer(source, 1500, now)?;
    for tsn in 1..=3 {
        a.push_inbound(data_chunk(source, tsn));
    }

    let mut dispatcher = RecordingDispatcher::new();
    dispatcher.teardown_on = Some(0);

    a.handle_inbound(now, &mut dispatcher)?;
    assert_eq!(1, dispatcher.seen.len(), "drain stopped immediately");
    assert!(a.is_dead());

    Ok(())
}

#[test]
fn test_end_to_end_scenario() -> Result<()> {
    let mut a = Association::new(
        Arc::new(EndpointConfig::default()),
        Arc::new(small_socket_config()),
        Scope::Private,
        36412,
        0xfeed_f00d,
        7000,
    )?;
    let now = Instant::now();

    let t0 = a.add_peer(addr("10.0.0.1:36412"), 1500, now)?;
    let t1 = a.add_peer(addr("10.0.0.2:36412"), 1400, now)?;

    assert_eq!(1400, a.pathmtu());
    assert_eq!(1400 - (20 + 12 + 16), a.frag_point());

    a.control_transport(t0, TransportCmd::Up, 0)?;
    a.control_transport(t1, TransportCmd::Down, 0)?;

    assert_eq!(Some(t0), a.active_path());
    assert_eq!(
        2,
        a.stats_mut().get_num_peer_addr_events(),
        "one notification per control"
    );

    Ok(())
}
