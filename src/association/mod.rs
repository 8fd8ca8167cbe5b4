#[cfg(test)]
mod association_test;

pub(crate) mod state;
pub(crate) mod stats;
pub(crate) mod stream;
pub(crate) mod timer;

pub use self::state::AssociationState;
pub use self::stats::AssociationStats;
pub use self::timer::Timer;

use crate::address::{Scope, TransportAddr};
use crate::chunk::InboundChunk;
use crate::config::{EndpointConfig, SocketConfig, DEFAULT_PEER_RWND, RWND_MIN};
use crate::error::{Error, Result};
use crate::queue::{InboundQueue, OutboundQueue};
use crate::shared::{
    EndpointEvent, EndpointEventInner, PeerAddressChange, PeerAddressState, TransportCmd,
};
use crate::transport::{Transport, TransportState};
use crate::tsn_map::{Gap, TsnMap};
use self::stream::SsnMap;
use self::timer::{RtoManager, TimerTable, ACK_INTERVAL};

use log::{debug, error, trace, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tinyvec::TinyVec;

/// Peer parameters learned from a completed handshake, merged into an
/// existing association by [`Association::update`].
#[derive(Debug, Clone)]
pub struct HandshakeInfo {
    pub peer_vtag: u32,
    /// Our initial TSN for the (possibly restarted) association.
    pub initial_tsn: u32,
    /// The peer's initial TSN.
    pub peer_initial_tsn: u32,
    pub peer_rwnd: u32,
    pub sack_needed: bool,
    pub peer_ecn_capable: bool,
}

/// The external state machine that drives association state transitions.
///
/// `dispatch` receives each inbound chunk together with a snapshot of the
/// state it arrived in. The implementation may tear the association down
/// as a side effect (via [`Association::teardown`]); the drain loop
/// detects that and stops.
pub trait ChunkDispatcher {
    fn dispatch(
        &mut self,
        now: Instant,
        state: AssociationState,
        assoc: &mut Association,
        chunk: &InboundChunk,
    ) -> Result<()>;
}

/// An expired timer reported by [`Association::handle_timeout`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timeout {
    pub timer: Timer,
    /// How many times this class has now expired without being stopped.
    pub n_retrans: u32,
}

/// A logical SCTP session between a local endpoint and one remote peer
/// that may be reachable at several addresses.
///
/// The association owns its transports, sequence-number generators, and
/// timers; the endpoint, packet codec, and state machine collaborate with
/// it through narrow seams. All mutating operations take `&mut self`: the
/// caller serializes access, this type does no internal locking. The
/// reference count is the one cross-context-safe piece of state — timers
/// and queue callbacks that outlive a call [`retain`](Self::retain) the
/// association and [`release`](Self::release) it when done.
pub struct Association {
    // shared owners, released at destroy
    endpoint_config: Option<Arc<EndpointConfig>>,
    socket_config: Option<Arc<SocketConfig>>,

    // lifetime accounting
    refcnt: AtomicUsize,
    dead: AtomicBool,
    destroyed: bool,
    endpoint_events: VecDeque<EndpointEvent>,

    state: AssociationState,
    scope: Scope,
    my_vtag: u32,
    peer_vtag: u32,
    my_port: u16,
    peer_port: u16,

    // sequence numbers
    my_next_tsn: u32,
    ctsn_ack_point: u32,
    unack_data: u32,
    streams: SsnMap,
    tsn_map: TsnMap,

    // local addresses
    bind_addrs: Vec<TransportAddr>,

    // peer transports and path roles (indices into `transports`)
    transports: Vec<Transport>,
    primary_path: Option<usize>,
    active_path: Option<usize>,
    retran_path: Option<usize>,
    shutdown_last_sent_to: Option<usize>,
    last_data_from: Option<usize>,

    pathmtu: u32,
    frag_point: u32,

    // peer parameters
    peer_rwnd: u32,
    my_rwnd: u32,
    sack_needed: bool,
    peer_ecn_capable: bool,

    // failure thresholds
    max_retrans: u32,
    max_retrans_path: u32,
    overall_error_count: u32,
    overall_error_threshold: u32,

    // timing, copied out of socket options at creation
    rto_initial: Duration,
    rto_min: Duration,
    rto_max: Duration,
    hb_interval: Duration,
    cookie_life: Duration,
    autoclose: Option<Duration>,
    timers: TimerTable,

    // queues and notification channels
    inqueue: InboundQueue,
    outqueue: OutboundQueue,
    ulp_events: VecDeque<PeerAddressChange>,

    pub(crate) stats: AssociationStats,
    sock_error: Option<Error>,
}

impl Association {
    /// Create an association in the CLOSED state.
    ///
    /// Takes shared references on the endpoint and socket configuration;
    /// both are held until the association is destroyed. The verification
    /// tag and initial TSN come from the endpoint's generator. Fails on a
    /// zero local port or a zero stream count in either direction; on
    /// failure everything partially constructed, references included, is
    /// released by drop.
    pub fn new(
        endpoint_config: Arc<EndpointConfig>,
        socket_config: Arc<SocketConfig>,
        scope: Scope,
        local_port: u16,
        my_vtag: u32,
        initial_tsn: u32,
    ) -> Result<Self> {
        if local_port == 0 {
            return Err(Error::ErrPortZero);
        }
        if socket_config.max_num_outbound_streams() == 0
            || socket_config.max_num_inbound_streams() == 0
        {
            return Err(Error::ErrZeroStreams);
        }

        let streams = SsnMap::new(
            socket_config.max_num_outbound_streams(),
            socket_config.max_num_inbound_streams(),
        );
        let my_rwnd = socket_config.recv_buffer_size().max(RWND_MIN);

        let assoc = Association {
            state: AssociationState::Closed,
            scope,
            my_vtag,
            peer_vtag: 0,
            my_port: local_port,
            peer_port: 0,

            my_next_tsn: initial_tsn,
            ctsn_ack_point: initial_tsn.wrapping_sub(1),
            unack_data: 0,
            streams,
            // re-anchored once the peer's initial TSN is learned
            tsn_map: TsnMap::new(0),

            bind_addrs: Vec::new(),

            transports: Vec::new(),
            primary_path: None,
            active_path: None,
            retran_path: None,
            shutdown_last_sent_to: None,
            last_data_from: None,

            pathmtu: 0,
            frag_point: 0,

            peer_rwnd: DEFAULT_PEER_RWND,
            my_rwnd,
            sack_needed: false,
            peer_ecn_capable: false,

            max_retrans: socket_config.max_retrans_association(),
            max_retrans_path: socket_config.max_retrans_path(),
            overall_error_count: 0,
            overall_error_threshold: 0,

            rto_initial: socket_config.rto_initial(),
            rto_min: socket_config.rto_min(),
            rto_max: socket_config.rto_max(),
            hb_interval: socket_config.heartbeat_interval(),
            cookie_life: socket_config.cookie_life(),
            autoclose: socket_config.autoclose(),
            timers: TimerTable::new(),

            inqueue: InboundQueue::new(),
            outqueue: OutboundQueue::new(),
            ulp_events: VecDeque::new(),

            // the lifecycle's own reference
            refcnt: AtomicUsize::new(1),
            dead: AtomicBool::new(false),
            destroyed: false,
            endpoint_events: VecDeque::new(),

            endpoint_config: Some(endpoint_config),
            socket_config: Some(socket_config),

            stats: AssociationStats::default(),
            sock_error: None,
        };

        debug!("association {}: created on port {}", my_vtag, local_port);
        Ok(assoc)
    }

    //
    // lifetime
    //

    /// Take a reference for a holder that outlives the current call.
    pub fn retain(&self) {
        self.refcnt.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop one reference. The last release destroys the association;
    /// returns true exactly then.
    pub fn release(&mut self) -> bool {
        let prev = self.refcnt.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev != 0, "release without matching retain");
        if prev == 1 {
            self.destroy();
            true
        } else {
            false
        }
    }

    pub fn refs(&self) -> usize {
        self.refcnt.load(Ordering::Relaxed)
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Release everything the association owns and mark it dead.
    ///
    /// Safe to call at most once per active lifetime and tolerant of a
    /// second call racing in: the dead flag is claimed atomically. Cancels
    /// every pending timer, which releases the reference each arming took,
    /// then drops the lifecycle's own reference. Actual destruction waits
    /// for the last outstanding holder.
    pub fn teardown(&mut self) {
        if self.dead.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("association {}: teardown", self.my_vtag);

        self.outqueue.teardown();
        self.inqueue.clear();
        self.ulp_events.clear();
        self.bind_addrs.clear();

        for timer in Timer::VALUES.iter() {
            self.stop_timer(*timer);
        }

        self.transports.clear();
        self.primary_path = None;
        self.active_path = None;
        self.retran_path = None;
        self.shutdown_last_sent_to = None;
        self.last_data_from = None;

        self.release();
    }

    /// Invoked by the last `release`. Reaching zero references without a
    /// prior teardown is a reference-counting bug upstream.
    fn destroy(&mut self) {
        if !self.is_dead() {
            error!(
                "association {}: destroyed without teardown",
                self.my_vtag
            );
            debug_assert!(false, "destroy before teardown");
        }
        debug_assert!(!self.destroyed, "association destroyed twice");
        self.destroyed = true;

        self.endpoint_config.take();
        self.socket_config.take();
        self.endpoint_events
            .push_back(EndpointEvent(EndpointEventInner::Drained));
        debug!("association {}: destroyed", self.my_vtag);
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Hand this association to a different endpoint/socket pair. Old
    /// references are released, new ones taken. The endpoint-level
    /// re-registration is `Endpoint::migrate`'s half of the job.
    pub(crate) fn rehome(
        &mut self,
        endpoint_config: Arc<EndpointConfig>,
        socket_config: Arc<SocketConfig>,
    ) {
        self.endpoint_config = Some(endpoint_config);
        self.socket_config = Some(socket_config);
    }

    //
    // accessors
    //

    pub fn state(&self) -> AssociationState {
        self.state
    }

    /// Record a state transition decided by the external state machine.
    pub fn set_state(&mut self, state: AssociationState) {
        trace!(
            "association {}: state {} -> {}",
            self.my_vtag,
            self.state,
            state
        );
        self.state = state;
    }

    pub fn my_vtag(&self) -> u32 {
        self.my_vtag
    }

    pub fn peer_vtag(&self) -> u32 {
        self.peer_vtag
    }

    pub fn my_port(&self) -> u16 {
        self.my_port
    }

    pub fn peer_port(&self) -> u16 {
        self.peer_port
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn pathmtu(&self) -> u32 {
        self.pathmtu
    }

    pub fn frag_point(&self) -> u32 {
        self.frag_point
    }

    pub fn peer_rwnd(&self) -> u32 {
        self.peer_rwnd
    }

    pub fn my_rwnd(&self) -> u32 {
        self.my_rwnd
    }

    pub fn unack_data(&self) -> u32 {
        self.unack_data
    }

    pub fn ctsn_ack_point(&self) -> u32 {
        self.ctsn_ack_point
    }

    pub fn cookie_life(&self) -> Duration {
        self.cookie_life
    }

    pub fn overall_error_count(&self) -> u32 {
        self.overall_error_count
    }

    pub fn overall_error_threshold(&self) -> u32 {
        self.overall_error_threshold
    }

    pub fn take_sock_error(&mut self) -> Option<Error> {
        self.sock_error.take()
    }

    pub fn stats_mut(&mut self) -> &mut AssociationStats {
        &mut self.stats
    }

    //
    // local bind addresses
    //

    /// Add a local address to the bind set; exact duplicates are ignored.
    pub fn add_local_addr(&mut self, addr: TransportAddr) {
        if !self.bind_addrs.iter().any(|a| a.equal_exact(&addr)) {
            self.bind_addrs.push(addr);
        }
    }

    pub fn bind_addrs(&self) -> &[TransportAddr] {
        &self.bind_addrs
    }

    //
    // transport registry
    //

    /// Register a peer address, returning the index of its transport.
    ///
    /// Adding an address that exactly matches an existing transport
    /// returns that transport — the operation is idempotent. The first
    /// transport becomes primary, active, and retransmission path in one
    /// step. The association's path MTU is the floor over all transports
    /// and the fragmentation point follows it.
    pub fn add_peer(&mut self, addr: TransportAddr, pmtu: u32, now: Instant) -> Result<usize> {
        if self.is_dead() {
            return Err(Error::ErrAssociationDead);
        }
        if addr.port() == 0 {
            return Err(Error::ErrPortZero);
        }
        if self.peer_port != 0 && addr.port() != self.peer_port {
            warn!(
                "association {}: peer address {} does not match peer port {}",
                self.my_vtag, addr, self.peer_port
            );
            return Err(Error::ErrPortMismatch);
        }
        if !self.scope.allows(&addr) {
            return Err(Error::ErrAddrOutOfScope);
        }

        if let Some(idx) = self.lookup_transport(&addr) {
            return Ok(idx);
        }

        let mut transport = Transport::new(
            addr,
            pmtu,
            RtoManager::new(self.rto_initial, self.rto_min, self.rto_max),
            now,
        );
        transport.ssthresh = self.peer_rwnd;
        transport.max_path_retrans = self.max_retrans_path;
        transport.hb_interval = self.hb_interval;

        if self.pathmtu == 0 || transport.pmtu < self.pathmtu {
            self.pathmtu = transport.pmtu;
            self.frag_point = crate::config::frag_point(self.pathmtu);
        }

        // fold the path's failure budget into the association's, bounded
        // by the association-level limit
        self.overall_error_threshold =
            (self.overall_error_threshold + transport.max_path_retrans).min(self.max_retrans);

        if self.peer_port == 0 {
            self.peer_port = addr.port();
        }

        trace!("association {}: added peer transport {}", self.my_vtag, addr);
        self.transports.push(transport);
        let idx = self.transports.len() - 1;

        if self.primary_path.is_none() {
            self.primary_path = Some(idx);
            self.active_path = Some(idx);
            self.retran_path = Some(idx);
        }

        Ok(idx)
    }

    /// Find the transport for an address (exact match).
    pub fn lookup_transport(&self, addr: &TransportAddr) -> Option<usize> {
        self.transports.iter().position(|t| t.addr.equal_exact(addr))
    }

    /// Find which transport is carrying an unacknowledged TSN.
    ///
    /// The active path is searched first — acknowledgements overwhelmingly
    /// concern it — then the remaining transports in list order.
    pub fn lookup_tsn(&self, tsn: u32) -> Option<usize> {
        if let Some(active) = self.active_path {
            if self.transports[active].holds_tsn(tsn) {
                return Some(active);
            }
        }
        for (idx, transport) in self.transports.iter().enumerate() {
            if Some(idx) == self.active_path {
                continue;
            }
            if transport.holds_tsn(tsn) {
                return Some(idx);
            }
        }
        None
    }

    pub fn transport(&self, idx: usize) -> Option<&Transport> {
        self.transports.get(idx)
    }

    pub(crate) fn transport_mut(&mut self, idx: usize) -> Option<&mut Transport> {
        self.transports.get_mut(idx)
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    pub fn primary_path(&self) -> Option<usize> {
        self.primary_path
    }

    pub fn active_path(&self) -> Option<usize> {
        self.active_path
    }

    pub fn retran_path(&self) -> Option<usize> {
        self.retran_path
    }

    pub fn last_data_from(&self) -> Option<usize> {
        self.last_data_from
    }

    /// Change the administratively preferred path. Path roles are
    /// recomputed immediately; an active primary always wins the active
    /// slot.
    pub fn set_primary(&mut self, idx: usize) -> Result<()> {
        if idx >= self.transports.len() {
            return Err(Error::ErrTransportNotFound);
        }
        self.primary_path = Some(idx);
        self.select_paths();
        Ok(())
    }

    //
    // path selection
    //

    /// Apply a reachability verdict to one transport, notify the upper
    /// layer, and recompute the active and retransmission paths.
    ///
    /// The notification is enqueued for later polling, never delivered by
    /// a re-entrant call.
    pub fn control_transport(&mut self, idx: usize, cmd: TransportCmd, error: u32) -> Result<()> {
        if idx >= self.transports.len() {
            return Err(Error::ErrTransportNotFound);
        }

        let (transport_state, peer_state) = match cmd {
            TransportCmd::Up => (TransportState::Active, PeerAddressState::Available),
            TransportCmd::Down => (TransportState::Inactive, PeerAddressState::Unreachable),
        };
        self.transports[idx].state = transport_state;

        self.ulp_events.push_back(PeerAddressChange {
            addr: self.transports[idx].addr,
            state: peer_state,
            error,
        });
        self.stats.inc_peer_addr_events();

        let old_active = self.active_path;
        self.select_paths();
        if self.active_path != old_active {
            self.stats.inc_failovers();
            debug!(
                "association {}: active path {:?} -> {:?}",
                self.my_vtag, old_active, self.active_path
            );
        }
        Ok(())
    }

    /// Recompute the active and retransmission paths.
    ///
    /// The two most recently heard-from active transports win the two
    /// slots, ties going to the earlier list position, except that an
    /// active primary path outranks pure recency. With no active
    /// transport at all both slots fall back to the primary — the
    /// association always has somewhere to send.
    fn select_paths(&mut self) {
        let mut first: Option<usize> = None;
        let mut second: Option<usize> = None;

        for (idx, transport) in self.transports.iter().enumerate() {
            if !transport.is_active() {
                continue;
            }
            if first.map_or(true, |f| {
                transport.last_time_heard > self.transports[f].last_time_heard
            }) {
                second = first;
                first = Some(idx);
            } else if second.map_or(true, |s| {
                transport.last_time_heard > self.transports[s].last_time_heard
            }) {
                second = Some(idx);
            }
        }

        if let Some(primary) = self.primary_path {
            if self.transports[primary].is_active() && first != Some(primary) {
                second = first;
                first = Some(primary);
            }
        }

        if first.is_none() {
            first = self.primary_path;
            second = self.primary_path;
        }

        self.active_path = first;
        self.retran_path = second.or(first);
    }

    /// Pick the transport for a SHUTDOWN (re)transmission.
    ///
    /// The first send goes out the active path. Retransmissions
    /// round-robin the transport list starting after the last one used,
    /// preferring reachable paths; when every path is down the walk comes
    /// full circle and settles where it started rather than refusing.
    pub fn choose_shutdown_transport(&mut self) -> Option<usize> {
        let n = self.transports.len();
        if n == 0 {
            return None;
        }

        let last = match self.shutdown_last_sent_to {
            None => {
                self.shutdown_last_sent_to = self.active_path;
                return self.active_path;
            }
            Some(last) => last,
        };

        let mut choice = last;
        for step in 1..=n {
            let idx = (last + step) % n;
            choice = idx;
            if self.transports[idx].is_active() {
                break;
            }
        }

        self.shutdown_last_sent_to = Some(choice);
        Some(choice)
    }

    //
    // failure accounting
    //

    /// Count a retransmission failure against a path and the association.
    /// Returns true when the association-level threshold is reached.
    pub fn record_transport_error(&mut self, idx: usize) -> Result<bool> {
        let transport = self
            .transports
            .get_mut(idx)
            .ok_or(Error::ErrTransportNotFound)?;
        transport.record_error();
        self.overall_error_count += 1;
        Ok(self.overall_error_count >= self.overall_error_threshold)
    }

    /// Reachability proven on a path: clear its error count and the
    /// association's.
    pub fn clear_transport_error(&mut self, idx: usize) -> Result<()> {
        let transport = self
            .transports
            .get_mut(idx)
            .ok_or(Error::ErrTransportNotFound)?;
        transport.clear_errors();
        self.overall_error_count = 0;
        Ok(())
    }

    //
    // sequence number allocation
    //

    /// Allocate the next TSN. Wraps silently at 2^32 — modular arithmetic
    /// is what the protocol wants.
    pub fn next_tsn(&mut self) -> u32 {
        let tsn = self.my_next_tsn;
        self.my_next_tsn = self.my_next_tsn.wrapping_add(1);
        self.unack_data += 1;
        tsn
    }

    /// Allocate a contiguous block of `count` TSNs, returning the base.
    pub fn next_tsn_block(&mut self, count: u32) -> u32 {
        let base = self.my_next_tsn;
        self.my_next_tsn = self.my_next_tsn.wrapping_add(count);
        self.unack_data += count;
        base
    }

    /// Allocate the next SSN on an outbound stream. `stream_id` must be
    /// below the negotiated outbound stream count (caller contract).
    pub fn next_ssn(&mut self, stream_id: u16) -> u16 {
        self.streams.next_ssn(stream_id)
    }

    pub fn outbound_streams(&self) -> u16 {
        self.streams.outbound_streams()
    }

    pub fn inbound_streams(&self) -> u16 {
        self.streams.inbound_streams()
    }

    //
    // peer TSN tracking
    //

    /// Record receipt of a peer TSN.
    pub fn mark_received(&mut self, tsn: u32) {
        self.tsn_map.mark(tsn);
    }

    pub fn is_duplicate(&self, tsn: u32) -> bool {
        self.tsn_map.is_duplicate(tsn)
    }

    /// Cumulative TSN ack point to advertise back to the peer.
    pub fn peer_cumulative_tsn(&self) -> u32 {
        self.tsn_map.cumulative_tsn_ack_point()
    }

    /// Gap-ack blocks for the external SACK builder.
    pub fn gap_ack_blocks(&self) -> TinyVec<[Gap; 4]> {
        self.tsn_map.gap_ack_blocks()
    }

    //
    // handshake merge
    //

    /// Merge the parameters of a freshly completed handshake.
    ///
    /// An ESTABLISHED association seeing a new handshake means the peer
    /// restarted: sending state is re-seeded from the new handshake and
    /// every stream sequence starts over. Before ESTABLISHED this is the
    /// tail of a normal handshake and in-flight send state must survive,
    /// so only the acknowledgement point is re-derived.
    pub fn update(&mut self, info: &HandshakeInfo) {
        self.peer_vtag = info.peer_vtag;
        self.peer_rwnd = info.peer_rwnd;
        self.sack_needed = info.sack_needed;
        self.peer_ecn_capable = info.peer_ecn_capable;

        if self.state.is_established() {
            debug!("association {}: peer restarted", self.my_vtag);
            self.my_next_tsn = info.initial_tsn;
            self.ctsn_ack_point = self.my_next_tsn.wrapping_sub(1);
            self.unack_data = 0;
            self.streams.reset();
            self.tsn_map.reinit(info.peer_initial_tsn);
        } else {
            self.ctsn_ack_point = self.my_next_tsn.wrapping_sub(1);
            self.tsn_map.reinit(info.peer_initial_tsn);
        }
    }

    pub fn sack_needed(&self) -> bool {
        self.sack_needed
    }

    pub fn peer_ecn_capable(&self) -> bool {
        self.peer_ecn_capable
    }

    //
    // timers
    //

    /// Arm a timer. A newly armed slot takes one reference on the
    /// association, held until the timer expires or is stopped.
    pub fn start_timer(&mut self, timer: Timer, now: Instant) {
        let interval = match timer {
            Timer::T1Init | Timer::T1Cookie => self.rto_initial,
            Timer::T2Shutdown | Timer::T3Rtx => self
                .active_path
                .and_then(|idx| self.transports.get(idx))
                .map(|t| t.rto())
                .unwrap_or(self.rto_initial),
            Timer::Heartbeat => self.hb_interval,
            Timer::Ack => ACK_INTERVAL,
            Timer::Autoclose => match self.autoclose {
                Some(interval) => interval,
                None => return,
            },
        };

        if self.timers.start(timer, now, interval, self.rto_max) {
            self.retain();
        }
    }

    /// Cancel a pending timer, releasing the reference its arming took.
    /// A timer that already fired (or was never armed) is a no-op: the
    /// claim in the timer table guarantees at most one release.
    pub fn stop_timer(&mut self, timer: Timer) {
        if self.timers.stop(timer) {
            self.release();
        }
    }

    pub fn next_timeout(&self) -> Option<Instant> {
        self.timers.next_timeout()
    }

    /// Claim and report every timer due at `now`. Each expiry releases
    /// the reference its arming took; reacting (and re-arming) is the
    /// external state machine's job.
    pub fn handle_timeout(&mut self, now: Instant) -> Vec<Timeout> {
        let mut fired = Vec::new();
        for timer in Timer::VALUES.iter() {
            if let Some(n_retrans) = self.timers.expire(*timer, now) {
                match *timer {
                    Timer::T3Rtx => self.stats.inc_t3timeouts(),
                    Timer::Heartbeat => self.stats.inc_heartbeats(),
                    _ => {}
                }
                fired.push(Timeout {
                    timer: *timer,
                    n_retrans,
                });
                self.release();
            }
        }
        fired
    }

    //
    // queues and events
    //

    /// Queue a chunk from packet demux for the next `handle_inbound` pass.
    pub fn push_inbound(&mut self, chunk: InboundChunk) {
        self.inqueue.push(chunk);
    }

    pub fn inbound_len(&self) -> usize {
        self.inqueue.len()
    }

    pub fn outqueue(&self) -> &OutboundQueue {
        &self.outqueue
    }

    pub fn outqueue_mut(&mut self) -> &mut OutboundQueue {
        &mut self.outqueue
    }

    /// Next peer-address-change notification for the upper layer, if any.
    pub fn poll_address_event(&mut self) -> Option<PeerAddressChange> {
        self.ulp_events.pop_front()
    }

    /// Next event for the owning endpoint, if any.
    pub fn poll_endpoint_event(&mut self) -> Option<EndpointEvent> {
        self.endpoint_events.pop_front()
    }

    //
    // inbound dispatch
    //

    /// Drain the input queue through the external state machine.
    ///
    /// Data chunks refresh liveness bookkeeping for the path they arrived
    /// on before dispatch. After every dispatch the association re-checks
    /// whether the state machine tore it down and stops immediately if
    /// so. The first dispatch error becomes the socket-level error and
    /// halts the pass; chunks already drained are not replayed.
    pub fn handle_inbound(
        &mut self,
        now: Instant,
        dispatcher: &mut dyn ChunkDispatcher,
    ) -> Result<()> {
        while let Some(chunk) = self.inqueue.pop() {
            if chunk.is_data() {
                self.stats.inc_datas();
                if let Some(idx) = self.lookup_transport(&chunk.source) {
                    self.last_data_from = Some(idx);
                    self.transports[idx].last_time_heard = now;
                } else {
                    warn!(
                        "association {}: data from unknown peer address {}",
                        self.my_vtag, chunk.source
                    );
                }
            }

            let state = self.state;
            if let Err(err) = dispatcher.dispatch(now, state, self, &chunk) {
                self.sock_error = Some(err.clone());
                return Err(err);
            }
            if self.is_dead() {
                break;
            }
        }
        Ok(())
    }
}
