use crate::util::{RandomVerificationTagGenerator, VerificationTagGenerator};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Path MTU assumed for a transport until discovery learns better.
pub(crate) const DEFAULT_PMTU: u32 = 1500;
/// SCTP common header.
pub(crate) const COMMON_HEADER_SIZE: u32 = 12;
/// DATA chunk header, flags and TSN/stream/SSN words included.
pub(crate) const DATA_CHUNK_HEADER_SIZE: u32 = 16;
/// Worst-case IP header on the paths we care about.
pub(crate) const IP_HEADER_SIZE: u32 = 20;
/// Protocol floor for an advertised receive window.
pub(crate) const RWND_MIN: u32 = 1500;
/// Peer receive window assumed until the handshake reports the real one.
pub(crate) const DEFAULT_PEER_RWND: u32 = 65535;
pub(crate) const INITIAL_RECV_BUF_SIZE: u32 = 1024 * 1024;

const DEFAULT_MAX_OUTBOUND_STREAMS: u16 = 10;
const DEFAULT_MAX_INBOUND_STREAMS: u16 = u16::MAX;
const DEFAULT_MAX_RETRANS_ASSOCIATION: u32 = 10;
const DEFAULT_MAX_RETRANS_PATH: u32 = 5;
const DEFAULT_MAX_INIT_ATTEMPTS: u32 = 8;
const DEFAULT_RTO_INITIAL: Duration = Duration::from_millis(3000);
const DEFAULT_RTO_MIN: Duration = Duration::from_millis(1000);
const DEFAULT_RTO_MAX: Duration = Duration::from_millis(60000);
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_COOKIE_LIFE: Duration = Duration::from_secs(60);

/// Largest DATA payload that fits one packet on a path with the given MTU.
pub(crate) fn frag_point(pmtu: u32) -> u32 {
    pmtu.saturating_sub(IP_HEADER_SIZE + COMMON_HEADER_SIZE + DATA_CHUNK_HEADER_SIZE)
}

/// SocketConfig collects the socket-level options an association inherits
/// at creation into a single structure.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    max_num_outbound_streams: u16,
    max_num_inbound_streams: u16,
    recv_buffer_size: u32,
    rto_initial: Duration,
    rto_min: Duration,
    rto_max: Duration,
    max_retrans_association: u32,
    max_retrans_path: u32,
    max_init_attempts: u32,
    heartbeat_interval: Duration,
    cookie_life: Duration,
    autoclose: Option<Duration>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        SocketConfig {
            max_num_outbound_streams: DEFAULT_MAX_OUTBOUND_STREAMS,
            max_num_inbound_streams: DEFAULT_MAX_INBOUND_STREAMS,
            recv_buffer_size: INITIAL_RECV_BUF_SIZE,
            rto_initial: DEFAULT_RTO_INITIAL,
            rto_min: DEFAULT_RTO_MIN,
            rto_max: DEFAULT_RTO_MAX,
            max_retrans_association: DEFAULT_MAX_RETRANS_ASSOCIATION,
            max_retrans_path: DEFAULT_MAX_RETRANS_PATH,
            max_init_attempts: DEFAULT_MAX_INIT_ATTEMPTS,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            cookie_life: DEFAULT_COOKIE_LIFE,
            autoclose: None,
        }
    }
}

impl SocketConfig {
    pub fn with_max_num_outbound_streams(mut self, value: u16) -> Self {
        self.max_num_outbound_streams = value;
        self
    }

    pub fn with_max_num_inbound_streams(mut self, value: u16) -> Self {
        self.max_num_inbound_streams = value;
        self
    }

    pub fn with_recv_buffer_size(mut self, value: u32) -> Self {
        self.recv_buffer_size = value;
        self
    }

    pub fn with_rto_bounds(mut self, initial: Duration, min: Duration, max: Duration) -> Self {
        self.rto_initial = initial;
        self.rto_min = min;
        self.rto_max = max;
        self
    }

    pub fn with_max_retrans_association(mut self, value: u32) -> Self {
        self.max_retrans_association = value;
        self
    }

    pub fn with_max_retrans_path(mut self, value: u32) -> Self {
        self.max_retrans_path = value;
        self
    }

    pub fn with_max_init_attempts(mut self, value: u32) -> Self {
        self.max_init_attempts = value;
        self
    }

    pub fn with_heartbeat_interval(mut self, value: Duration) -> Self {
        self.heartbeat_interval = value;
        self
    }

    pub fn with_cookie_life(mut self, value: Duration) -> Self {
        self.cookie_life = value;
        self
    }

    pub fn with_autoclose(mut self, value: Option<Duration>) -> Self {
        self.autoclose = value;
        self
    }

    pub(crate) fn max_num_outbound_streams(&self) -> u16 {
        self.max_num_outbound_streams
    }

    pub(crate) fn max_num_inbound_streams(&self) -> u16 {
        self.max_num_inbound_streams
    }

    pub(crate) fn recv_buffer_size(&self) -> u32 {
        self.recv_buffer_size
    }

    pub(crate) fn rto_initial(&self) -> Duration {
        self.rto_initial
    }

    pub(crate) fn rto_min(&self) -> Duration {
        self.rto_min
    }

    pub(crate) fn rto_max(&self) -> Duration {
        self.rto_max
    }

    pub(crate) fn max_retrans_association(&self) -> u32 {
        self.max_retrans_association
    }

    pub(crate) fn max_retrans_path(&self) -> u32 {
        self.max_retrans_path
    }

    pub(crate) fn max_init_attempts(&self) -> u32 {
        self.max_init_attempts
    }

    pub(crate) fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub(crate) fn cookie_life(&self) -> Duration {
        self.cookie_life
    }

    pub(crate) fn autoclose(&self) -> Option<Duration> {
        self.autoclose
    }
}

/// Global configuration for the endpoint, affecting all associations.
///
/// Default values should be suitable for most internet applications.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Verification tag generator factory
    ///
    /// Creates the generator an `Endpoint` uses to mint verification tags
    /// and initial TSNs for the associations it owns.
    pub(crate) tag_generator_factory:
        Arc<dyn Fn() -> Box<dyn VerificationTagGenerator> + Send + Sync>,

    /// Maximum number of concurrent associations per endpoint.
    pub(crate) max_associations: u32,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointConfig {
    /// Create a default config
    pub fn new() -> Self {
        let tag_factory: fn() -> Box<dyn VerificationTagGenerator> =
            || Box::new(RandomVerificationTagGenerator::default());
        Self {
            tag_generator_factory: Arc::new(tag_factory),
            max_associations: 100_000,
        }
    }

    /// Supply a custom verification tag generator factory.
    ///
    /// Called once by each `Endpoint` constructed from this configuration.
    /// Generated tags and initial TSNs gate every packet the association
    /// later accepts, so a custom generator must preserve their
    /// unpredictability to third parties.
    pub fn tag_generator<F: Fn() -> Box<dyn VerificationTagGenerator> + Send + Sync + 'static>(
        &mut self,
        factory: F,
    ) -> &mut Self {
        self.tag_generator_factory = Arc::new(factory);
        self
    }

    /// Limit the number of associations an endpoint will carry at once.
    pub fn max_associations(&mut self, value: u32) -> &mut Self {
        self.max_associations = value;
        self
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("EndpointConfig")
            .field("max_associations", &self.max_associations)
            .field("tag_generator_factory", &"[ elided ]")
            .finish()
    }
}
