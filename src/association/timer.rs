use std::time::{Duration, Instant};

/// Delayed-ack interval.
pub(crate) const ACK_INTERVAL: Duration = Duration::from_millis(200);

const TIMER_COUNT: usize = 7;

/// The timeout classes an association arms, one slot each.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum Timer {
    T1Init = 0,
    T1Cookie = 1,
    T2Shutdown = 2,
    T3Rtx = 3,
    Heartbeat = 4,
    Ack = 5,
    Autoclose = 6,
}

impl Timer {
    pub(crate) const VALUES: [Self; TIMER_COUNT] = [
        Timer::T1Init,
        Timer::T1Cookie,
        Timer::T2Shutdown,
        Timer::T3Rtx,
        Timer::Heartbeat,
        Timer::Ack,
        Timer::Autoclose,
    ];
}

/// A table of deadlines, one per distinct kind of `Timer`.
///
/// Arming a slot takes one reference on the owning association; expiry or
/// cancellation releases it. The `Option` in each slot is the claim:
/// whoever takes it owns the release, so the release happens at most
/// once no matter how a pending timer ends.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct TimerTable {
    deadline: [Option<Instant>; TIMER_COUNT],
    retrans: [u32; TIMER_COUNT],
}

impl TimerTable {
    pub fn new() -> Self {
        TimerTable::default()
    }

    /// Arm a timer. Retransmission classes back off exponentially with the
    /// attempt count, clamped at `rto_max`. Returns whether the slot was
    /// newly armed, in which case the caller must take a reference.
    pub fn start(
        &mut self,
        timer: Timer,
        now: Instant,
        interval: Duration,
        rto_max: Duration,
    ) -> bool {
        let interval = match timer {
            Timer::T1Init | Timer::T1Cookie | Timer::T2Shutdown | Timer::T3Rtx => {
                backoff(interval, self.retrans[timer as usize], rto_max)
            }
            _ => interval,
        };

        let newly_armed = self.deadline[timer as usize].is_none();
        self.deadline[timer as usize] = Some(now + interval);
        newly_armed
    }

    /// Cancel a timer. Returns whether the slot was armed; the caller
    /// releases the timer's reference only on `true`.
    pub fn stop(&mut self, timer: Timer) -> bool {
        self.retrans[timer as usize] = 0;
        self.deadline[timer as usize].take().is_some()
    }

    pub fn get(&self, timer: Timer) -> Option<Instant> {
        self.deadline[timer as usize]
    }

    pub fn next_timeout(&self) -> Option<Instant> {
        self.deadline.iter().filter_map(|&x| x).min()
    }

    /// Claim an expired timer: clears the deadline and counts the expiry.
    /// Returns the attempt number, or `None` when the slot is not armed or
    /// not yet due.
    pub fn expire(&mut self, timer: Timer, after: Instant) -> Option<u32> {
        match self.deadline[timer as usize] {
            Some(deadline) if deadline <= after => {
                self.deadline[timer as usize] = None;
                self.retrans[timer as usize] += 1;
                Some(self.retrans[timer as usize])
            }
            _ => None,
        }
    }

    pub fn retrans_count(&self, timer: Timer) -> u32 {
        self.retrans[timer as usize]
    }
}

fn backoff(rto: Duration, n_rtos: u32, rto_max: Duration) -> Duration {
    // RFC 4960 sec 6.3.3: back off the timer by doubling per expiry,
    // bounded above by RTO.Max.
    if n_rtos < 31 {
        rto.checked_mul(1 << n_rtos).unwrap_or(rto_max).min(rto_max)
    } else {
        rto_max
    }
}

const RTO_ALPHA: u64 = 1;
const RTO_BETA: u64 = 2;
const RTO_BASE: u64 = 8;

/// RtoManager manages retransmission timeout values for one transport.
/// This is an implementation of RFC 4960 sec 6.3.1, with the bounds taken
/// from socket configuration rather than fixed constants.
#[derive(Debug, Clone)]
pub(crate) struct RtoManager {
    pub(crate) srtt: u64,
    pub(crate) rttvar: f64,
    pub(crate) rto: u64,
    rto_initial: u64,
    rto_min: u64,
    rto_max: u64,
    no_update: bool,
}

impl RtoManager {
    pub(crate) fn new(initial: Duration, min: Duration, max: Duration) -> Self {
        RtoManager {
            srtt: 0,
            rttvar: 0.0,
            rto: initial.as_millis() as u64,
            rto_initial: initial.as_millis() as u64,
            rto_min: min.as_millis() as u64,
            rto_max: max.as_millis() as u64,
            no_update: false,
        }
    }

    /// Bounds from RFC 4960 sec 15 (3s initial, 1s min, 60s max).
    pub(crate) fn default_bounds() -> Self {
        RtoManager::new(
            Duration::from_millis(3000),
            Duration::from_millis(1000),
            Duration::from_millis(60000),
        )
    }

    /// set_new_rtt takes a newly measured RTT and adjusts the RTO, in
    /// msec. Returns the smoothed RTT.
    pub(crate) fn set_new_rtt(&mut self, rtt: u64) -> u64 {
        if self.no_update {
            return self.srtt;
        }

        if self.srtt == 0 {
            // First measurement
            self.srtt = rtt;
            self.rttvar = rtt as f64 / 2.0;
        } else {
            // Subsequent rtt measurement
            self.rttvar = ((RTO_BASE - RTO_BETA) as f64 * self.rttvar
                + RTO_BETA as f64 * (self.srtt as i64 - rtt as i64).abs() as f64)
                / RTO_BASE as f64;
            self.srtt = ((RTO_BASE - RTO_ALPHA) * self.srtt + RTO_ALPHA * rtt) / RTO_BASE;
        }

        self.rto = (self.srtt + (4.0 * self.rttvar) as u64)
            .max(self.rto_min)
            .min(self.rto_max);

        self.srtt
    }

    pub(crate) fn get_rto(&self) -> Duration {
        Duration::from_millis(self.rto)
    }

    /// Reset the RTO variables to the initial values.
    pub(crate) fn reset(&mut self) {
        if self.no_update {
            return;
        }

        self.srtt = 0;
        self.rttvar = 0.0;
        self.rto = self.rto_initial;
    }

    /// Pin the RTO for testing.
    #[cfg(test)]
    pub(crate) fn set_rto(&mut self, rto: u64, no_update: bool) {
        self.rto = rto;
        self.no_update = no_update;
    }
}
