use std::time::Duration;

/// Generates verification tags and initial TSNs for new associations.
pub trait VerificationTagGenerator: Send {
    /// Generates a new verification tag.
    ///
    /// Tags are what protect an association from blind spoofing: they MUST
    /// NOT be predictable by an off-path third party. A tag of 0 is
    /// reserved for out-of-the-blue packets and is never returned.
    fn generate_tag(&mut self) -> u32;

    /// Generates the initial TSN for a new association, with the same
    /// unpredictability requirement as `generate_tag`.
    fn generate_initial_tsn(&mut self) -> u32;

    /// Returns the lifetime of state cookies minted with these tags.
    /// Assumed to be constant.
    fn cookie_lifetime(&self) -> Option<Duration>;
}

/// Generates purely random tags and initial TSNs.
#[derive(Default, Debug, Clone, Copy)]
pub struct RandomVerificationTagGenerator {
    cookie_lifetime: Option<Duration>,
}

impl RandomVerificationTagGenerator {
    /// Initialize a random tag generator
    pub fn new() -> Self {
        RandomVerificationTagGenerator::default()
    }

    /// Set the cookie lifetime reported by this generator
    pub fn set_cookie_lifetime(&mut self, d: Duration) -> &mut Self {
        self.cookie_lifetime = Some(d);
        self
    }
}

impl VerificationTagGenerator for RandomVerificationTagGenerator {
    fn generate_tag(&mut self) -> u32 {
        loop {
            let tag = rand::random::<u32>();
            if tag != 0 {
                return tag;
            }
        }
    }

    fn generate_initial_tsn(&mut self) -> u32 {
        rand::random::<u32>()
    }

    fn cookie_lifetime(&self) -> Option<Duration> {
        self.cookie_lifetime
    }
}

/// Serial Number Arithmetic (RFC 1982)
#[inline]
pub(crate) fn sna32lt(i1: u32, i2: u32) -> bool {
    (i1 < i2 && i2 - i1 < 1 << 31) || (i1 > i2 && i1 - i2 > 1 << 31)
}

#[inline]
pub(crate) fn sna32lte(i1: u32, i2: u32) -> bool {
    i1 == i2 || sna32lt(i1, i2)
}

#[inline]
pub(crate) fn sna32gt(i1: u32, i2: u32) -> bool {
    (i1 < i2 && (i2 - i1) >= 1 << 31) || (i1 > i2 && (i1 - i2) <= 1 << 31)
}

#[inline]
pub(crate) fn sna32gte(i1: u32, i2: u32) -> bool {
    i1 == i2 || sna32gt(i1, i2)
}
