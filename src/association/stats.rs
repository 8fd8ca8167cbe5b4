/// Association statistics
#[derive(Default, Debug, Copy, Clone)]
pub struct AssociationStats {
    n_datas: u64,
    n_peer_addr_events: u64,
    n_failovers: u64,
    n_t3timeouts: u64,
    n_heartbeats: u64,
}

impl AssociationStats {
    pub fn inc_datas(&mut self) {
        self.n_datas += 1;
    }

    pub fn get_num_datas(&mut self) -> u64 {
        self.n_datas
    }

    pub fn inc_peer_addr_events(&mut self) {
        self.n_peer_addr_events += 1;
    }

    pub fn get_num_peer_addr_events(&mut self) -> u64 {
        self.n_peer_addr_events
    }

    pub fn inc_failovers(&mut self) {
        self.n_failovers += 1;
    }

    pub fn get_num_failovers(&mut self) -> u64 {
        self.n_failovers
    }

    pub fn inc_t3timeouts(&mut self) {
        self.n_t3timeouts += 1;
    }

    pub fn get_num_t3timeouts(&mut self) -> u64 {
        self.n_t3timeouts
    }

    pub fn inc_heartbeats(&mut self) {
        self.n_heartbeats += 1;
    }

    pub fn get_num_heartbeats(&mut self) -> u64 {
        self.n_heartbeats
    }

    pub fn reset(&mut self) {
        self.n_datas = 0;
        self.n_peer_addr_events = 0;
        self.n_failovers = 0;
        self.n_t3timeouts = 0;
        self.n_heartbeats = 0;
    }
}
