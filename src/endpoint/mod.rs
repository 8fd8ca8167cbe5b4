
use crate::address::Scope;
use crate::association::Association;
use crate::config::{EndpointConfig, SocketConfig};
use crate::error::{Error, Result};
use crate::shared::{AssociationId, EndpointEvent, EndpointEventInner};
use crate::util::VerificationTagGenerator;

use fxhash::FxHashMap;
use log::{debug, trace, warn};
use slab::Slab;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

/// The owner of the associations sharing one local SCTP port space.
///
/// This object performs no I/O. It constructs associations, hands out
/// handles, routes local verification tags to handles, and reclaims slab
/// slots when associations drain. Associations keep a shared reference to
/// the endpoint's configuration for as long as they live.
pub struct Endpoint {
    config: Arc<EndpointConfig>,
    tag_generator: Box<dyn VerificationTagGenerator>,
    /// Identifies associations by the verification tag we minted for them.
    ///
    /// Tags are locally created, so the cheaper hash function is fine.
    association_ids: FxHashMap<AssociationId, AssociationHandle>,
    associations: Slab<Association>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Endpoint")
            .field("config", &self.config)
            .field("association_ids", &self.association_ids)
            .field("associations", &self.associations.len())
            .field("tag_generator", &"[ elided ]")
            .finish()
    }
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(config: Arc<EndpointConfig>) -> Self {
        Self {
            tag_generator: (config.tag_generator_factory.as_ref())(),
            association_ids: FxHashMap::default(),
            associations: Slab::new(),
            config,
        }
    }

    /// Create an association owned by this endpoint.
    ///
    /// The verification tag and initial TSN come from this endpoint's
    /// generator; the tag doubles as the association's routing id and is
    /// guaranteed unique among live associations here.
    pub fn create_association(
        &mut self,
        socket_config: Arc<SocketConfig>,
        scope: Scope,
        local_port: u16,
    ) -> Result<(AssociationHandle, &mut Association)> {
        if self.associations.len() >= self.config.max_associations as usize {
            return Err(Error::ErrTooManyAssociations);
        }

        let my_vtag = self.new_tag();
        let initial_tsn = self.tag_generator.generate_initial_tsn();
        let assoc = Association::new(
            self.config.clone(),
            socket_config,
            scope,
            local_port,
            my_vtag,
            initial_tsn,
        )?;

        let id = self.associations.insert(assoc);
        let ch = AssociationHandle(id);
        self.association_ids.insert(my_vtag, ch);
        debug!("endpoint: created association {} as {:?}", my_vtag, ch);
        Ok((ch, &mut self.associations[id]))
    }

    fn new_tag(&mut self) -> AssociationId {
        loop {
            let tag = self.tag_generator.generate_tag();
            if !self.association_ids.contains_key(&tag) {
                break tag;
            }
        }
    }

    pub fn association(&self, ch: AssociationHandle) -> Option<&Association> {
        self.associations.get(ch.0)
    }

    pub fn association_mut(&mut self, ch: AssociationHandle) -> Option<&mut Association> {
        self.associations.get_mut(ch.0)
    }

    /// Look an association up by its local verification tag.
    pub fn lookup(&self, tag: AssociationId) -> Option<AssociationHandle> {
        self.association_ids.get(&tag).cloned()
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    /// Process `EndpointEvent`s emitted by owned associations.
    ///
    /// `Drained` reclaims the association's slot; its handle is dead
    /// afterwards.
    pub fn handle_event(&mut self, ch: AssociationHandle, event: EndpointEvent) {
        match event.0 {
            EndpointEventInner::Drained => {
                if !self.associations.contains(ch.0) {
                    warn!("endpoint: drained event for unknown {:?}", ch);
                    return;
                }
                let assoc = self.associations.remove(ch.0);
                self.association_ids.remove(&assoc.my_vtag());
                trace!("endpoint: reclaimed association {}", assoc.my_vtag());
            }
        }
    }

    /// Hand an association over to another endpoint and socket, as when a
    /// listening socket surrenders an established association to the
    /// socket returned by accept.
    ///
    /// The association is unregistered here, its endpoint/socket
    /// references are swapped for the target's, and it is registered
    /// there under a fresh handle. Lookups on this endpoint miss from
    /// then on; callers serialize migration against concurrent lookups.
    pub fn migrate(
        &mut self,
        ch: AssociationHandle,
        target: &mut Endpoint,
        socket_config: Arc<SocketConfig>,
    ) -> Result<AssociationHandle> {
        if !self.associations.contains(ch.0) {
            return Err(Error::ErrAssociationNotFound);
        }
        if target.associations.len() >= target.config.max_associations as usize {
            return Err(Error::ErrTooManyAssociations);
        }

        let mut assoc = self.associations.remove(ch.0);
        self.association_ids.remove(&assoc.my_vtag());

        assoc.rehome(target.config.clone(), socket_config);
        let my_vtag = assoc.my_vtag();
        let id = target.associations.insert(assoc);
        let new_ch = AssociationHandle(id);
        target.association_ids.insert(my_vtag, new_ch);

        debug!(
            "endpoint: migrated association {} to {:?} on new owner",
            my_vtag, new_ch
        );
        Ok(new_ch)
    }

    /// Access the configuration used by this endpoint
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

/// Internal identifier for an `Association` currently owned by an endpoint
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AssociationHandle(pub usize);

impl From<AssociationHandle> for usize {
    fn from(x: AssociationHandle) -> usize {
        x.0
    }
}

impl Index<AssociationHandle> for Slab<Association> {
    type Output = Association;
    fn index(&self, ch: AssociationHandle) -> &Association {
        &self[ch.0]
    }
}

impl IndexMut<AssociationHandle> for Slab<Association> {
    fn index_mut(&mut self, ch: AssociationHandle) -> &mut Association {
        &mut self[ch.0]
    }
}
