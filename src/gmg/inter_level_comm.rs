//! Communication between adjacent levels

use super::in_flight::{Direction, InFlightExchange};
use super::{ExchangePlan, InterLevelCommError};
use crate::domain::{Domain, PatchInfo};
use crate::vector::Vector;
use mpi::{topology::CommunicatorRelation, traits::Communicator};
use tracing::trace;

/// Moves patch data between a domain and the next coarser domain
///
/// Every finer patch has a parent in the coarser domain. When the parent is owned by another
/// process, its data is held locally in a ghost vector. [`InterLevelComm`] fills ghost vectors from
/// the coarser vectors of their owners ("get") and accumulates ghost vectors back into them
/// ("send").
///
/// Each exchange is split into a start and a finish call so that other work can be done while
/// messages are in flight. At most one exchange can be in flight at a time.
pub struct InterLevelComm<'a, C: Communicator, const D: usize> {
    coarser: &'a Domain<'a, C, D>,
    finer: &'a Domain<'a, C, D>,
    num_components: usize,
    patch_size: usize,
    plan: ExchangePlan,
    in_flight: Option<InFlightExchange>,
}

impl<'a, C: Communicator, const D: usize> InterLevelComm<'a, C, D> {
    /// Create the communication pattern between `coarser` and `finer`
    ///
    /// Vectors on the coarser domain are expected to have `num_components` components.
    pub fn new(
        coarser: &'a Domain<'a, C, D>,
        num_components: usize,
        finer: &'a Domain<'a, C, D>,
    ) -> Result<Self, InterLevelCommError> {
        if coarser.comm().compare(finer.comm()) != CommunicatorRelation::Identical {
            return Err(InterLevelCommError::CommunicatorMismatch);
        }
        if coarser.ns() != finer.ns() || coarser.num_ghost_cells() != finer.num_ghost_cells() {
            return Err(InterLevelCommError::DomainShapeMismatch);
        }
        let plan = ExchangePlan::new(coarser.rank(), coarser.patches(), finer.patches())?;
        let patch_size = num_components
            * coarser
                .ns()
                .iter()
                .map(|n| n + 2 * coarser.num_ghost_cells())
                .product::<usize>();
        Ok(Self {
            coarser,
            finer,
            num_components,
            patch_size,
            plan,
            in_flight: None,
        })
    }

    /// The coarser domain
    pub fn coarser_domain(&self) -> &'a Domain<'a, C, D> {
        self.coarser
    }

    /// The finer domain
    pub fn finer_domain(&self) -> &'a Domain<'a, C, D> {
        self.finer
    }

    /// The number of components of vectors on the coarser domain
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// The number of values in one patch, including ghost cells
    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// The number of patches in a ghost vector
    pub fn num_ghost_patches(&self) -> usize {
        self.plan.num_ghost_patches()
    }

    /// The exchange plan
    pub fn plan(&self) -> &ExchangePlan {
        &self.plan
    }

    /// Allocate a ghost vector filled with zeros
    pub fn get_new_ghost_vector(&self) -> Vector<D> {
        Vector::with_patches(
            self.coarser.ns(),
            self.coarser.num_ghost_cells(),
            self.num_components,
            self.plan.num_ghost_patches(),
        )
    }

    /// Iterate over the finer patches whose parent is owned by this process
    ///
    /// Yields the local index of the parent in the coarser domain and the finer patch.
    pub fn patches_with_local_parent(&self) -> impl Iterator<Item = (usize, &PatchInfo<D>)> + '_ {
        self.plan
            .patches_with_local_parent()
            .iter()
            .map(|(coarser_index, finer_index)| (*coarser_index, self.finer.patch(*finer_index)))
    }

    /// Iterate over the finer patches whose parent is owned by another process
    ///
    /// Yields the index of the parent in a ghost vector and the finer patch.
    pub fn patches_with_ghost_parent(&self) -> impl Iterator<Item = (usize, &PatchInfo<D>)> + '_ {
        self.plan
            .patches_with_ghost_parent()
            .iter()
            .map(|(ghost_index, finer_index)| (*ghost_index, self.finer.patch(*finer_index)))
    }

    /// Start accumulating the values of a ghost vector into the coarser vectors of their owners
    ///
    /// `vector` is a vector on the coarser domain and `ghost_vector` a vector created by
    /// [`InterLevelComm::get_new_ghost_vector`].
    pub fn send_ghost_patches_start(
        &mut self,
        vector: &Vector<D>,
        ghost_vector: &Vector<D>,
    ) -> Result<(), InterLevelCommError> {
        self.start(Direction::Send, vector, ghost_vector)
    }

    /// Finish an exchange started by [`InterLevelComm::send_ghost_patches_start`]
    ///
    /// The received values are added to `vector`.
    pub fn send_ghost_patches_finish(
        &mut self,
        vector: &mut Vector<D>,
        ghost_vector: &Vector<D>,
    ) -> Result<(), InterLevelCommError> {
        let exchange = self.take_in_flight(Direction::Send, vector, ghost_vector)?;
        exchange.finish(self.plan.vector_schedule(), vector);
        Ok(())
    }

    /// Start copying the values of coarser vectors into the ghost vectors that hold their patches
    pub fn get_ghost_patches_start(
        &mut self,
        vector: &Vector<D>,
        ghost_vector: &Vector<D>,
    ) -> Result<(), InterLevelCommError> {
        self.start(Direction::Get, vector, ghost_vector)
    }

    /// Finish an exchange started by [`InterLevelComm::get_ghost_patches_start`]
    ///
    /// The received values overwrite the patches of `ghost_vector`.
    pub fn get_ghost_patches_finish(
        &mut self,
        vector: &Vector<D>,
        ghost_vector: &mut Vector<D>,
    ) -> Result<(), InterLevelCommError> {
        let exchange = self.take_in_flight(Direction::Get, vector, ghost_vector)?;
        exchange.finish(self.plan.ghost_schedule(), ghost_vector);
        Ok(())
    }

    fn start(
        &mut self,
        direction: Direction,
        vector: &Vector<D>,
        ghost_vector: &Vector<D>,
    ) -> Result<(), InterLevelCommError> {
        let call = direction.start_name();
        if let Some(in_flight) = &self.in_flight {
            return Err(InterLevelCommError::UnfinishedCommunication {
                call,
                in_flight: in_flight.direction().start_name(),
            });
        }
        self.check_vector(call, "vector", vector, self.coarser.num_local_patches())?;
        self.check_vector(call, "ghost vector", ghost_vector, self.plan.num_ghost_patches())?;

        trace!(call, rank = self.coarser.rank(), "Starting inter-level exchange");
        let (receive_schedule, send_schedule, source) = match direction {
            Direction::Send => (
                self.plan.vector_schedule(),
                self.plan.ghost_schedule(),
                ghost_vector,
            ),
            Direction::Get => (
                self.plan.ghost_schedule(),
                self.plan.vector_schedule(),
                vector,
            ),
        };
        self.in_flight = Some(InFlightExchange::start(
            self.coarser.comm(),
            direction,
            vector,
            ghost_vector,
            receive_schedule,
            send_schedule,
            source,
        ));
        Ok(())
    }

    fn take_in_flight(
        &mut self,
        direction: Direction,
        vector: &Vector<D>,
        ghost_vector: &Vector<D>,
    ) -> Result<InFlightExchange, InterLevelCommError> {
        let call = direction.finish_name();
        let in_flight = self
            .in_flight
            .as_ref()
            .ok_or(InterLevelCommError::NoCommunicationStarted { call })?;
        let started_by = in_flight.direction().start_name();
        if in_flight.direction() != direction {
            return Err(InterLevelCommError::DirectionMismatch {
                call,
                in_flight: started_by,
            });
        }
        if !in_flight.is_vector(vector) {
            return Err(InterLevelCommError::VectorMismatch {
                call,
                in_flight: started_by,
            });
        }
        if !in_flight.is_ghost_vector(ghost_vector) {
            return Err(InterLevelCommError::GhostVectorMismatch {
                call,
                in_flight: started_by,
            });
        }
        trace!(call, rank = self.coarser.rank(), "Finishing inter-level exchange");
        self.in_flight
            .take()
            .ok_or(InterLevelCommError::NoCommunicationStarted { call })
    }

    fn check_vector(
        &self,
        call: &'static str,
        name: &'static str,
        vector: &Vector<D>,
        num_patches: usize,
    ) -> Result<(), InterLevelCommError> {
        if vector.num_local_patches() != num_patches {
            return Err(InterLevelCommError::WrongNumberOfPatches {
                call,
                name,
                expected: num_patches,
                found: vector.num_local_patches(),
            });
        }
        if vector.num_components() != self.num_components {
            return Err(InterLevelCommError::WrongNumberOfComponents {
                call,
                name,
                expected: self.num_components,
                found: vector.num_components(),
            });
        }
        if vector.ns() != self.coarser.ns()
            || vector.num_ghost_cells() != self.coarser.num_ghost_cells()
        {
            return Err(InterLevelCommError::WrongPatchShape { call, name });
        }
        Ok(())
    }
}

impl<C: Communicator, const D: usize> Clone for InterLevelComm<'_, C, D> {
    /// Create a copy with no exchange in flight
    fn clone(&self) -> Self {
        Self {
            coarser: self.coarser,
            finer: self.finer,
            num_components: self.num_components,
            patch_size: self.patch_size,
            plan: self.plan.clone(),
            in_flight: None,
        }
    }
}

impl<C: Communicator, const D: usize> std::fmt::Debug for InterLevelComm<'_, C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterLevelComm")
            .field("coarser", &self.coarser.id())
            .field("finer", &self.finer.id())
            .field("num_components", &self.num_components)
            .field("patch_size", &self.patch_size)
            .field("plan", &self.plan)
            .field(
                "in_flight",
                &self.in_flight.as_ref().map(|e| e.direction().start_name()),
            )
            .finish()
    }
}
