//! Errors

use thiserror::Error;

/// An error in the use of an [`InterLevelComm`](super::InterLevelComm)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterLevelCommError {
    /// A communication was started while another one is in flight
    #[error("{call} was called while the communication started by {in_flight} is unfinished")]
    UnfinishedCommunication {
        /// The rejected call
        call: &'static str,
        /// The call that started the communication in flight
        in_flight: &'static str,
    },
    /// A communication was finished but none is in flight
    #[error("{call} was called without a matching start")]
    NoCommunicationStarted {
        /// The rejected call
        call: &'static str,
    },
    /// A communication was finished in the wrong direction
    #[error("{call} was called, but the communication in flight was started by {in_flight}")]
    DirectionMismatch {
        /// The rejected call
        call: &'static str,
        /// The call that started the communication in flight
        in_flight: &'static str,
    },
    /// A communication was finished with a different vector to the one it was started with
    #[error("{call} was called with a different vector to the one passed to {in_flight}")]
    VectorMismatch {
        /// The rejected call
        call: &'static str,
        /// The call that started the communication in flight
        in_flight: &'static str,
    },
    /// A communication was finished with a different ghost vector to the one it was started with
    #[error("{call} was called with a different ghost vector to the one passed to {in_flight}")]
    GhostVectorMismatch {
        /// The rejected call
        call: &'static str,
        /// The call that started the communication in flight
        in_flight: &'static str,
    },
    /// A vector has the wrong number of patches
    #[error("{call} was passed a {name} with {found} patches, but {expected} are needed")]
    WrongNumberOfPatches {
        /// The rejected call
        call: &'static str,
        /// Which vector
        name: &'static str,
        /// The number of patches needed
        expected: usize,
        /// The number of patches in the vector
        found: usize,
    },
    /// A vector has the wrong number of components
    #[error("{call} was passed a {name} with {found} components, but {expected} are needed")]
    WrongNumberOfComponents {
        /// The rejected call
        call: &'static str,
        /// Which vector
        name: &'static str,
        /// The number of components needed
        expected: usize,
        /// The number of components in the vector
        found: usize,
    },
    /// A vector has patches of the wrong shape
    #[error("{call} was passed a {name} whose patches have the wrong number of cells or ghost cells")]
    WrongPatchShape {
        /// The rejected call
        call: &'static str,
        /// Which vector
        name: &'static str,
    },
    /// The two domains do not use the same communicator
    #[error("The coarser and finer domains do not use the same communicator")]
    CommunicatorMismatch,
    /// The two domains have patches of different shapes
    #[error("The coarser and finer domains have patches with different numbers of cells or ghost cells")]
    DomainShapeMismatch,
    /// A finer patch has no parent
    #[error("Patch {id} of the finer domain has no parent")]
    MissingParent {
        /// Patch id
        id: usize,
    },
    /// A finer patch has a parent on this rank that the coarser domain does not contain
    #[error("Patch {id} of the finer domain has parent {parent_id} on rank {rank}, but the coarser domain on that rank does not contain it")]
    UnknownParent {
        /// Patch id
        id: usize,
        /// Parent id
        parent_id: usize,
        /// Rank
        rank: usize,
    },
}
