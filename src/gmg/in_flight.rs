//! Exchanges in flight

use super::plan::TransferList;
use crate::vector::{Vector, for_each_index};
use mpi::{
    request::{Request, StaticScope},
    traits::{Communicator, Destination, Source},
    Tag,
};
use std::ptr::NonNull;
use tracing::{trace, warn};

/// The tag used for every inter-level message
pub const EXCHANGE_TAG: Tag = 0x5e4d;

/// The direction of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Accumulate ghost vector values into the owners' coarser vectors
    Send,
    /// Copy the owners' coarser vector values into ghost vectors
    Get,
}

impl Direction {
    pub(crate) fn start_name(&self) -> &'static str {
        match self {
            Self::Send => "send_ghost_patches_start",
            Self::Get => "get_ghost_patches_start",
        }
    }

    pub(crate) fn finish_name(&self) -> &'static str {
        match self {
            Self::Send => "send_ghost_patches_finish",
            Self::Get => "get_ghost_patches_finish",
        }
    }
}

// A buffer handed to a non-blocking send or receive.
//
// The buffer is leaked when the request is posted so that it can outlive the call that posted it.
// It is freed on drop, after the request has completed.
struct PostedBuffer {
    list_index: usize,
    request: Option<Request<'static, [f64], StaticScope>>,
    buffer: NonNull<[f64]>,
}

impl PostedBuffer {
    fn receive(comm: &impl Communicator, peer: usize, list_index: usize, len: usize) -> Self {
        let buffer = NonNull::from(Box::leak(vec![0.0; len].into_boxed_slice()));
        // SAFETY: the buffer was just leaked, and this is the only reference to it until the
        // request completes
        let data: &'static mut [f64] = unsafe { &mut *buffer.as_ptr() };
        let request = comm
            .process_at_rank(peer as i32)
            .immediate_receive_into_with_tag(StaticScope, data, EXCHANGE_TAG);
        Self {
            list_index,
            request: Some(request),
            buffer,
        }
    }

    fn send(comm: &impl Communicator, peer: usize, list_index: usize, values: Vec<f64>) -> Self {
        let buffer = NonNull::from(Box::leak(values.into_boxed_slice()));
        // SAFETY: the buffer was just leaked and is not written to until it is freed
        let data: &'static [f64] = unsafe { &*buffer.as_ptr() };
        let request = comm
            .process_at_rank(peer as i32)
            .immediate_send_with_tag(StaticScope, data, EXCHANGE_TAG);
        Self {
            list_index,
            request: Some(request),
            buffer,
        }
    }

    // Returns true if the request has completed
    fn test(&mut self) -> bool {
        match self.request.take() {
            Some(request) => match request.test() {
                Ok(_) => true,
                Err(request) => {
                    self.request = Some(request);
                    false
                }
            },
            None => true,
        }
    }

    fn wait(&mut self) {
        if let Some(request) = self.request.take() {
            request.wait();
        }
    }

    fn values(&self) -> Option<&[f64]> {
        match self.request {
            Some(_) => None,
            // SAFETY: the request has completed, so MPI no longer uses the buffer
            None => Some(unsafe { self.buffer.as_ref() }),
        }
    }
}

impl Drop for PostedBuffer {
    fn drop(&mut self) {
        self.wait();
        // SAFETY: the buffer was created by Box::leak and the request that used it has completed
        drop(unsafe { Box::from_raw(self.buffer.as_ptr()) });
    }
}

/// An exchange whose messages have been posted but not yet completed
///
/// Dropping an exchange waits for every message to complete.
pub(crate) struct InFlightExchange {
    direction: Direction,
    vector: *const (),
    ghost_vector: *const (),
    receives: Vec<PostedBuffer>,
    sends: Vec<PostedBuffer>,
}

impl InFlightExchange {
    /// Post the receives for `receive_schedule` and the sends for `send_schedule`, packing the
    /// sent values from `source`
    pub(crate) fn start<const D: usize>(
        comm: &impl Communicator,
        direction: Direction,
        vector: &Vector<D>,
        ghost_vector: &Vector<D>,
        receive_schedule: &[TransferList],
        send_schedule: &[TransferList],
        source: &Vector<D>,
    ) -> Self {
        let patch_size = source.patch_size();
        let receives = receive_schedule
            .iter()
            .enumerate()
            .map(|(i, list)| {
                PostedBuffer::receive(comm, list.rank, i, patch_size * list.local_indexes.len())
            })
            .collect::<Vec<_>>();
        let sends = send_schedule
            .iter()
            .enumerate()
            .map(|(i, list)| PostedBuffer::send(comm, list.rank, i, pack(source, &list.local_indexes)))
            .collect::<Vec<_>>();
        trace!(
            call = direction.start_name(),
            receives = receives.len(),
            sends = sends.len(),
            "Posted inter-level messages"
        );
        Self {
            direction,
            vector: (vector as *const Vector<D>).cast(),
            ghost_vector: (ghost_vector as *const Vector<D>).cast(),
            receives,
            sends,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn is_vector<const D: usize>(&self, vector: &Vector<D>) -> bool {
        std::ptr::eq(self.vector, (vector as *const Vector<D>).cast())
    }

    pub(crate) fn is_ghost_vector<const D: usize>(&self, ghost_vector: &Vector<D>) -> bool {
        std::ptr::eq(self.ghost_vector, (ghost_vector as *const Vector<D>).cast())
    }

    /// Unpack each receive into `destination` as it completes, then wait for the sends
    ///
    /// Receives that have already arrived are unpacked first. When none has, this blocks on the
    /// oldest pending receive.
    pub(crate) fn finish<const D: usize>(
        mut self,
        receive_schedule: &[TransferList],
        destination: &mut Vector<D>,
    ) {
        let accumulate = self.direction == Direction::Send;
        let mut pending = std::mem::take(&mut self.receives);
        while !pending.is_empty() {
            let mut progress = false;
            pending.retain_mut(|posted| {
                if !posted.test() {
                    return true;
                }
                if let Some(values) = posted.values() {
                    unpack(
                        values,
                        &receive_schedule[posted.list_index].local_indexes,
                        destination,
                        accumulate,
                    );
                }
                progress = true;
                false
            });
            if !progress {
                // Nothing has arrived, so block on the oldest receive rather than spin
                if let Some(first) = pending.first_mut() {
                    first.wait();
                }
            }
        }
        for posted in self.sends.iter_mut() {
            posted.wait();
        }
        self.sends.clear();
        trace!(call = self.direction.finish_name(), "Completed inter-level messages");
    }
}

impl Drop for InFlightExchange {
    fn drop(&mut self) {
        if !self.receives.is_empty() || !self.sends.is_empty() {
            warn!(
                started_by = self.direction.start_name(),
                receives = self.receives.len(),
                sends = self.sends.len(),
                "Inter-level exchange dropped before it was finished; waiting for its messages"
            );
        }
        self.receives.clear();
        self.sends.clear();
    }
}

/// Copy the values of a list of patches into a flat buffer
///
/// Each patch is written component by component, and each component over its ghost-inclusive
/// index box.
pub(crate) fn pack<const D: usize>(vector: &Vector<D>, local_indexes: &[usize]) -> Vec<f64> {
    let mut values = Vec::with_capacity(local_indexes.len() * vector.patch_size());
    for &i in local_indexes {
        for c in 0..vector.num_components() {
            let view = vector.component_view(i, c);
            for_each_index(view.ghost_start(), view.ghost_end(), |index| {
                values.push(view[index])
            });
        }
    }
    values
}

/// Read a buffer written by [`pack`] back into a list of patches
pub(crate) fn unpack<const D: usize>(
    values: &[f64],
    local_indexes: &[usize],
    vector: &mut Vector<D>,
    accumulate: bool,
) {
    debug_assert_eq!(values.len(), local_indexes.len() * vector.patch_size());
    let mut values = values.iter();
    for &i in local_indexes {
        for c in 0..vector.num_components() {
            let mut view = vector.component_view_mut(i, c);
            for_each_index(view.ghost_start(), view.ghost_end(), |index| {
                if let Some(value) = values.next() {
                    if accumulate {
                        view[index] += value;
                    } else {
                        view[index] = *value;
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pack_unpack() {
        let mut source = Vector::<2>::with_patches([2, 3], 1, 2, 3);
        for i in 0..3 {
            for c in 0..2 {
                let mut view = source.component_view_mut(i, c);
                for_each_index(view.ghost_start(), view.ghost_end(), |index| {
                    view[index] = (100 * i + 10 * c) as f64 + (index[0] + 4 * index[1]) as f64;
                });
            }
        }

        let values = pack(&source, &[2, 0]);
        assert_eq!(values.len(), 2 * source.patch_size());
        assert_eq!(&values[..source.patch_size()], source.patch(2));

        let mut destination = Vector::<2>::with_patches([2, 3], 1, 2, 2);
        unpack(&values, &[1, 0], &mut destination, false);
        assert_eq!(destination.patch(1), source.patch(2));
        assert_eq!(destination.patch(0), source.patch(0));

        unpack(&values, &[1, 0], &mut destination, true);
        for (a, b) in destination.patch(0).iter().zip(source.patch(0)) {
            assert_relative_eq!(*a, 2.0 * b);
        }
    }

    #[test]
    fn test_exchange_with_self() {
        let universe = mpi::initialize().unwrap();
        let world = universe.world();
        let rank = world.rank() as usize;

        let mut source = Vector::<2>::with_patches([2, 2], 0, 1, 3);
        for i in 0..3 {
            source.patch_mut(i).fill((i + 1) as f64);
        }
        let mut destination = Vector::<2>::with_patches([2, 2], 0, 1, 3);
        destination.set_with_ghost(1.0);
        let sends = [
            TransferList {
                rank,
                local_indexes: vec![2],
                ids: vec![7],
            },
            TransferList {
                rank,
                local_indexes: vec![0, 1],
                ids: vec![3, 5],
            },
        ];
        let receives = [
            TransferList {
                rank,
                local_indexes: vec![0],
                ids: vec![7],
            },
            TransferList {
                rank,
                local_indexes: vec![2, 1],
                ids: vec![3, 5],
            },
        ];

        let exchange = InFlightExchange::start(
            &world,
            Direction::Get,
            &source,
            &destination,
            &receives,
            &sends,
            &source,
        );
        assert!(exchange.is_vector(&source));
        assert!(exchange.is_ghost_vector(&destination));
        assert!(!exchange.is_vector(&destination));
        exchange.finish(&receives, &mut destination);
        for (patch, expected) in [(0, 3.0), (1, 2.0), (2, 1.0)] {
            for value in destination.patch(patch) {
                assert_relative_eq!(*value, expected);
            }
        }

        let exchange = InFlightExchange::start(
            &world,
            Direction::Send,
            &destination,
            &source,
            &receives,
            &sends,
            &source,
        );
        exchange.finish(&receives, &mut destination);
        for (patch, expected) in [(0, 6.0), (1, 4.0), (2, 2.0)] {
            for value in destination.patch(patch) {
                assert_relative_eq!(*value, expected);
            }
        }
    }

    #[test]
    fn test_direction_names() {
        assert_eq!(Direction::Send.start_name(), "send_ghost_patches_start");
        assert_eq!(Direction::Get.finish_name(), "get_ghost_patches_finish");
    }
}
