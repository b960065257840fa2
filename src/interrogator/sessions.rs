//! The table of active sessions
//!
//! An [`Interrogator`](super::Interrogator) keeps an entry for every session that has not yet
//! finished so that the sessions of a peer can be canceled. Entries are referred to by a
//! [`SessionKey`] whose generation must match the generation of the slot, a session that was
//! already removed from its slot cannot remove the session that reuses the slot.

use crate::peer::PeerId;
use alloc::vec::Vec;
use futures::channel::oneshot;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct SessionKey {
    index: usize,
    generation: u32,
}

struct Slot {
    generation: u32,
    entry: Option<(PeerId, oneshot::Sender<()>)>,
}

#[derive(Default)]
pub(crate) struct SessionTable {
    slots: Vec<Slot>,
}

impl SessionTable {
    /// Insert a session
    ///
    /// The returned receiver is sent to when the session is canceled.
    pub fn insert(&mut self, peer_id: PeerId) -> (SessionKey, oneshot::Receiver<()>) {
        let (sender, receiver) = oneshot::channel();

        let entry = Some((peer_id, sender));

        let key = match self.slots.iter().position(|slot| slot.entry.is_none()) {
            Some(index) => {
                let slot = &mut self.slots[index];

                slot.generation = slot.generation.wrapping_add(1);
                slot.entry = entry;

                SessionKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot { generation: 0, entry });

                SessionKey {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };

        (key, receiver)
    }

    /// Remove a session
    ///
    /// Nothing is removed if the slot was reused by another session.
    pub fn remove(&mut self, key: SessionKey) {
        if let Some(slot) = self.slots.get_mut(key.index) {
            if slot.generation == key.generation {
                slot.entry = None;
            }
        }
    }

    /// Cancel every session of the peer
    ///
    /// The canceled sessions are removed from the table. The number of canceled sessions is
    /// returned.
    pub fn cancel(&mut self, peer_id: PeerId) -> usize {
        self.slots
            .iter_mut()
            .filter(|slot| matches!(slot.entry, Some((id, _)) if id == peer_id))
            .filter_map(|slot| slot.entry.take())
            .map(|(_, sender)| {
                // the receiver is gone if the session was dropped without removing itself
                let _ = sender.send(());
            })
            .count()
    }

    /// Get the number of sessions in the table
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_key_does_not_remove_reused_slot() {
        let mut table = SessionTable::default();

        let (first, _first_rx) = table.insert(PeerId(0));

        table.remove(first);

        let (second, _second_rx) = table.insert(PeerId(1));

        assert_eq!(first.index, second.index);
        assert_ne!(first.generation, second.generation);

        table.remove(first);

        assert_eq!(1, table.len());

        table.remove(second);

        assert_eq!(0, table.len());
    }

    #[test]
    fn cancel_only_the_peer() {
        let mut table = SessionTable::default();

        let (_, mut rx_a) = table.insert(PeerId(0));
        let (_, mut rx_b) = table.insert(PeerId(1));
        let (_, mut rx_c) = table.insert(PeerId(0));

        assert_eq!(2, table.cancel(PeerId(0)));
        assert_eq!(1, table.len());

        assert_eq!(Ok(Some(())), rx_a.try_recv());
        assert_eq!(Ok(None), rx_b.try_recv());
        assert_eq!(Ok(Some(())), rx_c.try_recv());

        assert_eq!(0, table.cancel(PeerId(0)));
    }
}
