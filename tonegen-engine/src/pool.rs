//! Arena of scheduled tones.
//!
//! Tones live in slots addressed by [`ToneId`]. Two relations are kept as
//! index links: the pool list (`next`), whose members are the roots, and
//! per-root chains (`chain`) of same-kind tones that play back to back.
//! Every chain member is owned by the tone that precedes it.

use log::{error, trace};

use crate::error::{Error, Result};
use crate::tone::{Tone, ToneKind};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ToneId {
    index: u32,
    generation: u32,
}

/// What happens to a tone's chain successor when the tone is destroyed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ChainPolicy {
    /// The successor takes over the destroyed tone's list position.
    Preserve,
    /// The whole chain goes with the tone.
    Kill,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    tone: Option<Tone>,
}

#[derive(Debug, Default)]
pub struct Pool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<ToneId>,
    len: usize,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tones, chain members included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Head of the pool list; identifies the pool towards the output side.
    pub fn anchor(&self) -> Option<ToneId> {
        self.head
    }

    pub fn get(&self, id: ToneId) -> Option<&Tone> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.tone.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ToneId) -> Option<&mut Tone> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.tone.as_mut()
    }

    pub fn contains(&self, id: ToneId) -> bool {
        self.get(id).is_some()
    }

    /// Pool list members, in list order.
    pub fn roots(&self) -> Roots<'_> {
        Roots {
            pool: self,
            cursor: self.head,
        }
    }

    /// Chain members following `id`, nearest first.
    pub fn chain(&self, id: ToneId) -> Vec<ToneId> {
        let mut members = Vec::new();
        let mut cursor = self.get(id).and_then(|tone| tone.chain);
        while let Some(member) = cursor {
            members.push(member);
            cursor = self.get(member).and_then(|tone| tone.chain);
        }
        members
    }

    /// Last member of the chain headed by the first root of `kind`.
    pub(crate) fn chain_tail(&self, kind: ToneKind) -> Option<ToneId> {
        let root = self.roots().find(|&id| self.get(id).map(|tone| tone.kind) == Some(kind))?;
        Some(self.chain(root).last().copied().unwrap_or(root))
    }

    fn allocate(&mut self, tone: Tone) -> Result<ToneId> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.tone = Some(tone);
            self.len += 1;
            return Ok(ToneId { index, generation: slot.generation });
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| Error::Allocation)?;
        self.slots.try_reserve(1).map_err(|_| Error::Allocation)?;
        self.slots.push(Slot { generation: 0, tone: Some(tone) });
        self.len += 1;
        Ok(ToneId { index, generation: 0 })
    }

    fn release(&mut self, id: ToneId) -> Option<Tone> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let tone = slot.tone.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(tone)
    }

    /// Inserts `tone` as the new head of the pool list.
    pub(crate) fn insert_root(&mut self, mut tone: Tone) -> Result<ToneId> {
        tone.next = self.head;
        let id = self.allocate(tone)?;
        self.head = Some(id);
        Ok(id)
    }

    /// Links `tone` as the chain successor of `tail`, which must not
    /// already have one.
    pub(crate) fn append_chain(&mut self, tail: ToneId, tone: Tone) -> Result<ToneId> {
        debug_assert!(self.get(tail).map(|t| t.chain.is_none()).unwrap_or(false));
        let id = self.allocate(tone)?;
        match self.get_mut(tail) {
            Some(tail) => tail.chain = Some(id),
            None => {
                self.release(id);
                return Err(Error::NotInPool(tail));
            }
        }
        Ok(id)
    }

    /// Destroys a root. Chain members cannot be destroyed on their own.
    pub fn destroy(&mut self, id: ToneId, policy: ChainPolicy) -> Result<()> {
        let mut prev = None;
        let mut cursor = self.head;

        while let Some(current) = cursor {
            if current == id {
                self.unlink(prev, id, policy);
                return Ok(());
            }
            prev = cursor;
            cursor = self.get(current).and_then(|tone| tone.next);
        }

        error!("destroy: tone {id:?} not reachable from the pool");
        Err(Error::NotInPool(id))
    }

    /// Destroys every tone, chains included.
    pub fn destroy_all(&mut self) {
        while let Some(head) = self.head {
            self.unlink(None, head, ChainPolicy::Kill);
        }
        debug_assert_eq!(self.len, 0);
    }

    /// Removes root `id`, whose list predecessor is `prev`. Returns the
    /// promoted chain successor, if any.
    pub(crate) fn unlink(&mut self, prev: Option<ToneId>, id: ToneId, policy: ChainPolicy) -> Option<ToneId> {
        let tone = match self.release(id) {
            Some(tone) => tone,
            None => {
                error!("unlink: stale tone {id:?}");
                return None;
            }
        };

        let (replacement, promoted) = match (tone.chain, policy) {
            (None, _) => (tone.next, None),
            (Some(successor), ChainPolicy::Preserve) => {
                if let Some(successor_tone) = self.get_mut(successor) {
                    successor_tone.next = tone.next;
                }
                trace!("promoting {successor:?} in place of {id:?}");
                (Some(successor), Some(successor))
            }
            (Some(successor), ChainPolicy::Kill) => {
                let mut cursor = Some(successor);
                while let Some(member) = cursor {
                    cursor = self.release(member).and_then(|tone| tone.chain);
                }
                (tone.next, None)
            }
        };

        match prev {
            Some(prev) => {
                if let Some(prev_tone) = self.get_mut(prev) {
                    prev_tone.next = replacement;
                }
            }
            None => self.head = replacement,
        }

        promoted
    }
}

pub struct Roots<'a> {
    pool: &'a Pool,
    cursor: Option<ToneId>,
}

impl Iterator for Roots<'_> {
    type Item = ToneId;

    fn next(&mut self) -> Option<ToneId> {
        let current = self.cursor?;
        self.cursor = self.pool.get(current).and_then(|tone| tone.next);
        Some(current)
    }
}
