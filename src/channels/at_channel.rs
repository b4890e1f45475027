//! Action trigger channel state.
//!
//! Holds everything the cloud side of a trigger needs: the capability set
//! the device advertises, the subset the server enabled, the queue of
//! triggers waiting for a connection and the channel value that tells the
//! server which local operations this trigger disables.

use std::fmt;

use strum::Display;

/// A single gesture the server can subscribe to.
///
/// Each capability maps to one bit of the 32-bit mask exchanged with the
/// server in the channel config and the function list.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    TurnOn,
    TurnOff,
    /// `Toggle(n)`: n level changes of a bistable switch, 1..=5.
    Toggle(u8),
    Hold,
    /// `ShortPress(n)`: n-times multiclick of a monostable button, 1..=5.
    ShortPress(u8),
}

impl Capability {
    pub fn bit(self) -> u32 {
        match self {
            Capability::TurnOn => 1 << 0,
            Capability::TurnOff => 1 << 1,
            Capability::Toggle(n) => 1 << (1 + n),
            Capability::Hold => 1 << 10,
            Capability::ShortPress(n) => 1 << (10 + n),
        }
    }

    pub fn from_bit(bit: u32) -> Option<Self> {
        let cap = match bit {
            0x1 => Capability::TurnOn,
            0x2 => Capability::TurnOff,
            0x4 => Capability::Toggle(1),
            0x8 => Capability::Toggle(2),
            0x10 => Capability::Toggle(3),
            0x20 => Capability::Toggle(4),
            0x40 => Capability::Toggle(5),
            0x400 => Capability::Hold,
            0x800 => Capability::ShortPress(1),
            0x1000 => Capability::ShortPress(2),
            0x2000 => Capability::ShortPress(3),
            0x4000 => Capability::ShortPress(4),
            0x8000 => Capability::ShortPress(5),
            _ => return None,
        };
        Some(cap)
    }

    /// All capabilities in ascending bit order.
    pub fn all() -> impl Iterator<Item = Capability> {
        (0..32).filter_map(|i| Capability::from_bit(1 << i))
    }
}

/// Typed view over the wire-level capability bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every defined and undefined bit set. The server sends this when it
    /// wants all local operations routed through it.
    pub const fn all_bits() -> Self {
        Self(u32::MAX)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersection(self, other: CapabilitySet) -> CapabilitySet {
        Self(self.0 & other.0)
    }

    pub fn union(self, other: CapabilitySet) -> CapabilitySet {
        Self(self.0 | other.0)
    }

    /// Capabilities present in the set, ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::all().filter(move |cap| self.contains(*cap))
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilitySet({:#x})", self.0)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

/// Per-channel action trigger bookkeeping.
#[derive(Debug, Default)]
pub struct AtChannel {
    number: u8,
    /// Capabilities this device offers on the channel, advertised to the
    /// server as the channel function list.
    func_list: CapabilitySet,
    /// Capabilities the server asked to receive.
    active: CapabilitySet,
    /// Capabilities whose local handling stops when the server takes them
    /// over. Published inside the channel value.
    disables_local_operation: CapabilitySet,
    related_channel: Option<u8>,
    /// Triggers recognized while offline or mid-burst, drained in bit
    /// order once the link is up.
    pending: Vec<Capability>,
}

impl AtChannel {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn func_list(&self) -> CapabilitySet {
        self.func_list
    }

    pub fn add_capability(&mut self, cap: Capability) {
        self.func_list.insert(cap);
    }

    pub fn active(&self) -> CapabilitySet {
        self.active
    }

    pub fn set_active(&mut self, active: CapabilitySet) {
        self.active = active;
    }

    pub fn disables_local_operation(&self) -> CapabilitySet {
        self.disables_local_operation
    }

    pub fn set_disables_local_operation(&mut self, caps: CapabilitySet) {
        self.disables_local_operation = caps;
    }

    pub fn related_channel(&self) -> Option<u8> {
        self.related_channel
    }

    pub fn set_related_channel(&mut self, channel: u8) {
        self.related_channel = Some(channel);
    }

    /// Queues a trigger for delivery. Duplicates collapse so a burst of
    /// identical gestures reaches the server once per drain.
    pub fn push_trigger(&mut self, cap: Capability) {
        if !self.pending.contains(&cap) {
            self.pending.push(cap);
        }
    }

    /// Takes the lowest-bit pending trigger, if any.
    pub fn pop_trigger(&mut self) -> Option<Capability> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, cap)| cap.bit())
            .map(|(idx, _)| idx)?;
        Some(self.pending.swap_remove(idx))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Channel value published to the server: the related channel (offset
    /// by one so zero means "none") followed by the disabled-operations
    /// mask, little endian.
    pub fn value(&self) -> [u8; 8] {
        let mut value = [0u8; 8];
        value[0] = self.related_channel.map(|ch| ch + 1).unwrap_or(0);
        value[1..5].copy_from_slice(&self.disables_local_operation.bits().to_le_bytes());
        value
    }
}
