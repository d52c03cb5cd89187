//! Staggered authorization windows.
//!
//! Submission confirmations, sequencer grace, renewal phases and optimistic
//! completion phases all reduce to "who may act, from when, until when".
//! Each caller builds a [`WindowTable`] and asks [`WindowTable::evaluate`].

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Env};

/// A duration measured in both blocks and seconds.
#[cw_serde]
#[derive(Copy, Default)]
pub struct Span {
    pub blocks: u64,
    pub seconds: u64,
}

impl Span {
    pub const fn new(blocks: u64, seconds: u64) -> Self {
        Self { blocks, seconds }
    }

    pub fn is_zero(&self) -> bool {
        self.blocks == 0 && self.seconds == 0
    }

    /// `self * num / den`, rounded down per component.
    pub fn scaled(&self, num: u64, den: u64) -> Self {
        Self {
            blocks: self.blocks.saturating_mul(num) / den,
            seconds: self.seconds.saturating_mul(num) / den,
        }
    }
}

/// A point on the chain, `(height, seconds)`.
#[cw_serde]
#[derive(Copy)]
pub struct BlockPoint {
    pub height: u64,
    pub time: u64,
}

impl BlockPoint {
    pub fn now(env: &Env) -> Self {
        Self {
            height: env.block.height,
            time: env.block.time.seconds(),
        }
    }

    pub fn plus(&self, span: Span) -> Self {
        Self {
            height: self.height.saturating_add(span.blocks),
            time: self.time.saturating_add(span.seconds),
        }
    }

    /// Component-wise maximum.
    pub fn max_each(&self, other: &BlockPoint) -> Self {
        Self {
            height: self.height.max(other.height),
            time: self.time.max(other.time),
        }
    }

    /// True once both height and time are at or past `other`.
    pub fn reached(&self, other: &BlockPoint) -> bool {
        self.height >= other.height && self.time >= other.time
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Role {
    Account(Addr),
    Sequencer,
    Anyone,
}

impl Role {
    fn matches(&self, sender: &Addr, sequencer: &Addr) -> bool {
        match self {
            Role::Account(addr) => addr == sender,
            Role::Sequencer => sequencer == sender,
            Role::Anyone => true,
        }
    }
}

#[derive(Clone, Debug)]
struct Window {
    role: Role,
    opens: BlockPoint,
    closes: Option<BlockPoint>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Access {
    Granted,
    /// The sender holds a role whose window has not opened yet.
    NotYet { opens_at: BlockPoint },
    /// The sender holds no role, or only roles whose windows already closed.
    Denied,
}

#[derive(Clone, Debug)]
pub struct WindowTable<'a> {
    sequencer: &'a Addr,
    windows: Vec<Window>,
}

impl<'a> WindowTable<'a> {
    pub fn new(sequencer: &'a Addr) -> Self {
        Self {
            sequencer,
            windows: Vec::new(),
        }
    }

    /// Grant `role` from `opens` onwards, until `closes` if given.
    pub fn open(mut self, role: Role, opens: BlockPoint, closes: Option<BlockPoint>) -> Self {
        self.windows.push(Window {
            role,
            opens,
            closes,
        });
        self
    }

    pub fn evaluate(&self, now: &BlockPoint, sender: &Addr) -> Access {
        let mut earliest: Option<BlockPoint> = None;

        for window in &self.windows {
            if !window.role.matches(sender, self.sequencer) {
                continue;
            }
            if !now.reached(&window.opens) {
                earliest = Some(match earliest {
                    Some(e) if (e.height, e.time) <= (window.opens.height, window.opens.time) => e,
                    _ => window.opens,
                });
                continue;
            }
            match window.closes {
                Some(closes) if now.reached(&closes) => continue,
                _ => return Access::Granted,
            }
        }

        match earliest {
            Some(opens_at) => Access::NotYet { opens_at },
            None => Access::Denied,
        }
    }
}
