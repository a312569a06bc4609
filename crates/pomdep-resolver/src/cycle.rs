//! Ancestor-chain cycle detection shared by tree building, parent
//! inheritance, BOM imports and relocation following.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// The chain of keys currently being processed, outermost first.
///
/// Entering a key that is already on the chain is a cycle. Each traversal
/// branch works on its own [`fork`](CycleGuard::fork), so siblings never see
/// each other's keys.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    chain: Vec<String>,
    in_flight: HashSet<String>,
}

/// A key was entered while already on the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_chain(.chain))]
pub struct CycleDetected {
    /// The offending chain, ending with the repeated key.
    pub chain: Vec<String>,
}

fn render_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard whose chain starts with `root`.
    pub fn starting_at(root: &str) -> Self {
        Self {
            chain: vec![root.to_string()],
            in_flight: HashSet::from([root.to_string()]),
        }
    }

    /// Push `key` onto the chain, or report the cycle it would close.
    pub fn enter(&mut self, key: &str) -> Result<(), CycleDetected> {
        if self.in_flight.contains(key) {
            let mut chain = self.chain.clone();
            chain.push(key.to_string());
            return Err(CycleDetected { chain });
        }
        self.in_flight.insert(key.to_string());
        self.chain.push(key.to_string());
        Ok(())
    }

    /// Pop `key` off the chain. Keys must be left in reverse entry order.
    pub fn leave(&mut self, key: &str) {
        if self.chain.last().map(String::as_str) == Some(key) {
            self.chain.pop();
            self.in_flight.remove(key);
        } else {
            tracing::debug!("cycle guard: leaving '{key}' out of order");
            if let Some(pos) = self.chain.iter().rposition(|k| k == key) {
                self.chain.remove(pos);
                self.in_flight.remove(key);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    /// An independent copy for a child branch.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}

impl fmt::Display for CycleGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_chain(&self.chain))
    }
}
