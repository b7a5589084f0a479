//! Subnet allocation for service overlays
//!
//! Hands out non-overlapping /24 blocks from a configured base network,
//! keyed by service id.

use crate::error::{OverlayError, Result};
use ipnet::Ipv4Net;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

/// Prefix length of the blocks handed out to services
pub const BLOCK_PREFIX_LEN: u8 = 24;

/// Pool of /24 subnets carved out of a base network
///
/// Every /24 block of the base is either available or allocated to exactly
/// one service id; the union of the two sides is always the full canonical
/// block set. State is process-lifetime only.
///
/// The pool is a plain single-writer value. Callers sharing it across tasks
/// wrap it in a single mutex; all mutations go through that one lock.
#[derive(Debug, Clone)]
pub struct SubnetPool {
    /// Base network the blocks are carved from
    base: Ipv4Net,
    /// Blocks not currently assigned, in ascending numeric order
    available: BTreeSet<Ipv4Net>,
    /// Blocks assigned to services, keyed by service id
    allocated: BTreeMap<String, Ipv4Net>,
}

impl SubnetPool {
    /// Create a pool from a base network in CIDR notation
    ///
    /// A /16 base yields the canonical 256-block pool.
    ///
    /// # Example
    /// ```
    /// use meshgate_overlay::allocator::SubnetPool;
    ///
    /// let pool = SubnetPool::new("10.13.0.0/16").unwrap();
    /// assert_eq!(pool.available_count(), 256);
    /// ```
    pub fn new(cidr: &str) -> Result<Self> {
        let base: Ipv4Net = cidr
            .parse()
            .map_err(|e| OverlayError::InvalidCidr(format!("{}: {}", cidr, e)))?;

        if base.prefix_len() > BLOCK_PREFIX_LEN {
            return Err(OverlayError::InvalidCidr(format!(
                "{}: base prefix must be /{} or wider",
                cidr, BLOCK_PREFIX_LEN
            )));
        }

        let mut pool = Self {
            base,
            available: BTreeSet::new(),
            allocated: BTreeMap::new(),
        };
        pool.reset();
        Ok(pool)
    }

    /// Assign a /24 block to a service
    ///
    /// Idempotent: a service that already holds a block gets the same block
    /// back. Otherwise the numerically smallest available block is taken.
    pub fn assign(&mut self, service_id: &str) -> Result<Ipv4Net> {
        if let Some(existing) = self.allocated.get(service_id) {
            tracing::debug!(service_id, subnet = %existing, "Service already holds a subnet");
            return Ok(*existing);
        }

        let subnet = self.available.pop_first().ok_or(OverlayError::PoolExhausted)?;
        self.allocated.insert(service_id.to_string(), subnet);
        tracing::info!(service_id, subnet = %subnet, "Assigned subnet");
        Ok(subnet)
    }

    /// Release a service's block back into the pool
    pub fn release(&mut self, service_id: &str) -> Result<Ipv4Net> {
        let subnet = self
            .allocated
            .remove(service_id)
            .ok_or_else(|| OverlayError::NotAllocated(service_id.to_string()))?;
        self.available.insert(subnet);
        tracing::info!(service_id, subnet = %subnet, "Released subnet");
        Ok(subnet)
    }

    /// Look up the block assigned to a service
    pub fn get(&self, service_id: &str) -> Result<Ipv4Net> {
        self.allocated
            .get(service_id)
            .copied()
            .ok_or_else(|| OverlayError::NotAllocated(service_id.to_string()))
    }

    /// Snapshot of both sides of the pool
    pub fn list(&self) -> (Vec<Ipv4Net>, BTreeMap<String, Ipv4Net>) {
        (
            self.available.iter().copied().collect(),
            self.allocated.clone(),
        )
    }

    /// Return the pool to its initial state
    ///
    /// Clears all allocations and repopulates the full block sequence.
    /// Purely in-memory; nothing outside the pool is touched.
    pub fn reset(&mut self) {
        self.allocated.clear();
        self.available = self
            .base
            .subnets(BLOCK_PREFIX_LEN)
            .expect("prefix length validated at construction")
            .collect();
        tracing::info!(base = %self.base, blocks = self.available.len(), "Subnet pool reset");
    }

    /// Base network the pool was built from
    pub fn base(&self) -> Ipv4Net {
        self.base
    }

    /// Number of blocks currently available
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Number of blocks currently allocated
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

/// First usable host address of a network
///
/// The overlay server binds the first host of the base network on reset.
pub fn first_host(net: Ipv4Net) -> Result<Ipv4Addr> {
    net.hosts()
        .next()
        .ok_or_else(|| OverlayError::InvalidCidr(format!("{}: no usable hosts", net)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_new() {
        let pool = SubnetPool::new("10.13.0.0/16").unwrap();
        assert_eq!(pool.available_count(), 256);
        assert_eq!(pool.allocated_count(), 0);
    }

    #[test]
    fn test_pool_invalid_cidr() {
        assert!(SubnetPool::new("not-a-cidr").is_err());
        assert!(SubnetPool::new("10.13.0.0/28").is_err());
    }

    #[test]
    fn test_assign_smallest_first() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        assert_eq!(pool.assign("svc-a").unwrap().to_string(), "10.13.0.0/24");
        assert_eq!(pool.assign("svc-b").unwrap().to_string(), "10.13.1.0/24");
    }

    #[test]
    fn test_assign_idempotent() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        let first = pool.assign("svc-a").unwrap();
        let second = pool.assign("svc-a").unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.allocated_count(), 1);
    }

    #[test]
    fn test_release_returns_block_to_pool() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        pool.assign("svc-a").unwrap();
        pool.assign("svc-b").unwrap();

        let released = pool.release("svc-a").unwrap();
        assert_eq!(released.to_string(), "10.13.0.0/24");

        // Smallest available block is reused
        assert_eq!(pool.assign("svc-c").unwrap().to_string(), "10.13.0.0/24");
    }

    #[test]
    fn test_release_unallocated_fails_without_mutation() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        pool.assign("svc-a").unwrap();

        let err = pool.release("svc-b").unwrap_err();
        assert!(matches!(err, OverlayError::NotAllocated(_)));
        assert_eq!(pool.available_count(), 255);
        assert_eq!(pool.allocated_count(), 1);
    }

    #[test]
    fn test_get() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        pool.assign("svc-a").unwrap();

        assert_eq!(pool.get("svc-a").unwrap().to_string(), "10.13.0.0/24");
        assert!(matches!(
            pool.get("svc-b").unwrap_err(),
            OverlayError::NotAllocated(_)
        ));
    }

    #[test]
    fn test_exhaustion() {
        // /22 base gives 4 blocks
        let mut pool = SubnetPool::new("10.13.0.0/22").unwrap();
        for i in 0..4 {
            pool.assign(&format!("svc-{}", i)).unwrap();
        }
        assert!(matches!(
            pool.assign("svc-overflow").unwrap_err(),
            OverlayError::PoolExhausted
        ));
    }

    #[test]
    fn test_reset() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        pool.assign("svc-a").unwrap();
        pool.assign("svc-b").unwrap();

        pool.reset();
        assert_eq!(pool.available_count(), 256);
        assert_eq!(pool.allocated_count(), 0);
    }

    #[test]
    fn test_conservation_invariant() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        let canonical: BTreeSet<Ipv4Net> = pool.list().0.into_iter().collect();

        pool.assign("a").unwrap();
        pool.assign("b").unwrap();
        pool.assign("c").unwrap();
        pool.release("b").unwrap();
        pool.assign("d").unwrap();
        pool.release("a").unwrap();

        let (available, allocated) = pool.list();
        let mut union: BTreeSet<Ipv4Net> = available.into_iter().collect();
        for subnet in allocated.values() {
            // No subnet may sit on both sides
            assert!(union.insert(*subnet));
        }
        assert_eq!(union, canonical);
    }

    #[test]
    fn test_list_is_snapshot() {
        let mut pool = SubnetPool::new("10.13.0.0/16").unwrap();
        pool.assign("svc-a").unwrap();

        let (available, allocated) = pool.list();
        assert_eq!(available.len(), 255);
        assert_eq!(allocated.len(), 1);
        assert_eq!(pool.available_count(), 255);
    }

    #[test]
    fn test_first_host() {
        let net: Ipv4Net = "10.13.0.0/16".parse().unwrap();
        assert_eq!(first_host(net).unwrap().to_string(), "10.13.0.1");
    }
}
