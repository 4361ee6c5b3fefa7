//! Shared dense blocks
//!
//! A [`Block`] is the unit of storage for cores and factor matrices. It is a
//! reference-counted, lock-protected dense array plus a `trainable` flag:
//!
//! - Cloning a block **aliases** its storage. This is how symmetric
//!   (INDSCAL-style) constructions share one factor across several
//!   dimensions: an in-place update through any handle is visible through
//!   all of them.
//! - [`Block::deep_copy`] allocates fresh storage with no aliasing.
//!
//! Algebraic operations only ever read blocks. External fitting code may
//! update values between operations with [`Block::write`]; doing so while a
//! contraction is in flight on another thread blocks on the lock.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use scirs2_core::ndarray_ext::{Array, Dimension, Ix2, Ix3};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct BlockInner<D: Dimension> {
    data: RwLock<Array<f64, D>>,
    trainable: AtomicBool,
}

/// Reference-counted dense block shared between networks and dimensions
pub struct Block<D: Dimension> {
    inner: Arc<BlockInner<D>>,
}

/// Three-axis block used by train cores
pub type Block3 = Block<Ix3>;

/// Two-axis block used by parafac cores and factor matrices
pub type Block2 = Block<Ix2>;

impl<D: Dimension> Block<D> {
    /// Wrap an owned array in a new, non-trainable block
    pub fn new(array: Array<f64, D>) -> Self {
        Self {
            inner: Arc::new(BlockInner {
                data: RwLock::new(array),
                trainable: AtomicBool::new(false),
            }),
        }
    }

    /// Wrap an owned array in a new trainable block
    pub fn trainable(array: Array<f64, D>) -> Self {
        let block = Self::new(array);
        block.set_trainable(true);
        block
    }

    /// Shared read access.
    ///
    /// The guard aliases the block's storage; it reflects every handle
    /// sharing this block.
    pub fn read(&self) -> RwLockReadGuard<'_, Array<f64, D>> {
        self.inner.data.read()
    }

    /// Exclusive write access for in-place updates (e.g. by an optimizer).
    ///
    /// The guard aliases the block's storage; writes are visible through
    /// every handle sharing this block.
    pub fn write(&self) -> RwLockWriteGuard<'_, Array<f64, D>> {
        self.inner.data.write()
    }

    /// Copy of the current contents
    pub fn to_array(&self) -> Array<f64, D> {
        self.read().clone()
    }

    /// Allocate a new block holding a copy of the current contents
    pub fn deep_copy(&self) -> Self {
        let block = Self::new(self.to_array());
        block.set_trainable(self.is_trainable());
        block
    }

    /// Shape of the stored array
    pub fn shape(&self) -> Vec<usize> {
        self.read().shape().to_vec()
    }

    /// Number of stored elements
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True if the block holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether external fitting routines may update this block
    pub fn is_trainable(&self) -> bool {
        self.inner.trainable.load(Ordering::Relaxed)
    }

    /// Flag the block (and every alias of it) as trainable or frozen
    pub fn set_trainable(&self, trainable: bool) {
        self.inner.trainable.store(trainable, Ordering::Relaxed);
    }

    /// True if both handles refer to the same storage
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles currently sharing this storage
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<D: Dimension> Clone for Block<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Dimension> fmt::Debug for Block<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("shape", &self.shape())
            .field("trainable", &self.is_trainable())
            .field("shared", &(self.share_count() > 1))
            .finish()
    }
}

impl<D: Dimension> From<Array<f64, D>> for Block<D> {
    fn from(array: Array<f64, D>) -> Self {
        Self::new(array)
    }
}
