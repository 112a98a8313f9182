//! Regions - Declarative time-regions reconciled against live engine regions.
//!
//! # API
//!
//! - `reconcile(old, new)` - pure edit script (add / update / remove)
//! - `RegionReconciler::new(regions, callbacks)` - holds the desired set
//! - `reconciler.attach(&controller)` - reconcile on every engine `ready`
//! - `reconciler.update(regions)` - replace the desired set
//! - `reconciler.unmount()` - dispose every listener it created
//!
//! Each region the reconciler creates gets one forwarder per [`RegionEvent`]
//! plus a `remove` listener that disposes the region's listeners when the
//! region goes away, whoever removed it.
//!
//! [`RegionEvent`]: crate::events::RegionEvent

mod reconcile;
mod reconciler;

pub use reconcile::{reconcile, EditScript, RegionOp};
pub use reconciler::RegionReconciler;
