use crate::error::CompositorError;
use crate::primitives::Rect;
use crate::snapshot::{Snapshot, SurfaceProvider};

///One cached widget subtree: its snapshot, the draw order it composites at,
/// and how many resolve passes it has spent outside the viewport.
pub struct CacheEntry<P: SurfaceProvider> {
    pub snapshot: Snapshot<P>,
    pub z_index: u32,
    pub out_of_view_ticks: u64,
}

impl<P: SurfaceProvider> CacheEntry<P> {
    pub fn new(snapshot: Snapshot<P>, z_index: u32) -> Self {
        CacheEntry {
            snapshot,
            z_index,
            out_of_view_ticks: 0,
        }
    }
}

///Out-of-view partition. Entries here keep their recorded commands and
/// whatever surface they still hold, waiting to either re-enter view or be
/// evicted by the budget pass.
///
/// Freshly recorded entries are pushed here as well; the next
/// [lru_resolve] promotes them if their bounds intersect the viewport.
pub struct Residuals<P: SurfaceProvider> {
    entries: Vec<CacheEntry<P>>,
}

impl<P: SurfaceProvider> Residuals<P> {
    pub fn new() -> Self {
        Residuals {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: CacheEntry<P>) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    ///No particular order; residuals are not composited.
    pub fn iter(&self) -> std::slice::Iter<'_, CacheEntry<P>> {
        self.entries.iter()
    }

    ///Bytes held by the rasterized surfaces of all residual entries.
    pub fn surface_bytes(&self, provider: &P) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.snapshot.surface_size(provider))
            .sum()
    }
}

///In-view partition. Kept sorted by `z_index` ascending so compositing can
/// traverse back-to-front (or `.rev()` for front-to-back).
pub struct Cache<P: SurfaceProvider> {
    entries: Vec<CacheEntry<P>>,
}

impl<P: SurfaceProvider> Cache<P> {
    pub fn new() -> Self {
        Cache {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    ///Back-to-front order.
    pub fn iter(&self) -> std::slice::Iter<'_, CacheEntry<P>> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CacheEntry<P>] {
        &self.entries
    }

    ///Bytes held by the rasterized surfaces of all in-view entries.
    pub fn surface_bytes(&self, provider: &P) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.snapshot.surface_size(provider))
            .sum()
    }

    fn insert_sorted(&mut self, entry: CacheEntry<P>) {
        let at = self
            .entries
            .partition_point(|other| other.z_index < entry.z_index);
        self.entries.insert(at, entry);
    }
}

///Memory budget for the out-of-view partition. The resolve pass evicts
/// residuals past their retention window until the partition fits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheBudget {
    pub max_residual_bytes: u64,
}

impl CacheBudget {
    ///Never evict.
    pub const UNLIMITED: Self = CacheBudget {
        max_residual_bytes: u64::MAX,
    };

    pub fn new(max_residual_bytes: u64) -> Self {
        CacheBudget { max_residual_bytes }
    }
}

impl Default for CacheBudget {
    fn default() -> Self {
        CacheBudget::UNLIMITED
    }
}

///Per-frame reclassification pass over the two cache partitions.
///
/// 1. Residuals whose bounds intersect `view_area` move back into `cache`
///    (rasterizing through `provider` if their surface is not resident);
///    every other residual ages by one tick.
/// 2. Cache entries that left `view_area` retire to `residuals` with their
///    tick counter reset; in-view entries marked dirty re-rasterize.
/// 3. If the residual surfaces exceed `budget`, entries older than
///    `max_out_of_view_ticks` are evicted, least recently visible first,
///    until the partition fits. Eviction drops the entry, releasing its
///    commands and surface.
///
/// After the pass every entry lives in exactly one partition and `cache`
/// stays sorted by `z_index`.
pub fn lru_resolve<P: SurfaceProvider>(
    residuals: &mut Residuals<P>,
    cache: &mut Cache<P>,
    provider: &mut P,
    view_area: Rect,
    max_out_of_view_ticks: u64,
    budget: CacheBudget,
) -> Result<(), CompositorError<P::Error>> {
    //promote residuals that re-entered view. No order to preserve here,
    // the sorted insert below re-establishes z order.
    let mut still_out = Vec::with_capacity(residuals.entries.len());
    for mut entry in residuals.entries.drain(..) {
        if entry.snapshot.area().overlaps(&view_area) {
            if !entry.snapshot.is_rasterized() || entry.snapshot.is_dirty() {
                entry.snapshot.rasterize(provider)?;
            }
            entry.out_of_view_ticks = 0;

            #[cfg(feature = "logging")]
            log::trace!(
                "snapshot entered view (z={}, area={:?})",
                entry.z_index,
                entry.snapshot.area()
            );

            cache.insert_sorted(entry);
        } else {
            entry.out_of_view_ticks += 1;
            still_out.push(entry);
        }
    }
    residuals.entries = still_out;

    //retire cache entries that left view. Draining in order keeps the
    // surviving entries sorted by z.
    let mut still_in = Vec::with_capacity(cache.entries.len());
    for mut entry in cache.entries.drain(..) {
        if entry.snapshot.area().overlaps(&view_area) {
            if entry.snapshot.is_dirty() {
                entry.snapshot.rasterize(provider)?;
            }
            still_in.push(entry);
        } else {
            entry.out_of_view_ticks = 0;

            #[cfg(feature = "logging")]
            log::trace!(
                "snapshot left view (z={}, area={:?})",
                entry.z_index,
                entry.snapshot.area()
            );

            residuals.entries.push(entry);
        }
    }
    cache.entries = still_in;

    //budget pass: reclaim surfaces of residuals past their retention window,
    // least recently visible first
    let mut resident = residuals.surface_bytes(provider);
    if resident > budget.max_residual_bytes {
        let mut stale: Vec<usize> = (0..residuals.entries.len())
            .filter(|&idx| residuals.entries[idx].out_of_view_ticks > max_out_of_view_ticks)
            .collect();
        stale.sort_by(|&a, &b| {
            residuals.entries[b]
                .out_of_view_ticks
                .cmp(&residuals.entries[a].out_of_view_ticks)
        });

        let mut evict = Vec::new();
        for idx in stale {
            if resident <= budget.max_residual_bytes {
                break;
            }
            resident -= residuals.entries[idx].snapshot.surface_size(provider);
            evict.push(idx);
        }

        //remove back to front so the indices stay valid
        evict.sort_unstable_by(|a, b| b.cmp(a));
        for idx in evict {
            let entry = residuals.entries.remove(idx);

            #[cfg(feature = "logging")]
            log::trace!(
                "evicting residual snapshot after {} ticks (z={})",
                entry.out_of_view_ticks,
                entry.z_index
            );

            drop(entry);
        }
    }

    Ok(())
}
