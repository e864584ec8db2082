use crate::error::CompositorError;
use crate::primitives::{Extent, Rect};

///Materializes rasterization targets and replays recorded draw commands into
/// them. The cache stays agnostic of the actual raster backend; whatever
/// records commands and owns surface memory implements this.
///
/// Surface handles returned by [make_surface](Self::make_surface) are owned by
/// the cache entry they are created for and dropped when the entry is evicted.
pub trait SurfaceProvider {
    ///Recorded draw-command list for one widget subtree.
    type Commands;
    ///Owning handle to a rasterization target.
    type Surface;
    type Error: std::error::Error + Send + Sync + 'static;

    ///Creates a surface able to hold `extent` pixels.
    fn make_surface(&mut self, extent: Extent) -> Result<Self::Surface, Self::Error>;

    ///Replays `commands` into `surface`, replacing its previous content.
    fn rasterize(
        &mut self,
        commands: &Self::Commands,
        surface: &mut Self::Surface,
    ) -> Result<(), Self::Error>;

    ///Resident size of `surface` in bytes. Drives the eviction budget.
    fn surface_size(&self, surface: &Self::Surface) -> u64;
}

///Recorded draw commands and the (possibly not yet materialized) rasterized
/// surface of one widget subtree, together with the absolute region the
/// subtree occupies.
pub struct Snapshot<P: SurfaceProvider> {
    commands: P::Commands,
    surface: Option<P::Surface>,
    area: Rect,
    dirty: bool,
}

impl<P: SurfaceProvider> Snapshot<P> {
    ///Wraps freshly recorded `commands` for the subtree covering `area`. The
    /// snapshot starts unrasterized; the next resolve pass materializes it if
    /// it is in view.
    pub fn new(commands: P::Commands, area: Rect) -> Self {
        Snapshot {
            commands,
            surface: None,
            area,
            dirty: false,
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn commands(&self) -> &P::Commands {
        &self.commands
    }

    pub fn surface(&self) -> Option<&P::Surface> {
        self.surface.as_ref()
    }

    pub fn is_rasterized(&self) -> bool {
        self.surface.is_some()
    }

    ///Marks the recorded content as stale. The next resolve pass re-replays
    /// the commands into the surface while the snapshot is in view.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    ///Replaces the recorded commands, for example after the widget subtree
    /// re-recorded itself.
    pub fn replace_commands(&mut self, commands: P::Commands) {
        self.commands = commands;
        self.dirty = true;
    }

    ///Moves the snapshot to `area`. A changed extent invalidates the surface,
    /// a pure translation keeps it.
    pub fn move_to(&mut self, area: Rect) {
        let resized = area.extent != self.area.extent;
        self.area = area;
        if resized {
            self.surface = None;
            self.dirty = true;
        }
    }

    ///Releases the rasterized surface, keeping the recorded commands.
    pub fn discard_surface(&mut self) {
        self.surface = None;
    }

    ///Bytes the rasterized surface currently occupies. Zero while discarded.
    pub fn surface_size(&self, provider: &P) -> u64 {
        self.surface
            .as_ref()
            .map(|surface| provider.surface_size(surface))
            .unwrap_or(0)
    }

    ///Materializes the surface if needed and replays the recorded commands
    /// into it.
    pub fn rasterize(&mut self, provider: &mut P) -> Result<(), CompositorError<P::Error>> {
        let mut surface = match self.surface.take() {
            Some(surface) => surface,
            None => provider
                .make_surface(self.area.extent)
                .map_err(CompositorError::SurfaceCreation)?,
        };

        provider
            .rasterize(&self.commands, &mut surface)
            .map_err(CompositorError::Rasterization)?;

        self.surface = Some(surface);
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct NullProvider;

    impl SurfaceProvider for NullProvider {
        type Commands = ();
        type Surface = Extent;
        type Error = Infallible;

        fn make_surface(&mut self, extent: Extent) -> Result<Extent, Infallible> {
            Ok(extent)
        }

        fn rasterize(&mut self, _commands: &(), _surface: &mut Extent) -> Result<(), Infallible> {
            Ok(())
        }

        fn surface_size(&self, surface: &Extent) -> u64 {
            surface.area() * 4
        }
    }

    #[test]
    fn rasterize_materializes_surface_once() {
        let mut provider = NullProvider;
        let mut snapshot = Snapshot::<NullProvider>::new((), Rect::new(0, 0, 16, 16));
        assert!(!snapshot.is_rasterized());

        snapshot.rasterize(&mut provider).unwrap();
        assert!(snapshot.is_rasterized());
        assert_eq!(snapshot.surface_size(&provider), 16 * 16 * 4);
    }

    #[test]
    fn translation_keeps_surface_resize_drops_it() {
        let mut provider = NullProvider;
        let mut snapshot = Snapshot::<NullProvider>::new((), Rect::new(0, 0, 16, 16));
        snapshot.rasterize(&mut provider).unwrap();

        snapshot.move_to(Rect::new(8, 8, 16, 16));
        assert!(snapshot.is_rasterized());
        assert!(!snapshot.is_dirty());

        snapshot.move_to(Rect::new(8, 8, 32, 32));
        assert!(!snapshot.is_rasterized());
        assert!(snapshot.is_dirty());
    }

    #[test]
    fn replacing_commands_marks_dirty() {
        let mut snapshot = Snapshot::<NullProvider>::new((), Rect::new(0, 0, 4, 4));
        assert!(!snapshot.is_dirty());
        snapshot.replace_commands(());
        assert!(snapshot.is_dirty());
    }
}
