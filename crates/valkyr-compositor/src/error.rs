use thiserror::Error;

///Failures surfaced by the cache's [SurfaceProvider](crate::snapshot::SurfaceProvider)
/// collaborator, tagged with the phase they occured in.
#[derive(Error, Debug)]
pub enum CompositorError<E: std::error::Error + 'static> {
    #[error("surface creation failed: {0}")]
    SurfaceCreation(#[source] E),
    #[error("rasterization failed: {0}")]
    Rasterization(#[source] E),
}
