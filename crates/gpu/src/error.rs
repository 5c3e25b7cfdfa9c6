use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible wgpu adapter found")]
    NoAdapter,
    #[error("failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    #[error("failed to acquire next frame: {0}")]
    SurfaceError(#[from] wgpu::SurfaceError),
}
